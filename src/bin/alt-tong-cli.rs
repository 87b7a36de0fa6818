use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "alt-tong-cli")]
#[command(about = "Management CLI for the Alt Tong proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8119")]
    url: String,

    /// Admin API key, if the proxy requires one
    #[arg(short, long, env = "ALT_TONG_API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active override and interceptor state
    Status,
    /// Print the stored candidate list
    Options,
    /// Store a single candidate and rebuild the menu
    Set {
        value: String,
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Store an empty list (menu shows only the config item)
    Clear,
    /// Store the host's default Accept-Language as the candidate
    BrowserDefault,
    /// Show the Accept-Language the host sends by default
    Languages,
    /// Show the current menu items
    Menu,
    /// Click a menu item by id
    Click { id: String },
    /// Reload the stored list and rebuild the menu
    Reconfigure,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    // The admin API is local; never route it through a system proxy.
    let client = reqwest::Client::builder().no_proxy().build()?;

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);
    }

    let base = cli.url.trim_end_matches('/');
    let request = match cli.command {
        Commands::Status => client.get(format!("{base}/admin/status")),
        Commands::Options => client.get(format!("{base}/admin/options")),
        Commands::Set { value, title } => client
            .put(format!("{base}/admin/options"))
            .json(&json!({ "value": value, "title": title })),
        Commands::Clear => client
            .post(format!("{base}/admin/options"))
            .json(&json!({ "optionList": [] })),
        Commands::BrowserDefault => client.post(format!("{base}/admin/options/browser-default")),
        Commands::Languages => client.get(format!("{base}/admin/accept-languages")),
        Commands::Menu => client.get(format!("{base}/admin/menu")),
        Commands::Click { id } => client.post(format!("{base}/admin/menu/{id}/click")),
        Commands::Reconfigure => client.post(format!("{base}/admin/reconfigure")),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
