//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use alt_tong::admin::{setup_admin_router, AdminState};
use alt_tong::lifecycle::build_services;
use alt_tong::{AltTong, AltTongConfig, ProxyServer, Shutdown};

/// Body returned by the echo backend when no Accept-Language arrived.
pub const NO_HEADER: &str = "<none>";

/// Start a backend that answers every request with the Accept-Language
/// header it received.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }

                let text = String::from_utf8_lossy(&head);
                let body = text
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("accept-language"))
                    .map(|(_, value)| value.trim().to_string())
                    .unwrap_or_else(|| NO_HEADER.to_string());

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// A running proxy plus admin API.
pub struct TestApp {
    pub proxy_addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub alt: Arc<AltTong>,
    pub shutdown: Shutdown,
}

impl TestApp {
    pub async fn start(storage: &Path) -> Self {
        let mut config = AltTongConfig::default();
        config.storage.path = storage.display().to_string();
        config.host.default_accept_language = Some("en-US".to_string());

        let services = build_services(&config).unwrap();
        let shutdown = Shutdown::new();

        let proxy_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let proxy_addr = proxy_listener.local_addr().unwrap();
        let proxy = ProxyServer::new(&config, services.hub.clone());
        tokio::spawn(proxy.run(proxy_listener, shutdown.subscribe()));

        let admin_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let admin_addr = admin_listener.local_addr().unwrap();
        let router = setup_admin_router(AdminState {
            alt: services.alt.clone(),
            api_key: None,
        });
        tokio::spawn(async move {
            let _ = axum::serve(admin_listener, router).await;
        });

        Self {
            proxy_addr,
            admin_addr,
            alt: services.alt,
            shutdown,
        }
    }

    /// Client routed through the proxy.
    pub fn proxied_client(&self) -> reqwest::Client {
        let proxy = reqwest::Proxy::http(format!("http://{}", self.proxy_addr)).unwrap();
        reqwest::Client::builder()
            .proxy(proxy)
            .pool_max_idle_per_host(0)
            .build()
            .unwrap()
    }

    /// Client for the admin API.
    pub fn admin_client(&self) -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    pub fn admin_url(&self, path: &str) -> String {
        format!("http://{}{}", self.admin_addr, path)
    }

    /// Fetch `backend` through the proxy and return the echoed header.
    pub async fn echoed_language(&self, backend: SocketAddr, sent: Option<&str>) -> String {
        let mut request = self.proxied_client().get(format!("http://{backend}/"));
        if let Some(value) = sent {
            request = request.header("accept-language", value);
        }
        let res = request.send().await.expect("Proxy unreachable");
        assert_eq!(res.status(), 200);
        res.text().await.unwrap()
    }

    pub async fn click(&self, id: &str) -> reqwest::StatusCode {
        self.admin_client()
            .post(self.admin_url(&format!("/admin/menu/{id}/click")))
            .send()
            .await
            .unwrap()
            .status()
    }
}
