//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for alt-tong.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AltTongConfig {
    /// Proxy listener configuration.
    pub listener: ListenerConfig,

    /// Admin API (options surface) configuration.
    pub admin: AdminConfig,

    /// Durable storage for the candidate list.
    pub storage: StorageConfig,

    /// Behaviour of the request host (defaults, probe).
    pub host: HostConfig,

    /// Context menu rendering.
    pub menu: MenuConfig,

    /// Localization of menu labels.
    pub i18n: I18nConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Proxy listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8118").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8118".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Bind address of the admin API.
    pub bind_address: String,

    /// Bearer token required by the admin API. No auth when unset.
    pub api_key: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8119".to_string(),
            api_key: None,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON document holding persisted options.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "alt-tong-storage.json".to_string(),
        }
    }
}

/// Request host configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HostConfig {
    /// Accept-Language attached to requests that carry none.
    /// Derived from the system locale when unset.
    pub default_accept_language: Option<String>,

    /// Loopback URL used by the default-language probe.
    pub probe_url: String,

    /// Deadline for the probe in milliseconds.
    pub probe_timeout_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            default_accept_language: None,
            probe_url: "http://localhost/".to_string(),
            probe_timeout_ms: 2000,
        }
    }
}

/// How the single-entry toggle is rendered.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToggleStyle {
    /// Normal item whose label names the action a click will perform.
    #[default]
    Relabel,
    /// Native checkbox item.
    Checkbox,
}

/// Menu configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MenuConfig {
    pub toggle_style: ToggleStyle,
}

/// Localization configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct I18nConfig {
    /// Locale tag for menu labels (e.g. "ru"). System locale when unset.
    pub locale: Option<String>,
}

/// Timeout configuration for proxied requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9118".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AltTongConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8118");
        assert_eq!(config.host.probe_url, "http://localhost/");
        assert_eq!(config.menu.toggle_style, ToggleStyle::Relabel);
        assert!(config.admin.api_key.is_none());
    }

    #[test]
    fn test_partial_config() {
        let config: AltTongConfig = toml::from_str(
            r#"
            [menu]
            toggle_style = "checkbox"

            [host]
            default_accept_language = "en-US,en;q=0.5"
            "#,
        )
        .unwrap();
        assert_eq!(config.menu.toggle_style, ToggleStyle::Checkbox);
        assert_eq!(
            config.host.default_accept_language.as_deref(),
            Some("en-US,en;q=0.5")
        );
        assert_eq!(config.host.probe_timeout_ms, 2000);
    }
}
