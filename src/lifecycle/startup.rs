//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the request host from config (defaults, timeouts)
//! - Open durable storage and pick the message catalog
//! - Assemble the controller shared by the proxy and the admin API
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Without a configured default, the host's Accept-Language is derived
//!   from the system locale

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use url::Url;

use crate::config::validation::ValidationError;
use crate::config::{AltTongConfig, ConfigError};
use crate::controller::{AltTong, ProbeSettings};
use crate::error::AltTongError;
use crate::host::{HostDefaults, MenuBoard, WebRequestHub};
use crate::i18n::{Catalog, Locale};
use crate::storage::JsonFileStore;

/// Everything the listeners need.
pub struct Services {
    pub hub: Arc<WebRequestHub>,
    pub alt: Arc<AltTong>,
}

/// Accept-Language a browser in `locale` would send: "de-AT" →
/// "de-AT,de;q=0.5".
pub fn accept_language_for_locale(locale: &str) -> Option<String> {
    let tag = locale.split('.').next().unwrap_or_default().replace('_', "-");
    let primary = tag.split('-').next().unwrap_or_default();
    if primary.is_empty() || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if tag.len() == primary.len() {
        Some(primary.to_ascii_lowercase())
    } else {
        Some(format!("{tag},{};q=0.5", primary.to_ascii_lowercase()))
    }
}

fn host_defaults(config: &AltTongConfig) -> HostDefaults {
    let value = config
        .host
        .default_accept_language
        .clone()
        .or_else(|| sys_locale::get_locale().as_deref().and_then(accept_language_for_locale));

    let accept_language = value.and_then(|v| match HeaderValue::from_str(&v) {
        Ok(header) => Some(header),
        Err(_) => {
            tracing::warn!(value = %v, "Ignoring unusable default Accept-Language");
            None
        }
    });
    HostDefaults { accept_language }
}

fn probe_settings(config: &AltTongConfig) -> Result<ProbeSettings, ConfigError> {
    let url = Url::parse(&config.host.probe_url).map_err(|e| {
        ConfigError::Validation(vec![ValidationError::InvalidProbeUrl(e.to_string())])
    })?;
    Ok(ProbeSettings {
        url,
        timeout: Duration::from_millis(config.host.probe_timeout_ms),
    })
}

/// Build the host and the controller from a validated config.
pub fn build_services(config: &AltTongConfig) -> Result<Services, AltTongError> {
    let defaults = host_defaults(config);
    tracing::info!(
        accept_language = ?defaults.accept_language,
        "Host default Accept-Language"
    );

    let hub = Arc::new(WebRequestHub::new(
        defaults,
        Duration::from_secs(config.timeouts.connect_secs),
        Duration::from_secs(config.timeouts.request_secs),
    ));

    let locale = Locale::resolve(config.i18n.locale.as_deref());
    tracing::info!(locale = locale.code(), path = %config.storage.path, "Controller ready");

    let alt = AltTong::new(
        hub.clone(),
        Arc::new(MenuBoard::new()),
        Arc::new(JsonFileStore::new(&config.storage.path)),
        Catalog::shared(locale),
        config.menu.toggle_style,
        probe_settings(config)?,
    );

    Ok(Services {
        hub,
        alt: Arc::new(alt),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_language_for_locale() {
        assert_eq!(accept_language_for_locale("de-AT").as_deref(), Some("de-AT,de;q=0.5"));
        assert_eq!(accept_language_for_locale("ru_RU.UTF-8").as_deref(), Some("ru-RU,ru;q=0.5"));
        assert_eq!(accept_language_for_locale("fr").as_deref(), Some("fr"));
        assert_eq!(accept_language_for_locale(""), None);
    }

    #[test]
    fn test_configured_default_wins() {
        let mut config = AltTongConfig::default();
        config.host.default_accept_language = Some("ja".to_string());
        let defaults = host_defaults(&config);
        assert_eq!(defaults.accept_language, Some(HeaderValue::from_static("ja")));
    }

    #[tokio::test]
    async fn test_build_services_shares_hub() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AltTongConfig::default();
        config.storage.path = dir.path().join("store.json").display().to_string();
        config.host.default_accept_language = Some("en-US".to_string());

        let services = build_services(&config).unwrap();
        assert!(Arc::ptr_eq(&services.hub, services.alt.hub()));
        assert!(!services.alt.is_active());
    }

    #[test]
    fn test_bad_probe_url_is_fatal() {
        let mut config = AltTongConfig::default();
        config.host.probe_url = "not a url".to_string();
        assert!(matches!(
            build_services(&config),
            Err(AltTongError::Config(ConfigError::Validation(_)))
        ));
    }
}
