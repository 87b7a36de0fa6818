//! Default Accept-Language probe.
//!
//! The host attaches its own Accept-Language to requests, and only the
//! request path knows the final value. The probe sends a marked `HEAD`
//! request to a loopback URL, catches it with a one-shot hook, reads the
//! header and cancels the request before it leaves the host.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::header::{HeaderName, HeaderValue, ACCEPT_LANGUAGE};
use axum::http::Method;
use tokio::sync::oneshot;
use url::Url;

use crate::error::ProbeError;
use crate::host::{
    HookAction, MatchPattern, OutgoingRequest, RequestDetails, RequestFilter, RequestListener,
    WebRequestHub,
};
use crate::observability::metrics;

/// Marker header identifying probe requests.
pub const SNIFF_HEADER: &str = "x-alttong-sniff-header";
const SNIFF_HEADER_VALUE: &str = "Accept-Languages";

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub url: Url,
    pub timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            url: Url::parse("http://localhost/").expect("static URL"),
            timeout: Duration::from_secs(2),
        }
    }
}

struct Sniffer {
    sender: Mutex<Option<oneshot::Sender<Option<String>>>>,
}

impl RequestListener for Sniffer {
    fn on_before_send_headers(&self, details: &mut RequestDetails) -> HookAction {
        if details.header(SNIFF_HEADER).is_none() {
            return HookAction::Continue;
        }

        let accept_language = details
            .header(ACCEPT_LANGUAGE.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match self.sender.lock().expect("probe mutex poisoned").take() {
            Some(sender) => {
                // The receiver is gone only if the probe already gave up.
                let _ = sender.send(accept_language);
            }
            None => tracing::debug!("Probe hook fired after resolution"),
        }
        HookAction::Cancel
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

/// Resolve the Accept-Language the host would send. `Ok(None)` means the
/// host sends no such header.
pub async fn sniff_accept_language(
    hub: &WebRequestHub,
    settings: &ProbeSettings,
) -> Result<Option<String>, ProbeError> {
    let (sender, mut receiver) = oneshot::channel();
    let sniffer = Arc::new(Sniffer {
        sender: Mutex::new(Some(sender)),
    });
    let filter = RequestFilter::new(vec![MatchPattern::for_url(&settings.url)?]);
    let id = hub.add_listener(sniffer.clone(), filter);

    let request = OutgoingRequest::new(Method::HEAD, settings.url.clone()).with_header(
        HeaderName::from_static(SNIFF_HEADER),
        HeaderValue::from_static(SNIFF_HEADER_VALUE),
    );
    let sent = tokio::time::timeout(settings.timeout, hub.send(request)).await;

    hub.remove_listener(id);
    drop(sniffer);

    if let Ok(value) = receiver.try_recv() {
        metrics::record_probe("ok");
        tracing::debug!(accept_language = ?value, "Default Accept-Language sniffed");
        return Ok(value);
    }

    metrics::record_probe("error");
    match sent {
        Err(_) => Err(ProbeError::Timeout(timeout_millis(settings.timeout))),
        Ok(Err(e)) => Err(ProbeError::Request(e)),
        Ok(Ok(_)) => {
            tracing::error!(url = %settings.url, "Probe request was not intercepted");
            Err(ProbeError::NotIntercepted)
        }
    }
}
