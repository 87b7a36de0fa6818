//! Accept-Language rewriting.
//!
//! # Responsibilities
//! - Rewrite the first `accept-language` header of every web request
//! - Install the rewrite hook only while an override is active
//! - Keep the active value and the hook registration in lockstep
//!
//! # Design Decisions
//! - The hook holds a handle to the active cell instead of a copied value,
//!   so switching between candidates never re-registers the hook
//! - Absent headers are not added
//! - Probe requests (marked by the sniff header) pass untouched so the probe
//!   observes the host default

use std::sync::{Arc, Mutex};

use axum::http::header::{HeaderValue, ACCEPT_LANGUAGE};

use crate::controller::probe::SNIFF_HEADER;
use crate::controller::store::{ActiveOverride, OverrideValue};
use crate::host::{HookAction, HttpHeader, ListenerId, RequestDetails, RequestFilter, RequestListener, WebRequestHub};
use crate::observability::metrics;

/// Replace the value of the first `accept-language` header. Returns true if
/// a header was rewritten.
pub fn rewrite_accept_language(headers: &mut [HttpHeader], value: &HeaderValue) -> bool {
    match headers.iter_mut().find(|h| h.is(ACCEPT_LANGUAGE.as_str())) {
        Some(header) => {
            header.value = value.clone();
            true
        }
        None => false,
    }
}

/// The request hook.
pub struct HeaderRewriter {
    active: ActiveOverride,
}

impl HeaderRewriter {
    pub fn new(active: ActiveOverride) -> Self {
        Self { active }
    }
}

impl RequestListener for HeaderRewriter {
    fn on_before_send_headers(&self, details: &mut RequestDetails) -> HookAction {
        if details.header(SNIFF_HEADER).is_some() {
            return HookAction::Continue;
        }

        let Some(active) = self.active.get() else {
            tracing::error!(
                request_id = %details.request_id,
                "Rewrite hook ran without an active override"
            );
            return HookAction::Continue;
        };

        let value = match HeaderValue::from_str(&active.value) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(
                    request_id = %details.request_id,
                    value = %active.value,
                    error = %e,
                    "Override is not a valid header value, request left unchanged"
                );
                return HookAction::Continue;
            }
        };

        if rewrite_accept_language(&mut details.headers, &value) {
            metrics::record_header_rewrite();
            tracing::trace!(
                request_id = %details.request_id,
                url = %details.url,
                value = %active.value,
                "Accept-Language rewritten"
            );
        }
        HookAction::Continue
    }
}

/// Installs and removes the single rewrite hook.
pub struct Interceptor {
    hub: Arc<WebRequestHub>,
    rewriter: Arc<HeaderRewriter>,
    current: Mutex<Option<ListenerId>>,
}

impl Interceptor {
    pub fn new(hub: Arc<WebRequestHub>, active: ActiveOverride) -> Self {
        Self {
            hub,
            rewriter: Arc::new(HeaderRewriter::new(active)),
            current: Mutex::new(None),
        }
    }

    pub fn on(&self) {
        let mut current = self.current.lock().expect("interceptor mutex poisoned");
        if current.is_none() {
            let id = self.hub.add_listener(self.rewriter.clone(), RequestFilter::all_web());
            tracing::info!("Accept-Language interceptor on");
            *current = Some(id);
        }
    }

    pub fn off(&self) {
        let mut current = self.current.lock().expect("interceptor mutex poisoned");
        if let Some(id) = current.take() {
            self.hub.remove_listener(id);
            tracing::info!("Accept-Language interceptor off");
        }
    }

    pub fn is_installed(&self) -> bool {
        self.current.lock().expect("interceptor mutex poisoned").is_some()
    }
}

/// Active value plus interceptor, changed together.
pub struct HeaderOverride {
    active: ActiveOverride,
    interceptor: Interceptor,
}

impl HeaderOverride {
    pub fn new(hub: Arc<WebRequestHub>) -> Self {
        let active = ActiveOverride::new();
        Self {
            interceptor: Interceptor::new(hub, active.clone()),
            active,
        }
    }

    /// `Some` installs the hook, `None` removes it.
    pub fn set_active(&self, value: Option<OverrideValue>) {
        match value {
            Some(value) => {
                tracing::debug!(value = %value.value, "Override selected");
                self.active.set(Some(value));
                self.interceptor.on();
            }
            None => {
                self.interceptor.off();
                self.active.set(None);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn current(&self) -> Option<Arc<OverrideValue>> {
        self.active.get()
    }

    pub fn is_installed(&self) -> bool {
        self.interceptor.is_installed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Disposition, HostDefaults, OutgoingRequest};
    use axum::http::header::{HeaderName, ACCEPT, USER_AGENT};
    use axum::http::Method;
    use std::time::Duration;
    use url::Url;

    fn hub() -> Arc<WebRequestHub> {
        Arc::new(WebRequestHub::new(
            HostDefaults::default(),
            Duration::from_secs(1),
            Duration::from_secs(1),
        ))
    }

    fn request(headers: &[(HeaderName, &'static str)]) -> RequestDetails {
        let mut request = OutgoingRequest::new(Method::GET, Url::parse("https://example.com/").unwrap());
        for (name, value) in headers {
            request = request.with_header(name.clone(), HeaderValue::from_static(value));
        }
        request.details
    }

    #[test]
    fn test_rewrites_only_accept_language() {
        let headers = [
            (USER_AGENT, "test-agent"),
            (ACCEPT_LANGUAGE, "en-US"),
            (ACCEPT, "text/html"),
        ];
        let mut details = request(&headers);
        let before = details.headers.clone();

        assert!(rewrite_accept_language(&mut details.headers, &HeaderValue::from_static("fr")));
        assert_eq!(details.headers[0], before[0]);
        assert_eq!(details.headers[1].value, "fr");
        assert_eq!(details.headers[2], before[2]);
    }

    #[test]
    fn test_first_header_only_and_none_added() {
        let mut twice = request(&[(ACCEPT_LANGUAGE, "en"), (ACCEPT_LANGUAGE, "de")]);
        rewrite_accept_language(&mut twice.headers, &HeaderValue::from_static("fr"));
        assert_eq!(twice.headers[0].value, "fr");
        assert_eq!(twice.headers[1].value, "de");

        let mut absent = request(&[(USER_AGENT, "x")]);
        assert!(!rewrite_accept_language(&mut absent.headers, &HeaderValue::from_static("fr")));
        assert_eq!(absent.headers.len(), 1);
    }

    #[test]
    fn test_hook_installed_iff_active() {
        let hub = hub();
        let header = HeaderOverride::new(hub.clone());
        assert!(!header.is_installed());
        assert_eq!(hub.listener_count(), 0);

        header.set_active(Some(OverrideValue::new("fr")));
        assert!(header.is_active() && header.is_installed());
        header.set_active(Some(OverrideValue::new("de")));
        assert_eq!(hub.listener_count(), 1);

        let mut details = request(&[(ACCEPT_LANGUAGE, "en")]);
        assert_eq!(hub.dispatch(&mut details), Disposition::Proceed);
        assert_eq!(details.headers[0].value, "de");

        header.set_active(None);
        assert!(!header.is_active() && !header.is_installed());
        assert_eq!(hub.listener_count(), 0);

        let mut untouched = request(&[(ACCEPT_LANGUAGE, "en")]);
        hub.dispatch(&mut untouched);
        assert_eq!(untouched.headers[0].value, "en");
    }

    #[test]
    fn test_interceptor_toggles_are_idempotent() {
        let hub = hub();
        let interceptor = Interceptor::new(hub.clone(), ActiveOverride::new());
        interceptor.off();
        interceptor.on();
        interceptor.on();
        assert_eq!(hub.listener_count(), 1);
        interceptor.off();
        interceptor.off();
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn test_invalid_override_leaves_request_alone() {
        let hub = hub();
        let header = HeaderOverride::new(hub.clone());
        header.set_active(Some(OverrideValue::new("fr\nde")));

        let mut details = request(&[(ACCEPT_LANGUAGE, "en")]);
        hub.dispatch(&mut details);
        assert_eq!(details.headers[0].value, "en");
    }
}
