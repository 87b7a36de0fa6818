//! Outgoing request hooks.
//!
//! # Responsibilities
//! - Register and remove header hooks filtered by URL pattern
//! - Run matching hooks over each outgoing request's header list
//! - Attach host defaults (Accept-Language) the way a browser would
//! - Forward surviving requests upstream
//!
//! # Design Decisions
//! - Hooks run synchronously and block the request until they return
//! - Hooks run in registration order; `Cancel` stops dispatch
//! - The registry lock is released before hooks run, so a hook may
//!   add or remove listeners (including itself)
//! - Removal is tolerant: removing an unknown id is a no-op

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::header::{HeaderName, HeaderValue, ACCEPT_LANGUAGE};
use axum::http::{Method, Request, Response};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use url::Url;

use crate::error::HostError;
use crate::host::pattern::RequestFilter;

/// One header of an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpHeader {
    pub name: HeaderName,
    pub value: HeaderValue,
}

impl HttpHeader {
    pub fn new(name: HeaderName, value: HeaderValue) -> Self {
        Self { name, value }
    }

    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.as_str().eq_ignore_ascii_case(name)
    }
}

/// What hooks see and may mutate.
#[derive(Debug, Clone)]
pub struct RequestDetails {
    pub request_id: String,
    pub method: Method,
    pub url: Url,
    pub headers: Vec<HttpHeader>,
}

impl RequestDetails {
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.iter().find(|h| h.is(name)).map(|h| &h.value)
    }
}

/// A request on its way out of the host.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub details: RequestDetails,
    pub body: Bytes,
}

impl OutgoingRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            details: RequestDetails {
                request_id: uuid::Uuid::new_v4().to_string(),
                method,
                url,
                headers: Vec::new(),
            },
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.details.headers.push(HttpHeader::new(name, value));
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.details.request_id = request_id.into();
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }
}

/// Hook verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookAction {
    Continue,
    Cancel,
}

/// Result of running all hooks over one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Proceed,
    Cancelled,
}

/// A blocking `before send headers` hook.
pub trait RequestListener: Send + Sync {
    fn on_before_send_headers(&self, details: &mut RequestDetails) -> HookAction;
}

/// Handle of a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    listener: Arc<dyn RequestListener>,
    filter: RequestFilter,
}

/// Defaults the host attaches to requests.
#[derive(Debug, Clone, Default)]
pub struct HostDefaults {
    pub accept_language: Option<HeaderValue>,
}

/// Outcome of [`WebRequestHub::send`].
#[derive(Debug)]
pub enum SendOutcome {
    Cancelled,
    Completed(Response<Incoming>),
}

/// Registry of request hooks plus the upstream client.
pub struct WebRequestHub {
    registrations: Mutex<Vec<Registration>>,
    next_id: AtomicU64,
    defaults: HostDefaults,
    client: Client<HttpConnector, Body>,
    request_timeout: Duration,
}

impl WebRequestHub {
    pub fn new(defaults: HostDefaults, connect_timeout: Duration, request_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));

        Self {
            registrations: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            defaults,
            client: Client::builder(TokioExecutor::new()).build(connector),
            request_timeout,
        }
    }

    /// Register `listener`. Registering an instance that is already
    /// registered is a no-op returning the existing id.
    pub fn add_listener(&self, listener: Arc<dyn RequestListener>, filter: RequestFilter) -> ListenerId {
        let mut registrations = self.registrations.lock().expect("hook registry mutex poisoned");
        if let Some(existing) = registrations
            .iter()
            .find(|r| same_listener(&r.listener, &listener))
        {
            tracing::debug!(listener = existing.id.0, "Listener already registered");
            return existing.id;
        }

        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        registrations.push(Registration { id, listener, filter });
        tracing::debug!(listener = id.0, "Listener registered");
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut registrations = self.registrations.lock().expect("hook registry mutex poisoned");
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        let removed = registrations.len() != before;
        if !removed {
            tracing::debug!(listener = id.0, "Removal of unregistered listener ignored");
        }
        removed
    }

    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.registrations
            .lock()
            .expect("hook registry mutex poisoned")
            .iter()
            .any(|r| r.id == id)
    }

    pub fn listener_count(&self) -> usize {
        self.registrations.lock().expect("hook registry mutex poisoned").len()
    }

    /// Run matching hooks over `details`.
    pub fn dispatch(&self, details: &mut RequestDetails) -> Disposition {
        let matching: Vec<_> = self
            .registrations
            .lock()
            .expect("hook registry mutex poisoned")
            .iter()
            .filter(|r| r.filter.matches(&details.url))
            .map(|r| (r.id, r.listener.clone()))
            .collect();

        for (id, listener) in matching {
            if listener.on_before_send_headers(details) == HookAction::Cancel {
                tracing::debug!(
                    request_id = %details.request_id,
                    listener = id.0,
                    url = %details.url,
                    "Request cancelled by hook"
                );
                return Disposition::Cancelled;
            }
        }
        Disposition::Proceed
    }

    /// Attach host defaults to a request lacking them.
    pub fn apply_defaults(&self, details: &mut RequestDetails) {
        if let Some(default) = &self.defaults.accept_language {
            if details.header(ACCEPT_LANGUAGE.as_str()).is_none() {
                details
                    .headers
                    .push(HttpHeader::new(ACCEPT_LANGUAGE, default.clone()));
            }
        }
    }

    /// Apply defaults, run hooks, and forward the request if no hook
    /// cancelled it.
    pub async fn send(&self, request: OutgoingRequest) -> Result<SendOutcome, HostError> {
        let OutgoingRequest { mut details, body } = request;
        self.apply_defaults(&mut details);

        if self.dispatch(&mut details) == Disposition::Cancelled {
            return Ok(SendOutcome::Cancelled);
        }

        let mut builder = Request::builder()
            .method(details.method.clone())
            .uri(details.url.as_str());
        for header in &details.headers {
            builder = builder.header(header.name.clone(), header.value.clone());
        }
        let upstream = builder.body(Body::from(body))?;

        match tokio::time::timeout(self.request_timeout, self.client.request(upstream)).await {
            Ok(result) => Ok(SendOutcome::Completed(result?)),
            Err(_) => Err(HostError::Timeout(self.request_timeout.as_secs())),
        }
    }
}

fn same_listener(a: &Arc<dyn RequestListener>, b: &Arc<dyn RequestListener>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
