//! HTTP proxy server.
//!
//! # Responsibilities
//! - Create the Axum router with the forwarding handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Pass every request through the hook hub before it goes upstream

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AltTongConfig;
use crate::error::HostError;
use crate::host::{SendOutcome, WebRequestHub};
use crate::http::request::{self, TargetError};
use crate::observability::metrics;

/// Largest request body buffered for forwarding.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct ProxyState {
    pub hub: Arc<WebRequestHub>,
}

/// The forward proxy.
pub struct ProxyServer {
    router: Router,
}

impl ProxyServer {
    pub fn new(config: &AltTongConfig, hub: Arc<WebRequestHub>) -> Self {
        let state = ProxyState { hub };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AltTongConfig, state: ProxyState) -> Router {
        let (set_id, propagate_id) = request::request_id_layers();
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_id)
            .layer(TraceLayer::new_for_http())
            .layer(set_id)
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Proxy listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Proxy stopped");
        Ok(())
    }
}

async fn proxy_handler(State(state): State<ProxyState>, request: Request<Body>) -> Response {
    let request_id = request::request_id(request.headers());
    let method = request.method().clone();

    if method == Method::CONNECT {
        metrics::record_request("rejected");
        return (StatusCode::METHOD_NOT_ALLOWED, "CONNECT tunnelling is not supported").into_response();
    }

    let url = match request::target_url(request.uri()) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(request_id = %request_id, uri = %request.uri(), error = ?e, "Not a proxy request");
            metrics::record_request("rejected");
            let message = match e {
                TargetError::NotAbsolute => "Absolute-form request target required".to_string(),
                TargetError::UnsupportedScheme(s) => format!("Unsupported scheme '{s}'"),
                TargetError::Invalid(reason) => format!("Invalid target: {reason}"),
            };
            return (StatusCode::BAD_REQUEST, message).into_response();
        }
    };

    tracing::debug!(request_id = %request_id, method = %method, url = %url, "Proxying request");

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to read request body");
            metrics::record_request("rejected");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let outgoing = request::to_outgoing(request_id.clone(), method, url, &parts.headers, body);
    match state.hub.send(outgoing).await {
        Ok(SendOutcome::Completed(response)) => {
            metrics::record_request("forwarded");
            let (mut parts, body) = response.into_parts();
            request::strip_hop_by_hop(&mut parts.headers);
            Response::from_parts(parts, Body::new(body))
        }
        Ok(SendOutcome::Cancelled) => {
            metrics::record_request("cancelled");
            (StatusCode::FORBIDDEN, "Request cancelled").into_response()
        }
        Err(HostError::Timeout(secs)) => {
            tracing::error!(request_id = %request_id, secs, "Upstream timed out");
            metrics::record_request("error");
            (StatusCode::GATEWAY_TIMEOUT, "Upstream timed out").into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_request("error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostDefaults;
    use tower::ServiceExt;

    fn server() -> ProxyServer {
        let hub = Arc::new(WebRequestHub::new(
            HostDefaults::default(),
            Duration::from_millis(200),
            Duration::from_millis(200),
        ));
        ProxyServer::new(&AltTongConfig::default(), hub)
    }

    #[tokio::test]
    async fn test_origin_form_is_rejected() {
        let response = server()
            .router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().contains_key(request::X_REQUEST_ID));
    }

    #[tokio::test]
    async fn test_connect_is_rejected() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::CONNECT)
                    .uri("example.com:443")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
