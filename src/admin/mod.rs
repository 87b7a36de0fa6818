//! Admin API: the options surface and the menu, over HTTP.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::controller::AltTong;

#[derive(Clone)]
pub struct AdminState {
    pub alt: Arc<AltTong>,
    pub api_key: Option<String>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/options", get(get_options).put(put_options).post(post_options))
        .route("/admin/options/browser-default", post(post_browser_default))
        .route("/admin/options-page", get(get_options_page))
        .route("/admin/reconfigure", post(post_reconfigure))
        .route("/admin/accept-languages", get(get_accept_languages))
        .route("/admin/menu", get(get_menu))
        .route("/admin/menu/{id}/click", post(post_menu_click))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToggleStyle;
    use crate::controller::ProbeSettings;
    use crate::host::{HostDefaults, MenuBoard, WebRequestHub};
    use crate::i18n::{Catalog, Locale};
    use crate::storage::MemoryStore;
    use axum::body::Body;
    use axum::http::{HeaderValue, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn router(api_key: Option<&str>) -> Router {
        let hub = Arc::new(WebRequestHub::new(
            HostDefaults {
                accept_language: Some(HeaderValue::from_static("en-US")),
            },
            Duration::from_millis(200),
            Duration::from_millis(200),
        ));
        let alt = AltTong::new(
            hub,
            Arc::new(MenuBoard::new()),
            Arc::new(MemoryStore::new()),
            Catalog::shared(Locale::En),
            ToggleStyle::Relabel,
            ProbeSettings::default(),
        );
        setup_admin_router(AdminState {
            alt: Arc::new(alt),
            api_key: api_key.map(str::to_string),
        })
    }

    async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_options_form_round_trip() {
        let router = router(None);
        let (status, report) = call(
            &router,
            Method::PUT,
            "/admin/options",
            Some(json!({ "value": " fr ", "title": "French" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["shape"], "toggle");

        let (_, options) = call(&router, Method::GET, "/admin/options", None).await;
        assert_eq!(options, json!({ "optionList": [{ "value": "fr", "title": "French" }] }));
    }

    #[tokio::test]
    async fn test_menu_click_applies_override() {
        let router = router(None);
        call(
            &router,
            Method::POST,
            "/admin/options",
            Some(json!({ "optionList": [{ "value": "fr" }, { "value": "de" }] })),
        )
        .await;

        let (status, snapshot) = call(&router, Method::POST, "/admin/menu/at-i2/click", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["active"]["value"], "de");
        assert_eq!(snapshot["interceptor_installed"], true);

        let (status, _) = call(&router, Method::POST, "/admin/menu/at-i7/click", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, snapshot) = call(&router, Method::GET, "/admin/menu", None).await;
        assert!(snapshot["active"].is_null());
        assert_eq!(snapshot["interceptor_installed"], false);
    }

    #[tokio::test]
    async fn test_browser_default_and_probe() {
        let router = router(None);
        let (_, languages) = call(&router, Method::GET, "/admin/accept-languages", None).await;
        assert_eq!(languages["accept_language"], "en-US");

        let (status, _) = call(&router, Method::POST, "/admin/options/browser-default", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, options) = call(&router, Method::GET, "/admin/options", None).await;
        assert_eq!(options["optionList"][0]["value"], "en-US");
    }

    #[tokio::test]
    async fn test_options_page_request_drained() {
        let router = router(None);
        call(&router, Method::POST, "/admin/reconfigure", None).await;
        call(&router, Method::POST, "/admin/menu/cmiid-options/click", None).await;

        let (_, first) = call(&router, Method::GET, "/admin/options-page", None).await;
        let (_, second) = call(&router, Method::GET, "/admin/options-page", None).await;
        assert_eq!(first["requested"], true);
        assert_eq!(second["requested"], false);
    }

    #[tokio::test]
    async fn test_api_key_required_when_configured() {
        let router = router(Some("secret"));
        let (status, _) = call(&router, Method::GET, "/admin/status", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .uri("/admin/status")
            .header("authorization", "Bearer secret")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
