use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::controller::{ClickHandler, ConfigureReport, MenuSnapshot, OptionList, OverrideValue};
use crate::error::HostError;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub active: Option<OverrideValue>,
    pub interceptor_installed: bool,
    pub click_handler: Option<ClickHandler>,
}

/// Body of the options form: one value and an optional title.
#[derive(Debug, Deserialize)]
pub struct OptionsForm {
    pub value: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct AcceptLanguages {
    pub accept_language: Option<String>,
}

#[derive(Serialize)]
pub struct OptionsPageRequest {
    pub requested: bool,
}

/// JSON error body with a status code.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl ToString) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let snapshot = state.alt.snapshot();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        active: snapshot.active,
        interceptor_installed: snapshot.interceptor_installed,
        click_handler: snapshot.click_handler,
    })
}

pub async fn get_options(State(state): State<AdminState>) -> Result<Json<OptionList>, ApiError> {
    state
        .alt
        .get_options()
        .await
        .map(Json)
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e))
}

pub async fn put_options(
    State(state): State<AdminState>,
    Json(form): Json<OptionsForm>,
) -> Json<ConfigureReport> {
    let options = OptionList::from_form(&form.value, form.title.as_deref());
    Json(state.alt.configure(Some(options)).await)
}

pub async fn post_options(
    State(state): State<AdminState>,
    Json(options): Json<OptionList>,
) -> Json<ConfigureReport> {
    Json(state.alt.configure(Some(options)).await)
}

pub async fn post_reconfigure(State(state): State<AdminState>) -> Json<ConfigureReport> {
    Json(state.alt.configure(None).await)
}

/// Replace the value with the browser default, keeping the current title.
pub async fn post_browser_default(
    State(state): State<AdminState>,
) -> Result<Json<ConfigureReport>, ApiError> {
    let default = state
        .alt
        .get_accept_languages()
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_GATEWAY, e))?
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "host sends no Accept-Language"))?;

    let title = state
        .alt
        .get_options()
        .await
        .ok()
        .and_then(|o| o.option_list.into_iter().next())
        .and_then(|first| first.title);

    let options = OptionList::from_form(&default, title.as_deref());
    Ok(Json(state.alt.configure(Some(options)).await))
}

pub async fn get_accept_languages(
    State(state): State<AdminState>,
) -> Result<Json<AcceptLanguages>, ApiError> {
    state
        .alt
        .get_accept_languages()
        .await
        .map(|accept_language| Json(AcceptLanguages { accept_language }))
        .map_err(|e| ApiError::new(StatusCode::BAD_GATEWAY, e))
}

pub async fn get_menu(State(state): State<AdminState>) -> Json<MenuSnapshot> {
    Json(state.alt.snapshot())
}

pub async fn post_menu_click(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<MenuSnapshot>, ApiError> {
    match state.alt.click_menu_item(&id) {
        Ok(()) => Ok(Json(state.alt.snapshot())),
        Err(e @ HostError::UnknownMenuItem(_)) => Err(ApiError::new(StatusCode::NOT_FOUND, e)),
        Err(e) => Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e)),
    }
}

pub async fn get_options_page(State(state): State<AdminState>) -> Json<OptionsPageRequest> {
    Json(OptionsPageRequest {
        requested: state.alt.surface().take_options_request(),
    })
}
