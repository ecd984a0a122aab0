use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::error;
use wa_core::{
    ConversationRecord, ConversationStore, Headers, StoreError, Template, TemplateStore,
    WebhookResponse,
};
use wa_web_generic::{HeaderConverter, ResponseConverter, WebhookProcessor};

#[derive(Clone)]
pub struct AppState {
    pub processor: WebhookProcessor,
    pub templates: Arc<dyn TemplateStore>,
    pub conversations: Arc<dyn ConversationStore>,
}

/// Errors returned by the REST handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(e) => {
                error!("store error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Axum-specific header converter
pub struct AxumHeaderConverter;

impl HeaderConverter for AxumHeaderConverter {
    type HeaderType = HeaderMap;

    fn to_generic_headers(headers: &Self::HeaderType) -> Headers {
        headers
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }
}

/// Axum-specific response converter
pub struct AxumResponseConverter;

impl ResponseConverter for AxumResponseConverter {
    type ResponseType = Response;

    fn from_webhook_response(response: WebhookResponse) -> Self::ResponseType {
        let status = StatusCode::from_u16(response.status.as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, response.content_type)],
            response.body,
        )
            .into_response()
    }
}

/// Body of `POST /api/templates`.
#[derive(Debug, Deserialize)]
pub struct NewTemplate {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

impl NewTemplate {
    fn into_template(self) -> Result<Template, ApiError> {
        let keyword = self
            .keyword
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ApiError::Validation("keyword is required".into()))?;
        let response = self
            .response
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ApiError::Validation("response is required".into()))?;
        Ok(Template::new(&keyword, response))
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub verification_token: Option<String>,
}

/// GET /api/templates
pub async fn list_templates(State(state): State<AppState>) -> Result<Json<Vec<Template>>, ApiError> {
    Ok(Json(state.templates.list().await?))
}

/// POST /api/templates
pub async fn create_template(
    State(state): State<AppState>,
    Json(new): Json<NewTemplate>,
) -> Result<Json<Template>, ApiError> {
    let template = new.into_template()?;
    state.templates.append(template.clone()).await?;
    Ok(Json(template))
}

/// DELETE /api/templates/{id}
///
/// Reports success whether or not the id existed.
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.templates.delete(&id).await?;
    Ok(Json(json!({ "success": true })))
}

/// GET /api/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConversationRecord>>, ApiError> {
    Ok(Json(state.conversations.list().await?))
}

/// POST /webhook/messages
pub async fn receive_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let generic_headers = AxumHeaderConverter::to_generic_headers(&headers);
    let response = state.processor.process_webhook(generic_headers, &body).await;
    AxumResponseConverter::from_webhook_response(response)
}

/// GET /webhook/messages?verification_token=...
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> impl IntoResponse {
    let response = state.processor.verify(query.verification_token.as_deref());
    AxumResponseConverter::from_webhook_response(response)
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Full application router with permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/templates", get(list_templates).post(create_template))
        .route("/api/templates/{id}", delete(delete_template))
        .route("/api/conversations", get(list_conversations))
        .route("/webhook/messages", get(verify_webhook).post(receive_message))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
