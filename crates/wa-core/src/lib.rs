//! # WA Core
//!
//! Core traits and types for the wa-autoreply webhook receiver.
//!
//! This crate provides the building blocks shared by every other crate:
//! - [`Template`] and [`ConversationRecord`], the two stored collections
//! - [`TemplateStore`] / [`ConversationStore`] and the [`MemoryStore`] backend
//! - [`MessageRouter`] for keyword matching and conversation logging
//! - [`MessageSender`] for outbound replies and the [`ReplyDispatcher`] that runs them
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wa_core::{MemoryStore, MessageRouter};
//!
//! let store = Arc::new(MemoryStore::seeded());
//! let router = MessageRouter::new(store.clone(), store);
//! let outcome = router.route("whatsapp:+15550001111", "What are your hours?").await?;
//! assert!(outcome.is_resolved());
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub mod dispatch;
pub mod memory;
pub mod router;
pub mod store;

pub use dispatch::{DispatchOutcome, ReplyDispatcher};
pub use memory::MemoryStore;
pub use router::{MessageRouter, RouteOutcome, find_template};
pub use store::{ConversationStore, TemplateStore};

/// Reply text logged when no template matches an inbound message.
pub const NO_MATCH_RESPONSE: &str = "No matching template";

/// Display name recorded for every inbound customer.
pub const DEFAULT_CUSTOMER_NAME: &str = "Customer";

/// Errors that can occur while sending an outbound message
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// HTTP communication error
    #[error("http error: {0}")]
    Http(String),
    /// Authentication/authorization error
    #[error("authentication error: {0}")]
    Auth(String),
    /// Invalid request parameters
    #[error("invalid request: {0}")]
    Invalid(String),
    /// Messaging provider returned an error
    #[error("provider error: {0}")]
    Provider(String),
    /// Unexpected error occurred
    #[error("unexpected: {0}")]
    Unexpected(String),
}

/// Errors reported by a template or conversation store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while handling an inbound webhook call
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("parsing failed: {0}")]
    ParseError(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// HTTP status code for web responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,
    BadRequest = 400,
    Forbidden = 403,
    InternalServerError = 500,
}

impl HttpStatus {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn reason(self) -> &'static str {
        match self {
            HttpStatus::Ok => "OK",
            HttpStatus::BadRequest => "Bad Request",
            HttpStatus::Forbidden => "Forbidden",
            HttpStatus::InternalServerError => "Internal Server Error",
        }
    }
}

/// Keyword-to-response mapping used for auto-reply matching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Template {
    pub id: String,
    /// Always stored lowercase.
    pub keyword: String,
    pub response: String,
}

impl Template {
    /// Build a template with a freshly generated id.
    pub fn new(keyword: &str, response: impl Into<String>) -> Self {
        Self::with_id(generate_id(), keyword, response)
    }

    pub fn with_id(id: impl Into<String>, keyword: &str, response: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keyword: keyword.to_lowercase(),
            response: response.into(),
        }
    }
}

/// The templates a fresh server starts with.
pub fn default_templates() -> Vec<Template> {
    vec![
        Template::with_id(
            "1",
            "hours",
            "We are open Monday to Friday, 9 AM to 6 PM. Saturday 10 AM to 4 PM. Closed on Sunday.",
        ),
        Template::with_id(
            "2",
            "location",
            "We are located at 123 Business Street, City Center. Parking is available in front of the building.",
        ),
        Template::with_id(
            "3",
            "pricing",
            "Please visit our website or call us for detailed pricing information.",
        ),
    ]
}

/// Resolution state of a logged conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Resolved,
    Pending,
}

/// Log entry of one inbound message and its resolution outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub id: String,
    pub customer_name: String,
    pub customer_number: String,
    pub last_message: String,
    pub ai_response: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub status: ConversationStatus,
}

/// Normalized inbound WhatsApp message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboundMessage {
    pub from: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest<'a> {
    pub to: &'a str,
    pub from: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    pub id: String,
    /// Name of the backend/provider that produced the response, e.g. "twilio".
    pub provider: &'static str,
    /// Raw provider payload for debugging / audit.
    pub raw: serde_json::Value,
}

/// Generic webhook response that can be converted to any framework's response type
#[derive(Debug, Clone)]
pub struct WebhookResponse {
    pub status: HttpStatus,
    pub body: String,
    pub content_type: String,
}

impl WebhookResponse {
    /// Bare status reply with the canonical reason phrase as body.
    pub fn status(status: HttpStatus) -> Self {
        Self {
            status,
            body: status.reason().to_string(),
            content_type: "text/plain; charset=utf-8".to_string(),
        }
    }

    pub fn ok() -> Self {
        Self::status(HttpStatus::Ok)
    }

    pub fn error(status: HttpStatus, message: &str) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message }).to_string(),
            content_type: "application/json".to_string(),
        }
    }
}

/// Outbound channel used for auto-replies.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Stable provider key, e.g. "twilio".
    fn provider(&self) -> &'static str;

    /// Send a single text message.
    async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, SendError>;
}

/// Generate a new record/template identifier.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Utility to create a pseudo id if a provider doesn't return one.
pub fn fallback_id() -> String {
    generate_id()
}

/// Lightweight header representation to avoid tying the core to any HTTP framework.
pub type Headers = Vec<(String, String)>;

/// Case-insensitive header lookup.
pub fn header_value<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
