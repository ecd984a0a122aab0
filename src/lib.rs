//! # WA Autoreply
//!
//! A WhatsApp webhook receiver that answers inbound messages from
//! keyword-matched response templates.
//!
//! ## Features
//!
//! - **Keyword routing**: first template whose keyword occurs in the message wins
//! - **Conversation log**: every accepted message is recorded with its outcome
//! - **Background replies**: auto-replies go out through Twilio without delaying the webhook
//! - **Pluggable storage**: templates and conversations live behind store traits
//! - **Configuration**: defaults, config files, and environment variables
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wa_autoreply::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     wa_autoreply::logging::init(&config.logging);
//!     wa_autoreply::server::run(config).await
//! }
//! ```
//!
//! ## Configuration
//!
//! Settings are layered from built-in defaults, `config/*` files and
//! `AUTOREPLY__SECTION__KEY` environment variables. The flat variables
//! `PORT`, `VERIFY_TOKEN`, `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN` and
//! `TWILIO_WHATSAPP_NUMBER` are honored last.

pub mod config;
pub mod logging;
pub mod server;

pub use crate::config::*;

/// Common imports for wa-autoreply usage
pub mod prelude {
    pub use crate::config::{
        AppConfig, LoggingConfig, ServerConfig, TwilioConfig, TwilioCredentials, WebhookConfig,
    };
    pub use wa_core::*;
    pub use wa_twilio::TwilioClient;
    pub use wa_web_axum::{AppState, router};
    pub use wa_web_generic::WebhookProcessor;
}
