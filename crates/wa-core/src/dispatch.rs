//! Background delivery of auto-replies.
//!
//! The webhook never waits on the provider: each reply is sent on its own task
//! and the result is logged and reported on an outcome channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::{MessageSender, SendError, SendRequest, SendResponse};

/// Reported result of one background send.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub to: String,
    pub result: Result<SendResponse, SendError>,
}

impl DispatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Spawns outbound sends and reports how they went.
#[derive(Clone)]
pub struct ReplyDispatcher {
    sender: Option<Arc<dyn MessageSender>>,
    from: String,
    outcomes: Option<mpsc::UnboundedSender<DispatchOutcome>>,
}

impl ReplyDispatcher {
    /// Dispatcher sending through `sender` as `from`.
    pub fn new(sender: Arc<dyn MessageSender>, from: impl Into<String>) -> Self {
        Self {
            sender: Some(sender),
            from: from.into(),
            outcomes: None,
        }
    }

    /// Dispatcher that never sends, used when no provider credentials are configured.
    pub fn disabled() -> Self {
        Self {
            sender: None,
            from: String::new(),
            outcomes: None,
        }
    }

    /// Attach a fresh outcome channel and return its receiving half.
    pub fn with_outcomes(mut self) -> (Self, mpsc::UnboundedReceiver<DispatchOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outcomes = Some(tx);
        (self, rx)
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Send `text` to `to` in the background.
    ///
    /// Returns `None` without spawning when the dispatcher is disabled.
    pub fn dispatch(&self, to: &str, text: &str) -> Option<JoinHandle<()>> {
        let Some(sender) = self.sender.clone() else {
            debug!(to, "no sender configured, reply not sent");
            return None;
        };

        let to = to.to_string();
        let text = text.to_string();
        let from = self.from.clone();
        let outcomes = self.outcomes.clone();

        Some(tokio::spawn(async move {
            let result = sender
                .send(SendRequest {
                    to: &to,
                    from: &from,
                    text: &text,
                })
                .await;

            match &result {
                Ok(resp) => info!(to = %to, id = %resp.id, provider = resp.provider, "auto-reply sent"),
                Err(e) => error!(to = %to, provider = sender.provider(), "auto-reply send failed: {}", e),
            }

            if let Some(tx) = outcomes {
                // Receiver may be gone during shutdown.
                let _ = tx.send(DispatchOutcome { to, result });
            }
        }))
    }
}
