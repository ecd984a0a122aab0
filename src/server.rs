//! Wiring of stores, sender and routes into a running server.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};
use wa_core::{DispatchOutcome, MemoryStore, MessageRouter, ReplyDispatcher};
use wa_twilio::TwilioClient;
use wa_web_axum::AppState;
use wa_web_generic::WebhookProcessor;

use crate::config::AppConfig;

/// Build the dispatcher for the configured provider, if any.
pub fn build_dispatcher(config: &AppConfig) -> ReplyDispatcher {
    match config.twilio.credentials() {
        Some(creds) => {
            let client = TwilioClient::with_base_url(
                creds.account_sid,
                creds.auth_token,
                config.twilio.base_url.clone(),
            );
            ReplyDispatcher::new(Arc::new(client), creds.whatsapp_number)
        }
        None => {
            warn!("twilio credentials incomplete, auto-replies will not be sent");
            ReplyDispatcher::disabled()
        }
    }
}

/// Assemble the handler state around `store`.
///
/// The returned receiver yields one outcome per background send.
pub fn build_state(
    config: &AppConfig,
    store: MemoryStore,
) -> (AppState, UnboundedReceiver<DispatchOutcome>) {
    let store = Arc::new(store);
    let (dispatcher, outcomes) = build_dispatcher(config).with_outcomes();
    let processor = WebhookProcessor::new(
        MessageRouter::new(store.clone(), store.clone()),
        dispatcher,
        config.webhook.verify_token.clone(),
    );

    let state = AppState {
        processor,
        templates: store.clone(),
        conversations: store,
    };
    (state, outcomes)
}

/// Drain dispatch outcomes until every sender is gone.
pub async fn report_outcomes(mut outcomes: UnboundedReceiver<DispatchOutcome>) -> (usize, usize) {
    let (mut sent, mut failed) = (0, 0);
    while let Some(outcome) = outcomes.recv().await {
        if outcome.is_ok() {
            sent += 1;
        } else {
            failed += 1;
        }
        info!(to = %outcome.to, sent, failed, "auto-reply outcome");
    }
    (sent, failed)
}

/// Serve until ctrl-c.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let (state, outcomes) = build_state(&config, MemoryStore::seeded());
    tokio::spawn(report_outcomes(outcomes));

    let app = wa_web_axum::router(state);
    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
