use serde::Deserialize;
use tracing::{error, warn};
use wa_core::{
    Headers, HttpStatus, InboundMessage, MessageRouter, ReplyDispatcher, RouteOutcome,
    WebhookError, WebhookResponse, header_value,
};

/// Raw webhook payload as posted by the messaging provider.
#[derive(Debug, Default, Deserialize)]
struct InboundPayload {
    #[serde(rename = "From", default)]
    from: Option<String>,
    #[serde(rename = "Body", default)]
    body: Option<String>,
}

/// Decode the `From`/`Body` pair from a JSON or form-encoded body.
pub fn parse_inbound(headers: &Headers, body: &[u8]) -> Result<InboundMessage, WebhookError> {
    let content_type = header_value(headers, "content-type").unwrap_or_default();

    let payload: InboundPayload = if content_type.starts_with("application/x-www-form-urlencoded")
    {
        serde_urlencoded::from_bytes(body)
            .map_err(|e| WebhookError::ParseError(format!("form decode: {}", e)))?
    } else {
        serde_json::from_slice(body)
            .map_err(|e| WebhookError::ParseError(format!("json decode: {}", e)))?
    };

    let from = payload
        .from
        .filter(|s| !s.is_empty())
        .ok_or(WebhookError::MissingField("From"))?;
    let body = payload
        .body
        .filter(|s| !s.is_empty())
        .ok_or(WebhookError::MissingField("Body"))?;

    Ok(InboundMessage { from, body })
}

/// Framework-agnostic webhook processor that handles the auto-reply logic
#[derive(Clone)]
pub struct WebhookProcessor {
    router: MessageRouter,
    dispatcher: ReplyDispatcher,
    verify_token: String,
}

impl WebhookProcessor {
    pub fn new(
        router: MessageRouter,
        dispatcher: ReplyDispatcher,
        verify_token: impl Into<String>,
    ) -> Self {
        Self {
            router,
            dispatcher,
            verify_token: verify_token.into(),
        }
    }

    /// Process an incoming webhook request and return a framework-agnostic response
    pub async fn process_webhook(&self, headers: Headers, body: &[u8]) -> WebhookResponse {
        match self.process_webhook_internal(&headers, body).await {
            Ok(_) => WebhookResponse::ok(),
            Err(e) => self.error_to_response(e),
        }
    }

    async fn process_webhook_internal(
        &self,
        headers: &Headers,
        body: &[u8],
    ) -> Result<RouteOutcome, WebhookError> {
        let message = parse_inbound(headers, body)?;
        let outcome = self.router.route(&message.from, &message.body).await?;

        if let Some(reply) = outcome.reply() {
            // Not awaited: the provider's answer must not hold up the webhook.
            let _ = self.dispatcher.dispatch(&message.from, reply);
        }
        Ok(outcome)
    }

    /// Answer a webhook subscription check.
    pub fn verify(&self, token: Option<&str>) -> WebhookResponse {
        match token {
            Some(t) if t == self.verify_token => WebhookResponse::ok(),
            _ => {
                warn!("webhook verification rejected");
                WebhookResponse::status(HttpStatus::Forbidden)
            }
        }
    }

    fn error_to_response(&self, error: WebhookError) -> WebhookResponse {
        match error {
            WebhookError::MissingField(field) => {
                warn!(field, "webhook rejected: missing field");
                WebhookResponse::status(HttpStatus::BadRequest)
            }
            WebhookError::ParseError(msg) => {
                warn!("webhook rejected: {}", msg);
                WebhookResponse::status(HttpStatus::BadRequest)
            }
            WebhookError::Store(e) => {
                error!("webhook error: {}", e);
                WebhookResponse::status(HttpStatus::InternalServerError)
            }
        }
    }
}

/// Helper trait for framework adapters to convert headers
pub trait HeaderConverter {
    type HeaderType;

    fn to_generic_headers(headers: &Self::HeaderType) -> Headers;
}

/// Helper trait for framework adapters to convert responses
pub trait ResponseConverter {
    type ResponseType;

    fn from_webhook_response(response: WebhookResponse) -> Self::ResponseType;
}
