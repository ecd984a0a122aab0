use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;
use wa_core::{MessageSender, SendError, SendRequest, SendResponse};

const PROVIDER: &str = "twilio";

pub const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

/// Twilio REST client for the WhatsApp channel.
#[derive(Clone, Debug)]
pub struct TwilioClient {
    /// Twilio Account SID (user for Basic auth).
    pub account_sid: String,
    /// Twilio Auth Token (password for Basic auth).
    pub auth_token: String,
    /// API base URL; override for testing/mocking.
    pub base_url: String,
    http: reqwest::Client,
}

impl TwilioClient {
    pub fn new<S: Into<String>>(account_sid: S, auth_token: S) -> Self {
        Self::with_base_url(account_sid, auth_token, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url<S: Into<String>>(account_sid: S, auth_token: S, base_url: String) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            base_url,
            http: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url.trim_end_matches('/'),
            self.account_sid
        )
    }
}

/// Prefix a bare number with the WhatsApp channel marker.
pub fn whatsapp_address(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{}", number)
    }
}

#[derive(Debug, Serialize)]
struct TwilioSendRequest<'a> {
    #[serde(rename = "From")]
    from: String,
    #[serde(rename = "To")]
    to: &'a str,
    #[serde(rename = "Body")]
    body: &'a str,
}

#[async_trait]
impl MessageSender for TwilioClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, SendError> {
        if req.to.is_empty() {
            return Err(SendError::Invalid("recipient is empty".into()));
        }
        if req.text.is_empty() {
            return Err(SendError::Invalid("message body is empty".into()));
        }

        let payload = TwilioSendRequest {
            from: whatsapp_address(req.from),
            to: req.to,
            body: req.text,
        };
        debug!(to = req.to, "posting message to twilio");

        let res = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&payload)
            .send()
            .await
            .map_err(|e| SendError::Http(e.to_string()))?;

        let status = res.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            let body = res.text().await.unwrap_or_default();
            return Err(SendError::Auth(body));
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(SendError::Provider(format!("HTTP {}: {}", status, body)));
        }

        let raw_text = res
            .text()
            .await
            .map_err(|e| SendError::Http(e.to_string()))?;
        let raw_json: serde_json::Value = serde_json::from_str(&raw_text)
            .unwrap_or_else(|_| serde_json::json!({ "raw": raw_text }));

        let id = raw_json
            .get("sid")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(wa_core::fallback_id);

        Ok(SendResponse {
            id,
            provider: PROVIDER,
            raw: raw_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        extract::{Form, State},
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<(Option<String>, HashMap<String, String>)>>>;

    async fn spawn_fake_twilio(status: StatusCode, body: &'static str) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route(
                "/2010-04-01/Accounts/{sid}/Messages.json",
                post(
                    move |State(seen): State<Captured>,
                          headers: HeaderMap,
                          Form(form): Form<HashMap<String, String>>| async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        seen.lock().unwrap().push((auth, form));
                        (status, body)
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), captured)
    }

    #[test]
    fn prefixes_whatsapp_channel_once() {
        assert_eq!(whatsapp_address("+15550001111"), "whatsapp:+15550001111");
        assert_eq!(whatsapp_address("whatsapp:+1"), "whatsapp:+1");
    }

    #[test]
    fn builds_messages_url() {
        let client =
            TwilioClient::with_base_url("AC123", "token", "http://localhost:1/".to_string());
        assert_eq!(
            client.messages_url(),
            "http://localhost:1/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[tokio::test]
    async fn sends_form_with_basic_auth() {
        let (base, captured) = spawn_fake_twilio(StatusCode::CREATED, r#"{"sid":"SM42"}"#).await;
        let client = TwilioClient::with_base_url("AC123", "secret", base);

        let resp = client
            .send(SendRequest {
                to: "whatsapp:+15550001111",
                from: "+15550009999",
                text: "We are open",
            })
            .await
            .unwrap();

        assert_eq!(resp.id, "SM42");
        assert_eq!(resp.provider, "twilio");

        let seen = captured.lock().unwrap();
        let (auth, form) = &seen[0];
        // base64("AC123:secret")
        assert_eq!(auth.as_deref(), Some("Basic QUMxMjM6c2VjcmV0"));
        assert_eq!(form["From"], "whatsapp:+15550009999");
        assert_eq!(form["To"], "whatsapp:+15550001111");
        assert_eq!(form["Body"], "We are open");
    }

    #[tokio::test]
    async fn provider_error_carries_status() {
        let (base, _) = spawn_fake_twilio(StatusCode::BAD_REQUEST, "invalid To").await;
        let client = TwilioClient::with_base_url("AC123", "secret", base);

        let err = client
            .send(SendRequest {
                to: "+1",
                from: "+2",
                text: "hi",
            })
            .await
            .unwrap_err();
        match err {
            SendError::Provider(msg) => assert!(msg.contains("400") && msg.contains("invalid To")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let (base, _) = spawn_fake_twilio(StatusCode::UNAUTHORIZED, "bad credentials").await;
        let client = TwilioClient::with_base_url("AC123", "wrong", base);

        let err = client
            .send(SendRequest {
                to: "+1",
                from: "+2",
                text: "hi",
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Auth(_)));
    }

    #[tokio::test]
    async fn missing_sid_falls_back_to_generated_id() {
        let (base, _) = spawn_fake_twilio(StatusCode::OK, "queued").await;
        let client = TwilioClient::with_base_url("AC123", "secret", base);

        let resp = client
            .send(SendRequest {
                to: "+1",
                from: "+2",
                text: "hi",
            })
            .await
            .unwrap();
        assert!(!resp.id.is_empty());
        assert_eq!(resp.raw["raw"], "queued");
    }

    #[tokio::test]
    async fn empty_body_is_rejected_before_sending() {
        let client = TwilioClient::with_base_url("AC123", "secret", "http://127.0.0.1:9".into());
        let err = client
            .send(SendRequest {
                to: "+1",
                from: "+2",
                text: "",
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Invalid(_)));
    }
}
