//! Keyword routing of inbound messages.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, info};

use crate::store::{ConversationStore, TemplateStore};
use crate::{
    ConversationRecord, ConversationStatus, DEFAULT_CUSTOMER_NAME, NO_MATCH_RESPONSE, Template,
    WebhookError, generate_id,
};

/// First template, in slice order, whose keyword occurs in `body` ignoring case.
pub fn find_template<'a>(templates: &'a [Template], body: &str) -> Option<&'a Template> {
    let body = body.to_lowercase();
    templates
        .iter()
        .find(|t| body.contains(&t.keyword.to_lowercase()))
}

/// Result of routing one inbound message.
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    /// The record that was appended to the conversation log.
    pub record: ConversationRecord,
    pub matched: Option<Template>,
}

impl RouteOutcome {
    pub fn is_resolved(&self) -> bool {
        self.record.status == ConversationStatus::Resolved
    }

    /// Text to send back to the customer, if a template matched.
    pub fn reply(&self) -> Option<&str> {
        self.matched.as_ref().map(|t| t.response.as_str())
    }
}

/// Matches inbound messages against the template store and logs every one.
#[derive(Clone)]
pub struct MessageRouter {
    templates: Arc<dyn TemplateStore>,
    conversations: Arc<dyn ConversationStore>,
}

impl MessageRouter {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        conversations: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            templates,
            conversations,
        }
    }

    /// Resolve `body` from `from` and append exactly one conversation record.
    pub async fn route(&self, from: &str, body: &str) -> Result<RouteOutcome, WebhookError> {
        if from.is_empty() {
            return Err(WebhookError::MissingField("From"));
        }
        if body.is_empty() {
            return Err(WebhookError::MissingField("Body"));
        }

        let templates = self.templates.list().await?;
        let matched = find_template(&templates, body).cloned();

        let (ai_response, status) = match &matched {
            Some(t) => (t.response.clone(), ConversationStatus::Resolved),
            None => (NO_MATCH_RESPONSE.to_string(), ConversationStatus::Pending),
        };

        let record = ConversationRecord {
            id: generate_id(),
            customer_name: DEFAULT_CUSTOMER_NAME.to_string(),
            customer_number: from.to_string(),
            last_message: body.to_string(),
            ai_response,
            timestamp: OffsetDateTime::now_utc(),
            status,
        };
        self.conversations.append(record.clone()).await?;

        match &matched {
            Some(t) => info!(from, template = %t.id, keyword = %t.keyword, "message resolved"),
            None => info!(from, "no matching template"),
        }
        debug!(record = %record.id, "conversation logged");

        Ok(RouteOutcome { record, matched })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, StoreError, default_templates};
    use async_trait::async_trait;

    fn router(store: &MemoryStore) -> MessageRouter {
        let store = Arc::new(store.clone());
        MessageRouter::new(store.clone(), store)
    }

    #[test]
    fn first_match_wins_by_insertion_order() {
        let templates = vec![
            Template::with_id("a", "hours", "first"),
            Template::with_id("b", "open hours", "second"),
        ];
        let t = find_template(&templates, "What are your OPEN HOURS?").unwrap();
        assert_eq!(t.id, "a");
    }

    #[test]
    fn insertion_order_decides_not_keyword_length() {
        let templates = vec![
            Template::with_id("b", "open hours", "second"),
            Template::with_id("a", "hours", "first"),
        ];
        let t = find_template(&templates, "What are your OPEN HOURS?").unwrap();
        assert_eq!(t.id, "b");
    }

    #[test]
    fn keyword_match_ignores_case() {
        let templates = vec![Template::with_id("1", "Hours", "open")];
        assert!(find_template(&templates, "what are your HOURS").is_some());
        assert!(find_template(&templates, "where are you").is_none());
    }

    #[test]
    fn no_keyword_means_no_match() {
        assert!(find_template(&default_templates(), "random text").is_none());
        assert!(find_template(&[], "hours").is_none());
    }

    #[tokio::test]
    async fn hours_question_resolves() {
        let store = MemoryStore::seeded();
        let outcome = router(&store)
            .route("whatsapp:+15550001111", "What are your hours?")
            .await
            .unwrap();

        assert!(outcome.is_resolved());
        assert_eq!(outcome.matched.as_ref().unwrap().keyword, "hours");
        assert_eq!(outcome.reply(), Some(default_templates()[0].response.as_str()));
        assert_eq!(outcome.record.customer_number, "whatsapp:+15550001111");
        assert_eq!(outcome.record.last_message, "What are your hours?");
    }

    #[tokio::test]
    async fn unmatched_message_is_pending_with_sentinel() {
        let store = MemoryStore::seeded();
        let outcome = router(&store).route("+1", "random text").await.unwrap();

        assert!(!outcome.is_resolved());
        assert_eq!(outcome.reply(), None);
        assert_eq!(outcome.record.status, ConversationStatus::Pending);
        assert_eq!(outcome.record.ai_response, NO_MATCH_RESPONSE);
    }

    #[tokio::test]
    async fn every_routed_message_appends_one_record() {
        let store = MemoryStore::seeded();
        let router = router(&store);
        for (i, body) in ["hours?", "nothing here", "LOCATION please"].iter().enumerate() {
            router.route("+1", body).await.unwrap();
            let log = ConversationStore::list(&store).await.unwrap();
            assert_eq!(log.len(), i + 1);
        }
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_without_logging() {
        let store = MemoryStore::seeded();
        let router = router(&store);

        let err = router.route("", "hours").await.unwrap_err();
        assert!(matches!(err, WebhookError::MissingField("From")));
        let err = router.route("+1", "").await.unwrap_err();
        assert!(matches!(err, WebhookError::MissingField("Body")));

        assert!(ConversationStore::list(&store).await.unwrap().is_empty());
    }

    struct BrokenStore;

    #[async_trait]
    impl TemplateStore for BrokenStore {
        async fn list(&self) -> Result<Vec<Template>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }

        async fn append(&self, _template: Template) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }

        async fn delete(&self, _id: &str) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_store_error() {
        let log = Arc::new(MemoryStore::new());
        let router = MessageRouter::new(Arc::new(BrokenStore), log.clone());

        let err = router.route("+1", "hours").await.unwrap_err();
        assert!(matches!(err, WebhookError::Store(_)));
        assert!(ConversationStore::list(log.as_ref()).await.unwrap().is_empty());
    }
}
