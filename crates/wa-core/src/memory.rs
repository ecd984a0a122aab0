use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::{ConversationStore, TemplateStore};
use crate::{ConversationRecord, StoreError, Template, default_templates};

/// In-process store backing both collections.
///
/// Clones share the same underlying lists.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    templates: Arc<RwLock<Vec<Template>>>,
    conversations: Arc<RwLock<Vec<ConversationRecord>>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with [`default_templates`].
    pub fn seeded() -> Self {
        Self::with_templates(default_templates())
    }

    pub fn with_templates(templates: Vec<Template>) -> Self {
        Self {
            templates: Arc::new(RwLock::new(templates)),
            conversations: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Template>, StoreError> {
        Ok(self.templates.read().await.clone())
    }

    async fn append(&self, template: Template) -> Result<(), StoreError> {
        debug!(id = %template.id, keyword = %template.keyword, "template added");
        self.templates.write().await.push(template);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut templates = self.templates.write().await;
        let before = templates.len();
        templates.retain(|t| t.id != id);
        let removed = templates.len() != before;
        debug!(id, removed, "template delete");
        Ok(removed)
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn list(&self) -> Result<Vec<ConversationRecord>, StoreError> {
        Ok(self.conversations.read().await.clone())
    }

    async fn append(&self, record: ConversationRecord) -> Result<(), StoreError> {
        self.conversations.write().await.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConversationStatus, DEFAULT_CUSTOMER_NAME};
    use time::OffsetDateTime;

    fn record(id: &str) -> ConversationRecord {
        ConversationRecord {
            id: id.into(),
            customer_name: DEFAULT_CUSTOMER_NAME.into(),
            customer_number: "+1".into(),
            last_message: "hi".into(),
            ai_response: "hello".into(),
            timestamp: OffsetDateTime::now_utc(),
            status: ConversationStatus::Resolved,
        }
    }

    #[tokio::test]
    async fn seeded_store_has_default_templates_in_order() {
        let store = MemoryStore::seeded();
        let keywords: Vec<_> = TemplateStore::list(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.keyword)
            .collect();
        assert_eq!(keywords, ["hours", "location", "pricing"]);
    }

    #[tokio::test]
    async fn delete_missing_id_leaves_templates_unchanged() {
        let store = MemoryStore::seeded();
        let before = TemplateStore::list(&store).await.unwrap();
        assert!(!store.delete("does-not-exist").await.unwrap());
        assert_eq!(TemplateStore::list(&store).await.unwrap(), before);
    }

    #[tokio::test]
    async fn delete_removes_by_id() {
        let store = MemoryStore::seeded();
        assert!(store.delete("2").await.unwrap());
        let ids: Vec<_> = TemplateStore::list(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        ConversationStore::append(&other, record("a")).await.unwrap();
        assert_eq!(ConversationStore::list(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_appends_are_all_kept() {
        use futures::future;

        let store = MemoryStore::new();
        let futures = (0..50).map(|i| {
            let store = store.clone();
            async move {
                ConversationStore::append(&store, record(&i.to_string()))
                    .await
                    .unwrap()
            }
        });
        future::join_all(futures).await;
        assert_eq!(ConversationStore::list(&store).await.unwrap().len(), 50);
    }
}
