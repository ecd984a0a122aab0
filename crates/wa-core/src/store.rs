//! Storage seams for templates and the conversation log.

use async_trait::async_trait;

use crate::{ConversationRecord, StoreError, Template};

/// Ordered collection of reply templates.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// All templates in insertion order.
    async fn list(&self) -> Result<Vec<Template>, StoreError>;

    async fn append(&self, template: Template) -> Result<(), StoreError>;

    /// Remove every template with `id`. Returns whether anything was removed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// Append-only conversation log.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// All records in append order.
    async fn list(&self) -> Result<Vec<ConversationRecord>, StoreError>;

    async fn append(&self, record: ConversationRecord) -> Result<(), StoreError>;
}
