//! Collaborator contracts consumed by dispatchers.
//!
//! The engine does not own the record store or the notification channel; it
//! calls them through these traits. The in-memory implementations are the
//! base deployment: appends are safe under concurrent runs and notification
//! delivery is a logged side effect.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ActionError;
use crate::Record;

/// Append-only access to one logical table of flat records per entity.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load all records for an entity, in insertion order.
    async fn load(&self, entity: &str) -> Result<Vec<Record>, ActionError>;

    /// Append one record; returns the record id.
    async fn append(&self, entity: &str, record: Record) -> Result<String, ActionError>;

    /// Bulk overwrite all records for an entity.
    async fn save(&self, entity: &str, records: Vec<Record>) -> Result<(), ActionError>;
}

/// In-memory record store keyed by entity name.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load(&self, entity: &str) -> Result<Vec<Record>, ActionError> {
        let tables = self.tables.read().await;
        Ok(tables.get(entity).cloned().unwrap_or_default())
    }

    async fn append(&self, entity: &str, mut record: Record) -> Result<String, ActionError> {
        let id = match record.get("id").and_then(|v| v.as_str()) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                record.insert("id".to_string(), serde_json::json!(id));
                id
            }
        };

        let mut tables = self.tables.write().await;
        tables.entry(entity.to_string()).or_default().push(record);
        Ok(id)
    }

    async fn save(&self, entity: &str, records: Vec<Record>) -> Result<(), ActionError> {
        let mut tables = self.tables.write().await;
        tables.insert(entity.to_string(), records);
        Ok(())
    }
}

/// A notification handed to the notifier collaborator.
#[derive(Debug, Clone)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery receipt returned by the notifier.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub delivered_at: chrono::DateTime<Utc>,
}

/// Notification channel contract.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, notification: Notification) -> Result<DeliveryReceipt, ActionError>;
}

/// Simulated notifier: delivery is a structured log line.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, notification: Notification) -> Result<DeliveryReceipt, ActionError> {
        let message_id = format!("msg_{}", &Uuid::new_v4().simple().to_string()[..8]);
        tracing::info!(
            to = %notification.to,
            subject = %notification.subject,
            message_id = %message_id,
            "Notification delivered"
        );
        Ok(DeliveryReceipt {
            message_id,
            delivered_at: Utc::now(),
        })
    }
}
