//! Journal of user-visible actions (reservations, payments, catalog edits).

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Entries kept before the oldest are dropped.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// One journaled action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAction {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub user_id: String,
    pub details: serde_json::Value,
}

/// Bounded, shared, in-memory action journal.
#[derive(Debug, Clone)]
pub struct ActionLog {
    entries: Arc<RwLock<VecDeque<UserAction>>>,
    capacity: usize,
}

impl ActionLog {
    /// Creates a journal holding up to [`DEFAULT_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a journal holding up to `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    /// Appends an action. A missing or empty `user` is journaled as `anonymous`.
    pub async fn record(&self, action: &str, user: Option<&str>, details: serde_json::Value) {
        let user_id = match user {
            Some(u) if !u.is_empty() => u.to_string(),
            _ => "anonymous".to_string(),
        };
        tracing::debug!(action, user_id = %user_id, "user action");

        let entry = UserAction {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action: action.to_string(),
            user_id,
            details,
        };

        let mut entries = self.entries.write().await;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Returns the newest `limit` entries, oldest first.
    pub async fn recent(&self, limit: usize) -> Vec<UserAction> {
        let entries = self.entries.read().await;
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }

    /// Returns the number of journaled entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if nothing has been journaled.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_recent_returns_newest_in_order() {
        let log = ActionLog::new();
        for i in 0..5 {
            log.record("RESERVE_TICKET", Some("a@b.c"), json!({ "ticket_id": i }))
                .await;
        }

        let recent = log.recent(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].details["ticket_id"], 3);
        assert_eq!(recent[1].details["ticket_id"], 4);
    }

    #[tokio::test]
    async fn test_missing_user_is_anonymous() {
        let log = ActionLog::new();
        log.record("PAYMENT_FAILED", None, json!({})).await;
        log.record("PAYMENT_FAILED", Some(""), json!({})).await;

        assert!(log.recent(10).await.iter().all(|a| a.user_id == "anonymous"));
    }

    #[tokio::test]
    async fn test_capacity_drops_oldest() {
        let log = ActionLog::with_capacity(3);
        for i in 0..5 {
            log.record("X", None, json!({ "n": i })).await;
        }

        let all = log.recent(10).await;
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].details["n"], 2);
    }

    #[tokio::test]
    async fn test_clear() {
        let log = ActionLog::new();
        log.record("X", None, json!({})).await;
        log.clear().await;
        assert!(log.is_empty().await);
    }
}
