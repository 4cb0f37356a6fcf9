//! Buyer notifications.
//!
//! Delivery is fire-and-forget from the saga's point of view: the coordinator
//! logs a failed delivery and moves on.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::TicketId;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::SagaError;

/// Why the buyer is being notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Purchase,
    Cancellation,
    Refund,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Purchase => "purchase",
            NotificationKind::Cancellation => "cancellation",
            NotificationKind::Refund => "refund",
        }
    }

    /// Message sent along with the notification.
    pub fn default_message(&self) -> &'static str {
        match self {
            NotificationKind::Purchase => "Ticket paid and confirmed",
            NotificationKind::Cancellation => "Ticket cancelled",
            NotificationKind::Refund => "Money returned to card",
        }
    }

    /// Subject line of the rendered message.
    pub fn subject(&self) -> &'static str {
        match self {
            NotificationKind::Purchase => "Ticket purchased",
            NotificationKind::Cancellation => "Ticket cancelled",
            NotificationKind::Refund => "Refund issued",
        }
    }

    /// Body of the rendered message.
    pub fn body(&self, ticket_id: TicketId) -> String {
        match self {
            NotificationKind::Purchase => {
                format!("Your ticket #{ticket_id} has been paid and sent to your email.")
            }
            NotificationKind::Cancellation => format!("Your ticket #{ticket_id} has been cancelled."),
            NotificationKind::Refund => {
                format!("The payment for ticket #{ticket_id} has been returned to your card.")
            }
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A notification request. This is also the wire body of the HTTP sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub ticket_id: TicketId,
    #[serde(rename = "event_type")]
    pub kind: NotificationKind,
    #[serde(rename = "email")]
    pub recipient: Option<String>,
    pub message: String,
}

impl Notification {
    /// Creates a notification with the default message for `kind`.
    pub fn new(ticket_id: TicketId, kind: NotificationKind, recipient: Option<String>) -> Self {
        Self {
            ticket_id,
            kind,
            recipient,
            message: kind.default_message().to_string(),
        }
    }
}

/// Acknowledgement returned by a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub status: String,
    pub message: String,
}

/// A rendered notification kept by [`InMemoryNotificationSink`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveredNotification {
    pub id: Uuid,
    pub ticket_id: TicketId,
    pub recipient: Option<String>,
    pub kind: NotificationKind,
    pub subject: String,
    pub body: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Trait for delivering buyer notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers one notification.
    async fn notify(&self, notification: Notification) -> Result<DeliveryReceipt, SagaError>;
}

#[async_trait]
impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    async fn notify(&self, notification: Notification) -> Result<DeliveryReceipt, SagaError> {
        (**self).notify(notification).await
    }
}

/// Delivered notifications kept before the oldest are dropped.
pub const DEFAULT_DELIVERED_CAPACITY: usize = 1_000;

#[derive(Debug)]
struct InMemoryNotificationState {
    delivered: VecDeque<DeliveredNotification>,
    capacity: usize,
    fail_on_notify: bool,
    delay: Option<Duration>,
}

/// Notification sink that renders messages and keeps the most recent ones in
/// memory.
#[derive(Debug, Clone)]
pub struct InMemoryNotificationSink {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationSink {
    /// Creates a sink keeping up to [`DEFAULT_DELIVERED_CAPACITY`] notifications.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_DELIVERED_CAPACITY)
    }

    /// Creates a sink keeping up to `capacity` notifications.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryNotificationState {
                delivered: VecDeque::new(),
                capacity: capacity.max(1),
                fail_on_notify: false,
                delay: None,
            })),
        }
    }

    /// Configures the sink to fail every delivery.
    pub async fn set_fail_on_notify(&self, fail: bool) {
        self.state.write().await.fail_on_notify = fail;
    }

    /// Makes every delivery take `delay` before completing.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        self.state.write().await.delay = delay;
    }

    /// Returns the retained notifications, oldest first.
    pub async fn delivered(&self) -> Vec<DeliveredNotification> {
        self.state.read().await.delivered.iter().cloned().collect()
    }

    /// Returns the delivered notifications for one ticket.
    pub async fn delivered_for(&self, ticket_id: TicketId) -> Vec<DeliveredNotification> {
        self.state
            .read()
            .await
            .delivered
            .iter()
            .filter(|n| n.ticket_id == ticket_id)
            .cloned()
            .collect()
    }
}

impl Default for InMemoryNotificationSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn notify(&self, notification: Notification) -> Result<DeliveryReceipt, SagaError> {
        let (fail, delay) = {
            let state = self.state.read().await;
            (state.fail_on_notify, state.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(SagaError::Notification("Mail server unavailable".to_string()));
        }

        let kind = notification.kind;
        let subject = kind.subject().to_string();
        let delivered = DeliveredNotification {
            id: Uuid::new_v4(),
            ticket_id: notification.ticket_id,
            recipient: notification.recipient,
            kind,
            subject: subject.clone(),
            body: kind.body(notification.ticket_id),
            status: "DELIVERED".to_string(),
            timestamp: Utc::now(),
        };
        tracing::info!(
            ticket_id = %delivered.ticket_id,
            kind = %kind,
            subject = %subject,
            "notification delivered"
        );
        let mut state = self.state.write().await;
        if state.delivered.len() == state.capacity {
            state.delivered.pop_front();
        }
        state.delivered.push_back(delivered);
        drop(state);

        Ok(DeliveryReceipt {
            status: "DELIVERED".to_string(),
            message: subject,
        })
    }
}

/// Notification sink that POSTs to a remote notification service at
/// `{base_url}/notify`.
#[derive(Debug, Clone)]
pub struct HttpNotificationSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpNotificationSink {
    /// Creates a sink whose requests give up after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SagaError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SagaError::Notification(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/notify", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl NotificationSink for HttpNotificationSink {
    async fn notify(&self, notification: Notification) -> Result<DeliveryReceipt, SagaError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&notification)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SagaError::Notification(e.to_string()))?;

        response
            .json::<DeliveryReceipt>()
            .await
            .map_err(|e| SagaError::Notification(format!("invalid response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn purchase(id: u64) -> Notification {
        Notification::new(
            TicketId::new(id),
            NotificationKind::Purchase,
            Some("buyer@example.com".to_string()),
        )
    }

    #[tokio::test]
    async fn test_in_memory_renders_and_stores() {
        let sink = InMemoryNotificationSink::new();
        let receipt = sink.notify(purchase(4)).await.unwrap();
        assert_eq!(receipt.status, "DELIVERED");
        assert_eq!(receipt.message, "Ticket purchased");

        let delivered = sink.delivered().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].ticket_id, TicketId::new(4));
        assert!(delivered[0].body.contains("#4"));
        assert_eq!(delivered[0].recipient.as_deref(), Some("buyer@example.com"));
    }

    #[tokio::test]
    async fn test_in_memory_fail_on_notify() {
        let sink = InMemoryNotificationSink::new();
        sink.set_fail_on_notify(true).await;
        assert!(matches!(
            sink.notify(purchase(1)).await,
            Err(SagaError::Notification(_))
        ));
        assert!(sink.delivered().await.is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_drops_oldest_past_capacity() {
        let sink = InMemoryNotificationSink::with_capacity(2);
        for id in 1..=3 {
            sink.notify(purchase(id)).await.unwrap();
        }

        let ids: Vec<TicketId> = sink.delivered().await.iter().map(|n| n.ticket_id).collect();
        assert_eq!(ids, vec![TicketId::new(2), TicketId::new(3)]);
    }

    #[tokio::test]
    async fn test_delivered_for_filters_by_ticket() {
        let sink = InMemoryNotificationSink::new();
        sink.notify(purchase(1)).await.unwrap();
        sink.notify(purchase(2)).await.unwrap();
        sink.notify(Notification::new(
            TicketId::new(1),
            NotificationKind::Refund,
            None,
        ))
        .await
        .unwrap();

        let for_one = sink.delivered_for(TicketId::new(1)).await;
        assert_eq!(for_one.len(), 2);
        assert_eq!(for_one[1].kind, NotificationKind::Refund);
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(purchase(9)).unwrap();
        assert_eq!(json["ticket_id"], 9);
        assert_eq!(json["event_type"], "purchase");
        assert_eq!(json["message"], "Ticket paid and confirmed");
        assert_eq!(json["email"], "buyer@example.com");
    }

    #[tokio::test]
    async fn test_http_sink_posts_to_notify() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notify"))
            .and(body_partial_json(serde_json::json!({
                "ticket_id": 3,
                "event_type": "purchase"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "DELIVERED",
                "message": "Ticket purchased"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sink = HttpNotificationSink::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let receipt = sink.notify(purchase(3)).await.unwrap();
        assert_eq!(receipt.status, "DELIVERED");
    }

    #[tokio::test]
    async fn test_http_sink_maps_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notify"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let sink = HttpNotificationSink::new(&server.uri(), Duration::from_secs(2)).unwrap();
        assert!(matches!(
            sink.notify(purchase(3)).await,
            Err(SagaError::Notification(_))
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let sink =
            HttpNotificationSink::new("http://localhost:8004/", Duration::from_secs(1)).unwrap();
        assert_eq!(sink.endpoint(), "http://localhost:8004/notify");
    }
}
