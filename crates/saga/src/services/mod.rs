//! Peers the saga consults besides the ticket ledger.

pub mod notification;
pub mod payment;

pub use notification::{
    DeliveredNotification, DeliveryReceipt, HttpNotificationSink, InMemoryNotificationSink,
    Notification, NotificationKind, NotificationSink,
};
pub use payment::{
    AlwaysApprove, AlwaysDecline, PaymentOutcome, PaymentOutcomeProvider, PaymentPolicy,
    WeightedRandom,
};
