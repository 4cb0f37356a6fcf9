//! HTTP route handlers.

pub mod catalog;
pub mod health;
pub mod metrics;
pub mod monitoring;
pub mod notifications;
pub mod payments;
pub mod screenings;
pub mod tickets;
