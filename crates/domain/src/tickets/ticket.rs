//! Ticket record and status.

use common::{ScreeningId, SeatPosition, TicketId};
use record_store::Record;
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Lifecycle status of a ticket.
///
/// ```text
/// Reserved ──┬──► Sold
///            └──► Cancelled
/// ```
/// `Sold` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Reserved,
    Sold,
    Cancelled,
}

impl TicketStatus {
    /// Returns true while the ticket keeps its seat unavailable.
    pub fn holds_seat(&self) -> bool {
        matches!(self, TicketStatus::Reserved | TicketStatus::Sold)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Reserved => "RESERVED",
            TicketStatus::Sold => "SOLD",
            TicketStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A ticket for one seat of one screening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub screening_id: ScreeningId,
    pub row: String,
    pub seat_number: u32,
    pub status: TicketStatus,
    pub price: Money,
    pub buyer_email: Option<String>,
}

impl Ticket {
    /// Returns the seat the ticket references.
    pub fn seat(&self) -> SeatPosition {
        SeatPosition::new(self.row.clone(), self.seat_number)
    }
}

impl Record for Ticket {
    type Id = TicketId;
    const KIND: &'static str = "ticket";

    fn id(&self) -> TicketId {
        self.id
    }
}

/// Command to reserve a seat.
#[derive(Debug, Clone)]
pub struct ReserveTicket {
    pub screening_id: ScreeningId,
    pub seat: SeatPosition,
    pub price: Money,
    pub buyer_email: Option<String>,
}

impl ReserveTicket {
    pub fn new(screening_id: ScreeningId, seat: SeatPosition, price: Money) -> Self {
        Self {
            screening_id,
            seat,
            price,
            buyer_email: None,
        }
    }

    /// Sets the buyer's email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.buyer_email = Some(email.into());
        self
    }
}
