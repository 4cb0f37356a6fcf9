//! Ticket records and the ledger that owns their lifecycle.

pub mod ledger;
pub mod ticket;

pub use ledger::{StoreTicketLedger, TicketLedger};
pub use ticket::{ReserveTicket, Ticket, TicketStatus};
