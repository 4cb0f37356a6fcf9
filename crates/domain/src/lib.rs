//! Domain layer for the seat reservation system.
//!
//! This crate owns the three stores of truth the reservation saga keeps
//! consistent:
//! - seat availability per screening ([`SeatInventory`])
//! - the screening catalog built from hall templates ([`ScreeningCatalog`])
//! - ticket records and their lifecycle ([`TicketLedger`])
//!
//! Components talk to each other only through their traits, and every peer
//! call is bounded by a timeout (see [`downstream`]).

pub mod activity;
pub mod downstream;
pub mod error;
pub mod money;
pub mod seating;
pub mod tickets;

pub use activity::{ActionLog, UserAction};
pub use downstream::DEFAULT_CALL_TIMEOUT;
pub use error::DomainError;
pub use money::Money;
pub use seating::{
    Cinema, CreateScreening, CreateScreenings, HallTemplate, Screening, ScreeningCatalog, Seat,
    SeatInventory, SeatMap, StoreSeatInventory,
};
pub use tickets::{ReserveTicket, StoreTicketLedger, Ticket, TicketLedger, TicketStatus};
