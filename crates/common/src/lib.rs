//! Identifiers shared by every layer of the seat reservation system.

pub mod types;

pub use types::{CinemaId, HallId, IdSequence, ScreeningId, SeatPosition, TicketId};
