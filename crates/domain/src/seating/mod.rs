//! Seating: hall templates, per-screening seat maps and the screening catalog.

pub mod catalog;
pub mod inventory;
pub mod layout;

pub use catalog::{CreateScreening, CreateScreenings, Screening, ScreeningCatalog, VALID_SLOTS};
pub use inventory::{SeatInventory, StoreSeatInventory};
pub use layout::{Cinema, HallTemplate, Seat, SeatMap, default_cinemas, default_halls};
