//! Record storage used by the seat inventory and the ticket ledger.
//!
//! A store holds records keyed by their id and supports read, create and
//! update-by-id with immediate read-after-write visibility. Every single
//! operation is atomic with respect to the store; nothing spans operations.

pub mod error;
pub mod json_file;
pub mod memory;
pub mod store;

pub use error::{Result, StoreError};
pub use json_file::JsonFileRecordStore;
pub use memory::InMemoryRecordStore;
pub use store::{Mutation, Record, RecordStore};
