use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Wraps a raw numeric value.
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            /// Returns the raw numeric value.
            pub const fn value(&self) -> $inner {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

numeric_id!(
    /// Identifier of one scheduled screening.
    ScreeningId(u64)
);

numeric_id!(
    /// Identifier of a ticket, assigned monotonically by the ticket ledger.
    TicketId(u64)
);

numeric_id!(
    /// Identifier of a hall template.
    HallId(u32)
);

numeric_id!(
    /// Identifier of a cinema.
    CinemaId(u32)
);

/// Coordinate of a seat inside a hall: a row letter and a 1-based seat number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatPosition {
    pub row: String,
    pub number: u32,
}

impl SeatPosition {
    /// Creates a seat position.
    pub fn new(row: impl Into<String>, number: u32) -> Self {
        Self {
            row: row.into(),
            number,
        }
    }
}

impl std::fmt::Display for SeatPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.row, self.number)
    }
}

/// Monotonic id allocator.
///
/// Ids start at 1 and are never reused, even across concurrent callers.
#[derive(Debug)]
pub struct IdSequence {
    last: AtomicU64,
}

impl IdSequence {
    /// Creates a sequence whose first id is 1.
    pub fn new() -> Self {
        Self::starting_after(0)
    }

    /// Creates a sequence whose first id is `last + 1`.
    pub fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    /// Allocates the next id.
    pub fn next_id(&self) -> u64 {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Ensures later ids are greater than `value`.
    pub fn advance_past(&self, value: u64) {
        self.last.fetch_max(value, Ordering::SeqCst);
    }

    /// Returns the most recently allocated id (0 if none).
    pub fn current(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_id_serializes_as_bare_number() {
        let json = serde_json::to_string(&TicketId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: TicketId = serde_json::from_str("7").unwrap();
        assert_eq!(back, TicketId::new(7));
    }

    #[test]
    fn seat_position_display() {
        assert_eq!(SeatPosition::new("A", 1).to_string(), "A1");
        assert_eq!(SeatPosition::new("C", 14).to_string(), "C14");
    }

    #[test]
    fn sequence_starts_at_one_and_increments() {
        let seq = IdSequence::new();
        assert_eq!(seq.next_id(), 1);
        assert_eq!(seq.next_id(), 2);
        assert_eq!(seq.current(), 2);
    }

    #[test]
    fn sequence_advance_past_never_moves_backwards() {
        let seq = IdSequence::starting_after(10);
        seq.advance_past(5);
        assert_eq!(seq.next_id(), 11);
        seq.advance_past(20);
        assert_eq!(seq.next_id(), 21);
    }

    #[test]
    fn sequence_is_unique_across_threads() {
        let seq = std::sync::Arc::new(IdSequence::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let seq = seq.clone();
                std::thread::spawn(move || (0..100).map(|_| seq.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 400);
    }
}
