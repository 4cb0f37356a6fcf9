//! Hall templates and the seat maps instantiated from them.

use common::{CinemaId, HallId, ScreeningId, SeatPosition};
use record_store::Record;
use serde::{Deserialize, Serialize};

/// A cinema owning one or more halls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cinema {
    pub id: CinemaId,
    pub name: String,
    pub address: String,
}

/// Layout of a hall: `rows` rows lettered from `A`, each with
/// `seats_per_row` seats numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HallTemplate {
    pub id: HallId,
    pub name: String,
    pub cinema_id: CinemaId,
    pub rows: u8,
    pub seats_per_row: u32,
}

impl HallTemplate {
    /// Returns every seat coordinate of the hall in row-major order.
    pub fn seat_positions(&self) -> Vec<SeatPosition> {
        (0..self.rows.min(26))
            .flat_map(|row| {
                let letter = char::from(b'A' + row).to_string();
                (1..=self.seats_per_row).map(move |n| SeatPosition::new(letter.clone(), n))
            })
            .collect()
    }

    /// Total number of seats.
    pub fn capacity(&self) -> usize {
        usize::from(self.rows.min(26)) * self.seats_per_row as usize
    }
}

/// One seat of one screening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub screening_id: ScreeningId,
    pub row: String,
    pub seat_number: u32,
    pub available: bool,
}

impl Seat {
    /// Returns the seat's coordinate.
    pub fn position(&self) -> SeatPosition {
        SeatPosition::new(self.row.clone(), self.seat_number)
    }

    fn is_at(&self, position: &SeatPosition) -> bool {
        self.row == position.row && self.seat_number == position.number
    }
}

/// Every seat of one screening; the unit of storage for the seat inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatMap {
    pub screening_id: ScreeningId,
    pub hall_id: HallId,
    pub seats: Vec<Seat>,
}

impl SeatMap {
    /// Copies the hall layout into an independent, fully available seat map.
    pub fn from_template(screening_id: ScreeningId, hall: &HallTemplate) -> Self {
        let seats = hall
            .seat_positions()
            .into_iter()
            .map(|p| Seat {
                screening_id,
                row: p.row,
                seat_number: p.number,
                available: true,
            })
            .collect();
        Self {
            screening_id,
            hall_id: hall.id,
            seats,
        }
    }

    /// Looks up a seat by coordinate.
    pub fn seat(&self, position: &SeatPosition) -> Option<&Seat> {
        self.seats.iter().find(|s| s.is_at(position))
    }

    /// Looks up a seat by coordinate for mutation.
    pub fn seat_mut(&mut self, position: &SeatPosition) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| s.is_at(position))
    }

    /// Number of seats currently available.
    pub fn available_count(&self) -> usize {
        self.seats.iter().filter(|s| s.available).count()
    }
}

impl Record for SeatMap {
    type Id = ScreeningId;
    const KIND: &'static str = "seat_map";

    fn id(&self) -> ScreeningId {
        self.screening_id
    }
}

/// Cinemas the system starts with.
pub fn default_cinemas() -> Vec<Cinema> {
    vec![
        Cinema {
            id: CinemaId::new(1),
            name: "Premiere".to_string(),
            address: "25 Lenina St".to_string(),
        },
        Cinema {
            id: CinemaId::new(2),
            name: "Mir Kino".to_string(),
            address: "12 Mira Ave".to_string(),
        },
        Cinema {
            id: CinemaId::new(3),
            name: "Art-Film".to_string(),
            address: "8 Sovetskaya St".to_string(),
        },
    ]
}

/// Hall templates the system starts with, two per default cinema.
pub fn default_halls() -> Vec<HallTemplate> {
    let hall = |id: u32, name: &str, cinema: u32, rows: u8, seats_per_row: u32| HallTemplate {
        id: HallId::new(id),
        name: name.to_string(),
        cinema_id: CinemaId::new(cinema),
        rows,
        seats_per_row,
    };

    vec![
        hall(1, "Hall 1 (Small)", 1, 3, 10),
        hall(2, "Hall 2 (Compact)", 1, 2, 12),
        hall(3, "Hall 3 (Large)", 2, 5, 14),
        hall(4, "Hall 4 (Small)", 2, 3, 10),
        hall(5, "Hall 5 (Compact)", 3, 2, 12),
        hall(6, "Hall 6 (Large)", 3, 5, 14),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_positions_are_row_major() {
        let hall = HallTemplate {
            id: HallId::new(9),
            name: "Tiny".to_string(),
            cinema_id: CinemaId::new(1),
            rows: 2,
            seats_per_row: 3,
        };

        let labels: Vec<String> = hall.seat_positions().iter().map(|p| p.to_string()).collect();
        assert_eq!(labels, vec!["A1", "A2", "A3", "B1", "B2", "B3"]);
        assert_eq!(hall.capacity(), 6);
    }

    #[test]
    fn test_seat_map_starts_fully_available() {
        let hall = &default_halls()[2];
        let map = SeatMap::from_template(ScreeningId::new(4), hall);

        assert_eq!(map.seats.len(), 70);
        assert_eq!(map.available_count(), 70);
        assert!(map.seats.iter().all(|s| s.screening_id == ScreeningId::new(4)));
        assert!(map.seat(&SeatPosition::new("E", 14)).is_some());
        assert!(map.seat(&SeatPosition::new("F", 1)).is_none());
    }

    #[test]
    fn test_default_halls_belong_to_default_cinemas() {
        let cinemas: Vec<CinemaId> = default_cinemas().iter().map(|c| c.id).collect();
        assert_eq!(default_halls().len(), 6);
        assert!(default_halls().iter().all(|h| cinemas.contains(&h.cinema_id)));
    }
}
