//! Seat availability per screening.

use async_trait::async_trait;
use common::{ScreeningId, SeatPosition};
use record_store::{InMemoryRecordStore, RecordStore};

use crate::error::DomainError;
use crate::seating::layout::{HallTemplate, Seat, SeatMap};

/// Owner of the availability bit of every seat of every screening.
///
/// Each call is atomic with respect to the inventory's own store; nothing
/// spans two calls.
#[async_trait]
pub trait SeatInventory: Send + Sync {
    /// Instantiates an independent, fully available seat map for a screening.
    async fn create_screening_seats(
        &self,
        screening_id: ScreeningId,
        hall: &HallTemplate,
    ) -> Result<Vec<Seat>, DomainError>;

    /// Lists every seat of a screening.
    async fn seats(&self, screening_id: ScreeningId) -> Result<Vec<Seat>, DomainError>;

    /// Returns the current availability bit.
    async fn is_available(
        &self,
        screening_id: ScreeningId,
        seat: &SeatPosition,
    ) -> Result<bool, DomainError>;

    /// Sets the availability bit. Setting the current value again is a no-op.
    async fn set_availability(
        &self,
        screening_id: ScreeningId,
        seat: &SeatPosition,
        available: bool,
    ) -> Result<Seat, DomainError>;

    /// Flips an available seat to unavailable in one step.
    ///
    /// Returns `false`, without changing anything, if the seat was already
    /// unavailable.
    async fn hold_if_available(
        &self,
        screening_id: ScreeningId,
        seat: &SeatPosition,
    ) -> Result<bool, DomainError>;

    /// Drops the seat map of a screening.
    async fn remove_screening(&self, screening_id: ScreeningId) -> Result<(), DomainError>;
}

/// [`SeatInventory`] backed by a [`RecordStore`] of seat maps.
#[derive(Clone)]
pub struct StoreSeatInventory<S> {
    store: S,
}

impl StoreSeatInventory<InMemoryRecordStore<SeatMap>> {
    /// Creates an inventory with an empty in-memory store.
    pub fn in_memory() -> Self {
        Self::new(InMemoryRecordStore::new())
    }
}

impl<S: RecordStore<SeatMap>> StoreSeatInventory<S> {
    /// Creates an inventory over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn load(&self, screening_id: ScreeningId) -> Result<SeatMap, DomainError> {
        self.store
            .get(screening_id)
            .await?
            .ok_or_else(|| DomainError::not_found("screening", screening_id))
    }

    /// Applies `change` to one seat under the store lock.
    ///
    /// `change` receives the seat and returns the value reported back.
    async fn with_seat<T, F>(
        &self,
        screening_id: ScreeningId,
        seat: &SeatPosition,
        change: F,
    ) -> Result<T, DomainError>
    where
        T: Send,
        F: FnOnce(&mut Seat) -> T + Send,
    {
        let mut outcome = None;
        let target = seat.clone();
        self.store
            .update(
                screening_id,
                Box::new(|map: &mut SeatMap| {
                    if let Some(seat) = map.seat_mut(&target) {
                        outcome = Some(change(seat));
                    }
                }),
            )
            .await
            .map_err(|e| DomainError::from_store("screening", e))?;

        outcome.ok_or_else(|| {
            DomainError::not_found("seat", format!("{seat} in screening {screening_id}"))
        })
    }
}

#[async_trait]
impl<S: RecordStore<SeatMap>> SeatInventory for StoreSeatInventory<S> {
    #[tracing::instrument(skip(self, hall), fields(hall_id = %hall.id))]
    async fn create_screening_seats(
        &self,
        screening_id: ScreeningId,
        hall: &HallTemplate,
    ) -> Result<Vec<Seat>, DomainError> {
        let map = SeatMap::from_template(screening_id, hall);
        let seats = map.seats.clone();
        self.store.insert(map).await?;

        tracing::info!(%screening_id, seats = seats.len(), "seat map created");
        Ok(seats)
    }

    async fn seats(&self, screening_id: ScreeningId) -> Result<Vec<Seat>, DomainError> {
        Ok(self.load(screening_id).await?.seats)
    }

    async fn is_available(
        &self,
        screening_id: ScreeningId,
        seat: &SeatPosition,
    ) -> Result<bool, DomainError> {
        let map = self.load(screening_id).await?;
        map.seat(seat).map(|s| s.available).ok_or_else(|| {
            DomainError::not_found("seat", format!("{seat} in screening {screening_id}"))
        })
    }

    #[tracing::instrument(skip(self), fields(seat = %seat))]
    async fn set_availability(
        &self,
        screening_id: ScreeningId,
        seat: &SeatPosition,
        available: bool,
    ) -> Result<Seat, DomainError> {
        let updated = self
            .with_seat(screening_id, seat, |s| {
                s.available = available;
                s.clone()
            })
            .await?;

        tracing::debug!(%screening_id, available, "seat availability set");
        Ok(updated)
    }

    #[tracing::instrument(skip(self), fields(seat = %seat))]
    async fn hold_if_available(
        &self,
        screening_id: ScreeningId,
        seat: &SeatPosition,
    ) -> Result<bool, DomainError> {
        self.with_seat(screening_id, seat, |s| {
            if s.available {
                s.available = false;
                true
            } else {
                false
            }
        })
        .await
    }

    async fn remove_screening(&self, screening_id: ScreeningId) -> Result<(), DomainError> {
        self.store
            .remove(screening_id)
            .await
            .map_err(|e| DomainError::from_store("screening", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seating::layout::default_halls;

    fn a1() -> SeatPosition {
        SeatPosition::new("A", 1)
    }

    async fn setup() -> (StoreSeatInventory<InMemoryRecordStore<SeatMap>>, ScreeningId) {
        let inventory = StoreSeatInventory::in_memory();
        let screening_id = ScreeningId::new(1);
        inventory
            .create_screening_seats(screening_id, &default_halls()[0])
            .await
            .unwrap();
        (inventory, screening_id)
    }

    #[tokio::test]
    async fn test_new_screening_seats_are_available() {
        let (inventory, id) = setup().await;
        let seats = inventory.seats(id).await.unwrap();
        assert_eq!(seats.len(), 30);
        assert!(seats.iter().all(|s| s.available));
        assert!(inventory.is_available(id, &a1()).await.unwrap());
    }

    #[tokio::test]
    async fn test_screenings_have_independent_seat_maps() {
        let (inventory, first) = setup().await;
        let second = ScreeningId::new(2);
        inventory
            .create_screening_seats(second, &default_halls()[0])
            .await
            .unwrap();

        inventory.set_availability(first, &a1(), false).await.unwrap();

        assert!(!inventory.is_available(first, &a1()).await.unwrap());
        assert!(inventory.is_available(second, &a1()).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_availability_is_idempotent() {
        let (inventory, id) = setup().await;

        let once = inventory.set_availability(id, &a1(), false).await.unwrap();
        let twice = inventory.set_availability(id, &a1(), false).await.unwrap();
        assert_eq!(once, twice);
        assert!(!twice.available);
    }

    #[tokio::test]
    async fn test_unknown_screening_or_seat_is_not_found() {
        let (inventory, id) = setup().await;

        let unknown_screening = inventory.is_available(ScreeningId::new(99), &a1()).await;
        assert!(matches!(
            unknown_screening,
            Err(DomainError::NotFound {
                entity: "screening",
                ..
            })
        ));

        let unknown_seat = inventory
            .set_availability(id, &SeatPosition::new("Z", 1), true)
            .await;
        assert!(matches!(
            unknown_seat,
            Err(DomainError::NotFound { entity: "seat", .. })
        ));
    }

    #[tokio::test]
    async fn test_hold_if_available_only_succeeds_once() {
        let (inventory, id) = setup().await;

        assert!(inventory.hold_if_available(id, &a1()).await.unwrap());
        assert!(!inventory.hold_if_available(id, &a1()).await.unwrap());
        assert!(!inventory.is_available(id, &a1()).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_screening() {
        let (inventory, id) = setup().await;
        inventory.remove_screening(id).await.unwrap();
        assert!(matches!(
            inventory.seats(id).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
