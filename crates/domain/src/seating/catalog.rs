//! Screening catalog: cinemas, hall templates and scheduled screenings.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use common::{CinemaId, HallId, IdSequence, ScreeningId};
use record_store::{Record, RecordStore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use crate::activity::ActionLog;
use crate::downstream::{self, DEFAULT_CALL_TIMEOUT};
use crate::error::DomainError;
use crate::money::Money;
use crate::seating::inventory::SeatInventory;
use crate::seating::layout::{Cinema, HallTemplate, Seat, default_cinemas, default_halls};

/// Start times a screening may be scheduled at.
pub const VALID_SLOTS: [&str; 7] = [
    "10:00", "12:00", "14:00", "16:00", "18:00", "20:00", "22:00",
];

/// One scheduled showing of a movie in a hall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screening {
    pub id: ScreeningId,
    pub movie_title: String,
    pub cinema_id: CinemaId,
    pub hall_id: HallId,
    /// Slot in `HH:MM` form, one of [`VALID_SLOTS`].
    pub start_time: String,
    pub session_date: NaiveDate,
    pub price: Money,
    pub created_at: DateTime<Utc>,
}

impl Record for Screening {
    type Id = ScreeningId;
    const KIND: &'static str = "screening";

    fn id(&self) -> ScreeningId {
        self.id
    }
}

/// Command to schedule one screening.
#[derive(Debug, Clone)]
pub struct CreateScreening {
    pub movie_title: String,
    pub cinema_id: CinemaId,
    pub hall_id: HallId,
    /// `HH:MM`, `YYYY-MM-DDTHH:MM` or `YYYY-MM-DD HH:MM`.
    pub start_time: String,
    pub session_date: Option<NaiveDate>,
    pub price: Money,
}

/// Command to schedule several screenings of one movie in one hall.
#[derive(Debug, Clone)]
pub struct CreateScreenings {
    pub movie_title: String,
    pub cinema_id: CinemaId,
    pub hall_id: HallId,
    pub start_times: Vec<String>,
    pub session_date: Option<NaiveDate>,
    pub price: Money,
}

/// Splits a start time into an optional date and an `HH:MM` slot.
fn split_start_time(raw: &str) -> Result<(Option<NaiveDate>, String), DomainError> {
    let raw = raw.trim();
    let (date, time) = match raw.split_once(['T', ' ']) {
        Some((date, time)) => {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| DomainError::Validation(format!("Invalid date '{date}': {e}")))?;
            (Some(date), time)
        }
        None => (None, raw),
    };

    let slot = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|e| DomainError::Validation(format!("Invalid start time '{time}': {e}")))?
        .format("%H:%M")
        .to_string();
    if !VALID_SLOTS.contains(&slot.as_str()) {
        return Err(DomainError::Validation(format!(
            "Start time {slot} is not one of {}",
            VALID_SLOTS.join(", ")
        )));
    }
    Ok((date, slot))
}

/// Catalog of cinemas, halls and screenings.
///
/// Scheduling a screening instantiates its seat map through the
/// [`SeatInventory`]; deleting it drops the seat map again.
pub struct ScreeningCatalog<I, S> {
    cinemas: Vec<Cinema>,
    halls: Vec<HallTemplate>,
    screenings: S,
    inventory: I,
    ids: Arc<IdSequence>,
    actions: ActionLog,
    call_timeout: Duration,
    schedule_lock: Mutex<()>,
}

impl<I, S> ScreeningCatalog<I, S>
where
    I: SeatInventory,
    S: RecordStore<Screening>,
{
    /// Creates a catalog with the default cinemas and halls.
    ///
    /// Screening ids continue after the highest id already in `screenings`.
    pub async fn new(inventory: I, screenings: S, actions: ActionLog) -> Result<Self, DomainError> {
        Self::with_layout(inventory, screenings, actions, default_cinemas(), default_halls()).await
    }

    /// Creates a catalog with explicit cinemas and halls.
    pub async fn with_layout(
        inventory: I,
        screenings: S,
        actions: ActionLog,
        cinemas: Vec<Cinema>,
        halls: Vec<HallTemplate>,
    ) -> Result<Self, DomainError> {
        let last = screenings.max_id().await?.map(|id| id.value()).unwrap_or(0);
        Ok(Self {
            cinemas,
            halls,
            screenings,
            inventory,
            ids: Arc::new(IdSequence::starting_after(last)),
            actions,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            schedule_lock: Mutex::new(()),
        })
    }

    /// Sets the timeout applied to seat inventory calls.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Returns the seat inventory the catalog schedules into.
    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    pub fn cinemas(&self) -> &[Cinema] {
        &self.cinemas
    }

    pub fn halls(&self) -> &[HallTemplate] {
        &self.halls
    }

    /// Halls owned by `cinema_id`; empty if the cinema is unknown.
    pub fn halls_for_cinema(&self, cinema_id: CinemaId) -> Vec<HallTemplate> {
        self.halls
            .iter()
            .filter(|h| h.cinema_id == cinema_id)
            .cloned()
            .collect()
    }

    fn hall_in_cinema(&self, cinema_id: CinemaId, hall_id: HallId) -> Result<&HallTemplate, DomainError> {
        if !self.cinemas.iter().any(|c| c.id == cinema_id) {
            return Err(DomainError::Validation(format!("Cinema {cinema_id} not found")));
        }
        let hall = self
            .halls
            .iter()
            .find(|h| h.id == hall_id)
            .ok_or_else(|| DomainError::Validation(format!("Hall {hall_id} not found")))?;
        if hall.cinema_id != cinema_id {
            return Err(DomainError::Validation(format!(
                "Hall {hall_id} does not belong to cinema {cinema_id}"
            )));
        }
        Ok(hall)
    }

    /// Schedules one screening and instantiates its seat map.
    #[tracing::instrument(skip(self, cmd), fields(movie = %cmd.movie_title, hall_id = %cmd.hall_id))]
    pub async fn create_screening(&self, cmd: CreateScreening) -> Result<Screening, DomainError> {
        let mut created = self
            .create_screenings(CreateScreenings {
                movie_title: cmd.movie_title,
                cinema_id: cmd.cinema_id,
                hall_id: cmd.hall_id,
                start_times: vec![cmd.start_time],
                session_date: cmd.session_date,
                price: cmd.price,
            })
            .await?;
        created
            .pop()
            .ok_or_else(|| DomainError::Validation("No start time given".to_string()))
    }

    /// Schedules several screenings. Every slot is validated before any is
    /// created.
    #[tracing::instrument(skip(self, cmd), fields(movie = %cmd.movie_title, hall_id = %cmd.hall_id))]
    pub async fn create_screenings(
        &self,
        cmd: CreateScreenings,
    ) -> Result<Vec<Screening>, DomainError> {
        if cmd.movie_title.trim().is_empty() {
            return Err(DomainError::Validation("Movie title is required".to_string()));
        }
        if cmd.start_times.is_empty() {
            return Err(DomainError::Validation("No start time given".to_string()));
        }
        let hall = self.hall_in_cinema(cmd.cinema_id, cmd.hall_id)?.clone();

        let mut slots: Vec<(NaiveDate, String)> = Vec::with_capacity(cmd.start_times.len());
        for raw in &cmd.start_times {
            let (date, slot) = split_start_time(raw)?;
            let date = cmd
                .session_date
                .or(date)
                .unwrap_or_else(|| Local::now().date_naive());
            if slots.contains(&(date, slot.clone())) {
                return Err(DomainError::Validation(format!(
                    "Slot {slot} on {date} is listed twice"
                )));
            }
            slots.push((date, slot));
        }

        let _guard = self.schedule_lock.lock().await;

        let existing = self.screenings.list().await?;
        for (date, slot) in &slots {
            let taken = existing.iter().any(|s| {
                s.hall_id == hall.id && s.session_date == *date && s.start_time == *slot
            });
            if taken {
                return Err(DomainError::Validation(format!(
                    "Hall {} already has a screening at {slot} on {date}",
                    hall.id
                )));
            }
        }

        let mut created = Vec::with_capacity(slots.len());
        for (session_date, start_time) in slots {
            let screening = Screening {
                id: ScreeningId::new(self.ids.next_id()),
                movie_title: cmd.movie_title.clone(),
                cinema_id: cmd.cinema_id,
                hall_id: hall.id,
                start_time,
                session_date,
                price: cmd.price,
                created_at: Utc::now(),
            };

            downstream::call(
                "seat_inventory",
                self.call_timeout,
                self.inventory.create_screening_seats(screening.id, &hall),
            )
            .await?;
            self.screenings.insert(screening.clone()).await?;

            metrics::counter!("screenings_created_total").increment(1);
            tracing::info!(screening_id = %screening.id, date = %screening.session_date, slot = %screening.start_time, "screening scheduled");
            self.actions
                .record(
                    "CREATE_SESSION",
                    Some("admin"),
                    json!({
                        "session_id": screening.id,
                        "movie_title": screening.movie_title,
                        "cinema_id": screening.cinema_id,
                        "hall_id": screening.hall_id,
                        "start_time": screening.start_time,
                        "session_date": screening.session_date,
                    }),
                )
                .await;
            created.push(screening);
        }

        Ok(created)
    }

    /// Loads a screening by id.
    pub async fn get_screening(&self, id: ScreeningId) -> Result<Screening, DomainError> {
        self.screenings
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("screening", id))
    }

    /// Lists every screening in id order.
    pub async fn list_screenings(&self) -> Result<Vec<Screening>, DomainError> {
        Ok(self.screenings.list().await?)
    }

    /// Lists the seats of a screening.
    pub async fn seats(&self, id: ScreeningId) -> Result<Vec<Seat>, DomainError> {
        downstream::call("seat_inventory", self.call_timeout, self.inventory.seats(id)).await
    }

    /// Deletes a screening and its seat map. Tickets are left untouched.
    #[tracing::instrument(skip(self))]
    pub async fn delete_screening(&self, id: ScreeningId) -> Result<Screening, DomainError> {
        let removed = self
            .screenings
            .remove(id)
            .await
            .map_err(|e| DomainError::from_store("screening", e))?;

        if let Err(e) =
            downstream::call("seat_inventory", self.call_timeout, self.inventory.remove_screening(id))
                .await
        {
            tracing::warn!(screening_id = %id, error = %e, "seat map not removed");
        }

        tracing::info!(screening_id = %id, "screening deleted");
        self.actions
            .record(
                "DELETE_SESSION",
                Some("admin"),
                json!({
                    "session_id": removed.id,
                    "movie_title": removed.movie_title,
                    "cinema_id": removed.cinema_id,
                    "hall_id": removed.hall_id,
                    "start_time": removed.start_time,
                }),
            )
            .await;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seating::inventory::StoreSeatInventory;
    use crate::seating::layout::SeatMap;
    use common::SeatPosition;
    use record_store::InMemoryRecordStore;

    type TestCatalog =
        ScreeningCatalog<StoreSeatInventory<InMemoryRecordStore<SeatMap>>, InMemoryRecordStore<Screening>>;

    async fn catalog() -> TestCatalog {
        ScreeningCatalog::new(
            StoreSeatInventory::in_memory(),
            InMemoryRecordStore::new(),
            ActionLog::new(),
        )
        .await
        .unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn cmd(start_time: &str) -> CreateScreening {
        CreateScreening {
            movie_title: "Solaris".to_string(),
            cinema_id: CinemaId::new(1),
            hall_id: HallId::new(1),
            start_time: start_time.to_string(),
            session_date: Some(date("2026-11-01")),
            price: Money::from_major(250),
        }
    }

    #[test]
    fn test_split_start_time_forms() {
        assert_eq!(split_start_time("10:00").unwrap(), (None, "10:00".to_string()));
        assert_eq!(
            split_start_time("2026-11-01T12:00:00").unwrap(),
            (Some(date("2026-11-01")), "12:00".to_string())
        );
        assert_eq!(
            split_start_time("2026-11-01 22:00").unwrap(),
            (Some(date("2026-11-01")), "22:00".to_string())
        );
        assert_eq!(split_start_time("16:00:00").unwrap(), (None, "16:00".to_string()));
        assert!(split_start_time("11:00").is_err());
        assert!(split_start_time("10:00xyz").is_err());
        assert!(split_start_time("2026-11-01T10:00junk").is_err());
        assert!(split_start_time("2026-13-01T10:00").is_err());
    }

    #[tokio::test]
    async fn test_create_screening_instantiates_seats() {
        let catalog = catalog().await;
        let screening = catalog.create_screening(cmd("10:00")).await.unwrap();

        assert_eq!(screening.id, ScreeningId::new(1));
        assert_eq!(screening.start_time, "10:00");
        let seats = catalog.seats(screening.id).await.unwrap();
        assert_eq!(seats.len(), 30);
        assert!(seats.iter().all(|s| s.available));
    }

    #[tokio::test]
    async fn test_date_from_start_time_when_no_session_date() {
        let catalog = catalog().await;
        let mut c = cmd("2026-12-31T18:00");
        c.session_date = None;

        let screening = catalog.create_screening(c).await.unwrap();
        assert_eq!(screening.session_date, date("2026-12-31"));
        assert_eq!(screening.start_time, "18:00");
    }

    #[tokio::test]
    async fn test_rejects_invalid_slot_and_unknown_hall() {
        let catalog = catalog().await;

        assert!(matches!(
            catalog.create_screening(cmd("11:30")).await,
            Err(DomainError::Validation(_))
        ));

        let mut wrong_cinema = cmd("10:00");
        wrong_cinema.hall_id = HallId::new(3);
        assert!(matches!(
            catalog.create_screening(wrong_cinema).await,
            Err(DomainError::Validation(_))
        ));

        let mut unknown_cinema = cmd("10:00");
        unknown_cinema.cinema_id = CinemaId::new(42);
        assert!(matches!(
            catalog.create_screening(unknown_cinema).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_double_booked_hall_slot() {
        let catalog = catalog().await;
        catalog.create_screening(cmd("14:00")).await.unwrap();

        let clash = catalog.create_screening(cmd("14:00")).await;
        assert!(matches!(clash, Err(DomainError::Validation(_))));

        let mut next_day = cmd("14:00");
        next_day.session_date = Some(date("2026-11-02"));
        assert!(catalog.create_screening(next_day).await.is_ok());
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing_on_validation() {
        let catalog = catalog().await;
        let batch = CreateScreenings {
            movie_title: "Stalker".to_string(),
            cinema_id: CinemaId::new(1),
            hall_id: HallId::new(2),
            start_times: vec!["10:00".to_string(), "13:00".to_string()],
            session_date: Some(date("2026-11-01")),
            price: Money::from_major(300),
        };

        assert!(catalog.create_screenings(batch.clone()).await.is_err());
        assert!(catalog.list_screenings().await.unwrap().is_empty());

        let ok = CreateScreenings {
            start_times: vec!["10:00".to_string(), "12:00".to_string()],
            ..batch
        };
        let created = catalog.create_screenings(ok).await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[1].id, ScreeningId::new(2));
    }

    #[tokio::test]
    async fn test_delete_screening_drops_seats() {
        let catalog = catalog().await;
        let screening = catalog.create_screening(cmd("16:00")).await.unwrap();

        catalog.delete_screening(screening.id).await.unwrap();

        assert!(matches!(
            catalog.get_screening(screening.id).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            catalog
                .inventory()
                .is_available(screening.id, &SeatPosition::new("A", 1))
                .await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            catalog.delete_screening(screening.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_ids_continue_after_existing_screenings() {
        let store = InMemoryRecordStore::new();
        store
            .insert(Screening {
                id: ScreeningId::new(41),
                movie_title: "Mirror".to_string(),
                cinema_id: CinemaId::new(1),
                hall_id: HallId::new(1),
                start_time: "20:00".to_string(),
                session_date: date("2026-11-01"),
                price: Money::from_major(250),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let catalog = ScreeningCatalog::new(StoreSeatInventory::in_memory(), store, ActionLog::new())
            .await
            .unwrap();
        let next = catalog.create_screening(cmd("10:00")).await.unwrap();
        assert_eq!(next.id, ScreeningId::new(42));
    }
}
