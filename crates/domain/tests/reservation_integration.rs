//! Integration tests across the screening catalog, seat inventory and ticket ledger.

use std::sync::Arc;

use chrono::NaiveDate;
use common::{CinemaId, HallId, ScreeningId, SeatPosition};
use domain::{
    ActionLog, CreateScreening, DomainError, Money, ReserveTicket, ScreeningCatalog, SeatInventory,
    SeatMap, StoreSeatInventory, StoreTicketLedger, Ticket, TicketLedger, TicketStatus,
};
use record_store::{InMemoryRecordStore, JsonFileRecordStore};

type Inventory = StoreSeatInventory<InMemoryRecordStore<SeatMap>>;

struct Harness {
    catalog: ScreeningCatalog<Inventory, InMemoryRecordStore<domain::Screening>>,
    ledger: Arc<StoreTicketLedger<Inventory, InMemoryRecordStore<Ticket>>>,
    inventory: Inventory,
}

impl Harness {
    async fn new() -> Self {
        let actions = ActionLog::new();
        let inventory = StoreSeatInventory::in_memory();
        let catalog =
            ScreeningCatalog::new(inventory.clone(), InMemoryRecordStore::new(), actions.clone())
                .await
                .unwrap();
        let ledger = Arc::new(StoreTicketLedger::in_memory(inventory.clone(), actions));
        Self {
            catalog,
            ledger,
            inventory,
        }
    }

    async fn screening(&self, slot: &str) -> ScreeningId {
        self.catalog
            .create_screening(CreateScreening {
                movie_title: "Solaris".to_string(),
                cinema_id: CinemaId::new(2),
                hall_id: HallId::new(3),
                start_time: slot.to_string(),
                session_date: NaiveDate::from_ymd_opt(2026, 11, 1),
                price: Money::from_major(250),
            })
            .await
            .unwrap()
            .id
    }
}

/// A seat is unavailable exactly when a reserved or sold ticket references it.
async fn assert_seats_match_tickets(h: &Harness, screening_id: ScreeningId) {
    let tickets = h.ledger.list_by_screening(screening_id).await.unwrap();
    for seat in h.inventory.seats(screening_id).await.unwrap() {
        let held = tickets
            .iter()
            .any(|t| t.seat() == seat.position() && t.status.holds_seat());
        assert_eq!(!seat.available, held, "seat {}", seat.position());
    }
}

#[tokio::test]
async fn test_reserve_confirm_cancel_keeps_seats_consistent() {
    let h = Harness::new().await;
    let screening = h.screening("10:00").await;

    let a1 = h
        .ledger
        .reserve(ReserveTicket::new(screening, SeatPosition::new("A", 1), Money::from_major(250)))
        .await
        .unwrap();
    let a2 = h
        .ledger
        .reserve(ReserveTicket::new(screening, SeatPosition::new("A", 2), Money::from_major(250)))
        .await
        .unwrap();
    assert_seats_match_tickets(&h, screening).await;

    h.ledger.confirm(a1.id).await.unwrap();
    h.ledger.cancel(a2.id).await.unwrap();
    assert_seats_match_tickets(&h, screening).await;

    let rebooked = h
        .ledger
        .reserve(ReserveTicket::new(screening, SeatPosition::new("A", 2), Money::from_major(250)))
        .await
        .unwrap();
    assert_eq!(rebooked.status, TicketStatus::Reserved);
    assert_seats_match_tickets(&h, screening).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reservations_of_one_seat_admit_exactly_one() {
    let h = Harness::new().await;
    let screening = h.screening("12:00").await;

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let ledger = h.ledger.clone();
            tokio::spawn(async move {
                ledger
                    .reserve(
                        ReserveTicket::new(
                            screening,
                            SeatPosition::new("C", 7),
                            Money::from_major(250),
                        )
                        .with_email(format!("buyer{i}@example.com")),
                    )
                    .await
            })
        })
        .collect();

    let results = futures_util::future::join_all(handles).await;
    let successes = results
        .iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Ok(Err(DomainError::SeatUnavailable { .. }))))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(rejected, 15);
    assert_eq!(h.ledger.list_by_screening(screening).await.unwrap().len(), 1);
    assert_seats_match_tickets(&h, screening).await;
}

#[tokio::test]
async fn test_screenings_do_not_share_seats() {
    let h = Harness::new().await;
    let morning = h.screening("10:00").await;
    let evening = h.screening("20:00").await;

    h.ledger
        .reserve(ReserveTicket::new(morning, SeatPosition::new("E", 14), Money::from_major(250)))
        .await
        .unwrap();

    let evening_ticket = h
        .ledger
        .reserve(ReserveTicket::new(evening, SeatPosition::new("E", 14), Money::from_major(250)))
        .await;
    assert!(evening_ticket.is_ok());
}

#[tokio::test]
async fn test_ledger_state_survives_restart_with_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let seats_path = dir.path().join("seats.json");
    let tickets_path = dir.path().join("tickets.json");
    let screening = ScreeningId::new(1);

    {
        let inventory = StoreSeatInventory::new(JsonFileRecordStore::open(&seats_path).await.unwrap());
        inventory
            .create_screening_seats(screening, &domain::seating::default_halls()[0])
            .await
            .unwrap();
        let ledger = StoreTicketLedger::new(
            inventory,
            JsonFileRecordStore::open(&tickets_path).await.unwrap(),
            ActionLog::new(),
        )
        .await
        .unwrap();
        let ticket = ledger
            .reserve(ReserveTicket::new(screening, SeatPosition::new("B", 2), Money::from_major(250)))
            .await
            .unwrap();
        ledger.confirm(ticket.id).await.unwrap();
    }

    let inventory = StoreSeatInventory::new(JsonFileRecordStore::open(&seats_path).await.unwrap());
    let ledger = StoreTicketLedger::new(
        inventory,
        JsonFileRecordStore::open(&tickets_path).await.unwrap(),
        ActionLog::new(),
    )
    .await
    .unwrap();

    let tickets = ledger.list_all().await.unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].status, TicketStatus::Sold);
    assert!(
        !ledger
            .inventory()
            .is_available(screening, &SeatPosition::new("B", 2))
            .await
            .unwrap()
    );

    let next = ledger
        .reserve(ReserveTicket::new(screening, SeatPosition::new("B", 3), Money::from_major(250)))
        .await
        .unwrap();
    assert_eq!(next.id.value(), 2);
}
