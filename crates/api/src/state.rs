//! Shared application state and its wiring.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use domain::{
    ActionLog, Screening, ScreeningCatalog, SeatMap, StoreSeatInventory, StoreTicketLedger,
    Ticket,
};
use record_store::{InMemoryRecordStore, JsonFileRecordStore, Record, RecordStore, StoreError};
use saga::{
    HttpNotificationSink, InMemoryNotificationSink, NotificationSink, PaymentOutcomeProvider,
    ReservationCoordinator,
};

use crate::config::Config;
use crate::error::StartupError;

pub type SharedStore<R> = Arc<dyn RecordStore<R>>;
pub type Inventory = StoreSeatInventory<SharedStore<SeatMap>>;
pub type Catalog = ScreeningCatalog<Inventory, SharedStore<Screening>>;
pub type Ledger = StoreTicketLedger<Inventory, SharedStore<Ticket>>;
pub type Coordinator = ReservationCoordinator<
    Ledger,
    Arc<dyn PaymentOutcomeProvider>,
    Arc<dyn NotificationSink>,
>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub catalog: Catalog,
    pub coordinator: Coordinator,
    pub actions: ActionLog,
    /// In-process notification sink; `None` when an external service is used.
    pub notifications: Option<InMemoryNotificationSink>,
    pub call_timeout: Duration,
}

impl AppState {
    pub fn inventory(&self) -> &Inventory {
        self.catalog.inventory()
    }

    pub fn ledger(&self) -> &Ledger {
        self.coordinator.ledger()
    }
}

async fn open_store<R: Record>(
    data_dir: Option<&Path>,
    file: &str,
) -> Result<SharedStore<R>, StoreError> {
    let store: SharedStore<R> = match data_dir {
        Some(dir) => Arc::new(JsonFileRecordStore::<R>::open(dir.join(file)).await?),
        None => Arc::new(InMemoryRecordStore::<R>::new()),
    };
    Ok(store)
}

/// Creates the application state described by `config`.
///
/// Stores are JSON files under `DATA_DIR` when it is set, in memory otherwise.
pub async fn create_default_state(config: &Config) -> Result<Arc<AppState>, StartupError> {
    let data_dir = config.data_dir.as_deref();
    let seat_maps = open_store::<SeatMap>(data_dir, "seats.json").await?;
    let screenings = open_store::<Screening>(data_dir, "screenings.json").await?;
    let tickets = open_store::<Ticket>(data_dir, "tickets.json").await?;

    let actions = ActionLog::new();
    let inventory = StoreSeatInventory::new(seat_maps);

    let catalog = ScreeningCatalog::new(inventory.clone(), screenings, actions.clone())
        .await?
        .with_call_timeout(config.downstream_timeout);
    let ledger = StoreTicketLedger::new(inventory, tickets, actions.clone())
        .await?
        .with_call_timeout(config.downstream_timeout);

    let mut notifications = None;
    let notifier: Arc<dyn NotificationSink> = match &config.notification_url {
        Some(url) => {
            tracing::info!(%url, "using external notification service");
            Arc::new(HttpNotificationSink::new(url, config.downstream_timeout)?)
        }
        None => {
            let sink = InMemoryNotificationSink::new();
            notifications = Some(sink.clone());
            Arc::new(sink)
        }
    };

    let payments = config.payment_policy.into_provider();
    tracing::info!(policy = payments.name(), "payment outcome provider ready");

    let coordinator = ReservationCoordinator::new(ledger, payments, notifier, actions.clone())
        .with_call_timeout(config.downstream_timeout);

    Ok(Arc::new(AppState {
        catalog,
        coordinator,
        actions,
        notifications,
        call_timeout: config.downstream_timeout,
    }))
}
