//! Ticket ledger: creates tickets and drives their status.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{IdSequence, ScreeningId, TicketId};
use record_store::{InMemoryRecordStore, RecordStore};
use serde_json::json;
use tracing::Instrument;

use crate::activity::ActionLog;
use crate::downstream::{self, DEFAULT_CALL_TIMEOUT};
use crate::error::DomainError;
use crate::seating::inventory::SeatInventory;
use crate::tickets::ticket::{ReserveTicket, Ticket, TicketStatus};

const INVENTORY: &str = "seat_inventory";
const TICKET_STORE: &str = "ticket_store";

/// Owner of ticket records and their lifecycle status.
#[async_trait]
pub trait TicketLedger: Send + Sync {
    /// Holds the seat and creates a `Reserved` ticket for it.
    ///
    /// Fails with `SeatUnavailable`, creating nothing, if the seat is held or
    /// sold.
    async fn reserve(&self, cmd: ReserveTicket) -> Result<Ticket, DomainError>;

    /// Marks a ticket `Sold`. The seat stays unavailable.
    async fn confirm(&self, ticket_id: TicketId) -> Result<Ticket, DomainError>;

    /// Marks a ticket `Cancelled` and releases its seat.
    async fn cancel(&self, ticket_id: TicketId) -> Result<Ticket, DomainError>;

    /// Loads a ticket by id.
    async fn get(&self, ticket_id: TicketId) -> Result<Option<Ticket>, DomainError>;

    /// Lists every ticket in id order.
    async fn list_all(&self) -> Result<Vec<Ticket>, DomainError>;

    /// Lists the tickets of one screening in id order.
    async fn list_by_screening(&self, screening_id: ScreeningId)
    -> Result<Vec<Ticket>, DomainError>;
}

/// [`TicketLedger`] backed by a [`RecordStore`] of tickets, reaching the seat
/// inventory through bounded peer calls.
///
/// Confirm and cancel overwrite the status unconditionally: confirming a
/// cancelled ticket makes it sold again, and cancelling a sold ticket
/// releases its seat. Both cases are logged at `warn`.
pub struct StoreTicketLedger<I, S> {
    inventory: Arc<I>,
    tickets: Arc<S>,
    ids: Arc<IdSequence>,
    actions: ActionLog,
    call_timeout: Duration,
}

impl<I: SeatInventory> StoreTicketLedger<I, InMemoryRecordStore<Ticket>> {
    /// Creates a ledger with an empty in-memory ticket store.
    pub fn in_memory(inventory: I, actions: ActionLog) -> Self {
        Self::with_ids(inventory, InMemoryRecordStore::new(), actions, IdSequence::new())
    }
}

impl<I, S> StoreTicketLedger<I, S>
where
    I: SeatInventory,
    S: RecordStore<Ticket>,
{
    /// Creates a ledger over `tickets`; new ids continue after the highest
    /// stored id.
    pub async fn new(inventory: I, tickets: S, actions: ActionLog) -> Result<Self, DomainError> {
        let last = tickets.max_id().await?.map(|id| id.value()).unwrap_or(0);
        Ok(Self::with_ids(
            inventory,
            tickets,
            actions,
            IdSequence::starting_after(last),
        ))
    }

    fn with_ids(inventory: I, tickets: S, actions: ActionLog, ids: IdSequence) -> Self {
        Self {
            inventory: Arc::new(inventory),
            tickets: Arc::new(tickets),
            ids: Arc::new(ids),
            actions,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Sets the timeout applied to seat inventory calls.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Returns the seat inventory this ledger reserves against.
    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    async fn set_status(
        &self,
        ticket_id: TicketId,
        status: TicketStatus,
    ) -> Result<(Ticket, TicketStatus), DomainError> {
        let mut previous = status;
        let ticket = self
            .tickets
            .update(
                ticket_id,
                Box::new(|t: &mut Ticket| {
                    previous = t.status;
                    t.status = status;
                }),
            )
            .await
            .map_err(|e| DomainError::from_store("ticket", e))?;
        Ok((ticket, previous))
    }
}

/// The seat hold and the ticket insert of one reservation.
///
/// Runs on its own task, so it completes even when the caller stops waiting:
/// either the ticket is stored or the seat is released again.
struct Reservation<I, S> {
    inventory: Arc<I>,
    tickets: Arc<S>,
    ids: Arc<IdSequence>,
    actions: ActionLog,
    call_timeout: Duration,
}

impl<I, S> Reservation<I, S>
where
    I: SeatInventory,
    S: RecordStore<Ticket>,
{
    async fn run(self, cmd: ReserveTicket) -> Result<Ticket, DomainError> {
        let held = downstream::call(
            INVENTORY,
            self.call_timeout,
            self.inventory.hold_if_available(cmd.screening_id, &cmd.seat),
        )
        .await?;

        if !held {
            metrics::counter!("seat_reservations_rejected_total").increment(1);
            tracing::warn!("seat not available");
            return Err(DomainError::SeatUnavailable {
                screening_id: cmd.screening_id,
                seat: cmd.seat,
            });
        }

        let ticket = Ticket {
            id: TicketId::new(self.ids.next_id()),
            screening_id: cmd.screening_id,
            row: cmd.seat.row.clone(),
            seat_number: cmd.seat.number,
            status: TicketStatus::Reserved,
            price: cmd.price,
            buyer_email: cmd.buyer_email,
        };

        if let Err(e) = self.tickets.insert(ticket.clone()).await {
            tracing::error!(ticket_id = %ticket.id, error = %e, "ticket not stored, releasing seat");
            let release = downstream::call(
                INVENTORY,
                self.call_timeout,
                self.inventory
                    .set_availability(cmd.screening_id, &cmd.seat, true),
            )
            .await;
            if let Err(release_err) = release {
                tracing::error!(error = %release_err, "seat left held after failed reservation");
            }
            return Err(e.into());
        }

        metrics::counter!("tickets_reserved_total").increment(1);
        tracing::info!(ticket_id = %ticket.id, "ticket reserved");
        journal(&self.actions, "RESERVE_TICKET", &ticket).await;
        Ok(ticket)
    }
}

async fn journal(actions: &ActionLog, action: &str, ticket: &Ticket) {
    actions
        .record(
            action,
            ticket.buyer_email.as_deref(),
            json!({
                "ticket_id": ticket.id,
                "session_id": ticket.screening_id,
                "row": ticket.row,
                "number": ticket.seat_number,
                "price": ticket.price,
                "email": ticket.buyer_email,
            }),
        )
        .await;
}

#[async_trait]
impl<I, S> TicketLedger for StoreTicketLedger<I, S>
where
    I: SeatInventory + 'static,
    S: RecordStore<Ticket> + 'static,
{
    #[tracing::instrument(skip(self, cmd), fields(screening_id = %cmd.screening_id, seat = %cmd.seat))]
    async fn reserve(&self, cmd: ReserveTicket) -> Result<Ticket, DomainError> {
        let reservation = Reservation {
            inventory: Arc::clone(&self.inventory),
            tickets: Arc::clone(&self.tickets),
            ids: Arc::clone(&self.ids),
            actions: self.actions.clone(),
            call_timeout: self.call_timeout,
        };

        tokio::spawn(reservation.run(cmd).in_current_span())
            .await
            .unwrap_or_else(|e| {
                Err(DomainError::DownstreamUnavailable {
                    peer: TICKET_STORE,
                    reason: e.to_string(),
                })
            })
    }

    #[tracing::instrument(skip(self))]
    async fn confirm(&self, ticket_id: TicketId) -> Result<Ticket, DomainError> {
        let (ticket, previous) = self.set_status(ticket_id, TicketStatus::Sold).await?;

        if previous == TicketStatus::Cancelled {
            tracing::warn!(%previous, "confirming a cancelled ticket");
        }

        metrics::counter!("tickets_confirmed_total").increment(1);
        tracing::info!("ticket sold");
        journal(&self.actions, "CONFIRM_TICKET", &ticket).await;
        Ok(ticket)
    }

    /// Marks the ticket `Cancelled`, then releases its seat.
    ///
    /// If the seat release fails the ticket stays `Cancelled` and the error
    /// is returned, so the caller knows the seat may still be held. A seat
    /// map that no longer exists is logged and treated as released. An
    /// already cancelled ticket no longer owns its seat and releases nothing.
    #[tracing::instrument(skip(self))]
    async fn cancel(&self, ticket_id: TicketId) -> Result<Ticket, DomainError> {
        let (ticket, previous) = self.set_status(ticket_id, TicketStatus::Cancelled).await?;

        if previous == TicketStatus::Sold {
            tracing::warn!(%previous, "cancelling a sold ticket releases its seat");
        }

        metrics::counter!("tickets_cancelled_total").increment(1);
        journal(&self.actions, "CANCEL_TICKET", &ticket).await;

        // The seat may already belong to a newer ticket.
        if !previous.holds_seat() {
            tracing::info!("ticket already cancelled, seat left as is");
            return Ok(ticket);
        }

        let release = downstream::call(
            INVENTORY,
            self.call_timeout,
            self.inventory
                .set_availability(ticket.screening_id, &ticket.seat(), true),
        )
        .await;

        match release {
            Ok(_) => {
                tracing::info!(seat = %ticket.seat(), "ticket cancelled, seat released");
                Ok(ticket)
            }
            Err(DomainError::NotFound { entity, id }) => {
                tracing::warn!(entity, id = %id, "ticket cancelled, seat map missing");
                Ok(ticket)
            }
            Err(e) => {
                metrics::counter!("seat_release_failures_total").increment(1);
                tracing::error!(error = %e, "ticket cancelled but seat not released");
                Err(e)
            }
        }
    }

    async fn get(&self, ticket_id: TicketId) -> Result<Option<Ticket>, DomainError> {
        Ok(self.tickets.get(ticket_id).await?)
    }

    async fn list_all(&self) -> Result<Vec<Ticket>, DomainError> {
        Ok(self.tickets.list().await?)
    }

    async fn list_by_screening(
        &self,
        screening_id: ScreeningId,
    ) -> Result<Vec<Ticket>, DomainError> {
        let mut tickets = self.tickets.list().await?;
        tickets.retain(|t| t.screening_id == screening_id);
        Ok(tickets)
    }
}
