use cosmwasm_std::{Event, Order as IterOrder, StdError, StdResult, Storage, Timestamp};
use cw_storage_plus::Bound;
use raffle_draw_common::{
    format_ticket_number, BeaconRng, DrawAudit, DrawError, DrawNotifier, NumberingConfig, Order,
    OrderSource, Raffle, RaffleDirectory, RaffleLedger, RaffleStatus, TicketFormatter,
    WinnerRecord,
};

use crate::beacon::{committed_beacon, raffle_rng};
use crate::state::{ORDERS, PENDING_DRAWS, QUARANTINED, RAFFLES};

/// Contract storage seen through the draw engine's collaborator traits.
/// Audit and notification side effects are collected as events for the response.
pub struct StorageBackend<'a> {
    storage: &'a mut dyn Storage,
    pub events: Vec<Event>,
}

impl<'a> StorageBackend<'a> {
    pub fn new(storage: &'a mut dyn Storage) -> Self {
        Self {
            storage,
            events: vec![],
        }
    }

    /// Random source from the beacon `raffle` committed to. A missing beacon
    /// is a retryable randomness failure.
    pub fn committed_rng(&self, raffle: &Raffle) -> Result<BeaconRng, DrawError> {
        let beacon =
            committed_beacon(&*self.storage, raffle.id).map_err(|e| DrawError::Randomness {
                reason: e.to_string(),
            })?;
        raffle_rng(&beacon, raffle.id)
    }
}

fn storage_error(raffle_id: u64) -> impl Fn(StdError) -> DrawError {
    move |err| DrawError::OrderSource {
        raffle_id,
        reason: err.to_string(),
    }
}

pub fn load_orders(storage: &dyn Storage, raffle_id: u64) -> StdResult<Vec<Order>> {
    ORDERS
        .prefix(raffle_id)
        .range(storage, None, None, IterOrder::Ascending)
        .map(|item| item.map(|(_, order)| order))
        .collect()
}

/// Active raffles with `draw_at <= now`, oldest first.
pub fn due_raffle_ids(storage: &dyn Storage, now: Timestamp, limit: u32) -> StdResult<Vec<u64>> {
    PENDING_DRAWS
        .keys(
            storage,
            None,
            Some(Bound::inclusive((now.seconds(), u64::MAX))),
            IterOrder::Ascending,
        )
        .take(limit as usize)
        .map(|key| key.map(|(_, raffle_id)| raffle_id))
        .collect()
}

impl OrderSource for StorageBackend<'_> {
    fn load_sold_orders(&self, raffle_id: u64) -> Result<Vec<Order>, DrawError> {
        load_orders(&*self.storage, raffle_id).map_err(storage_error(raffle_id))
    }
}

impl TicketFormatter for StorageBackend<'_> {
    fn format_ticket_number(
        &self,
        index: u32,
        config: &NumberingConfig,
        total_tickets: u32,
    ) -> Result<String, DrawError> {
        format_ticket_number(index, config, total_tickets)
    }
}

impl RaffleLedger for StorageBackend<'_> {
    fn commit_winner(
        &mut self,
        raffle_id: u64,
        winner: Option<WinnerRecord>,
    ) -> Result<(), DrawError> {
        let commit_error = |err: StdError| DrawError::Commit {
            raffle_id,
            reason: err.to_string(),
        };

        let mut raffle = RAFFLES
            .may_load(&*self.storage, raffle_id)
            .map_err(commit_error)?
            .ok_or(DrawError::NotFound { raffle_id })?;

        // Re-read under the same execution: only an active raffle may complete.
        if raffle.status != RaffleStatus::Active {
            return Err(DrawError::AlreadyDrawn { raffle_id });
        }

        raffle.status = RaffleStatus::Completed;
        raffle.winner_ticket_number = winner.as_ref().map(|w| w.ticket_number.clone());
        raffle.winner = winner;

        RAFFLES
            .save(self.storage, raffle_id, &raffle)
            .map_err(commit_error)?;
        PENDING_DRAWS.remove(self.storage, (raffle.draw_at.seconds(), raffle_id));
        QUARANTINED.remove(self.storage, raffle_id);
        Ok(())
    }
}

impl DrawNotifier for StorageBackend<'_> {
    fn emit_audit(&mut self, event: &DrawAudit) -> Result<(), DrawError> {
        let mut audit = Event::new("raffle_draw_audit")
            .add_attribute("raffle_id", event.raffle_id.to_string())
            .add_attribute("auto_executed", event.trigger.auto_executed().to_string())
            .add_attribute("timestamp", event.at.seconds().to_string());
        if let Some(by) = event.trigger.executed_by() {
            audit = audit.add_attribute("executed_by", by.to_string());
        }
        audit = match &event.winner {
            Some(winner) => audit
                .add_attribute("outcome", "winner")
                .add_attribute("order_id", winner.order_id.to_string())
                .add_attribute("ticket_index", winner.ticket_index.to_string())
                .add_attribute("ticket_number", winner.ticket_number.clone())
                .add_attribute("sold_count", winner.sold_count.to_string())
                .add_attribute("winning_offset", winner.winning_offset.to_string())
                .add_attribute("draw_method", winner.draw_method.as_str()),
            None => audit.add_attribute("outcome", "no_tickets"),
        };
        self.events.push(audit);
        Ok(())
    }

    fn emit_notification(
        &mut self,
        raffle: &Raffle,
        winner: &WinnerRecord,
    ) -> Result<(), DrawError> {
        // Buyer contact details stay off-chain; the notifier looks them up by order.
        self.events.push(
            Event::new("raffle_winner_notification")
                .add_attribute("raffle_id", raffle.id.to_string())
                .add_attribute("owner", raffle.owner.to_string())
                .add_attribute("order_id", winner.order_id.to_string())
                .add_attribute("ticket_number", winner.ticket_number.clone()),
        );
        Ok(())
    }
}

impl RaffleDirectory for StorageBackend<'_> {
    fn due_raffles(&self, now: Timestamp, limit: u32) -> Result<Vec<Raffle>, DrawError> {
        let to_error = |err: StdError| DrawError::InvariantViolation {
            reason: format!("pending draw index unreadable: {}", err),
        };
        due_raffle_ids(&*self.storage, now, limit)
            .map_err(to_error)?
            .into_iter()
            .map(|raffle_id| {
                RAFFLES
                    .may_load(&*self.storage, raffle_id)
                    .map_err(to_error)?
                    .ok_or_else(|| {
                        DrawError::invariant(format!(
                            "pending draw index points at missing raffle {}",
                            raffle_id
                        ))
                    })
            })
            .collect()
    }

    fn quarantine(&mut self, raffle_id: u64, reason: &str) -> Result<(), DrawError> {
        let quarantine_error = |err: StdError| DrawError::Commit {
            raffle_id,
            reason: err.to_string(),
        };
        let raffle = RAFFLES
            .may_load(&*self.storage, raffle_id)
            .map_err(quarantine_error)?
            .ok_or(DrawError::NotFound { raffle_id })?;

        PENDING_DRAWS.remove(self.storage, (raffle.draw_at.seconds(), raffle_id));
        QUARANTINED
            .save(self.storage, raffle_id, &reason.to_string())
            .map_err(quarantine_error)?;
        self.events.push(
            Event::new("raffle_quarantined")
                .add_attribute("raffle_id", raffle_id.to_string())
                .add_attribute("reason", reason),
        );
        Ok(())
    }
}
