use cosmwasm_schema::cw_serde;
use cosmwasm_std::Timestamp;

use crate::draw::{
    draw, DrawNotifier, DrawRequest, DrawResult, OrderSource, RaffleLedger, TicketFormatter,
};
use crate::error::{DrawError, ErrorCategory};
use crate::random::RandomSource;
use crate::types::{DrawTrigger, Raffle};

/// Finds raffles that are still active and whose draw time has passed.
pub trait RaffleDirectory {
    /// At most `limit` raffles, oldest `draw_at` first. Quarantined raffles
    /// are never returned.
    fn due_raffles(&self, now: Timestamp, limit: u32) -> Result<Vec<Raffle>, DrawError>;

    /// Take a raffle whose stored data cannot be drawn out of the due queue.
    /// It stays active; only the sweep stops picking it up.
    fn quarantine(&mut self, raffle_id: u64, reason: &str) -> Result<(), DrawError>;
}

#[cw_serde]
pub enum SweepOutcome {
    Drawn {
        raffle_id: u64,
        order_id: u64,
        ticket_index: u32,
        ticket_number: String,
        side_effect_failures: Vec<String>,
    },
    NoTickets {
        raffle_id: u64,
        side_effect_failures: Vec<String>,
    },
    Failed {
        raffle_id: u64,
        category: ErrorCategory,
        reason: String,
        /// Removed from the due queue after an invariant failure.
        quarantined: bool,
    },
}

impl SweepOutcome {
    pub fn raffle_id(&self) -> u64 {
        match self {
            SweepOutcome::Drawn { raffle_id, .. }
            | SweepOutcome::NoTickets { raffle_id, .. }
            | SweepOutcome::Failed { raffle_id, .. } => *raffle_id,
        }
    }
}

#[cw_serde]
#[derive(Default)]
pub struct SweepReport {
    pub drawn: u32,
    pub no_tickets: u32,
    pub failed: u32,
    pub outcomes: Vec<SweepOutcome>,
}

impl SweepReport {
    fn record(&mut self, outcome: SweepOutcome) {
        match outcome {
            SweepOutcome::Drawn { .. } => self.drawn += 1,
            SweepOutcome::NoTickets { .. } => self.no_tickets += 1,
            SweepOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Draw every due raffle independently. A failing raffle is recorded in the
/// report and the sweep moves on. Raffles failing on corrupt data are
/// quarantined so they cannot hold the head of the queue.
///
/// `rng_for` builds the random source for each raffle.
pub fn sweep<B, R, F>(
    now: Timestamp,
    limit: u32,
    backend: &mut B,
    mut rng_for: F,
) -> Result<SweepReport, DrawError>
where
    B: RaffleDirectory + OrderSource + TicketFormatter + RaffleLedger + DrawNotifier + ?Sized,
    R: RandomSource,
    F: FnMut(&B, &Raffle) -> Result<R, DrawError>,
{
    let due = backend.due_raffles(now, limit)?;
    let mut report = SweepReport::default();

    for raffle in &due {
        let result = rng_for(&*backend, raffle).and_then(|mut rng| {
            let request = DrawRequest {
                trigger: DrawTrigger::Scheduled,
                now,
            };
            draw(raffle, request, &mut *backend, &mut rng)
        });

        let outcome = match result {
            Ok(DrawResult::Drawn(receipt)) => SweepOutcome::Drawn {
                raffle_id: raffle.id,
                order_id: receipt.winner.order_id,
                ticket_index: receipt.winner.ticket_index,
                ticket_number: receipt.winner.ticket_number,
                side_effect_failures: receipt.side_effect_failures,
            },
            Ok(DrawResult::NoTicketsSold {
                raffle_id,
                side_effect_failures,
            }) => SweepOutcome::NoTickets {
                raffle_id,
                side_effect_failures,
            },
            Err(err) => {
                let reason = err.to_string();
                let quarantined =
                    err.is_fatal() && backend.quarantine(raffle.id, &reason).is_ok();
                SweepOutcome::Failed {
                    raffle_id: raffle.id,
                    category: err.category(),
                    reason,
                    quarantined,
                }
            }
        };
        report.record(outcome);
    }

    Ok(report)
}
