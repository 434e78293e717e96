use cosmwasm_std::Timestamp;

use crate::error::DrawError;
use crate::random::RandomSource;
use crate::resolver::resolve_position;
use crate::sampler::{pick_winner, total_sold};
use crate::types::{DrawAudit, DrawTrigger, NumberingConfig, Order, Raffle, WinnerRecord};

/// Loads the sold orders of a raffle, in a stable order.
pub trait OrderSource {
    fn load_sold_orders(&self, raffle_id: u64) -> Result<Vec<Order>, DrawError>;
}

pub trait TicketFormatter {
    fn format_ticket_number(
        &self,
        index: u32,
        config: &NumberingConfig,
        total_tickets: u32,
    ) -> Result<String, DrawError>;
}

/// Moves a raffle from active to completed.
///
/// Implementations must apply the update only while the raffle is still
/// active and return [`DrawError::AlreadyDrawn`] otherwise.
pub trait RaffleLedger {
    fn commit_winner(&mut self, raffle_id: u64, winner: Option<WinnerRecord>)
        -> Result<(), DrawError>;
}

/// Best-effort side effects emitted after a commit.
pub trait DrawNotifier {
    fn emit_audit(&mut self, event: &DrawAudit) -> Result<(), DrawError>;

    fn emit_notification(&mut self, raffle: &Raffle, winner: &WinnerRecord)
        -> Result<(), DrawError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawRequest {
    pub trigger: DrawTrigger,
    pub now: Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawReceipt {
    pub raffle_id: u64,
    pub winner: WinnerRecord,
    /// Side effects that failed after the commit. The winner stands regardless.
    pub side_effect_failures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawResult {
    Drawn(DrawReceipt),
    /// Scheduled draw of a raffle nobody bought into; it was closed without a winner.
    NoTicketsSold {
        raffle_id: u64,
        side_effect_failures: Vec<String>,
    },
}

/// Draw and commit the winner of one raffle.
pub fn draw<B, R>(
    raffle: &Raffle,
    request: DrawRequest,
    backend: &mut B,
    rng: &mut R,
) -> Result<DrawResult, DrawError>
where
    B: OrderSource + TicketFormatter + RaffleLedger + DrawNotifier + ?Sized,
    R: RandomSource + ?Sized,
{
    if !raffle.is_active() {
        return Err(DrawError::AlreadyDrawn {
            raffle_id: raffle.id,
        });
    }

    let orders = backend.load_sold_orders(raffle.id)?;
    let sold = total_sold(&orders)?;

    if sold == 0 {
        if !request.trigger.auto_executed() {
            return Err(DrawError::NotEligible {
                raffle_id: raffle.id,
            });
        }
        backend.commit_winner(raffle.id, None)?;
        let audit = DrawAudit {
            raffle_id: raffle.id,
            trigger: request.trigger,
            at: request.now,
            winner: None,
        };
        let mut side_effect_failures = vec![];
        if let Err(err) = backend.emit_audit(&audit) {
            side_effect_failures.push(format!("audit: {}", err));
        }
        return Ok(DrawResult::NoTicketsSold {
            raffle_id: raffle.id,
            side_effect_failures,
        });
    }

    let sampled = pick_winner(&orders, sold, rng)?;
    let ticket_index = resolve_position(sampled.order, sampled.position)?;

    let ticket_number = match backend.format_ticket_number(
        ticket_index,
        &raffle.numbering,
        raffle.total_tickets,
    ) {
        Ok(number) if !number.is_empty() => number,
        _ => ticket_index.to_string(),
    };

    let winner = WinnerRecord {
        order_id: sampled.order.id,
        ticket_index,
        ticket_number,
        buyer: sampled.order.buyer.clone(),
        draw_method: rng.method(),
        drawn_at: request.now,
        trigger: request.trigger.clone(),
        sold_count: sold,
        winning_offset: sampled.offset,
    };

    backend.commit_winner(raffle.id, Some(winner.clone()))?;

    let mut side_effect_failures = vec![];
    let audit = DrawAudit {
        raffle_id: raffle.id,
        trigger: request.trigger,
        at: request.now,
        winner: Some(winner.clone()),
    };
    if let Err(err) = backend.emit_audit(&audit) {
        side_effect_failures.push(format!("audit: {}", err));
    }
    if let Err(err) = backend.emit_notification(raffle, &winner) {
        side_effect_failures.push(format!("notification: {}", err));
    }

    Ok(DrawResult::Drawn(DrawReceipt {
        raffle_id: raffle.id,
        winner,
        side_effect_failures,
    }))
}
