use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp};

use crate::error::DrawError;

/// An inclusive `[start, end]` span of ticket indices owned by one order.
#[cw_serde]
#[derive(Copy)]
pub struct TicketRange {
    pub start: u32,
    pub end: u32,
}

impl TicketRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Number of tickets in the range. Computed in u64 so a full `[0, u32::MAX]`
    /// span does not overflow.
    pub fn size(&self) -> u64 {
        u64::from(self.end) - u64::from(self.start) + 1
    }

    pub fn contains(&self, index: u32) -> bool {
        self.start <= index && index <= self.end
    }

    fn overlaps(&self, other: &TicketRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Buyer details copied onto the order at purchase time.
#[cw_serde]
#[derive(Default)]
pub struct BuyerSnapshot {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
}

/// One purchase. Its position space is the ranges (in stored order) followed
/// by the lucky indices.
#[cw_serde]
pub struct Order {
    pub id: u64,
    pub ticket_count: u32,
    pub ticket_ranges: Vec<TicketRange>,
    pub lucky_indices: Vec<u32>,
    pub buyer: BuyerSnapshot,
    pub created_at: Timestamp,
}

impl Order {
    /// Number of positions actually addressable through ranges and lucky indices.
    pub fn position_space(&self) -> u64 {
        let ranged: u64 = self.ticket_ranges.iter().map(TicketRange::size).sum();
        ranged + self.lucky_indices.len() as u64
    }

    /// Every ticket index the order owns, in position order.
    pub fn tickets(&self) -> impl Iterator<Item = u32> + '_ {
        self.ticket_ranges
            .iter()
            .flat_map(|r| r.start..=r.end)
            .chain(self.lucky_indices.iter().copied())
    }

    /// Checks the structural invariants of an order against a raffle of
    /// `total_tickets` tickets.
    pub fn validate(&self, total_tickets: u32) -> Result<(), DrawError> {
        let malformed = |reason: String| DrawError::MalformedOrder {
            order_id: self.id,
            reason,
        };

        if self.ticket_count == 0 {
            return Err(malformed("ticket_count must be positive".to_string()));
        }

        for (i, range) in self.ticket_ranges.iter().enumerate() {
            if range.start > range.end {
                return Err(malformed(format!(
                    "range [{}, {}] has start after end",
                    range.start, range.end
                )));
            }
            if range.end >= total_tickets {
                return Err(malformed(format!(
                    "range [{}, {}] exceeds raffle size {}",
                    range.start, range.end, total_tickets
                )));
            }
            if let Some(other) = self.ticket_ranges[..i].iter().find(|r| r.overlaps(range)) {
                return Err(malformed(format!(
                    "range [{}, {}] overlaps [{}, {}]",
                    range.start, range.end, other.start, other.end
                )));
            }
        }

        for (i, &lucky) in self.lucky_indices.iter().enumerate() {
            if lucky >= total_tickets {
                return Err(malformed(format!(
                    "lucky index {} exceeds raffle size {}",
                    lucky, total_tickets
                )));
            }
            if self.ticket_ranges.iter().any(|r| r.contains(lucky)) {
                return Err(malformed(format!(
                    "lucky index {} is already covered by a range",
                    lucky
                )));
            }
            if self.lucky_indices[..i].contains(&lucky) {
                return Err(malformed(format!("lucky index {} is duplicated", lucky)));
            }
        }

        let space = self.position_space();
        if space != u64::from(self.ticket_count) {
            return Err(malformed(format!(
                "ticket_count {} does not match {} owned tickets",
                self.ticket_count, space
            )));
        }

        Ok(())
    }
}

/// How abstract ticket indices are printed for humans.
#[cw_serde]
pub struct NumberingConfig {
    /// Number printed for ticket index 0.
    pub start_number: u64,
    /// Increment between consecutive ticket indices.
    pub step: u64,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    /// Left-pad with zeros to the width of the highest number in the raffle.
    pub zero_pad: bool,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            start_number: 1,
            step: 1,
            prefix: None,
            suffix: None,
            zero_pad: false,
        }
    }
}

#[cw_serde]
pub enum RaffleStatus {
    Active,
    Completed,
}

#[cw_serde]
pub struct Raffle {
    pub id: u64,
    pub owner: Addr,
    pub total_tickets: u32,
    pub sold_tickets: u32,
    pub numbering: NumberingConfig,
    pub status: RaffleStatus,
    /// Scheduled draw time picked up by the sweep
    pub draw_at: Timestamp,
    pub created_at: Timestamp,
    pub winner_ticket_number: Option<String>,
    pub winner: Option<WinnerRecord>,
}

impl Raffle {
    pub fn is_active(&self) -> bool {
        self.status == RaffleStatus::Active
    }
}

/// The mechanism that produced the winning offset.
#[cw_serde]
pub enum DrawMethod {
    /// ChaCha20 stream keyed from a verified drand beacon.
    DrandChaCha20 { round: u64 },
    /// Caller-supplied deterministic sequence.
    FixedSequence,
}

impl DrawMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawMethod::DrandChaCha20 { .. } => "drand_chacha20",
            DrawMethod::FixedSequence => "fixed_sequence",
        }
    }
}

/// Who started a draw.
#[cw_serde]
pub enum DrawTrigger {
    /// Picked up by the batch sweep once `draw_at` passed.
    Scheduled,
    /// Requested for a single raffle by its owner or an admin.
    Manual { executed_by: Addr },
}

impl DrawTrigger {
    pub fn auto_executed(&self) -> bool {
        matches!(self, DrawTrigger::Scheduled)
    }

    pub fn executed_by(&self) -> Option<&Addr> {
        match self {
            DrawTrigger::Scheduled => None,
            DrawTrigger::Manual { executed_by } => Some(executed_by),
        }
    }
}

/// Immutable result of a draw, attached to its raffle.
#[cw_serde]
pub struct WinnerRecord {
    pub order_id: u64,
    pub ticket_index: u32,
    pub ticket_number: String,
    pub buyer: BuyerSnapshot,
    pub draw_method: DrawMethod,
    pub drawn_at: Timestamp,
    pub trigger: DrawTrigger,
    /// Size of the sample space the offset was drawn from
    pub sold_count: u32,
    /// Global offset into the sold tickets, in order-list order
    pub winning_offset: u32,
}

/// Payload handed to the audit collaborator after a commit.
#[cw_serde]
pub struct DrawAudit {
    pub raffle_id: u64,
    pub trigger: DrawTrigger,
    pub at: Timestamp,
    /// `None` when the raffle closed without sold tickets.
    pub winner: Option<WinnerRecord>,
}
