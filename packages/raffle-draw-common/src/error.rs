use cosmwasm_schema::cw_serde;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DrawError {
    #[error("position {position} out of bounds for order {order_id} (ticket_count {ticket_count}, {resolvable} resolvable)")]
    OutOfBounds {
        order_id: u64,
        position: u32,
        ticket_count: u32,
        resolvable: u64,
    },

    #[error("invariant violation: {reason}")]
    InvariantViolation { reason: String },

    #[error("raffle {raffle_id} not found")]
    NotFound { raffle_id: u64 },

    #[error("raffle {raffle_id} is not eligible for a draw: no tickets sold")]
    NotEligible { raffle_id: u64 },

    #[error("raffle {raffle_id} has already been drawn")]
    AlreadyDrawn { raffle_id: u64 },

    #[error("malformed order {order_id}: {reason}")]
    MalformedOrder { order_id: u64, reason: String },

    #[error("failed to load orders for raffle {raffle_id}: {reason}")]
    OrderSource { raffle_id: u64, reason: String },

    #[error("cannot format ticket {index}: {reason}")]
    Format { index: u32, reason: String },

    #[error("failed to commit raffle {raffle_id}: {reason}")]
    Commit { raffle_id: u64, reason: String },

    #[error("side effect failed: {reason}")]
    Notify { reason: String },

    #[error("randomness unavailable: {reason}")]
    Randomness { reason: String },
}

/// Coarse error taxonomy used when reporting per-raffle failures.
#[cw_serde]
#[derive(Copy)]
pub enum ErrorCategory {
    /// Bad request data; surfaced, never retried.
    Input,
    /// Expected business condition such as an empty or finished raffle.
    Eligibility,
    /// Corrupted upstream data; fatal for the draw attempt.
    Invariant,
    /// A collaborator failed.
    Downstream,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Input => "input",
            ErrorCategory::Eligibility => "eligibility",
            ErrorCategory::Invariant => "invariant",
            ErrorCategory::Downstream => "downstream",
        }
    }
}

impl DrawError {
    pub fn invariant(reason: impl Into<String>) -> Self {
        DrawError::InvariantViolation {
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DrawError::MalformedOrder { .. } | DrawError::NotFound { .. } => ErrorCategory::Input,
            DrawError::NotEligible { .. } | DrawError::AlreadyDrawn { .. } => {
                ErrorCategory::Eligibility
            }
            DrawError::OutOfBounds { .. } | DrawError::InvariantViolation { .. } => {
                ErrorCategory::Invariant
            }
            DrawError::OrderSource { .. }
            | DrawError::Format { .. }
            | DrawError::Commit { .. }
            | DrawError::Notify { .. }
            | DrawError::Randomness { .. } => ErrorCategory::Downstream,
        }
    }

    /// Invariant failures mean the inputs are corrupt; retrying cannot help.
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Invariant
    }
}
