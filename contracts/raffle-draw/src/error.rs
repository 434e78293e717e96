use cosmwasm_std::StdError;
use raffle_draw_common::DrawError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Draw(#[from] DrawError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("invalid raffle: {reason}")]
    InvalidRaffle { reason: String },

    #[error("raffle {raffle_id} is sold out: {requested} requested, {available} available")]
    SoldOut {
        raffle_id: u64,
        requested: u32,
        available: u32,
    },

    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("beacon for round {round} already exists")]
    BeaconAlreadyExists { round: u64 },

    #[error("BLS verification failed: {reason}")]
    VerificationFailed { reason: String },

    #[error("invalid hex input: {field}")]
    InvalidHex { field: String },

    #[error("invalid pubkey length: expected 96 bytes, got {got}")]
    InvalidPubkeyLength { got: usize },

    #[error("no verified beacon for round {round}")]
    BeaconNotFound { round: u64 },

    #[error("raffle {raffle_id} no longer accepts orders")]
    SalesClosed { raffle_id: u64 },

    #[error("ticket {ticket_index} of raffle {raffle_id} already belongs to order {order_id}")]
    TicketTaken {
        raffle_id: u64,
        ticket_index: u32,
        order_id: u64,
    },
}
