use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::Timestamp;
use raffle_draw_common::{BuyerSnapshot, NumberingConfig, Order, Raffle, TicketRange, WinnerRecord};

use crate::state::{Config, StoredBeacon};

#[cw_serde]
pub struct InstantiateMsg {
    pub operators: Vec<String>,
    /// Hex-encoded quicknet public key (96 bytes = 192 hex chars)
    pub quicknet_pubkey_hex: String,
    pub genesis_time: u64,
    pub period_seconds: u64,
    pub max_raffles_per_sweep: u32,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Open a raffle owned by the sender.
    CreateRaffle {
        total_tickets: u32,
        numbering: Option<NumberingConfig>,
        draw_at: Timestamp,
    },
    /// Record a paid order. Operators only.
    RecordOrder {
        raffle_id: u64,
        ticket_count: u32,
        ticket_ranges: Vec<TicketRange>,
        lucky_indices: Vec<u32>,
        buyer: BuyerSnapshot,
    },
    /// Submit a drand beacon for verification and storage. Operators only.
    SubmitBeacon {
        round: u64,
        /// Hex-encoded BLS signature (48 bytes = 96 hex chars)
        signature_hex: String,
    },
    /// Draw one raffle now. Raffle owner or admin.
    DrawWinner { raffle_id: u64 },
    /// Draw every raffle whose draw time has passed. Anyone can call.
    SweepDueRaffles {},
    /// Update configuration. Admin only.
    UpdateConfig { max_raffles_per_sweep: Option<u32> },
    /// Update operator list. Admin only.
    UpdateOperators {
        add: Vec<String>,
        remove: Vec<String>,
    },
}

#[cw_serde]
pub struct MigrateMsg {}

pub struct RecordOrderParams {
    pub raffle_id: u64,
    pub ticket_count: u32,
    pub ticket_ranges: Vec<TicketRange>,
    pub lucky_indices: Vec<u32>,
    pub buyer: BuyerSnapshot,
}

pub struct UpdateConfigParams {
    pub max_raffles_per_sweep: Option<u32>,
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(Config)]
    Config {},
    #[returns(Raffle)]
    Raffle { raffle_id: u64 },
    #[returns(RafflesResponse)]
    Raffles {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(OrdersResponse)]
    Orders {
        raffle_id: u64,
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(Option<WinnerRecord>)]
    Winner { raffle_id: u64 },
    /// Raffles a sweep at the current block time would pick up.
    #[returns(Vec<u64>)]
    DueRaffles { limit: Option<u32> },
    #[returns(Option<StoredBeacon>)]
    LatestBeacon {},
    /// Drand round committed at creation; the draw uses only this beacon.
    #[returns(u64)]
    TargetRound { raffle_id: u64 },
    #[returns(Option<u64>)]
    TicketOwner { raffle_id: u64, ticket_index: u32 },
    /// Raffles pulled from the due queue after an integrity failure.
    #[returns(QuarantinedResponse)]
    QuarantinedRaffles {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    /// Re-run ticket resolution for a position inside an order.
    #[returns(u32)]
    ResolveTicket {
        raffle_id: u64,
        order_id: u64,
        position: u32,
    },
}

#[cw_serde]
pub struct RafflesResponse {
    pub raffles: Vec<Raffle>,
}

#[cw_serde]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
}

#[cw_serde]
pub struct QuarantinedRaffle {
    pub raffle_id: u64,
    pub reason: String,
}

#[cw_serde]
pub struct QuarantinedResponse {
    pub raffles: Vec<QuarantinedRaffle>,
}
