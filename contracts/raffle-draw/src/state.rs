use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp};
use cw_storage_plus::{Item, Map};
use raffle_draw_common::{Order, Raffle};

pub const CONFIG: Item<Config> = Item::new("config");
pub const NEXT_RAFFLE_ID: Item<u64> = Item::new("next_raffle_id");
pub const NEXT_ORDER_ID: Item<u64> = Item::new("next_order_id");
pub const RAFFLES: Map<u64, Raffle> = Map::new("raffles");

/// Orders keyed by (raffle_id, order_id). Order ids grow monotonically, so
/// iterating a raffle's prefix yields orders in creation order.
pub const ORDERS: Map<(u64, u64), Order> = Map::new("orders");

/// Active raffles keyed by (draw_at seconds, raffle_id). Removed on completion
/// or quarantine.
pub const PENDING_DRAWS: Map<(u64, u64), ()> = Map::new("pending_draws");

/// Raffles taken out of the sweep after failing on corrupt data, with the reason.
pub const QUARANTINED: Map<u64, String> = Map::new("quarantined");

/// Drand round each raffle committed to at creation: the first round
/// published strictly after its `draw_at`.
pub const TARGET_ROUNDS: Map<u64, u64> = Map::new("target_rounds");

/// Owning order of every sold ticket, keyed by (raffle_id, ticket_index).
pub const TICKET_OWNERS: Map<(u64, u32), u64> = Map::new("ticket_owners");

pub const BEACONS: Map<u64, StoredBeacon> = Map::new("beacons");
pub const LATEST_ROUND: Item<u64> = Item::new("latest_round");

#[cw_serde]
pub struct Config {
    pub admin: Addr,
    /// Record orders and submit beacons
    pub operators: Vec<Addr>,
    /// Quicknet public key, 96 bytes (G2 point)
    pub quicknet_pubkey: Vec<u8>,
    /// Genesis time of the drand network (unix seconds)
    pub genesis_time: u64,
    /// Period between rounds in seconds (3 for quicknet)
    pub period_seconds: u64,
    pub max_raffles_per_sweep: u32,
}

impl Config {
    /// Unix time at which drand publishes `round`.
    pub fn round_published_at(&self, round: u64) -> u64 {
        round
            .saturating_sub(1)
            .saturating_mul(self.period_seconds)
            .saturating_add(self.genesis_time)
    }

    /// First round drand publishes strictly after unix time `at`.
    pub fn first_round_after(&self, at: u64) -> u64 {
        if at < self.genesis_time {
            return 1;
        }
        (at - self.genesis_time) / self.period_seconds + 2
    }
}

#[cw_serde]
pub struct StoredBeacon {
    pub round: u64,
    /// sha256(signature), 32 bytes
    pub randomness: Vec<u8>,
    /// BLS signature on G1, 48 bytes
    pub signature: Vec<u8>,
    pub submitted_at: Timestamp,
    pub submitted_by: Addr,
}
