use cosmwasm_std::{to_json_binary, Binary, Deps, Env, Order as IterOrder, StdError, StdResult};
use cw_storage_plus::Bound;
use raffle_draw_common::resolve_position;

use crate::backend::due_raffle_ids;
use crate::msg::{OrdersResponse, QuarantinedRaffle, QuarantinedResponse, RafflesResponse};
use crate::state::{
    BEACONS, CONFIG, LATEST_ROUND, ORDERS, QUARANTINED, RAFFLES, TARGET_ROUNDS, TICKET_OWNERS,
};

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

pub fn query_raffle(deps: Deps, raffle_id: u64) -> StdResult<Binary> {
    let raffle = RAFFLES.load(deps.storage, raffle_id)?;
    to_json_binary(&raffle)
}

pub fn query_raffles(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(20).min(100) as usize;
    let start = start_after.map(Bound::exclusive);

    let raffles = RAFFLES
        .range(deps.storage, start, None, IterOrder::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, raffle)| raffle))
        .collect::<StdResult<Vec<_>>>()?;

    to_json_binary(&RafflesResponse { raffles })
}

pub fn query_orders(
    deps: Deps,
    raffle_id: u64,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(50).min(200) as usize;
    let start = start_after.map(Bound::exclusive);

    let orders = ORDERS
        .prefix(raffle_id)
        .range(deps.storage, start, None, IterOrder::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, order)| order))
        .collect::<StdResult<Vec<_>>>()?;

    to_json_binary(&OrdersResponse { orders })
}

pub fn query_winner(deps: Deps, raffle_id: u64) -> StdResult<Binary> {
    let raffle = RAFFLES.load(deps.storage, raffle_id)?;
    to_json_binary(&raffle.winner)
}

pub fn query_due_raffles(deps: Deps, env: Env, limit: Option<u32>) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    let limit = limit.unwrap_or(config.max_raffles_per_sweep).min(100);
    let ids = due_raffle_ids(deps.storage, env.block.time, limit)?;
    to_json_binary(&ids)
}

pub fn query_latest_beacon(deps: Deps) -> StdResult<Binary> {
    let round = LATEST_ROUND.may_load(deps.storage)?.unwrap_or(0);
    let beacon = BEACONS.may_load(deps.storage, round)?;
    to_json_binary(&beacon)
}

pub fn query_target_round(deps: Deps, raffle_id: u64) -> StdResult<Binary> {
    let round = TARGET_ROUNDS.load(deps.storage, raffle_id)?;
    to_json_binary(&round)
}

pub fn query_ticket_owner(deps: Deps, raffle_id: u64, ticket_index: u32) -> StdResult<Binary> {
    let owner = TICKET_OWNERS.may_load(deps.storage, (raffle_id, ticket_index))?;
    to_json_binary(&owner)
}

pub fn query_quarantined(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(20).min(100) as usize;
    let start = start_after.map(Bound::exclusive);

    let raffles = QUARANTINED
        .range(deps.storage, start, None, IterOrder::Ascending)
        .take(limit)
        .map(|item| item.map(|(raffle_id, reason)| QuarantinedRaffle { raffle_id, reason }))
        .collect::<StdResult<Vec<_>>>()?;

    to_json_binary(&QuarantinedResponse { raffles })
}

pub fn query_resolve_ticket(
    deps: Deps,
    raffle_id: u64,
    order_id: u64,
    position: u32,
) -> StdResult<Binary> {
    let order = ORDERS.load(deps.storage, (raffle_id, order_id))?;
    let ticket_index =
        resolve_position(&order, position).map_err(|e| StdError::generic_err(e.to_string()))?;
    to_json_binary(&ticket_index)
}
