#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult};
use cw2::{get_contract_version, set_contract_version};

use crate::error::ContractError;
use crate::execute;
use crate::msg::{
    ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg, RecordOrderParams, UpdateConfigParams,
};
use crate::query;
use crate::state::{Config, CONFIG, LATEST_ROUND, NEXT_ORDER_ID, NEXT_RAFFLE_ID};

const CONTRACT_NAME: &str = "crates.io:raffle-draw";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let pubkey_bytes =
        hex::decode(&msg.quicknet_pubkey_hex).map_err(|_| ContractError::InvalidHex {
            field: "quicknet_pubkey_hex".to_string(),
        })?;
    if pubkey_bytes.len() != 96 {
        return Err(ContractError::InvalidPubkeyLength {
            got: pubkey_bytes.len(),
        });
    }

    execute::validate_limits(msg.period_seconds, msg.max_raffles_per_sweep)?;

    let mut operators = Vec::new();
    for op in &msg.operators {
        operators.push(deps.api.addr_validate(op)?);
    }

    let config = Config {
        admin: info.sender.clone(),
        operators,
        quicknet_pubkey: pubkey_bytes,
        genesis_time: msg.genesis_time,
        period_seconds: msg.period_seconds,
        max_raffles_per_sweep: msg.max_raffles_per_sweep,
    };
    CONFIG.save(deps.storage, &config)?;
    NEXT_RAFFLE_ID.save(deps.storage, &0u64)?;
    NEXT_ORDER_ID.save(deps.storage, &0u64)?;
    LATEST_ROUND.save(deps.storage, &0u64)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "raffle-draw")
        .add_attribute("admin", info.sender.to_string()))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::CreateRaffle {
            total_tickets,
            numbering,
            draw_at,
        } => execute::create_raffle(deps, env, info, total_tickets, numbering, draw_at),
        ExecuteMsg::RecordOrder {
            raffle_id,
            ticket_count,
            ticket_ranges,
            lucky_indices,
            buyer,
        } => execute::record_order(
            deps,
            env,
            info,
            RecordOrderParams {
                raffle_id,
                ticket_count,
                ticket_ranges,
                lucky_indices,
                buyer,
            },
        ),
        ExecuteMsg::SubmitBeacon {
            round,
            signature_hex,
        } => execute::submit_beacon(deps, env, info, round, signature_hex),
        ExecuteMsg::DrawWinner { raffle_id } => execute::draw_winner(deps, env, info, raffle_id),
        ExecuteMsg::SweepDueRaffles {} => execute::sweep_due_raffles(deps, env, info),
        ExecuteMsg::UpdateConfig {
            max_raffles_per_sweep,
        } => execute::update_config(
            deps,
            env,
            info,
            UpdateConfigParams {
                max_raffles_per_sweep,
            },
        ),
        ExecuteMsg::UpdateOperators { add, remove } => {
            execute::update_operators(deps, env, info, add, remove)
        }
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::Raffle { raffle_id } => query::query_raffle(deps, raffle_id),
        QueryMsg::Raffles { start_after, limit } => query::query_raffles(deps, start_after, limit),
        QueryMsg::Orders {
            raffle_id,
            start_after,
            limit,
        } => query::query_orders(deps, raffle_id, start_after, limit),
        QueryMsg::Winner { raffle_id } => query::query_winner(deps, raffle_id),
        QueryMsg::DueRaffles { limit } => query::query_due_raffles(deps, env, limit),
        QueryMsg::LatestBeacon {} => query::query_latest_beacon(deps),
        QueryMsg::TargetRound { raffle_id } => query::query_target_round(deps, raffle_id),
        QueryMsg::TicketOwner {
            raffle_id,
            ticket_index,
        } => query::query_ticket_owner(deps, raffle_id, ticket_index),
        QueryMsg::QuarantinedRaffles { start_after, limit } => {
            query::query_quarantined(deps, start_after, limit)
        }
        QueryMsg::ResolveTicket {
            raffle_id,
            order_id,
            position,
        } => query::query_resolve_ticket(deps, raffle_id, order_id, position),
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::Unauthorized {
            reason: "Cannot migrate from different contract type".to_string(),
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", stored.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
