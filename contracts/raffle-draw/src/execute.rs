use cosmwasm_std::{
    to_json_binary, DepsMut, Env, Event, MessageInfo, Response, Storage, Timestamp,
};
use raffle_draw_common::{
    draw, format_ticket_number, sweep, DrawError, DrawRequest, DrawResult, DrawTrigger,
    NumberingConfig, Order, Raffle, RaffleStatus, SweepOutcome,
};

use crate::backend::StorageBackend;
use crate::beacon::{committed_beacon, raffle_rng, verify_quicknet_round};
use crate::error::ContractError;
use crate::msg::{RecordOrderParams, UpdateConfigParams};
use crate::state::{
    StoredBeacon, BEACONS, CONFIG, LATEST_ROUND, NEXT_ORDER_ID, NEXT_RAFFLE_ID, ORDERS,
    PENDING_DRAWS, RAFFLES, TARGET_ROUNDS, TICKET_OWNERS,
};

pub const MAX_SWEEP_CEILING: u32 = 100;

/// Bounds shared by instantiate and UpdateConfig.
pub fn validate_limits(
    period_seconds: u64,
    max_raffles_per_sweep: u32,
) -> Result<(), ContractError> {
    if period_seconds == 0 {
        return Err(ContractError::InvalidConfig {
            reason: "period_seconds must be positive".to_string(),
        });
    }
    if max_raffles_per_sweep == 0 || max_raffles_per_sweep > MAX_SWEEP_CEILING {
        return Err(ContractError::InvalidConfig {
            reason: format!("max_raffles_per_sweep must be within [1, {}]", MAX_SWEEP_CEILING),
        });
    }
    Ok(())
}

fn load_raffle(storage: &dyn Storage, raffle_id: u64) -> Result<Raffle, ContractError> {
    RAFFLES
        .may_load(storage, raffle_id)?
        .ok_or_else(|| DrawError::NotFound { raffle_id }.into())
}

/// Open a new raffle owned by the sender.
pub fn create_raffle(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    total_tickets: u32,
    numbering: Option<NumberingConfig>,
    draw_at: Timestamp,
) -> Result<Response, ContractError> {
    if total_tickets == 0 {
        return Err(ContractError::InvalidRaffle {
            reason: "total_tickets must be positive".to_string(),
        });
    }
    if draw_at <= env.block.time {
        return Err(ContractError::InvalidRaffle {
            reason: format!(
                "draw_at {} is not after current time {}",
                draw_at.seconds(),
                env.block.time.seconds()
            ),
        });
    }

    let numbering = numbering.unwrap_or_default();
    if numbering.step == 0 {
        return Err(ContractError::InvalidRaffle {
            reason: "numbering step must be positive".to_string(),
        });
    }
    // Every ticket must be printable
    format_ticket_number(total_tickets - 1, &numbering, total_tickets).map_err(|e| {
        ContractError::InvalidRaffle {
            reason: e.to_string(),
        }
    })?;

    let config = CONFIG.load(deps.storage)?;
    let target_round = config.first_round_after(draw_at.seconds());

    let raffle_id = NEXT_RAFFLE_ID.may_load(deps.storage)?.unwrap_or(0);
    NEXT_RAFFLE_ID.save(deps.storage, &(raffle_id + 1))?;

    let raffle = Raffle {
        id: raffle_id,
        owner: info.sender.clone(),
        total_tickets,
        sold_tickets: 0,
        numbering,
        status: RaffleStatus::Active,
        draw_at,
        created_at: env.block.time,
        winner_ticket_number: None,
        winner: None,
    };
    RAFFLES.save(deps.storage, raffle_id, &raffle)?;
    PENDING_DRAWS.save(deps.storage, (draw_at.seconds(), raffle_id), &())?;
    TARGET_ROUNDS.save(deps.storage, raffle_id, &target_round)?;

    Ok(Response::new()
        .add_attribute("action", "create_raffle")
        .add_attribute("raffle_id", raffle_id.to_string())
        .add_attribute("target_drand_round", target_round.to_string())
        .add_event(
            Event::new("raffle_created")
                .add_attribute("raffle_id", raffle_id.to_string())
                .add_attribute("owner", info.sender.to_string())
                .add_attribute("total_tickets", total_tickets.to_string())
                .add_attribute("draw_at", draw_at.seconds().to_string())
                .add_attribute("target_drand_round", target_round.to_string()),
        ))
}

/// Record a paid order. Only operators (the purchasing side) can call.
pub fn record_order(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    params: RecordOrderParams,
) -> Result<Response, ContractError> {
    let RecordOrderParams {
        raffle_id,
        ticket_count,
        ticket_ranges,
        lucky_indices,
        buyer,
    } = params;

    let config = CONFIG.load(deps.storage)?;
    if !config.operators.contains(&info.sender) {
        return Err(ContractError::Unauthorized {
            reason: "only operators can record orders".to_string(),
        });
    }

    let mut raffle = load_raffle(deps.storage, raffle_id)?;
    if !raffle.is_active() {
        return Err(DrawError::AlreadyDrawn { raffle_id }.into());
    }
    // Sales close at draw_at, before the committed round is published
    if env.block.time >= raffle.draw_at {
        return Err(ContractError::SalesClosed { raffle_id });
    }

    let available = raffle.total_tickets - raffle.sold_tickets;
    if ticket_count > available {
        return Err(ContractError::SoldOut {
            raffle_id,
            requested: ticket_count,
            available,
        });
    }

    let order_id = NEXT_ORDER_ID.may_load(deps.storage)?.unwrap_or(0);
    let order = Order {
        id: order_id,
        ticket_count,
        ticket_ranges,
        lucky_indices,
        buyer,
        created_at: env.block.time,
    };
    order.validate(raffle.total_tickets)?;

    for ticket_index in order.tickets() {
        if let Some(owner) = TICKET_OWNERS.may_load(deps.storage, (raffle_id, ticket_index))? {
            return Err(ContractError::TicketTaken {
                raffle_id,
                ticket_index,
                order_id: owner,
            });
        }
    }
    for ticket_index in order.tickets() {
        TICKET_OWNERS.save(deps.storage, (raffle_id, ticket_index), &order_id)?;
    }

    NEXT_ORDER_ID.save(deps.storage, &(order_id + 1))?;
    ORDERS.save(deps.storage, (raffle_id, order_id), &order)?;
    raffle.sold_tickets += ticket_count;
    RAFFLES.save(deps.storage, raffle_id, &raffle)?;

    Ok(Response::new()
        .add_attribute("action", "record_order")
        .add_attribute("raffle_id", raffle_id.to_string())
        .add_attribute("order_id", order_id.to_string())
        .add_event(
            Event::new("raffle_order_recorded")
                .add_attribute("raffle_id", raffle_id.to_string())
                .add_attribute("order_id", order_id.to_string())
                .add_attribute("ticket_count", ticket_count.to_string())
                .add_attribute("sold_tickets", raffle.sold_tickets.to_string()),
        ))
}

/// Submit a drand beacon. Only operators can call.
pub fn submit_beacon(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    round: u64,
    signature_hex: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if !config.operators.contains(&info.sender) {
        return Err(ContractError::Unauthorized {
            reason: "only operators can submit beacons".to_string(),
        });
    }

    if BEACONS.has(deps.storage, round) {
        return Err(ContractError::BeaconAlreadyExists { round });
    }

    let signature = hex::decode(&signature_hex).map_err(|_| ContractError::InvalidHex {
        field: "signature_hex".to_string(),
    })?;
    let randomness = verify_quicknet_round(&config.quicknet_pubkey, round, &signature)?;

    let beacon = StoredBeacon {
        round,
        randomness: randomness.to_vec(),
        signature,
        submitted_at: env.block.time,
        submitted_by: info.sender.clone(),
    };
    BEACONS.save(deps.storage, round, &beacon)?;

    let latest = LATEST_ROUND.may_load(deps.storage)?.unwrap_or(0);
    if round > latest {
        LATEST_ROUND.save(deps.storage, &round)?;
    }

    Ok(Response::new()
        .add_attribute("action", "submit_beacon")
        .add_attribute("round", round.to_string())
        .add_event(
            Event::new("raffle_beacon_submitted")
                .add_attribute("round", round.to_string())
                .add_attribute("randomness", hex::encode(randomness))
                .add_attribute("submitted_by", info.sender.to_string())
                .add_attribute("timestamp", env.block.time.seconds().to_string()),
        ))
}

/// Draw a single raffle on request of its owner or the admin.
pub fn draw_winner(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    raffle_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let raffle = load_raffle(deps.storage, raffle_id)?;

    if info.sender != raffle.owner && info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only the raffle owner or admin can draw".to_string(),
        });
    }
    if !raffle.is_active() {
        return Err(DrawError::AlreadyDrawn { raffle_id }.into());
    }

    let beacon = committed_beacon(deps.storage, raffle_id)?;
    let mut rng = raffle_rng(&beacon, raffle_id)?;

    let request = DrawRequest {
        trigger: DrawTrigger::Manual {
            executed_by: info.sender.clone(),
        },
        now: env.block.time,
    };
    let mut backend = StorageBackend::new(deps.storage);
    let receipt = match draw(&raffle, request, &mut backend, &mut rng)? {
        DrawResult::Drawn(receipt) => receipt,
        DrawResult::NoTicketsSold { raffle_id, .. } => {
            return Err(DrawError::NotEligible { raffle_id }.into())
        }
    };
    let winner = &receipt.winner;

    let mut result = Event::new("raffle_draw_result")
        .add_attribute("raffle_id", raffle_id.to_string())
        .add_attribute("order_id", winner.order_id.to_string())
        .add_attribute("ticket_index", winner.ticket_index.to_string())
        .add_attribute("ticket_number", winner.ticket_number.clone())
        .add_attribute("sold_count", winner.sold_count.to_string())
        .add_attribute("winning_offset", winner.winning_offset.to_string())
        .add_attribute("draw_method", winner.draw_method.as_str())
        .add_attribute("drand_round", beacon.round.to_string())
        .add_attribute("executed_by", info.sender.to_string());
    if !receipt.side_effect_failures.is_empty() {
        result = result.add_attribute(
            "side_effect_failures",
            receipt.side_effect_failures.join("; "),
        );
    }

    Ok(Response::new()
        .set_data(to_json_binary(winner)?)
        .add_attribute("action", "draw_winner")
        .add_attribute("raffle_id", raffle_id.to_string())
        .add_attribute("ticket_number", winner.ticket_number.clone())
        .add_events(backend.events)
        .add_event(result))
}

/// Draw every raffle whose draw time has passed. Anyone can call.
///
/// Per-raffle failures are reported as outcomes; the sweep itself only fails
/// on storage errors in the pending index. Each raffle draws from the beacon
/// of its committed round; raffles whose beacon is not yet submitted stay due.
pub fn sweep_due_raffles(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    let mut backend = StorageBackend::new(deps.storage);
    let report = sweep(
        env.block.time,
        config.max_raffles_per_sweep,
        &mut backend,
        StorageBackend::committed_rng,
    )?;

    let outcome_events: Vec<Event> = report.outcomes.iter().map(outcome_event).collect();

    Ok(Response::new()
        .set_data(to_json_binary(&report)?)
        .add_attribute("action", "sweep_due_raffles")
        .add_attribute("drawn", report.drawn.to_string())
        .add_attribute("no_tickets", report.no_tickets.to_string())
        .add_attribute("failed", report.failed.to_string())
        .add_events(backend.events)
        .add_events(outcome_events)
        .add_event(
            Event::new("raffle_sweep_summary")
                .add_attribute("drawn", report.drawn.to_string())
                .add_attribute("no_tickets", report.no_tickets.to_string())
                .add_attribute("failed", report.failed.to_string())
                .add_attribute("timestamp", env.block.time.seconds().to_string()),
        ))
}

fn outcome_event(outcome: &SweepOutcome) -> Event {
    let event = Event::new("raffle_sweep_outcome")
        .add_attribute("raffle_id", outcome.raffle_id().to_string());
    let (event, failures) = match outcome {
        SweepOutcome::Drawn {
            order_id,
            ticket_number,
            side_effect_failures,
            ..
        } => (
            event
                .add_attribute("outcome", "drawn")
                .add_attribute("order_id", order_id.to_string())
                .add_attribute("ticket_number", ticket_number.clone()),
            side_effect_failures.as_slice(),
        ),
        SweepOutcome::NoTickets {
            side_effect_failures,
            ..
        } => (
            event.add_attribute("outcome", "no_tickets"),
            side_effect_failures.as_slice(),
        ),
        SweepOutcome::Failed {
            category,
            reason,
            quarantined,
            ..
        } => (
            event
                .add_attribute("outcome", "failed")
                .add_attribute("category", category.as_str())
                .add_attribute("reason", reason.clone())
                .add_attribute("quarantined", quarantined.to_string()),
            &[][..],
        ),
    };
    if failures.is_empty() {
        event
    } else {
        event.add_attribute("side_effect_failures", failures.join("; "))
    }
}

/// Update configuration. Admin only.
pub fn update_config(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    params: UpdateConfigParams,
) -> Result<Response, ContractError> {
    let UpdateConfigParams {
        max_raffles_per_sweep,
    } = params;

    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can update config".to_string(),
        });
    }

    if let Some(limit) = max_raffles_per_sweep {
        config.max_raffles_per_sweep = limit;
    }
    validate_limits(config.period_seconds, config.max_raffles_per_sweep)?;

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attribute("action", "update_config"))
}

/// Update the operator list. Admin only.
pub fn update_operators(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    add: Vec<String>,
    remove: Vec<String>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can update operators".to_string(),
        });
    }

    for addr_str in &remove {
        let addr = deps.api.addr_validate(addr_str)?;
        config.operators.retain(|a| *a != addr);
    }
    for addr_str in &add {
        let addr = deps.api.addr_validate(addr_str)?;
        if !config.operators.contains(&addr) {
            config.operators.push(addr);
        }
    }

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_operators")
        .add_attribute("added", add.join(","))
        .add_attribute("removed", remove.join(",")))
}
