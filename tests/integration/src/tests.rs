//! Integration tests for the raffle draw contract.
//!
//! These tests drive the contract through its `instantiate` / `execute` /
//! `query` entry points with `cosmwasm_std::testing` mocks, covering whole
//! raffle lifecycles rather than single handlers.
//!
//! Run:
//! ```bash
//! cargo test -p raffle-draw-integration-tests
//! ```

use std::collections::BTreeSet;

use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{from_json, Env, MemoryStorage, OwnedDeps, Response, Timestamp};
use raffle_draw::contract::{execute, instantiate, query};
use raffle_draw::msg::{
    ExecuteMsg, InstantiateMsg, OrdersResponse, QuarantinedResponse, QueryMsg, RafflesResponse,
};
use raffle_draw::state::ORDERS;
use raffle_draw::ContractError;
use raffle_draw_common::{
    BuyerSnapshot, NumberingConfig, Raffle, RaffleStatus, SweepOutcome, SweepReport, TicketRange,
    WinnerRecord,
};

type Deps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;

// ─── Constants ───

/// Real drand quicknet public key
const QUICKNET_PK_HEX: &str = "83cf0f2896adee7eb8b5f01fcad3912212c437e0073e911fb90022d3e760183c8c4b450b6a0a6c3ac6a5776a2d1064510d1fec758c921cc22b0e17e63aaf4bcb5ed66304de9cf809bd274ca73bab4af5a6e9c76a4bc09e76eae8991ef5ece45a";

/// Real quicknet test vector: round 1000
const TEST_ROUND: u64 = 1000;
const TEST_SIG_HEX: &str = "b44679b9a59af2ec876b1a6b1ad52ea9b1615fc3982b19576350f93447cb1125e342b73a8dd2bacbe47e4b6b63ed5e39";

const GENESIS: u64 = 1_692_803_367;
/// Round 1000 is published at GENESIS + 999 * 3
const ROUND_PUBLISHED: u64 = GENESIS + 2_997;
/// Draw times in [ROUND_PUBLISHED - 3, ROUND_PUBLISHED - 1] commit to round 1000
const DRAW_AT: u64 = ROUND_PUBLISHED - 2;

// ─── Helpers ───

fn env_at(seconds: u64) -> Env {
    let mut env = mock_env();
    env.block.time = Timestamp::from_seconds(seconds);
    env
}

fn setup() -> Deps {
    let mut deps = mock_dependencies();
    let admin = deps.api.addr_make("admin");
    let operator = deps.api.addr_make("operator");
    let msg = InstantiateMsg {
        operators: vec![operator.to_string()],
        quicknet_pubkey_hex: QUICKNET_PK_HEX.to_string(),
        genesis_time: GENESIS,
        period_seconds: 3,
        max_raffles_per_sweep: 25,
    };
    instantiate(
        deps.as_mut(),
        env_at(ROUND_PUBLISHED - 1_000),
        message_info(&admin, &[]),
        msg,
    )
    .unwrap();
    deps
}

fn create_raffle(
    deps: &mut Deps,
    owner: &str,
    total_tickets: u32,
    numbering: Option<NumberingConfig>,
    draw_at: u64,
) -> u64 {
    let owner = deps.api.addr_make(owner);
    let res = execute(
        deps.as_mut(),
        env_at(ROUND_PUBLISHED - 900),
        message_info(&owner, &[]),
        ExecuteMsg::CreateRaffle {
            total_tickets,
            numbering,
            draw_at: Timestamp::from_seconds(draw_at),
        },
    )
    .unwrap();
    res.attributes
        .iter()
        .find(|a| a.key == "raffle_id")
        .unwrap()
        .value
        .parse()
        .unwrap()
}

fn buy(deps: &mut Deps, raffle_id: u64, buyer: &str, ranges: &[(u32, u32)], lucky: &[u32]) {
    let operator = deps.api.addr_make("operator");
    let ticket_ranges: Vec<TicketRange> =
        ranges.iter().map(|&(s, e)| TicketRange::new(s, e)).collect();
    let ranged: u64 = ticket_ranges.iter().map(TicketRange::size).sum();
    execute(
        deps.as_mut(),
        env_at(ROUND_PUBLISHED - 500),
        message_info(&operator, &[]),
        ExecuteMsg::RecordOrder {
            raffle_id,
            ticket_count: ranged as u32 + lucky.len() as u32,
            ticket_ranges,
            lucky_indices: lucky.to_vec(),
            buyer: BuyerSnapshot {
                name: Some(buyer.to_string()),
                email: Some(format!("{}@example.com", buyer)),
                phone: None,
                city: None,
            },
        },
    )
    .unwrap();
}

fn submit_beacon(deps: &mut Deps) {
    let operator = deps.api.addr_make("operator");
    execute(
        deps.as_mut(),
        env_at(ROUND_PUBLISHED + 5),
        message_info(&operator, &[]),
        ExecuteMsg::SubmitBeacon {
            round: TEST_ROUND,
            signature_hex: TEST_SIG_HEX.to_string(),
        },
    )
    .unwrap();
}

fn sweep_at(deps: &mut Deps, seconds: u64) -> (Response, SweepReport) {
    let keeper = deps.api.addr_make("keeper");
    let res = execute(
        deps.as_mut(),
        env_at(seconds),
        message_info(&keeper, &[]),
        ExecuteMsg::SweepDueRaffles {},
    )
    .unwrap();
    let report: SweepReport = serde_json::from_slice(res.data.as_ref().unwrap()).unwrap();
    (res, report)
}

fn set_sweep_limit(deps: &mut Deps, limit: u32) {
    let admin = deps.api.addr_make("admin");
    execute(
        deps.as_mut(),
        env_at(ROUND_PUBLISHED - 800),
        message_info(&admin, &[]),
        ExecuteMsg::UpdateConfig {
            max_raffles_per_sweep: Some(limit),
        },
    )
    .unwrap();
}

/// Upstream corruption: the order keeps its ticket count but loses its ranges.
fn corrupt_first_order(deps: &mut Deps, raffle_id: u64) {
    let mut order = ORDERS.load(&deps.storage, (raffle_id, 0)).unwrap();
    order.ticket_ranges.clear();
    ORDERS.save(&mut deps.storage, (raffle_id, 0), &order).unwrap();
}

fn raffle(deps: &Deps, raffle_id: u64) -> Raffle {
    let res = query(deps.as_ref(), mock_env(), QueryMsg::Raffle { raffle_id }).unwrap();
    from_json(res).unwrap()
}

fn sold_tickets(deps: &Deps, raffle_id: u64) -> BTreeSet<u32> {
    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::Orders {
            raffle_id,
            start_after: None,
            limit: None,
        },
    )
    .unwrap();
    let orders: OrdersResponse = from_json(res).unwrap();
    let mut tickets = BTreeSet::new();
    for order in orders.orders {
        for r in &order.ticket_ranges {
            tickets.extend(r.start..=r.end);
        }
        tickets.extend(order.lucky_indices.iter().copied());
    }
    tickets
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_scheduled_draw_lifecycle() {
    let mut deps = setup();
    let numbering = NumberingConfig {
        start_number: 1,
        step: 1,
        prefix: Some("R-".to_string()),
        suffix: None,
        zero_pad: true,
    };
    let id = create_raffle(&mut deps, "owner", 500, Some(numbering), DRAW_AT);
    buy(&mut deps, id, "ana", &[(0, 9)], &[]);
    buy(&mut deps, id, "bruno", &[(10, 14)], &[77, 88]);
    buy(&mut deps, id, "carla", &[(40, 49)], &[]);
    submit_beacon(&mut deps);

    // not yet due
    let (_, report) = sweep_at(&mut deps, DRAW_AT - 1);
    assert!(report.outcomes.is_empty());

    let (res, report) = sweep_at(&mut deps, ROUND_PUBLISHED + 10);
    assert_eq!(report.drawn, 1);
    assert!(res.events.iter().any(|e| e.ty == "raffle_sweep_summary"));

    let drawn = raffle(&deps, id);
    assert_eq!(drawn.status, RaffleStatus::Completed);
    let winner = drawn.winner.unwrap();
    assert!(sold_tickets(&deps, id).contains(&winner.ticket_index));
    assert_eq!(
        winner.ticket_number,
        format!("R-{:03}", winner.ticket_index + 1)
    );
    assert_eq!(drawn.winner_ticket_number, Some(winner.ticket_number.clone()));
    assert_eq!(winner.sold_count, 27);
    assert!(winner.trigger.auto_executed());
    assert_eq!(winner.drawn_at, Timestamp::from_seconds(ROUND_PUBLISHED + 10));

    // the buyer snapshot comes from the winning order
    let expected_buyer = match winner.order_id {
        0 => "ana",
        1 => "bruno",
        _ => "carla",
    };
    assert_eq!(winner.buyer.name.as_deref(), Some(expected_buyer));

    match &report.outcomes[0] {
        SweepOutcome::Drawn {
            raffle_id,
            ticket_number,
            ..
        } => {
            assert_eq!(*raffle_id, id);
            assert_eq!(ticket_number, &winner.ticket_number);
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    // a completed raffle is never drawn again
    let (_, report) = sweep_at(&mut deps, ROUND_PUBLISHED + 20);
    assert!(report.outcomes.is_empty());
    let owner = deps.api.addr_make("owner");
    let err = execute(
        deps.as_mut(),
        env_at(ROUND_PUBLISHED + 20),
        message_info(&owner, &[]),
        ExecuteMsg::DrawWinner { raffle_id: id },
    )
    .unwrap_err();
    assert!(err.to_string().contains("already"));
}

#[test]
fn test_draw_is_reproducible_from_history() {
    // Identical history produces the identical winner whatever block draws it.
    let run = |height: u64, drawn_at: u64| -> WinnerRecord {
        let mut deps = setup();
        let id = create_raffle(&mut deps, "owner", 1_000, None, DRAW_AT);
        for i in 0..20u32 {
            buy(&mut deps, id, "buyer", &[(i * 10, i * 10 + 4)], &[i * 10 + 9]);
        }
        submit_beacon(&mut deps);
        let owner = deps.api.addr_make("owner");
        let mut env = env_at(drawn_at);
        env.block.height = height;
        let res = execute(
            deps.as_mut(),
            env,
            message_info(&owner, &[]),
            ExecuteMsg::DrawWinner { raffle_id: id },
        )
        .unwrap();
        from_json(res.data.unwrap()).unwrap()
    };

    let first = run(12_345, ROUND_PUBLISHED + 30);
    let second = run(12_345, ROUND_PUBLISHED + 30);
    assert_eq!(first, second);
    assert_eq!(first.sold_count, 120);

    let later = run(99_999, ROUND_PUBLISHED + 600);
    assert_eq!(later.order_id, first.order_id);
    assert_eq!(later.ticket_index, first.ticket_index);
    assert_eq!(later.winning_offset, first.winning_offset);
}

#[test]
fn test_zero_ticket_raffle_closes_on_schedule() {
    let mut deps = setup();
    let id = create_raffle(&mut deps, "owner", 50, None, DRAW_AT);
    submit_beacon(&mut deps);

    // manual draws refuse an empty raffle
    let owner = deps.api.addr_make("owner");
    let err = execute(
        deps.as_mut(),
        env_at(ROUND_PUBLISHED + 1),
        message_info(&owner, &[]),
        ExecuteMsg::DrawWinner { raffle_id: id },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::Draw(_)));
    assert!(raffle(&deps, id).is_active());

    let (res, report) = sweep_at(&mut deps, ROUND_PUBLISHED + 1);
    assert_eq!(report.no_tickets, 1);
    let audit = res
        .events
        .iter()
        .find(|e| e.ty == "raffle_draw_audit")
        .unwrap();
    assert!(audit
        .attributes
        .iter()
        .any(|a| a.key == "outcome" && a.value == "no_tickets"));

    let closed = raffle(&deps, id);
    assert_eq!(closed.status, RaffleStatus::Completed);
    assert!(closed.winner.is_none());
    assert!(closed.winner_ticket_number.is_none());
}

#[test]
fn test_sweep_isolates_failures_across_batches() {
    let mut deps = setup();
    set_sweep_limit(&mut deps, 2);

    let broken = create_raffle(&mut deps, "owner", 100, None, ROUND_PUBLISHED - 3);
    let second = create_raffle(&mut deps, "owner", 100, None, ROUND_PUBLISHED - 2);
    let third = create_raffle(&mut deps, "owner", 100, None, ROUND_PUBLISHED - 1);
    buy(&mut deps, broken, "ana", &[(0, 4)], &[]);
    buy(&mut deps, second, "bruno", &[(0, 4)], &[]);
    buy(&mut deps, third, "carla", &[(20, 29)], &[]);
    submit_beacon(&mut deps);
    corrupt_first_order(&mut deps, broken);

    let (res, report) = sweep_at(&mut deps, ROUND_PUBLISHED + 10);
    assert_eq!((report.drawn, report.failed), (1, 1));
    assert_eq!(report.outcomes.len(), 2);
    assert!(matches!(
        &report.outcomes[0],
        SweepOutcome::Failed { raffle_id, quarantined: true, .. } if *raffle_id == broken
    ));
    assert_eq!(report.outcomes[1].raffle_id(), second);
    assert!(res.events.iter().any(|e| e.ty == "raffle_quarantined"));

    // the broken raffle left the queue, so the next batch starts at the third
    let (_, report) = sweep_at(&mut deps, ROUND_PUBLISHED + 20);
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].raffle_id(), third);
    assert_eq!(report.drawn, 1);

    assert!(raffle(&deps, broken).is_active());
    assert_eq!(raffle(&deps, second).status, RaffleStatus::Completed);
    let third_winner = raffle(&deps, third).winner.unwrap();
    assert!((20..=29).contains(&third_winner.ticket_index));
}

#[test]
fn test_corrupt_raffles_do_not_starve_the_queue() {
    let mut deps = setup();
    set_sweep_limit(&mut deps, 2);

    let corrupt_a = create_raffle(&mut deps, "owner", 100, None, ROUND_PUBLISHED - 3);
    let corrupt_b = create_raffle(&mut deps, "owner", 100, None, ROUND_PUBLISHED - 3);
    let healthy = create_raffle(&mut deps, "owner", 100, None, ROUND_PUBLISHED - 1);
    buy(&mut deps, corrupt_a, "ana", &[(0, 4)], &[]);
    buy(&mut deps, corrupt_b, "bruno", &[(0, 4)], &[]);
    buy(&mut deps, healthy, "carla", &[(0, 4)], &[]);
    submit_beacon(&mut deps);
    corrupt_first_order(&mut deps, corrupt_a);
    corrupt_first_order(&mut deps, corrupt_b);

    let (_, report) = sweep_at(&mut deps, ROUND_PUBLISHED + 10);
    assert_eq!((report.drawn, report.failed), (0, 2));

    let (_, report) = sweep_at(&mut deps, ROUND_PUBLISHED + 20);
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].raffle_id(), healthy);
    assert_eq!(raffle(&deps, healthy).status, RaffleStatus::Completed);

    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::QuarantinedRaffles {
            start_after: None,
            limit: None,
        },
    )
    .unwrap();
    let quarantined: QuarantinedResponse = from_json(res).unwrap();
    let ids: Vec<u64> = quarantined.raffles.iter().map(|q| q.raffle_id).collect();
    assert_eq!(ids, vec![corrupt_a, corrupt_b]);
}

#[test]
fn test_beacon_before_commitment_is_refused() {
    let mut deps = setup();
    // round 1000 is published at draw_at, so the raffle commits to round 1001
    let id = create_raffle(&mut deps, "owner", 100, None, ROUND_PUBLISHED);
    buy(&mut deps, id, "ana", &[(0, 9)], &[]);
    submit_beacon(&mut deps);

    let owner = deps.api.addr_make("owner");
    let err = execute(
        deps.as_mut(),
        env_at(ROUND_PUBLISHED + 10),
        message_info(&owner, &[]),
        ExecuteMsg::DrawWinner { raffle_id: id },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ContractError::BeaconNotFound { round } if round == TEST_ROUND + 1
    ));

    let (_, report) = sweep_at(&mut deps, ROUND_PUBLISHED + 10);
    assert_eq!(report.failed, 1);
    assert!(matches!(
        &report.outcomes[0],
        SweepOutcome::Failed { quarantined: false, .. }
    ));
    assert!(raffle(&deps, id).is_active());

    let res = query(
        deps.as_ref(),
        env_at(ROUND_PUBLISHED + 10),
        QueryMsg::DueRaffles { limit: None },
    )
    .unwrap();
    let due: Vec<u64> = from_json(res).unwrap();
    assert_eq!(due, vec![id]);
}

#[test]
fn test_raffle_pagination() {
    let mut deps = setup();
    for _ in 0..5 {
        create_raffle(&mut deps, "owner", 10, None, ROUND_PUBLISHED);
    }

    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::Raffles {
            start_after: Some(1),
            limit: Some(2),
        },
    )
    .unwrap();
    let page: RafflesResponse = from_json(res).unwrap();
    let ids: Vec<u64> = page.raffles.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn test_beacon_hex_roundtrip() {
    let mut deps = setup();
    submit_beacon(&mut deps);
    let res = query(deps.as_ref(), mock_env(), QueryMsg::LatestBeacon {}).unwrap();
    let beacon: Option<raffle_draw::state::StoredBeacon> = from_json(res).unwrap();
    let beacon = beacon.unwrap();
    assert_eq!(hex::encode(&beacon.signature), TEST_SIG_HEX);
    assert_eq!(beacon.submitted_by, deps.api.addr_make("operator"));
}
