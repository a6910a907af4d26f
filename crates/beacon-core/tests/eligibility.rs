// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Eligibility: frontier, culling, failure isolation and supersession.
#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use beacon_core::{
    compute_eligible, AnchorGeometry, ClientId, CompletedJob, EligibilityComputer,
    EligibilityRequest, Position, RegionCoord, RegionStatus, Side,
};
use beacon_dry_tests::FakeWorld;

const OWNER: ClientId = ClientId::from_u128(0xC0FFEE);

const GEOMETRY: AnchorGeometry = AnchorGeometry {
    region_size: 16,
    height_offset: 1.5,
};

fn home() -> FakeWorld {
    let world = FakeWorld::new();
    world.grant("W", RegionCoord::new(0, 0), OWNER);
    world
}

fn request(position: Position, max_distance: f64) -> EligibilityRequest {
    EligibilityRequest {
        client: OWNER,
        world: "W".into(),
        position,
        max_distance,
    }
}

fn centre() -> Position {
    Position::new(8.0, 64.0, 8.0)
}

fn regions(result: &beacon_core::EligibilityResult) -> BTreeSet<(i32, i32)> {
    result
        .ids()
        .map(|id| (id.region().x, id.region().z))
        .collect()
}

/// Drains `computer` until nothing is outstanding.
fn collect(computer: &EligibilityComputer) -> Vec<CompletedJob> {
    let mut done = Vec::new();
    for _ in 0..5_000 {
        done.extend(computer.drain_completed());
        if computer.pending_jobs() == 0 {
            return done;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!("worker never went idle");
}

#[test]
fn single_owned_region_has_four_frontier_neighbours() {
    let world = home();
    let result = compute_eligible(&world, &GEOMETRY, &request(centre(), 10_000.0)).unwrap();

    assert_eq!(result.len(), 20);
    assert_eq!((result.unlocked_count, result.frontier_count), (1, 4));
    let expected: BTreeSet<(i32, i32)> = [(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)].into();
    assert_eq!(regions(&result), expected);
    assert!(!regions(&result).contains(&(1, 1)));

    for (id, placement) in &result.anchors {
        let status = if id.region() == RegionCoord::new(0, 0) {
            RegionStatus::Unlocked
        } else {
            RegionStatus::Locked
        };
        assert_eq!(placement.status, status, "{id}");
        assert_eq!(placement.location.world, "W");
    }
}

#[test]
fn far_away_client_sees_nothing() {
    let world = home();
    let far = Position::new(10_000.0, 64.0, -10_000.0);
    let result = compute_eligible(&world, &GEOMETRY, &request(far, 8.0)).unwrap();
    assert!(result.is_empty());
}

#[test]
fn cull_keeps_only_nearby_sides() {
    let world = home();
    // Standing on the north edge midpoint of (0,0): only anchors within 1 unit.
    let on_edge = Position::new(8.0, 64.0, 0.0);
    let result = compute_eligible(&world, &GEOMETRY, &request(on_edge, 1.0)).unwrap();
    let sides: Vec<(RegionCoord, Side)> = result.ids().map(|id| (id.region(), id.side())).collect();
    // The north edge of (0,0) is also the south edge of frontier region (0,-1).
    assert_eq!(
        sides,
        vec![
            (RegionCoord::new(0, -1), Side::South),
            (RegionCoord::new(0, 0), Side::North),
        ]
    );
}

#[test]
fn unlocked_neighbours_are_not_frontier() {
    let world = home();
    world.unlock_unowned("W", RegionCoord::new(1, 0));
    world.grant("W", RegionCoord::new(-1, 0), ClientId::from_u128(99));
    let result = compute_eligible(&world, &GEOMETRY, &request(centre(), 10_000.0)).unwrap();
    assert_eq!(result.frontier_count, 2);
    assert_eq!(result.len(), 12);
}

#[test]
fn other_worlds_do_not_leak() {
    let world = home();
    world.grant("Nether", RegionCoord::new(5, 5), OWNER);
    let result = compute_eligible(&world, &GEOMETRY, &request(centre(), 10_000.0)).unwrap();
    assert!(!regions(&result).contains(&(5, 5)));
}

#[test]
fn lookup_failures_and_panics_yield_empty_results() {
    let world = home();
    let mut computer =
        EligibilityComputer::spawn(Arc::new(world.clone()), GEOMETRY).unwrap();

    world.set_fail_lookups(true);
    computer.compute_eligible_async(request(centre(), 10_000.0));
    let failed = collect(&computer);
    assert_eq!(failed.len(), 1);
    assert!(failed[0].result.is_empty());

    world.set_fail_lookups(false).set_panic_lookups(true);
    computer.compute_eligible_async(request(centre(), 10_000.0));
    let panicked = collect(&computer);
    assert_eq!(panicked.len(), 1);
    assert!(panicked[0].result.is_empty());

    // The worker survives and keeps serving.
    world.set_panic_lookups(false);
    computer.compute_eligible_async(request(centre(), 10_000.0));
    let ok = collect(&computer);
    assert_eq!(ok[0].result.len(), 20);
    computer.shutdown();
}

#[test]
fn superseded_job_result_is_never_delivered() {
    let world = home();
    let computer = EligibilityComputer::spawn(Arc::new(world.clone()), GEOMETRY).unwrap();

    world.pause_lookups();
    let first = computer.compute_eligible_async(request(centre(), 10_000.0));
    assert!(world.wait_for_lookups(1, Duration::from_secs(5)));

    // Issued while #1 is mid-computation; a tiny radius makes its answer distinct.
    let second = computer.compute_eligible_async(request(centre(), 0.1));
    assert!(!computer.is_latest(first));
    assert!(computer.is_latest(second));
    world.resume_lookups();

    let delivered = collect(&computer);
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].job, second);
    assert!(delivered[0].result.is_empty());
}

#[test]
fn cancel_drops_in_flight_result() {
    let world = home();
    let computer = EligibilityComputer::spawn(Arc::new(world.clone()), GEOMETRY).unwrap();
    world.pause_lookups();
    computer.compute_eligible_async(request(centre(), 10_000.0));
    assert!(world.wait_for_lookups(1, Duration::from_secs(5)));
    computer.cancel_pending(OWNER);
    world.resume_lookups();

    let marker = computer.compute_eligible_async(request(centre(), 0.1));
    let delivered = collect(&computer);
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].job, marker);
}
