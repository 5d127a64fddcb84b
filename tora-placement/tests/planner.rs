// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use tora_placement::escalation::EscalationOutcome;
use tora_placement::inventory::{TorIdx, TorInventory, TorSharing};
use tora_placement::materialize::{IS_HEALTHY_KEY, IS_SHARED_TOR_KEY, TorAnnotations};
use tora_placement::planner::{JobRequest, TorAffinityPlanner};
use tora_track::test_helpers::start_test;

/// Two super-pods of switches hosting 4 servers each.
///
/// Super-pod 0 has one free switch and one half-used switch, super-pod 1 has
/// two free switches.
fn two_super_pods() -> TorInventory {
    TorInventory::from_string(
        "
tor_count: 4
shared_tor_num: 1
tors:
  - id: 0
    ip: 10.0.0.0
    servers:
      - { name: node0, super_pod_id: 0 }
      - { name: node1, super_pod_id: 0 }
      - { name: node2, super_pod_id: 0 }
      - { name: node3, super_pod_id: 0 }
  - id: 1
    ip: 10.0.0.1
    servers:
      - { name: node4, super_pod_id: 0, current_job: other }
      - { name: node5, super_pod_id: 0, current_job: other }
      - { name: node6, super_pod_id: 0 }
      - { name: node7, super_pod_id: 0 }
  - id: 2
    ip: 10.0.0.2
    servers:
      - { name: node8, super_pod_id: 1 }
      - { name: node9, super_pod_id: 1 }
      - { name: node10, super_pod_id: 1 }
      - { name: node11, super_pod_id: 1 }
  - id: 3
    ip: 10.0.0.3
    servers:
      - { name: node12, super_pod_id: 1 }
      - { name: node13, super_pod_id: 1 }
      - { name: node14, super_pod_id: 1 }
      - { name: node15, super_pod_id: 1 }
",
    )
    .unwrap()
}

/// One super-pod with a free switch and three partially used ones.
fn partial_super_pod() -> TorInventory {
    TorInventory::from_string(
        "
tor_count: 4
shared_tor_num: 1
tors:
  - id: 0
    ip: 10.0.1.0
    servers:
      - { name: a0, super_pod_id: 0 }
      - { name: a1, super_pod_id: 0 }
      - { name: a2, super_pod_id: 0 }
      - { name: a3, super_pod_id: 0 }
  - id: 1
    ip: 10.0.1.1
    servers:
      - { name: b0, super_pod_id: 0, current_job: other }
      - { name: b1, super_pod_id: 0, current_job: other }
      - { name: b2, super_pod_id: 0 }
      - { name: b3, super_pod_id: 0 }
  - id: 2
    ip: 10.0.1.2
    servers:
      - { name: c0, super_pod_id: 0, current_job: other }
      - { name: c1, super_pod_id: 0, current_job: other }
      - { name: c2, super_pod_id: 0 }
      - { name: c3, super_pod_id: 0 }
  - id: 3
    ip: 10.0.1.3
    sharing: shared
    servers:
      - { name: d0, super_pod_id: 0, current_job: shared }
      - { name: d1, super_pod_id: 0 }
      - { name: d2, super_pod_id: 0 }
      - { name: d3, super_pod_id: 0 }
",
    )
    .unwrap()
}

#[test]
fn full_tors_in_one_super_pod() {
    let top = start_test(file!());
    let mut inventory = two_super_pods();
    inventory.validate().unwrap();

    let job = JobRequest::new("job0", 8, 64);
    let mut planner = TorAffinityPlanner::new(&top, job, &inventory).unwrap();
    let placement = planner.plan(&mut inventory).clone();

    assert_eq!(placement.vpod_size, 4);
    assert_eq!(placement.vpod_num, 2);
    assert_eq!(placement.allocated, 2);
    assert!(placement.is_satisfied());
    assert_eq!(placement.escalation, EscalationOutcome::NotNeeded);

    // Super-pod 1 has more future gain so both vPods land there
    assert_eq!(placement.super_pods.len(), 2);
    assert_eq!(placement.super_pods[0].used_full, 0);
    assert_eq!(placement.super_pods[1].used_full, 8);

    let tors: Vec<TorIdx> = placement.server_list.selections.iter().map(|s| s.tor).collect();
    assert_eq!(tors, vec![TorIdx(2), TorIdx(3)]);
    assert_eq!(placement.server_list.server_count(), 8);

    for idx in [TorIdx(2), TorIdx(3)] {
        let tor = inventory.tor(idx);
        assert_eq!(tor.free_server_count, 0);
        assert_eq!(tor.sharing, TorSharing::Exclusive);
        for server in &tor.servers {
            assert_eq!(server.current_job.as_deref(), Some("job0"));
            assert!(server.is_used_by_mul_job);
        }
    }
    assert_eq!(inventory.tor(TorIdx(0)).free_server_count, 4);

    let annotations = planner.annotations(&inventory, "node8").to_map();
    assert_eq!(annotations[IS_SHARED_TOR_KEY], "2");
    assert_eq!(annotations[IS_HEALTHY_KEY], "0");
    assert_eq!(annotations.len(), 2);
}

#[test]
fn escalates_into_tier_zero_only() {
    let top = start_test(file!());
    let mut inventory = partial_super_pod();

    let job = JobRequest::new("job1", 8, 64);
    let mut planner = TorAffinityPlanner::new(&top, job, &inventory).unwrap();
    let placement = planner.plan(&mut inventory);

    assert_eq!(placement.escalation, EscalationOutcome::Tier(0));
    assert!(placement.is_satisfied());
    assert_eq!(placement.super_pods[0].full, 4);
    assert_eq!(placement.super_pods[0].partial, 4);
    assert_eq!(placement.super_pods[0].used_full, 4);
    assert_eq!(placement.super_pods[0].used_partial, 4);

    let tors: Vec<TorIdx> = placement.server_list.selections.iter().map(|s| s.tor).collect();
    assert_eq!(tors, vec![TorIdx(0), TorIdx(1), TorIdx(2)]);

    // The shared switch in tier 1 is left alone
    let shared = inventory.tor(TorIdx(3));
    assert_eq!(shared.free_server_count, 3);
    assert_eq!(shared.sharing, TorSharing::Shared);
    assert!(shared.servers.iter().all(|s| s.current_job.as_deref() != Some("job1")));
}

#[test]
fn undersupply_is_a_result() {
    let top = start_test(file!());
    let mut inventory = partial_super_pod();

    let job = JobRequest::new("job2", 16, 64);
    let mut planner = TorAffinityPlanner::new(&top, job, &inventory).unwrap();
    let placement = planner.plan(&mut inventory);

    assert_eq!(placement.escalation, EscalationOutcome::Exhausted);
    assert_eq!(placement.vpod_num, 4);
    assert_eq!(placement.allocated, 2);
    assert!(!placement.is_satisfied());
    assert_eq!(placement.server_list.server_count(), 8);
}

#[test]
fn plan_is_cached() {
    let top = start_test(file!());
    let mut inventory = two_super_pods();
    let mut untouched = inventory.clone();

    let mut planner = TorAffinityPlanner::new(&top, JobRequest::new("job0", 8, 64), &inventory).unwrap();
    let first = planner.plan(&mut inventory).server_list.server_count();
    let second = planner.plan(&mut untouched).server_list.server_count();
    assert_eq!(first, second);
    assert!(planner.placement().is_some());

    for tor in &untouched.tors {
        assert!(tor.servers.iter().all(|s| s.current_job.is_none()));
    }
}

#[test]
fn annotations_default_before_plan() {
    let top = start_test(file!());
    let inventory = two_super_pods();
    let planner = TorAffinityPlanner::new(&top, JobRequest::new("job0", 8, 64), &inventory).unwrap();

    assert!(planner.placement().is_none());
    assert_eq!(planner.annotations(&inventory, "node8"), TorAnnotations::default());
    assert_eq!(planner.job().name, "job0");
}

#[test]
fn zero_npu_per_server_is_rejected() {
    let top = start_test(file!());
    let inventory = two_super_pods();
    let job = JobRequest {
        npu_per_server: 0,
        ..JobRequest::new("job3", 8, 64)
    };

    let err = TorAffinityPlanner::new(&top, job, &inventory).err().unwrap();
    assert_eq!(err.0, "Job job3 has npu_per_server set to 0");
}

#[test]
fn vpod_smaller_than_server_does_nothing() {
    let top = start_test(file!());
    let mut inventory = two_super_pods();

    let job = JobRequest::new("job4", 8, 8);
    let mut planner = TorAffinityPlanner::new(&top, job, &inventory).unwrap();
    let placement = planner.plan(&mut inventory);

    assert_eq!(placement.vpod_size, 0);
    assert_eq!(placement.escalation, EscalationOutcome::Disabled);
    assert_eq!(placement.allocated, 0);
    assert!(placement.server_list.is_empty());
}

#[test]
fn overstated_free_count_is_not_satisfied() {
    let top = start_test(file!());
    let mut inventory = TorInventory::from_string(
        "
tor_count: 4
tors:
  - id: 0
    ip: 10.0.2.0
    free_server_count: 4
    servers:
      - { name: e0, super_pod_id: 0, current_job: other }
      - { name: e1, super_pod_id: 0, current_job: other }
      - { name: e2, super_pod_id: 0 }
      - { name: e3, super_pod_id: 0 }
",
    )
    .unwrap();
    assert!(inventory.validate().is_err());

    let job = JobRequest::new("job5", 4, 64);
    let mut planner = TorAffinityPlanner::new(&top, job, &inventory).unwrap();
    let placement = planner.plan(&mut inventory);

    assert_eq!(placement.vpod_num, 1);
    assert_eq!(placement.allocated, 0);
    assert!(!placement.is_satisfied());
    assert_eq!(placement.server_list.server_count(), 2);
    assert_eq!(inventory.tor(TorIdx(0)).free_server_count, 0);
}

#[test]
fn plan_groups_the_inventory_it_is_given() {
    let top = start_test(file!());
    let inventory = two_super_pods();
    let mut smaller = TorInventory::from_string(
        "
tor_count: 4
tors:
  - id: 0
    ip: 10.0.3.0
    servers:
      - { name: f0, super_pod_id: 0 }
      - { name: f1, super_pod_id: 0 }
      - { name: f2, super_pod_id: 0 }
      - { name: f3, super_pod_id: 0 }
",
    )
    .unwrap();

    let mut planner = TorAffinityPlanner::new(&top, JobRequest::new("job6", 8, 64), &inventory).unwrap();
    let placement = planner.plan(&mut smaller);

    assert_eq!(placement.super_pods.len(), 1);
    assert_eq!(placement.escalation, EscalationOutcome::Exhausted);
    assert_eq!(placement.allocated, 1);
    assert!(!placement.is_satisfied());
    assert_eq!(placement.server_list.server_count(), 4);
    assert_eq!(smaller.tor(TorIdx(0)).free_server_count, 0);
}
