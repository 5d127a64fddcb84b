// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use proptest::prelude::*;
use tora_placement::allocator::{Allocator, allocated_vpods};
use tora_placement::gain::{current_gain, future_gain};
use tora_placement::super_pod::SuperPodTors;
use tora_track::entity::toplevel;
use tora_track::tracker::dev_null_tracker;

fn super_pod_strategy(tor_count: usize) -> impl Strategy<Value = (usize, usize)> {
    (0usize..5, 0..tor_count * 3 + 1).prop_map(move |(full_tors, partial)| (full_tors * tor_count, partial))
}

fn problem_strategy() -> impl Strategy<Value = (Vec<SuperPodTors>, usize, usize)> {
    (1usize..9).prop_flat_map(|tor_count| {
        (
            proptest::collection::vec(super_pod_strategy(tor_count), 0..6),
            0usize..10,
            1usize..17,
        )
            .prop_map(move |(capacities, vpod_num, vpod_size)| {
                let super_pods = capacities
                    .into_iter()
                    .enumerate()
                    .map(|(i, (full, partial))| {
                        SuperPodTors::with_capacity(i as u32, tor_count, full, partial)
                    })
                    .collect();
                (super_pods, vpod_num, vpod_size)
            })
    })
}

proptest! {
    #[test]
    fn allocation_stays_in_bounds((initial, vpod_num, vpod_size) in problem_strategy()) {
        let top = toplevel(&dev_null_tracker(), "top");
        let mut super_pods = initial.clone();
        let allocation = Allocator::new(&top).allocate(&mut super_pods, vpod_num, vpod_size);

        prop_assert!(allocation.allocated <= vpod_num);
        prop_assert_eq!(allocated_vpods(&super_pods, vpod_size), allocation.allocated);

        let used: usize = super_pods.iter().map(SuperPodTors::used).sum();
        let capacity: usize = super_pods.iter().map(|c| c.full + c.partial).sum();
        prop_assert!(used <= capacity);
        prop_assert_eq!(used % vpod_size, 0);
        prop_assert_eq!(used, allocation.allocated * vpod_size);

        for c in &super_pods {
            prop_assert!(c.used_full <= c.full);
            prop_assert!(c.used_partial <= c.partial);
            prop_assert_eq!(c.remain_full, c.full - c.used_full);
            prop_assert_eq!(c.remain_part, c.partial - c.used_partial);
        }
    }

    #[test]
    fn capacity_is_monotonic((initial, vpod_num, vpod_size) in problem_strategy()) {
        let top = toplevel(&dev_null_tracker(), "top");
        let mut super_pods = initial.clone();
        let allocation = Allocator::new(&top).allocate(&mut super_pods, vpod_num, vpod_size);

        // Replay the committed rounds one by one
        let mut replay = initial;
        for round in &allocation.rounds {
            let c = &mut replay[round.super_pod];
            let used_before = c.used();
            let remaining_before = c.remaining();

            prop_assert_eq!(round.alloc_full + round.alloc_part, vpod_size);
            prop_assert!(round.alloc_full <= c.remain_full);
            prop_assert!(round.alloc_part <= c.remain_part);
            // Full capacity is always used before partial
            prop_assert!(round.alloc_part == 0 || round.alloc_full == c.remain_full);

            c.used_full += round.alloc_full;
            c.used_partial += round.alloc_part;
            c.remain_full -= round.alloc_full;
            c.remain_part -= round.alloc_part;

            prop_assert!(c.used() > used_before);
            prop_assert!(c.remaining() < remaining_before);
        }

        for (replayed, actual) in replay.iter().zip(super_pods.iter()) {
            prop_assert_eq!(replayed.used_full, actual.used_full);
            prop_assert_eq!(replayed.used_partial, actual.used_partial);
        }
    }

    #[test]
    fn gains_are_idempotent(
        (super_pods, vpod_num, vpod_size) in problem_strategy(),
    ) {
        for c in &super_pods {
            let first = (current_gain(c, vpod_size), future_gain(c, vpod_size, vpod_num));
            let second = (current_gain(c, vpod_size), future_gain(c, vpod_size, vpod_num));
            prop_assert_eq!(first, second);
        }
    }
}
