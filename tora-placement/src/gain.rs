// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Gain calculations used to rank super-pods.
//!
//! Gains count *fully consumed switches*: the number of whole switches' worth
//! of servers (`used / tor_count`) that the job occupies in a super-pod. An
//! allocation that completes a switch scores, one that leaves it part-used
//! does not.

use crate::super_pod::SuperPodTors;

/// Number of whole switches covered by `used` servers.
#[must_use]
pub fn combo_count(used: usize, tor_count: usize) -> usize {
    if tor_count == 0 {
        return 0;
    }
    used / tor_count
}

/// Full and partial servers the next vPod would take from `c`.
#[must_use]
pub fn next_allocation(c: &SuperPodTors, vpod_size: usize) -> (usize, usize) {
    let alloc_full = c.remain_full.min(vpod_size);
    let alloc_part = c.remain_part.min(vpod_size - alloc_full);
    (alloc_full, alloc_part)
}

/// Additional switches completed by allocating one vPod from `c` now.
#[must_use]
pub fn current_gain(c: &SuperPodTors, vpod_size: usize) -> usize {
    let (alloc_full, alloc_part) = next_allocation(c, vpod_size);
    let used = c.used();
    let prev_comb = combo_count(used, c.tor_count);
    let new_comb = combo_count(used + alloc_full + alloc_part, c.tor_count);
    new_comb - prev_comb
}

/// Switches completed by placing as many of the `remaining_vpods` as fit in
/// `c`, one after the other.
///
/// Works on local copies of the counters; `c` is left untouched.
#[must_use]
pub fn future_gain(c: &SuperPodTors, vpod_size: usize, remaining_vpods: usize) -> usize {
    if vpod_size == 0 {
        return 0;
    }
    let max_vpods = (c.remaining() / vpod_size).min(remaining_vpods);

    let mut total_gain = 0;
    let mut temp_full = c.remain_full;
    let mut temp_part = c.remain_part;
    let mut current_used = c.used();

    for _ in 0..max_vpods {
        let alloc_full = temp_full.min(vpod_size);
        let alloc_part = vpod_size - alloc_full;
        if alloc_part > temp_part {
            break;
        }

        let prev_comb = combo_count(current_used, c.tor_count);
        current_used += vpod_size;
        total_gain += combo_count(current_used, c.tor_count) - prev_comb;

        temp_full -= alloc_full;
        temp_part -= alloc_part;
    }
    total_gain
}
