// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Admit partial switches when full switches cannot hold the job.
//!
//! Feasibility is judged on whole vPods per super-pod,
//! `Σ ⌊(full + partial) / vpod_size⌋ ≥ ⌊task_num / vpod_size⌋`, which is an
//! approximation of what the allocator will actually manage to place.

use serde::Serialize;
use tora_track::entity::Entity;
use tora_track::{debug, warn};

use crate::inventory::TorInventory;
use crate::super_pod::{NUM_PARTIAL_TIERS, SuperPodTors};

/// Which stage of escalation left the job with enough capacity.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationOutcome {
    /// The vPod size is zero so nothing was considered.
    Disabled,
    /// Full switches alone were enough.
    NotNeeded,
    /// Satisfied once partial tiers `0..=n` were admitted.
    Tier(usize),
    /// All partial tiers were admitted and capacity is still short.
    Exhausted,
}

fn vpod_capacity(super_pods: &[SuperPodTors], vpod_size: usize) -> usize {
    super_pods.iter().map(|c| c.vpod_capacity(vpod_size)).sum()
}

/// Admit partial tiers in order until the super-pods can hold `task_num`
/// servers worth of vPods.
pub fn set_partial_tors(
    entity: &Entity,
    inventory: &TorInventory,
    super_pods: &mut [SuperPodTors],
    task_num: usize,
    vpod_size: usize,
) -> EscalationOutcome {
    if vpod_size == 0 {
        return EscalationOutcome::Disabled;
    }

    let needed = task_num / vpod_size;
    let vpod_num: usize = super_pods.iter().map(|c| c.full / vpod_size).sum();
    if vpod_num >= needed {
        debug!(entity ; "full tor vpod num {vpod_num} is enough for {needed}");
        return EscalationOutcome::NotNeeded;
    }
    warn!(entity ; "full tor vpod num {vpod_num} is not enough for {needed}, will use partial tor");

    for tier in 0..NUM_PARTIAL_TIERS {
        for c in super_pods.iter_mut() {
            c.partial += inventory.free_server_total(&c.partial_tors[tier]);
            c.remain_part = c.partial;
            c.use_partial_tors.extend_from_slice(&c.partial_tors[tier]);
        }

        let vpod_num = vpod_capacity(super_pods, vpod_size);
        if vpod_num >= needed {
            debug!(entity ; "stage {tier} tor vpod num {vpod_num} is enough for {needed}");
            return EscalationOutcome::Tier(tier);
        }
        warn!(entity ; "stage {tier} tor vpod num {vpod_num} is not enough for {needed}, will use next stage tor");
    }
    EscalationOutcome::Exhausted
}
