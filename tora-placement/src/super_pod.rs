// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Per super-pod view of the switches available to a job.
//!
//! Switches are split into a pool of entirely free switches (`full_tors`) and
//! three tiers of partially free switches, in the order they should be given
//! to a job:
//!
//!  - tier 0: switches not shared with any other job,
//!  - tier 1: switches already shared between jobs,
//!  - tier 2: switches used exclusively by another multi-switch job.
//!
//! Only `full_tors` contribute capacity when the set is built. Partial tiers
//! are admitted later by [escalation](crate::escalation).

use std::collections::{BTreeMap, BTreeSet};

use crate::inventory::{TorIdx, TorInventory, TorSharing};

/// Number of partial switch tiers.
pub const NUM_PARTIAL_TIERS: usize = 3;

/// Capacity and usage of one super-pod for the job being placed. All values
/// are counts of servers.
#[derive(Clone, Debug, Default)]
pub struct SuperPodTors {
    pub name: String,
    pub super_pod_id: u32,

    /// Capacity from entirely free switches.
    pub full: usize,
    /// Capacity from admitted partial switches.
    pub partial: usize,

    pub remain_full: usize,
    pub remain_part: usize,
    pub used_full: usize,
    pub used_partial: usize,

    /// Servers a single switch can host.
    pub tor_count: usize,

    pub full_tors: Vec<TorIdx>,
    pub partial_tors: [Vec<TorIdx>; NUM_PARTIAL_TIERS],

    /// Partial switches admitted so far, in tier order.
    pub use_partial_tors: Vec<TorIdx>,
}

impl SuperPodTors {
    /// Build the set for `super_pod_id` from the given switches.
    ///
    /// Switches without any free server are dropped.
    #[must_use]
    pub fn new(
        tor_count: usize,
        super_pod_id: u32,
        tors: &[TorIdx],
        inventory: &TorInventory,
    ) -> Self {
        let mut full_tors = Vec::new();
        let mut partial = Vec::new();
        for idx in tors {
            let free = inventory.tor(*idx).free_server_count;
            if free == 0 {
                continue;
            }
            if free == tor_count {
                full_tors.push(*idx);
            } else {
                partial.push(*idx);
            }
        }

        let full = full_tors.len() * tor_count;
        Self {
            name: super_pod_id.to_string(),
            super_pod_id,
            full,
            remain_full: full,
            tor_count,
            full_tors,
            partial_tors: [
                partial_tier(&partial, inventory, TorSharing::Free),
                partial_tier(&partial, inventory, TorSharing::Shared),
                partial_tier(&partial, inventory, TorSharing::Exclusive),
            ],
            ..Default::default()
        }
    }

    /// Build a set from raw capacities without any switches behind it.
    #[must_use]
    pub fn with_capacity(super_pod_id: u32, tor_count: usize, full: usize, partial: usize) -> Self {
        Self {
            name: super_pod_id.to_string(),
            super_pod_id,
            full,
            partial,
            remain_full: full,
            remain_part: partial,
            tor_count,
            ..Default::default()
        }
    }

    /// Capacity not yet allocated.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remain_full + self.remain_part
    }

    /// Capacity already allocated to the job.
    #[must_use]
    pub fn used(&self) -> usize {
        self.used_full + self.used_partial
    }

    /// Full-switch capacity already consumed.
    #[must_use]
    pub fn consumed_full(&self) -> usize {
        self.full.saturating_sub(self.remain_full)
    }

    /// Number of whole vPods this set could hold in total.
    #[must_use]
    pub fn vpod_capacity(&self, vpod_size: usize) -> usize {
        if vpod_size == 0 {
            return 0;
        }
        (self.full + self.partial) / vpod_size
    }
}

/// Switches of one sharing class, most free servers first.
fn partial_tier(partial: &[TorIdx], inventory: &TorInventory, sharing: TorSharing) -> Vec<TorIdx> {
    let mut tier: Vec<TorIdx> = partial
        .iter()
        .copied()
        .filter(|idx| inventory.tor(*idx).sharing == sharing)
        .collect();
    tier.sort_by(|a, b| {
        inventory
            .tor(*b)
            .free_server_count
            .cmp(&inventory.tor(*a).free_server_count)
    });
    tier
}

/// Group switches by the super-pod their servers belong to.
///
/// A switch is only kept when all of its servers that know their super-pod
/// agree on it. Super-pods are returned in ascending id order.
#[must_use]
pub fn group_by_super_pod(inventory: &TorInventory) -> BTreeMap<u32, Vec<TorIdx>> {
    let mut grouped: BTreeMap<u32, Vec<TorIdx>> = BTreeMap::new();
    for idx in inventory.indices() {
        let ids: BTreeSet<u32> = inventory
            .tor(idx)
            .servers
            .iter()
            .filter_map(|server| server.super_pod_id)
            .collect();
        if ids.len() != 1 {
            continue;
        }
        if let Some(super_pod_id) = ids.first() {
            grouped.entry(*super_pod_id).or_default().push(idx);
        }
    }
    grouped
}

/// Build one [`SuperPodTors`] per super-pod, in ascending super-pod order.
#[must_use]
pub fn build_super_pods(
    inventory: &TorInventory,
    grouped: &BTreeMap<u32, Vec<TorIdx>>,
) -> Vec<SuperPodTors> {
    grouped
        .iter()
        .map(|(id, tors)| SuperPodTors::new(inventory.tor_count, *id, tors, inventory))
        .collect()
}
