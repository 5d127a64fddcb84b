// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Greedy vPod allocator.
//!
//! Super-pods that can hold at least one vPod are queued and ranked by
//! [`GainRank`]. The best candidate gives one vPod (full switch capacity
//! first, then partial), goes back in the queue if it can still hold another,
//! and every candidate is re-ranked against the number of vPods still to
//! place. The loop ends when all vPods are placed or the queue runs dry.
//!
//! Running out of candidates is not an error: callers compare
//! [`Allocation::allocated`] against the number of vPods they asked for.

use std::sync::Arc;

use tora_track::entity::Entity;
use tora_track::{debug, trace, value};

use crate::gain::next_allocation;
use crate::queue::{GainHeap, GainRank, QueueItem};
use crate::super_pod::SuperPodTors;

/// One vPod given by one super-pod.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocationRound {
    /// Position of the super-pod in the allocator's input.
    pub super_pod: usize,
    pub alloc_full: usize,
    pub alloc_part: usize,
}

/// The outcome of one call to [`Allocator::allocate`].
#[derive(Clone, Debug, Default)]
pub struct Allocation {
    /// Number of vPods placed.
    pub allocated: usize,

    /// Rounds in the order they were committed.
    pub rounds: Vec<AllocationRound>,
}

pub struct Allocator {
    entity: Arc<Entity>,
}

impl Allocator {
    #[must_use]
    pub fn new(parent: &Arc<Entity>) -> Self {
        Self {
            entity: parent.child("allocator"),
        }
    }

    /// Place up to `vpod_num` vPods of `vpod_size` servers across
    /// `super_pods`, updating their used/remaining counters in place.
    pub fn allocate(
        &self,
        super_pods: &mut [SuperPodTors],
        vpod_num: usize,
        vpod_size: usize,
    ) -> Allocation {
        let mut allocation = Allocation::default();
        if vpod_size == 0 {
            debug!(self.entity ; "vPod size is 0, nothing to allocate");
            return allocation;
        }

        let mut queue = GainHeap::new(GainRank);
        for (index, super_pod) in super_pods.iter_mut().enumerate() {
            if super_pod.remaining() >= vpod_size {
                queue.push(QueueItem::new(index, super_pod));
            }
        }
        queue.update_gains(vpod_size, vpod_num);
        trace!(self.entity ; "seeded {} candidate super-pods", queue.len());

        while allocation.allocated < vpod_num {
            let Some(item) = queue.pop() else {
                break;
            };

            let (alloc_full, alloc_part) = next_allocation(item.super_pod, vpod_size);
            if alloc_full + alloc_part < vpod_size {
                trace!(self.entity ; "super-pod {} cannot hold another vPod", item.super_pod.super_pod_id);
                continue;
            }

            let c = &mut *item.super_pod;
            c.used_full += alloc_full;
            c.used_partial += alloc_part;
            c.remain_full -= alloc_full;
            c.remain_part -= alloc_part;
            allocation.allocated += 1;
            allocation.rounds.push(AllocationRound {
                super_pod: item.index,
                alloc_full,
                alloc_part,
            });
            debug!(self.entity ; "allocate to {}, allocate resource full: {}, part: {}",
                c.super_pod_id, alloc_full, alloc_part);

            if c.remaining() >= vpod_size {
                queue.push(item);
            }
            queue.update_gains(vpod_size, vpod_num - allocation.allocated);
        }

        value!(self.entity ; allocation.allocated);
        allocation
    }
}

/// Whole vPods placed across `super_pods`.
#[must_use]
pub fn allocated_vpods(super_pods: &[SuperPodTors], vpod_size: usize) -> usize {
    if vpod_size == 0 {
        return 0;
    }
    super_pods.iter().map(|c| c.used() / vpod_size).sum()
}
