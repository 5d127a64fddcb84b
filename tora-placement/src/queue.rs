// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Priority queue of candidate super-pods.
//!
//! [`GainHeap`] is an array-backed binary max-heap whose ordering is supplied
//! by a [`Rank`]. It follows the classic sift-up/sift-down layout exactly so
//! that candidates which rank equal are always dequeued in the same order.
//! Rankings are allowed to change while items sit in the heap (gains are
//! recomputed after every allocation); call [`GainHeap::init`] afterwards to
//! restore the heap property.

use crate::gain::{current_gain, future_gain};
use crate::super_pod::SuperPodTors;

/// Ordering used by a [`GainHeap`].
pub trait Rank<T> {
    /// Returns `true` if `a` should be dequeued before `b`.
    fn outranks(&self, a: &T, b: &T) -> bool;
}

/// A candidate super-pod with its most recently computed gains.
#[derive(Debug)]
pub struct QueueItem<'a> {
    /// Position of the super-pod in the allocator's input.
    pub index: usize,
    pub super_pod: &'a mut SuperPodTors,
    pub current_gain: usize,
    pub future_gain: usize,
}

impl<'a> QueueItem<'a> {
    #[must_use]
    pub fn new(index: usize, super_pod: &'a mut SuperPodTors) -> Self {
        Self {
            index,
            super_pod,
            current_gain: 0,
            future_gain: 0,
        }
    }

    /// Recompute both gains against the number of vPods still to place.
    pub fn update_gains(&mut self, vpod_size: usize, remaining_vpods: usize) {
        self.current_gain = current_gain(self.super_pod, vpod_size);
        self.future_gain = future_gain(self.super_pod, vpod_size, remaining_vpods);
    }
}

/// The four-level gain ordering:
///
///  1. higher current gain,
///  2. then higher future gain,
///  3. then, when both have consumed the same full-switch capacity, the
///     smaller super-pod,
///  4. otherwise the one that has consumed more full-switch capacity.
#[derive(Clone, Copy, Debug, Default)]
pub struct GainRank;

impl Rank<QueueItem<'_>> for GainRank {
    fn outranks(&self, a: &QueueItem<'_>, b: &QueueItem<'_>) -> bool {
        if a.current_gain != b.current_gain {
            return a.current_gain > b.current_gain;
        }
        if a.future_gain != b.future_gain {
            return a.future_gain > b.future_gain;
        }

        let a_consumed = a.super_pod.consumed_full();
        let b_consumed = b.super_pod.consumed_full();
        if a_consumed == b_consumed {
            return a.super_pod.full < b.super_pod.full;
        }
        a_consumed > b_consumed
    }
}

/// Binary max-heap ordered by a [`Rank`].
pub struct GainHeap<T, R> {
    items: Vec<T>,
    rank: R,
}

impl<T, R> GainHeap<T, R>
where
    R: Rank<T>,
{
    #[must_use]
    pub fn new(rank: R) -> Self {
        Self {
            items: Vec::new(),
            rank,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The item that would be popped next.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.sift_up(self.items.len() - 1);
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let n = self.items.len() - 1;
        self.items.swap(0, n);
        self.sift_down(0, n);
        self.items.pop()
    }

    /// Re-establish the heap ordering after items have been modified.
    pub fn init(&mut self) {
        let n = self.items.len();
        for i in (0..n / 2).rev() {
            self.sift_down(i, n);
        }
    }

    /// Modify items in place. Must be followed by [`init`](Self::init).
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    fn outranks(&self, i: usize, j: usize) -> bool {
        self.rank.outranks(&self.items[i], &self.items[j])
    }

    fn sift_up(&mut self, mut j: usize) {
        while j > 0 {
            let parent = (j - 1) / 2;
            if !self.outranks(j, parent) {
                break;
            }
            self.items.swap(parent, j);
            j = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize, n: usize) {
        loop {
            let j1 = 2 * i + 1;
            if j1 >= n {
                break;
            }
            let mut j = j1;
            let j2 = j1 + 1;
            if j2 < n && self.outranks(j2, j1) {
                j = j2;
            }
            if !self.outranks(j, i) {
                break;
            }
            self.items.swap(i, j);
            i = j;
        }
    }
}

impl GainHeap<QueueItem<'_>, GainRank> {
    /// Recompute gains for every queued super-pod and re-heapify.
    pub fn update_gains(&mut self, vpod_size: usize, remaining_vpods: usize) {
        for item in self.iter_mut() {
            item.update_gains(vpod_size, remaining_vpods);
        }
        self.init();
    }
}
