// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! ToR-affinity placement of distributed training jobs.
//!
//! A job asks for `vpod_num` vPods, each a group of `vpod_size` servers that
//! should share as few Top-of-Rack switches as possible. Placement runs in
//! four steps over an attempt-local [`TorInventory`](inventory::TorInventory):
//!
//!  1. [group](super_pod::group_by_super_pod) switches by super-pod and split
//!     them into full and partial pools,
//!  2. [escalate](escalation::set_partial_tors) into partial switches when
//!     full switches are not enough,
//!  3. [allocate](allocator::Allocator) vPods greedily, best gain first,
//!  4. [materialize](materialize::materialize) the counts into servers.
//!
//! [`TorAffinityPlanner`](planner::TorAffinityPlanner) runs all of them for
//! one job.
//!
//! # Example
//!
//! ```rust
//! use tora_placement::inventory::{Server, Tor, TorInventory};
//! use tora_placement::planner::{JobRequest, TorAffinityPlanner};
//! use tora_track::entity::toplevel;
//! use tora_track::tracker::dev_null_tracker;
//!
//! let tors = (0..2)
//!     .map(|t| {
//!         let servers = (0..4)
//!             .map(|s| Server::new(&format!("tor{t}-node{s}"), Some(0)))
//!             .collect();
//!         Tor::new(t, &format!("10.0.0.{t}"), servers)
//!     })
//!     .collect();
//! let mut inventory = TorInventory::new(4, 0, tors);
//!
//! let top = toplevel(&dev_null_tracker(), "top");
//! let job = JobRequest::new("job0", 8, 64);
//! let mut planner = TorAffinityPlanner::new(&top, job, &inventory).unwrap();
//! let placement = planner.plan(&mut inventory);
//! assert!(placement.is_satisfied());
//! assert_eq!(placement.server_list.server_count(), 8);
//! ```

pub mod allocator;
pub mod escalation;
pub mod gain;
pub mod inventory;
pub mod materialize;
pub mod planner;
pub mod queue;
pub mod super_pod;
pub mod types;
