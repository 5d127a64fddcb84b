// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Turn per super-pod usage counts into concrete servers.
//!
//! Switches are walked in exactly the order the allocator counted them: for
//! each super-pod its `full_tors` and then the admitted `use_partial_tors`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::inventory::{TorIdx, TorInventory, TorSharing};
use crate::super_pod::SuperPodTors;

/// Annotation key holding the switch sharing state.
pub const IS_SHARED_TOR_KEY: &str = "isSharedTor";
/// Annotation key holding the switch health.
pub const IS_HEALTHY_KEY: &str = "isHealthy";
/// Annotation key holding the IP of a shared switch.
pub const SHARED_TOR_IP_KEY: &str = "sharedTorIp";

/// Servers taken from one switch.
#[derive(Clone, Debug, Serialize)]
pub struct TorSelection {
    pub tor: TorIdx,
    pub ip: String,

    /// Sharing state of the switch before the job was placed.
    pub sharing: TorSharing,

    /// Free servers on the switch before the job was placed.
    pub free_server_count: usize,

    pub servers: Vec<String>,
}

/// The servers bound to a job, grouped by switch.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ServerList {
    pub selections: Vec<TorSelection>,
}

impl ServerList {
    /// Number of switches used.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    #[must_use]
    pub fn spans_multiple_tors(&self) -> bool {
        self.selections.len() > 1
    }

    #[must_use]
    pub fn server_count(&self) -> usize {
        self.selections.iter().map(|s| s.servers.len()).sum()
    }

    pub fn server_names(&self) -> impl Iterator<Item = &str> {
        self.selections
            .iter()
            .flat_map(|s| s.servers.iter().map(String::as_str))
    }

    #[must_use]
    pub fn contains_tor(&self, tor: TorIdx) -> bool {
        self.selections.iter().any(|s| s.tor == tor)
    }
}

/// Bind up to `demand` free servers from `tors`, in order, to `job`.
///
/// Returns the number of servers bound.
pub fn set_job_server_list(
    inventory: &mut TorInventory,
    job: &str,
    tors: &[TorIdx],
    demand: usize,
    list: &mut ServerList,
) -> usize {
    let mut remaining = demand;
    for idx in tors {
        if remaining == 0 {
            break;
        }

        let tor = inventory.tor_mut(*idx);
        let take = remaining.min(tor.free_server_count);
        if take == 0 {
            continue;
        }

        let sharing = tor.sharing;
        let free_server_count = tor.free_server_count;
        let mut servers = Vec::with_capacity(take);
        for server in tor.servers.iter_mut().filter(|s| s.is_free()).take(take) {
            server.current_job = Some(job.to_string());
            servers.push(server.name.clone());
        }
        if servers.is_empty() {
            continue;
        }

        let unbound = tor.servers.iter().filter(|s| s.is_free()).count();
        tor.free_server_count = (tor.free_server_count - servers.len()).min(unbound);
        remaining -= servers.len();
        list.selections.push(TorSelection {
            tor: *idx,
            ip: tor.ip.clone(),
            sharing,
            free_server_count,
            servers,
        });
    }
    demand - remaining
}

/// Bind the servers counted as used in each super-pod to `job`.
pub fn materialize(
    inventory: &mut TorInventory,
    job: &str,
    super_pods: &[SuperPodTors],
) -> ServerList {
    let mut list = ServerList::default();
    for c in super_pods {
        set_job_server_list(inventory, job, &c.full_tors, c.used_full, &mut list);
        set_job_server_list(
            inventory,
            job,
            &c.use_partial_tors,
            c.used_partial,
            &mut list,
        );
    }

    if list.spans_multiple_tors() {
        for selection in &list.selections {
            let tor = inventory.tor_mut(selection.tor);
            for server in &mut tor.servers {
                if selection.servers.contains(&server.name) {
                    server.is_used_by_mul_job = true;
                }
            }
        }
    }
    list
}

/// Update the sharing state of every switch used by a multi-switch job.
///
/// At most `shared_tor_num` switches that were free before the job become
/// shared; switches the job has to itself become exclusive.
pub fn set_server_list_attr(inventory: &mut TorInventory, list: &ServerList) {
    if !list.spans_multiple_tors() {
        return;
    }

    let mut enable_shared_tor = inventory.shared_tor_num;
    for selection in &list.selections {
        let sharing = match selection.sharing {
            TorSharing::Shared | TorSharing::Exclusive => {
                enable_shared_tor = enable_shared_tor.saturating_sub(1);
                TorSharing::Shared
            }
            TorSharing::Free if selection.free_server_count == selection.servers.len() => {
                TorSharing::Exclusive
            }
            TorSharing::Free if enable_shared_tor > 0 => {
                enable_shared_tor -= 1;
                TorSharing::Shared
            }
            TorSharing::Free => TorSharing::Exclusive,
        };
        inventory.tor_mut(selection.tor).sharing = sharing;
    }
}

/// Annotations describing the switch of a node used by a job.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct TorAnnotations {
    pub is_shared_tor: u8,
    pub is_healthy: u8,
    pub shared_tor_ip: Option<String>,
}

impl TorAnnotations {
    /// Annotations for `node_name` given the job's server list.
    ///
    /// Jobs that fit on a single switch keep the defaults.
    #[must_use]
    pub fn for_node(inventory: &TorInventory, list: &ServerList, node_name: &str) -> Self {
        let mut annotations = Self::default();
        let Some(idx) = inventory.tor_for_server(node_name) else {
            return annotations;
        };
        if !list.spans_multiple_tors() {
            return annotations;
        }

        let tor = inventory.tor(idx);
        annotations.is_shared_tor = tor.sharing.annotation_value();
        annotations.is_healthy = tor.health.annotation_value();
        if tor.sharing == TorSharing::Shared {
            annotations.shared_tor_ip = Some(tor.ip.clone());
        }
        annotations
    }

    /// The annotations as key/value strings.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert(
            IS_SHARED_TOR_KEY.to_string(),
            self.is_shared_tor.to_string(),
        );
        map.insert(IS_HEALTHY_KEY.to_string(), self.is_healthy.to_string());
        if let Some(ip) = &self.shared_tor_ip {
            map.insert(SHARED_TOR_IP_KEY.to_string(), ip.clone());
        }
        map
    }
}
