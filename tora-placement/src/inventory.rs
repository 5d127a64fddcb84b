// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The ToR inventory: switches and the servers below them.
//!
//! All switches for one scheduling attempt live in a single [`TorInventory`]
//! and are referred to elsewhere by [`TorIdx`]. The inventory is `Clone` so
//! that each attempt can work on its own snapshot and only the winning
//! attempt needs to be committed.
//!
//! The inventory can be loaded from YAML:
//!
//! ```yaml
//! tor_count: 4
//! shared_tor_num: 1
//! tors:
//!   - id: 0
//!     ip: 10.0.0.1
//!     servers:
//!       - name: node0
//!         super_pod_id: 0
//!       - name: node1
//!         super_pod_id: 0
//!         current_job: other
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::placement_error;
use crate::types::{PlacementError, PlacementResult};

/// Index of a [`Tor`] within a [`TorInventory`].
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize)]
pub struct TorIdx(pub usize);

impl fmt::Display for TorIdx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a switch is shared between jobs.
///
/// The discriminants are the values used in node annotations.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TorSharing {
    /// Not shared with any other job.
    #[default]
    Free = 0,
    /// Shared between several jobs.
    Shared = 1,
    /// Used by a single job that spans several switches.
    Exclusive = 2,
}

impl TorSharing {
    /// Value written to the `isSharedTor` annotation.
    #[must_use]
    pub fn annotation_value(self) -> u8 {
        self as u8
    }
}

/// Health of a switch.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TorHealth {
    #[default]
    Healthy = 0,
    Unhealthy = 1,
}

impl TorHealth {
    /// Value written to the `isHealthy` annotation.
    #[must_use]
    pub fn annotation_value(self) -> u8 {
        self as u8
    }
}

/// A server (node) below a switch.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Server {
    pub name: String,

    /// Super-pod this node physically belongs to, if known.
    #[serde(default)]
    pub super_pod_id: Option<u32>,

    /// Job the server is currently bound to.
    #[serde(default)]
    pub current_job: Option<String>,

    #[serde(default)]
    pub slice_id: Option<u32>,

    /// Set when the job using this server spans more than one switch.
    #[serde(default)]
    pub is_used_by_mul_job: bool,
}

impl Server {
    #[must_use]
    pub fn new(name: &str, super_pod_id: Option<u32>) -> Self {
        Self {
            name: name.to_string(),
            super_pod_id,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_free(&self) -> bool {
        self.current_job.is_none()
    }
}

/// The file representation of a switch. The free server count is optional and
/// derived from unbound servers when omitted.
#[derive(Deserialize)]
struct TorSection {
    id: u32,
    ip: String,
    free_server_count: Option<usize>,
    #[serde(default)]
    sharing: TorSharing,
    #[serde(default)]
    health: TorHealth,
    #[serde(default)]
    servers: Vec<Server>,
}

impl From<TorSection> for Tor {
    fn from(section: TorSection) -> Self {
        let free_server_count = section
            .free_server_count
            .unwrap_or_else(|| section.servers.iter().filter(|s| s.is_free()).count());
        Self {
            id: section.id,
            ip: section.ip,
            free_server_count,
            sharing: section.sharing,
            health: section.health,
            servers: section.servers,
        }
    }
}

/// A Top-of-Rack switch.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(from = "TorSection")]
pub struct Tor {
    pub id: u32,
    pub ip: String,
    pub free_server_count: usize,
    pub sharing: TorSharing,
    pub health: TorHealth,
    pub servers: Vec<Server>,
}

impl Tor {
    /// Create a healthy, unshared switch whose free count is derived from
    /// the servers.
    #[must_use]
    pub fn new(id: u32, ip: &str, servers: Vec<Server>) -> Self {
        let free_server_count = servers.iter().filter(|s| s.is_free()).count();
        Self {
            id,
            ip: ip.to_string(),
            free_server_count,
            sharing: TorSharing::Free,
            health: TorHealth::Healthy,
            servers,
        }
    }

    #[must_use]
    pub fn with_sharing(mut self, sharing: TorSharing) -> Self {
        self.sharing = sharing;
        self
    }

    #[must_use]
    pub fn with_health(mut self, health: TorHealth) -> Self {
        self.health = health;
        self
    }
}

/// All switches available for one scheduling attempt.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TorInventory {
    /// Number of servers a single switch can host.
    pub tor_count: usize,

    /// Number of switches that may still be shared between jobs.
    #[serde(default)]
    pub shared_tor_num: usize,

    pub tors: Vec<Tor>,
}

impl TorInventory {
    #[must_use]
    pub fn new(tor_count: usize, shared_tor_num: usize, tors: Vec<Tor>) -> Self {
        Self {
            tor_count,
            shared_tor_num,
            tors,
        }
    }

    pub fn from_file(inventory_path: &Path) -> PlacementResult<Self> {
        let s = std::fs::read_to_string(inventory_path).map_err(|e| {
            PlacementError(format!("Unable to read {}: {e}", inventory_path.display()))
        })?;
        Self::from_string(&s)
    }

    pub fn from_string(inventory_str: &str) -> PlacementResult<Self> {
        serde_yaml::from_str(inventory_str)
            .map_err(|e| PlacementError(format!("serde_yaml::from_str failed: {e}")))
    }

    /// Check the inventory is self-consistent.
    pub fn validate(&self) -> PlacementResult<()> {
        let mut errors = Vec::new();

        let mut ips = HashSet::new();
        let mut server_names = HashSet::new();
        for tor in &self.tors {
            if !ips.insert(tor.ip.as_str()) {
                errors.push(format!("Duplicate ToR IP {}", tor.ip));
            }

            if tor.free_server_count > self.tor_count {
                errors.push(format!(
                    "ToR {} has {} free servers but a ToR only hosts {}",
                    tor.ip, tor.free_server_count, self.tor_count
                ));
            }

            let unbound = tor.servers.iter().filter(|s| s.is_free()).count();
            if tor.free_server_count > tor.servers.len() {
                errors.push(format!(
                    "ToR {} has {} free servers but only lists {}",
                    tor.ip,
                    tor.free_server_count,
                    tor.servers.len()
                ));
            } else if tor.free_server_count > unbound {
                errors.push(format!(
                    "ToR {} has {} free servers but only {} are unbound",
                    tor.ip, tor.free_server_count, unbound
                ));
            }

            for server in &tor.servers {
                if !server_names.insert(server.name.as_str()) {
                    errors.push(format!("Duplicate server name {}", server.name));
                }
            }
        }

        if !errors.is_empty() {
            return placement_error!("Failed to validate inventory:\n{}", errors.join("\n"));
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tors.is_empty()
    }

    #[must_use]
    pub fn tor(&self, idx: TorIdx) -> &Tor {
        &self.tors[idx.0]
    }

    pub fn tor_mut(&mut self, idx: TorIdx) -> &mut Tor {
        &mut self.tors[idx.0]
    }

    /// All switch indices in inventory order.
    pub fn indices(&self) -> impl Iterator<Item = TorIdx> {
        (0..self.tors.len()).map(TorIdx)
    }

    /// Find the switch hosting the named server.
    #[must_use]
    pub fn tor_for_server(&self, server_name: &str) -> Option<TorIdx> {
        self.tors
            .iter()
            .position(|tor| tor.servers.iter().any(|s| s.name == server_name))
            .map(TorIdx)
    }

    /// Total number of free servers across `tors`.
    #[must_use]
    pub fn free_server_total(&self, tors: &[TorIdx]) -> usize {
        tors.iter()
            .map(|idx| self.tor(*idx).free_server_count)
            .sum()
    }
}
