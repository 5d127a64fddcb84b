// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Placement of one job for one scheduling attempt.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tora_track::entity::Entity;
use tora_track::{debug, info, warn};

use crate::allocator::{Allocator, allocated_vpods};
use crate::escalation::{EscalationOutcome, set_partial_tors};
use crate::inventory::TorInventory;
use crate::materialize::{ServerList, TorAnnotations, materialize, set_server_list_attr};
use crate::placement_error;
use crate::super_pod::{build_super_pods, group_by_super_pod};
use crate::types::{PlacementError, PlacementResult};

/// Number of accelerators in one server unless configured otherwise.
pub const DEFAULT_NPU_PER_SERVER: usize = 16;

fn default_npu_per_server() -> usize {
    DEFAULT_NPU_PER_SERVER
}

/// The job to be placed.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct JobRequest {
    pub name: String,

    /// Number of servers (tasks) the job needs.
    pub task_num: usize,

    /// Accelerators in one vPod.
    pub sp_block_npu_num: usize,

    #[serde(default = "default_npu_per_server")]
    pub npu_per_server: usize,
}

impl JobRequest {
    #[must_use]
    pub fn new(name: &str, task_num: usize, sp_block_npu_num: usize) -> Self {
        Self {
            name: name.to_string(),
            task_num,
            sp_block_npu_num,
            npu_per_server: DEFAULT_NPU_PER_SERVER,
        }
    }

    pub fn from_file(job_path: &Path) -> PlacementResult<Self> {
        let s = std::fs::read_to_string(job_path)
            .map_err(|e| PlacementError(format!("Unable to read {}: {e}", job_path.display())))?;
        Self::from_string(&s)
    }

    pub fn from_string(job_str: &str) -> PlacementResult<Self> {
        serde_yaml::from_str(job_str)
            .map_err(|e| PlacementError(format!("serde_yaml::from_str failed: {e}")))
    }

    /// Servers in one vPod.
    #[must_use]
    pub fn vpod_size(&self) -> usize {
        if self.npu_per_server == 0 {
            return 0;
        }
        self.sp_block_npu_num / self.npu_per_server
    }

    /// Number of vPods the job needs.
    #[must_use]
    pub fn vpod_num(&self) -> usize {
        match self.vpod_size() {
            0 => 0,
            vpod_size => self.task_num / vpod_size,
        }
    }
}

/// Capacity and usage of one super-pod after placement.
#[derive(Clone, Debug, Serialize)]
pub struct SuperPodUsage {
    pub super_pod_id: u32,
    pub full: usize,
    pub partial: usize,
    pub used_full: usize,
    pub used_partial: usize,
}

/// The result of placing a job.
#[derive(Clone, Debug, Serialize)]
pub struct Placement {
    pub job: String,
    pub vpod_num: usize,
    pub vpod_size: usize,
    pub allocated: usize,
    pub escalation: EscalationOutcome,
    pub super_pods: Vec<SuperPodUsage>,
    pub server_list: ServerList,
}

impl Placement {
    /// Every requested vPod was placed.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.allocated >= self.vpod_num
    }
}

/// Places one job onto the switches of an inventory.
///
/// The planner is built once per scheduling attempt. The first call to
/// [`plan`](Self::plan) groups and binds servers of the inventory it is
/// given; later calls return the same placement.
pub struct TorAffinityPlanner {
    entity: Arc<Entity>,
    job: JobRequest,
    placement: Option<Placement>,
}

impl TorAffinityPlanner {
    pub fn new(
        parent: &Arc<Entity>,
        job: JobRequest,
        inventory: &TorInventory,
    ) -> PlacementResult<Self> {
        if job.npu_per_server == 0 {
            return placement_error!("Job {} has npu_per_server set to 0", job.name);
        }

        let entity = parent.child(&job.name);
        debug!(entity ; "{} tors available, vPod of {} servers", inventory.len(), job.vpod_size());

        Ok(Self {
            entity,
            job,
            placement: None,
        })
    }

    #[must_use]
    pub fn job(&self) -> &JobRequest {
        &self.job
    }

    /// The placement, if [`plan`](Self::plan) has been run.
    #[must_use]
    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    /// Place the job, binding its servers in `inventory`.
    pub fn plan(&mut self, inventory: &mut TorInventory) -> &Placement {
        let placement = match self.placement.take() {
            Some(placement) => placement,
            None => self.run(inventory),
        };
        self.placement.insert(placement)
    }

    fn run(&self, inventory: &mut TorInventory) -> Placement {
        let vpod_size = self.job.vpod_size();
        let vpod_num = self.job.vpod_num();

        let super_pod_tors = group_by_super_pod(inventory);
        debug!(self.entity ; "{} tors grouped into {} super-pods", inventory.len(), super_pod_tors.len());
        let mut super_pods = build_super_pods(inventory, &super_pod_tors);

        let escalation_entity = Entity::new(&self.entity, "escalation");
        let escalation = set_partial_tors(
            &escalation_entity,
            inventory,
            &mut super_pods,
            self.job.task_num,
            vpod_size,
        );

        Allocator::new(&self.entity).allocate(&mut super_pods, vpod_num, vpod_size);
        let mut allocated = allocated_vpods(&super_pods, vpod_size);

        let server_list = materialize(inventory, &self.job.name, &super_pods);
        set_server_list_attr(inventory, &server_list);

        // Only count vPods whose servers were actually bound
        let bound = server_list.server_count();
        if bound < allocated * vpod_size {
            warn!(self.entity ; "only {} of {} allocated servers could be bound", bound, allocated * vpod_size);
            allocated = bound / vpod_size;
        }

        if allocated < vpod_num {
            warn!(self.entity ; "only {} of {} vPods allocated", allocated, vpod_num);
        } else {
            info!(self.entity ; "{} vPods of {} servers on {} tors", allocated, vpod_size, server_list.len());
        }

        Placement {
            job: self.job.name.clone(),
            vpod_num,
            vpod_size,
            allocated,
            escalation,
            super_pods: super_pods
                .iter()
                .map(|c| SuperPodUsage {
                    super_pod_id: c.super_pod_id,
                    full: c.full,
                    partial: c.partial,
                    used_full: c.used_full,
                    used_partial: c.used_partial,
                })
                .collect(),
            server_list,
        }
    }

    /// Annotations for a node of this job. Defaults until the job is planned.
    #[must_use]
    pub fn annotations(&self, inventory: &TorInventory, node_name: &str) -> TorAnnotations {
        match &self.placement {
            Some(placement) => TorAnnotations::for_node(inventory, &placement.server_list, node_name),
            None => TorAnnotations::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vpod_derivation() {
        let job = JobRequest::new("job0", 32, 128);
        assert_eq!(job.vpod_size(), 8);
        assert_eq!(job.vpod_num(), 4);

        let job = JobRequest {
            npu_per_server: 8,
            ..JobRequest::new("job1", 30, 64)
        };
        assert_eq!(job.vpod_size(), 8);
        assert_eq!(job.vpod_num(), 3);

        let job = JobRequest::new("job2", 32, 8);
        assert_eq!(job.vpod_size(), 0);
        assert_eq!(job.vpod_num(), 0);
    }

    #[test]
    fn parse_job() {
        let job = JobRequest::from_string("name: job0\ntask_num: 16\nsp_block_npu_num: 64\n").unwrap();
        assert_eq!(job.name, "job0");
        assert_eq!(job.npu_per_server, DEFAULT_NPU_PER_SERVER);
        assert_eq!(job.vpod_size(), 4);

        let err = JobRequest::from_string("name: job0\n").unwrap_err();
        assert!(err.0.contains("missing field"));
    }
}
