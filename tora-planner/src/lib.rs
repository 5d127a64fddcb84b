// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Load an inventory and a job, and place the job with the
//! [`TorAffinityPlanner`].

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tora_placement::inventory::TorInventory;
use tora_placement::planner::{JobRequest, Placement, TorAffinityPlanner};
use tora_track::Tracker;
use tora_track::builder::{TrackerConfig, TrackersConfig, setup_trackers};
use tora_track::entity::Entity;
use tora_track::tracker::TrackConfigError;

use crate::config::PlannerConfig;

pub mod config;
pub mod types;

/// Build the tracker selected by the configuration.
///
/// Messages go to the log file when one is given, otherwise to stdout.
pub fn setup_all_trackers(config: &PlannerConfig) -> Result<Tracker, TrackConfigError> {
    let log_file = config.log_file.as_deref();
    let config = TrackersConfig {
        stdout: TrackerConfig {
            enable: log_file.is_none(),
            level: config.log_level(),
            filter_regex: config.log_filter_regex(),
            file: None,
        },
        file: TrackerConfig {
            enable: log_file.is_some(),
            level: config.log_level(),
            filter_regex: config.log_filter_regex(),
            file: log_file,
        },
    };
    setup_trackers(&config)
}

/// Load both input files and place the job.
///
/// Returns the placement together with the inventory as updated by it.
pub fn plan(
    parent: &Arc<Entity>,
    inventory_path: &Path,
    job_path: &Path,
) -> Result<(Placement, TorInventory)> {
    let mut inventory = TorInventory::from_file(inventory_path)?;
    inventory.validate()?;
    let job = JobRequest::from_file(job_path)?;

    let mut planner = TorAffinityPlanner::new(parent, job, &inventory)?;
    let placement = planner.plan(&mut inventory).clone();
    Ok((placement, inventory))
}
