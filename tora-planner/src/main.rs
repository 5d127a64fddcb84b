// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! A simple front-end for placing a job on a ToR inventory
//!
//! For example, run using:
//!   cargo run --bin tora-planner -- --inventory inventory.yaml --job
//! job.yaml --log-level info --format summary

use std::path::Path;

use anyhow::{Result, bail};
use tora_planner::config::PlannerConfig;
use tora_planner::types::Report;
use tora_planner::{plan, setup_all_trackers};
use tora_track::Track;
use tora_track::entity::toplevel;

fn main() -> Result<()> {
    let config = PlannerConfig::parse_all_sources()?;
    let tracker = setup_all_trackers(&config)?;

    let inventory_path = config.inventory.as_deref().unwrap_or("inventory.yaml");
    let job_path = config.job.as_deref().unwrap_or("job.yaml");

    let result = {
        let top = toplevel(&tracker, "tora");
        plan(&top, Path::new(inventory_path), Path::new(job_path))
    };
    tracker.shutdown();
    let (placement, inventory) = result?;

    let report = Report::new(&placement, &inventory);
    print!("{}", report.render(config.format())?);

    if !placement.is_satisfied() {
        bail!(
            "Job {} only placed {} of {} vPods",
            placement.job,
            placement.allocated,
            placement.vpod_num
        );
    }
    Ok(())
}
