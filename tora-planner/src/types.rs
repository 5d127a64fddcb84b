// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The report printed once a job has been planned.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tora_placement::inventory::TorInventory;
use tora_placement::materialize::TorAnnotations;
use tora_placement::planner::Placement;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// The full placement as YAML.
    #[default]
    Yaml,
    /// A short human-readable summary.
    Summary,
}

/// The placement together with the annotations of every selected node.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub placement: &'a Placement,
    pub annotations: BTreeMap<String, BTreeMap<String, String>>,
}

impl<'a> Report<'a> {
    #[must_use]
    pub fn new(placement: &'a Placement, inventory: &TorInventory) -> Self {
        let annotations = placement
            .server_list
            .server_names()
            .map(|name| {
                let annotations = TorAnnotations::for_node(inventory, &placement.server_list, name);
                (name.to_string(), annotations.to_map())
            })
            .collect();
        Self {
            placement,
            annotations,
        }
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Yaml => Ok(serde_yaml::to_string(self)?),
            ReportFormat::Summary => Ok(self.summary()?),
        }
    }

    fn summary(&self) -> Result<String, fmt::Error> {
        let p = self.placement;
        let mut out = String::new();
        writeln!(
            out,
            "job {}: {}/{} vPods of {} servers ({:?})",
            p.job, p.allocated, p.vpod_num, p.vpod_size, p.escalation
        )?;
        for usage in &p.super_pods {
            writeln!(
                out,
                "  super-pod {}: full {}/{}, partial {}/{}",
                usage.super_pod_id, usage.used_full, usage.full, usage.used_partial, usage.partial
            )?;
        }
        for selection in &p.server_list.selections {
            writeln!(
                out,
                "  tor {}: {}",
                selection.ip,
                selection.servers.join(", ")
            )?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use tora_placement::escalation::EscalationOutcome;
    use tora_placement::inventory::{Server, Tor, TorIdx, TorSharing};
    use tora_placement::materialize::{ServerList, TorSelection};
    use tora_placement::planner::SuperPodUsage;

    use super::*;

    fn placement() -> (Placement, TorInventory) {
        let tors = (0..2)
            .map(|t| {
                let servers = (0..2)
                    .map(|s| Server::new(&format!("tor{t}-node{s}"), Some(0)))
                    .collect();
                Tor::new(t, &format!("10.0.0.{t}"), servers).with_sharing(TorSharing::Shared)
            })
            .collect();
        let inventory = TorInventory::new(2, 0, tors);
        let selections = (0..2)
            .map(|t| TorSelection {
                tor: TorIdx(t),
                ip: format!("10.0.0.{t}"),
                sharing: TorSharing::Free,
                free_server_count: 2,
                servers: vec![format!("tor{t}-node0"), format!("tor{t}-node1")],
            })
            .collect();
        let placement = Placement {
            job: "job0".to_string(),
            vpod_num: 2,
            vpod_size: 2,
            allocated: 2,
            escalation: EscalationOutcome::NotNeeded,
            super_pods: vec![SuperPodUsage {
                super_pod_id: 0,
                full: 4,
                partial: 0,
                used_full: 4,
                used_partial: 0,
            }],
            server_list: ServerList { selections },
        };
        (placement, inventory)
    }

    #[test]
    fn summary() {
        let (placement, inventory) = placement();
        let report = Report::new(&placement, &inventory);
        let text = report.render(ReportFormat::Summary).unwrap();
        assert_eq!(
            text,
            "job job0: 2/2 vPods of 2 servers (NotNeeded)\n  super-pod 0: full 4/4, partial \
             0/0\n  tor 10.0.0.0: tor0-node0, tor0-node1\n  tor 10.0.0.1: tor1-node0, \
             tor1-node1\n"
        );
    }

    #[test]
    fn yaml() {
        let (placement, inventory) = placement();
        let report = Report::new(&placement, &inventory);
        assert_eq!(report.annotations.len(), 4);
        assert_eq!(report.annotations["tor1-node1"]["sharedTorIp"], "10.0.0.1");

        let text = report.render(ReportFormat::Yaml).unwrap();
        assert!(text.contains("job: job0"));
        assert!(text.contains("escalation: not_needed"));
        assert!(text.contains("isSharedTor: '1'"));
    }
}
