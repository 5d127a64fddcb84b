// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Planner configuration gathered from several sources.
//!
//! Later sources override earlier ones:
//!
//!  1. the values in [`PlannerConfig::default`],
//!  2. an optional TOML configuration file (`--conf-file`),
//!  3. environment variables prefixed with `TORA_` (e.g. `TORA_LOG_LEVEL`),
//!  4. command-line arguments.

use std::path::Path;

use anyhow::{Result, bail};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::types::ReportFormat;

/// Prefix of environment variables read by the planner.
pub const ENV_PREFIX: &str = "TORA_";

/// Command-line arguments and configuration values.
#[derive(Clone, Debug, Deserialize, Parser, PartialEq, Serialize)]
#[command(about = "Place a job on the servers of a ToR inventory")]
pub struct PlannerConfig {
    /// Inventory file describing switches and servers.
    #[arg(long)]
    pub inventory: Option<String>,

    /// Job file describing the job to place.
    #[arg(long)]
    pub job: Option<String>,

    /// Level of log message to display.
    #[arg(long)]
    pub log_level: Option<log::Level>,

    /// Set a regular expression for which entites should have logging level set
    /// to `--log-level`. Others will have level set to `Error`.
    #[arg(long)]
    pub log_filter_regex: Option<String>,

    /// Write log messages to this file instead of stdout ("-" for stdout).
    #[arg(long)]
    pub log_file: Option<String>,

    /// Output format of the placement report.
    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Extra TOML configuration file.
    #[arg(long)]
    #[serde(skip)]
    pub conf_file: Option<String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            inventory: Some("inventory.yaml".to_string()),
            job: Some("job.yaml".to_string()),
            log_level: Some(log::Level::Warn),
            log_filter_regex: Some(String::new()),
            log_file: None,
            format: Some(ReportFormat::Yaml),
            conf_file: None,
        }
    }
}

impl PlannerConfig {
    /// Combine all sources, with the command line taking precedence.
    pub fn parse_all_sources() -> Result<Self> {
        Self::load(Self::parse())
    }

    /// Combine defaults, configuration file and environment with an already
    /// parsed command line.
    pub fn load(cli: Self) -> Result<Self> {
        let mut figment = Self::figment_with_defaults();
        if let Some(conf_file) = &cli.conf_file {
            figment = Self::figment_conf_file_merge(figment, Path::new(conf_file))?;
        }
        figment = Self::figment_env_var_merge(figment);
        let config = Self::figment_extract(figment)?;
        Ok(Self::clap_merge(config, cli))
    }

    pub fn figment_with_defaults() -> Figment {
        Figment::new().merge(Serialized::defaults(Self::default()))
    }

    pub fn figment_conf_file_merge(config: Figment, conf_file: &Path) -> Result<Figment> {
        if conf_file.is_dir() {
            bail!("{} is not a file path", conf_file.display());
        }
        if !conf_file.exists() {
            bail!("{} not found", conf_file.display());
        }
        Ok(config.merge(Toml::file(conf_file)))
    }

    pub fn figment_env_var_merge(config: Figment) -> Figment {
        config.merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn figment_extract(config: Figment) -> Result<Self> {
        Ok(config.extract()?)
    }

    /// Override `config` with every value given on the command line.
    #[must_use]
    pub fn clap_merge(mut config: Self, cli: Self) -> Self {
        if cli.inventory.is_some() {
            config.inventory = cli.inventory;
        }
        if cli.job.is_some() {
            config.job = cli.job;
        }
        if cli.log_level.is_some() {
            config.log_level = cli.log_level;
        }
        if cli.log_filter_regex.is_some() {
            config.log_filter_regex = cli.log_filter_regex;
        }
        if cli.log_file.is_some() {
            config.log_file = cli.log_file;
        }
        if cli.format.is_some() {
            config.format = cli.format;
        }
        if cli.conf_file.is_some() {
            config.conf_file = cli.conf_file;
        }
        config
    }

    #[must_use]
    pub fn log_level(&self) -> log::Level {
        self.log_level.unwrap_or(log::Level::Warn)
    }

    #[must_use]
    pub fn log_filter_regex(&self) -> &str {
        self.log_filter_regex.as_deref().unwrap_or("")
    }

    #[must_use]
    pub fn format(&self) -> ReportFormat {
        self.format.unwrap_or_default()
    }
}
