/// Configuration resolution module
///
/// This module handles:
/// - Building an ExportConfig from CLI arguments
/// - Choosing default output and debug log file names from the run's start time
use crate::api::Endpoints;
use crate::cli::CliArgs;
use chrono::{DateTime, TimeZone};
use log::{LevelFilter, debug};
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

/// Timestamp format used in default file names
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Everything one export run needs, resolved once up front
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub organization: String,
    pub project: String,
    pub pat: String,
    pub test_plan_id: String,
    pub server_url: String,
    pub output_path: PathBuf,
    /// Debug log destination; `None` logs to the console
    pub log_file: Option<PathBuf>,
    pub log_level: LevelFilter,
    pub concurrency: usize,
    pub max_shared_step_depth: usize,
    pub timeout: Duration,
}

impl ExportConfig {
    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.server_url, &self.organization, &self.project)
    }
}

/// Build an ExportConfig from CLI arguments
///
/// `started_at` names the default output and debug log files, so that
/// both carry the same timestamp.
pub fn build_export_config<Tz>(args: &CliArgs, started_at: &DateTime<Tz>) -> Result<ExportConfig, String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    debug!("Building export config from CLI args");
    args.validate()?;

    let stamp = started_at.format(FILE_TIMESTAMP_FORMAT).to_string();

    let output_path = args.output.clone().unwrap_or_else(|| default_output_path(&stamp));
    if output_path.as_os_str().is_empty() {
        return Err("--output must not be empty".to_string());
    }

    let log_file = match (&args.log_file, args.debug) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(default_debug_log_path(&stamp)),
        (None, false) => None,
    };

    Ok(ExportConfig {
        organization: args.organization.trim().to_string(),
        project: args.project.trim().to_string(),
        pat: args.pat.clone(),
        test_plan_id: args.test_plan_id.trim().to_string(),
        server_url: args.server_url.trim().to_string(),
        output_path,
        log_file,
        log_level: if args.wants_debug_log() { LevelFilter::Debug } else { LevelFilter::Info },
        concurrency: args.concurrency,
        max_shared_step_depth: args.max_shared_step_depth,
        timeout: Duration::from_secs(args.timeout_secs),
    })
}

fn default_output_path(stamp: &str) -> PathBuf {
    PathBuf::from(format!("test_plan_hierarchical_export_{}.csv", stamp))
}

fn default_debug_log_path(stamp: &str) -> PathBuf {
    PathBuf::from(format!("azure_exporter_debug_{}.log", stamp))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
