use crate::api::DEFAULT_SERVER_URL;
use crate::shared_steps::DEFAULT_MAX_DEPTH;
use clap::Parser;
use std::path::PathBuf;

/// Environment variable read when `--pat` is not given
pub const PAT_ENV: &str = "AZURE_DEVOPS_PAT";

#[derive(Parser, Debug, Clone)]
#[command(name = "testplan-export")]
#[command(about = "Export an Azure DevOps test plan as a hierarchical CSV")]
#[command(version)]
pub struct CliArgs {
    /// Azure DevOps organization name
    #[arg(long, value_name = "ORG")]
    pub organization: String,

    /// Project name
    #[arg(long, value_name = "PROJECT")]
    pub project: String,

    /// Personal access token with read access to test plans and work items
    #[arg(long, env = PAT_ENV, hide_env_values = true, value_name = "TOKEN")]
    pub pat: String,

    /// ID of the test plan to export
    #[arg(long, value_name = "ID")]
    pub test_plan_id: String,

    /// CSV output path
    /// Default: test_plan_hierarchical_export_<YYYYmmdd_HHMMSS>.csv
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable debug logging to a timestamped log file
    #[arg(long)]
    pub debug: bool,

    /// Write debug logging to this file instead of the timestamped default
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Service root URL (for on-premises servers)
    #[arg(long, value_name = "URL", default_value_t = DEFAULT_SERVER_URL.to_string())]
    pub server_url: String,

    /// Maximum number of concurrent requests
    #[arg(long, value_name = "N", default_value = "4")]
    pub concurrency: usize,

    /// Maximum nesting of shared steps inside shared steps
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_shared_step_depth: usize,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value = "60")]
    pub timeout_secs: u64,
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        CliArgs::parse()
    }

    /// Validate argument values
    pub fn validate(&self) -> Result<(), String> {
        for (flag, value) in [
            ("--organization", &self.organization),
            ("--project", &self.project),
            ("--pat", &self.pat),
            ("--test-plan-id", &self.test_plan_id),
            ("--server-url", &self.server_url),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{} must not be empty", flag));
            }
        }

        if self.concurrency == 0 {
            return Err("--concurrency must be at least 1".to_string());
        }
        if self.max_shared_step_depth == 0 {
            return Err("--max-shared-step-depth must be at least 1".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("--timeout-secs must be at least 1".to_string());
        }

        Ok(())
    }

    /// Should a debug log be written?
    pub fn wants_debug_log(&self) -> bool {
        self.debug || self.log_file.is_some()
    }
}
