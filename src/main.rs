// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

mod api;
mod cli;
mod client;
mod config;
mod hierarchy;
mod report;
mod results;
mod rows;
mod shared_steps;
mod steps;
mod types;
mod ui;

#[cfg(test)]
mod test_support;

use api::PlanApi;
use client::AzureDevOpsClient;
use config::ExportConfig;
use log::info;
use std::fs::File;

/// Exit status when the plan yielded no rows
const EXIT_NO_DATA: i32 = 2;

fn main() {
    // Parse CLI arguments
    let args = cli::CliArgs::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        ui::print_error(&e);
        std::process::exit(1);
    }

    // Resolve configuration; the start time names default output files
    let config = match config::build_export_config(&args, &chrono::Local::now()) {
        Ok(c) => c,
        Err(e) => {
            ui::print_error(&format!("Configuration error: {}", e));
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config) {
        ui::print_error(&e);
        std::process::exit(1);
    }
    if let Some(log_file) = &config.log_file {
        ui::status(&format!("Debug logging to {}", log_file.display()));
    }

    let pool = match rayon::ThreadPoolBuilder::new().num_threads(config.concurrency).build() {
        Ok(p) => p,
        Err(e) => {
            ui::print_error(&format!("Failed to start worker pool: {}", e));
            std::process::exit(1);
        }
    };

    ui::status(&format!(
        "Exporting test plan {} from {}/{}",
        config.test_plan_id, config.organization, config.project
    ));

    let api = PlanApi::new(AzureDevOpsClient::new(&config.pat, config.timeout), config.endpoints());
    info!("Service root: {}", api.endpoints().base());
    info!("Using {} workers, {:?} request timeout", config.concurrency, config.timeout);

    let rows = rows::extract_hierarchical_rows(&api, &config.test_plan_id, &pool, config.max_shared_step_depth);

    if rows.is_empty() {
        ui::print_warning("No data to export");
        std::process::exit(EXIT_NO_DATA);
    }

    if let Err(e) = report::export_csv(&rows, &config.output_path) {
        ui::print_error(&format!("Export failed: {}", e));
        std::process::exit(1);
    }

    report::print_summary(&report::summarize_rows(&rows));
    ui::print_done(&format!("Exported {} rows to {}", rows.len(), config.output_path.display()));
}

/// Initialise `env_logger`: stdout by default, the debug log file when set.
/// `RUST_LOG` overrides the configured level.
fn init_logging(config: &ExportConfig) -> Result<(), String> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(config.log_level).parse_default_env();

    match &config.log_file {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| format!("Failed to create log file {}: {}", path.display(), e))?;
            builder.target(env_logger::Target::Pipe(Box::new(file))).write_style(env_logger::WriteStyle::Never);
        }
        None => {
            builder.target(env_logger::Target::Stdout);
        }
    }

    builder.try_init().map_err(|e| format!("Failed to initialise logging: {}", e))
}
