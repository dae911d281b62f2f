/// Tests for config module
#[cfg(test)]
mod tests {
    use crate::cli::CliArgs;
    use crate::config::build_export_config;
    use chrono::{DateTime, TimeZone, Utc};
    use clap::Parser;
    use log::LevelFilter;
    use std::path::PathBuf;
    use std::time::Duration;

    fn started_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
    }

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec![
            "testplan-export",
            "--organization",
            " contoso ",
            "--project",
            "My Project",
            "--pat",
            "secret",
            "--test-plan-id",
            "7",
        ];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_default_output_is_timestamped() {
        let config = build_export_config(&args(&[]), &started_at()).expect("Should build config");
        assert_eq!(config.output_path, PathBuf::from("test_plan_hierarchical_export_20240305_140709.csv"));
        assert_eq!(config.log_file, None);
        assert_eq!(config.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_values_are_carried_over() {
        let config = build_export_config(
            &args(&["--output", "plan.csv", "--concurrency", "8", "--timeout-secs", "5", "--max-shared-step-depth", "3"]),
            &started_at(),
        )
        .expect("Should build config");

        assert_eq!(config.organization, "contoso");
        assert_eq!(config.project, "My Project");
        assert_eq!(config.test_plan_id, "7");
        assert_eq!(config.output_path, PathBuf::from("plan.csv"));
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.max_shared_step_depth, 3);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.endpoints().base(), "https://dev.azure.com/contoso/My%20Project/_apis");
    }

    #[test]
    fn test_debug_uses_timestamped_log_file() {
        let config = build_export_config(&args(&["--debug"]), &started_at()).expect("Should build config");
        assert_eq!(config.log_file, Some(PathBuf::from("azure_exporter_debug_20240305_140709.log")));
        assert_eq!(config.log_level, LevelFilter::Debug);
    }

    #[test]
    fn test_explicit_log_file_wins() {
        let config =
            build_export_config(&args(&["--debug", "--log-file", "trace.log"]), &started_at()).expect("Should build config");
        assert_eq!(config.log_file, Some(PathBuf::from("trace.log")));
    }

    #[test]
    fn test_invalid_args_are_rejected() {
        assert!(build_export_config(&args(&["--concurrency", "0"]), &started_at()).is_err());

        let mut blank_plan = args(&[]);
        blank_plan.test_plan_id = " ".to_string();
        assert!(build_export_config(&blank_plan, &started_at()).is_err());
    }
}
