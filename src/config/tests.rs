use super::{apply_config, load_config_file, types::ConfigFile};
use clap::{CommandFactory, FromArgMatches};
use std::time::Duration;
use tempfile::tempdir;

use crate::args::RunnerArgs;
use crate::runner::FaultPolicy;

fn parse_with_matches(argv: &[&str]) -> Result<(RunnerArgs, clap::ArgMatches), String> {
    let matches = RunnerArgs::command()
        .try_get_matches_from(argv)
        .map_err(|err| err.to_string())?;
    let args = RunnerArgs::from_arg_matches(&matches).map_err(|err| err.to_string())?;
    Ok((args, matches))
}

#[test]
fn parse_toml_config() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("probe-runner.toml");
    let content = r#"
parallel = 8
rate = 150.0
duration = "30s"
report_interval = 2
graceful_timeout = "750ms"
payload_bytes = 4096
failure_rate = 0.05
fault_policy = "stop-worker"
"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    if config.parallel != Some(8) {
        return Err("Unexpected parallel".to_owned());
    }
    if config.fault_policy != Some(FaultPolicy::StopWorker) {
        return Err("Unexpected fault_policy".to_owned());
    }
    let interval = config
        .report_interval
        .as_ref()
        .ok_or("Expected report_interval")?
        .to_duration()
        .map_err(|err| err.to_string())?;
    if interval != Duration::from_secs(2) {
        return Err(format!("Unexpected report_interval: {:?}", interval));
    }
    Ok(())
}

#[test]
fn parse_json_config_with_aliases() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("probe-runner.json");
    let content = r#"{"parallel_tests": 3, "target_tests_per_second": -1, "duration": "1m"}"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    if config.parallel != Some(3) {
        return Err("Unexpected parallel".to_owned());
    }
    match config.rate {
        Some(rate) if rate < 0.0 => {}
        other => return Err(format!("Unexpected rate: {:?}", other)),
    }
    Ok(())
}

#[test]
fn unknown_fields_and_extensions_are_rejected() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let toml_path = dir.path().join("bad.toml");
    std::fs::write(&toml_path, "url = \"http://localhost\"\n")
        .map_err(|err| format!("write failed: {}", err))?;
    if load_config_file(&toml_path).is_ok() {
        return Err("Unknown field should fail".to_owned());
    }

    let yaml_path = dir.path().join("config.yaml");
    std::fs::write(&yaml_path, "parallel: 2\n").map_err(|err| format!("write failed: {}", err))?;
    if load_config_file(&yaml_path).is_ok() {
        return Err("Unsupported extension should fail".to_owned());
    }
    Ok(())
}

#[test]
fn config_fills_defaults_but_cli_wins() -> Result<(), String> {
    let (mut args, matches) = parse_with_matches(&["probe-runner", "-p", "2"])?;
    let config = ConfigFile {
        parallel: Some(16),
        rate: Some(40.0),
        duration: Some(super::types::DurationValue::Text("5s".to_owned())),
        fault_policy: Some(FaultPolicy::StopWorker),
        ..ConfigFile::default()
    };

    apply_config(&mut args, &matches, &config).map_err(|err| err.to_string())?;

    if args.parallel_tests != 2 {
        return Err(format!("CLI parallel overridden: {}", args.parallel_tests));
    }
    if (args.target_rate - 40.0).abs() > f64::EPSILON {
        return Err(format!("Config rate not applied: {}", args.target_rate));
    }
    if args.duration != Duration::from_secs(5) {
        return Err(format!("Config duration not applied: {:?}", args.duration));
    }
    if args.fault_policy != FaultPolicy::StopWorker {
        return Err("Config fault_policy not applied".to_owned());
    }
    Ok(())
}

#[test]
fn out_of_range_config_values_fail() -> Result<(), String> {
    let cases = [
        ConfigFile {
            failure_rate: Some(2.0),
            ..ConfigFile::default()
        },
        ConfigFile {
            payload_bytes: Some(0),
            ..ConfigFile::default()
        },
        ConfigFile {
            graceful_timeout: Some(super::types::DurationValue::Seconds(0)),
            ..ConfigFile::default()
        },
        ConfigFile {
            rate: Some(f64::NAN),
            ..ConfigFile::default()
        },
    ];
    for config in cases {
        let (mut args, matches) = parse_with_matches(&["probe-runner"])?;
        if apply_config(&mut args, &matches, &config).is_ok() {
            return Err(format!("Expected failure for {:?}", config));
        }
    }
    Ok(())
}
