use std::path::Path;
use std::process::Command;

use coldstore_sim::config::{ScenarioConfig, WeatherConfig};
use coldstore_sim::runner::run_scenario;

#[derive(Debug)]
struct Kpis {
    total_energy_kwh: f64,
    total_cost: f64,
    exercised_kwh: f64,
}

#[test]
fn scenario_files_match_presets() {
    for name in ScenarioConfig::PRESETS {
        let path = format!("scenarios/{name}.toml");
        let from_file = ScenarioConfig::from_toml_file(Path::new(&path))
            .unwrap_or_else(|e| panic!("{path}: {e}"));
        let preset = ScenarioConfig::from_preset(name).unwrap();
        assert_eq!(from_file, preset, "{path} drifted from the {name} preset");
        assert!(from_file.validate().is_empty());
    }
}

#[test]
fn scenario_presets_run_via_cli_and_produce_distinct_dynamics() {
    let baseline = run_and_parse_kpis("scenarios/baseline.toml");
    let heatwave = run_and_parse_kpis("scenarios/heatwave.toml");
    let tou_shift = run_and_parse_kpis("scenarios/tou_shift.toml");

    assert!(heatwave.total_energy_kwh > 0.0);
    assert_eq!(heatwave.exercised_kwh, 0.0);
    assert_eq!(baseline.exercised_kwh, 0.0);
    assert!(
        tou_shift.exercised_kwh > 0.0,
        "expected regulation to be exercised under tou_shift, got {:.2}",
        tou_shift.exercised_kwh
    );

    assert!(
        (baseline.total_cost - tou_shift.total_cost).abs() > 1.0,
        "expected billing to differ: baseline={:.2}, tou_shift={:.2}",
        baseline.total_cost,
        tou_shift.total_cost
    );
}

#[test]
fn every_preset_runs_in_process() {
    for name in ScenarioConfig::PRESETS {
        let cfg = ScenarioConfig::from_preset(name).unwrap();
        let out = run_scenario(&cfg).unwrap();
        assert_eq!(out.results.len(), cfg.simulation.days * 24, "{name}");
        assert!(out.rejected.is_empty(), "{name}: {:?}", out.rejected);
        assert_eq!(out.profiles.len(), cfg.tariffs.len(), "{name}");
        assert!(out.kpi.total_energy_kwh > 0.0, "{name}");
    }
}

#[test]
fn hotter_weather_needs_more_energy() {
    let heatwave = ScenarioConfig::heatwave();
    let mut mild = heatwave.clone();
    mild.weather = WeatherConfig::Constant { temp_c: 20.0 };

    let hot = run_scenario(&heatwave).unwrap().kpi;
    let mild = run_scenario(&mild).unwrap().kpi;
    assert!(
        hot.total_energy_kwh > mild.total_energy_kwh,
        "hot={:.2}, mild={:.2}",
        hot.total_energy_kwh,
        mild.total_energy_kwh
    );
}

#[test]
fn unknown_preset_fails_with_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_coldstore-sim"))
        .args(["--preset", "arctic"])
        .output()
        .expect("coldstore-sim process should run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown preset"), "stderr: {stderr}");
}

fn run_and_parse_kpis(path: &str) -> Kpis {
    let output = Command::new(env!("CARGO_BIN_EXE_coldstore-sim"))
        .args(["--scenario", path])
        .output()
        .expect("coldstore-sim process should run");

    assert!(
        output.status.success(),
        "scenario run failed for {path}: stderr={} ",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    Kpis {
        total_energy_kwh: parse_metric(&stdout, "Total energy:", "kWh"),
        total_cost: parse_metric(&stdout, "Total cost:", ""),
        exercised_kwh: parse_metric(&stdout, "Regulation exercised:", "kWh"),
    }
}

fn parse_metric(stdout: &str, label: &str, unit: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing KPI line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid KPI format for line `{line}`"));

    raw.trim_end_matches(unit)
        .trim()
        .parse::<f64>()
        .unwrap_or_else(|e| panic!("failed to parse `{label}` value from `{line}`: {e}"))
}
