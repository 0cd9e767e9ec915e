//! Cold-storage simulator entry point: CLI wiring, run and export.

use std::path::Path;
use std::process;

use coldstore_sim::config::ScenarioConfig;
use coldstore_sim::io::export::{export_csv, export_profiles_csv};
use coldstore_sim::runner::run_scenario;
use coldstore_sim::telemetry::init_tracing;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    days_override: Option<usize>,
    telemetry_out: Option<String>,
    profiles_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("coldstore-sim: cold-storage warehouse flexible-load simulator");
    eprintln!();
    eprintln!("Usage: coldstore-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --days <usize>           Override number of simulated days");
    eprintln!("  --telemetry-out <path>   Export step results to CSV");
    eprintln!("  --profiles-out <path>    Export forward usage profiles to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after simulation");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

/// Value following `flag`, or exit with a usage error.
fn expect_value(args: &[String], i: usize, flag: &str, what: &str) -> String {
    match args.get(i) {
        Some(v) => v.clone(),
        None => {
            eprintln!("error: {flag} requires {what} argument");
            process::exit(1);
        }
    }
}

/// Parses `value` as `T`, or exit with a usage error.
fn parse_or_exit<T: std::str::FromStr>(value: &str, flag: &str, what: &str) -> T {
    value.parse().unwrap_or_else(|_| {
        eprintln!("error: {flag} value \"{value}\" is not a valid {what}");
        process::exit(1);
    })
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        days_override: None,
        telemetry_out: None,
        profiles_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                cli.scenario_path = Some(expect_value(&args, i, flag, "a path"));
            }
            "--preset" => {
                i += 1;
                cli.preset = Some(expect_value(&args, i, flag, "a name"));
            }
            "--seed" => {
                i += 1;
                let v = expect_value(&args, i, flag, "a u64");
                cli.seed_override = Some(parse_or_exit(&v, flag, "u64"));
            }
            "--days" => {
                i += 1;
                let v = expect_value(&args, i, flag, "a usize");
                cli.days_override = Some(parse_or_exit(&v, flag, "usize"));
            }
            "--telemetry-out" => {
                i += 1;
                cli.telemetry_out = Some(expect_value(&args, i, flag, "a path"));
            }
            "--profiles-out" => {
                i += 1;
                cli.profiles_out = Some(expect_value(&args, i, flag, "a path"));
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let v = expect_value(&args, i, flag, "a u16");
                cli.port = parse_or_exit(&v, flag, "u16");
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    let cli = parse_args();
    init_tracing();

    // --scenario takes priority, then --preset, then baseline default
    let loaded = match (&cli.scenario_path, &cli.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(Path::new(path)),
        (None, Some(name)) => ScenarioConfig::from_preset(name),
        (None, None) => Ok(ScenarioConfig::baseline()),
    };
    let mut scenario = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }
    if let Some(days) = cli.days_override {
        scenario.simulation.days = days;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let run = run_scenario(&scenario).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });

    for e in &run.rejected {
        eprintln!("warning: {e} (kept default)");
    }
    for r in &run.results {
        println!("{r}");
    }
    println!("\n{}", run.kpi);

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&run.results, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }
    if let Some(ref path) = cli.profiles_out {
        if let Err(e) = export_profiles_csv(&run.profiles, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Profiles written to {path}");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(coldstore_sim::api::AppState::from(run));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(coldstore_sim::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}
