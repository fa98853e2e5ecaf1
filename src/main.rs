//! mgce entry point: CLI wiring, rate-table loading, and output.

use std::fs;
use std::path::Path;
use std::process;

use tracing::{debug, error};

use mgce::analysis::analyze;
use mgce::config::RateTable;
use mgce::facility::FacilityInput;
use mgce::logging::init_tracing;

/// Parsed CLI arguments.
struct CliArgs {
    facility_path: Option<String>,
    rates_path: Option<String>,
    preset: Option<String>,
    json: bool,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("mgce: microgrid design and financial analysis");
    eprintln!();
    eprintln!("Usage: mgce --facility <path> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --facility <path>        Facility profile as a JSON file");
    eprintln!("  --rates <path>           Load rate constants from a TOML file");
    eprintln!(
        "  --preset <name>          Use a built-in rate table ({})",
        RateTable::PRESETS.join(", ")
    );
    eprintln!("  --json                   Print the full result as JSON");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start the REST API server");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --rates or --preset is given, the louisiana preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        facility_path: None,
        rates_path: None,
        preset: None,
        json: false,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--facility" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --facility requires a path argument");
                    process::exit(1);
                }
                cli.facility_path = Some(args[i].clone());
            }
            "--rates" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --rates requires a path argument");
                    process::exit(1);
                }
                cli.rates_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--json" => {
                cli.json = true;
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --port requires a u16 argument");
                    process::exit(1);
                }
                if let Ok(p) = args[i].parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{}\" is not a valid u16", args[i]);
                    process::exit(1);
                }
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

fn load_rates(cli: &CliArgs) -> RateTable {
    // --rates takes priority, then --preset, then louisiana
    let loaded = if let Some(ref path) = cli.rates_path {
        RateTable::from_toml_file(Path::new(path))
    } else if let Some(ref name) = cli.preset {
        RateTable::from_preset(name)
    } else {
        Ok(RateTable::louisiana())
    };
    let rates = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let errors = rates.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    debug!(locations = rates.locations.len(), "rate table loaded");
    rates
}

fn load_facility(path: &str) -> FacilityInput {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("error: failed to read {path}: {e}");
        process::exit(1);
    });
    serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("error: failed to parse {path}: {e}");
        process::exit(1);
    })
}

fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("warning: logging disabled: {e}");
    }
    let cli = parse_args();
    let rates = load_rates(&cli);

    #[cfg(feature = "api")]
    let serve = cli.serve;
    #[cfg(not(feature = "api"))]
    let serve = false;

    if cli.facility_path.is_none() && !serve {
        eprintln!("error: --facility is required");
        print_help();
        process::exit(1);
    }

    if let Some(ref path) = cli.facility_path {
        let input = load_facility(path);
        let result = analyze(&input, &rates).unwrap_or_else(|e| {
            error!(kind = e.kind(), "analysis failed");
            eprintln!("error: {e}");
            process::exit(1);
        });

        if cli.json {
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("error: failed to serialize result: {e}");
                    process::exit(1);
                }
            }
        } else {
            if let Some(ref name) = input.facility_name {
                println!("=== {name} ===\n");
            }
            println!("{result}");
        }
    }

    // Start API server if requested
    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(mgce::api::AppState { rates });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(mgce::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}
