//! equity-registry binary
//!
//! Usage:
//!   equity-registry show [genesis.json]
//!   equity-registry apply [genesis.json] <ops.json>
//!   equity-registry dilute <total_equity> <percent_units>

use std::path::PathBuf;

use equity_cli::{apply_script, load_registry, load_script, render_table, CliConfig};
use equity_ledger::{compute_diluted_stake, format_percent};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_usage() {
    eprintln!("equity-registry - Inspect and drive an equity registry");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  equity-registry show [genesis.json]              Print the registry after setup");
    eprintln!("  equity-registry apply [genesis.json] <ops.json>  Replay an operation script, print JSON");
    eprintln!("  equity-registry dilute <total> <percent_units>   Compute a dilution (1000 = 10%)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EQUITY_GENESIS      Default genesis file (default: ./genesis.json)");
    eprintln!("  EQUITY_MIN_MEMBERS  Minimum members kept by scripted removals (default: 1)");
    eprintln!("  RUST_LOG            Log filter");
}

fn parse_amount(arg: &str, what: &str) -> Result<u64, String> {
    arg.parse()
        .map_err(|_| format!("{what} must be a non-negative integer, got {arg:?}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "equity_registry=info,equity_cli=info,equity_ledger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let config = CliConfig::from_env()?;

    match args[1].as_str() {
        "show" => {
            let genesis = args.get(2).map(PathBuf::from).unwrap_or(config.genesis);
            let registry = load_registry(&genesis)?;
            let snapshot = registry.snapshot().await?;
            print!("{}", render_table(&snapshot));
        }
        "apply" => {
            let (genesis, script) = match &args[2..] {
                [script] => (config.genesis.clone(), PathBuf::from(script)),
                [genesis, script] => (PathBuf::from(genesis), PathBuf::from(script)),
                _ => {
                    eprintln!("Error: apply requires an ops.json argument");
                    std::process::exit(1);
                }
            };
            let registry = load_registry(&genesis)?;
            let ops = load_script(&script)?;
            let report = apply_script(&registry, &ops, config.min_members).await?;
            println!("{}", serde_json::to_string_pretty(&report.snapshot)?);
            match report.failure {
                None => tracing::info!(applied = report.applied, "script complete"),
                Some(err) => {
                    tracing::error!(applied = report.applied, error = %err, "script stopped");
                    return Err(err.into());
                }
            }
        }
        "dilute" => {
            if args.len() < 4 {
                eprintln!("Error: dilute requires <total> and <percent_units>");
                std::process::exit(1);
            }
            let total = parse_amount(&args[2], "total")?;
            let percent = parse_amount(&args[3], "percent_units")?;
            let dilution = compute_diluted_stake(total, percent)?;
            println!(
                "issue {} for {} of new total {}",
                dilution.new_stake,
                format_percent(percent),
                dilution.new_total
            );
        }
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
