//! Badge Crafting Calculator
//!
//! Crafting cost calculator for ClockWork Gamers badges.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use badge_calculator::calculator::{self, CraftSummary};
use badge_calculator::config::Config;
use badge_calculator::models::{
    CraftDuration, CraftRequest, CraftResult, SpecTable, Tier, parse_start_tier,
};
use badge_calculator::{db, extract, sample};

#[derive(Parser)]
#[command(name = "badge-calculator")]
#[command(about = "Badge crafting calculator for the ClockWork Gamers guild")]
struct Cli {
    /// Path to the SQLite database (overrides the config file)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import tier sheets (*.tier) from a directory
    Import {
        /// Directory to scan for tier sheets
        source_dir: PathBuf,

        /// Clear existing data before import
        #[arg(long)]
        clear: bool,
    },

    /// Calculate what it takes to craft a badge
    Calc {
        /// Target tier (e.g., "Rare", "Legendary")
        target: Tier,

        /// Highest tier already owned, or "none"
        #[arg(short, long, default_value = "none", value_parser = parse_start_tier)]
        from: StartTier,

        /// Number of badges crafted at the same time
        #[arg(short, long, allow_negative_numbers = true)]
        parallel: Option<f64>,

        /// Show the full crafting tree
        #[arg(short, long)]
        verbose: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all tiers in the database
    ListTiers,

    /// Show details for a specific tier
    Tier {
        /// Tier name
        name: Tier,
    },

    /// Initialize empty database with schema
    Init,

    /// Load the built-in tier table
    LoadSample,
}

/// Named so clap keeps `--from` a plain valued option
type StartTier = Option<Tier>;

#[derive(Serialize)]
struct CalcOutput<'a> {
    target: Tier,
    start: Option<Tier>,
    parallelism: f64,
    #[serde(flatten)]
    result: &'a CraftResult,
    duration: CraftDuration,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "badge_calculator=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(&path),
        None => match Config::default_path() {
            Ok(path) => Config::load_from(&path),
            Err(e) => {
                tracing::debug!("no config directory: {:#}", e);
                Ok(Config::default())
            }
        },
    }
}

fn require_table(conn: &Connection) -> Result<Option<SpecTable>> {
    let table = db::load_table(conn)?;
    if table.is_none() {
        println!("No tiers in database. Run 'import' or 'load-sample' first.");
    }
    Ok(table)
}

fn main() -> Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    let database = cli.database.unwrap_or_else(|| config.database_path());

    let conn = Connection::open(&database)
        .with_context(|| format!("Failed to open database {}", database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Import { source_dir, clear } => {
            if clear {
                println!("Clearing existing data...");
                db::clear_specs(&conn)?;
            }

            let stats = extract::extract_to_database(&conn, &source_dir)?;
            println!("{}", stats);
        }

        Commands::Calc {
            target,
            from,
            parallel,
            verbose,
            json,
        } => {
            let Some(table) = require_table(&conn)? else {
                return Ok(ExitCode::FAILURE);
            };

            let request = CraftRequest {
                target_tier: target,
                start_tier: from,
                parallelism_factor: parallel.unwrap_or(config.parallelism),
            };

            let result = match calculator::resolve(&request, &table) {
                Ok(result) => result,
                Err(e) => {
                    eprintln!("Cannot calculate: {}", e);
                    return Ok(ExitCode::FAILURE);
                }
            };

            if json {
                let output = CalcOutput {
                    target: request.target_tier,
                    start: request.start_tier,
                    parallelism: request.parallelism_factor,
                    result: &result,
                    duration: result.duration(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                if verbose {
                    println!("Crafting tree:\n");
                    println!(
                        "{}",
                        calculator::format_craft_tree(&table, request.target_tier, request.start_tier)
                    );
                }

                let summary = CraftSummary {
                    request,
                    result: &result,
                    primary_label: &config.primary_label,
                    secondary_label: &config.secondary_label,
                };
                println!("{}", summary);
            }
        }

        Commands::ListTiers => {
            let entries = db::load_spec_entries(&conn)?;
            if entries.is_empty() {
                println!("No tiers in database. Run 'import' or 'load-sample' first.");
            } else {
                println!(
                    "{:<12} {:>10} {:>10} {:>8}  {}",
                    "Tier", config.primary_label, config.secondary_label, "Hours", "Components"
                );
                println!("{}", "-".repeat(64));
                for (tier, spec) in entries {
                    let components = if spec.component_tiers.is_empty() {
                        "-".to_string()
                    } else {
                        spec.component_tiers
                            .iter()
                            .map(|t| t.name())
                            .collect::<Vec<_>>()
                            .join(", ")
                    };
                    let (primary, secondary) = if spec.is_incomplete() {
                        ("n/a".to_string(), "n/a".to_string())
                    } else {
                        (
                            calculator::format_currency(spec.primary_cost),
                            calculator::format_currency(spec.secondary_cost),
                        )
                    };
                    println!(
                        "{:<12} {:>10} {:>10} {:>8}  {}",
                        tier.name(),
                        primary,
                        secondary,
                        spec.craft_duration_hours,
                        components
                    );
                }
            }
        }

        Commands::Tier { name } => {
            let Some(table) = require_table(&conn)? else {
                return Ok(ExitCode::FAILURE);
            };
            let spec = table.get(name);

            println!("Tier: {}", name);
            println!("  Rank: {}", name.rank());
            if spec.is_incomplete() {
                println!("  Cost: no data yet");
            } else {
                println!(
                    "  {}: {}",
                    config.primary_label,
                    calculator::format_currency(spec.primary_cost)
                );
                println!(
                    "  {}: {}",
                    config.secondary_label,
                    calculator::format_currency(spec.secondary_cost)
                );
            }
            println!("  Craft time: {}", CraftDuration::from_hours(spec.craft_duration_hours));

            if !spec.component_tiers.is_empty() {
                println!("  Components:");
                for component in &spec.component_tiers {
                    println!("    1x {}", component);
                }
            }

            let used_by: Vec<Tier> = table
                .iter()
                .filter(|(_, s)| s.component_tiers.contains(&name))
                .map(|(t, _)| t)
                .collect();
            if !used_by.is_empty() {
                println!("  Used by:");
                for tier in used_by {
                    println!("    {}", tier);
                }
            }
        }

        Commands::Init => {
            println!("Database initialized at: {}", database.display());
        }

        Commands::LoadSample => {
            load_sample_data(&conn)?;
            println!("Sample data loaded successfully!");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Replace the stored table with the built-in tier data
fn load_sample_data(conn: &Connection) -> Result<()> {
    let specs = sample::sample_specs();
    // Validate before anything is written
    SpecTable::from_entries(specs.clone())?;

    db::clear_specs(conn)?;
    for (tier, spec) in &specs {
        db::upsert_tier_spec(conn, *tier, spec)?;
    }

    println!("Loaded {} sample tiers", specs.len());
    Ok(())
}
