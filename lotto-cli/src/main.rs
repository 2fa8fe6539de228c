mod display;
mod load;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use lotto_stats::insight::analyze_draw;
use lotto_stats::{build_pension_report, build_report, StatsConfig};

use crate::display::{
    display_dormancy, display_draw, display_frequency, display_load_summary, display_outlets,
    display_patterns, display_pension, display_report_summary,
};
use crate::load::{load_config, load_draws, load_pension_draws, load_pension_stores, load_registry};

#[derive(Parser)]
#[command(name = "lotto", about = "Descriptive statistics over lotto draw history")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the full statistics report and write it as JSON
    Report {
        /// Directory holding lotto_<n>.json draw files
        #[arg(short, long, default_value = "data/lotto/draws")]
        draws: PathBuf,

        /// Outlet registry (lotto_stores.json)
        #[arg(short, long)]
        stores: Option<PathBuf>,

        /// JSON file overriding the default settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print frequency, dormancy and pattern tables
    Stats {
        #[arg(short, long, default_value = "data/lotto/draws")]
        draws: PathBuf,

        #[arg(short, long)]
        stores: Option<PathBuf>,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show the breakdown of a single draw
    Draw {
        /// Draw number
        draw_no: u32,

        #[arg(short, long, default_value = "data/lotto/draws")]
        draws: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Build the pension lottery report
    Pension {
        /// Directory holding pension_<n>.json draw files
        #[arg(short, long, default_value = "data/pension/draws")]
        draws: PathBuf,

        /// Directory holding stores_<n>.json winning-store lists
        #[arg(short, long)]
        stores: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the default settings as JSON
    Config,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Report {
            draws,
            stores,
            config,
            output,
        } => cmd_report(&draws, stores.as_deref(), config.as_deref(), output.as_deref()),
        Command::Stats {
            draws,
            stores,
            config,
        } => cmd_stats(&draws, stores.as_deref(), config.as_deref()),
        Command::Draw {
            draw_no,
            draws,
            config,
        } => cmd_draw(draw_no, &draws, config.as_deref()),
        Command::Pension {
            draws,
            stores,
            output,
        } => cmd_pension(&draws, stores.as_deref(), output.as_deref()),
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&StatsConfig::default())?);
            Ok(())
        }
    }
}

fn write_json(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("cannot write {:?}", path))?;
            log::info!("report written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_report(
    dir: &Path,
    stores: Option<&Path>,
    config: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let registry = load_registry(stores)?;
    let (draws, summary) = load_draws(dir)?;
    if summary.errors > 0 {
        log::warn!("{} draw files rejected", summary.errors);
    }

    let report = build_report(&draws, &registry, &config)
        .with_context(|| format!("no usable draws in {:?}", dir))?;
    let json = serde_json::to_string_pretty(&report)?;
    write_json(&json, output)?;

    if output.is_some() {
        display_load_summary("Draws", &summary);
        display_report_summary(&report);
    }
    Ok(())
}

fn cmd_stats(dir: &Path, stores: Option<&Path>, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let registry = load_registry(stores)?;
    let (draws, summary) = load_draws(dir)?;
    if draws.is_empty() {
        println!("No draws found in {}.", dir.display());
        return Ok(());
    }

    let report = build_report(&draws, &registry, &config)?;
    display_load_summary("Draws", &summary);
    display_report_summary(&report);
    display_frequency(&report.frequency, config.top_n);
    display_dormancy(&report.dormancy);
    display_patterns(&report.patterns, config.top_small_n);
    if !registry.is_empty() {
        display_outlets(&report.outlets);
    }
    Ok(())
}

fn cmd_draw(draw_no: u32, dir: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let (draws, _) = load_draws(dir)?;
    let Some(draw) = draws.iter().find(|d| d.draw_no == draw_no) else {
        bail!("draw {} not found in {}", draw_no, dir.display());
    };
    display_draw(draw, &analyze_draw(draw, &config));
    Ok(())
}

fn cmd_pension(dir: &Path, stores: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let (draws, summary) = load_pension_draws(dir)?;
    let (store_lists, store_summary) = match stores {
        Some(stores_dir) => load_pension_stores(stores_dir, &draws)?,
        None => Default::default(),
    };
    let report = build_pension_report(&draws, &store_lists)
        .with_context(|| format!("no usable pension draws in {:?}", dir))?;

    match output {
        Some(path) => {
            write_json(&serde_json::to_string_pretty(&report)?, Some(path))?;
            display_load_summary("Pension draws", &summary);
            if stores.is_some() {
                display_load_summary("Pension store lists", &store_summary);
            }
            display_pension(&report);
        }
        None => write_json(&serde_json::to_string_pretty(&report)?, None)?,
    }
    Ok(())
}
