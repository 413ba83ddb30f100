//! Summaries of storms in a HURDAT2 file.
//!
//! Run:
//! ```bash
//! $ hurdat atlantic storm AL172010
//! $ hurdat nepac years --json nepac.json
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use common::hurdat::HurdatReader;
use hurdat::config::Config;
use hurdat::report::Report;
use hurdat::summary::{read_tracks, Summary};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration (defaults to ./hurdat.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Also write the results to this file as JSON
    #[arg(long, global = true)]
    json: Option<PathBuf>,
    /// A dataset alias from the configuration, or the path of a HURDAT2 file
    dataset: String,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Per-storm summary of one storm, or of every storm when no id is given
    Storm { id: Option<String> },
    /// Storm and hurricane counts per year
    Years,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hurdat=info,common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref()).context("could not load configuration")?;
    let path = config.resolve_dataset(&args.dataset);
    let file = File::open(&path).with_context(|| format!("could not open {}", path.display()))?;
    let mut reader = HurdatReader::new(BufReader::new(file));
    let analyzer = config.analyzer();

    let (storms, summary, scanned_all) = match &args.mode {
        Mode::Storm { id: Some(id) } => {
            let track = match reader.find_storm(id) {
                Ok(Some(track)) => track,
                Ok(None) => bail!("storm {id} not found in {}", path.display()),
                Err(e) => return Err(e).with_context(|| format!("could not read storm {id}")),
            };
            let storm = analyzer.analyze(&track);
            let summary: Summary = [&storm].into_iter().collect();
            (vec![storm], summary, false)
        }
        Mode::Storm { id: None } | Mode::Years => {
            let mut summary = Summary::default();
            let tracks = read_tracks(&mut reader, &mut summary)
                .with_context(|| format!("could not read {}", path.display()))?;
            tracing::info!(storms = tracks.len(), skipped = summary.skipped.len(), "parsed");
            let storms = analyzer.analyze_all(&tracks);
            let mut totals: Summary = storms.iter().collect();
            totals.skipped = summary.skipped;
            totals.unidentified = summary.unidentified;
            (storms, totals, true)
        }
    };

    match &args.mode {
        Mode::Storm { .. } => {
            for storm in &storms {
                println!("{storm}\n");
            }
        }
        Mode::Years => {
            for (year, counts) in &summary.years {
                println!("{year}: {counts}");
            }
        }
    }

    if !summary.skipped.is_empty() {
        println!("Skipped malformed storms: {}", summary.skipped.join(", "));
    }
    if scanned_all && summary.accuracy.ratio().is_some() {
        println!("Hypothesis accuracy: {}", summary.accuracy);
    }

    if let Some(json) = &args.json {
        Report::new(path.display().to_string(), storms, summary).write(json)?;
        tracing::info!(path = %json.display(), "report written");
    }

    Ok(())
}
