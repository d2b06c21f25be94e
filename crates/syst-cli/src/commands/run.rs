use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use rayon::prelude::*;
use serde::Serialize;
use syst_core::{DomainTally, RunProvenance, SystError};
use syst_table::TableSet;
use tracing::info;

use crate::config::RunConfig;
use crate::engine::{Engine, EventOutput};
use crate::events::EventBatch;
use crate::hash::{bytes_hash, stable_hash_string};
use crate::write_json;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML or JSON run configuration.
    #[arg(long)]
    pub config: PathBuf,
    /// Correction table document (JSON or YAML).
    #[arg(long)]
    pub tables: PathBuf,
    /// Event file (JSON or YAML).
    #[arg(long)]
    pub events: PathBuf,
    /// Output JSON file.
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    events: usize,
    collections: Vec<&'static str>,
    warnings: DomainTally,
}

#[derive(Debug, Serialize)]
struct RunOutput {
    provenance: RunProvenance,
    summary: RunSummary,
    events: Vec<EventOutput>,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let config = RunConfig::load(&args.config)?;
    let table_bytes = fs::read(&args.tables)?;
    let table = TableSet::from_path(&args.tables)?;
    let engine = Engine::new(&config, Arc::new(table))?;
    let batch = EventBatch::load(&args.events)?;

    let events = batch
        .events
        .par_iter()
        .map(|record| engine.process(record))
        .collect::<Result<Vec<_>, SystError>>()?;

    let mut warnings = DomainTally::new();
    for event in &events {
        warnings.merge(&event.warnings);
    }
    let provenance = RunProvenance::new(
        stable_hash_string(&config)?,
        bytes_hash(&table_bytes),
        config.period_label(),
    )
    .with_tool("syst-cli", env!("CARGO_PKG_VERSION"));
    info!(
        events = events.len(),
        warnings = warnings.total(),
        out = %args.out.display(),
        "run complete"
    );
    let output = RunOutput {
        provenance,
        summary: RunSummary {
            events: events.len(),
            collections: engine.collection_names(),
            warnings,
        },
        events,
    };
    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_json(&args.out, &output)
}
