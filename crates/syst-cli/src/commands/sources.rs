use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use syst_core::{SampleKind, UncSource};
use syst_jet::{CatalogEntry, JetCorrectionConfig, UncertaintyCatalog};
use syst_lepton::TAU_ES_SOURCES;
use syst_table::serde::to_canonical_json_bytes;

use crate::config::RunConfig;

#[derive(Args, Debug)]
pub struct SourcesArgs {
    /// YAML or JSON run configuration.
    #[arg(long)]
    pub config: PathBuf,
}

fn jet_sources(config: &JetCorrectionConfig, kind: SampleKind) -> BTreeMap<String, String> {
    UncertaintyCatalog::from_config(config, kind)
        .iter()
        .filter(|(_, entry)| config.apply_jer || **entry != CatalogEntry::Resolution)
        .map(|(source, entry)| {
            let target = match entry {
                CatalogEntry::Resolution => config.jer_resolution_key(),
                CatalogEntry::Table(name) => name.clone(),
            };
            (source.label(&config.year), target)
        })
        .collect()
}

fn lepton_sources(
    sources: &[(UncSource, &str)],
    kind: SampleKind,
    enabled: bool,
) -> BTreeMap<String, String> {
    if kind.is_data() || !enabled {
        return BTreeMap::new();
    }
    sources
        .iter()
        .map(|(source, key)| (source.name().to_string(), key.to_string()))
        .collect()
}

/// Resolved sources per collection; each source maps to the correction it reads.
pub fn resolve(config: &RunConfig) -> BTreeMap<&'static str, BTreeMap<String, String>> {
    let kind = config.sample.kind;
    let mut out = BTreeMap::new();
    if let Some(jets) = &config.jets {
        out.insert("jets", jet_sources(jets, kind));
    }
    if let Some(fat_jets) = &config.fat_jets {
        out.insert("fat_jets", jet_sources(fat_jets, kind));
    }
    if let Some(muons) = &config.muons {
        let sources = [
            (UncSource::MuonScale, muons.keys.m_mc.as_str()),
            (UncSource::MuonResolution, muons.keys.k_mc.as_str()),
        ];
        out.insert("muons", lepton_sources(&sources, kind, muons.return_variations));
    }
    if let Some(electrons) = &config.electrons {
        let sources = [(UncSource::EleEs, electrons.es_key.as_str())];
        out.insert("electrons", lepton_sources(&sources, kind, electrons.return_variations));
    }
    if let Some(taus) = &config.taus {
        let sources: Vec<(UncSource, &str)> = TAU_ES_SOURCES
            .iter()
            .map(|source| (*source, taus.es_key.as_str()))
            .collect();
        out.insert("taus", lepton_sources(&sources, kind, taus.return_variations));
    }
    out
}

pub fn run(args: &SourcesArgs) -> Result<(), Box<dyn Error>> {
    let config = RunConfig::load(&args.config)?;
    let json = to_canonical_json_bytes(&resolve(&config))
        .map_err(|err| Box::new(err) as Box<dyn Error>)?;
    println!("{}", String::from_utf8(json)?);
    Ok(())
}
