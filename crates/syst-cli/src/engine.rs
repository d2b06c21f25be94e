use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use syst_core::table::CorrectionTable;
use syst_core::{
    shift_met, Collection, DomainTally, PtEtaPhiM, ResultMatrix, SystError, UncSource,
    VariationSet,
};
use syst_jet::{EventContext, JetCorrectionProvider};
use syst_lepton::{ElectronScaleProvider, TauScaleProvider};
use syst_muon::MomentumScaleResolutionCorrector;
use tracing::{debug, info};

use crate::config::{MetConfig, RunConfig};
use crate::events::EventRecord;

/// Corrected output of one event.
#[derive(Debug, Clone, Serialize)]
pub struct EventOutput {
    /// Event number.
    pub event: u64,
    /// Luminosity block.
    pub lumi: u64,
    /// Run number.
    pub run: u32,
    /// Collection name to systematic name to four-vectors. Every collection
    /// carries every systematic name of the event.
    pub collections: BTreeMap<String, BTreeMap<String, Collection>>,
    /// Domain warnings raised while correcting the event.
    pub warnings: DomainTally,
}

/// Every configured provider, shared read-only across events.
#[derive(Debug)]
pub struct Engine {
    jets: Option<JetCorrectionProvider>,
    fat_jets: Option<JetCorrectionProvider>,
    muons: Option<MomentumScaleResolutionCorrector>,
    electrons: Option<ElectronScaleProvider>,
    taus: Option<TauScaleProvider>,
    met: Option<MetConfig>,
}

/// Collections the engine can correct.
const COLLECTIONS: [&str; 5] = ["jets", "fat_jets", "muons", "electrons", "taus"];

fn owned(named: BTreeMap<String, &Collection>) -> BTreeMap<String, Collection> {
    named
        .into_iter()
        .map(|(name, collection)| (name, collection.clone()))
        .collect()
}

fn validate_met(met: &MetConfig) -> Result<(), SystError> {
    match met
        .collections
        .iter()
        .find(|name| !COLLECTIONS.contains(&name.as_str()))
    {
        Some(name) => Err(SystError::configuration(
            "unknown_collection",
            "missing momentum cannot follow an unknown collection",
        )
        .with_context("collection", name.as_str())),
        None => Ok(()),
    }
}

impl Engine {
    /// Builds the providers of every configured collection.
    pub fn new(config: &RunConfig, table: Arc<dyn CorrectionTable>) -> Result<Self, SystError> {
        let kind = config.sample.kind;
        let name = config.sample.name.as_str();
        let jet_provider = |jets: &syst_jet::JetCorrectionConfig| {
            JetCorrectionProvider::new(jets, kind, name, Arc::clone(&table))
        };
        let engine = Self {
            jets: config.jets.as_ref().map(jet_provider).transpose()?,
            fat_jets: config.fat_jets.as_ref().map(jet_provider).transpose()?,
            muons: config
                .muons
                .clone()
                .map(|muons| MomentumScaleResolutionCorrector::new(muons, kind, Arc::clone(&table)))
                .transpose()?,
            electrons: config
                .electrons
                .clone()
                .map(|electrons| ElectronScaleProvider::new(electrons, kind, Arc::clone(&table)))
                .transpose()?,
            taus: config
                .taus
                .clone()
                .map(|taus| TauScaleProvider::new(taus, kind, Arc::clone(&table)))
                .transpose()?,
            met: config.met.clone(),
        };
        if let Some(met) = &engine.met {
            validate_met(met)?;
        }
        info!(collections = engine.collection_names().len(), "engine ready");
        Ok(engine)
    }

    /// Names of the configured collections.
    pub fn collection_names(&self) -> Vec<&'static str> {
        [
            ("jets", self.jets.is_some()),
            ("fat_jets", self.fat_jets.is_some()),
            ("muons", self.muons.is_some()),
            ("electrons", self.electrons.is_some()),
            ("taus", self.taus.is_some()),
            ("met", self.met.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, active)| active.then_some(name))
        .collect()
    }

    /// Corrects every configured collection present in `record`.
    pub fn process(&self, record: &EventRecord) -> Result<EventOutput, SystError> {
        let ctx = EventContext {
            event: record.event,
            lumi: record.lumi,
            run: record.run,
            rho: record.rho,
        };
        let mut variations = VariationSet::new();
        let mut stored: BTreeMap<&str, Collection> = BTreeMap::new();
        let mut warnings = DomainTally::new();
        let context = |err: SystError, collection: &str| {
            err.with_context("collection", collection)
                .with_context("event", record.event.to_string())
        };

        for (label, provider, inputs) in [
            ("jets", &self.jets, &record.jets),
            ("fat_jets", &self.fat_jets, &record.fat_jets),
        ] {
            if let (Some(provider), Some(inputs)) = (provider, inputs) {
                let out = provider
                    .shifted_p4(inputs, &ctx)
                    .map_err(|err| context(err, label))?;
                let named = out.matrix.named_with_year(provider.year())?;
                variations.insert(label, owned(named))?;
                stored.insert(label, inputs.stored_p4());
                warnings.merge(&out.tally);
            }
        }
        if let (Some(corrector), Some(inputs)) = (&self.muons, &record.muons) {
            let out = corrector
                .correct(inputs, record.event, record.lumi)
                .map_err(|err| context(err, "muons"))?;
            insert_matrix(&mut variations, "muons", &out.matrix)?;
            stored.insert("muons", inputs.stored_p4());
            warnings.merge(&out.tally);
        }
        if let (Some(provider), Some(inputs)) = (&self.electrons, &record.electrons) {
            let out = provider
                .correct(inputs, record.run)
                .map_err(|err| context(err, "electrons"))?;
            insert_matrix(&mut variations, "electrons", &out.matrix)?;
            stored.insert("electrons", inputs.stored_p4());
            warnings.merge(&out.tally);
        }
        if let (Some(provider), Some(inputs)) = (&self.taus, &record.taus) {
            let out = provider
                .correct(inputs)
                .map_err(|err| context(err, "taus"))?;
            insert_matrix(&mut variations, "taus", &out.matrix)?;
            stored.insert("taus", inputs.stored_p4());
            warnings.merge(&out.tally);
        }
        if let Some(met) = &self.met {
            let shifted = propagate_met(met, record, &variations, &stored)?;
            variations.insert("met", shifted)?;
        }

        let collections = variations.into_filled();
        debug!(
            event = record.event,
            collections = collections.len(),
            "event corrected"
        );
        Ok(EventOutput {
            event: record.event,
            lumi: record.lumi,
            run: record.run,
            collections,
            warnings,
        })
    }
}

fn insert_matrix(
    variations: &mut VariationSet,
    label: &str,
    matrix: &ResultMatrix,
) -> Result<(), SystError> {
    variations.insert(label, owned(matrix.named()?))
}

/// Missing momentum for the central entry and for every name defined by a
/// collection it follows. Other names are filled with the central value.
fn propagate_met(
    met: &MetConfig,
    record: &EventRecord,
    variations: &VariationSet,
    stored: &BTreeMap<&str, Collection>,
) -> Result<BTreeMap<String, Collection>, SystError> {
    let input = record.met.as_ref().ok_or_else(|| {
        SystError::input("missing_met", "event has no missing momentum")
            .with_context("event", record.event.to_string())
    })?;
    let nominal = PtEtaPhiM::new(input.pt, 0.0, input.phi, 0.0);
    let followed: Vec<&str> = met
        .collections
        .iter()
        .map(String::as_str)
        .filter(|name| stored.contains_key(name))
        .collect();
    let mut shifted = BTreeMap::new();
    for name in variations.names() {
        let touched = name == UncSource::Central.name()
            || followed.iter().any(|c| variations.defines(c, name));
        if !touched {
            continue;
        }
        let changes = followed.iter().filter_map(|c| {
            Some((stored.get(c)?.as_slice(), variations.get(c, name)?.as_slice()))
        });
        shifted.insert(name.to_string(), vec![shift_met(nominal, changes)]);
    }
    shifted
        .entry(UncSource::Central.name().to_string())
        .or_insert_with(|| vec![nominal]);
    Ok(shifted)
}
