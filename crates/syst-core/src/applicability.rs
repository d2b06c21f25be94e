//! Per-object applicability of uncertainty sources.
//!
//! Rules are data: a map from source to predicate over [`ObjectTraits`].
//! A source without a registered rule applies to every object.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::uncertainty::UncSource;

/// Generator-level lepton match category of a reconstructed lepton or tau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenLeptonMatch {
    /// Unmatched or matched to a jet.
    NoMatch,
    /// Prompt electron.
    Electron,
    /// Prompt muon.
    Muon,
    /// Electron from a tau decay.
    TauElectron,
    /// Muon from a tau decay.
    TauMuon,
    /// Hadronically decaying tau.
    Tau,
}

impl GenLeptonMatch {
    /// Maps the integer encoding (0 to 6) onto the category.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => GenLeptonMatch::Electron,
            2 => GenLeptonMatch::Muon,
            3 => GenLeptonMatch::TauElectron,
            4 => GenLeptonMatch::TauMuon,
            5 => GenLeptonMatch::Tau,
            _ => GenLeptonMatch::NoMatch,
        }
    }

    /// True for prompt electrons and electrons from tau decays.
    pub fn is_electron(self) -> bool {
        matches!(self, GenLeptonMatch::Electron | GenLeptonMatch::TauElectron)
    }

    /// True for prompt muons and muons from tau decays.
    pub fn is_muon(self) -> bool {
        matches!(self, GenLeptonMatch::Muon | GenLeptonMatch::TauMuon)
    }
}

/// Per-object attributes the applicability rules may inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTraits {
    /// Hadron flavour of the matched generator jet (0, 4 or 5).
    pub hadron_flavour: i32,
    /// Parton flavour (PDG id of the matched parton, 21 for gluons).
    pub parton_flavour: i32,
    /// Generator lepton match category.
    pub gen_match: GenLeptonMatch,
    /// Reconstructed tau decay mode, `-1` for non-tau objects.
    pub decay_mode: i32,
}

impl Default for ObjectTraits {
    fn default() -> Self {
        Self {
            hadron_flavour: 0,
            parton_flavour: 0,
            gen_match: GenLeptonMatch::NoMatch,
            decay_mode: -1,
        }
    }
}

impl ObjectTraits {
    /// Traits of a jet.
    pub fn jet(hadron_flavour: i32, parton_flavour: i32) -> Self {
        Self {
            hadron_flavour,
            parton_flavour,
            ..Self::default()
        }
    }

    /// Traits of a lepton with a generator match code.
    pub fn lepton(gen_match: i32) -> Self {
        Self {
            gen_match: GenLeptonMatch::from_code(gen_match),
            ..Self::default()
        }
    }

    /// Traits of a hadronic tau candidate.
    pub fn tau(gen_match: i32, decay_mode: i32) -> Self {
        Self {
            gen_match: GenLeptonMatch::from_code(gen_match),
            decay_mode,
            ..Self::default()
        }
    }
}

/// Predicate deciding whether a source shifts a given object.
pub type Predicate = Arc<dyn Fn(&ObjectTraits) -> bool + Send + Sync>;

/// Map from uncertainty source to applicability predicate.
#[derive(Clone, Default)]
pub struct ApplicabilityTable {
    rules: BTreeMap<UncSource, Predicate>,
}

impl fmt::Debug for ApplicabilityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicabilityTable")
            .field("sources", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ApplicabilityTable {
    /// Table with no rules: every source applies to every object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules used by the jet and lepton providers.
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.insert(UncSource::JesFlavorPureGluon, |t| t.parton_flavour == 21);
        table.insert(UncSource::JesFlavorPureQuark, |t| {
            (1..=3).contains(&t.parton_flavour.abs())
        });
        table.insert(UncSource::JesFlavorPureCharm, |t| t.hadron_flavour == 4);
        table.insert(UncSource::JesFlavorPureBottom, |t| t.hadron_flavour == 5);

        table.insert(UncSource::EleEs, |t| t.gen_match.is_electron());

        table.insert(UncSource::TauEsDm0, |t| {
            t.gen_match == GenLeptonMatch::Tau && t.decay_mode == 0
        });
        table.insert(UncSource::TauEsDm1, |t| {
            t.gen_match == GenLeptonMatch::Tau && t.decay_mode == 1
        });
        table.insert(UncSource::TauEs3prong, |t| {
            t.gen_match == GenLeptonMatch::Tau && matches!(t.decay_mode, 10 | 11)
        });
        table.insert(UncSource::EleFakingTauEsDm0, |t| {
            t.gen_match.is_electron() && t.decay_mode == 0
        });
        table.insert(UncSource::EleFakingTauEsDm1, |t| {
            t.gen_match.is_electron() && t.decay_mode == 1
        });
        table.insert(UncSource::MuFakingTauEs, |t| t.gen_match.is_muon());
        table
    }

    /// Registers or replaces the rule for `source`.
    pub fn insert<F>(&mut self, source: UncSource, predicate: F)
    where
        F: Fn(&ObjectTraits) -> bool + Send + Sync + 'static,
    {
        self.rules.insert(source, Arc::new(predicate));
    }

    /// Removes the rule for `source`, making it apply to every object.
    pub fn remove(&mut self, source: UncSource) {
        self.rules.remove(&source);
    }

    /// True if a dedicated rule is registered for `source`.
    pub fn has_rule(&self, source: UncSource) -> bool {
        self.rules.contains_key(&source)
    }

    /// Returns whether `source` shifts an object with `traits`.
    pub fn applies(&self, source: UncSource, traits: &ObjectTraits) -> bool {
        self.rules
            .get(&source)
            .map_or(true, |predicate| predicate(traits))
    }
}
