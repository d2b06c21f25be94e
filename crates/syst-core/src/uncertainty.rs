//! Uncertainty sources, variation scales and systematic naming.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, SystError};

/// Direction of a systematic variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UncScale {
    /// Downward variation.
    Down,
    /// No variation.
    Central,
    /// Upward variation.
    Up,
}

impl UncScale {
    /// The two non-central scales in the order variations are produced.
    pub const VARIATIONS: [UncScale; 2] = [UncScale::Up, UncScale::Down];

    /// Integer sign used in linear shift formulas.
    pub fn sign(self) -> i32 {
        match self {
            UncScale::Down => -1,
            UncScale::Central => 0,
            UncScale::Up => 1,
        }
    }

    /// Sign as a floating point factor.
    pub fn signf(self) -> f64 {
        f64::from(self.sign())
    }

    /// Name used as syst-name suffix.
    pub fn as_str(self) -> &'static str {
        match self {
            UncScale::Down => "Down",
            UncScale::Central => "Central",
            UncScale::Up => "Up",
        }
    }
}

impl fmt::Display for UncScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an event comes from recorded collisions or from simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SampleKind {
    /// Recorded collision data.
    Data,
    /// Simulated events.
    Simulation,
}

impl SampleKind {
    /// Returns true for recorded data.
    pub fn is_data(self) -> bool {
        self == SampleKind::Data
    }
}

/// Closed set of recognised systematic uncertainty sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UncSource {
    /// No variation.
    #[serde(rename = "Central")]
    Central,
    /// Jet energy resolution.
    #[serde(rename = "JER")]
    Jer,
    /// Total jet energy scale uncertainty.
    #[serde(rename = "JES_Total")]
    JesTotal,
    /// Regrouped JES: relative balance.
    #[serde(rename = "JES_RelativeBal")]
    JesRelativeBal,
    /// Regrouped JES: forward calorimeter.
    #[serde(rename = "JES_HF")]
    JesHf,
    /// Regrouped JES: barrel and first endcap.
    #[serde(rename = "JES_BBEC1")]
    JesBbec1,
    /// Regrouped JES: second endcap.
    #[serde(rename = "JES_EC2")]
    JesEc2,
    /// Regrouped JES: absolute scale.
    #[serde(rename = "JES_Absolute")]
    JesAbsolute,
    /// Regrouped JES: flavour response.
    #[serde(rename = "JES_FlavorQCD")]
    JesFlavorQcd,
    /// Year-dependent barrel and first endcap.
    #[serde(rename = "JES_BBEC1_year")]
    JesBbec1Year,
    /// Year-dependent absolute scale.
    #[serde(rename = "JES_Absolute_year")]
    JesAbsoluteYear,
    /// Year-dependent second endcap.
    #[serde(rename = "JES_EC2_year")]
    JesEc2Year,
    /// Year-dependent forward calorimeter statistics.
    #[serde(rename = "JES_HF_year")]
    JesHfYear,
    /// Year-dependent relative sample.
    #[serde(rename = "JES_RelativeSample_year")]
    JesRelativeSampleYear,
    /// Pure-flavour response for gluon jets.
    #[serde(rename = "JES_FlavorPureGluon")]
    JesFlavorPureGluon,
    /// Pure-flavour response for light quark jets.
    #[serde(rename = "JES_FlavorPureQuark")]
    JesFlavorPureQuark,
    /// Pure-flavour response for charm jets.
    #[serde(rename = "JES_FlavorPureCharm")]
    JesFlavorPureCharm,
    /// Pure-flavour response for bottom jets.
    #[serde(rename = "JES_FlavorPureBottom")]
    JesFlavorPureBottom,
    /// Muon momentum scale.
    #[serde(rename = "ScaRe_Scale")]
    MuonScale,
    /// Muon momentum resolution.
    #[serde(rename = "ScaRe_Resolution")]
    MuonResolution,
    /// Electron energy scale.
    #[serde(rename = "EleES")]
    EleEs,
    /// Genuine tau energy scale, decay mode 0.
    #[serde(rename = "TauES_DM0")]
    TauEsDm0,
    /// Genuine tau energy scale, decay mode 1.
    #[serde(rename = "TauES_DM1")]
    TauEsDm1,
    /// Genuine tau energy scale, three-prong decay modes.
    #[serde(rename = "TauES_3prong")]
    TauEs3prong,
    /// Electrons reconstructed as taus, decay mode 0.
    #[serde(rename = "EleFakingTauES_DM0")]
    EleFakingTauEsDm0,
    /// Electrons reconstructed as taus, decay mode 1.
    #[serde(rename = "EleFakingTauES_DM1")]
    EleFakingTauEsDm1,
    /// Muons reconstructed as taus.
    #[serde(rename = "MuFakingTauES")]
    MuFakingTauEs,
}

impl UncSource {
    /// Every source, `Central` first.
    pub const ALL: [UncSource; 27] = [
        UncSource::Central,
        UncSource::Jer,
        UncSource::JesTotal,
        UncSource::JesRelativeBal,
        UncSource::JesHf,
        UncSource::JesBbec1,
        UncSource::JesEc2,
        UncSource::JesAbsolute,
        UncSource::JesFlavorQcd,
        UncSource::JesBbec1Year,
        UncSource::JesAbsoluteYear,
        UncSource::JesEc2Year,
        UncSource::JesHfYear,
        UncSource::JesRelativeSampleYear,
        UncSource::JesFlavorPureGluon,
        UncSource::JesFlavorPureQuark,
        UncSource::JesFlavorPureCharm,
        UncSource::JesFlavorPureBottom,
        UncSource::MuonScale,
        UncSource::MuonResolution,
        UncSource::EleEs,
        UncSource::TauEsDm0,
        UncSource::TauEsDm1,
        UncSource::TauEs3prong,
        UncSource::EleFakingTauEsDm0,
        UncSource::EleFakingTauEsDm1,
        UncSource::MuFakingTauEs,
    ];

    /// Stable name used in syst names and configuration files.
    pub fn name(self) -> &'static str {
        match self {
            UncSource::Central => "Central",
            UncSource::Jer => "JER",
            UncSource::JesTotal => "JES_Total",
            UncSource::JesRelativeBal => "JES_RelativeBal",
            UncSource::JesHf => "JES_HF",
            UncSource::JesBbec1 => "JES_BBEC1",
            UncSource::JesEc2 => "JES_EC2",
            UncSource::JesAbsolute => "JES_Absolute",
            UncSource::JesFlavorQcd => "JES_FlavorQCD",
            UncSource::JesBbec1Year => "JES_BBEC1_year",
            UncSource::JesAbsoluteYear => "JES_Absolute_year",
            UncSource::JesEc2Year => "JES_EC2_year",
            UncSource::JesHfYear => "JES_HF_year",
            UncSource::JesRelativeSampleYear => "JES_RelativeSample_year",
            UncSource::JesFlavorPureGluon => "JES_FlavorPureGluon",
            UncSource::JesFlavorPureQuark => "JES_FlavorPureQuark",
            UncSource::JesFlavorPureCharm => "JES_FlavorPureCharm",
            UncSource::JesFlavorPureBottom => "JES_FlavorPureBottom",
            UncSource::MuonScale => "ScaRe_Scale",
            UncSource::MuonResolution => "ScaRe_Resolution",
            UncSource::EleEs => "EleES",
            UncSource::TauEsDm0 => "TauES_DM0",
            UncSource::TauEsDm1 => "TauES_DM1",
            UncSource::TauEs3prong => "TauES_3prong",
            UncSource::EleFakingTauEsDm0 => "EleFakingTauES_DM0",
            UncSource::EleFakingTauEsDm1 => "EleFakingTauES_DM1",
            UncSource::MuFakingTauEs => "MuFakingTauES",
        }
    }

    /// Name with the `year` placeholder replaced, e.g. `JES_BBEC1_2018`.
    pub fn label(self, year: &str) -> String {
        if self.is_year_dependent() {
            self.name().replace("year", year)
        } else {
            self.name().to_string()
        }
    }

    /// True for sources whose shift is driven by a resolution estimate.
    pub fn is_resolution(self) -> bool {
        matches!(self, UncSource::Jer | UncSource::MuonResolution)
    }

    /// True for JES components that are decorrelated between years.
    pub fn is_year_dependent(self) -> bool {
        matches!(
            self,
            UncSource::JesBbec1Year
                | UncSource::JesAbsoluteYear
                | UncSource::JesEc2Year
                | UncSource::JesHfYear
                | UncSource::JesRelativeSampleYear
        )
    }

    /// Recognises a year-labelled name such as `JES_BBEC1_2018`.
    fn from_label(label: &str) -> Option<UncSource> {
        UncSource::ALL
            .iter()
            .copied()
            .filter(|source| source.is_year_dependent())
            .find(|source| {
                let prefix = source.name().trim_end_matches("year");
                label.strip_prefix(prefix).is_some_and(|year| {
                    !year.is_empty() && year.chars().all(|c| c.is_ascii_alphanumeric())
                })
            })
    }
}

impl fmt::Display for UncSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UncSource {
    type Err = SystError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UncSource::ALL
            .iter()
            .copied()
            .find(|source| source.name() == s)
            .ok_or_else(|| {
                SystError::Configuration(
                    ErrorInfo::new("unknown_source", "unrecognised uncertainty source")
                        .with_context("source", s),
                )
            })
    }
}

/// Formats the systematic name for a (source, scale) pair.
///
/// `Central` is only valid with the central scale and every other source only
/// with `Up` or `Down`. Year-dependent sources keep the `year` placeholder;
/// use [`syst_label`] for names written to output.
pub fn syst_name(source: UncSource, scale: UncScale) -> Result<String, SystError> {
    syst_label(source, scale, "year")
}

/// Formats the systematic name with `year` substituted into year-dependent
/// sources, e.g. `JES_BBEC1_2018Up`.
pub fn syst_label(source: UncSource, scale: UncScale, year: &str) -> Result<String, SystError> {
    match (source, scale) {
        (UncSource::Central, UncScale::Central) => Ok(UncSource::Central.name().to_string()),
        (UncSource::Central, _) | (_, UncScale::Central) => Err(inconsistent_pair(source, scale)),
        (source, scale) => Ok(format!("{}{}", source.label(year), scale.as_str())),
    }
}

/// Splits a systematic name back into its (source, scale) pair.
///
/// Accepts both the placeholder form (`JES_BBEC1_yearUp`) and the
/// year-labelled form (`JES_BBEC1_2018Up`).
pub fn split_syst_name(name: &str) -> Result<(UncSource, UncScale), SystError> {
    if name == UncSource::Central.name() {
        return Ok((UncSource::Central, UncScale::Central));
    }
    for scale in UncScale::VARIATIONS {
        let Some(stem) = name.strip_suffix(scale.as_str()) else {
            continue;
        };
        let source = match stem.parse::<UncSource>() {
            Ok(source) => source,
            Err(err) => UncSource::from_label(stem).ok_or(err)?,
        };
        if source != UncSource::Central {
            return Ok((source, scale));
        }
    }
    Err(SystError::Configuration(
        ErrorInfo::new("unsplittable_syst_name", "cannot split systematic name")
            .with_context("name", name),
    ))
}

pub(crate) fn inconsistent_pair(source: UncSource, scale: UncScale) -> SystError {
    SystError::Configuration(
        ErrorInfo::new(
            "inconsistent_variation",
            "inconsistent source and scale combination",
        )
        .with_context("source", source.name())
        .with_context("scale", scale.as_str()),
    )
}
