//! Data-taking periods and the extra inputs their compound corrections expect.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use syst_core::errors::{ErrorInfo, SystError};
use syst_core::SampleKind;

/// Data-taking period a correction set was derived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataPeriod {
    /// Any Run 2 era.
    #[default]
    #[serde(rename = "Run2")]
    Run2,
    /// 2022 before the endcap issue.
    #[serde(rename = "2022")]
    Run3_2022,
    /// 2022 after the endcap issue.
    #[serde(rename = "2022EE")]
    Run3_2022EE,
    /// 2023 before the barrel pixel issue.
    #[serde(rename = "2023")]
    Run3_2023,
    /// 2023 after the barrel pixel issue.
    #[serde(rename = "2023BPix")]
    Run3_2023BPix,
    /// 2024.
    #[serde(rename = "2024")]
    Run3_2024,
}

impl DataPeriod {
    /// Short tag used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            DataPeriod::Run2 => "Run2",
            DataPeriod::Run3_2022 => "2022",
            DataPeriod::Run3_2022EE => "2022EE",
            DataPeriod::Run3_2023 => "2023",
            DataPeriod::Run3_2023BPix => "2023BPix",
            DataPeriod::Run3_2024 => "2024",
        }
    }

    /// Maps an analysis period label such as `2023_Summer23BPix` onto a period.
    pub fn from_label(label: &str) -> Result<Self, SystError> {
        let (year, campaign) = label.split_once('_').unwrap_or((label, ""));
        let period = match year {
            "2016preVFP" | "2016postVFP" | "2016" | "2017" | "2018" => DataPeriod::Run2,
            "2022" if campaign.ends_with("EE") => DataPeriod::Run3_2022EE,
            "2022" => DataPeriod::Run3_2022,
            "2023" if campaign.ends_with("BPix") => DataPeriod::Run3_2023BPix,
            "2023" => DataPeriod::Run3_2023,
            "2024" => DataPeriod::Run3_2024,
            _ => return Err(unsupported_period(label)),
        };
        Ok(period)
    }

    /// Extra compound-correction inputs for this period and sample kind.
    pub fn compound_layout(self, sample: SampleKind) -> CompoundLayout {
        match (self, sample) {
            (DataPeriod::Run2 | DataPeriod::Run3_2022 | DataPeriod::Run3_2022EE, _) => {
                CompoundLayout::BASE
            }
            (DataPeriod::Run3_2023, SampleKind::Data) => CompoundLayout::new(false, true),
            (DataPeriod::Run3_2023, SampleKind::Simulation) => CompoundLayout::BASE,
            (DataPeriod::Run3_2023BPix, SampleKind::Data) => CompoundLayout::new(true, true),
            (DataPeriod::Run3_2023BPix, SampleKind::Simulation) => CompoundLayout::new(false, true),
            (DataPeriod::Run3_2024, SampleKind::Data) => CompoundLayout::new(true, true),
            (DataPeriod::Run3_2024, SampleKind::Simulation) => CompoundLayout::new(true, false),
        }
    }
}

impl fmt::Display for DataPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataPeriod {
    type Err = SystError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Run2" => Ok(DataPeriod::Run2),
            "2022" => Ok(DataPeriod::Run3_2022),
            "2022EE" => Ok(DataPeriod::Run3_2022EE),
            "2023" => Ok(DataPeriod::Run3_2023),
            "2023BPix" => Ok(DataPeriod::Run3_2023BPix),
            "2024" => Ok(DataPeriod::Run3_2024),
            other => DataPeriod::from_label(other),
        }
    }
}

fn unsupported_period(label: &str) -> SystError {
    SystError::Configuration(
        ErrorInfo::new("unsupported_period", "no compound layout known for this period")
            .with_context("period", label),
    )
}

/// Optional trailing inputs of the compound correction after `(area, eta, pt, rho)`.
///
/// When both are present the azimuth precedes the run number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompoundLayout {
    /// Append the object azimuth.
    #[serde(default)]
    pub with_phi: bool,
    /// Append the run number.
    #[serde(default)]
    pub with_run: bool,
}

impl CompoundLayout {
    /// Four-input layout.
    pub const BASE: CompoundLayout = CompoundLayout {
        with_phi: false,
        with_run: false,
    };

    /// Creates a layout.
    pub const fn new(with_phi: bool, with_run: bool) -> Self {
        Self { with_phi, with_run }
    }

    /// Number of positional arguments passed to the compound correction.
    pub fn arity(self) -> usize {
        4 + usize::from(self.with_phi) + usize::from(self.with_run)
    }
}

/// Rule deriving the data JEC tag from a sample name.
///
/// Sample names end either in an era letter (`Muon_Run2022F`) or in an era
/// letter plus version token (`Muon_Run2023C_v4`). The resolved letter and
/// version are substituted for `{}` in `template`. Compound entries such as
/// `CD` or `v123` are matched when the sample's token is a unique substring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTagRule {
    /// Tag with a single `{}` placeholder.
    pub template: String,
    /// Era letter groups the tag set is split into.
    pub letters: Vec<String>,
    /// Version groups; empty when tags are not split by version.
    #[serde(default)]
    pub versions: Vec<String>,
}

impl DataTagRule {
    /// Resolves the tag for `sample_name`.
    pub fn resolve(&self, sample_name: &str) -> Result<String, SystError> {
        let last = sample_name.chars().last().ok_or_else(|| bad_sample(sample_name))?;
        let (letter, version) = if last.is_ascii_alphabetic() {
            (last.to_string(), String::new())
        } else if last.is_ascii_digit() {
            let mut tokens = sample_name.rsplit('_');
            let version = tokens.next().unwrap_or_default().to_string();
            let letter = tokens
                .next()
                .and_then(|token| token.chars().last())
                .map(String::from)
                .unwrap_or_default();
            (letter, version)
        } else {
            (String::new(), String::new())
        };
        if letter.is_empty() && version.is_empty() {
            return Err(bad_sample(sample_name));
        }

        let letter = unique_group(&self.letters, &letter, "letter", sample_name)?;
        let version = if self.versions.is_empty() {
            version
        } else {
            unique_group(&self.versions, &version, "version", sample_name)?
        };
        Ok(self.template.replacen("{}", &format!("{letter}{version}"), 1))
    }
}

fn unique_group(
    groups: &[String],
    token: &str,
    what: &str,
    sample_name: &str,
) -> Result<String, SystError> {
    if groups.iter().any(|group| group == token) {
        return Ok(token.to_string());
    }
    let matches: Vec<&String> = groups.iter().filter(|group| group.contains(token)).collect();
    match matches.as_slice() {
        [only] => Ok((*only).clone()),
        _ => Err(SystError::Configuration(
            ErrorInfo::new("ambiguous_era", "cannot deduce the data era from the sample name")
                .with_context("sample", sample_name)
                .with_context("field", what)
                .with_context("candidates", matches.len().to_string()),
        )),
    }
}

fn bad_sample(sample_name: &str) -> SystError {
    SystError::Configuration(
        ErrorInfo::new("unexpected_sample_name", "sample name does not end in an era token")
            .with_context("sample", sample_name)
            .with_hint("expected base_letter or base_letter_version"),
    )
}
