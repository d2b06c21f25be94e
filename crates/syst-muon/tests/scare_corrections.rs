mod support;

use approx::assert_relative_eq;
use proptest::prelude::*;
use syst_core::sampler::{deterministic_draw, CrystalBall, CrystalBallShape, SeedKey};
use syst_core::{DomainWarning, SampleKind, UncScale, UncSource};
use syst_muon::{MomentumScaleResolutionCorrector, MuonScaReConfig};

use support::{muons, table, table_with, Params};

fn corrector(sample: SampleKind) -> MomentumScaleResolutionCorrector {
    MomentumScaleResolutionCorrector::new(MuonScaReConfig::default(), sample, table())
        .expect("corrector")
}

fn unit_draw(event: u64, lumi: u64, phi: f64) -> f64 {
    let dist = CrystalBall::new(CrystalBallShape::unit()).expect("unit shape");
    deterministic_draw(&dist, SeedKey::new(event, lumi, phi))
}

fn residual_k(p: &Params) -> f64 {
    (p.k_data * p.k_data - p.k_mc * p.k_mc).sqrt()
}

#[test]
fn low_pt_muon_is_identical_in_data_and_simulation() {
    let inputs = muons(&[10.0], &[0.5], &[0.0]);
    let data = corrector(SampleKind::Data).correct(&inputs, 1, 1).expect("data");
    let mc = corrector(SampleKind::Simulation)
        .correct(&inputs, 1, 1)
        .expect("mc");
    assert_eq!(data.matrix.central()[0].pt, 10.0);
    assert_eq!(mc.matrix.central()[0].pt, 10.0);
    assert_eq!(mc.tally.count(DomainWarning::BelowThreshold), 1);
    for source in [UncSource::MuonScale, UncSource::MuonResolution] {
        for scale in UncScale::VARIATIONS {
            assert_eq!(mc.matrix.get(source, scale).expect("variant")[0].pt, 10.0);
        }
    }
}

#[test]
fn data_gets_scale_correction_only() {
    let out = corrector(SampleKind::Data)
        .correct(&muons(&[40.0], &[0.5], &[0.3]), 1, 1)
        .expect("data");
    let p = Params::default();
    assert_relative_eq!(
        out.matrix.central()[0].pt,
        1.0 / (p.m_data / 40.0 + p.a_data),
        max_relative = 1e-12
    );
    assert_eq!(out.matrix.len(), 1);
    assert_eq!(out.aux[0].k, 0.0);
}

#[test]
fn simulation_is_scaled_then_smeared() {
    let out = corrector(SampleKind::Simulation)
        .correct(&muons(&[40.0], &[0.5], &[0.0]), 1, 1)
        .expect("mc");
    let p = Params::default();
    let scaled = 1.0 / (p.m_mc / 40.0 + p.a_mc);
    let k = residual_k(&p);
    let draw = unit_draw(1, 1, 0.0);
    assert!(draw > 0.0 && draw < 0.1);
    assert_relative_eq!(out.aux[0].scaled_pt, scaled, max_relative = 1e-12);
    assert_relative_eq!(out.aux[0].k, k, max_relative = 1e-12);
    assert_relative_eq!(
        out.matrix.central()[0].pt,
        scaled * (1.0 + k * p.std * draw),
        max_relative = 1e-12
    );
    assert_eq!(out.matrix.central()[0].mass, 0.1057);
    assert!(out.tally.is_empty());
}

#[test]
fn negative_charge_flips_the_additive_term() {
    let mut inputs = muons(&[40.0], &[0.5], &[0.3]);
    inputs.charge = vec![-1];
    let out = corrector(SampleKind::Data).correct(&inputs, 1, 1).expect("data");
    let p = Params::default();
    assert_relative_eq!(
        out.matrix.central()[0].pt,
        1.0 / (p.m_data / 40.0 - p.a_data),
        max_relative = 1e-12
    );
}

#[test]
fn scale_variation_follows_the_statistical_uncertainty() {
    let out = corrector(SampleKind::Simulation)
        .correct(&muons(&[40.0], &[0.5], &[0.0]), 1, 1)
        .expect("mc");
    let p = Params::default();
    let aux = out.aux[0];
    let pt = aux.scaled_pt;
    let unc = pt
        * pt
        * (p.m_stat * p.m_stat / (pt * pt)
            + p.a_stat * p.a_stat
            + 2.0 * p.rho_stat * p.m_stat * p.a_stat / pt)
            .sqrt();
    let up = out.matrix.get(UncSource::MuonScale, UncScale::Up).expect("up")[0].pt;
    let down = out.matrix.get(UncSource::MuonScale, UncScale::Down).expect("down")[0].pt;
    assert_relative_eq!(up, (pt + unc) * aux.smear_ratio(), max_relative = 1e-12);
    assert_relative_eq!(down, (pt - unc) * aux.smear_ratio(), max_relative = 1e-12);
    assert!(up > out.matrix.central()[0].pt);
}

#[test]
fn resolution_variation_shifts_k_by_its_uncertainty() {
    let out = corrector(SampleKind::Simulation)
        .correct(&muons(&[40.0], &[0.5], &[0.0]), 1, 1)
        .expect("mc");
    let p = Params::default();
    let aux = out.aux[0];
    let k = residual_k(&p);
    let width = p.std * unit_draw(1, 1, 0.0);
    let up = out
        .matrix
        .get(UncSource::MuonResolution, UncScale::Up)
        .expect("up")[0]
        .pt;
    let down = out
        .matrix
        .get(UncSource::MuonResolution, UncScale::Down)
        .expect("down")[0]
        .pt;
    let expected = |k_var: f64| aux.scaled_pt * (1.0 + k_var * width);
    assert_relative_eq!(up, expected(k + p.k_mc_stat), max_relative = 1e-12);
    assert_relative_eq!(down, expected(k - p.k_mc_stat), max_relative = 1e-12);
}

#[test]
fn no_residual_smearing_when_simulation_is_wider() {
    let params = Params {
        k_mc: 1.5,
        ..Params::default()
    };
    let corrector = MomentumScaleResolutionCorrector::new(
        MuonScaReConfig::default(),
        SampleKind::Simulation,
        table_with(params),
    )
    .expect("corrector");
    let out = corrector
        .correct(&muons(&[40.0], &[0.5], &[0.0]), 1, 1)
        .expect("mc");
    let central = out.matrix.central()[0];
    assert_eq!(central.pt, out.aux[0].scaled_pt);
    for scale in UncScale::VARIATIONS {
        let variant = out.matrix.get(UncSource::MuonResolution, scale).expect("variant");
        assert_eq!(variant[0], central);
    }
}

#[test]
fn unphysical_smear_reverts_to_the_scaled_pt() {
    let params = Params {
        std: 1000.0,
        ..Params::default()
    };
    let corrector = MomentumScaleResolutionCorrector::new(
        MuonScaReConfig::default(),
        SampleKind::Simulation,
        table_with(params),
    )
    .expect("corrector");
    let out = corrector
        .correct(&muons(&[40.0], &[0.5], &[0.0]), 1, 1)
        .expect("mc");
    assert_eq!(out.matrix.central()[0].pt, out.aux[0].scaled_pt);
    assert_eq!(out.aux[0].smear_width, 0.0);
    assert_eq!(out.tally.count(DomainWarning::RatioOutOfBand), 1);
    let up = out.matrix.get(UncSource::MuonResolution, UncScale::Up).expect("up");
    assert_eq!(up[0].pt, out.aux[0].scaled_pt);
}

#[test]
fn unusable_smearing_shape_keeps_the_scaled_pt() {
    let params = Params {
        cb_sigma: 0.0,
        ..Params::default()
    };
    let corrector = MomentumScaleResolutionCorrector::new(
        MuonScaReConfig::default(),
        SampleKind::Simulation,
        table_with(params),
    )
    .expect("corrector");
    let out = corrector
        .correct(&muons(&[40.0, 60.0], &[0.5, -1.1], &[0.0, 1.3]), 3, 2)
        .expect("shape problems do not abort the event");
    assert_eq!(out.tally.count(DomainWarning::InvalidShape), 2);
    for (muon, aux) in out.matrix.central().iter().zip(&out.aux) {
        assert_eq!(muon.pt, aux.scaled_pt);
        assert_eq!(aux.smear_width, 0.0);
    }
    let up = out.matrix.get(UncSource::MuonResolution, UncScale::Up).expect("up");
    assert_eq!(up[0].pt, out.aux[0].scaled_pt);
}

#[test]
fn muons_above_the_validated_range_are_not_smeared() {
    let out = corrector(SampleKind::Simulation)
        .correct(&muons(&[250.0], &[0.5], &[0.0]), 1, 1)
        .expect("mc");
    assert_eq!(out.matrix.central()[0].pt, out.aux[0].scaled_pt);
    assert_eq!(out.tally.count(DomainWarning::AboveThreshold), 1);
}

#[test]
fn variations_can_be_switched_off() {
    let config = MuonScaReConfig {
        return_variations: false,
        ..MuonScaReConfig::default()
    };
    let corrector =
        MomentumScaleResolutionCorrector::new(config, SampleKind::Simulation, table())
            .expect("corrector");
    assert!(corrector.sources().is_empty());
    let out = corrector
        .correct(&muons(&[40.0], &[0.5], &[0.0]), 1, 1)
        .expect("mc");
    assert_eq!(out.matrix.len(), 1);
}

#[test]
fn missing_simulation_tables_fail_at_construction() {
    let doc = support::document(Params::default()).replace("name: k_mc", "name: k_mc_v2");
    let table = std::sync::Arc::new(
        syst_table::TableSet::from_yaml_slice(doc.as_bytes()).expect("table"),
    );
    let err = MomentumScaleResolutionCorrector::new(
        MuonScaReConfig::default(),
        SampleKind::Simulation,
        table.clone(),
    )
    .expect_err("k_mc is missing");
    assert_eq!(err.info().code, "missing_correction");
    assert_eq!(err.info().context.get("key").map(String::as_str), Some("k_mc"));
    MomentumScaleResolutionCorrector::new(MuonScaReConfig::default(), SampleKind::Data, table)
        .expect("data only needs the scale tables");
}

#[test]
fn invalid_inputs_are_rejected() {
    let mut inputs = muons(&[40.0], &[0.5], &[0.0]);
    inputs.charge = vec![0];
    let err = corrector(SampleKind::Data)
        .correct(&inputs, 1, 1)
        .expect_err("zero charge");
    assert_eq!(err.info().code, "invalid_charge");
    let mut inputs = muons(&[40.0, 50.0], &[0.5, 0.1], &[0.0, 1.0]);
    inputs.n_tracker_layers.pop();
    let err = corrector(SampleKind::Simulation)
        .correct(&inputs, 1, 1)
        .expect_err("misaligned");
    assert_eq!(err.info().code, "misaligned_arrays");
}

#[test]
fn config_yaml_fills_defaults() {
    let config: MuonScaReConfig =
        serde_yaml::from_str("keys: { k_mc: k_mc_2024 }\nmax_pt: 300\n").expect("config");
    assert_eq!(config.low_pt_threshold, 26.0);
    assert_eq!(config.max_pt, 300.0);
    assert_eq!(config.keys.k_mc, "k_mc_2024");
    assert_eq!(config.keys.a_data, "a_data");
    assert!(config.return_variations);
}

proptest! {
    #[test]
    fn smearing_depends_only_on_the_object_key(
        pt in 26.0_f64..180.0,
        eta in -2.4_f64..2.4,
        phi in -3.14_f64..3.14,
        event in any::<u64>(),
        lumi in any::<u64>(),
    ) {
        let corrector = corrector(SampleKind::Simulation);
        let single = corrector.correct(&muons(&[pt], &[eta], &[phi]), event, lumi).expect("single");
        let paired = corrector
            .correct(&muons(&[45.0, pt], &[0.1, eta], &[-1.0, phi]), event, lumi)
            .expect("paired");
        prop_assert_eq!(single.matrix.central()[0], paired.matrix.central()[1]);
        prop_assert_eq!(single.aux[0], paired.aux[1]);
    }

    #[test]
    fn nominal_stays_inside_the_ratio_band(
        pt in 26.0_f64..180.0,
        eta in -2.4_f64..2.4,
        phi in -3.14_f64..3.14,
        event in any::<u64>(),
    ) {
        let out = corrector(SampleKind::Simulation)
            .correct(&muons(&[pt], &[eta], &[phi]), event, 3)
            .expect("mc");
        let aux = out.aux[0];
        let ratio = out.matrix.central()[0].pt / aux.scaled_pt;
        prop_assert!((0.1..=2.0).contains(&ratio));
    }
}
