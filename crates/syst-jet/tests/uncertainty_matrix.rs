mod support;

use approx::assert_relative_eq;
use proptest::prelude::*;
use syst_core::{ApplicabilityTable, SampleKind, UncScale, UncSource};
use syst_jet::{
    EventContext, JetCorrectionProvider, RegionExclusionPolicy, UncertaintyCatalog, UncertaintyMode,
};

use support::{config, jets, table, table_with, Values, JER_TAG};

fn ctx() -> EventContext {
    EventContext {
        event: 987_654,
        lumi: 12,
        run: 1,
        rho: 15.0,
    }
}

#[test]
fn simulation_matrix_has_central_plus_two_entries_per_source() {
    let provider = JetCorrectionProvider::new(&config(), SampleKind::Simulation, "sample", table())
        .expect("provider");
    let out = provider
        .shifted_p4(&jets(&[100.0, 45.0], &[0.4, -1.7], &[0.1, 2.2]), &ctx())
        .expect("matrix");
    assert_eq!(provider.sources(), vec![UncSource::Jer, UncSource::JesTotal]);
    assert_eq!(out.matrix.len(), 5);
    let names: Vec<String> = out.matrix.named().expect("names").into_keys().collect();
    assert_eq!(names, ["Central", "JERDown", "JERUp", "JES_TotalDown", "JES_TotalUp"]);
}

#[test]
fn data_matrix_holds_only_central() {
    let provider = JetCorrectionProvider::new(&config(), SampleKind::Data, "Jet_Run2022D", table())
        .expect("provider");
    let out = provider
        .shifted_p4(&jets(&[100.0], &[0.4], &[0.1]), &ctx())
        .expect("matrix");
    assert_eq!(out.matrix.len(), 1);
    assert!(provider.sources().is_empty());
}

#[test]
fn jer_disabled_drops_resolution_entries() {
    let mut cfg = config();
    cfg.apply_jer = false;
    let provider = JetCorrectionProvider::new(&cfg, SampleKind::Simulation, "sample", table())
        .expect("provider");
    let out = provider
        .shifted_p4(&jets(&[100.0], &[0.4], &[0.1]), &ctx())
        .expect("matrix");
    assert!(out.matrix.get(UncSource::Jer, UncScale::Up).is_none());
    assert!(out.matrix.get(UncSource::JesTotal, UncScale::Up).is_some());
}

#[test]
fn jes_shift_is_linear_in_the_uncertainty() {
    let provider = JetCorrectionProvider::new(&config(), SampleKind::Simulation, "sample", table())
        .expect("provider");
    let out = provider
        .shifted_p4(&jets(&[100.0], &[0.4], &[0.1]), &ctx())
        .expect("matrix");
    let central = out.matrix.central()[0];
    let up = out.matrix.get(UncSource::JesTotal, UncScale::Up).expect("up")[0];
    let down = out.matrix.get(UncSource::JesTotal, UncScale::Down).expect("down")[0];
    assert_relative_eq!(up.pt, central.pt * 1.03, epsilon = 1e-9);
    assert_relative_eq!(down.pt, central.pt * 0.97, epsilon = 1e-9);
    assert_relative_eq!(up.mass, central.mass * 1.03, epsilon = 1e-9);
    assert_eq!(up.eta, central.eta);
    assert_eq!(up.phi, central.phi);
}

#[test]
fn jer_shift_uses_the_resolution() {
    let provider = JetCorrectionProvider::new(&config(), SampleKind::Simulation, "sample", table())
        .expect("provider");
    let out = provider
        .shifted_p4(&jets(&[100.0], &[0.4], &[0.1]), &ctx())
        .expect("matrix");
    let central = out.matrix.central()[0];
    let up = out.matrix.get(UncSource::Jer, UncScale::Up).expect("up")[0];
    assert_relative_eq!(up.pt, central.pt * 1.1, epsilon = 1e-9);
}

#[test]
fn horn_jet_jer_variants_equal_central() {
    let provider = JetCorrectionProvider::new(&config(), SampleKind::Simulation, "sample", table())
        .expect("provider");
    let mut inputs = jets(&[100.0, 80.0], &[2.8, 1.0], &[0.5, -0.5]);
    inputs.gen_jet_idx = vec![0, 1];
    inputs.gen_jet_pt = vec![95.0, 78.0];
    let out = provider.shifted_p4(&inputs, &ctx()).expect("matrix");
    let central = out.matrix.central();
    for scale in UncScale::VARIATIONS {
        let shifted = out.matrix.get(UncSource::Jer, scale).expect("jer entry");
        assert_eq!(shifted[0], central[0]);
        assert_ne!(shifted[1], central[1]);
    }
}

#[test]
fn horn_toggle_restores_jer_variants() {
    let mut cfg = config();
    cfg.horn = RegionExclusionPolicy::disabled();
    let provider = JetCorrectionProvider::new(&cfg, SampleKind::Simulation, "sample", table())
        .expect("provider");
    let mut inputs = jets(&[100.0], &[2.8], &[0.5]);
    inputs.gen_jet_idx = vec![0];
    inputs.gen_jet_pt = vec![95.0];
    let out = provider.shifted_p4(&inputs, &ctx()).expect("matrix");
    let up = out.matrix.get(UncSource::Jer, UncScale::Up).expect("up")[0];
    assert_relative_eq!(up.pt, out.matrix.central()[0].pt * 1.1, epsilon = 1e-9);
}

#[test]
fn non_applicable_objects_keep_central_values() {
    let mut cfg = config();
    cfg.extra_sources.insert(
        UncSource::JesFlavorPureBottom,
        "FlavorPureBottom_AK4PFPuppi".to_string(),
    );
    let provider = JetCorrectionProvider::new(&cfg, SampleKind::Simulation, "sample", table())
        .expect("provider");
    let mut inputs = jets(&[100.0, 60.0], &[0.4, 1.2], &[0.1, 1.1]);
    inputs.hadron_flavour = vec![5, 0];
    let out = provider.shifted_p4(&inputs, &ctx()).expect("matrix");
    let central = out.matrix.central();
    for scale in UncScale::VARIATIONS {
        let shifted = out
            .matrix
            .get(UncSource::JesFlavorPureBottom, scale)
            .expect("flavour entry");
        assert_eq!(shifted[1], central[1]);
        assert_relative_eq!(
            shifted[0].pt,
            central[0].pt * (1.0 + scale.signf() * 0.05),
            epsilon = 1e-9
        );
    }
}

#[test]
fn custom_rules_replace_the_standard_table() {
    let mut rules = ApplicabilityTable::new();
    rules.insert(UncSource::JesTotal, |traits| traits.parton_flavour != 21);
    let provider = JetCorrectionProvider::with_applicability(
        &config(),
        SampleKind::Simulation,
        "sample",
        table(),
        rules,
    )
    .expect("provider");
    let out = provider
        .shifted_p4(&jets(&[100.0], &[0.4], &[0.1]), &ctx())
        .expect("matrix");
    let up = out.matrix.get(UncSource::JesTotal, UncScale::Up).expect("up");
    assert_eq!(up, out.matrix.central());
}

#[test]
fn missing_catalog_correction_fails_at_construction() {
    let mut cfg = config();
    cfg.mode = UncertaintyMode::Regrouped;
    let err = JetCorrectionProvider::new(&cfg, SampleKind::Simulation, "sample", table())
        .expect_err("regrouped corrections are absent");
    assert!(err.is_configuration());
    assert_eq!(err.info().code, "missing_catalog_entry");
    assert!(err.info().context.contains_key("source"));
}

#[test]
fn missing_pipeline_correction_fails_at_construction() {
    let mut cfg = config();
    cfg.jer_tag = "Unknown_JRV9_MC".to_string();
    let err = JetCorrectionProvider::new(&cfg, SampleKind::Simulation, "sample", table())
        .expect_err("jer tag mismatch");
    assert_eq!(err.info().code, "missing_correction");
    assert_eq!(
        err.info().context.get("key").map(String::as_str),
        Some("Unknown_JRV9_MC_ScaleFactor_AK4PFPuppi")
    );
}

#[test]
fn fat_jets_use_their_own_algorithm_names() {
    let mut cfg = config();
    cfg.algo = "AK8PFPuppi".to_string();
    let values = Values {
        total_unc: 0.04,
        ..Values::default()
    };
    let provider = JetCorrectionProvider::new(
        &cfg,
        SampleKind::Simulation,
        "sample",
        table_with("AK8PFPuppi", values),
    )
    .expect("fat jet provider");
    let out = provider
        .shifted_p4(&jets(&[300.0], &[0.2], &[1.0]), &ctx())
        .expect("matrix");
    let up = out.matrix.get(UncSource::JesTotal, UncScale::Up).expect("up")[0];
    assert_relative_eq!(up.pt, out.matrix.central()[0].pt * 1.04, epsilon = 1e-9);
    assert_eq!(cfg.jer_sf_key(), format!("{JER_TAG}_ScaleFactor_AK8PFPuppi"));
}

#[test]
fn regrouped_catalog_inserts_the_year() {
    let mut cfg = config();
    cfg.mode = UncertaintyMode::Regrouped;
    cfg.year = "2018".to_string();
    cfg.jec_tag = "Summer19UL18_V5_MC".to_string();
    let catalog = UncertaintyCatalog::from_config(&cfg, SampleKind::Simulation);
    assert_eq!(catalog.len(), 12);
    let name = |source| match catalog.get(source) {
        Some(syst_jet::CatalogEntry::Table(name)) => name.clone(),
        other => panic!("unexpected entry {other:?}"),
    };
    assert_eq!(
        name(UncSource::JesBbec1Year),
        "Summer19UL18_V5_MC_Regrouped_BBEC1_2018_AK4PFPuppi"
    );
    assert_eq!(
        name(UncSource::JesHfYear),
        "Summer19UL18_V5_MC_Regrouped_RelativeStatHF_2018_AK4PFPuppi"
    );
    assert_eq!(
        name(UncSource::JesFlavorQcd),
        "Summer19UL18_V5_MC_Regrouped_FlavorQCD_AK4PFPuppi"
    );
    assert_eq!(catalog.get(UncSource::Jer), Some(&syst_jet::CatalogEntry::Resolution));
    assert!(UncertaintyCatalog::from_config(&cfg, SampleKind::Data).is_empty());
}

proptest! {
    #[test]
    fn linear_sources_are_symmetric(
        pt in 20.0_f64..2000.0,
        eta in -4.7_f64..4.7,
        phi in -3.14_f64..3.14,
        event in any::<u64>(),
    ) {
        let provider =
            JetCorrectionProvider::new(&config(), SampleKind::Simulation, "sample", table())
                .expect("provider");
        let context = EventContext { event, lumi: 3, run: 1, rho: 10.0 };
        let out = provider.shifted_p4(&jets(&[pt], &[eta], &[phi]), &context).expect("matrix");
        let central = out.matrix.central()[0].pt;
        let up = out.matrix.get(UncSource::JesTotal, UncScale::Up).expect("up")[0].pt;
        let down = out.matrix.get(UncSource::JesTotal, UncScale::Down).expect("down")[0].pt;
        prop_assert!((up + down - 2.0 * central).abs() <= 1e-9 * central.abs().max(1.0));
    }

    #[test]
    fn repeated_evaluation_is_bit_identical(
        pt in 20.0_f64..500.0,
        eta in -2.4_f64..2.4,
        phi in -3.14_f64..3.14,
        event in any::<u64>(),
        lumi in any::<u64>(),
    ) {
        let provider =
            JetCorrectionProvider::new(&config(), SampleKind::Simulation, "sample", table())
                .expect("provider");
        let context = EventContext { event, lumi, run: 1, rho: 10.0 };
        let inputs = jets(&[pt], &[eta], &[phi]);
        let a = provider.shifted_p4(&inputs, &context).expect("first");
        let b = provider.shifted_p4(&inputs, &context).expect("second");
        prop_assert_eq!(a.matrix, b.matrix);
    }
}
