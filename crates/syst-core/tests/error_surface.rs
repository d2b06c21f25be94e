use syst_core::errors::{ensure_aligned, ErrorInfo, SystError};
use syst_core::sanity::{check_corrected, sanitize_factor, sanitize_pt, DomainTally, DomainWarning};

#[test]
fn lookup_errors_promote_to_configuration() {
    let err = SystError::Lookup(ErrorInfo::new("unknown_key", "no such correction"))
        .into_configuration("Summer19UL18_V5_MC_Total_AK4PFchs");
    assert!(err.is_configuration());
    assert_eq!(err.info().code, "unknown_key");
    assert_eq!(
        err.info().context.get("key").map(String::as_str),
        Some("Summer19UL18_V5_MC_Total_AK4PFchs")
    );
    assert!(err.info().hint.is_some());
}

#[test]
fn error_display_includes_context_and_hint() {
    let err = SystError::configuration("bad", "broken")
        .with_context("source", "JER");
    let text = err.to_string();
    assert!(text.contains("configuration error"));
    assert!(text.contains("source=JER"));
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = SystError::input("misaligned_arrays", "lengths differ");
    let json = serde_json::to_value(&err).expect("serialize");
    assert_eq!(json["family"], "Input");
    assert_eq!(json["detail"]["code"], "misaligned_arrays");
    let back: SystError = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, err);
}

#[test]
fn alignment_check_reports_lengths() {
    assert!(ensure_aligned("eta", 3, 3).is_ok());
    let err = ensure_aligned("eta", 3, 2).expect_err("misaligned");
    assert_eq!(err.info().context.get("actual").map(String::as_str), Some("2"));
}

#[test]
fn ratio_band_is_enforced() {
    assert_eq!(check_corrected(100.0, 100.0), None);
    assert_eq!(check_corrected(100.0, 10.0), None);
    assert_eq!(check_corrected(100.0, 200.0), None);
    assert_eq!(check_corrected(100.0, 500.0), Some(DomainWarning::RatioOutOfBand));
    assert_eq!(check_corrected(100.0, 5.0), Some(DomainWarning::RatioOutOfBand));
    assert_eq!(check_corrected(100.0, -1.0), Some(DomainWarning::NegativePt));
    assert_eq!(check_corrected(100.0, f64::NAN), Some(DomainWarning::NotANumber));
}

#[test]
fn sanitizers_fall_back_and_tally() {
    let mut tally = DomainTally::new();
    assert_eq!(sanitize_factor(100.0, 5.0, &mut tally), 1.0);
    assert_eq!(sanitize_factor(100.0, 1.1, &mut tally), 1.1);
    assert_eq!(sanitize_pt(50.0, f64::NAN, 50.0, &mut tally), 50.0);
    assert_eq!(tally.count(DomainWarning::RatioOutOfBand), 1);
    assert_eq!(tally.count(DomainWarning::NotANumber), 1);
    assert_eq!(tally.total(), 2);

    let mut merged = DomainTally::new();
    merged.merge(&tally);
    merged.merge(&tally);
    assert_eq!(merged.total(), 4);
}
