//! Both backend generations' response shapes normalize to the same model.
//!
//! ```bash
//! cargo test --package meddrug-client --test test_normalizer_golden
//! ```

mod common;

use common::fixture;
use meddrug_client::normalize::{AnalysisSubject, NO_FOLLOWUP_ANSWER};
use meddrug_client::{normalize, Normalized, RawResponse, RequestKind};
use meddrug_common::{
    AdmetSeverity, AdmetValue, AnalysisKind, AnalysisResult, GeneratedMolecules, ModelVariant,
    MoleculeDescriptor,
};
use pretty_assertions::assert_eq;

const ASPIRIN: &str = "CC(=O)OC1=CC=CC=C1C(=O)O";

fn subject(kind: AnalysisKind) -> AnalysisSubject {
    AnalysisSubject {
        kind,
        descriptor: MoleculeDescriptor::new(ASPIRIN).unwrap(),
        target: Some("EGFR".to_string()),
        model_variant: ModelVariant::Cnn,
    }
}

fn analysis(name: &str, kind: AnalysisKind) -> AnalysisResult {
    let s = subject(kind);
    match normalize(&RawResponse::ok(fixture(name)), RequestKind::Analysis(&s)) {
        Ok(Normalized::Analysis(result)) => result,
        other => panic!("{name}: expected an analysis, got {other:?}"),
    }
}

#[test]
fn test_lipinski_shapes_agree() {
    let flat = analysis("lipinski_flat.json", AnalysisKind::Lipinski);
    let nested = analysis("lipinski_nested.json", AnalysisKind::Lipinski);
    assert_eq!(flat, nested);

    let profile = flat.druglikeness.unwrap();
    assert_eq!(profile.molecular_weight, 180.16);
    assert_eq!(profile.h_bond_acceptors, 4);
    assert!(profile.passes);
}

#[test]
fn test_binding_shapes_agree() {
    let flat = analysis("binding_flat.json", AnalysisKind::Binding);
    let nested = analysis("binding_nested.json", AnalysisKind::Binding);
    assert_eq!(flat, nested);
    assert_eq!(flat.binding.unwrap().target, "EGFR");
}

#[test]
fn test_admet_shapes_agree() {
    let versioned = analysis("admet_nested.json", AnalysisKind::Admet);
    let legacy = analysis("admet_flat.json", AnalysisKind::Admet);
    assert_eq!(versioned, legacy);

    let profile = versioned.admet.unwrap();
    assert_eq!(profile.absorption.len(), 2);
    assert_eq!(profile.absorption[1].value, AdmetValue::Number(0.93));
    assert_eq!(profile.distribution[0].severity, AdmetSeverity::Info);
    assert!(profile.metabolism.is_empty());
    assert!(profile.excretion.is_empty());
}

#[test]
fn test_admet_shapes_keep_backend_order() {
    let versioned = analysis("admet_backend_order_nested.json", AnalysisKind::Admet);
    let legacy = analysis("admet_backend_order_flat.json", AnalysisKind::Admet);
    assert_eq!(versioned, legacy);

    let profile = legacy.admet.unwrap();
    let names = |props: &[meddrug_common::AdmetProperty]| props.iter().map(|p| p.name.clone()).collect::<Vec<_>>();
    assert_eq!(names(&profile.absorption), vec!["HIA", "Caco-2", "Pgp substrate"]);
    assert_eq!(names(&profile.toxicity), vec!["hERG", "AMES"]);
}

#[test]
fn test_agent_shapes_agree_on_facets_and_narrative() {
    let flat = analysis("agent_flat.json", AnalysisKind::Full);
    let nested = analysis("agent_nested.json", AnalysisKind::Full);

    assert_eq!(flat.druglikeness, nested.druglikeness);
    assert_eq!(flat.binding, nested.binding);
    assert_eq!(flat.admet, nested.admet);
    assert_eq!(flat.narrative, nested.narrative);
    assert_eq!(
        nested.ai_analysis.unwrap().recommendations,
        vec!["Profile COX-1 selectivity".to_string()]
    );
}

#[test]
fn test_followup_ignores_resent_facets() {
    let raw = RawResponse::ok(fixture("followup.json"));
    let Ok(Normalized::Followup(patch)) = normalize(&raw, RequestKind::Followup) else {
        panic!("expected a follow-up patch");
    };
    assert_eq!(patch.narrative, "Hepatotoxicity risk is low at therapeutic doses.");
    assert_ne!(patch.narrative, NO_FOLLOWUP_ANSWER);
}

#[test]
fn test_generate_shapes_agree() {
    let run = |name| match normalize(&RawResponse::ok(fixture(name)), RequestKind::Generate) {
        Ok(Normalized::Generated(g)) => g,
        other => panic!("{name}: {other:?}"),
    };
    let current: GeneratedMolecules = run("generate_current.json");
    assert_eq!(current, run("generate_legacy.json"));
    assert_eq!(current.molecules[0], ASPIRIN);
}

#[test]
fn test_normalization_is_idempotent() {
    let s = subject(AnalysisKind::Full);
    let raw = RawResponse::ok(fixture("agent_nested.json"));
    let first = normalize(&raw, RequestKind::Analysis(&s));
    let second = normalize(&raw, RequestKind::Analysis(&s));
    assert_eq!(first, second);
}

#[test]
fn test_wrong_facet_for_kind_fails() {
    let s = subject(AnalysisKind::Lipinski);
    let raw = RawResponse::ok(fixture("binding_flat.json"));
    assert!(normalize(&raw, RequestKind::Analysis(&s)).is_err());
}
