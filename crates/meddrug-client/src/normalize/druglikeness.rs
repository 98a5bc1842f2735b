//! Lipinski / drug-likeness facet.
//!
//! Flat shape (`/lipinski`, legacy `/agent`):
//!   { molecular_weight, logP, HBD, HBA, drug_likeness: "Pass" | ... }
//! Nested shape (versioned `/agent`):
//!   { lipinski: { mw, logp, hbd, hba, is_valid } }   (or under `druglikeness`)

use meddrug_common::DruglikenessProfile;
use serde_json::{Map, Value};
use tracing::warn;

use super::{read_count, read_f64, Result};

pub const FACET: &str = "druglikeness";

enum Shape<'a> {
    Flat(&'a Map<String, Value>),
    Nested(&'a Map<String, Value>),
}

fn detect(body: &Map<String, Value>) -> Option<Shape<'_>> {
    if body.contains_key("molecular_weight") {
        return Some(Shape::Flat(body));
    }
    ["lipinski", "druglikeness"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_object))
        .map(Shape::Nested)
}

/// `Ok(None)` when the body carries no drug-likeness facet at all.
pub fn normalize_druglikeness(body: &Map<String, Value>) -> Result<Option<DruglikenessProfile>> {
    let Some(shape) = detect(body) else {
        return Ok(None);
    };

    let (mw, log_p, hbd, hba, verdict) = match shape {
        Shape::Flat(obj) => (
            read_f64(obj, FACET, &["molecular_weight"])?,
            read_f64(obj, FACET, &["logP", "logp"])?,
            read_count(obj, FACET, &["HBD", "hbd"])?,
            read_count(obj, FACET, &["HBA", "hba"])?,
            backend_verdict(obj.get("drug_likeness")),
        ),
        Shape::Nested(obj) => (
            read_f64(obj, FACET, &["mw", "molecular_weight"])?,
            read_f64(obj, FACET, &["logp", "logP"])?,
            read_count(obj, FACET, &["hbd", "HBD", "h_bond_donors"])?,
            read_count(obj, FACET, &["hba", "HBA", "h_bond_acceptors"])?,
            backend_verdict(obj.get("is_valid").or_else(|| obj.get("drug_likeness"))),
        ),
    };

    let mut profile = DruglikenessProfile::from_measurements(mw, log_p, hbd, hba);
    if let Some(passes) = verdict {
        if passes != profile.passes {
            warn!(
                backend = passes,
                recomputed = profile.passes,
                violations = profile.rule_of_five_violations(),
                "Backend drug-likeness verdict disagrees with rule-of-five thresholds"
            );
        }
        profile.passes = passes;
    }
    Ok(Some(profile))
}

/// A recognized backend verdict. A textual verdict is true only for "Pass";
/// blank or non-textual values count as absent.
fn backend_verdict(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim() == "Pass"),
        Value::Bool(b) => Some(*b),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meddrug_common::NormalizationError;
    use serde_json::json;

    fn run(body: Value) -> Result<Option<DruglikenessProfile>> {
        normalize_druglikeness(body.as_object().unwrap())
    }

    #[test]
    fn test_aspirin_flat() {
        let profile = run(json!({
            "molecular_weight": 180.16, "logP": 1.19, "HBD": 1, "HBA": 4, "drug_likeness": "Pass"
        }))
        .unwrap()
        .unwrap();
        assert_eq!(profile, DruglikenessProfile {
            molecular_weight: 180.16,
            log_p: 1.19,
            h_bond_donors: 1,
            h_bond_acceptors: 4,
            passes: true,
        });
    }

    #[test]
    fn test_textual_fail_overrides_thresholds() {
        let profile = run(json!({
            "molecular_weight": 180.16, "logP": 1.19, "HBD": 1, "HBA": 4, "drug_likeness": "Fail"
        }))
        .unwrap()
        .unwrap();
        assert!(!profile.passes);
    }

    #[test]
    fn test_only_exact_pass_counts_as_passing() {
        for verdict in ["PASS", "pass", "Passed"] {
            let profile = run(json!({
                "molecular_weight": 180.16, "logP": 1.19, "HBD": 1, "HBA": 4, "drug_likeness": verdict
            }))
            .unwrap()
            .unwrap();
            assert!(!profile.passes, "{verdict}");
        }

        let padded = run(json!({
            "molecular_weight": 900.0, "logP": 7.0, "HBD": 8, "HBA": 14, "drug_likeness": " Pass "
        }))
        .unwrap()
        .unwrap();
        assert!(padded.passes);
    }

    #[test]
    fn test_missing_verdict_is_recomputed() {
        let heavy = run(json!({ "molecular_weight": 812.4, "logP": 6.1, "HBD": 2, "HBA": 9 }))
            .unwrap()
            .unwrap();
        assert!(!heavy.passes);

        let blank = run(json!({
            "molecular_weight": 151.16, "logP": 0.46, "HBD": 2, "HBA": 2, "drug_likeness": " "
        }))
        .unwrap()
        .unwrap();
        assert!(blank.passes);
    }

    #[test]
    fn test_nested_lipinski_block() {
        let profile = run(json!({
            "lipinski": { "mw": 180.16, "logp": 1.19, "hbd": 1, "hba": 4, "is_valid": true }
        }))
        .unwrap()
        .unwrap();
        assert_eq!(profile.molecular_weight, 180.16);
        assert!(profile.passes);
    }

    #[test]
    fn test_absent_facet_is_none() {
        assert_eq!(run(json!({ "binding_score": 0.3 })).unwrap(), None);
    }

    #[test]
    fn test_recognized_shape_with_missing_field_fails_closed() {
        let err = run(json!({ "molecular_weight": 180.16, "HBD": 1, "HBA": 4 })).unwrap_err();
        assert_eq!(err, NormalizationError::MissingField { facet: "druglikeness", field: "logP" });
    }
}
