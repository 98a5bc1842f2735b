//! Schema normalizer: backend response shapes → canonical model.
//!
//! Two backend generations coexist. Each facet module recognizes its shapes
//! by presence-testing distinguishing fields; no version flag is consulted.
//! Everything here is pure: no I/O, no shared state, same input → same
//! output.

pub mod admet;
pub mod binding;
pub mod composite;
pub mod druglikeness;
pub mod generated;

use meddrug_common::{
    AiAnalysis, AnalysisKind, AnalysisResult, GeneratedMolecules, ModelVariant,
    MoleculeDescriptor, NormalizationError,
};
use serde_json::{Map, Value};

use crate::transport::RawResponse;

pub use admet::normalize_admet;
pub use binding::normalize_binding;
pub use composite::{normalize_composite, normalize_followup, NO_FOLLOWUP_ANSWER};
pub use druglikeness::normalize_druglikeness;
pub use generated::normalize_generated;

pub type Result<T> = std::result::Result<T, NormalizationError>;

/// What the request that produced a response asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSubject {
    pub kind: AnalysisKind,
    pub descriptor: MoleculeDescriptor,
    pub target: Option<String>,
    pub model_variant: ModelVariant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RequestKind<'a> {
    Analysis(&'a AnalysisSubject),
    Followup,
    Generate,
}

/// Fields a follow-up answer may change on an existing result.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowupPatch {
    pub narrative: String,
    pub ai_analysis: Option<AiAnalysis>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Analysis(AnalysisResult),
    Followup(FollowupPatch),
    Generated(GeneratedMolecules),
}

pub fn normalize(raw: &RawResponse, kind: RequestKind<'_>) -> Result<Normalized> {
    let body = object(&raw.body)?;
    match kind {
        RequestKind::Analysis(subject) => normalize_analysis(body, subject).map(Normalized::Analysis),
        RequestKind::Followup => Ok(Normalized::Followup(normalize_followup(body))),
        RequestKind::Generate => normalize_generated(body).map(Normalized::Generated),
    }
}

/// Map a response of any analysis endpoint onto a fresh `AnalysisResult`.
/// The facet the request kind asked for must be recognizable.
pub fn normalize_analysis(body: &Map<String, Value>, subject: &AnalysisSubject) -> Result<AnalysisResult> {
    let mut result = empty_result(subject);
    match subject.kind {
        AnalysisKind::Full => return normalize_composite(body, subject),
        AnalysisKind::Lipinski => {
            result.druglikeness = Some(
                normalize_druglikeness(body)?
                    .ok_or(NormalizationError::UnrecognizedShape { facet: druglikeness::FACET })?,
            );
        }
        AnalysisKind::Binding => {
            result.binding = Some(
                normalize_binding(body, subject.target.as_deref())?
                    .ok_or(NormalizationError::UnrecognizedShape { facet: binding::FACET })?,
            );
        }
        AnalysisKind::Admet => {
            result.admet = Some(
                normalize_admet(body)?
                    .ok_or(NormalizationError::UnrecognizedShape { facet: admet::FACET })?,
            );
        }
    }
    Ok(result)
}

fn empty_result(subject: &AnalysisSubject) -> AnalysisResult {
    AnalysisResult {
        descriptor: subject.descriptor.clone(),
        target: subject.target.clone(),
        model_variant: subject.model_variant,
        kind: subject.kind,
        druglikeness: None,
        binding: None,
        admet: None,
        narrative: None,
        ai_analysis: None,
    }
}

// ── Field helpers shared by the facet modules ────────────────────────────────

pub(crate) fn object(body: &Value) -> Result<&Map<String, Value>> {
    body.as_object().ok_or(NormalizationError::NotAnObject)
}

/// First key of `names` present (and non-null) in `obj`.
pub(crate) fn field<'a>(obj: &'a Map<String, Value>, names: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    names
        .iter()
        .find_map(|name| obj.get(*name).filter(|v| !v.is_null()).map(|v| (*name, v)))
}

/// A finite number, given either as a JSON number or a numeric string.
pub(crate) fn read_f64(obj: &Map<String, Value>, facet: &'static str, names: &[&'static str]) -> Result<f64> {
    let (name, value) = field(obj, names).ok_or(NormalizationError::MissingField { facet, field: names[0] })?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(NormalizationError::InvalidValue {
            facet,
            field: name,
            reason: format!("expected a finite number, got {value}"),
        }),
    }
}

/// A non-negative whole count.
pub(crate) fn read_count(obj: &Map<String, Value>, facet: &'static str, names: &[&'static str]) -> Result<u32> {
    let v = read_f64(obj, facet, names)?;
    if v < 0.0 || v.fract() != 0.0 || v > f64::from(u32::MAX) {
        let name = field(obj, names).map(|(n, _)| n).unwrap_or(names[0]);
        return Err(NormalizationError::InvalidValue {
            facet,
            field: name,
            reason: format!("expected a non-negative whole number, got {v}"),
        });
    }
    Ok(v as u32)
}

/// A non-blank string, trimmed.
pub(crate) fn read_text(obj: &Map<String, Value>, names: &[&'static str]) -> Option<String> {
    names.iter().find_map(|name| {
        obj.get(*name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    })
}
