//! `/agent` responses: the full composite analysis and follow-up answers.
//!
//! The narrative comes from `agent_response` when present, otherwise from the
//! `ai_analysis` block, which is either a plain string or an object with one
//! of `response`, `answer`, `analysis`, `summary` and an optional
//! `recommendations` list.

use meddrug_common::{AiAnalysis, AnalysisResult, NormalizationError};
use serde_json::{Map, Value};

use super::{
    admet, binding, druglikeness, normalize_admet, normalize_binding, normalize_druglikeness,
    read_text, AnalysisSubject, FollowupPatch, Result,
};

/// Narrative used when the backend answers a question without any text.
pub const NO_FOLLOWUP_ANSWER: &str = "The agent couldn't generate a response to your question.";

const AI_TEXT_FIELDS: [&str; 4] = ["response", "answer", "analysis", "summary"];

/// A full analysis. Drug-likeness and binding must be recognizable; ADMET
/// degrades to an empty profile.
pub fn normalize_composite(body: &Map<String, Value>, subject: &AnalysisSubject) -> Result<AnalysisResult> {
    let druglikeness = normalize_druglikeness(body)?
        .ok_or(NormalizationError::UnrecognizedShape { facet: druglikeness::FACET })?;
    let binding = normalize_binding(body, subject.target.as_deref())?
        .ok_or(NormalizationError::UnrecognizedShape { facet: binding::FACET })?;
    let admet = match normalize_admet(body)? {
        Some(profile) => profile,
        None => {
            tracing::debug!(facet = admet::FACET, "Composite response without ADMET data");
            Default::default()
        }
    };
    let (narrative, ai_analysis) = extract_narrative(body);

    Ok(AnalysisResult {
        descriptor: subject.descriptor.clone(),
        target: subject.target.clone(),
        model_variant: subject.model_variant,
        kind: subject.kind,
        druglikeness: Some(druglikeness),
        binding: Some(binding),
        admet: Some(admet),
        narrative,
        ai_analysis,
    })
}

/// A follow-up answer. Facets re-sent by the backend are ignored.
pub fn normalize_followup(body: &Map<String, Value>) -> FollowupPatch {
    let (narrative, ai_analysis) = extract_narrative(body);
    FollowupPatch {
        narrative: narrative.unwrap_or_else(|| NO_FOLLOWUP_ANSWER.to_string()),
        ai_analysis,
    }
}

fn extract_narrative(body: &Map<String, Value>) -> (Option<String>, Option<AiAnalysis>) {
    let ai_analysis = match body.get("ai_analysis") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(AiAnalysis {
            summary: Some(s.trim().to_string()),
            recommendations: Vec::new(),
        }),
        Some(Value::Object(block)) => {
            let summary = read_text(block, &AI_TEXT_FIELDS);
            let recommendations: Vec<String> = block
                .get("recommendations")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();
            (summary.is_some() || !recommendations.is_empty())
                .then_some(AiAnalysis { summary, recommendations })
        }
        _ => None,
    };

    let narrative = read_text(body, &["agent_response"])
        .or_else(|| ai_analysis.as_ref().and_then(|a| a.summary.clone()));
    (narrative, ai_analysis)
}
