//! Binding-affinity facet.
//!
//! Flat shape (`/binding`, legacy `/agent`): { binding_score, message, target? }
//! Nested shape: { binding: { score | binding_score, target?, message? } },
//! or a bare { score } from the versioned `/binding`.

use meddrug_common::BindingResult;
use serde_json::{Map, Value};
use tracing::warn;

use super::{read_f64, read_text, Result};

pub const FACET: &str = "binding";

fn detect(body: &Map<String, Value>) -> Option<&Map<String, Value>> {
    if body.contains_key("binding_score") {
        return Some(body);
    }
    if let Some(inner) = body.get("binding").and_then(Value::as_object) {
        return Some(inner);
    }
    body.contains_key("score").then_some(body)
}

/// `fallback_target` is the target the request was made for; a target
/// echoed by the backend takes precedence.
pub fn normalize_binding(body: &Map<String, Value>, fallback_target: Option<&str>) -> Result<Option<BindingResult>> {
    let Some(obj) = detect(body) else {
        return Ok(None);
    };

    let raw_score = read_f64(obj, FACET, &["binding_score", "score"])?;
    let score = raw_score.clamp(0.0, 1.0);
    if score != raw_score {
        warn!(raw_score, "Binding score outside [0, 1], clamped");
    }

    let target = read_text(obj, &["target"])
        .or_else(|| fallback_target.map(String::from))
        .unwrap_or_default();

    Ok(Some(BindingResult {
        score,
        target,
        narrative: read_text(obj, &["message", "narrative"]),
    }))
}
