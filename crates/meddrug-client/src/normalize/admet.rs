//! ADMET facet.
//!
//! Versioned shape: each category is a list of property records
//!   { absorption: [ { name, value, status, description } ], ... }
//! Legacy shape: each category maps property name to a scalar or record
//!   { absorption: { "Caco-2": 0.81, "HIA": { value, status, description } }, ... }
//! Either may sit under an `admet` key. A category that is missing, null or
//! empty becomes an empty list.

use meddrug_common::{AdmetCategory, AdmetProfile, AdmetProperty, AdmetSeverity, AdmetValue, NormalizationError};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{read_text, Result};

pub const FACET: &str = "admet";

fn container(body: &Map<String, Value>) -> &Map<String, Value> {
    body.get("admet").and_then(Value::as_object).unwrap_or(body)
}

/// `Ok(None)` when no ADMET category key is present.
pub fn normalize_admet(body: &Map<String, Value>) -> Result<Option<AdmetProfile>> {
    let obj = container(body);
    if !AdmetCategory::ALL.iter().any(|c| obj.contains_key(c.key())) {
        return Ok(None);
    }

    let mut profile = AdmetProfile::default();
    for category in AdmetCategory::ALL {
        let properties = match obj.get(category.key()) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(property_from_record)
                .collect::<Result<Vec<_>>>()?,
            Some(Value::Object(entries)) => entries
                .iter()
                .map(|(name, v)| property_from_entry(name, v))
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                warn!(category = category.key(), value = %other, "Unusable ADMET category, treating as empty");
                Vec::new()
            }
        };
        if properties.is_empty() {
            debug!(category = category.key(), "No ADMET data for category");
        }
        *profile.category_mut(category) = properties;
    }
    Ok(Some(profile))
}

/// Versioned list element.
fn property_from_record(item: &Value) -> Result<AdmetProperty> {
    let record = item.as_object().ok_or_else(|| NormalizationError::InvalidValue {
        facet: FACET,
        field: "property",
        reason: format!("expected an object, got {item}"),
    })?;
    let name = read_text(record, &["name"])
        .ok_or(NormalizationError::MissingField { facet: FACET, field: "name" })?;
    record_property(name, record)
}

/// Legacy map entry: scalar value or a record without `name`.
fn property_from_entry(name: &str, value: &Value) -> Result<AdmetProperty> {
    match value {
        Value::Object(record) => record_property(name.to_string(), record),
        scalar => Ok(AdmetProperty {
            name: name.to_string(),
            value: admet_value(scalar)?,
            severity: AdmetSeverity::Info,
            description: String::new(),
        }),
    }
}

fn record_property(name: String, record: &Map<String, Value>) -> Result<AdmetProperty> {
    let value = record
        .get("value")
        .ok_or(NormalizationError::MissingField { facet: FACET, field: "value" })?;
    Ok(AdmetProperty {
        name,
        value: admet_value(value)?,
        severity: read_text(record, &["status", "severity"])
            .map(|s| AdmetSeverity::parse(&s))
            .unwrap_or_default(),
        description: read_text(record, &["description"]).unwrap_or_default(),
    })
}

fn admet_value(value: &Value) -> Result<AdmetValue> {
    match value {
        Value::Number(n) => n.as_f64().map(AdmetValue::Number).ok_or_else(|| NormalizationError::InvalidValue {
            facet: FACET,
            field: "value",
            reason: format!("unrepresentable number {n}"),
        }),
        Value::String(s) => Ok(AdmetValue::Text(s.clone())),
        Value::Bool(b) => Ok(AdmetValue::Text(b.to_string())),
        Value::Null => Err(NormalizationError::MissingField { facet: FACET, field: "value" }),
        other => Err(NormalizationError::InvalidValue {
            facet: FACET,
            field: "value",
            reason: format!("expected a number or string, got {other}"),
        }),
    }
}
