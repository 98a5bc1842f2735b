//! `/generate` responses: `generated_molecules` (current) or `molecules`
//! (legacy), each a list of SMILES strings.

use meddrug_common::{GeneratedMolecules, NormalizationError};
use serde_json::{Map, Value};

use super::{read_text, Result};

pub const FACET: &str = "generated molecules";

pub fn normalize_generated(body: &Map<String, Value>) -> Result<GeneratedMolecules> {
    let (field, items) = ["generated_molecules", "molecules"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_array).map(|items| (*key, items)))
        .ok_or(NormalizationError::UnrecognizedShape { facet: FACET })?;

    let molecules = items
        .iter()
        .map(|item| match item.as_str().map(str::trim) {
            Some(smiles) if !smiles.is_empty() => Ok(smiles.to_string()),
            _ => Err(NormalizationError::InvalidValue {
                facet: FACET,
                field,
                reason: format!("expected a SMILES string, got {item}"),
            }),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(GeneratedMolecules { molecules, message: read_text(body, &["message"]) })
}
