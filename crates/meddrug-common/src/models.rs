//! Canonical analysis model.
//! Every backend response shape is normalized into these types; nothing
//! downstream of the normalizer sees raw backend fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SessionError;

// ---------------------------------------------------------------------------
// Molecule descriptor
// ---------------------------------------------------------------------------

/// A SMILES string. Only emptiness is checked here; chemical validity is
/// decided by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoleculeDescriptor(String);

impl MoleculeDescriptor {
    pub fn new(raw: &str) -> Result<Self, SessionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SessionError::Validation(
                "a molecule descriptor (SMILES) is required".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MoleculeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Binding model used by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelVariant {
    #[default]
    #[serde(rename = "CNN")]
    Cnn,
    #[serde(rename = "GNN")]
    Gnn,
    Transformer,
}

impl ModelVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::Cnn => "CNN",
            ModelVariant::Gnn => "GNN",
            ModelVariant::Transformer => "Transformer",
        }
    }
}

impl FromStr for ModelVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cnn" => Ok(ModelVariant::Cnn),
            "gnn" => Ok(ModelVariant::Gnn),
            "transformer" => Ok(ModelVariant::Transformer),
            other => Err(format!("unknown model variant `{other}` (expected CNN, GNN or Transformer)")),
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backend analysis a submit runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Composite drug-likeness + binding + ADMET + AI narrative.
    #[default]
    Full,
    Lipinski,
    Binding,
    Admet,
}

impl AnalysisKind {
    pub fn requires_target(&self) -> bool {
        matches!(self, AnalysisKind::Full | AnalysisKind::Binding)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Full => "full",
            AnalysisKind::Lipinski => "lipinski",
            AnalysisKind::Binding => "binding",
            AnalysisKind::Admet => "admet",
        }
    }
}

/// Raw user input for a submit. Validated by the session, not on construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub descriptor: String,
    pub target: Option<String>,
    #[serde(default)]
    pub model_variant: ModelVariant,
    pub question: Option<String>,
    #[serde(default)]
    pub kind: AnalysisKind,
}

impl AnalysisRequest {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self { descriptor: descriptor.into(), ..Default::default() }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_model(mut self, model: ModelVariant) -> Self {
        self.model_variant = model;
        self
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn with_kind(mut self, kind: AnalysisKind) -> Self {
        self.kind = kind;
        self
    }
}

// ---------------------------------------------------------------------------
// Drug-likeness (Lipinski rule of five)
// ---------------------------------------------------------------------------

pub const MAX_MOLECULAR_WEIGHT: f64 = 500.0;
pub const MAX_LOG_P: f64 = 5.0;
pub const MAX_H_BOND_DONORS: u32 = 5;
pub const MAX_H_BOND_ACCEPTORS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DruglikenessProfile {
    pub molecular_weight: f64,
    pub log_p: f64,
    pub h_bond_donors: u32,
    pub h_bond_acceptors: u32,
    pub passes: bool,
}

impl DruglikenessProfile {
    /// Build a profile whose verdict is recomputed from the measurements.
    pub fn from_measurements(molecular_weight: f64, log_p: f64, h_bond_donors: u32, h_bond_acceptors: u32) -> Self {
        let mut profile = Self { molecular_weight, log_p, h_bond_donors, h_bond_acceptors, passes: false };
        profile.passes = profile.rule_of_five_violations() == 0;
        profile
    }

    /// Number of the four Lipinski thresholds this molecule exceeds.
    pub fn rule_of_five_violations(&self) -> u32 {
        let mut violations = 0;
        if self.molecular_weight > MAX_MOLECULAR_WEIGHT { violations += 1; }
        if self.log_p > MAX_LOG_P { violations += 1; }
        if self.h_bond_donors > MAX_H_BOND_DONORS { violations += 1; }
        if self.h_bond_acceptors > MAX_H_BOND_ACCEPTORS { violations += 1; }
        violations
    }
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingResult {
    /// Predicted affinity in [0, 1], 1 being the strongest binder.
    pub score: f64,
    pub target: String,
    pub narrative: Option<String>,
}

// ---------------------------------------------------------------------------
// ADMET
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmetCategory {
    Absorption,
    Distribution,
    Metabolism,
    Excretion,
    Toxicity,
}

impl AdmetCategory {
    pub const ALL: [AdmetCategory; 5] = [
        AdmetCategory::Absorption,
        AdmetCategory::Distribution,
        AdmetCategory::Metabolism,
        AdmetCategory::Excretion,
        AdmetCategory::Toxicity,
    ];

    /// Field name used by every known backend shape.
    pub fn key(&self) -> &'static str {
        match self {
            AdmetCategory::Absorption => "absorption",
            AdmetCategory::Distribution => "distribution",
            AdmetCategory::Metabolism => "metabolism",
            AdmetCategory::Excretion => "excretion",
            AdmetCategory::Toxicity => "toxicity",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AdmetCategory::Absorption => "Absorption",
            AdmetCategory::Distribution => "Distribution",
            AdmetCategory::Metabolism => "Metabolism",
            AdmetCategory::Excretion => "Excretion",
            AdmetCategory::Toxicity => "Toxicity",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmetSeverity {
    Good,
    Moderate,
    Poor,
    #[default]
    Info,
}

impl AdmetSeverity {
    /// Unknown labels fall back to `Info`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "good" => AdmetSeverity::Good,
            "moderate" => AdmetSeverity::Moderate,
            "poor" => AdmetSeverity::Poor,
            _ => AdmetSeverity::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdmetValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmetProperty {
    pub name: String,
    pub value: AdmetValue,
    pub severity: AdmetSeverity,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdmetProfile {
    pub absorption: Vec<AdmetProperty>,
    pub distribution: Vec<AdmetProperty>,
    pub metabolism: Vec<AdmetProperty>,
    pub excretion: Vec<AdmetProperty>,
    pub toxicity: Vec<AdmetProperty>,
}

impl AdmetProfile {
    pub fn category(&self, category: AdmetCategory) -> &[AdmetProperty] {
        match category {
            AdmetCategory::Absorption => &self.absorption,
            AdmetCategory::Distribution => &self.distribution,
            AdmetCategory::Metabolism => &self.metabolism,
            AdmetCategory::Excretion => &self.excretion,
            AdmetCategory::Toxicity => &self.toxicity,
        }
    }

    pub fn category_mut(&mut self, category: AdmetCategory) -> &mut Vec<AdmetProperty> {
        match category {
            AdmetCategory::Absorption => &mut self.absorption,
            AdmetCategory::Distribution => &mut self.distribution,
            AdmetCategory::Metabolism => &mut self.metabolism,
            AdmetCategory::Excretion => &mut self.excretion,
            AdmetCategory::Toxicity => &mut self.toxicity,
        }
    }

    pub fn is_empty(&self) -> bool {
        AdmetCategory::ALL.iter().all(|c| self.category(*c).is_empty())
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// Structured part of the backend's AI analysis block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub summary: Option<String>,
    pub recommendations: Vec<String>,
}

/// The single result object a session owns. Facets the submitted
/// `AnalysisKind` did not ask for are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub descriptor: MoleculeDescriptor,
    pub target: Option<String>,
    pub model_variant: ModelVariant,
    pub kind: AnalysisKind,
    pub druglikeness: Option<DruglikenessProfile>,
    pub binding: Option<BindingResult>,
    pub admet: Option<AdmetProfile>,
    pub narrative: Option<String>,
    pub ai_analysis: Option<AiAnalysis>,
}

/// Output of the `/generate` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMolecules {
    pub molecules: Vec<String>,
    pub message: Option<String>,
}
