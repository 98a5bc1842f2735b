//! Outbound side of the backend contract: endpoint paths and request bodies.
//!
//! The two backend generations disagree on path spelling (`/agent` vs
//! `/agent/`) and on the name of the SMILES field (`smiles` vs `drug`).
//! Both are fixed per deployment by a `WireDialect`; response differences
//! are handled by the normalizer only.

use meddrug_common::config::BackendConfig;
use meddrug_common::{AnalysisKind, DescriptorField, ModelVariant, MoleculeDescriptor, PathStyle};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Generate,
    Lipinski,
    Binding,
    Admet,
    Agent,
}

impl Endpoint {
    pub fn for_kind(kind: AnalysisKind) -> Self {
        match kind {
            AnalysisKind::Full => Endpoint::Agent,
            AnalysisKind::Lipinski => Endpoint::Lipinski,
            AnalysisKind::Binding => Endpoint::Binding,
            AnalysisKind::Admet => Endpoint::Admet,
        }
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            Endpoint::Generate => HttpMethod::Get,
            _ => HttpMethod::Post,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Generate => "generate",
            Endpoint::Lipinski => "lipinski",
            Endpoint::Binding => "binding",
            Endpoint::Admet => "admet",
            Endpoint::Agent => "agent",
        }
    }

    pub fn path(&self, style: PathStyle) -> String {
        match style {
            PathStyle::Bare => format!("/{}", self.name()),
            PathStyle::TrailingSlash => format!("/{}/", self.name()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WireDialect {
    pub path_style: PathStyle,
    pub descriptor_field: DescriptorField,
}

impl WireDialect {
    pub fn from_config(config: &BackendConfig) -> Self {
        Self { path_style: config.path_style, descriptor_field: config.descriptor_field }
    }

    /// Absolute URL of `endpoint` under `base_url`.
    pub fn url(&self, base_url: &str, endpoint: Endpoint) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), endpoint.path(self.path_style))
    }

    /// Body for one of the analysis endpoints. Only the fields the endpoint
    /// understands are written.
    pub fn analysis_payload(
        &self,
        kind: AnalysisKind,
        descriptor: &MoleculeDescriptor,
        target: Option<&str>,
        model: ModelVariant,
        question: Option<&str>,
    ) -> Value {
        let mut body = Map::new();
        body.insert(self.descriptor_field.as_str().to_string(), json!(descriptor.as_str()));

        if matches!(kind, AnalysisKind::Binding | AnalysisKind::Full) {
            if let Some(target) = target {
                body.insert("target".to_string(), json!(target));
            }
            body.insert("model_type".to_string(), json!(model.as_str()));
        }

        if kind == AnalysisKind::Full {
            if let Some(question) = question {
                body.insert("question".to_string(), json!(question));
            }
        }

        Value::Object(body)
    }

    /// Query parameters for `/generate`.
    pub fn generate_payload(&self, num_samples: u32, seed: Option<&str>) -> Value {
        let mut params = Map::new();
        params.insert("num_samples".to_string(), json!(num_samples));
        if let Some(seed) = seed {
            params.insert("seed_smiles".to_string(), json!(seed));
        }
        Value::Object(params)
    }
}
