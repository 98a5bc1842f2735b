//! meddrug-common: canonical analysis model, error taxonomy and configuration
//! shared by the MedDrug client crates.

pub mod error;
pub mod models;
pub mod config;

// Re-export commonly used types
pub use error::{ConfigError, NormalizationError, SessionError, TransportError};
pub use models::{
    AdmetCategory, AdmetProfile, AdmetProperty, AdmetSeverity, AdmetValue, AiAnalysis,
    AnalysisKind, AnalysisRequest, AnalysisResult, BindingResult, DruglikenessProfile,
    GeneratedMolecules, ModelVariant, MoleculeDescriptor,
};
pub use config::{ConcurrencyPolicy, DescriptorField, MedDrugConfig, PathStyle};
