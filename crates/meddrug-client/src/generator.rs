//! Molecule generation: asks the backend for candidate SMILES, optionally
//! seeded with a starting molecule.

use std::sync::Arc;

use meddrug_common::{GeneratedMolecules, SessionError};
use tracing::{info, instrument};

use crate::normalize::{self, normalize_generated};
use crate::notify::{Notification, Notifier};
use crate::transport::AnalysisTransport;
use crate::wire::{Endpoint, WireDialect};

pub const MAX_SAMPLES: u32 = 10;

/// Candidate generation via `/generate`. Independent of any session: the
/// output never touches an `AnalysisResult`.
pub struct MoleculeGenerator {
    transport: Arc<dyn AnalysisTransport>,
    notifier: Arc<dyn Notifier>,
    dialect: WireDialect,
}

impl MoleculeGenerator {
    pub fn new(transport: Arc<dyn AnalysisTransport>, notifier: Arc<dyn Notifier>) -> Self {
        Self { transport, notifier, dialect: WireDialect::default() }
    }

    pub fn with_dialect(mut self, dialect: WireDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// A blank seed is the same as no seed.
    #[instrument(skip(self))]
    pub async fn generate(&self, num_samples: u32, seed: Option<&str>) -> Result<GeneratedMolecules, SessionError> {
        if !(1..=MAX_SAMPLES).contains(&num_samples) {
            return Err(SessionError::Validation(format!(
                "number of samples must be between 1 and {MAX_SAMPLES}, got {num_samples}"
            )));
        }
        let seed = seed.map(str::trim).filter(|s| !s.is_empty());

        let payload = self.dialect.generate_payload(num_samples, seed);
        let raw = self.transport.send(Endpoint::Generate, &payload).await?;

        let generated = match normalize::object(&raw.body).and_then(normalize_generated) {
            Ok(generated) => generated,
            Err(err) => {
                self.notifier.notify(Notification::error(format!("Unexpected backend response: {err}")));
                return Err(err.into());
            }
        };

        if generated.molecules.is_empty() {
            self.notifier.notify(Notification::warning("No molecules were generated"));
        } else {
            info!(count = generated.molecules.len(), "Generated molecules");
            self.notifier.notify(Notification::success(format!(
                "Generated {} molecule(s)",
                generated.molecules.len()
            )));
        }
        Ok(generated)
    }
}
