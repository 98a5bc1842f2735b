//! meddrug-client: orchestration layer between a presentation collaborator
//! and the MedDrug analysis backend.
//!
//!   transport   HTTP calls, uniform failure signal
//!   wire        endpoint paths and request payloads per backend dialect
//!   normalize   backend response shapes → canonical `AnalysisResult`
//!   session     submit / follow-up lifecycle, stale-response guard
//!   generator   molecule generation requests
//!   notify      user-visible notification channel
//!   presenter   view models for display collaborators

pub mod transport;
pub mod wire;
pub mod normalize;
pub mod session;
pub mod generator;
pub mod notify;
pub mod presenter;

pub use generator::MoleculeGenerator;
pub use normalize::{normalize, Normalized, RequestKind};
pub use notify::{BroadcastNotifier, Notification, NotificationLevel, Notifier, TracingNotifier};
pub use session::{AnalysisSession, Completion, CompletionNote, SessionSnapshot, SessionState};
pub use transport::{AnalysisTransport, HttpTransport, RawResponse};
pub use wire::{Endpoint, WireDialect};
