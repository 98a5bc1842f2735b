//! Analysis session: owns the single `AnalysisResult` and its lifecycle.
//!
//!   Idle ──submit──▶ Submitting ──ok──▶ Ready ──ask──▶ AskingFollowup ──▶ Ready
//!                         │                                   │
//!                         └──err──▶ Idle (prior result kept)  └──err──▶ Ready
//!
//! State is only touched between suspension points; the transport call is
//! the only `.await`. Each outgoing call carries a `Ticket`, and a response
//! whose ticket is no longer the in-flight one is dropped on arrival. A call
//! whose future is dropped before it finishes releases the session through
//! `InFlight`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use meddrug_common::{
    AnalysisKind, AnalysisRequest, AnalysisResult, ConcurrencyPolicy, ModelVariant,
    MoleculeDescriptor, SessionError, TransportError,
};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::normalize::{self, normalize_analysis, normalize_followup, AnalysisSubject};
use crate::notify::{Notification, Notifier};
use crate::transport::{AnalysisTransport, RawResponse};
use crate::wire::{Endpoint, WireDialect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Submitting,
    Ready,
    AskingFollowup,
}

/// Read-only view handed to presentation code.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub result: Option<AnalysisResult>,
    pub last_error: Option<SessionError>,
}

/// What happened to a response that did come back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer operation took over while this one was in flight.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Submit,
    Followup,
}

impl Operation {
    fn label(&self) -> &'static str {
        match self {
            Operation::Submit => "analysis",
            Operation::Followup => "follow-up question",
        }
    }
}

#[derive(Debug, Clone)]
struct Ticket {
    generation: u64,
    operation: Operation,
    descriptor: MoleculeDescriptor,
    target: Option<String>,
}

/// Builds the notification sent when a submit's result is applied.
pub type CompletionNote = fn(&AnalysisResult) -> Notification;

/// Per-kind success message.
pub fn completion_note(result: &AnalysisResult) -> Notification {
    Notification::success(success_message(result.kind))
}

struct Inner {
    state: SessionState,
    result: Option<AnalysisResult>,
    last_error: Option<SessionError>,
    generation: u64,
    in_flight: Option<Ticket>,
}

impl Inner {
    fn is_current(&self, ticket: &Ticket) -> bool {
        self.in_flight.as_ref().is_some_and(|current| {
            current.generation == ticket.generation
                && current.descriptor == ticket.descriptor
                && current.target == ticket.target
        })
    }

    fn issue(&mut self, operation: Operation, descriptor: MoleculeDescriptor, target: Option<String>) -> Ticket {
        self.generation = self.generation.wrapping_add(1);
        let ticket = Ticket { generation: self.generation, operation, descriptor, target };
        self.in_flight = Some(ticket.clone());
        self.last_error = None;
        self.state = match operation {
            Operation::Submit => SessionState::Submitting,
            Operation::Followup => SessionState::AskingFollowup,
        };
        ticket
    }

    /// Releases an operation that never finished. The result is untouched.
    fn abandon(&mut self, ticket: &Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.in_flight = None;
        self.state = match (ticket.operation, &self.result) {
            (Operation::Followup, Some(_)) => SessionState::Ready,
            _ => SessionState::Idle,
        };
        true
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            result: self.result.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

pub struct AnalysisSession {
    id: Uuid,
    transport: Arc<dyn AnalysisTransport>,
    notifier: Arc<dyn Notifier>,
    dialect: WireDialect,
    policy: ConcurrencyPolicy,
    completion_note: CompletionNote,
    inner: Mutex<Inner>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl AnalysisSession {
    pub fn new(transport: Arc<dyn AnalysisTransport>, notifier: Arc<dyn Notifier>) -> Self {
        let inner = Inner {
            state: SessionState::Idle,
            result: None,
            last_error: None,
            generation: 0,
            in_flight: None,
        };
        let (snapshots, _) = watch::channel(inner.snapshot());
        Self {
            id: Uuid::new_v4(),
            transport,
            notifier,
            dialect: WireDialect::default(),
            policy: ConcurrencyPolicy::default(),
            completion_note,
            inner: Mutex::new(inner),
            snapshots,
        }
    }

    pub fn with_dialect(mut self, dialect: WireDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_policy(mut self, policy: ConcurrencyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_completion_note(mut self, note: CompletionNote) -> Self {
        self.completion_note = note;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn result(&self) -> Option<AnalysisResult> {
        self.lock().result.clone()
    }

    pub fn last_error(&self) -> Option<SessionError> {
        self.lock().last_error.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Receives a new snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    /// Run an analysis and replace the current result with its outcome.
    #[instrument(skip(self, request), fields(session = %self.id, kind = request.kind.as_str()))]
    pub async fn submit(&self, request: AnalysisRequest) -> Result<Completion, SessionError> {
        let subject = match validate_request(&request) {
            Ok(subject) => subject,
            Err(err) => {
                self.record_local_error(&err);
                return Err(err);
            }
        };
        let question = request.question.as_deref().map(str::trim).filter(|q| !q.is_empty());

        let guard = self.begin_submit(&subject)?;
        let payload = self.dialect.analysis_payload(
            subject.kind,
            &subject.descriptor,
            subject.target.as_deref(),
            subject.model_variant,
            question,
        );

        let response = self.transport.send(Endpoint::for_kind(subject.kind), &payload).await;
        self.finish_submit(&guard.ticket, &subject, response)
    }

    /// Ask the backend about the current result. Only the narrative and AI
    /// analysis of the result can change.
    #[instrument(skip(self, question), fields(session = %self.id))]
    pub async fn ask_followup(&self, question: &str) -> Result<Completion, SessionError> {
        let question = question.trim();
        if question.is_empty() {
            let err = SessionError::Validation("the question must not be empty".to_string());
            self.record_local_error(&err);
            return Err(err);
        }

        let (guard, model) = self.begin_followup()?;
        let payload = self.dialect.analysis_payload(
            AnalysisKind::Full,
            &guard.ticket.descriptor,
            guard.ticket.target.as_deref(),
            model,
            Some(question),
        );

        let response = self.transport.send(Endpoint::Agent, &payload).await;
        self.finish_followup(&guard.ticket, response)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        self.snapshots.send_replace(inner.snapshot());
    }

    fn record_local_error(&self, err: &SessionError) {
        debug!(error = %err, "Rejected before dispatch");
        let mut inner = self.lock();
        inner.last_error = Some(err.clone());
        self.publish(&inner);
    }

    fn begin_submit(&self, subject: &AnalysisSubject) -> Result<InFlight<'_>, SessionError> {
        let mut inner = self.lock();
        if let Some(current) = &inner.in_flight {
            let supersedes = current.operation == Operation::Followup
                || self.policy == ConcurrencyPolicy::Supersede;
            if !supersedes {
                return Err(SessionError::Concurrency(format!(
                    "an {} is still in flight",
                    current.operation.label()
                )));
            }
            debug!(superseded = current.generation, "New analysis supersedes in-flight {}", current.operation.label());
        }

        let ticket = inner.issue(Operation::Submit, subject.descriptor.clone(), subject.target.clone());
        self.publish(&inner);
        Ok(InFlight { session: self, ticket })
    }

    fn begin_followup(&self) -> Result<(InFlight<'_>, ModelVariant), SessionError> {
        let mut inner = self.lock();
        if let Some(current) = &inner.in_flight {
            return Err(SessionError::Concurrency(format!(
                "a {} is still in flight",
                current.operation.label()
            )));
        }

        let subject = match (&inner.result, inner.state) {
            (Some(result), SessionState::Ready) => match &result.target {
                Some(target) => Ok((result.descriptor.clone(), target.clone(), result.model_variant)),
                None => Err("follow-up questions need an analysis against a target protein"),
            },
            (Some(_), _) => Err("follow-up questions are only taken in the ready state; resubmit the analysis first"),
            (None, _) => Err("there is no analysis to ask about yet; submit one first"),
        };
        let (descriptor, target, model) = match subject {
            Ok(subject) => subject,
            Err(reason) => {
                let err = SessionError::State(reason.to_string());
                inner.last_error = Some(err.clone());
                self.publish(&inner);
                return Err(err);
            }
        };

        let ticket = inner.issue(Operation::Followup, descriptor, Some(target));
        self.publish(&inner);
        Ok((InFlight { session: self, ticket }, model))
    }

    fn finish_submit(
        &self,
        ticket: &Ticket,
        subject: &AnalysisSubject,
        response: Result<RawResponse, TransportError>,
    ) -> Result<Completion, SessionError> {
        let outcome = response.map_err(SessionError::from).and_then(|raw| {
            normalize::object(&raw.body)
                .and_then(|body| normalize_analysis(body, subject))
                .map_err(SessionError::from)
        });

        let mut inner = self.lock();
        if !inner.is_current(ticket) {
            debug!(generation = ticket.generation, "Discarding stale analysis response");
            return Ok(Completion::Discarded);
        }
        inner.in_flight = None;

        match outcome {
            Ok(result) => {
                info!(descriptor = %result.descriptor, kind = result.kind.as_str(), "Analysis ready");
                let note = (self.completion_note)(&result);
                inner.result = Some(result);
                inner.state = SessionState::Ready;
                self.publish(&inner);
                drop(inner);
                self.notifier.notify(note);
                Ok(Completion::Applied)
            }
            Err(err) => {
                warn!(error = %err, "Analysis failed, keeping previous result");
                inner.state = SessionState::Idle;
                inner.last_error = Some(err.clone());
                self.publish(&inner);
                drop(inner);
                self.report(&err);
                Err(err)
            }
        }
    }

    fn finish_followup(
        &self,
        ticket: &Ticket,
        response: Result<RawResponse, TransportError>,
    ) -> Result<Completion, SessionError> {
        let outcome = response.map_err(SessionError::from).and_then(|raw| {
            normalize::object(&raw.body)
                .map(normalize_followup)
                .map_err(SessionError::from)
        });

        let mut inner = self.lock();
        if !inner.is_current(ticket) {
            debug!(generation = ticket.generation, "Discarding stale follow-up answer");
            return Ok(Completion::Discarded);
        }
        inner.in_flight = None;
        inner.state = SessionState::Ready;

        match outcome {
            Ok(patch) => {
                if let Some(result) = inner.result.as_mut() {
                    result.narrative = Some(patch.narrative);
                    if patch.ai_analysis.is_some() {
                        result.ai_analysis = patch.ai_analysis;
                    }
                }
                self.publish(&inner);
                drop(inner);
                self.notifier.notify(Notification::success("Question answered"));
                Ok(Completion::Applied)
            }
            Err(err) => {
                warn!(error = %err, "Follow-up failed, keeping previous narrative");
                inner.last_error = Some(err.clone());
                self.publish(&inner);
                drop(inner);
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Transport failures were already reported by the transport itself.
    fn report(&self, err: &SessionError) {
        if let SessionError::Normalization(e) = err {
            self.notifier.notify(Notification::error(format!("Unexpected backend response: {e}")));
        }
    }
}

/// Holds the ticket of the operation in flight. Dropping it while the ticket
/// is still current means the caller gave up on the call.
struct InFlight<'a> {
    session: &'a AnalysisSession,
    ticket: Ticket,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut inner = self.session.lock();
        if inner.abandon(&self.ticket) {
            debug!(generation = self.ticket.generation, "Abandoned {} released", self.ticket.operation.label());
            self.session.publish(&inner);
        }
    }
}

fn validate_request(request: &AnalysisRequest) -> Result<AnalysisSubject, SessionError> {
    let descriptor = MoleculeDescriptor::new(&request.descriptor)?;
    let target = request
        .target
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from);

    if request.kind.requires_target() && target.is_none() {
        return Err(SessionError::Validation(format!(
            "a target protein is required for {} analysis",
            request.kind.as_str()
        )));
    }

    Ok(AnalysisSubject {
        kind: request.kind,
        descriptor,
        target,
        model_variant: request.model_variant,
    })
}

fn success_message(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::Full => "Analysis completed successfully",
        AnalysisKind::Lipinski => "Lipinski rule analysis completed",
        AnalysisKind::Binding => "Binding affinity predicted",
        AnalysisKind::Admet => "ADMET profile generated successfully",
    }
}
