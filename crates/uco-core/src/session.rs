//! Planning sessions
//!
//! A [`PlanningSession`] owns one conversation's [`PlanState`] and any
//! pending invalidation. [`SessionRegistry`] keys sessions by id and
//! serialises calls per session; different sessions never contend.

use crate::error::{CoreError, Result};
use crate::feedback::{classify_feedback, invalidation_for_feedback, FeedbackKind};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uco_artifact::Record;
use uco_ontology::OntologyMap;
use uco_planner::{
    IncrementalPlanner, Invalidation, InvalidationReport, PlanOutcome, PlanReport, PlanState,
    PlannerConfig,
};

/// One session's planning state
#[derive(Debug, Clone)]
pub struct PlanningSession {
    id: String,
    state: PlanState,
    pending: Option<Invalidation>,
    cycles: u64,
}

impl PlanningSession {
    /// Fresh session
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: PlanState::new(),
            pending: None,
            cycles: 0,
        }
    }

    /// Resume from stored state
    #[inline]
    #[must_use]
    pub fn with_state(mut self, state: PlanState) -> Self {
        self.state = state;
        self
    }

    /// Session id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &PlanState {
        &self.state
    }

    /// Invalidation waiting for the next cycle
    #[inline]
    #[must_use]
    pub fn pending(&self) -> Option<&Invalidation> {
        self.pending.as_ref()
    }

    /// Completed planning cycles
    #[inline]
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Queue an invalidation for the next cycle
    ///
    /// A pending full invalidation absorbs anything else; target lists merge.
    pub fn request_invalidation(&mut self, invalidation: Invalidation) {
        self.pending = Some(match (self.pending.take(), invalidation) {
            (None, next) => next,
            (Some(Invalidation::Full), _) | (Some(Invalidation::Targets(_)), Invalidation::Full) => {
                Invalidation::Full
            }
            (Some(Invalidation::Targets(mut queued)), Invalidation::Targets(more)) => {
                for id in more {
                    if !queued.contains(&id) {
                        queued.push(id);
                    }
                }
                Invalidation::Targets(queued)
            }
        });
        debug!(session = %self.id, pending = ?self.pending, "invalidation requested");
    }

    /// Classify feedback and queue whatever invalidation it implies
    pub fn route_feedback(&mut self, text: &str) -> FeedbackKind {
        let kind = classify_feedback(text);
        if let Some(invalidation) = invalidation_for_feedback(text, self.state.type_map()) {
            self.request_invalidation(invalidation);
        }
        kind
    }

    /// Apply an invalidation immediately
    pub fn invalidate_now(&mut self, invalidation: &Invalidation) -> InvalidationReport {
        let (state, report) = invalidation.apply(&self.state);
        self.state = state;
        report
    }

    /// Run one planning cycle
    ///
    /// A pending invalidation is applied first and consumed, so it is never
    /// applied twice.
    pub fn plan(
        &mut self,
        records: &[Record],
        ontology: &OntologyMap,
        config: &PlannerConfig,
    ) -> PlanReport {
        self.apply_pending();
        let outcome = IncrementalPlanner::new(ontology, config).plan(records, &self.state);
        self.finish_cycle(outcome)
    }

    /// Run one planning cycle from any serializable record collection
    ///
    /// # Errors
    /// Returns [`CoreError::Planner`] if the input is not a record
    /// collection; the session keeps the invalidated state
    pub fn plan_serializable<T>(
        &mut self,
        records: &T,
        ontology: &OntologyMap,
        config: &PlannerConfig,
    ) -> Result<PlanReport>
    where
        T: Serialize + ?Sized,
    {
        self.apply_pending();
        let outcome =
            IncrementalPlanner::new(ontology, config).plan_serializable(records, &self.state)?;
        Ok(self.finish_cycle(outcome))
    }

    fn apply_pending(&mut self) {
        if let Some(invalidation) = self.pending.take() {
            let report = self.invalidate_now(&invalidation);
            info!(
                session = %self.id,
                full = report.full,
                rows_removed = report.rows_removed,
                "applied pending invalidation"
            );
        }
    }

    fn finish_cycle(&mut self, outcome: PlanOutcome) -> PlanReport {
        self.state = outcome.state;
        self.cycles += 1;
        outcome.report
    }

    /// Consume the session, returning its state
    #[inline]
    #[must_use]
    pub fn into_state(self) -> PlanState {
        self.state
    }
}

/// Shared handle to one session
pub type SessionHandle = Arc<Mutex<PlanningSession>>;

/// Sessions keyed by id
///
/// Calls against one session run one at a time behind its mutex; the map
/// shard lock is released before a session is locked.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, SessionHandle>,
}

impl SessionRegistry {
    /// Empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session handle, created on first use
    #[must_use]
    pub fn open(&self, id: &str) -> SessionHandle {
        self.sessions
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(PlanningSession::new(id))))
            .value()
            .clone()
    }

    /// Register a session resumed from stored state, replacing any existing one
    pub fn restore(&self, id: &str, state: PlanState) -> SessionHandle {
        let handle = Arc::new(Mutex::new(PlanningSession::new(id).with_state(state)));
        self.sessions.insert(id.to_string(), Arc::clone(&handle));
        handle
    }

    /// Existing session handle
    #[must_use]
    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Run `f` with exclusive access to a session, creating it if needed
    pub fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut PlanningSession) -> R) -> R {
        let handle = self.open(id);
        let mut session = handle.lock();
        f(&mut session)
    }

    /// Plan one cycle for a session
    pub fn plan(
        &self,
        id: &str,
        records: &[Record],
        ontology: &OntologyMap,
        config: &PlannerConfig,
    ) -> PlanReport {
        self.with_session(id, |session| session.plan(records, ontology, config))
    }

    /// Queue an invalidation for an existing session
    ///
    /// # Errors
    /// Returns [`CoreError::SessionNotFound`] for unknown ids
    pub fn request_invalidation(&self, id: &str, invalidation: Invalidation) -> Result<()> {
        let handle = self
            .get(id)
            .ok_or_else(|| CoreError::SessionNotFound(id.to_string()))?;
        handle.lock().request_invalidation(invalidation);
        Ok(())
    }

    /// Snapshot of a session's state
    #[must_use]
    pub fn state(&self, id: &str) -> Option<PlanState> {
        self.get(id).map(|handle| handle.lock().state().clone())
    }

    /// Drop a session, returning its last state
    pub fn close(&self, id: &str) -> Option<PlanState> {
        let (_, handle) = self.sessions.remove(id)?;
        let state = handle.lock().state().clone();
        Some(state)
    }

    /// Number of sessions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session is open
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
