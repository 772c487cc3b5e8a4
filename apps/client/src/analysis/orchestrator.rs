//! Drives one submission from form input to results.
//!
//! Flow: ValidatingSource (local checks → optional upload + history refresh)
//!       → Fetching (skill-gap ∥ optimize, joined) → Succeeded | Failed.
//!
//! Every `submit` bumps the generation. State lives in a `watch` channel and
//! every write goes through [`AnalysisOrchestrator::commit`], which applies
//! the change only while the submission's ticket is still the live
//! generation. Superseded work is never cancelled; its late results are
//! dropped at commit time and it issues no further requests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::analysis::join::{join_pair, Tagged, Ticket};
use crate::errors::{ValidationError, WorkflowError, ANALYSIS_FALLBACK};
use crate::gateway::{BackendGateway, GatewayError};
use crate::models::analysis::{
    LearningPreference, OptimizeRequest, SkillGapReport, SkillGapRequest,
};
use crate::models::resume::{OptimizedResume, ResumeFile, ResumeId, ResumeRecord};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    ValidatingSource,
    Fetching,
    Succeeded,
    Failed,
}

/// What the presentation layer observes.
///
/// `skill_gap_result` and `optimized_result` are either both set (Succeeded)
/// or both empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrchestrationState {
    pub phase: Phase,
    pub error_message: Option<String>,
    pub skill_gap_result: Option<SkillGapReport>,
    pub optimized_result: Option<OptimizedResume>,
    pub generation: u64,
}

impl OrchestrationState {
    fn clear_outcome(&mut self) {
        self.error_message = None;
        self.skill_gap_result = None;
        self.optimized_result = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    UploadNew,
    UseExisting,
}

/// One form submission.
#[derive(Debug, Clone)]
pub struct SubmitInput {
    pub source_mode: SourceMode,
    pub file: Option<ResumeFile>,
    pub selected_resume_id: Option<ResumeId>,
    pub role_name: String,
    pub learning_preference: LearningPreference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResults {
    pub resume_id: ResumeId,
    pub skill_gap: SkillGapReport,
    pub optimized: OptimizedResume,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    pub records: Vec<ResumeRecord>,
    pub selected: Option<ResumeId>,
    /// Existing resumes are preferred once there are any.
    pub suggested_mode: SourceMode,
}

#[derive(Debug, Default)]
struct HistoryCache {
    records: Vec<ResumeRecord>,
    selected: Option<ResumeId>,
    /// Bumped by every refresh; a fetch only lands if nothing newer started.
    refresh: u64,
}

impl HistoryCache {
    fn begin_refresh(&mut self) -> u64 {
        self.refresh += 1;
        self.refresh
    }

    fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            records: self.records.clone(),
            selected: self.selected.clone(),
            suggested_mode: if self.records.is_empty() {
                SourceMode::UploadNew
            } else {
                SourceMode::UseExisting
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

pub struct AnalysisOrchestrator {
    gateway: Arc<dyn BackendGateway>,
    state: watch::Sender<OrchestrationState>,
    history: Mutex<HistoryCache>,
}

impl AnalysisOrchestrator {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        let (state, _) = watch::channel(OrchestrationState::default());
        Self {
            gateway,
            state,
            history: Mutex::new(HistoryCache::default()),
        }
    }

    pub fn state(&self) -> OrchestrationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<OrchestrationState> {
        self.state.subscribe()
    }

    pub fn history(&self) -> HistorySnapshot {
        self.cache().snapshot()
    }

    pub fn selected_resume_id(&self) -> Option<ResumeId> {
        self.cache().selected.clone()
    }

    /// Selects a record from the cached history. Unknown ids are refused.
    pub fn select_resume(&self, id: &ResumeId) -> bool {
        let mut cache = self.cache();
        if cache.records.iter().any(|r| &r.id == id) {
            cache.selected = Some(id.clone());
            true
        } else {
            false
        }
    }

    /// Refreshes history on entry to the authenticated view and selects the
    /// most recent record. Failures are logged and returned, never published
    /// as workflow state.
    pub async fn load_history(&self) -> Result<HistorySnapshot, GatewayError> {
        let refresh = self.cache().begin_refresh();
        let records = match self.gateway.list_resume_history().await {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to fetch resume history: {e}");
                return Err(e);
            }
        };

        let mut cache = self.cache();
        if cache.refresh != refresh {
            debug!("Dropping history refresh {refresh} (latest: {})", cache.refresh);
            return Ok(cache.snapshot());
        }
        cache.selected = records.first().map(|r| r.id.clone());
        cache.records = records;
        debug!("Loaded {} resume(s) from history", cache.records.len());
        Ok(cache.snapshot())
    }

    /// Back to `Idle`; anything still in flight becomes stale.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            state.generation += 1;
            state.phase = Phase::Idle;
            state.clear_outcome();
        });
    }

    /// Runs one submission to completion.
    ///
    /// The outcome is also published to subscribers unless a newer submission
    /// started in the meantime, in which case `Err(Superseded)` is returned and
    /// state is left to the newer submission.
    pub async fn submit(&self, input: SubmitInput) -> Result<AnalysisResults, WorkflowError> {
        let ticket = self.begin();
        info!(
            generation = ticket.generation(),
            mode = ?input.source_mode,
            "Analysis submitted"
        );

        let resume_id = match self.resolve_source(ticket, &input).await {
            Ok(id) => id,
            Err(e) => return Err(self.fail(ticket, e)),
        };

        self.commit(ticket, |state| state.phase = Phase::Fetching)?;

        let skill_gap_request = SkillGapRequest {
            resume_id: resume_id.clone(),
            role_name: input.role_name.clone(),
            learning_preference: input.learning_preference,
        };
        let optimize_request = OptimizeRequest {
            resume_id: resume_id.clone(),
            role_name: input.role_name.clone(),
        };

        let Tagged { ticket, value } = join_pair(
            ticket,
            self.gateway.analyze_skill_gap(&skill_gap_request),
            self.gateway.optimize_resume(&optimize_request),
        )
        .await;

        match value {
            (Ok(skill_gap), Ok(optimized)) => {
                self.commit(ticket, |state| {
                    state.phase = Phase::Succeeded;
                    state.error_message = None;
                    state.skill_gap_result = Some(skill_gap.clone());
                    state.optimized_result = Some(optimized.clone());
                })?;
                info!(generation = ticket.generation(), "Analysis succeeded");
                Ok(AnalysisResults {
                    resume_id,
                    skill_gap,
                    optimized,
                })
            }
            // The survivor, if any, is dropped with the tuple.
            (Err(e), _) | (_, Err(e)) => {
                warn!(generation = ticket.generation(), "Analysis request failed: {e}");
                Err(self.fail(
                    ticket,
                    WorkflowError::Analysis(e.user_message(ANALYSIS_FALLBACK)),
                ))
            }
        }
    }

    // ── steps ───────────────────────────────────────────────────────────────

    /// Local checks first, then (for uploads) the upload and history refresh.
    async fn resolve_source(
        &self,
        ticket: Ticket,
        input: &SubmitInput,
    ) -> Result<ResumeId, WorkflowError> {
        match input.source_mode {
            SourceMode::UploadNew => {
                let file = input.file.as_ref().ok_or(ValidationError::MissingFile)?;
                check_role(&input.role_name)?;

                let receipt = self
                    .gateway
                    .upload_resume(file)
                    .await
                    .map_err(upload_error)?;
                self.ensure_current(ticket)?;
                info!("Uploaded {} as resume {}", file.file_name, receipt.resume_id);

                let records = self
                    .gateway
                    .list_resume_history()
                    .await
                    .map_err(upload_error)?;

                // Checked under the cache lock so a stale list never lands.
                // The live submission's list also wins over any refresh in flight.
                let mut cache = self.cache();
                self.ensure_current(ticket)?;
                cache.begin_refresh();
                cache.records = records;
                cache.selected = Some(receipt.resume_id.clone());
                drop(cache);

                Ok(receipt.resume_id)
            }
            SourceMode::UseExisting => {
                let id = input
                    .selected_resume_id
                    .clone()
                    .ok_or(ValidationError::NoResumeSelected)?;
                check_role(&input.role_name)?;
                Ok(id)
            }
        }
    }

    fn begin(&self) -> Ticket {
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            state.phase = Phase::ValidatingSource;
            state.clear_outcome();
            generation = state.generation;
        });
        Ticket::new(generation)
    }

    /// Publishes the failure if the ticket is still live; returns what the caller should see.
    fn fail(&self, ticket: Ticket, error: WorkflowError) -> WorkflowError {
        if let WorkflowError::Superseded { .. } = error {
            return error;
        }
        let message = error.user_message();
        match self.commit(ticket, |state| {
            state.phase = Phase::Failed;
            state.skill_gap_result = None;
            state.optimized_result = None;
            state.error_message = message;
        }) {
            Ok(()) => error,
            Err(superseded) => superseded,
        }
    }

    /// Applies `change` only while `ticket` is the live generation.
    ///
    /// The generation check and the write happen under the channel's lock, so
    /// a concurrent `begin` cannot slip in between them.
    fn commit<F>(&self, ticket: Ticket, change: F) -> Result<(), WorkflowError>
    where
        F: FnOnce(&mut OrchestrationState),
    {
        let mut live = ticket.generation();
        let applied = self.state.send_if_modified(|state| {
            live = state.generation;
            if !ticket.is_current(state.generation) {
                return false;
            }
            change(state);
            true
        });

        if applied {
            Ok(())
        } else {
            debug!(
                "Dropping outcome of submission {} (live: {live})",
                ticket.generation()
            );
            Err(WorkflowError::Superseded {
                generation: ticket.generation(),
                current: live,
            })
        }
    }

    fn ensure_current(&self, ticket: Ticket) -> Result<(), WorkflowError> {
        let live = self.state.borrow().generation;
        if ticket.is_current(live) {
            Ok(())
        } else {
            Err(WorkflowError::Superseded {
                generation: ticket.generation(),
                current: live,
            })
        }
    }

    fn cache(&self) -> MutexGuard<'_, HistoryCache> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn check_role(role_name: &str) -> Result<(), ValidationError> {
    if role_name.trim().is_empty() {
        Err(ValidationError::EmptyRoleName)
    } else {
        Ok(())
    }
}

fn upload_error(e: GatewayError) -> WorkflowError {
    warn!(status = ?e.status(), "Resume upload step failed: {e}");
    WorkflowError::Upload(e.user_message(ANALYSIS_FALLBACK))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
