//! In-memory [`BackendGateway`] for unit tests.
//!
//! Records every call, can fail individual operations with a given detail, and
//! can hold analysis calls for a resume id until the test releases them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Semaphore;

use crate::errors::ErrorDetail;
use crate::gateway::{BackendGateway, GatewayError};
use crate::models::analysis::{OptimizeRequest, SkillGapReport, SkillGapRequest};
use crate::models::resume::{OptimizedResume, ResumeFile, ResumeId, ResumeRecord, UploadReceipt};
use crate::models::user::{AccessToken, RegisterRequest};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Register(String),
    Authenticate(String),
    Upload(String),
    History,
    SkillGap(SkillGapRequest),
    Optimize(OptimizeRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Register,
    Authenticate,
    Upload,
    History,
    SkillGap,
    Optimize,
}

#[derive(Default)]
pub struct MockGateway {
    calls: Mutex<Vec<Call>>,
    history: Mutex<Vec<ResumeRecord>>,
    failures: Mutex<HashMap<Op, (u16, Option<ErrorDetail>)>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    token: Mutex<Option<String>>,
    history_hold: Mutex<Option<Arc<Semaphore>>>,
}

impl MockGateway {
    pub fn record(id: &str, name: &str, day: u32) -> ResumeRecord {
        ResumeRecord {
            id: ResumeId::from(id),
            original_filename: name.to_string(),
            uploaded_at: Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap(),
        }
    }

    pub fn with_history(self, records: Vec<ResumeRecord>) -> Self {
        *self.history.lock().unwrap() = records;
        self
    }

    pub fn set_history(&self, records: Vec<ResumeRecord>) {
        *self.history.lock().unwrap() = records;
    }

    pub fn with_token(self, token: &str) -> Self {
        *self.token.lock().unwrap() = Some(token.to_string());
        self
    }

    pub fn fail(self, op: Op, status: u16, detail: Option<ErrorDetail>) -> Self {
        self.failures.lock().unwrap().insert(op, (status, detail));
        self
    }

    /// Holds both analysis calls for `resume_id` until [`MockGateway::release`].
    pub fn gate(&self, resume_id: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(resume_id.to_string(), Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, resume_id: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(resume_id) {
            gate.add_permits(2);
        }
    }

    /// Holds the next history call, after its list was read, until a permit
    /// is added to the returned semaphore. Later calls are not held.
    pub fn hold_next_history(&self) -> Arc<Semaphore> {
        let hold = Arc::new(Semaphore::new(0));
        *self.history_hold.lock().unwrap() = Some(Arc::clone(&hold));
        hold
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn analysis_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::SkillGap(_) | Call::Optimize(_)))
            .count()
    }

    /// Yields until at least `n` calls of any kind have been made.
    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls.lock().unwrap().len() < n {
            tokio::task::yield_now().await;
        }
    }

    /// Yields until at least `n` analysis calls have been dispatched.
    pub async fn wait_for_analysis_calls(&self, n: usize) {
        while self.analysis_calls() < n {
            tokio::task::yield_now().await;
        }
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: Op) -> Result<(), GatewayError> {
        match self.failures.lock().unwrap().get(&op) {
            Some((status, detail)) => Err(GatewayError::Api {
                status: *status,
                detail: detail.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn pass_gate(&self, resume_id: &ResumeId) {
        let gate = self.gates.lock().unwrap().get(resume_id.as_str()).cloned();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

pub fn report_for(resume_id: &ResumeId) -> SkillGapReport {
    SkillGapReport {
        score: 64.0,
        summary: format!("report for {resume_id}"),
        comparisons: vec![],
    }
}

pub fn optimized_for(resume_id: &ResumeId) -> OptimizedResume {
    OptimizedResume {
        text: format!("optimized {resume_id}"),
    }
}

#[async_trait]
impl BackendGateway for MockGateway {
    async fn register_account(&self, request: &RegisterRequest) -> Result<(), GatewayError> {
        self.push(Call::Register(request.email.clone()));
        self.check(Op::Register)
    }

    async fn authenticate(
        &self,
        email: &str,
        _password: &str,
    ) -> Result<AccessToken, GatewayError> {
        self.push(Call::Authenticate(email.to_string()));
        self.check(Op::Authenticate)?;
        Ok(AccessToken {
            access_token: self.token.lock().unwrap().clone().unwrap_or_default(),
            token_type: Some("bearer".to_string()),
        })
    }

    async fn upload_resume(&self, file: &ResumeFile) -> Result<UploadReceipt, GatewayError> {
        self.push(Call::Upload(file.file_name.clone()));
        self.check(Op::Upload)?;
        let mut history = self.history.lock().unwrap();
        let id = format!("u{}", history.len() + 1);
        history.insert(0, Self::record(&id, &file.file_name, 28));
        Ok(UploadReceipt {
            resume_id: ResumeId::new(id),
            original_filename: Some(file.file_name.clone()),
            extracted_text_preview: None,
        })
    }

    async fn list_resume_history(&self) -> Result<Vec<ResumeRecord>, GatewayError> {
        self.push(Call::History);
        self.check(Op::History)?;
        let records = self.history.lock().unwrap().clone();
        let hold = self.history_hold.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.acquire().await.unwrap().forget();
        }
        Ok(records)
    }

    async fn analyze_skill_gap(
        &self,
        request: &SkillGapRequest,
    ) -> Result<SkillGapReport, GatewayError> {
        self.push(Call::SkillGap(request.clone()));
        self.pass_gate(&request.resume_id).await;
        self.check(Op::SkillGap)?;
        Ok(report_for(&request.resume_id))
    }

    async fn optimize_resume(
        &self,
        request: &OptimizeRequest,
    ) -> Result<OptimizedResume, GatewayError> {
        self.push(Call::Optimize(request.clone()));
        self.pass_gate(&request.resume_id).await;
        self.check(Op::Optimize)?;
        Ok(optimized_for(&request.resume_id))
    }
}
