//! Backend gateway: every call to the analysis service goes through this trait.
//!
//! The orchestrator and auth flow only see `Arc<dyn BackendGateway>`; the
//! reqwest-backed [`http::HttpGateway`] is wired in at startup and tests swap
//! in an in-memory double. Implementations do not retry and do not cache.

#![allow(dead_code)]

use async_trait::async_trait;
use thiserror::Error;

use crate::errors::{normalize_message, ErrorDetail};
use crate::models::analysis::{OptimizeRequest, SkillGapReport, SkillGapRequest};
use crate::models::resume::{OptimizedResume, ResumeFile, ResumeRecord, UploadReceipt};
use crate::models::user::{AccessToken, RegisterRequest};

pub mod http;
#[cfg(test)]
pub mod mock;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a response (connect, timeout, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status})")]
    Api {
        status: u16,
        detail: Option<ErrorDetail>,
    },

    #[error("malformed response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            GatewayError::Api { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Api { status, .. } => Some(*status),
            GatewayError::Http(e) => e.status().map(|s| s.as_u16()),
            GatewayError::Decode(_) => None,
        }
    }

    /// The one string shown to the user for this failure.
    pub fn user_message(&self, fallback: &str) -> String {
        normalize_message(self.detail(), fallback)
    }
}

#[async_trait]
pub trait BackendGateway: Send + Sync {
    async fn register_account(&self, request: &RegisterRequest) -> Result<(), GatewayError>;

    async fn authenticate(&self, email: &str, password: &str)
        -> Result<AccessToken, GatewayError>;

    async fn upload_resume(&self, file: &ResumeFile) -> Result<UploadReceipt, GatewayError>;

    /// Most recent first.
    async fn list_resume_history(&self) -> Result<Vec<ResumeRecord>, GatewayError>;

    async fn analyze_skill_gap(
        &self,
        request: &SkillGapRequest,
    ) -> Result<SkillGapReport, GatewayError>;

    async fn optimize_resume(
        &self,
        request: &OptimizeRequest,
    ) -> Result<OptimizedResume, GatewayError>;
}
