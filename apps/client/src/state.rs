use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::analysis::orchestrator::AnalysisOrchestrator;
use crate::auth::AuthFlow;
use crate::config::Config;
use crate::gateway::http::HttpGateway;
use crate::gateway::BackendGateway;
use crate::routes::guard::RouteGuard;
use crate::session::storage::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
use crate::session::{RequestAuth, SessionStore};

/// Everything a command needs, wired once at startup.
///
/// The session store and the HTTP gateway share one [`RequestAuth`], so a
/// login is visible to the very next request.
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration, kept for commands that need to report it.
    #[allow(dead_code)]
    pub config: Config,
    /// Read directly only by tests; commands go through `guard` and `auth`.
    #[allow(dead_code)]
    pub session: Arc<SessionStore>,
    /// Shared with `auth` and `orchestrator`; kept for direct service calls.
    #[allow(dead_code)]
    pub gateway: Arc<dyn BackendGateway>,
    pub guard: RouteGuard,
    pub auth: AuthFlow,
    pub orchestrator: Arc<AnalysisOrchestrator>,
}

impl AppState {
    /// `ephemeral` keeps the credential in memory for the life of the process.
    pub fn build(config: Config, ephemeral: bool) -> Result<Self> {
        let storage: Box<dyn CredentialStore> = if ephemeral {
            Box::new(MemoryCredentialStore::default())
        } else {
            Box::new(FileCredentialStore::new(config.session_file.clone()))
        };

        let auth = RequestAuth::default();
        let session = Arc::new(SessionStore::hydrate(storage, auth.clone()));

        let gateway: Arc<dyn BackendGateway> = Arc::new(
            HttpGateway::new(
                &config.api_url,
                Duration::from_secs(config.http_timeout_secs),
                auth,
            )
            .context("Failed to build HTTP client")?,
        );

        let orchestrator = Arc::new(AnalysisOrchestrator::new(Arc::clone(&gateway)));

        // Signing out abandons whatever analysis is in flight.
        let on_logout = Arc::clone(&orchestrator);
        session.subscribe(move |authenticated| {
            if !authenticated {
                on_logout.reset();
            }
        });

        Ok(Self {
            guard: RouteGuard::new(Arc::clone(&session)),
            auth: AuthFlow::new(Arc::clone(&gateway), Arc::clone(&session)),
            orchestrator,
            session,
            gateway,
            config,
        })
    }
}
