//! Sign-up and sign-in. Registration never signs the user in; login hands the
//! issued credential to the session store, which owns it from then on.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::errors::{ValidationError, LOGIN_FALLBACK, REGISTER_FALLBACK};
use crate::gateway::BackendGateway;
use crate::models::user::RegisterRequest;
use crate::session::{SessionError, SessionStore};

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 72;

#[derive(Debug, Error)]
pub enum AuthFlowError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The service refused the request; carries the normalized message.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Clone)]
pub struct AuthFlow {
    gateway: Arc<dyn BackendGateway>,
    session: Arc<SessionStore>,
}

impl AuthFlow {
    pub fn new(gateway: Arc<dyn BackendGateway>, session: Arc<SessionStore>) -> Self {
        Self { gateway, session }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<(), AuthFlowError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::EmptyEmail.into());
        }
        check_password(password)?;

        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.gateway.register_account(&request).await.map_err(|e| {
            warn!("Registration rejected: {e}");
            AuthFlowError::Rejected(e.user_message(REGISTER_FALLBACK))
        })?;

        info!("Registered account {email}");
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthFlowError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::EmptyEmail.into());
        }

        let token = self
            .gateway
            .authenticate(email, password)
            .await
            .map_err(|e| {
                warn!("Login rejected: {e}");
                AuthFlowError::Rejected(e.user_message(LOGIN_FALLBACK))
            })?;

        self.session.login(&token.access_token)?;
        Ok(())
    }

    pub fn logout(&self) -> Result<(), AuthFlowError> {
        Ok(self.session.logout()?)
    }
}

fn check_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if (PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::PasswordLength {
            min: PASSWORD_MIN_LEN,
            max: PASSWORD_MAX_LEN,
        })
    }
}
