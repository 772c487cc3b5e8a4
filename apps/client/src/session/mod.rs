//! Session: the single authority over the bearer credential.
//!
//! Three readers depend on it: the route guard (is the user signed in?), the
//! request-attachment layer (which bearer goes on outgoing calls?) and any
//! subscriber that reacts to sign-in/sign-out.
//!
//! Transition order on login: persist → attach → flip flag + notify.
//! A subscriber woken by the flag can issue a request immediately and it will
//! carry the new credential.

#![allow(dead_code)]

pub mod storage;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use thiserror::Error;
use tracing::{info, warn};

use crate::session::storage::{CredentialStore, StorageError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("credential must not be empty")]
    EmptyCredential,

    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),
}

// ────────────────────────────────────────────────────────────────────────────
// Request attachment
// ────────────────────────────────────────────────────────────────────────────

/// Default `Authorization` value for outgoing requests.
///
/// Cloned into the gateway; only [`SessionStore`] writes to it.
#[derive(Debug, Clone, Default)]
pub struct RequestAuth {
    bearer: Arc<RwLock<Option<String>>>,
}

impl RequestAuth {
    pub fn bearer(&self) -> Option<String> {
        self.bearer
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Adds `Authorization: Bearer <credential>` when a credential is set.
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.bearer() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn set(&self, credential: Option<String>) {
        *self
            .bearer
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = credential;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Session store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    credential: Option<String>,
}

impl Session {
    fn from_credential(credential: Option<String>) -> Self {
        Self {
            credential: credential.filter(|c| !c.is_empty()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(bool) + Send + Sync>;

pub struct SessionStore {
    storage: Box<dyn CredentialStore>,
    auth: RequestAuth,
    session: RwLock<Session>,
    /// Serializes login/logout so transitions never interleave.
    transition: Mutex<()>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl SessionStore {
    /// Reads the stored credential once and wires it into `auth`.
    ///
    /// Unreadable storage starts the process signed out rather than failing.
    pub fn hydrate(storage: Box<dyn CredentialStore>, auth: RequestAuth) -> Self {
        let stored = match storage.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Ignoring unreadable session storage: {e}");
                None
            }
        };
        let session = Session::from_credential(stored);
        auth.set(session.credential.clone());
        info!(
            "Session hydrated (authenticated: {})",
            session.is_authenticated()
        );

        Self {
            storage,
            auth,
            session: RwLock::new(session),
            transition: Mutex::new(()),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_session().is_authenticated()
    }

    /// The attachment layer this store drives.
    pub fn request_auth(&self) -> &RequestAuth {
        &self.auth
    }

    /// Adopts a credential issued by the service. Nothing changes if persisting fails.
    pub fn login(&self, credential: &str) -> Result<(), SessionError> {
        if credential.is_empty() {
            return Err(SessionError::EmptyCredential);
        }
        let _guard = lock(&self.transition);

        self.storage.save(credential)?;
        self.auth.set(Some(credential.to_string()));
        *self.write_session() = Session::from_credential(Some(credential.to_string()));

        info!("Signed in");
        self.notify(true);
        Ok(())
    }

    /// Drops the credential. In-memory state is cleared even when the storage
    /// clear fails; that failure is still returned.
    pub fn logout(&self) -> Result<(), SessionError> {
        let _guard = lock(&self.transition);

        let cleared = self.storage.clear();
        if let Err(e) = &cleared {
            warn!("Failed to clear session storage: {e}");
        }
        self.auth.set(None);
        *self.write_session() = Session::default();

        info!("Signed out");
        self.notify(false);
        cleared.map_err(SessionError::from)
    }

    /// Registers a listener called with the new authenticated flag after every
    /// login/logout. Listeners must not call back into `login`/`logout`.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn notify(&self, authenticated: bool) {
        let listeners: Vec<Listener> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(authenticated);
        }
    }

    fn read_session(&self) -> std::sync::RwLockReadGuard<'_, Session> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_session(&self) -> std::sync::RwLockWriteGuard<'_, Session> {
        self.session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
