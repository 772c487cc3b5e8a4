//! Route gating. Trust-on-read: the decision comes from whatever credential the
//! session holds right now, with no network validation. An expired credential
//! is only discovered when a request made from the protected view fails.

use std::sync::Arc;

use tracing::debug;

use crate::routes::{Route, PUBLIC_ENTRY};
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Unauthenticated,
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render(Route),
    /// Replace the current location with this route.
    Redirect(Route),
}

#[derive(Clone)]
pub struct RouteGuard {
    session: Arc<SessionStore>,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    pub fn state(&self) -> GuardState {
        if self.session.is_authenticated() {
            GuardState::Authenticated
        } else {
            GuardState::Unauthenticated
        }
    }

    /// Public routes always render; protected ones only for a signed-in session.
    pub fn evaluate(&self, route: Route) -> GuardDecision {
        if !route.is_protected() {
            return GuardDecision::Render(route);
        }
        match self.state() {
            GuardState::Authenticated => GuardDecision::Render(route),
            GuardState::Unauthenticated => {
                debug!("Redirecting {} to {}", route.path(), PUBLIC_ENTRY.path());
                GuardDecision::Redirect(PUBLIC_ENTRY)
            }
        }
    }

    /// Resolves a raw path. Unknown paths fall back to the home page.
    pub fn navigate(&self, path: &str) -> GuardDecision {
        match Route::from_path(path) {
            Some(route) => self.evaluate(route),
            None => GuardDecision::Redirect(Route::Home),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::storage::MemoryCredentialStore;
    use crate::session::RequestAuth;

    fn guard_with(token: Option<&str>) -> (RouteGuard, Arc<SessionStore>) {
        let storage = match token {
            Some(t) => MemoryCredentialStore::with_token(t),
            None => MemoryCredentialStore::default(),
        };
        let session = Arc::new(SessionStore::hydrate(
            Box::new(storage),
            RequestAuth::default(),
        ));
        (RouteGuard::new(Arc::clone(&session)), session)
    }

    #[test]
    fn test_hydrated_session_renders_dashboard_on_first_evaluation() {
        let (guard, _) = guard_with(Some("stored"));
        assert_eq!(guard.state(), GuardState::Authenticated);
        assert_eq!(
            guard.evaluate(Route::Dashboard),
            GuardDecision::Render(Route::Dashboard)
        );
    }

    #[test]
    fn test_signed_out_is_redirected_to_login() {
        let (guard, _) = guard_with(None);
        assert_eq!(
            guard.navigate("/dashboard"),
            GuardDecision::Redirect(Route::Login)
        );
        assert_eq!(
            guard.navigate("/register"),
            GuardDecision::Render(Route::Register)
        );
    }

    #[test]
    fn test_guard_follows_login_and_logout() {
        let (guard, session) = guard_with(None);
        session.login("fresh").unwrap();
        assert_eq!(
            guard.evaluate(Route::Dashboard),
            GuardDecision::Render(Route::Dashboard)
        );
        session.logout().unwrap();
        assert_eq!(
            guard.evaluate(Route::Dashboard),
            GuardDecision::Redirect(Route::Login)
        );
    }

    #[test]
    fn test_unknown_path_goes_home() {
        let (guard, _) = guard_with(Some("x"));
        assert_eq!(guard.navigate("/nope"), GuardDecision::Redirect(Route::Home));
    }
}
