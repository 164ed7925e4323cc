use spdlog::{info, warn};

use crate::api::SessionVerifier;
use crate::session::{Session, TokenStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authorized,
    Unauthorized,
}

/// Gate in front of the admin pages.
///
/// Starts in `Checking` and settles on the first call to [`RouteGuard::check`];
/// later calls return the settled state without contacting the server.
pub struct RouteGuard {
    state: GuardState,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteGuard {
    pub fn new() -> Self {
        RouteGuard { state: GuardState::Checking }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub async fn check<S, V>(&mut self, session: &mut Session<S>, verifier: &V) -> GuardState
    where
        S: TokenStore,
        V: SessionVerifier + ?Sized,
    {
        if self.state != GuardState::Checking {
            return self.state;
        }

        let Some(token) = session.token().map(str::to_string) else {
            self.state = GuardState::Unauthorized;
            return self.state;
        };

        self.state = match verifier.verify(&token).await {
            Ok(()) => {
                info!("Session verified");
                GuardState::Authorized
            }
            Err(e) => {
                warn!("Session verification failed, clearing session: {}", e);
                if let Err(e) = session.clear_session() {
                    warn!("Error clearing session: {}", e);
                }
                GuardState::Unauthorized
            }
        };
        self.state
    }
}
