//! Session state machine
//!
//! `Anonymous` <-> `Authenticated(account)`. Login is only legal from
//! `Anonymous` and logout only from `Authenticated`, so role switches are
//! strictly sequential.

use crate::environment::AccountService;
use crate::error::{HarnessError, HarnessResult};
use collection_model::Account;

/// Who the harness is acting as
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(Account),
}

/// Tracks the single active session of a scenario
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    /// Account of the active session
    ///
    /// # Errors
    /// `HarnessError::NotAuthenticated` while anonymous.
    pub fn current(&self) -> HarnessResult<&Account> {
        match &self.state {
            SessionState::Authenticated(account) => Ok(account),
            SessionState::Anonymous => Err(HarnessError::NotAuthenticated(
                "operation requires a logged-in account".to_string(),
            )),
        }
    }

    /// Log in through the account service
    ///
    /// # Errors
    /// `HarnessError::AlreadyAuthenticated` if a session is active, or the
    /// service's error.
    pub async fn login<S>(&mut self, service: &S, account: &Account) -> HarnessResult<()>
    where
        S: AccountService + ?Sized,
    {
        if let SessionState::Authenticated(active) = &self.state {
            return Err(HarnessError::AlreadyAuthenticated(active.username.clone()));
        }
        service.login(&account.email).await?;
        tracing::info!(user = %account.username, "logged in");
        self.state = SessionState::Authenticated(account.clone());
        Ok(())
    }

    /// Record a session the service opened on its own (admin creation)
    ///
    /// # Errors
    /// `HarnessError::AlreadyAuthenticated` if a session is active.
    pub fn adopt(&mut self, account: Account) -> HarnessResult<()> {
        if let SessionState::Authenticated(active) = &self.state {
            return Err(HarnessError::AlreadyAuthenticated(active.username.clone()));
        }
        tracing::info!(user = %account.username, "logged in");
        self.state = SessionState::Authenticated(account);
        Ok(())
    }

    /// Log out; the local state is anonymous afterwards even if the
    /// service reports an error
    ///
    /// # Errors
    /// `HarnessError::NotAuthenticated` when already anonymous, or the
    /// service's error.
    pub async fn logout<S>(&mut self, service: &S) -> HarnessResult<()>
    where
        S: AccountService + ?Sized,
    {
        let SessionState::Authenticated(account) = std::mem::take(&mut self.state) else {
            return Err(HarnessError::NotAuthenticated("logout".to_string()));
        };
        let result = service.logout().await;
        match &result {
            Ok(()) => tracing::info!(user = %account.username, "logged out"),
            Err(e) => tracing::warn!(user = %account.username, "logout failed: {e}"),
        }
        result
    }

    /// Refresh the session copy of an account whose role changed
    pub fn refresh(&mut self, account: &Account) {
        if let SessionState::Authenticated(active) = &mut self.state {
            if active.username == account.username {
                *active = account.clone();
            }
        }
    }
}
