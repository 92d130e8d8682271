//! Error types for the scenario harness
//!
//! Every error aborts the current scenario step and is surfaced in the
//! suite report; none are recovered silently.

use collection_model::ModelError;
use serde::{Deserialize, Serialize};

/// Main harness error type
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Username or email already registered
    #[error("duplicate account: {0}")]
    DuplicateAccount(String),

    /// Acting account lacks the required capability
    #[error("permission denied: {0}")]
    Permission(String),

    /// Operation issued with no authenticated session
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    /// Login attempted while another session is active
    #[error("session already authenticated as {0}")]
    AlreadyAuthenticated(String),

    /// Collection model rejected the operation
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Observed client reported runtime errors
    #[error("verification failed at {step}: {} observed error(s): {}", errors.len(), errors.join("; "))]
    VerificationFailure {
        /// Step after which the check ran
        step: String,
        /// Full list of observed errors
        errors: Vec<String>,
    },

    /// Environment (system under test) failure
    #[error("environment error: {0}")]
    Environment(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl HarnessError {
    /// Classify the error for reporting
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateAccount(_) => ErrorKind::DuplicateAccount,
            Self::Permission(_) | Self::Model(ModelError::Permission(_)) => ErrorKind::Permission,
            Self::NotAuthenticated(_) | Self::AlreadyAuthenticated(_) => ErrorKind::Session,
            Self::Model(ModelError::DuplicateNode(_)) => ErrorKind::DuplicateNode,
            Self::Model(ModelError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Model(ModelError::OutOfRange { .. }) => ErrorKind::OutOfRange,
            Self::Model(ModelError::InvalidState { .. }) => ErrorKind::InvalidState,
            Self::Model(ModelError::CommitMessageRequired { .. }) => ErrorKind::CommitMessageRequired,
            Self::Model(ModelError::UnresolvedReference(_)) => ErrorKind::UnresolvedReference,
            Self::VerificationFailure { .. } => ErrorKind::VerificationFailure,
            Self::Environment(_) => ErrorKind::Environment,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Observed runtime errors carried by a verification failure
    #[must_use]
    pub fn observed_errors(&self) -> &[String] {
        match self {
            Self::VerificationFailure { errors, .. } => errors,
            _ => &[],
        }
    }

    /// Whether this is a permission rejection from either layer
    #[inline]
    #[must_use]
    pub fn is_permission(&self) -> bool {
        self.kind() == ErrorKind::Permission
    }
}

/// Error classification used in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DuplicateAccount,
    Permission,
    Session,
    DuplicateNode,
    NotFound,
    OutOfRange,
    InvalidState,
    CommitMessageRequired,
    UnresolvedReference,
    VerificationFailure,
    Environment,
    Config,
}

/// Result alias used throughout the harness
pub type HarnessResult<T> = Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;
    use collection_model::PublicationStatus;

    #[test]
    fn model_errors_keep_their_kind() {
        let err: HarnessError = ModelError::InvalidState {
            action: "publish",
            status: PublicationStatus::Unpublished,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err: HarnessError = ModelError::Permission("nope".into()).into();
        assert!(err.is_permission());
    }

    #[test]
    fn verification_failure_lists_every_error() {
        let err = HarnessError::VerificationFailure {
            step: "player view".into(),
            errors: vec!["TypeError: x is undefined".into(), "404 /collection/c1".into()],
        };
        let text = err.to_string();
        assert!(text.contains("2 observed error(s)"));
        assert!(text.contains("TypeError: x is undefined"));
        assert!(text.contains("404 /collection/c1"));
        assert_eq!(err.observed_errors().len(), 2);
    }
}
