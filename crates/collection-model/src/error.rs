//! Error types for the collection model
//!
//! Every rejected operation leaves the model unchanged.

use crate::types::PublicationStatus;

/// Collection model error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Exploration already referenced by the collection
    #[error("duplicate node: exploration {0} is already in the collection")]
    DuplicateNode(String),

    /// Search or lookup produced no unique match
    #[error("not found: {query}{}", format_candidates(.candidates))]
    NotFound {
        /// What was looked up
        query: String,
        /// Ambiguous candidates, empty when nothing matched
        candidates: Vec<String>,
    },

    /// Position outside the node sequence
    #[error("position {position} out of range (len {len})")]
    OutOfRange { position: usize, len: usize },

    /// Illegal lifecycle transition
    #[error("cannot {action} a collection in state {status}")]
    InvalidState {
        action: &'static str,
        status: PublicationStatus,
    },

    /// Identifier consumed before asynchronous resolution completed
    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    /// Acting account lacks the required grant
    #[error("permission denied: {0}")]
    Permission(String),

    /// Save of a published collection without a commit message
    #[error("commit message required to save {status} collection")]
    CommitMessageRequired { status: PublicationStatus },
}

impl ModelError {
    /// Not found with no candidates
    #[inline]
    pub fn not_found(query: impl Into<String>) -> Self {
        Self::NotFound {
            query: query.into(),
            candidates: Vec::new(),
        }
    }

    /// Ambiguous lookup
    #[inline]
    pub fn ambiguous(query: impl Into<String>, candidates: Vec<String>) -> Self {
        Self::NotFound {
            query: query.into(),
            candidates,
        }
    }
}

fn format_candidates(candidates: &[String]) -> String {
    if candidates.is_empty() {
        String::new()
    } else {
        format!(" (ambiguous: {})", candidates.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        assert_eq!(ModelError::not_found("Lazy").to_string(), "not found: Lazy");
        let err = ModelError::ambiguous("discover", vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "not found: discover (ambiguous: a, b)");
    }

    #[test]
    fn invalid_state_display() {
        let err = ModelError::InvalidState {
            action: "publish",
            status: PublicationStatus::Unpublished,
        };
        assert!(err.to_string().contains("publish"));
        assert!(err.to_string().contains("unpublished"));
    }
}
