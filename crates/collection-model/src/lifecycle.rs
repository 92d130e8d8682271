//! Collection publication state machine
//!
//! unpublished -> draft-saved -> published. Publishing requires a saved
//! draft; saving a draft again is idempotent.

use crate::error::ModelError;
use crate::types::PublicationStatus;
use serde::{Deserialize, Serialize};

/// Lifecycle-changing actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleAction {
    SaveDraft,
    SaveChanges,
    Publish,
}

impl LifecycleAction {
    /// Verb used in error messages
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            LifecycleAction::SaveDraft => "save draft of",
            LifecycleAction::SaveChanges => "save changes to",
            LifecycleAction::Publish => "publish",
        }
    }
}

/// Statuses reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: PublicationStatus) -> Vec<PublicationStatus> {
    use PublicationStatus::*;
    match from {
        Unpublished => vec![DraftSaved],
        DraftSaved => vec![DraftSaved, Published],
        Published => vec![Published],
    }
}

/// Status after applying `action` in `from`
///
/// # Errors
/// `ModelError::InvalidState` when publishing without a saved draft.
pub fn next_status(
    from: PublicationStatus,
    action: LifecycleAction,
) -> Result<PublicationStatus, ModelError> {
    use PublicationStatus::*;
    let to = match (from, action) {
        (Unpublished, LifecycleAction::Publish) => {
            return Err(ModelError::InvalidState {
                action: action.verb(),
                status: from,
            })
        }
        (Unpublished | DraftSaved, LifecycleAction::SaveDraft | LifecycleAction::SaveChanges) => {
            DraftSaved
        }
        (DraftSaved | Published, LifecycleAction::Publish) => Published,
        (Published, _) => Published,
    };
    debug_assert!(allowed_transitions(from).contains(&to));
    Ok(to)
}

/// When a save must carry a commit message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMessagePolicy {
    /// Published collections with staged node changes
    #[default]
    WhenPublishedWithNodeChanges,
    /// Published collections with any staged change
    WhenPublished,
    /// Every save that changes something
    Always,
    /// Never required
    Never,
}

impl CommitMessagePolicy {
    /// Whether a save in `status` with the given staged changes needs a message
    #[must_use]
    pub fn requires_message(
        &self,
        status: PublicationStatus,
        nodes_changed: bool,
        metadata_changed: bool,
    ) -> bool {
        let published = status == PublicationStatus::Published;
        match self {
            CommitMessagePolicy::WhenPublishedWithNodeChanges => published && nodes_changed,
            CommitMessagePolicy::WhenPublished => published && (nodes_changed || metadata_changed),
            CommitMessagePolicy::Always => nodes_changed || metadata_changed,
            CommitMessagePolicy::Never => false,
        }
    }
}
