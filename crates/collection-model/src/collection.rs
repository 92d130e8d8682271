//! Collection aggregate
//!
//! Holds the committed (durable) state, a staged working copy, the
//! publication status and the commit history. All mutation goes through a
//! [`CollectionEditor`] obtained for an authorized account.

use crate::error::ModelError;
use crate::graph::CollectionGraph;
use crate::lifecycle::{next_status, CommitMessagePolicy, LifecycleAction};
use crate::types::{Account, CollectionId, CollectionMetadata, ExplorationId, PublicationStatus};
use serde::{Deserialize, Serialize};

/// Node sequence plus metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionState {
    pub graph: CollectionGraph,
    pub metadata: CollectionMetadata,
}

/// One persisted save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub version: u64,
    pub author: String,
    pub message: Option<String>,
    pub status: PublicationStatus,
    pub node_count: usize,
    pub nodes_changed: bool,
    pub metadata_changed: bool,
}

/// A collection and its lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    id: CollectionId,
    author: String,
    status: PublicationStatus,
    committed: CollectionState,
    staged: CollectionState,
    pending_commit_message: Option<String>,
    version: u64,
    history: Vec<CommitRecord>,
    commit_policy: CommitMessagePolicy,
}

impl Collection {
    /// Create an empty unpublished collection owned by `author`
    ///
    /// # Errors
    /// `ModelError::Permission` if the author lacks the collection editor grant.
    pub fn create(
        id: CollectionId,
        author: &Account,
        commit_policy: CommitMessagePolicy,
    ) -> Result<Self, ModelError> {
        if !author.role.can_edit_collections() {
            return Err(ModelError::Permission(format!(
                "{} ({}) cannot create collections",
                author.username, author.role
            )));
        }
        Ok(Self {
            id,
            author: author.username.clone(),
            status: PublicationStatus::Unpublished,
            committed: CollectionState::default(),
            staged: CollectionState::default(),
            pending_commit_message: None,
            version: 0,
            history: Vec::new(),
            commit_policy,
        })
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &CollectionId {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> PublicationStatus {
        self.status
    }

    /// Durable state as a reload would see it
    #[inline]
    #[must_use]
    pub fn committed(&self) -> &CollectionState {
        &self.committed
    }

    /// Working copy including unsaved changes
    #[inline]
    #[must_use]
    pub fn staged(&self) -> &CollectionState {
        &self.staged
    }

    /// Number of successful saves
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    #[must_use]
    pub fn history(&self) -> &[CommitRecord] {
        &self.history
    }

    #[inline]
    #[must_use]
    pub fn pending_commit_message(&self) -> Option<&str> {
        self.pending_commit_message.as_deref()
    }

    /// Whether the working copy differs from the durable state
    #[must_use]
    pub fn has_staged_changes(&self) -> bool {
        self.staged != self.committed
    }

    /// Non-authors only see published collections
    #[must_use]
    pub fn is_visible_to(&self, viewer: &Account) -> bool {
        self.status == PublicationStatus::Published || viewer.username == self.author
    }

    /// Open the collection for editing as `actor`
    ///
    /// # Errors
    /// `ModelError::Permission` unless the actor holds the collection editor
    /// grant and is the author or an admin.
    pub fn edit(&mut self, actor: &Account) -> Result<CollectionEditor<'_>, ModelError> {
        if !actor.role.can_edit_collections() {
            return Err(ModelError::Permission(format!(
                "{} ({}) cannot edit collections",
                actor.username, actor.role
            )));
        }
        if actor.username != self.author && !actor.is_admin() {
            return Err(ModelError::Permission(format!(
                "{} is not the author of collection {}",
                actor.username, self.id
            )));
        }
        Ok(CollectionEditor {
            collection: self,
            actor: actor.username.clone(),
        })
    }

    fn commit(
        &mut self,
        actor: &str,
        message: Option<&str>,
        action: LifecycleAction,
    ) -> Result<u64, ModelError> {
        let nodes_changed = self.staged.graph != self.committed.graph;
        let metadata_changed = self.staged.metadata != self.committed.metadata;
        let next = next_status(self.status, action)?;

        let message = message
            .or(self.pending_commit_message.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        if message.is_none()
            && self
                .commit_policy
                .requires_message(self.status, nodes_changed, metadata_changed)
        {
            return Err(ModelError::CommitMessageRequired {
                status: self.status,
            });
        }

        if !nodes_changed && !metadata_changed && next == self.status {
            self.pending_commit_message = None;
            return Ok(self.version);
        }

        self.committed = self.staged.clone();
        self.status = next;
        self.version += 1;
        self.pending_commit_message = None;
        self.history.push(CommitRecord {
            version: self.version,
            author: actor.to_string(),
            message,
            status: next,
            node_count: self.committed.graph.len(),
            nodes_changed,
            metadata_changed,
        });
        Ok(self.version)
    }
}

/// Mutating handle for an authorized account
#[derive(Debug)]
pub struct CollectionEditor<'a> {
    collection: &'a mut Collection,
    actor: String,
}

impl CollectionEditor<'_> {
    /// Read access to the collection being edited
    #[inline]
    #[must_use]
    pub fn collection(&self) -> &Collection {
        self.collection
    }

    /// Append an exploration
    ///
    /// # Errors
    /// `ModelError::DuplicateNode` if already present.
    pub fn add_node(&mut self, id: ExplorationId) -> Result<usize, ModelError> {
        self.collection.staged.graph.add_node(id)
    }

    /// # Errors
    /// `ModelError::OutOfRange` if `position` is not a node.
    pub fn shift_node_left(&mut self, position: usize) -> Result<bool, ModelError> {
        self.collection.staged.graph.shift_left(position)
    }

    /// # Errors
    /// `ModelError::OutOfRange` if `position` is not a node.
    pub fn shift_node_right(&mut self, position: usize) -> Result<bool, ModelError> {
        self.collection.staged.graph.shift_right(position)
    }

    /// # Errors
    /// `ModelError::OutOfRange` if `position` is not a node.
    pub fn delete_node(&mut self, position: usize) -> Result<ExplorationId, ModelError> {
        self.collection.staged.graph.delete_node(position)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.collection.staged.metadata.title = title.into();
    }

    pub fn set_objective(&mut self, objective: impl Into<String>) {
        self.collection.staged.metadata.objective = objective.into();
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.collection.staged.metadata.category = category.into();
    }

    /// Stage the message used by the next save
    pub fn set_commit_message(&mut self, message: impl Into<String>) {
        self.collection.pending_commit_message = Some(message.into());
    }

    /// Persist staged changes; unpublished collections become draft-saved
    ///
    /// # Errors
    /// `ModelError::CommitMessageRequired` per the collection's policy.
    pub fn save_draft(&mut self, message: Option<&str>) -> Result<u64, ModelError> {
        self.collection
            .commit(&self.actor, message, LifecycleAction::SaveDraft)
    }

    /// Make the collection visible to everyone
    ///
    /// Staged changes are persisted with the status change.
    ///
    /// # Errors
    /// `ModelError::InvalidState` if no draft has been saved yet.
    pub fn publish(&mut self) -> Result<u64, ModelError> {
        self.collection
            .commit(&self.actor, None, LifecycleAction::Publish)
    }

    /// Persist staged node and metadata changes atomically
    ///
    /// # Errors
    /// `ModelError::CommitMessageRequired` per the collection's policy.
    pub fn save_changes(&mut self, message: Option<&str>) -> Result<u64, ModelError> {
        self.collection
            .commit(&self.actor, message, LifecycleAction::SaveChanges)
    }

    /// Discard staged changes
    pub fn reload(&mut self) {
        self.collection.staged = self.collection.committed.clone();
        self.collection.pending_commit_message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn editor() -> Account {
        Account::new("alice@collections.com", "aliceCollections")
            .with_role(Role::CollectionEditor)
    }

    fn new_collection() -> Collection {
        Collection::create(
            CollectionId::new("col-1"),
            &editor(),
            CommitMessagePolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn ungranted_account_cannot_create_or_edit() {
        let creator = Account::new("creator@explorations.com", "creatorExplorations");
        let err = Collection::create(CollectionId::new("x"), &creator, CommitMessagePolicy::default())
            .unwrap_err();
        assert!(matches!(err, ModelError::Permission(_)));

        let mut collection = new_collection();
        assert!(matches!(collection.edit(&creator), Err(ModelError::Permission(_))));
    }

    #[test]
    fn non_author_editor_is_rejected_but_admin_is_not() {
        let mut collection = new_collection();
        let other = Account::new("p@c.com", "playerCollections")
            .with_role(Role::CollectionEditor);
        assert!(matches!(collection.edit(&other), Err(ModelError::Permission(_))));

        let admin = Account::new("a@c.com", "testadm").with_role(Role::Admin);
        assert!(collection.edit(&admin).is_ok());
    }

    #[test]
    fn publish_before_draft_is_invalid() {
        let mut collection = new_collection();
        let mut edit = collection.edit(&editor()).unwrap();
        edit.add_node(ExplorationId::new("e1")).unwrap();
        let err = edit.publish().unwrap_err();
        assert!(matches!(err, ModelError::InvalidState { .. }));
        assert_eq!(collection.status(), PublicationStatus::Unpublished);
        assert!(collection.committed().graph.is_empty());
    }

    #[test]
    fn draft_then_publish() {
        let mut collection = new_collection();
        let author = editor();
        {
            let mut edit = collection.edit(&author).unwrap();
            edit.add_node(ExplorationId::new("e1")).unwrap();
            assert_eq!(edit.save_draft(None).unwrap(), 1);
            assert_eq!(edit.save_draft(None).unwrap(), 1);
            assert_eq!(edit.publish().unwrap(), 2);
        }
        assert_eq!(collection.status(), PublicationStatus::Published);
        assert_eq!(collection.history().len(), 2);
    }

    #[test]
    fn metadata_round_trips_through_save_and_reload() {
        let mut collection = new_collection();
        let author = editor();
        let mut edit = collection.edit(&author).unwrap();
        edit.set_title("Test Collection");
        edit.save_changes(None).unwrap();
        edit.set_title("Unsaved");
        edit.reload();
        assert_eq!(collection.committed().metadata.title, "Test Collection");
        assert_eq!(collection.staged().metadata.title, "Test Collection");
    }

    #[test]
    fn published_node_change_needs_commit_message() {
        let mut collection = new_collection();
        let author = editor();
        let mut edit = collection.edit(&author).unwrap();
        edit.add_node(ExplorationId::new("e1")).unwrap();
        edit.save_draft(None).unwrap();
        edit.publish().unwrap();

        edit.set_category("Algebra");
        edit.save_changes(None).unwrap();

        edit.add_node(ExplorationId::new("e2")).unwrap();
        assert!(matches!(
            edit.save_draft(None),
            Err(ModelError::CommitMessageRequired { .. })
        ));
        edit.set_commit_message("Add Exploration");
        edit.save_draft(None).unwrap();

        let last = collection.history().last().unwrap();
        assert_eq!(last.message.as_deref(), Some("Add Exploration"));
        assert_eq!(last.node_count, 2);
        assert!(collection.pending_commit_message().is_none());
    }

    #[test]
    fn visibility_follows_publication() {
        let mut collection = new_collection();
        let viewer = Account::new("p@c.com", "player");
        assert!(!collection.is_visible_to(&viewer));
        assert!(collection.is_visible_to(&editor()));

        let author = editor();
        let mut edit = collection.edit(&author).unwrap();
        edit.save_draft(None).unwrap();
        edit.publish().unwrap();
        assert!(collection.is_visible_to(&viewer));
    }
}
