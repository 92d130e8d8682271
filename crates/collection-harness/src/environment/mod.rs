//! External interfaces of the system under test
//!
//! The harness never reaches into the application directly. Account
//! provisioning, content authoring, the collection editor surface,
//! navigation and console observation are consumed through these traits.
//! [`SimulatedEnvironment`] implements all of them in-process.

pub mod simulated;

pub use simulated::{RenderFault, SimulatedEnvironment};

use crate::error::HarnessResult;
use async_trait::async_trait;
use collection_model::{
    CollectionId, CollectionMetadata, ExplorationId, ExplorationSummary, PendingId,
    PublicationStatus, Role,
};
use serde::{Deserialize, Serialize};

/// Account provisioning and sessions
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Register a user with the default role
    async fn create_user(&self, email: &str, username: &str) -> HarnessResult<()>;

    /// Register an administrator and log in as them
    async fn create_and_login_admin_user(&self, email: &str, username: &str) -> HarnessResult<()>;

    async fn login(&self, email: &str) -> HarnessResult<()>;

    async fn logout(&self) -> HarnessResult<()>;

    /// Grant a role; the current session must be an admin
    async fn update_role(&self, username: &str, role: Role) -> HarnessResult<()>;
}

/// Exploration authoring and search
#[async_trait]
pub trait ContentAuthoring: Send + Sync {
    /// Create and publish an exploration as the current user
    ///
    /// The identifier is delivered asynchronously through the returned token.
    async fn create_and_publish_exploration(
        &self,
        title: &str,
        category: &str,
        objective: &str,
    ) -> HarnessResult<PendingId<ExplorationId>>;

    /// Published explorations matching `query`, in creation order
    async fn search_explorations(&self, query: &str) -> HarnessResult<Vec<ExplorationSummary>>;
}

/// Collection editor surface, acting on the collection open in the editor
#[async_trait]
pub trait CollectionSurface: Send + Sync {
    /// Create a collection and open it in the editor
    async fn create_collection(&self) -> HarnessResult<PendingId<CollectionId>>;

    async fn add_existing_exploration(&self, id: &ExplorationId) -> HarnessResult<()>;

    async fn shift_node_left(&self, position: usize) -> HarnessResult<()>;

    async fn shift_node_right(&self, position: usize) -> HarnessResult<()>;

    async fn delete_node(&self, position: usize) -> HarnessResult<()>;

    /// Open the save modal
    async fn save_draft(&self) -> HarnessResult<()>;

    async fn set_commit_message(&self, message: &str) -> HarnessResult<()>;

    /// Confirm the save modal, persisting staged changes
    async fn close_save_modal(&self) -> HarnessResult<()>;

    async fn publish_collection(&self) -> HarnessResult<()>;

    async fn set_title(&self, title: &str) -> HarnessResult<()>;

    async fn set_objective(&self, objective: &str) -> HarnessResult<()>;

    async fn set_category(&self, category: &str) -> HarnessResult<()>;

    async fn save_changes(&self) -> HarnessResult<()>;
}

/// Page navigation
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Load a page and wait for it to settle
    async fn get(&self, url: &str) -> HarnessResult<Page>;
}

/// Client-side error observation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConsoleObserver: Send + Sync {
    /// Errors logged since the last check that are not in `expected`
    async fn check_for_console_errors(&self, expected: &[String]) -> HarnessResult<Vec<String>>;
}

/// Everything the harness consumes
pub trait Environment:
    AccountService + ContentAuthoring + CollectionSurface + Navigator + ConsoleObserver
{
}

impl<T> Environment for T where
    T: AccountService + ContentAuthoring + CollectionSurface + Navigator + ConsoleObserver
{
}

/// Page loaded by [`Navigator::get`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Page {
    /// Read-only collection player
    Player(PlayerView),
    /// Collection editor
    Editor(CollectionId),
    /// Any other page, or an error page
    Other(String),
}

/// What the collection player rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub collection_id: CollectionId,
    pub metadata: CollectionMetadata,
    pub status: PublicationStatus,
    pub nodes: Vec<ExplorationId>,
}
