//! Scenario context
//!
//! The explicit state shared across the steps of a suite: registered
//! accounts, seeded exploration identifiers and the collections under
//! test. Owned by the workflow driver and passed to every step.

use crate::error::{HarnessError, HarnessResult};
use collection_model::{
    Account, ActorTag, Collection, CollectionId, ExplorationId, ModelError, PendingId,
};
use indexmap::IndexMap;

/// State shared by the steps of a suite
#[derive(Debug, Default)]
pub struct ScenarioContext {
    accounts: IndexMap<ActorTag, Account>,
    explorations: IndexMap<String, PendingId<ExplorationId>>,
    collections: IndexMap<String, Collection>,
    active: Option<String>,
}

impl ScenarioContext {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account under its scenario tag
    ///
    /// # Errors
    /// `HarnessError::DuplicateAccount` if the tag, username or email is taken.
    pub fn register_account(&mut self, tag: ActorTag, account: Account) -> HarnessResult<()> {
        if self.accounts.contains_key(&tag) {
            return Err(HarnessError::DuplicateAccount(format!(
                "an account is already registered as {tag}"
            )));
        }
        if let Some(existing) = self
            .accounts
            .values()
            .find(|a| a.username == account.username || a.email == account.email)
        {
            return Err(HarnessError::DuplicateAccount(format!(
                "{} / {} is already registered",
                existing.username, existing.email
            )));
        }
        self.accounts.insert(tag, account);
        Ok(())
    }

    /// Account registered under `tag`
    ///
    /// # Errors
    /// `HarnessError::Config` if no such account was provisioned.
    pub fn account(&self, tag: ActorTag) -> HarnessResult<&Account> {
        self.accounts
            .get(&tag)
            .ok_or_else(|| HarnessError::Config(format!("no {tag} account provisioned")))
    }

    /// Registered accounts in provisioning order
    pub fn accounts(&self) -> impl Iterator<Item = (ActorTag, &Account)> {
        self.accounts.iter().map(|(tag, account)| (*tag, account))
    }

    pub(crate) fn account_mut(&mut self, tag: ActorTag) -> HarnessResult<&mut Account> {
        self.accounts
            .get_mut(&tag)
            .ok_or_else(|| HarnessError::Config(format!("no {tag} account provisioned")))
    }

    /// Remember a seeded exploration's pending identifier under its title
    ///
    /// # Errors
    /// `HarnessError::Config` if the title is already seeded.
    pub fn record_exploration(
        &mut self,
        title: impl Into<String>,
        pending: PendingId<ExplorationId>,
    ) -> HarnessResult<()> {
        let title = title.into();
        if self.is_seeded(&title) {
            return Err(HarnessError::Config(format!(
                "an exploration titled {title} is already seeded"
            )));
        }
        self.explorations.insert(title, pending);
        Ok(())
    }

    #[inline]
    pub fn is_seeded(&self, title: &str) -> bool {
        self.explorations.contains_key(title)
    }

    /// Titles of the seeded explorations, in creation order
    pub fn exploration_titles(&self) -> impl Iterator<Item = &str> {
        self.explorations.keys().map(String::as_str)
    }

    /// Identifier of a seeded exploration, suspending until it resolves
    ///
    /// # Errors
    /// `ModelError::NotFound` for an unknown title, or
    /// `ModelError::UnresolvedReference` if resolution never happens.
    pub async fn exploration_id(&mut self, title: &str) -> HarnessResult<ExplorationId> {
        let pending = self
            .explorations
            .get_mut(title)
            .ok_or_else(|| ModelError::not_found(title))?;
        Ok(pending.wait_cloned().await?)
    }

    /// Title of a seeded exploration, waiting for every pending identifier
    ///
    /// # Errors
    /// `ModelError::UnresolvedReference` if some identifier never resolves.
    pub async fn seeded_title_of(&mut self, id: &ExplorationId) -> HarnessResult<Option<String>> {
        for (title, pending) in &mut self.explorations {
            if pending.wait().await? == id {
                return Ok(Some(title.clone()));
            }
        }
        Ok(None)
    }

    /// Store a collection under a label and make it the active one
    pub fn insert_collection(&mut self, label: impl Into<String>, collection: Collection) {
        let label = label.into();
        self.collections.insert(label.clone(), collection);
        self.active = Some(label);
    }

    /// Make a stored collection the active one
    ///
    /// # Errors
    /// `HarnessError::Config` for an unknown label.
    pub fn activate(&mut self, label: &str) -> HarnessResult<&CollectionId> {
        let collection = self
            .collections
            .get(label)
            .ok_or_else(|| HarnessError::Config(format!("no collection labelled {label}")))?;
        self.active = Some(label.to_string());
        Ok(collection.id())
    }

    /// Collection stored under `label`
    ///
    /// # Errors
    /// `HarnessError::Config` for an unknown label.
    pub fn collection(&self, label: &str) -> HarnessResult<&Collection> {
        self.collections
            .get(label)
            .ok_or_else(|| HarnessError::Config(format!("no collection labelled {label}")))
    }

    /// The collection the driver is working on
    ///
    /// # Errors
    /// `HarnessError::Config` if none was created or activated.
    pub fn active(&self) -> HarnessResult<&Collection> {
        let label = self.active_label()?;
        self.collection(label)
    }

    pub(crate) fn active_mut(&mut self) -> HarnessResult<&mut Collection> {
        let label = self.active_label()?.to_string();
        self.collections
            .get_mut(&label)
            .ok_or_else(|| HarnessError::Config(format!("no collection labelled {label}")))
    }

    fn active_label(&self) -> HarnessResult<&str> {
        self.active
            .as_deref()
            .ok_or_else(|| HarnessError::Config("no active collection".to_string()))
    }
}
