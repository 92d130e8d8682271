//! Workflow driver
//!
//! Issues role-scoped authoring actions against the environment and
//! mirrors each one onto the in-test collection model, which is
//! authoritative for the expected state. Owns the session, the scenario
//! context and the verifier; nothing is ambient.

use crate::config::{HarnessConfig, SearchPolicy};
use crate::context::ScenarioContext;
use crate::environment::{Environment, Page, PlayerView};
use crate::error::{ErrorKind, HarnessError, HarnessResult};
use crate::fixture::IdentityFixture;
use crate::report::{StepOutcome, StepRecord};
use crate::seeder::ContentSeeder;
use crate::session::Session;
use crate::verify::Verifier;
use collection_model::{
    ActorTag, Collection, CollectionEditor, CollectionId, ExplorationId, ModelError,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Drives one suite against an [`Environment`]
pub struct WorkflowDriver<E: ?Sized> {
    env: Arc<E>,
    config: HarnessConfig,
    session: Session,
    context: ScenarioContext,
    verifier: Verifier,
    steps: Vec<StepRecord>,
}

impl<E> WorkflowDriver<E>
where
    E: Environment + ?Sized,
{
    pub fn new(env: Arc<E>, config: HarnessConfig) -> Self {
        Self {
            env,
            config,
            session: Session::new(),
            context: ScenarioContext::new(),
            verifier: Verifier::new(),
            steps: Vec::new(),
        }
    }

    /// Tolerate console errors containing any of `expected`
    #[must_use]
    pub fn with_expected_errors(mut self, expected: Vec<String>) -> Self {
        self.verifier = Verifier::new().with_expected(expected);
        self
    }

    #[inline]
    pub fn env(&self) -> &Arc<E> {
        &self.env
    }

    #[inline]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[inline]
    pub fn context(&self) -> &ScenarioContext {
        &self.context
    }

    /// Verification checks performed so far
    #[inline]
    pub fn verification_checks(&self) -> usize {
        self.verifier.checks()
    }

    /// Identity provisioning bound to this driver's session and context
    pub fn identity(&mut self) -> IdentityFixture<'_, E> {
        IdentityFixture::new(&*self.env, &mut self.session, &mut self.context)
    }

    /// Content seeding bound to this driver's session and context
    pub fn seeder(&mut self) -> ContentSeeder<'_, E> {
        ContentSeeder::new(&*self.env, &mut self.session, &mut self.context)
    }

    // ------------------------------------------------------------------
    // Journal
    // ------------------------------------------------------------------

    /// Journal a step's result and pass it through
    pub fn record<T>(&mut self, step: impl Into<String>, result: HarnessResult<T>) -> HarnessResult<T> {
        let step = step.into();
        let actor = self.session.current().ok().map(|a| a.username.clone());
        let outcome = match &result {
            Ok(_) => {
                tracing::info!(step = %step, actor = actor.as_deref(), "step passed");
                StepOutcome::Passed
            }
            Err(e) => {
                tracing::warn!(step = %step, actor = actor.as_deref(), kind = ?e.kind(), "step failed: {e}");
                StepOutcome::failed(e)
            }
        };
        self.steps.push(StepRecord::new(step, actor, outcome));
        result
    }

    /// Re-label the last failed step as a rejection the scenario required
    pub fn mark_rejected(&mut self, kind: ErrorKind) {
        if let Some(last) = self.steps.last_mut() {
            if matches!(last.outcome, StepOutcome::Failed { .. }) {
                tracing::info!(step = %last.name, ?kind, "rejection expected");
                last.outcome = StepOutcome::Rejected { kind };
            }
        }
    }

    /// Turn a rejection the scenario requires into success
    ///
    /// # Errors
    /// The error itself if its kind differs, or `VerificationFailure` if
    /// the step succeeded.
    pub fn expect_rejection<T>(&mut self, kind: ErrorKind, result: HarnessResult<T>) -> HarnessResult<()> {
        match result {
            Err(e) if e.kind() == kind => {
                self.mark_rejected(kind);
                Ok(())
            }
            Err(e) => Err(e),
            Ok(_) => {
                let step = self
                    .steps
                    .last()
                    .map_or_else(|| "unnamed step".to_string(), |s| s.name.clone());
                Err(HarnessError::VerificationFailure {
                    errors: vec![format!("expected a {kind:?} rejection, but {step} succeeded")],
                    step,
                })
            }
        }
    }

    /// Drain the journal
    pub fn take_steps(&mut self) -> Vec<StepRecord> {
        std::mem::take(&mut self.steps)
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// Log in as the account registered under `tag`
    ///
    /// # Errors
    /// `HarnessError::AlreadyAuthenticated` if a session is active.
    pub async fn login(&mut self, tag: ActorTag) -> HarnessResult<()> {
        let result = self.try_login(tag).await;
        self.record(format!("login as {tag}"), result)
    }

    async fn try_login(&mut self, tag: ActorTag) -> HarnessResult<()> {
        let account = self.context.account(tag)?.clone();
        self.session.login(&*self.env, &account).await
    }

    /// Log out of the active session
    ///
    /// # Errors
    /// `HarnessError::NotAuthenticated` while anonymous.
    pub async fn logout(&mut self) -> HarnessResult<()> {
        let result = self.session.logout(&*self.env).await;
        self.record("logout", result)
    }

    /// Run `step` as `tag`, logging out on every exit path
    ///
    /// A panic inside `step` is re-raised after the logout.
    ///
    /// # Errors
    /// The step's error, else the logout's.
    pub async fn with_session<T, F>(&mut self, tag: ActorTag, step: F) -> HarnessResult<T>
    where
        T: Send,
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, HarnessResult<T>> + Send,
    {
        self.login(tag).await?;
        let outcome = AssertUnwindSafe(step(self)).catch_unwind().await;
        let released = if self.session.is_authenticated() {
            self.logout().await
        } else {
            Ok(())
        };
        match outcome {
            Ok(Ok(value)) => released.map(|()| value),
            Ok(Err(e)) => {
                if let Err(cleanup) = released {
                    tracing::warn!(?tag, "logout after failed step also failed: {cleanup}");
                }
                Err(e)
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    // ------------------------------------------------------------------
    // Authoring
    // ------------------------------------------------------------------

    /// Create a collection and store it under `label`
    ///
    /// # Errors
    /// `Permission` without a collection editor grant.
    pub async fn create_collection(&mut self, label: &str) -> HarnessResult<CollectionId> {
        let result = self.try_create_collection(label).await;
        self.record(format!("create collection {label}"), result)
    }

    async fn try_create_collection(&mut self, label: &str) -> HarnessResult<CollectionId> {
        let author = self.session.current()?.clone();
        let mut pending = self.env.create_collection().await?;
        let id = pending.wait_cloned().await?;
        let collection = Collection::create(id.clone(), &author, self.config.commit_message_policy)?;
        self.context.insert_collection(label, collection);
        self.check("create collection").await?;
        Ok(id)
    }

    /// Work on the collection stored under `label` without navigating
    ///
    /// # Errors
    /// `HarnessError::Config` for an unknown label.
    pub fn use_collection(&mut self, label: &str) -> HarnessResult<CollectionId> {
        self.context.activate(label).cloned()
    }

    /// Identifier of a seeded exploration, waiting for it to resolve
    ///
    /// # Errors
    /// `NotFound` for an unseeded title.
    pub async fn exploration_id(&mut self, title: &str) -> HarnessResult<ExplorationId> {
        self.context.exploration_id(title).await
    }

    /// Add a seeded exploration by title, waiting for its identifier
    ///
    /// # Errors
    /// `DuplicateNode`, `Permission`, or `NotFound` for an unseeded title.
    pub async fn add_exploration(&mut self, title: &str) -> HarnessResult<usize> {
        let result = self.try_add_exploration(title).await;
        self.record(format!("add {title}"), result)
    }

    async fn try_add_exploration(&mut self, title: &str) -> HarnessResult<usize> {
        let id = self.context.exploration_id(title).await?;
        self.add_node_id(id).await
    }

    /// Add the single seeded exploration matching `query`
    ///
    /// # Errors
    /// `NotFound` for zero matches, or for several under
    /// [`SearchPolicy::RejectAmbiguous`].
    pub async fn add_exploration_by_search(&mut self, query: &str) -> HarnessResult<usize> {
        let result = self.try_add_by_search(query).await;
        self.record(format!("search and add {query:?}"), result)
    }

    async fn try_add_by_search(&mut self, query: &str) -> HarnessResult<usize> {
        self.session.current()?;
        let hits = self.env.search_explorations(query).await?;

        let mut seeded = Vec::new();
        for hit in hits {
            if let Some(title) = self.context.seeded_title_of(&hit.id).await? {
                seeded.push((hit.id, title));
            }
        }
        let id = match (seeded.len(), self.config.search_policy) {
            (0, _) => return Err(ModelError::not_found(query).into()),
            (1, _) | (_, SearchPolicy::PickFirst) => seeded.swap_remove(0).0,
            (_, SearchPolicy::RejectAmbiguous) => {
                let candidates = seeded.into_iter().map(|(_, title)| title).collect();
                return Err(ModelError::ambiguous(query, candidates).into());
            }
        };
        tracing::debug!(query, id = %id, "search resolved");
        self.add_node_id(id).await
    }

    async fn add_node_id(&mut self, id: ExplorationId) -> HarnessResult<usize> {
        let snapshot = self.snapshot();
        let position = self.edit_model(|editor| editor.add_node(id.clone()))?;
        let applied = self.env.add_existing_exploration(&id).await;
        self.settle(snapshot, applied)?;
        self.check("add node").await?;
        Ok(position)
    }

    /// Swap the node at `position` with its left neighbour
    ///
    /// # Errors
    /// `OutOfRange` when `position` is past the end.
    pub async fn shift_node_left(&mut self, position: usize) -> HarnessResult<bool> {
        let result = self.try_shift(position, true).await;
        self.record(format!("shift left {position}"), result)
    }

    /// Swap the node at `position` with its right neighbour
    ///
    /// # Errors
    /// `OutOfRange` when `position` is past the end.
    pub async fn shift_node_right(&mut self, position: usize) -> HarnessResult<bool> {
        let result = self.try_shift(position, false).await;
        self.record(format!("shift right {position}"), result)
    }

    async fn try_shift(&mut self, position: usize, left: bool) -> HarnessResult<bool> {
        let snapshot = self.snapshot();
        let moved = self.edit_model(|editor| {
            if left {
                editor.shift_node_left(position)
            } else {
                editor.shift_node_right(position)
            }
        })?;
        let applied = if left {
            self.env.shift_node_left(position).await
        } else {
            self.env.shift_node_right(position).await
        };
        self.settle(snapshot, applied)?;
        self.check("shift node").await?;
        Ok(moved)
    }

    /// Remove the node at `position`
    ///
    /// # Errors
    /// `OutOfRange` when `position` is past the end; nothing changes.
    pub async fn delete_node(&mut self, position: usize) -> HarnessResult<ExplorationId> {
        let result = self.try_delete(position).await;
        self.record(format!("delete node {position}"), result)
    }

    async fn try_delete(&mut self, position: usize) -> HarnessResult<ExplorationId> {
        let snapshot = self.snapshot();
        let removed = self.edit_model(|editor| editor.delete_node(position))?;
        let applied = self.env.delete_node(position).await;
        self.settle(snapshot, applied)?;
        self.check("delete node").await?;
        Ok(removed)
    }

    /// Save a draft: open the save modal, set the message, confirm
    ///
    /// # Errors
    /// `CommitMessageRequired` when the policy demands a message.
    pub async fn save_draft(&mut self, message: Option<&str>) -> HarnessResult<u64> {
        let result = self.try_save_draft(message).await;
        self.record("save draft", result)
    }

    async fn try_save_draft(&mut self, message: Option<&str>) -> HarnessResult<u64> {
        let snapshot = self.snapshot();
        let version = self.edit_model(|editor| editor.save_draft(message))?;
        let env = Arc::clone(&self.env);
        let applied = async {
            env.save_draft().await?;
            if let Some(message) = message {
                env.set_commit_message(message).await?;
            }
            env.close_save_modal().await
        }
        .await;
        self.settle(snapshot, applied)?;
        self.check("save draft").await?;
        Ok(version)
    }

    /// Stage the message used by the next save
    ///
    /// # Errors
    /// `Permission` for a non-author.
    pub async fn set_commit_message(&mut self, message: &str) -> HarnessResult<()> {
        let result = self.try_set_commit_message(message).await;
        self.record(format!("set commit message {message:?}"), result)
    }

    async fn try_set_commit_message(&mut self, message: &str) -> HarnessResult<()> {
        let snapshot = self.snapshot();
        self.edit_model(|editor| {
            editor.set_commit_message(message);
            Ok(())
        })?;
        let applied = self.env.set_commit_message(message).await;
        self.settle(snapshot, applied)?;
        self.check("set commit message").await
    }

    /// Publish the active collection
    ///
    /// # Errors
    /// `InvalidState` before the first draft save.
    pub async fn publish(&mut self) -> HarnessResult<u64> {
        let result = self.try_publish().await;
        self.record("publish", result)
    }

    async fn try_publish(&mut self) -> HarnessResult<u64> {
        let snapshot = self.snapshot();
        let version = self.edit_model(|editor| editor.publish())?;
        let applied = self.env.publish_collection().await;
        self.settle(snapshot, applied)?;
        self.check("publish").await?;
        Ok(version)
    }

    /// Stage a new title
    ///
    /// # Errors
    /// `Permission` for a non-author.
    pub async fn set_title(&mut self, title: &str) -> HarnessResult<()> {
        let result = self.try_set_title(title).await;
        self.record(format!("set title {title:?}"), result)
    }

    async fn try_set_title(&mut self, title: &str) -> HarnessResult<()> {
        let snapshot = self.snapshot();
        self.edit_model(|editor| {
            editor.set_title(title);
            Ok(())
        })?;
        let applied = self.env.set_title(title).await;
        self.settle(snapshot, applied)?;
        self.check("set title").await
    }

    /// Stage a new objective
    ///
    /// # Errors
    /// `Permission` for a non-author.
    pub async fn set_objective(&mut self, objective: &str) -> HarnessResult<()> {
        let result = self.try_set_objective(objective).await;
        self.record(format!("set objective {objective:?}"), result)
    }

    async fn try_set_objective(&mut self, objective: &str) -> HarnessResult<()> {
        let snapshot = self.snapshot();
        self.edit_model(|editor| {
            editor.set_objective(objective);
            Ok(())
        })?;
        let applied = self.env.set_objective(objective).await;
        self.settle(snapshot, applied)?;
        self.check("set objective").await
    }

    /// Stage a new category
    ///
    /// # Errors
    /// `Permission` for a non-author.
    pub async fn set_category(&mut self, category: &str) -> HarnessResult<()> {
        let result = self.try_set_category(category).await;
        self.record(format!("set category {category:?}"), result)
    }

    async fn try_set_category(&mut self, category: &str) -> HarnessResult<()> {
        let snapshot = self.snapshot();
        self.edit_model(|editor| {
            editor.set_category(category);
            Ok(())
        })?;
        let applied = self.env.set_category(category).await;
        self.settle(snapshot, applied)?;
        self.check("set category").await
    }

    /// Persist staged node and metadata changes
    ///
    /// # Errors
    /// `CommitMessageRequired` when the policy demands a message.
    pub async fn save_changes(&mut self, message: Option<&str>) -> HarnessResult<u64> {
        let result = self.try_save_changes(message).await;
        self.record("save changes", result)
    }

    async fn try_save_changes(&mut self, message: Option<&str>) -> HarnessResult<u64> {
        let snapshot = self.snapshot();
        let version = self.edit_model(|editor| editor.save_changes(message))?;
        let env = Arc::clone(&self.env);
        let applied = async {
            if let Some(message) = message {
                env.set_commit_message(message).await?;
            }
            env.save_changes().await
        }
        .await;
        self.settle(snapshot, applied)?;
        self.check("save changes").await?;
        Ok(version)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Open the player view and check it against the model
    ///
    /// # Errors
    /// `VerificationFailure` on observed errors or a model mismatch.
    pub async fn view_player(&mut self, label: &str) -> HarnessResult<PlayerView> {
        let result = self.try_view_player(label).await;
        self.record(format!("view player {label}"), result)
    }

    async fn try_view_player(&mut self, label: &str) -> HarnessResult<PlayerView> {
        let id = self.context.activate(label)?.clone();
        let page = self.env.get(&self.config.url(&id.player_path())).await?;
        let step = format!("player view of {label}");
        self.verifier
            .assert_no_observed_errors(&*self.env, &step)
            .await?;
        match page {
            Page::Player(view) => {
                let model = self.context.collection(label)?;
                self.verifier.assert_matches_model(&view, model, &step)?;
                Ok(view)
            }
            other => Err(HarnessError::Environment(format!(
                "expected the player for {id}, got {other:?}"
            ))),
        }
    }

    /// Open the editor view; unsaved changes are discarded
    ///
    /// # Errors
    /// `VerificationFailure` on observed errors.
    pub async fn view_editor(&mut self, label: &str) -> HarnessResult<()> {
        let result = self.try_view_editor(label).await;
        self.record(format!("view editor {label}"), result)
    }

    async fn try_view_editor(&mut self, label: &str) -> HarnessResult<()> {
        let id = self.context.activate(label)?.clone();
        let page = self.env.get(&self.config.url(&id.editor_path())).await?;
        if let Ok(actor) = self.session.current() {
            if let Ok(mut editor) = self.context.active_mut()?.edit(actor) {
                editor.reload();
            }
        }
        self.verifier
            .assert_no_observed_errors(&*self.env, &format!("editor view of {label}"))
            .await?;
        match page {
            Page::Editor(_) => Ok(()),
            other => Err(HarnessError::Environment(format!(
                "expected the editor for {id}, got {other:?}"
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Verification
    // ------------------------------------------------------------------

    /// Journaled zero-tolerance console check
    ///
    /// # Errors
    /// `VerificationFailure` carrying every observed error.
    pub async fn verify(&mut self, step: &str) -> HarnessResult<()> {
        let result = self.check(step).await;
        self.record(format!("verify {step}"), result)
    }

    async fn check(&mut self, step: &str) -> HarnessResult<()> {
        self.verifier
            .assert_no_observed_errors(&*self.env, step)
            .await
    }

    /// Grow the collection one exploration at a time, verifying the player
    /// view after each addition
    ///
    /// Each round adds, saves a draft with the growth commit message, views
    /// the player and returns to the editor.
    ///
    /// # Errors
    /// The first failing step.
    pub async fn grow_and_verify(&mut self, label: &str, titles: &[&str]) -> HarnessResult<()> {
        let message = self.config.growth_commit_message.clone();
        for title in titles {
            self.add_exploration(title).await?;
            self.save_draft(Some(&message)).await?;
            let view = self.view_player(label).await?;
            tracing::info!(label, nodes = view.nodes.len(), "collection grown");
            self.view_editor(label).await?;
        }
        Ok(())
    }

    fn edit_model<R>(
        &mut self,
        apply: impl FnOnce(&mut CollectionEditor<'_>) -> Result<R, ModelError>,
    ) -> HarnessResult<R> {
        let actor = self.session.current()?;
        let collection = self.context.active_mut()?;
        let mut editor = collection.edit(actor)?;
        Ok(apply(&mut editor)?)
    }

    fn snapshot(&self) -> Option<Collection> {
        self.context.active().ok().cloned()
    }

    /// Roll the model back when the environment refused the step
    fn settle<T>(&mut self, snapshot: Option<Collection>, applied: HarnessResult<T>) -> HarnessResult<T> {
        if applied.is_err() {
            if let (Some(snapshot), Ok(active)) = (snapshot, self.context.active_mut()) {
                tracing::debug!(collection = %snapshot.id(), "environment refused step, model restored");
                *active = snapshot;
            }
        }
        applied
    }
}

impl<E: ?Sized> std::fmt::Debug for WorkflowDriver<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowDriver")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("context", &self.context)
            .field("steps", &self.steps.len())
            .finish_non_exhaustive()
    }
}
