//! In-process system under test
//!
//! Implements every environment trait on top of the collection model so
//! scenarios run without a browser. Identifiers are delivered from spawned
//! tasks, so callers observe the same resolve-before-use ordering as
//! against a live server. Render faults and injected console errors let
//! tests exercise the verification protocol.

use super::{
    AccountService, CollectionSurface, ConsoleObserver, ContentAuthoring, Navigator, Page,
    PlayerView,
};
use crate::error::{HarnessError, HarnessResult};
use async_trait::async_trait;
use collection_model::{
    Account, Collection, CollectionEditor, CollectionId, CommitMessagePolicy, Exploration,
    ExplorationId, ExplorationStatus, ExplorationSummary, IdResolver, ModelError, PendingId, Role,
};
use indexmap::IndexMap;
use parking_lot::Mutex;
use ulid::Ulid;

/// Rendering failure triggered at a given node count
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderFault {
    /// Player view logs an error when showing this many nodes
    PlayerAtNodeCount(usize),
    /// Editor view logs an error when showing this many nodes
    EditorAtNodeCount(usize),
}

#[derive(Debug, Default)]
struct SimState {
    users: IndexMap<String, Account>,
    session: Option<String>,
    explorations: Vec<Exploration>,
    collections: IndexMap<CollectionId, Collection>,
    open_editor: Option<CollectionId>,
    save_modal_open: bool,
    console: Vec<String>,
    faults: Vec<RenderFault>,
}

impl SimState {
    fn current_account(&self) -> HarnessResult<&Account> {
        let username = self
            .session
            .as_ref()
            .ok_or_else(|| HarnessError::NotAuthenticated("no user is logged in".to_string()))?;
        self.users
            .get(username)
            .ok_or_else(|| HarnessError::Environment(format!("session user {username} vanished")))
    }

    fn register(&mut self, email: &str, username: &str, role: Role) -> HarnessResult<()> {
        if self.users.contains_key(username) {
            return Err(HarnessError::DuplicateAccount(format!(
                "username {username} is taken"
            )));
        }
        if self.users.values().any(|a| a.email == email) {
            return Err(HarnessError::DuplicateAccount(format!(
                "email {email} is already registered"
            )));
        }
        self.users.insert(
            username.to_string(),
            Account::new(email, username).with_role(role),
        );
        Ok(())
    }

    fn has_fault(&self, fault: &RenderFault) -> bool {
        self.faults.contains(fault)
    }
}

/// In-memory application used by tests and the CLI
#[derive(Debug)]
pub struct SimulatedEnvironment {
    state: Mutex<SimState>,
    commit_policy: CommitMessagePolicy,
}

impl SimulatedEnvironment {
    /// Create an empty environment
    #[must_use]
    pub fn new() -> Self {
        Self::with_commit_policy(CommitMessagePolicy::default())
    }

    /// Create an environment whose collections use `policy`
    #[must_use]
    pub fn with_commit_policy(policy: CommitMessagePolicy) -> Self {
        Self {
            state: Mutex::new(SimState::default()),
            commit_policy: policy,
        }
    }

    /// Log a client-side error as if the page had thrown it
    pub fn inject_console_error(&self, message: impl Into<String>) {
        self.state.lock().console.push(message.into());
    }

    /// Arm a render fault
    pub fn add_render_fault(&self, fault: RenderFault) {
        self.state.lock().faults.push(fault);
    }

    /// Username of the active session
    #[must_use]
    pub fn current_user(&self) -> Option<String> {
        self.state.lock().session.clone()
    }

    /// Registered account by username
    #[must_use]
    pub fn account(&self, username: &str) -> Option<Account> {
        self.state.lock().users.get(username).cloned()
    }

    /// Snapshot of a stored collection
    #[must_use]
    pub fn collection(&self, id: &CollectionId) -> Option<Collection> {
        self.state.lock().collections.get(id).cloned()
    }

    /// Number of stored explorations
    #[must_use]
    pub fn exploration_count(&self) -> usize {
        self.state.lock().explorations.len()
    }

    fn with_editor<R>(
        &self,
        action: &str,
        apply: impl FnOnce(&mut CollectionEditor<'_>) -> Result<R, ModelError>,
    ) -> HarnessResult<R> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let actor = state.current_account()?.clone();
        let id = state.open_editor.clone().ok_or_else(|| {
            HarnessError::Environment(format!("{action}: no collection is open in the editor"))
        })?;
        let collection = state
            .collections
            .get_mut(&id)
            .ok_or_else(|| HarnessError::Environment(format!("{action}: collection {id} missing")))?;
        let mut editor = collection.edit(&actor)?;
        tracing::debug!(collection = %id, user = %actor.username, "sut: {action}");
        Ok(apply(&mut editor)?)
    }

    fn render_player(state: &mut SimState, id: &CollectionId) -> Page {
        let viewer = state
            .session
            .as_ref()
            .and_then(|u| state.users.get(u))
            .cloned();
        let Some(collection) = state.collections.get(id) else {
            state
                .console
                .push(format!("GET {} 404 (Not Found)", id.player_path()));
            return Page::Other(id.player_path());
        };
        let visible = match &viewer {
            Some(account) => collection.is_visible_to(account),
            None => collection.status() == collection_model::PublicationStatus::Published,
        };
        if !visible {
            state
                .console
                .push(format!("GET {} 404 (Not Found)", id.player_path()));
            return Page::Other(id.player_path());
        }

        let committed = collection.committed();
        let view = PlayerView {
            collection_id: id.clone(),
            metadata: committed.metadata.clone(),
            status: collection.status(),
            nodes: committed.graph.ids().cloned().collect(),
        };
        if state.has_fault(&RenderFault::PlayerAtNodeCount(view.nodes.len())) {
            state.console.push(format!(
                "TypeError: Cannot read property 'explorationId' of undefined (player, {} nodes)",
                view.nodes.len()
            ));
        }
        Page::Player(view)
    }

    fn render_editor(state: &mut SimState, id: &CollectionId) -> Page {
        let Ok(actor) = state.current_account().cloned() else {
            state.console.push(format!(
                "GET {} 401 (Unauthorized)",
                id.editor_path()
            ));
            return Page::Other(id.editor_path());
        };
        let Some(collection) = state.collections.get_mut(id) else {
            state
                .console
                .push(format!("GET {} 404 (Not Found)", id.editor_path()));
            return Page::Other(id.editor_path());
        };
        let node_count = match collection.edit(&actor) {
            Ok(mut editor) => {
                editor.reload();
                editor.collection().staged().graph.len()
            }
            Err(_) => {
                state.console.push(format!(
                    "GET {} 401 (Unauthorized)",
                    id.editor_path()
                ));
                return Page::Other(id.editor_path());
            }
        };
        if state.has_fault(&RenderFault::EditorAtNodeCount(node_count)) {
            state.console.push(format!(
                "TypeError: Cannot read property 'id' of undefined (editor, {node_count} nodes)"
            ));
        }
        state.open_editor = Some(id.clone());
        state.save_modal_open = false;
        Page::Editor(id.clone())
    }
}

impl Default for SimulatedEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Deliver `value` from a separate task, like a server round-trip
fn resolve_later<T: Send + 'static>(resolver: IdResolver<T>, value: T) {
    tokio::spawn(async move {
        tokio::task::yield_now().await;
        resolver.resolve(value);
    });
}

fn fresh_id() -> String {
    Ulid::new().to_string().to_lowercase()
}

#[async_trait]
impl AccountService for SimulatedEnvironment {
    async fn create_user(&self, email: &str, username: &str) -> HarnessResult<()> {
        self.state
            .lock()
            .register(email, username, Role::ExplorationEditor)
    }

    async fn create_and_login_admin_user(&self, email: &str, username: &str) -> HarnessResult<()> {
        let mut state = self.state.lock();
        if let Some(active) = &state.session {
            return Err(HarnessError::AlreadyAuthenticated(active.clone()));
        }
        state.register(email, username, Role::Admin)?;
        state.session = Some(username.to_string());
        Ok(())
    }

    async fn login(&self, email: &str) -> HarnessResult<()> {
        let mut state = self.state.lock();
        if let Some(active) = &state.session {
            return Err(HarnessError::AlreadyAuthenticated(active.clone()));
        }
        let username = state
            .users
            .values()
            .find(|a| a.email == email)
            .map(|a| a.username.clone())
            .ok_or_else(|| HarnessError::Environment(format!("no account for {email}")))?;
        state.session = Some(username);
        Ok(())
    }

    async fn logout(&self) -> HarnessResult<()> {
        let mut state = self.state.lock();
        if state.session.take().is_none() {
            return Err(HarnessError::NotAuthenticated("logout".to_string()));
        }
        state.open_editor = None;
        state.save_modal_open = false;
        Ok(())
    }

    async fn update_role(&self, username: &str, role: Role) -> HarnessResult<()> {
        let mut state = self.state.lock();
        let acting = state.current_account()?;
        if !acting.is_admin() {
            return Err(HarnessError::Permission(format!(
                "{} is not an admin",
                acting.username
            )));
        }
        let account = state
            .users
            .get_mut(username)
            .ok_or_else(|| HarnessError::Environment(format!("no such user {username}")))?;
        account.role = role;
        Ok(())
    }
}

#[async_trait]
impl ContentAuthoring for SimulatedEnvironment {
    async fn create_and_publish_exploration(
        &self,
        title: &str,
        category: &str,
        objective: &str,
    ) -> HarnessResult<PendingId<ExplorationId>> {
        let id = ExplorationId::new(fresh_id());
        {
            let mut state = self.state.lock();
            state.current_account()?;
            state.explorations.push(Exploration {
                id: id.clone(),
                title: title.to_string(),
                category: category.to_string(),
                objective: objective.to_string(),
                status: ExplorationStatus::Published,
            });
        }
        let (resolver, pending) = PendingId::channel(title);
        resolve_later(resolver, id);
        Ok(pending)
    }

    async fn search_explorations(&self, query: &str) -> HarnessResult<Vec<ExplorationSummary>> {
        let state = self.state.lock();
        Ok(state
            .explorations
            .iter()
            .filter(|e| e.status == ExplorationStatus::Published && e.matches(query))
            .map(Exploration::summary)
            .collect())
    }
}

#[async_trait]
impl CollectionSurface for SimulatedEnvironment {
    async fn create_collection(&self) -> HarnessResult<PendingId<CollectionId>> {
        let id = CollectionId::new(fresh_id());
        {
            let mut state = self.state.lock();
            let author = state.current_account()?.clone();
            let collection = Collection::create(id.clone(), &author, self.commit_policy)?;
            state.collections.insert(id.clone(), collection);
            state.open_editor = Some(id.clone());
            state.save_modal_open = false;
        }
        let (resolver, pending) = PendingId::channel("new collection");
        resolve_later(resolver, id);
        Ok(pending)
    }

    async fn add_existing_exploration(&self, id: &ExplorationId) -> HarnessResult<()> {
        let known = self
            .state
            .lock()
            .explorations
            .iter()
            .any(|e| &e.id == id && e.status == ExplorationStatus::Published);
        if !known {
            return Err(ModelError::not_found(id.as_str()).into());
        }
        self.with_editor("add exploration", |editor| {
            editor.add_node(id.clone()).map(|_| ())
        })
    }

    async fn shift_node_left(&self, position: usize) -> HarnessResult<()> {
        self.with_editor("shift left", |editor| {
            editor.shift_node_left(position).map(|_| ())
        })
    }

    async fn shift_node_right(&self, position: usize) -> HarnessResult<()> {
        self.with_editor("shift right", |editor| {
            editor.shift_node_right(position).map(|_| ())
        })
    }

    async fn delete_node(&self, position: usize) -> HarnessResult<()> {
        self.with_editor("delete node", |editor| {
            editor.delete_node(position).map(|_| ())
        })
    }

    async fn save_draft(&self) -> HarnessResult<()> {
        self.with_editor("save draft", |_| Ok(()))?;
        self.state.lock().save_modal_open = true;
        Ok(())
    }

    async fn set_commit_message(&self, message: &str) -> HarnessResult<()> {
        self.with_editor("set commit message", |editor| {
            editor.set_commit_message(message);
            Ok(())
        })
    }

    async fn close_save_modal(&self) -> HarnessResult<()> {
        {
            let mut state = self.state.lock();
            if !state.save_modal_open {
                return Err(HarnessError::Environment("save modal is not open".to_string()));
            }
            state.save_modal_open = false;
        }
        self.with_editor("close save modal", |editor| editor.save_draft(None).map(|_| ()))
    }

    async fn publish_collection(&self) -> HarnessResult<()> {
        self.with_editor("publish", |editor| editor.publish().map(|_| ()))
    }

    async fn set_title(&self, title: &str) -> HarnessResult<()> {
        self.with_editor("set title", |editor| {
            editor.set_title(title);
            Ok(())
        })
    }

    async fn set_objective(&self, objective: &str) -> HarnessResult<()> {
        self.with_editor("set objective", |editor| {
            editor.set_objective(objective);
            Ok(())
        })
    }

    async fn set_category(&self, category: &str) -> HarnessResult<()> {
        self.with_editor("set category", |editor| {
            editor.set_category(category);
            Ok(())
        })
    }

    async fn save_changes(&self) -> HarnessResult<()> {
        self.with_editor("save changes", |editor| editor.save_changes(None).map(|_| ()))
    }
}

#[async_trait]
impl Navigator for SimulatedEnvironment {
    async fn get(&self, url: &str) -> HarnessResult<Page> {
        let path = url
            .find("/collection")
            .map_or(url, |start| &url[start..])
            .trim_end_matches(['/', '#']);
        let mut state = self.state.lock();
        state.save_modal_open = false;

        if let Some(raw) = path.strip_prefix("/collection_editor/create/") {
            return Ok(Self::render_editor(&mut state, &CollectionId::new(raw)));
        }
        state.open_editor = None;
        if let Some(raw) = path.strip_prefix("/collection/") {
            return Ok(Self::render_player(&mut state, &CollectionId::new(raw)));
        }
        Ok(Page::Other(url.to_string()))
    }
}

#[async_trait]
impl ConsoleObserver for SimulatedEnvironment {
    async fn check_for_console_errors(&self, expected: &[String]) -> HarnessResult<Vec<String>> {
        let observed = std::mem::take(&mut self.state.lock().console);
        Ok(observed
            .into_iter()
            .filter(|e| !expected.iter().any(|x| e.contains(x.as_str())))
            .collect())
    }
}
