//! Identity fixture
//!
//! Provisions the role-tagged accounts a suite needs and elevates roles
//! through an admin session before any scenario runs.

use crate::context::ScenarioContext;
use crate::environment::AccountService;
use crate::error::{HarnessError, HarnessResult};
use crate::session::Session;
use collection_model::{Account, ActorTag, Role};
use serde::{Deserialize, Serialize};

/// Credentials of one provisioned account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub username: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
        }
    }
}

/// Accounts and grants provisioned before a suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPlan {
    pub creator: Credentials,
    pub player: Credentials,
    pub editor: Credentials,
    pub admin: Credentials,
    /// Tags that receive the collection editor role
    pub collection_editors: Vec<ActorTag>,
}

impl Default for IdentityPlan {
    fn default() -> Self {
        Self {
            creator: Credentials::new("creator@explorations.com", "creatorExplorations"),
            player: Credentials::new("player@collections.com", "playerCollections"),
            editor: Credentials::new("alice@collections.com", "aliceCollections"),
            admin: Credentials::new("testadm@collections.com", "testadm"),
            collection_editors: vec![ActorTag::Editor, ActorTag::Player],
        }
    }
}

/// Account provisioning over an [`AccountService`]
#[derive(Debug)]
pub struct IdentityFixture<'a, S: ?Sized> {
    service: &'a S,
    session: &'a mut Session,
    context: &'a mut ScenarioContext,
}

impl<'a, S> IdentityFixture<'a, S>
where
    S: AccountService + ?Sized,
{
    pub fn new(service: &'a S, session: &'a mut Session, context: &'a mut ScenarioContext) -> Self {
        Self {
            service,
            session,
            context,
        }
    }

    /// Register a user with the default role
    ///
    /// # Errors
    /// `HarnessError::DuplicateAccount` if the username or email is taken.
    pub async fn create_account(
        &mut self,
        tag: ActorTag,
        email: &str,
        username: &str,
    ) -> HarnessResult<Account> {
        let account = Account::new(email, username);
        self.ensure_unregistered(tag, &account)?;
        self.service.create_user(email, username).await?;
        self.context.register_account(tag, account.clone())?;
        tracing::info!(%tag, user = username, "account created");
        Ok(account)
    }

    /// Register an administrator and authenticate as them
    ///
    /// # Errors
    /// `HarnessError::DuplicateAccount`, or `AlreadyAuthenticated` if a
    /// session is active.
    pub async fn create_admin_account(&mut self, email: &str, username: &str) -> HarnessResult<Account> {
        let account = Account::new(email, username).with_role(Role::Admin);
        self.ensure_unregistered(ActorTag::Admin, &account)?;
        if self.session.is_authenticated() {
            let active = self.session.current()?.username.clone();
            return Err(HarnessError::AlreadyAuthenticated(active));
        }
        self.service.create_and_login_admin_user(email, username).await?;
        self.context.register_account(ActorTag::Admin, account.clone())?;
        self.session.adopt(account.clone())?;
        tracing::info!(user = username, "admin account created");
        Ok(account)
    }

    /// Grant `role` to the account registered as `tag`
    ///
    /// # Errors
    /// `HarnessError::Permission` unless an admin session is active.
    pub async fn grant_role(&mut self, tag: ActorTag, role: Role) -> HarnessResult<()> {
        let acting = self.session.current().map_err(|_| {
            HarnessError::Permission("granting roles requires an admin session".to_string())
        })?;
        if !acting.is_admin() {
            return Err(HarnessError::Permission(format!(
                "{} is not an admin",
                acting.username
            )));
        }
        let username = self.context.account(tag)?.username.clone();
        self.service.update_role(&username, role).await?;

        let account = self.context.account_mut(tag)?;
        account.role = role;
        let updated = account.clone();
        self.session.refresh(&updated);
        tracing::info!(%tag, user = %username, %role, "role granted");
        Ok(())
    }

    /// Provision every account of `plan`, grant roles, and log the admin out
    ///
    /// # Errors
    /// The first provisioning failure; the admin session is released
    /// regardless.
    pub async fn bootstrap(&mut self, plan: &IdentityPlan) -> HarnessResult<()> {
        self.create_account(ActorTag::Creator, &plan.creator.email, &plan.creator.username)
            .await?;
        self.create_account(ActorTag::Player, &plan.player.email, &plan.player.username)
            .await?;
        self.create_account(ActorTag::Editor, &plan.editor.email, &plan.editor.username)
            .await?;
        self.create_admin_account(&plan.admin.email, &plan.admin.username)
            .await?;

        let mut granted = Ok(());
        for tag in &plan.collection_editors {
            granted = self.grant_role(*tag, Role::CollectionEditor).await;
            if granted.is_err() {
                break;
            }
        }
        let released = self.session.logout(self.service).await;
        granted.and(released)
    }

    fn ensure_unregistered(&self, tag: ActorTag, account: &Account) -> HarnessResult<()> {
        if let Ok(existing) = self.context.account(tag) {
            return Err(HarnessError::DuplicateAccount(format!(
                "{tag} is already provisioned as {}",
                existing.username
            )));
        }
        if let Some((_, existing)) = self
            .context
            .accounts()
            .find(|(_, a)| a.username == account.username || a.email == account.email)
        {
            return Err(HarnessError::DuplicateAccount(format!(
                "{} / {} is already registered",
                existing.username, existing.email
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::SimulatedEnvironment;

    #[tokio::test]
    async fn bootstrap_grants_collection_editors() {
        let env = SimulatedEnvironment::new();
        let mut session = Session::new();
        let mut context = ScenarioContext::new();
        IdentityFixture::new(&env, &mut session, &mut context)
            .bootstrap(&IdentityPlan::default())
            .await
            .unwrap();

        assert!(!session.is_authenticated());
        assert_eq!(context.account(ActorTag::Editor).unwrap().role, Role::CollectionEditor);
        assert_eq!(context.account(ActorTag::Player).unwrap().role, Role::CollectionEditor);
        assert_eq!(context.account(ActorTag::Creator).unwrap().role, Role::ExplorationEditor);
        assert_eq!(
            env.account("aliceCollections").unwrap().role,
            Role::CollectionEditor
        );
    }

    #[tokio::test]
    async fn grant_without_admin_session_is_rejected() {
        let env = SimulatedEnvironment::new();
        let mut session = Session::new();
        let mut context = ScenarioContext::new();
        let mut fixture = IdentityFixture::new(&env, &mut session, &mut context);
        fixture
            .create_account(ActorTag::Player, "p@c.com", "player")
            .await
            .unwrap();

        let err = fixture
            .grant_role(ActorTag::Player, Role::CollectionEditor)
            .await
            .unwrap_err();
        assert!(err.is_permission());
    }

    #[tokio::test]
    async fn duplicate_account_is_rejected() {
        let env = SimulatedEnvironment::new();
        let mut session = Session::new();
        let mut context = ScenarioContext::new();
        let mut fixture = IdentityFixture::new(&env, &mut session, &mut context);
        fixture
            .create_account(ActorTag::Player, "p@c.com", "player")
            .await
            .unwrap();
        let err = fixture
            .create_account(ActorTag::Editor, "p@c.com", "player")
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::DuplicateAccount(_)));
    }
}
