//! Content seeder
//!
//! Creates the named, published explorations a suite references and
//! records each one's pending identifier in the scenario context.

use crate::context::ScenarioContext;
use crate::environment::{AccountService, ContentAuthoring};
use crate::error::{HarnessError, HarnessResult};
use crate::session::Session;
use collection_model::{ActorTag, ExplorationId, PendingId};
use serde::{Deserialize, Serialize};

/// One exploration to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedItem {
    pub title: String,
    pub category: String,
    pub objective: String,
}

impl SeedItem {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        objective: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            objective: objective.into(),
        }
    }
}

/// The explorations every collection scenario relies on
///
/// The first four are added by identifier; the last three are found by
/// search text.
#[must_use]
pub fn standard_catalog() -> Vec<SeedItem> {
    vec![
        SeedItem::new("First Exploration", "Languages", "First Test Exploration."),
        SeedItem::new("Second Exploration", "Languages", "Second Test Exploration."),
        SeedItem::new("Third Exploration", "Languages", "Third Test Exploration."),
        SeedItem::new("Fourth Exploration", "Languages", "Fourth Test Exploration."),
        SeedItem::new(
            "The Lazy Magician",
            "Algorithms",
            "discover the binary search algorithm",
        ),
        SeedItem::new(
            "Root Linear Coefficient Theorem",
            "Algebra",
            "discover the Root Linear Coefficient Theorem",
        ),
        SeedItem::new("Test Exploration", "Languages", "discover the Protractor Testing"),
    ]
}

/// Exploration creation over a [`ContentAuthoring`] service
#[derive(Debug)]
pub struct ContentSeeder<'a, S: ?Sized> {
    service: &'a S,
    session: &'a mut Session,
    context: &'a mut ScenarioContext,
}

impl<'a, S> ContentSeeder<'a, S>
where
    S: AccountService + ContentAuthoring + ?Sized,
{
    pub fn new(service: &'a S, session: &'a mut Session, context: &'a mut ScenarioContext) -> Self {
        Self {
            service,
            session,
            context,
        }
    }

    /// Create and publish one exploration as the current user
    ///
    /// The returned identifier must be awaited before use.
    ///
    /// # Errors
    /// `HarnessError::NotAuthenticated` while anonymous, or the service's error.
    pub async fn create_and_publish(
        &mut self,
        title: &str,
        category: &str,
        objective: &str,
    ) -> HarnessResult<PendingId<ExplorationId>> {
        let author = self.session.current()?;
        tracing::debug!(user = %author.username, title, "creating exploration");
        self.service
            .create_and_publish_exploration(title, category, objective)
            .await
    }

    /// Create `item` and record its identifier under its title
    ///
    /// # Errors
    /// `HarnessError::Config` for a title already seeded, else see
    /// [`ContentSeeder::create_and_publish`].
    pub async fn seed(&mut self, item: &SeedItem) -> HarnessResult<()> {
        if self.context.is_seeded(&item.title) {
            return Err(HarnessError::Config(format!(
                "an exploration titled {} is already seeded",
                item.title
            )));
        }
        let pending = self
            .create_and_publish(&item.title, &item.category, &item.objective)
            .await?;
        self.context.record_exploration(item.title.clone(), pending)
    }

    /// Log in as `author`, seed every item in order, and log out
    ///
    /// # Errors
    /// The first failure; the session is released regardless.
    pub async fn seed_as(&mut self, author: ActorTag, items: &[SeedItem]) -> HarnessResult<()> {
        let account = self.context.account(author)?.clone();
        self.session.login(self.service, &account).await?;

        let mut seeded = Ok(());
        for item in items {
            seeded = self.seed(item).await;
            if seeded.is_err() {
                break;
            }
        }
        let released = self.session.logout(self.service).await;
        if seeded.is_ok() {
            tracing::info!(count = items.len(), user = %account.username, "explorations seeded");
        }
        seeded.and(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::SimulatedEnvironment;
    use collection_model::Account;

    #[tokio::test]
    async fn seeding_requires_a_session() {
        let env = SimulatedEnvironment::new();
        let mut session = Session::new();
        let mut context = ScenarioContext::new();
        let err = ContentSeeder::new(&env, &mut session, &mut context)
            .seed(&standard_catalog()[0])
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::NotAuthenticated(_)));
    }

    #[tokio::test]
    async fn catalog_is_recorded_in_creation_order() {
        let env = SimulatedEnvironment::new();
        env.create_user("creator@explorations.com", "creatorExplorations")
            .await
            .unwrap();
        let mut session = Session::new();
        let mut context = ScenarioContext::new();
        context
            .register_account(
                ActorTag::Creator,
                Account::new("creator@explorations.com", "creatorExplorations"),
            )
            .unwrap();

        let catalog = standard_catalog();
        ContentSeeder::new(&env, &mut session, &mut context)
            .seed_as(ActorTag::Creator, &catalog)
            .await
            .unwrap();

        assert!(!session.is_authenticated());
        assert_eq!(env.exploration_count(), catalog.len());
        let titles: Vec<&str> = context.exploration_titles().collect();
        assert_eq!(titles[0], "First Exploration");
        assert_eq!(titles[6], "Test Exploration");

        let lazy = context.exploration_id("The Lazy Magician").await.unwrap();
        let hits = env.search_explorations("Lazy").await.unwrap();
        assert_eq!(hits[0].id, lazy);
    }

    #[tokio::test]
    async fn reseeding_a_title_creates_nothing() {
        let env = SimulatedEnvironment::new();
        env.create_user("creator@explorations.com", "creatorExplorations")
            .await
            .unwrap();
        let mut session = Session::new();
        let mut context = ScenarioContext::new();
        context
            .register_account(
                ActorTag::Creator,
                Account::new("creator@explorations.com", "creatorExplorations"),
            )
            .unwrap();

        let catalog = standard_catalog();
        let mut seeder = ContentSeeder::new(&env, &mut session, &mut context);
        seeder.seed_as(ActorTag::Creator, &catalog[..1]).await.unwrap();
        let err = seeder
            .seed_as(ActorTag::Creator, &catalog[..1])
            .await
            .unwrap_err();

        assert!(matches!(err, HarnessError::Config(_)));
        assert_eq!(env.exploration_count(), 1);
        assert!(!session.is_authenticated());
    }
}
