//! Scenarios and the suite runner
//!
//! The standard suite provisions identities, seeds the catalog, and then
//! exercises the collection editor and player from each role. Scenarios
//! run in order against one driver; each stops at its first error, the
//! session is always released and an after-each verification runs.

use crate::config::SearchPolicy;
use crate::driver::WorkflowDriver;
use crate::environment::Environment;
use crate::error::{ErrorKind, HarnessError, HarnessResult};
use crate::fixture::IdentityPlan;
use crate::report::{FailureRecord, ScenarioReport, SuiteReport};
use crate::seeder::{standard_catalog, SeedItem};
use collection_model::ActorTag;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

/// Label of the collection created during setup and shared by later scenarios
pub const SHARED_COLLECTION: &str = "shared";
/// Label of the collection built in the editor scenario
pub const EDITOR_COLLECTION: &str = "editor";
/// Label of the collection used by the search scenario
pub const SEARCH_COLLECTION: &str = "search";

type ScenarioFn<E> = for<'a> fn(&'a mut WorkflowDriver<E>) -> BoxFuture<'a, HarnessResult<()>>;

/// A named scenario
pub struct Scenario<E: ?Sized> {
    pub name: &'static str,
    run: ScenarioFn<E>,
}

impl<E: ?Sized> Scenario<E> {
    pub fn new(name: &'static str, run: ScenarioFn<E>) -> Self {
        Self { name, run }
    }
}

impl<E: ?Sized> Clone for Scenario<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            run: self.run,
        }
    }
}

impl<E: ?Sized> std::fmt::Debug for Scenario<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario").field("name", &self.name).finish()
    }
}

/// The collection workflow suite, in execution order
#[must_use]
pub fn standard_suite<E>() -> Vec<Scenario<E>>
where
    E: Environment + ?Sized,
{
    vec![
        Scenario::new("setup", setup::<E>),
        Scenario::new("visits the collection editor", visit_collection_editor::<E>),
        Scenario::new("visits the collection player", visit_collection_player::<E>),
        Scenario::new(
            "checks for errors in a collection with varying node count",
            varying_node_count::<E>,
        ),
        Scenario::new("adds explorations by search", search_add::<E>),
        Scenario::new(
            "rejects collection authoring without a grant",
            authoring_without_grant::<E>,
        ),
    ]
}

/// Runs scenarios against a driver and collects the report
#[derive(Debug)]
pub struct ScenarioRunner<E: ?Sized> {
    scenarios: Vec<Scenario<E>>,
}

impl<E> ScenarioRunner<E>
where
    E: Environment + ?Sized,
{
    pub fn new(scenarios: Vec<Scenario<E>>) -> Self {
        Self { scenarios }
    }

    /// Runner over [`standard_suite`]
    #[must_use]
    pub fn standard() -> Self {
        Self::new(standard_suite())
    }

    /// Run every scenario in order
    pub async fn run(&self, driver: &mut WorkflowDriver<E>) -> SuiteReport {
        let mut report = SuiteReport::default();
        for scenario in &self.scenarios {
            report.scenarios.push(self.run_one(scenario, driver).await);
        }
        report.verification_checks = driver.verification_checks();
        if report.passed() {
            tracing::info!(scenarios = report.scenarios.len(), "suite passed");
        } else {
            tracing::error!(failures = report.failures().count(), "suite failed");
        }
        report
    }

    async fn run_one(&self, scenario: &Scenario<E>, driver: &mut WorkflowDriver<E>) -> ScenarioReport {
        let started = Instant::now();
        tracing::info!(scenario = scenario.name, "scenario started");

        let outcome = AssertUnwindSafe((scenario.run)(driver)).catch_unwind().await;
        let mut failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(panic) => Some(HarnessError::Environment(format!(
                "scenario panicked: {}",
                panic_message(panic.as_ref())
            ))),
        };

        if driver.session().is_authenticated() {
            if let Err(e) = driver.logout().await {
                failure.get_or_insert(e);
            }
        }
        if let Err(e) = driver.verify("after each").await {
            failure.get_or_insert(e);
        }

        let steps = driver.take_steps();
        let failure = failure.map(|e| {
            let step = ScenarioReport::last_failed_step(&steps).unwrap_or(scenario.name);
            FailureRecord::new(step, &e)
        });
        match &failure {
            None => tracing::info!(scenario = scenario.name, "scenario passed"),
            Some(f) => tracing::error!(scenario = scenario.name, step = %f.step, "scenario failed: {}", f.message),
        }
        ScenarioReport {
            name: scenario.name.to_string(),
            steps,
            failure,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

fn titles(items: &[SeedItem]) -> Vec<&str> {
    items.iter().map(|item| item.title.as_str()).collect()
}

/// Fail unless the committed node order of `label` matches `expected` titles
async fn assert_order<E>(
    driver: &mut WorkflowDriver<E>,
    label: &str,
    expected: &[&str],
) -> HarnessResult<()>
where
    E: Environment + ?Sized,
{
    let mut ids = Vec::with_capacity(expected.len());
    for title in expected {
        ids.push(driver.exploration_id(title).await?);
    }
    let actual: Vec<_> = driver
        .context()
        .collection(label)?
        .committed()
        .graph
        .ids()
        .cloned()
        .collect();
    let result = if actual == ids {
        Ok(())
    } else {
        Err(HarnessError::VerificationFailure {
            step: format!("node order of {label}"),
            errors: vec![format!("expected {expected:?}, found {} node(s)", actual.len())],
        })
    };
    driver.record(format!("check node order of {label}"), result)
}

fn setup<E>(driver: &mut WorkflowDriver<E>) -> BoxFuture<'_, HarnessResult<()>>
where
    E: Environment + ?Sized,
{
    async move {
        let provisioned = driver.identity().bootstrap(&IdentityPlan::default()).await;
        driver.record("provision accounts", provisioned)?;
        let seeded = driver
            .seeder()
            .seed_as(ActorTag::Creator, &standard_catalog())
            .await;
        driver.record("seed explorations", seeded)?;

        driver
            .with_session(ActorTag::Player, |d| {
                async move {
                    d.create_collection(SHARED_COLLECTION).await?;
                    d.add_exploration("First Exploration").await?;
                    d.save_draft(None).await?;
                    d.publish().await?;
                    d.set_title("Test Collection 2").await?;
                    d.set_objective("This is the second test collection.").await?;
                    d.set_category("Algebra").await?;
                    d.save_changes(None).await?;
                    Ok(())
                }
                .boxed()
            })
            .await
    }
    .boxed()
}

fn visit_collection_editor<E>(driver: &mut WorkflowDriver<E>) -> BoxFuture<'_, HarnessResult<()>>
where
    E: Environment + ?Sized,
{
    async move {
        driver
            .with_session(ActorTag::Editor, |d| {
                async move {
                    d.create_collection(EDITOR_COLLECTION).await?;
                    d.add_exploration("First Exploration").await?;
                    d.add_exploration("Second Exploration").await?;
                    d.add_exploration("Third Exploration").await?;
                    d.add_exploration_by_search("Lazy").await?;
                    d.add_exploration_by_search("Linear").await?;
                    d.add_exploration_by_search("Testing").await?;
                    d.shift_node_left(1).await?;
                    d.shift_node_right(1).await?;
                    d.delete_node(1).await?;
                    d.save_draft(None).await?;
                    d.publish().await?;
                    d.set_title("Test Collection").await?;
                    d.set_objective("This is a test collection.").await?;
                    d.set_category("Algebra").await?;
                    d.save_changes(None).await?;
                    assert_order(
                        d,
                        EDITOR_COLLECTION,
                        &[
                            "Second Exploration",
                            "First Exploration",
                            "The Lazy Magician",
                            "Root Linear Coefficient Theorem",
                            "Test Exploration",
                        ],
                    )
                    .await?;
                    d.view_player(EDITOR_COLLECTION).await?;
                    Ok(())
                }
                .boxed()
            })
            .await
    }
    .boxed()
}

fn visit_collection_player<E>(driver: &mut WorkflowDriver<E>) -> BoxFuture<'_, HarnessResult<()>>
where
    E: Environment + ?Sized,
{
    async move {
        driver
            .with_session(ActorTag::Editor, |d| {
                async move {
                    d.view_player(SHARED_COLLECTION).await?;
                    Ok(())
                }
                .boxed()
            })
            .await
    }
    .boxed()
}

fn varying_node_count<E>(driver: &mut WorkflowDriver<E>) -> BoxFuture<'_, HarnessResult<()>>
where
    E: Environment + ?Sized,
{
    async move {
        driver
            .with_session(ActorTag::Player, |d| {
                async move {
                    d.view_player(SHARED_COLLECTION).await?;
                    d.view_editor(SHARED_COLLECTION).await?;
                    let catalog = standard_catalog();
                    let growth = titles(&catalog[1..4]);
                    d.grow_and_verify(SHARED_COLLECTION, &growth).await?;
                    assert_order(d, SHARED_COLLECTION, &titles(&catalog[..4])).await
                }
                .boxed()
            })
            .await
    }
    .boxed()
}

fn search_add<E>(driver: &mut WorkflowDriver<E>) -> BoxFuture<'_, HarnessResult<()>>
where
    E: Environment + ?Sized,
{
    async move {
        driver
            .with_session(ActorTag::Editor, |d| {
                async move {
                    d.create_collection(SEARCH_COLLECTION).await?;
                    let premature = d.publish().await;
                    d.expect_rejection(ErrorKind::InvalidState, premature)?;

                    d.add_exploration_by_search("Lazy").await?;
                    let missing = d.add_exploration_by_search("Nonexistent Exploration").await;
                    d.expect_rejection(ErrorKind::NotFound, missing)?;

                    // three objectives start with "discover"; the first is already present
                    let broad = d.add_exploration_by_search("discover").await;
                    let expected = match d.config().search_policy {
                        SearchPolicy::RejectAmbiguous => ErrorKind::NotFound,
                        SearchPolicy::PickFirst => ErrorKind::DuplicateNode,
                    };
                    d.expect_rejection(expected, broad)?;

                    d.save_draft(None).await?;
                    assert_order(d, SEARCH_COLLECTION, &["The Lazy Magician"]).await
                }
                .boxed()
            })
            .await
    }
    .boxed()
}

fn authoring_without_grant<E>(driver: &mut WorkflowDriver<E>) -> BoxFuture<'_, HarnessResult<()>>
where
    E: Environment + ?Sized,
{
    async move {
        driver
            .with_session(ActorTag::Creator, |d| {
                async move {
                    let created = d.create_collection("forbidden").await;
                    d.expect_rejection(ErrorKind::Permission, created)?;

                    d.use_collection(SHARED_COLLECTION)?;
                    let added = d.add_exploration("Test Exploration").await;
                    d.expect_rejection(ErrorKind::Permission, added)?;
                    let published = d.publish().await;
                    d.expect_rejection(ErrorKind::Permission, published)
                }
                .boxed()
            })
            .await
    }
    .boxed()
}
