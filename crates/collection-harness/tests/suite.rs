//! Standard suite runs against the simulated environment

use collection_harness::scenarios::{EDITOR_COLLECTION, SHARED_COLLECTION};
use collection_harness::{
    ErrorKind, HarnessConfig, HarnessResult, RenderFault, Scenario, ScenarioRunner, SearchPolicy,
    StepOutcome,
};
use collection_model::ActorTag;
use collection_test_utils::{driver_with, setup_test_driver, SimDriver};
use futures::future::BoxFuture;
use futures::FutureExt;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn standard_suite_passes() {
    let mut driver = setup_test_driver();
    let report = ScenarioRunner::standard().run(&mut driver).await;

    assert!(report.passed(), "{}", report.generate_text());
    assert_eq!(report.scenarios.len(), 6);
    assert!(report.verification_checks > 20);
    assert!(!driver.session().is_authenticated());
    assert!(driver.env().current_user().is_none());

    let shared = driver.context().collection(SHARED_COLLECTION).unwrap();
    assert_eq!(shared.committed().graph.len(), 4);
    assert_eq!(shared.committed().metadata.title, "Test Collection 2");
    let stored = driver.env().collection(shared.id()).unwrap();
    assert_eq!(stored.committed(), shared.committed());

    let editor = driver.context().collection(EDITOR_COLLECTION).unwrap();
    assert_eq!(editor.committed().graph.len(), 5);
    assert_eq!(editor.committed().metadata.title, "Test Collection");
}

#[tokio::test]
async fn growth_steps_use_the_commit_message() {
    let mut driver = setup_test_driver();
    let report = ScenarioRunner::standard().run(&mut driver).await;
    assert!(report.passed());

    let shared = driver.context().collection(SHARED_COLLECTION).unwrap();
    let growth: Vec<_> = shared
        .history()
        .iter()
        .filter(|c| c.message.as_deref() == Some("Add Exploration"))
        .map(|c| c.node_count)
        .collect();
    assert_eq!(growth, vec![2, 3, 4]);
}

#[tokio::test]
async fn expected_rejections_are_journaled() {
    let mut driver = setup_test_driver();
    let report = ScenarioRunner::standard().run(&mut driver).await;

    let permission = report
        .scenario("rejects collection authoring without a grant")
        .unwrap();
    let rejected: Vec<_> = permission
        .steps
        .iter()
        .filter_map(|s| match &s.outcome {
            StepOutcome::Rejected { kind } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(
        rejected,
        vec![ErrorKind::Permission, ErrorKind::Permission, ErrorKind::Permission]
    );
    assert!(permission
        .steps
        .iter()
        .all(|s| s.actor.as_deref() != Some("aliceCollections")));
}

#[tokio::test]
async fn pick_first_policy_also_passes() {
    let config = HarnessConfig::new().with_search_policy(SearchPolicy::PickFirst);
    let mut driver = driver_with(config);
    let report = ScenarioRunner::standard().run(&mut driver).await;
    assert!(report.passed(), "{}", report.generate_text());
}

#[tokio::test]
async fn render_fault_fails_growth_with_full_error_list() {
    let mut driver = setup_test_driver();
    driver
        .env()
        .add_render_fault(RenderFault::PlayerAtNodeCount(3));
    let report = ScenarioRunner::standard().run(&mut driver).await;

    assert!(!report.passed());
    let growth = report
        .scenario("checks for errors in a collection with varying node count")
        .unwrap();
    let failure = growth.failure.as_ref().unwrap();
    assert_eq!(failure.kind, ErrorKind::VerificationFailure);
    assert_eq!(failure.step, "player view of shared");
    assert_eq!(failure.observed_errors.len(), 1);
    assert!(failure.observed_errors[0].contains("3 nodes"));

    // later scenarios still run, and the failing one released its session
    assert_eq!(report.failures().count(), 1);
    assert!(report.scenario("adds explorations by search").unwrap().passed());
    assert!(!driver.session().is_authenticated());

    let text = report.generate_text();
    assert!(text.contains("TypeError"));
}

#[tokio::test]
async fn injected_console_error_fails_first_check() {
    let mut driver = setup_test_driver();
    driver.env().inject_console_error("Uncaught ReferenceError: foo is not defined");
    let report = ScenarioRunner::standard().run(&mut driver).await;

    let setup = report.scenario("setup").unwrap();
    let failure = setup.failure.as_ref().unwrap();
    assert_eq!(failure.kind, ErrorKind::VerificationFailure);
    assert_eq!(
        failure.observed_errors,
        vec!["Uncaught ReferenceError: foo is not defined".to_string()]
    );
    assert!(driver.env().current_user().is_none());
}

#[tokio::test]
async fn expected_errors_are_tolerated() {
    let mut driver = setup_test_driver().with_expected_errors(vec!["favicon.ico".to_string()]);
    driver
        .env()
        .inject_console_error("GET /favicon.ico 404 (Not Found)");
    let report = ScenarioRunner::standard().run(&mut driver).await;
    assert!(report.passed(), "{}", report.generate_text());
}

fn panicking(driver: &mut SimDriver) -> BoxFuture<'_, HarnessResult<()>> {
    async move {
        driver
            .with_session(ActorTag::Player, |_| {
                async move {
                    let explode = true;
                    if explode {
                        panic!("selector vanished");
                    }
                    Ok(())
                }
                .boxed()
            })
            .await
    }
    .boxed()
}

fn provision(driver: &mut SimDriver) -> BoxFuture<'_, HarnessResult<()>> {
    async move {
        let result = driver
            .identity()
            .bootstrap(&collection_harness::IdentityPlan::default())
            .await;
        driver.record("provision accounts", result)
    }
    .boxed()
}

#[tokio::test]
async fn panic_inside_session_still_logs_out() {
    let mut driver = setup_test_driver();
    let runner = ScenarioRunner::new(vec![
        Scenario::new("provision", provision),
        Scenario::new("panics", panicking),
    ]);
    let report = runner.run(&mut driver).await;

    assert!(report.scenario("provision").unwrap().passed());
    let failure = report.scenario("panics").unwrap().failure.clone().unwrap();
    assert_eq!(failure.kind, ErrorKind::Environment);
    assert!(failure.message.contains("selector vanished"));
    assert!(!driver.session().is_authenticated());
    assert!(driver.env().current_user().is_none());
}

#[tokio::test]
async fn json_report_is_machine_readable() {
    let mut driver = setup_test_driver();
    let report = ScenarioRunner::standard().run(&mut driver).await;
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["scenarios"].as_array().unwrap().len(), 6);
    assert_eq!(json["scenarios"][0]["name"], "setup");
    assert!(json["scenarios"][0]["failure"].is_null());
}
