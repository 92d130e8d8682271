//! Verification protocol
//!
//! Zero tolerance for client-side runtime errors: after every
//! state-changing step the errors observed since the previous check must
//! be empty. Failures carry the full error list.

use crate::environment::{ConsoleObserver, PlayerView};
use crate::error::{HarnessError, HarnessResult};
use collection_model::{Collection, ExplorationId};

/// Runs and counts verification checks
#[derive(Debug, Default)]
pub struct Verifier {
    expected: Vec<String>,
    checks: usize,
}

impl Verifier {
    /// Verifier that tolerates nothing
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tolerate errors containing any of `expected`
    #[must_use]
    pub fn with_expected(mut self, expected: Vec<String>) -> Self {
        self.expected = expected;
        self
    }

    /// Checks performed so far
    #[inline]
    #[must_use]
    pub fn checks(&self) -> usize {
        self.checks
    }

    /// Fail if the observer saw any runtime error since the last check
    ///
    /// # Errors
    /// `HarnessError::VerificationFailure` listing every observed error.
    pub async fn assert_no_observed_errors<O>(&mut self, observer: &O, step: &str) -> HarnessResult<()>
    where
        O: ConsoleObserver + ?Sized,
    {
        self.checks += 1;
        let errors = observer.check_for_console_errors(&self.expected).await?;
        if errors.is_empty() {
            tracing::debug!(step, "no console errors");
            return Ok(());
        }
        tracing::error!(step, count = errors.len(), "console errors observed: {errors:?}");
        Err(HarnessError::VerificationFailure {
            step: step.to_string(),
            errors,
        })
    }

    /// Fail if the player view disagrees with the model's durable state
    ///
    /// # Errors
    /// `HarnessError::VerificationFailure` describing each mismatch.
    pub fn assert_matches_model(
        &mut self,
        view: &PlayerView,
        model: &Collection,
        step: &str,
    ) -> HarnessResult<()> {
        self.checks += 1;
        let committed = model.committed();
        let expected: Vec<&ExplorationId> = committed.graph.ids().collect();
        let rendered: Vec<&ExplorationId> = view.nodes.iter().collect();

        let mut mismatches = Vec::new();
        if view.collection_id != *model.id() {
            mismatches.push(format!(
                "player shows collection {} instead of {}",
                view.collection_id,
                model.id()
            ));
        }
        if rendered != expected {
            mismatches.push(format!(
                "node order {} differs from expected {}",
                join(&rendered),
                join(&expected)
            ));
        }
        if view.metadata != committed.metadata {
            mismatches.push(format!(
                "metadata {:?} differs from expected {:?}",
                view.metadata, committed.metadata
            ));
        }
        if view.status != model.status() {
            mismatches.push(format!(
                "status {} differs from expected {}",
                view.status,
                model.status()
            ));
        }

        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(HarnessError::VerificationFailure {
                step: step.to_string(),
                errors: mismatches,
            })
        }
    }
}

fn join(ids: &[&ExplorationId]) -> String {
    let inner: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    format!("[{}]", inner.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::MockConsoleObserver;
    use collection_model::{Account, CollectionId, CommitMessagePolicy, Role};

    #[tokio::test]
    async fn empty_error_set_passes() {
        let mut observer = MockConsoleObserver::new();
        observer
            .expect_check_for_console_errors()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let mut verifier = Verifier::new();
        verifier
            .assert_no_observed_errors(&observer, "editor view")
            .await
            .unwrap();
        assert_eq!(verifier.checks(), 1);
    }

    #[tokio::test]
    async fn failure_reports_full_error_list() {
        let mut observer = MockConsoleObserver::new();
        observer
            .expect_check_for_console_errors()
            .returning(|_| Ok(vec!["first".to_string(), "second".to_string()]));

        let err = Verifier::new()
            .assert_no_observed_errors(&observer, "player view")
            .await
            .unwrap_err();
        match err {
            HarnessError::VerificationFailure { step, errors } => {
                assert_eq!(step, "player view");
                assert_eq!(errors, vec!["first".to_string(), "second".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn expected_list_is_passed_to_observer() {
        let mut observer = MockConsoleObserver::new();
        observer
            .expect_check_for_console_errors()
            .withf(|expected| expected.len() == 1 && expected[0] == "favicon")
            .returning(|_| Ok(Vec::new()));

        Verifier::new()
            .with_expected(vec!["favicon".to_string()])
            .assert_no_observed_errors(&observer, "after each")
            .await
            .unwrap();
    }

    #[test]
    fn model_mismatch_is_reported() {
        let author = Account::new("a@c.com", "alice").with_role(Role::CollectionEditor);
        let mut collection =
            Collection::create(CollectionId::new("c1"), &author, CommitMessagePolicy::default())
                .unwrap();
        {
            let mut edit = collection.edit(&author).unwrap();
            edit.add_node(ExplorationId::new("e1")).unwrap();
            edit.add_node(ExplorationId::new("e2")).unwrap();
            edit.save_draft(None).unwrap();
        }
        let mut view = PlayerView {
            collection_id: CollectionId::new("c1"),
            metadata: collection.committed().metadata.clone(),
            status: collection.status(),
            nodes: vec![ExplorationId::new("e1"), ExplorationId::new("e2")],
        };

        let mut verifier = Verifier::new();
        verifier.assert_matches_model(&view, &collection, "player").unwrap();

        view.nodes.reverse();
        let err = verifier
            .assert_matches_model(&view, &collection, "player")
            .unwrap_err();
        assert!(err.observed_errors()[0].contains("[e2, e1]"));
    }
}
