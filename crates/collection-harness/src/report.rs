//! Suite reporting
//!
//! Every step the driver executes is journaled. A scenario report lists
//! its steps and, on failure, the failing step, the error kind and the
//! full list of observed runtime errors.

use crate::error::{ErrorKind, HarnessError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// How a step ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Passed,
    /// The step failed in the way the scenario required
    Rejected { kind: ErrorKind },
    Failed {
        kind: ErrorKind,
        message: String,
        observed_errors: Vec<String>,
    },
}

impl StepOutcome {
    /// Outcome of a failed step
    #[must_use]
    pub fn failed(error: &HarnessError) -> Self {
        Self::Failed {
            kind: error.kind(),
            message: error.to_string(),
            observed_errors: error.observed_errors().to_vec(),
        }
    }
}

/// One journaled step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    /// Username of the acting session, if any
    pub actor: Option<String>,
    #[serde(flatten)]
    pub outcome: StepOutcome,
    pub at: DateTime<Utc>,
}

impl StepRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, actor: Option<String>, outcome: StepOutcome) -> Self {
        Self {
            name: name.into(),
            actor,
            outcome,
            at: Utc::now(),
        }
    }
}

/// Why a scenario stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub step: String,
    pub kind: ErrorKind,
    pub message: String,
    pub observed_errors: Vec<String>,
}

impl FailureRecord {
    /// Build from the error that aborted `step`
    #[must_use]
    pub fn new(step: impl Into<String>, error: &HarnessError) -> Self {
        let step = match error {
            HarnessError::VerificationFailure { step, .. } => step.clone(),
            _ => step.into(),
        };
        Self {
            step,
            kind: error.kind(),
            message: error.to_string(),
            observed_errors: error.observed_errors().to_vec(),
        }
    }
}

/// Result of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub steps: Vec<StepRecord>,
    pub failure: Option<FailureRecord>,
    pub duration_ms: u64,
}

impl ScenarioReport {
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }

    /// Name of the last step that failed unexpectedly
    #[must_use]
    pub fn last_failed_step(steps: &[StepRecord]) -> Option<&str> {
        steps
            .iter()
            .rev()
            .find(|s| matches!(s.outcome, StepOutcome::Failed { .. }))
            .map(|s| s.name.as_str())
    }
}

/// Result of a suite run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub scenarios: Vec<ScenarioReport>,
    /// Verification checks performed across the suite
    pub verification_checks: usize,
}

impl SuiteReport {
    /// Check if every scenario passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.scenarios.iter().all(ScenarioReport::passed)
    }

    /// Failed scenarios
    pub fn failures(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.scenarios.iter().filter(|s| !s.passed())
    }

    /// Total journaled steps
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.scenarios.iter().map(|s| s.steps.len()).sum()
    }

    /// Scenario by name
    #[must_use]
    pub fn scenario(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Collection Workflow Suite Report ===\n\n");
        let _ = writeln!(report, "Scenarios: {}", self.scenarios.len());
        let _ = writeln!(report, "Steps: {}", self.step_count());
        let _ = writeln!(report, "Verification Checks: {}", self.verification_checks);
        let _ = writeln!(report, "Failures: {}", self.failures().count());

        report.push_str("\n=== Scenarios ===\n");
        for (i, scenario) in self.scenarios.iter().enumerate() {
            let _ = writeln!(
                report,
                "{}. [{}] {} ({} steps, {}ms)",
                i + 1,
                if scenario.passed() { "PASS" } else { "FAIL" },
                scenario.name,
                scenario.steps.len(),
                scenario.duration_ms
            );
            if let Some(failure) = &scenario.failure {
                let _ = writeln!(report, "   step: {}", failure.step);
                let _ = writeln!(report, "   kind: {:?}", failure.kind);
                let _ = writeln!(report, "   error: {}", failure.message);
                for observed in &failure.observed_errors {
                    let _ = writeln!(report, "     - {observed}");
                }
            }
        }

        let _ = write!(
            report,
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        report
    }

    /// Render as pretty JSON
    ///
    /// # Errors
    /// Serialization failure.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn failing_scenario() -> ScenarioReport {
        let error = HarnessError::VerificationFailure {
            step: "player view".into(),
            errors: vec!["TypeError: a".into(), "TypeError: b".into()],
        };
        ScenarioReport {
            name: "growth".into(),
            steps: vec![
                StepRecord::new("add First Exploration", Some("player".into()), StepOutcome::Passed),
                StepRecord::new("player view", Some("player".into()), StepOutcome::failed(&error)),
            ],
            failure: Some(FailureRecord::new("ignored", &error)),
            duration_ms: 3,
        }
    }

    #[test]
    fn text_report_lists_every_observed_error() {
        let report = SuiteReport {
            scenarios: vec![failing_scenario()],
            verification_checks: 4,
        };
        assert!(!report.passed());
        let text = report.generate_text();
        assert!(text.contains("[FAIL] growth"));
        assert!(text.contains("step: player view"));
        assert!(text.contains("- TypeError: a"));
        assert!(text.contains("- TypeError: b"));
        assert!(text.ends_with("=== Result: FAIL ===\n"));
    }

    #[test]
    fn json_report_round_trips() {
        let report = SuiteReport {
            scenarios: vec![failing_scenario()],
            verification_checks: 4,
        };
        let json = report.to_json().unwrap();
        assert!(json.contains("\"kind\": \"verification_failure\""));
        let back: SuiteReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn last_failed_step_skips_expected_rejections() {
        let steps = vec![
            StepRecord::new(
                "publish",
                None,
                StepOutcome::Rejected {
                    kind: ErrorKind::InvalidState,
                },
            ),
            StepRecord::new("add node", None, StepOutcome::Passed),
        ];
        assert_eq!(ScenarioReport::last_failed_step(&steps), None);
        assert_eq!(
            ScenarioReport::last_failed_step(&failing_scenario().steps),
            Some("player view")
        );
    }
}
