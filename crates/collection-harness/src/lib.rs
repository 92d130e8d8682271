//! Collection Harness - end-to-end collection workflow scenarios
//!
//! Drives the multi-actor collection authoring workflow against an
//! [`Environment`] and enforces zero tolerance for client-side runtime
//! errors as the collection grows and changes shape:
//! - [`IdentityFixture`] provisions role-tagged accounts
//! - [`ContentSeeder`] publishes the exploration catalog
//! - [`WorkflowDriver`] switches roles and applies authoring actions
//! - [`Verifier`] checks observed errors and the rendered player view
//! - [`ScenarioRunner`] executes the suite and builds a [`SuiteReport`]
//!
//! # Example
//!
//! ```rust,no_run
//! use collection_harness::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> HarnessResult<()> {
//! let config = HarnessConfig::new();
//! let env = Arc::new(SimulatedEnvironment::with_commit_policy(config.commit_message_policy));
//! let mut driver = WorkflowDriver::new(env, config);
//!
//! let report = ScenarioRunner::standard().run(&mut driver).await;
//! println!("{}", report.generate_text());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod context;
pub mod driver;
pub mod environment;
pub mod error;
pub mod fixture;
pub mod report;
pub mod scenarios;
pub mod seeder;
pub mod session;
pub mod telemetry;
pub mod verify;

pub use config::{HarnessConfig, LogFormat, SearchPolicy};
pub use context::ScenarioContext;
pub use driver::WorkflowDriver;
pub use environment::{
    AccountService, CollectionSurface, ConsoleObserver, ContentAuthoring, Environment, Navigator,
    Page, PlayerView, RenderFault, SimulatedEnvironment,
};
pub use error::{ErrorKind, HarnessError, HarnessResult};
pub use fixture::{Credentials, IdentityFixture, IdentityPlan};
pub use report::{FailureRecord, ScenarioReport, StepOutcome, StepRecord, SuiteReport};
pub use scenarios::{standard_suite, Scenario, ScenarioRunner};
pub use seeder::{standard_catalog, ContentSeeder, SeedItem};
pub use session::{Session, SessionState};
pub use verify::Verifier;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running collection scenarios
    pub use crate::{
        ErrorKind, HarnessConfig, HarnessError, HarnessResult, RenderFault, ScenarioRunner,
        SimulatedEnvironment, SuiteReport, WorkflowDriver,
    };
    pub use collection_model::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
