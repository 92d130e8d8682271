//! Testing utilities for the collection harness workspace
//!
//! Shared fixtures: simulated environments, drivers, and a driver that
//! has already provisioned accounts and seeded the catalog.

#![allow(missing_docs)]

use collection_harness::{
    standard_catalog, HarnessConfig, IdentityPlan, SimulatedEnvironment, WorkflowDriver,
};
use collection_model::ActorTag;
use std::sync::Arc;

pub type SimDriver = WorkflowDriver<SimulatedEnvironment>;

/// Simulated environment sharing `config`'s commit message policy
pub fn simulated_env(config: &HarnessConfig) -> Arc<SimulatedEnvironment> {
    Arc::new(SimulatedEnvironment::with_commit_policy(
        config.commit_message_policy,
    ))
}

/// Driver over a fresh simulated environment
pub fn driver_with(config: HarnessConfig) -> SimDriver {
    let env = simulated_env(&config);
    WorkflowDriver::new(env, config)
}

/// Driver with default configuration
pub fn setup_test_driver() -> SimDriver {
    driver_with(HarnessConfig::new())
}

/// Driver with default accounts provisioned and the standard catalog seeded
pub async fn bootstrapped_driver(config: HarnessConfig) -> SimDriver {
    let mut driver = driver_with(config);
    driver
        .identity()
        .bootstrap(&IdentityPlan::default())
        .await
        .unwrap();
    driver
        .seeder()
        .seed_as(ActorTag::Creator, &standard_catalog())
        .await
        .unwrap();
    driver
}
