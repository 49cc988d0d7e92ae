//! Pagevet Models - Shared data types for the UI-verification harness.
//!
//! This crate defines the serde-facing vocabulary used across the Pagevet
//! workspace:
//! - Scenario steps and scenario files (the authorable JSON format)
//! - Fixture payloads substituted for real backend responses
//! - The read-only request view handed to dynamic responders
//! - Scenario run results

pub mod fixture;
pub mod request;
pub mod result;
pub mod scenario;

pub use fixture::{FixtureBody, FixtureResponse};
pub use request::InterceptedRequest;
pub use result::{RunStatus, ScenarioResult};
pub use scenario::{
    DEFAULT_STEP_TIMEOUT_MS, RouteBinding, Scenario, ScenarioFile, ScenarioStep,
};
