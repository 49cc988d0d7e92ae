//! Route interception and scenario execution engine for Pagevet.
//!
//! This crate drives a headless Chromium through scripted interaction and
//! assertion steps while answering every matched network request from
//! registered fixtures, so frontend behavior is verifiable without a live
//! backend. It provides:
//! - A fixture store and a glob-pattern route registry (last-write-wins)
//! - A CDP-backed browser session controller with interception installed
//!   before the first navigation
//! - Polling visibility/text/attribute assertions with typed timeouts
//! - A sequential scenario runner with evidence capture on both success and
//!   failure paths

pub mod driver;
pub mod error;
pub mod fixtures;
pub mod routes;
pub mod runner;
pub mod session;
pub mod waits;

pub use driver::PageDriver;
pub use error::{EngineError, Result};
pub use fixtures::FixtureStore;
pub use routes::{DynamicResponder, Responder, RoutePattern, RouteRegistry};
pub use runner::{RunnerConfig, ScenarioRunner};
pub use session::{Session, SessionConfig};
pub use waits::{POLL_INTERVAL, await_attribute, await_text, await_visible};
