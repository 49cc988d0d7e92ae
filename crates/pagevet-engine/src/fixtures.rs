//! Static fixture payloads keyed by logical name.

use std::collections::{BTreeMap, HashMap};

use pagevet_models::FixtureResponse;

use crate::error::{EngineError, Result};

/// Read-only lookup of canned responses for the duration of a run.
///
/// There is no mutation API past setup: scenarios that need varying data
/// register distinct fixtures or a dynamic responder on the route registry.
#[derive(Debug, Clone, Default)]
pub struct FixtureStore {
    fixtures: HashMap<String, FixtureResponse>,
}

impl FixtureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, fixture: FixtureResponse) {
        self.fixtures.insert(name.into(), fixture);
    }

    /// Look up a fixture by name. A miss is a harness-authoring bug, not a
    /// frontend defect, and propagates immediately.
    pub fn get(&self, name: &str) -> Result<&FixtureResponse> {
        self.fixtures
            .get(name)
            .ok_or_else(|| EngineError::FixtureNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

impl From<BTreeMap<String, FixtureResponse>> for FixtureStore {
    fn from(fixtures: BTreeMap<String, FixtureResponse>) -> Self {
        Self {
            fixtures: fixtures.into_iter().collect(),
        }
    }
}
