//! Pattern-based routing of intercepted requests onto fixture responders.
//!
//! Patterns are URL-path globs with an optional query component:
//! - `*` matches within one path segment, `**` across segments
//! - a trailing `?*` (or omitting the query entirely) accepts any or no
//!   query string; a literal query component is glob-matched against the
//!   raw query
//!
//! When several registered patterns match one request, the most recently
//! registered rule wins.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use pagevet_models::{FixtureResponse, InterceptedRequest, RouteBinding};

use crate::error::{EngineError, Result};
use crate::fixtures::FixtureStore;

/// Responder function for routes whose body depends on the request.
pub type DynamicResponder = Arc<dyn Fn(&InterceptedRequest) -> FixtureResponse + Send + Sync>;

/// What a matched route answers with: a fixed payload or a function of the
/// intercepted request. Immutable once the registry is installed on a session.
#[derive(Clone)]
pub enum Responder {
    Fixture(FixtureResponse),
    Dynamic(DynamicResponder),
}

impl Responder {
    pub fn resolve(&self, request: &InterceptedRequest) -> FixtureResponse {
        match self {
            Self::Fixture(fixture) => fixture.clone(),
            Self::Dynamic(responder) => responder(request),
        }
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixture(fixture) => f.debug_tuple("Fixture").field(fixture).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

#[derive(Debug, Clone)]
enum QueryRule {
    /// Pattern omitted the query or used `?*`: any or no query matches.
    Any,
    /// Pattern carried a literal query component, glob-matched.
    Glob(Regex),
}

/// A compiled route pattern: anchored path regex plus query rule.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    path: Regex,
    query: QueryRule,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.trim().is_empty() {
            return Err(EngineError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "pattern is empty".to_string(),
            });
        }

        let (path_part, query_part) = match pattern.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (pattern, None),
        };

        let path = compile_glob(path_part, pattern)?;
        let query = match query_part {
            None | Some("*") => QueryRule::Any,
            Some(query) => QueryRule::Glob(compile_glob(query, pattern)?),
        };

        Ok(Self {
            raw: pattern.to_string(),
            path,
            query,
        })
    }

    /// Whether this pattern matches the request. Matching is against the
    /// request path (never scheme or host) plus the query rule.
    pub fn matches(&self, request: &InterceptedRequest) -> bool {
        if !self.path.is_match(&request.path) {
            return false;
        }
        match &self.query {
            QueryRule::Any => true,
            QueryRule::Glob(glob) => glob.is_match(request.query.as_deref().unwrap_or("")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Compile a glob into an anchored regex.
///
/// Rejects runs of more than two `*`, the one malformation the syntax admits.
fn compile_glob(glob: &str, pattern: &str) -> Result<Regex> {
    let mut regex = String::with_capacity(glob.len() + 8);
    regex.push('^');

    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '*' {
            regex.push_str(&regex::escape(&c.to_string()));
            continue;
        }

        let mut stars = 1;
        while chars.peek() == Some(&'*') {
            chars.next();
            stars += 1;
        }
        match stars {
            1 => regex.push_str("[^/]*"),
            2 => {
                // `**/` collapses to "any directory prefix, or none", so
                // `**/api/users` matches `/api/users` as well as nested paths.
                if chars.peek() == Some(&'/') {
                    chars.next();
                    regex.push_str("(?:.*/)?");
                } else {
                    regex.push_str(".*");
                }
            }
            _ => {
                return Err(EngineError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: format!("run of {stars} consecutive `*`"),
                });
            }
        }
    }
    regex.push('$');

    Regex::new(&regex).map_err(|err| EngineError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })
}

#[derive(Debug, Clone)]
struct RouteRule {
    pattern: RoutePattern,
    responder: Responder,
}

/// Ordered set of route rules owned by one browser session.
///
/// Constructed fresh per run and installed before the first navigation;
/// there is no process-wide registry, so runs cannot interfere.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    rules: Vec<RouteRule>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a static fixture for a pattern.
    pub fn register(&mut self, pattern: &str, fixture: FixtureResponse) -> Result<()> {
        self.push(pattern, Responder::Fixture(fixture))
    }

    /// Register a dynamic responder for a pattern.
    pub fn register_fn<F>(&mut self, pattern: &str, responder: F) -> Result<()>
    where
        F: Fn(&InterceptedRequest) -> FixtureResponse + Send + Sync + 'static,
    {
        self.push(pattern, Responder::Dynamic(Arc::new(responder)))
    }

    fn push(&mut self, pattern: &str, responder: Responder) -> Result<()> {
        let pattern = RoutePattern::parse(pattern)?;
        debug!(pattern = pattern.as_str(), "route registered");
        self.rules.push(RouteRule { pattern, responder });
        Ok(())
    }

    /// Build a registry from a scenario file's route bindings, resolving each
    /// named fixture up front so a missing one fails at registration time.
    pub fn from_bindings(bindings: &[RouteBinding], store: &FixtureStore) -> Result<Self> {
        let mut registry = Self::new();
        for binding in bindings {
            let fixture = store.get(&binding.fixture)?.clone();
            registry.register(&binding.pattern, fixture)?;
        }
        Ok(registry)
    }

    /// The responder of the winning rule, if any. Rules are scanned
    /// newest-first: the most recently registered match wins.
    pub fn matched(&self, request: &InterceptedRequest) -> Option<&Responder> {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.pattern.matches(request))
            .map(|rule| &rule.responder)
    }

    /// Resolve a request to a concrete response, if any rule matches.
    pub fn resolve(&self, request: &InterceptedRequest) -> Option<FixtureResponse> {
        self.matched(request).map(|responder| responder.resolve(request))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
