use crate::error::PatternError;
use crate::pattern::{CompiledPattern, PatternCaptures, TargetTemplate};
use crate::registry::GuardFn;
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// What a matched route dispatches to.
#[derive(Clone)]
pub enum RouteTarget {
    /// A controller/action template resolved against the match captures.
    Control(TargetTemplate),
    /// A redirect emitted directly from the table; the guard chain and
    /// action are never involved. The location may use capture placeholders.
    Redirect { status: u16, location: String },
}

/// One registered route. Immutable once registered.
pub struct RoutePattern {
    pub method: Method,
    pub matcher: CompiledPattern,
    pub target: RouteTarget,
    /// Route-level guards, run ahead of the resolved policy chain.
    pub middleware: Vec<GuardFn>,
}

impl RoutePattern {
    /// The specification string as registered.
    pub fn spec(&self) -> &str {
        self.matcher.spec()
    }
}

/// A successful table lookup: the route plus its capture bindings.
#[derive(Clone)]
pub struct RouteMatch {
    pub route: Arc<RoutePattern>,
    pub captures: PatternCaptures,
}

/// Mapping from HTTP method to an insertion-ordered route list.
///
/// Never mutated while serving; hot reload replaces the whole table.
#[derive(Default, Clone)]
pub struct RouteTable {
    routes: HashMap<Method, Vec<Arc<RoutePattern>>>,
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("methods", &self.routes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `spec` and append it to `method`'s list.
    ///
    /// Registration order is match priority. A bad spec or a non-3xx
    /// redirect status aborts registration.
    pub fn register(
        &mut self,
        method: Method,
        spec: &str,
        target: RouteTarget,
        middleware: Vec<GuardFn>,
    ) -> Result<(), PatternError> {
        if let RouteTarget::Redirect { status, .. } = &target {
            if !(300..400).contains(status) {
                return Err(PatternError::Invalid {
                    spec: spec.to_string(),
                    reason: format!("redirect status {status} is not a 3xx code"),
                });
            }
        }

        let matcher = CompiledPattern::compile(spec)?;
        let entry = self.routes.entry(method.clone()).or_default();
        debug!(
            method = %method,
            spec,
            position = entry.len(),
            "route registered"
        );
        entry.push(Arc::new(RoutePattern {
            method,
            matcher,
            target,
            middleware,
        }));
        Ok(())
    }

    /// First-match-wins lookup over `method`'s routes.
    ///
    /// Returns `None` when nothing matches; misses are not errors here —
    /// the engine still has the convention fallback to try.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let routes = self.routes.get(method)?;
        for route in routes {
            if let Some(captures) = route.matcher.matches(path) {
                debug!(method = %method, path, spec = route.spec(), "route matched");
                return Some(RouteMatch {
                    route: Arc::clone(route),
                    captures,
                });
            }
        }
        None
    }

    /// Total number of registered routes across all methods.
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Log a summary of the loaded table; called once after startup/reload.
    pub fn log_summary(&self) {
        info!(routes_count = self.len(), "routing table loaded");
    }
}
