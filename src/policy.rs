//! Policy maps and guard-chain resolution.
//!
//! A policy is the guard (or ordered guard list) that must run before an
//! action. Controllers declare policies under the same key shapes as route
//! declarations; keys are normalized to the canonical `(method, path)` form
//! when the controller is built, before any route is matched against them.

use crate::error::PatternError;
use crate::registry::{Controller, GuardFn};
use crate::routes::parse_route_key;
use crate::{dispatcher::GuardOutcome, error::DispatchError};
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

/// A declared policy: a named guard on the controller, an inline guard, or
/// an ordered list of guards that all run.
#[derive(Clone)]
pub enum PolicyRef {
    Named(String),
    Func(GuardFn),
    Chain(Vec<GuardFn>),
}

/// Canonicalized `(method, path)` → policy mapping.
#[derive(Default, Clone)]
pub struct PolicyMap {
    entries: HashMap<(Method, String), PolicyRef>,
}

impl PolicyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under a shorthand key; `"/path"` implies GET.
    pub fn insert(&mut self, key: &str, policy: PolicyRef) -> Result<(), PatternError> {
        let (method, path) = parse_route_key(key)?;
        self.entries.insert((method, path), policy);
        Ok(())
    }

    pub fn get(&self, method: &Method, path: &str) -> Option<&PolicyRef> {
        self.entries.get(&(method.clone(), path.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A guard that always continues; the chain fallback of last resort.
pub fn allow_all() -> GuardFn {
    Arc::new(|_ctx: &mut crate::context::RequestContext| GuardOutcome::Continue)
}

/// Resolve the guard chain for a matched route.
///
/// Order: a named policy must be a guard declared on the controller
/// (anything else is a configuration error), then an inline guard, then a
/// declared chain (run in order), then the controller's generic `before`
/// guard. The returned chain is never empty.
pub fn resolve(
    controller: &Controller,
    method: &Method,
    path: &str,
) -> Result<Vec<GuardFn>, DispatchError> {
    match controller.policies().get(method, path) {
        Some(PolicyRef::Named(name)) => match controller.guard(name) {
            Some(guard) => Ok(vec![guard.clone()]),
            None => Err(DispatchError::Config(format!(
                "policy `{name}` was not found on controller `{}`",
                controller.name()
            ))),
        },
        Some(PolicyRef::Func(guard)) => Ok(vec![guard.clone()]),
        Some(PolicyRef::Chain(guards)) => {
            if guards.is_empty() {
                return Err(DispatchError::Config(format!(
                    "empty policy chain declared for `{method} {path}` on controller `{}`",
                    controller.name()
                )));
            }
            Ok(guards.clone())
        }
        None => Ok(vec![controller
            .before()
            .cloned()
            .unwrap_or_else(allow_all)]),
    }
}
