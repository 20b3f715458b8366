//! Controllers and the process-wide controller registry.
//!
//! A controller is a named group of actions plus its guard wiring: an
//! optional generic `before` guard, named guards that policies can refer to
//! by string, and the policy map itself. Everything is declared through the
//! builder and frozen at [`ControllerBuilder::build`]; the registry is built
//! once at startup and read-only afterwards.
//!
//! Whether an entry is dispatchable is a tagged variant decided at build
//! time, not probed at dispatch time: [`ActionKind::Exposed`] carries the
//! callable, [`ActionKind::Internal`] marks an operation the controller
//! declares but does not expose. Dispatching an internal entry produces the
//! "mis-declared handler" diagnostic instead of a silent miss.

use crate::context::RequestContext;
use crate::dispatcher::GuardOutcome;
use crate::error::DispatchError;
use crate::policy::{PolicyMap, PolicyRef};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A dispatchable controller action. Receives the owning request context
/// and reports failure through the dispatch error taxonomy.
pub type ActionFn =
    Arc<dyn Fn(&mut RequestContext) -> Result<(), DispatchError> + Send + Sync>;

/// A guard run ahead of an action; its outcome steers the chain.
pub type GuardFn = Arc<dyn Fn(&mut RequestContext) -> GuardOutcome + Send + Sync>;

/// Registry entry for one declared operation.
#[derive(Clone)]
pub enum ActionKind {
    /// Intentionally exposed; dispatchable.
    Exposed(ActionFn),
    /// Declared on the controller but not dispatchable.
    Internal,
}

/// A named grouping of actions plus guard/policy declarations.
pub struct Controller {
    name: String,
    actions: HashMap<String, ActionKind>,
    guards: HashMap<String, GuardFn>,
    before: Option<GuardFn>,
    policies: PolicyMap,
}

impl Controller {
    /// Start building a controller. Namespace separators (`/`) in the name
    /// normalize to the dotted registry form.
    pub fn builder(name: &str) -> ControllerBuilder {
        ControllerBuilder {
            name: name.replace('/', "."),
            actions: HashMap::new(),
            guards: HashMap::new(),
            before: None,
            raw_policies: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self, name: &str) -> Option<&ActionKind> {
        self.actions.get(name)
    }

    pub fn guard(&self, name: &str) -> Option<&GuardFn> {
        self.guards.get(name)
    }

    pub fn before(&self) -> Option<&GuardFn> {
        self.before.as_ref()
    }

    pub fn policies(&self) -> &PolicyMap {
        &self.policies
    }
}

/// Builder for [`Controller`]; policy keys are normalized in [`build`].
///
/// [`build`]: ControllerBuilder::build
pub struct ControllerBuilder {
    name: String,
    actions: HashMap<String, ActionKind>,
    guards: HashMap<String, GuardFn>,
    before: Option<GuardFn>,
    raw_policies: Vec<(String, PolicyRef)>,
}

impl ControllerBuilder {
    /// Declare an exposed, dispatchable action.
    pub fn action<F>(mut self, name: &str, action: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.actions
            .insert(name.to_string(), ActionKind::Exposed(Arc::new(action)));
        self
    }

    /// Declare an operation that exists on the controller but must not be
    /// dispatched. Requests that resolve to it get a clear diagnostic.
    pub fn internal(mut self, name: &str) -> Self {
        self.actions.insert(name.to_string(), ActionKind::Internal);
        self
    }

    /// Declare a named guard that policies can reference by string.
    pub fn guard<F>(mut self, name: &str, guard: F) -> Self
    where
        F: Fn(&mut RequestContext) -> GuardOutcome + Send + Sync + 'static,
    {
        self.guards.insert(name.to_string(), Arc::new(guard));
        self
    }

    /// The generic `before` guard, run when no policy matches a route.
    pub fn before<F>(mut self, guard: F) -> Self
    where
        F: Fn(&mut RequestContext) -> GuardOutcome + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(guard));
        self
    }

    /// Declare a policy for a route key (`"/path"` implies GET,
    /// `"METHOD /path"` is explicit).
    pub fn policy(mut self, key: &str, policy: PolicyRef) -> Self {
        self.raw_policies.push((key.to_string(), policy));
        self
    }

    /// Normalize policy keys and freeze the controller.
    pub fn build(self) -> Result<Controller, DispatchError> {
        let mut policies = PolicyMap::new();
        for (key, policy) in self.raw_policies {
            policies.insert(&key, policy)?;
        }
        Ok(Controller {
            name: self.name,
            actions: self.actions,
            guards: self.guards,
            before: self.before,
            policies,
        })
    }
}

/// Mapping from dotted controller name to controller.
///
/// Built once before serving begins; lookups are lock-free reads.
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Arc<Controller>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller under its dotted name.
    ///
    /// Duplicate names are a configuration error: two controllers
    /// flattening to the same name would shadow each other silently.
    pub fn register(&mut self, controller: Controller) -> Result<(), DispatchError> {
        let name = controller.name().to_string();
        if self.controllers.contains_key(&name) {
            return Err(DispatchError::Config(format!(
                "controller `{name}` is already registered"
            )));
        }
        debug!(controller = %name, "controller registered");
        self.controllers.insert(name, Arc::new(controller));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Controller>> {
        self.controllers.get(name)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
