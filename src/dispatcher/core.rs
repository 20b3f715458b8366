use crate::context::RequestContext;
use crate::error::{DispatchError, HttpFailure};
use crate::fallback;
use crate::pattern::substitute;
use crate::policy;
use crate::registry::{ActionKind, ControllerRegistry, GuardFn};
use crate::router::{RouteTable, RouteTarget};
use arc_swap::ArcSwap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of one guard invocation; the engine transitions on this value.
pub enum GuardOutcome {
    /// Proceed to the next guard, or the action if this was the last one.
    Continue,
    /// Abort the remaining guard chain and run the action directly.
    SkipRest,
    /// Terminate the request: no further guards, no action, and no default
    /// response (the guard either sent one or intentionally left it unsent).
    ExitNow,
    /// The guard failed; the request transitions to the failure classifier.
    Fail(DispatchError),
}

impl GuardOutcome {
    pub fn fail(err: impl Into<DispatchError>) -> Self {
        GuardOutcome::Fail(err.into())
    }
}

/// What matching produced for a dispatchable request.
struct ResolvedTarget {
    controller: String,
    action: String,
    middleware: Vec<GuardFn>,
    /// Key path for policy lookup: the declared spec for table matches, the
    /// request path for convention matches.
    policy_path: String,
    via_convention: bool,
}

/// Orchestrates one request: match, guard, act, classify failures.
///
/// Shared across all in-flight requests; holds only read-only (or
/// atomically swapped) state, so no locking happens on the request path.
pub struct DispatchEngine {
    table: Arc<ArcSwap<RouteTable>>,
    registry: Arc<ControllerRegistry>,
}

impl DispatchEngine {
    pub fn new(table: RouteTable, registry: ControllerRegistry) -> Self {
        Self {
            table: Arc::new(ArcSwap::from_pointee(table)),
            registry: Arc::new(registry),
        }
    }

    /// Build from already-shared state; used when a reload watcher holds
    /// the same table handle.
    pub fn with_shared(
        table: Arc<ArcSwap<RouteTable>>,
        registry: Arc<ControllerRegistry>,
    ) -> Self {
        Self { table, registry }
    }

    /// Handle to the swappable routing table, for hot-reload wiring.
    pub fn table(&self) -> Arc<ArcSwap<RouteTable>> {
        Arc::clone(&self.table)
    }

    pub fn registry(&self) -> &Arc<ControllerRegistry> {
        &self.registry
    }

    /// Run the full state machine for one request.
    ///
    /// Failures — including panics out of guards or actions — are caught
    /// here, exactly once, and routed into the context's classifier. A
    /// panic is confined to its own request.
    pub fn dispatch(&self, ctx: &mut RequestContext) {
        match catch_unwind(AssertUnwindSafe(|| self.run(ctx))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => ctx.fail(err),
            Err(panic) => {
                let panic_message = format!("{panic:?}");
                ctx.fail(DispatchError::Other(anyhow::anyhow!(
                    "handler panicked: {panic_message}"
                )));
            }
        }
    }

    fn run(&self, ctx: &mut RequestContext) -> Result<(), DispatchError> {
        let method = ctx.method().clone();
        let path = ctx.path().to_string();
        debug!(request_id = %ctx.id, method = %method, path = %path, "dispatch: matching");

        // Matching: table first, convention second, 404 on total miss.
        let table = self.table.load();
        let target = match table.lookup(&method, &path) {
            Some(m) => match &m.route.target {
                RouteTarget::Redirect { status, location } => {
                    // redirect routes short-circuit: no guards, no action
                    let location = substitute(location, &m.captures)?;
                    info!(
                        request_id = %ctx.id,
                        status = *status,
                        location = %location,
                        "redirect route"
                    );
                    ctx.redirect(*status, &location);
                    return Ok(());
                }
                RouteTarget::Control(template) => {
                    let (controller, action) = template.resolve(&m.captures)?;
                    // guards must observe matched path parameters
                    ctx.merge_params(m.captures.named_pairs());
                    ResolvedTarget {
                        controller,
                        action,
                        middleware: m.route.middleware.clone(),
                        policy_path: m.route.spec().to_string(),
                        via_convention: false,
                    }
                }
            },
            None => match fallback::resolve(&path) {
                Some(conv) => {
                    ctx.set_positional(conv.params);
                    ResolvedTarget {
                        controller: conv.controller,
                        action: conv.action,
                        middleware: Vec::new(),
                        policy_path: path.clone(),
                        via_convention: true,
                    }
                }
                None => return Err(HttpFailure::not_found("Not Found").into()),
            },
        };

        ctx.controller = Some(target.controller.clone());
        ctx.action = Some(target.action.clone());

        // Targets resolve against the registry lazily, at call time; a dead
        // explicit route is misconfiguration, a dead convention guess is a
        // plain 404.
        let controller = match self.registry.get(&target.controller) {
            Some(c) => Arc::clone(c),
            None => {
                return Err(if target.via_convention {
                    HttpFailure::not_found("Not Found").into()
                } else {
                    DispatchError::Config(format!(
                        "route target `{}.{}` names controller `{}`, which is not registered",
                        target.controller, target.action, target.controller
                    ))
                });
            }
        };

        // GuardChain: route middleware first, then the resolved policy chain.
        debug!(
            request_id = %ctx.id,
            controller = %target.controller,
            action = %target.action,
            "dispatch: guard chain"
        );
        let mut chain = target.middleware;
        chain.extend(policy::resolve(&controller, &method, &target.policy_path)?);

        for (idx, guard) in chain.iter().enumerate() {
            match guard(ctx) {
                GuardOutcome::Continue => {}
                GuardOutcome::SkipRest => {
                    debug!(request_id = %ctx.id, guard = idx, "guard chain skipped");
                    break;
                }
                GuardOutcome::ExitNow => {
                    debug!(request_id = %ctx.id, guard = idx, "guard exited request");
                    if !ctx.response().is_sent() {
                        ctx.response_mut().suppress();
                    }
                    return Ok(());
                }
                GuardOutcome::Fail(err) => return Err(err),
            }
        }

        // Action: resolve from the registry and invoke.
        let action_fn = match controller.action(&target.action) {
            Some(ActionKind::Exposed(f)) => f.clone(),
            Some(ActionKind::Internal) => {
                return Err(if target.via_convention {
                    HttpFailure::not_found("Not Found").into()
                } else {
                    DispatchError::Config(format!(
                        "action `{}.{}` is declared but not exposed as a dispatchable \
                         operation; it looks like a mis-declared handler",
                        target.controller, target.action
                    ))
                });
            }
            None => {
                return Err(if target.via_convention {
                    HttpFailure::not_found("Not Found").into()
                } else {
                    DispatchError::Config(format!(
                        "action `{}.{}` does not exist on controller `{}`",
                        target.controller, target.action, target.controller
                    ))
                });
            }
        };

        debug!(request_id = %ctx.id, "dispatch: action");
        action_fn(ctx)?;

        debug!(request_id = %ctx.id, status = ctx.response().status(), "dispatch: responding");
        Ok(())
    }
}
