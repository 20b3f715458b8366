//! # switchyard
//!
//! **switchyard** is a controller/action request dispatcher for Rust,
//! running on the [`may`] coroutine runtime behind `may_minihttp`. It takes
//! an inbound HTTP request, finds the registered handler that should run,
//! executes the guard chain declared for it, and turns anything that goes
//! wrong into a normalized, content-negotiated error response — with each
//! request fully isolated from every other in-flight request.
//!
//! ## Architecture
//!
//! - **[`pattern`]** — route spec compilation (implicit whole-path anchors,
//!   named capture groups) and `$1`/`${name}` target substitution
//! - **[`router`]** — the per-method, insertion-ordered route table;
//!   first match wins
//! - **[`fallback`]** — convention routing: `/Controller/action/params`
//!   resolved structurally when no explicit route matches
//! - **[`registry`]** — controllers, their exposed actions, named guards
//!   and `before` hooks
//! - **[`policy`]** — guard-chain resolution from normalized policy maps
//! - **[`dispatcher`]** — the per-request state machine
//!   (`Matching → GuardChain → Action → Responding`), with explicit
//!   skip/exit control flow and panic confinement
//! - **[`context`]** — the exclusively-owned request context and the
//!   failure classifier
//! - **[`routes`]** — declarative route tables, in code or from YAML
//! - **[`server`]** — the `may_minihttp` integration seam
//! - **[`hot_reload`]** — watch the routes file and swap the table
//!   atomically
//!
//! ## Request flow
//!
//! ```text
//! request ──► RouteTable.lookup ──miss──► ConventionFallback ──miss──► 404
//!                  │ hit (redirect routes answer immediately)
//!                  ▼
//!          merge captured params ──► guard chain ──► action ──► response
//!                                      │ SkipRest: straight to action
//!                                      │ ExitNow:  stop, nothing written
//!                                      └ Fail/panic ──► failure classifier
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use switchyard::context::RequestContext;
//! use switchyard::dispatcher::DispatchEngine;
//! use switchyard::registry::{Controller, ControllerRegistry};
//! use switchyard::routes::{RouteDecl, RouteDecls};
//! use switchyard::server::{AppService, HttpServer};
//!
//! fn index(ctx: &mut RequestContext) -> Result<(), switchyard::error::DispatchError> {
//!     ctx.send("hello");
//!     Ok(())
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut registry = ControllerRegistry::new();
//! registry.register(Controller::builder("Index").action("index", index).build()?)?;
//!
//! let table = RouteDecls::new()
//!     .route("/", RouteDecl::target("Index.index"))
//!     .route("GET /user/(?<id>\\d+)", RouteDecl::target("User.show"))
//!     .build()?;
//!
//! let engine = Arc::new(DispatchEngine::new(table, registry));
//! let handle = HttpServer(AppService::new(engine)).start("0.0.0.0:3000")?;
//! handle.join().ok();
//! # Ok(())
//! # }
//! ```
//!
//! ## Runtime considerations
//!
//! switchyard runs on `may` coroutines, not tokio: one coroutine per
//! request, blocking operations should use `may`'s facilities, and the
//! stack size is configurable through `SWITCHYARD_STACK_SIZE` (see
//! [`runtime_config`]). The routing table, controller registry and policy
//! maps are built before serving begins and are read-only afterwards —
//! reloads swap the whole table atomically, so the request path takes no
//! locks.

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod fallback;
pub mod hot_reload;
pub mod ids;
pub mod metrics;
pub mod pattern;
pub mod policy;
pub mod registry;
pub mod router;
pub mod routes;
pub mod runtime_config;
pub mod server;

pub use context::{ErrorPages, RequestContext};
pub use dispatcher::{DispatchEngine, GuardOutcome};
pub use error::{DispatchError, HttpFailure, PatternError};
pub use registry::{ActionFn, ActionKind, Controller, ControllerRegistry, GuardFn};
pub use router::{RouteMatch, RoutePattern, RouteTable, RouteTarget};
pub use routes::{load_routes_file, RouteDecl, RouteDecls};
