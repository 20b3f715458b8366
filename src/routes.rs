//! Declarative route tables.
//!
//! Keys are either bare paths (implying GET) or `"METHOD /path"` strings;
//! values are one of: a literal `"Controller.action"` target, a per-method
//! map, a target with a middleware list, or a redirect. The same shapes load
//! from a YAML file for the closure-free subset — that file is what the
//! hot-reload watcher rebuilds the table from.

use crate::error::PatternError;
use crate::pattern::TargetTemplate;
use crate::registry::GuardFn;
use crate::router::{RouteTable, RouteTarget};
use anyhow::Context as _;
use http::Method;
use serde_yaml::Value as Yaml;
use std::path::Path;

/// One route declaration value.
pub enum RouteDecl {
    /// `"Controller.action"`, possibly with capture placeholders.
    Target(String),
    /// Method name → target, for one path serving several methods.
    Methods(Vec<(String, String)>),
    /// Explicit target plus route-level middleware, run before the policy
    /// chain in declaration order.
    Action {
        target: String,
        middleware: Vec<GuardFn>,
    },
    /// Redirect the matched path instead of dispatching; the location may
    /// use capture placeholders.
    Redirect { status: u16, location: String },
}

impl RouteDecl {
    pub fn target(target: &str) -> Self {
        RouteDecl::Target(target.to_string())
    }

    pub fn methods(pairs: &[(&str, &str)]) -> Self {
        RouteDecl::Methods(
            pairs
                .iter()
                .map(|(m, t)| (m.to_string(), t.to_string()))
                .collect(),
        )
    }

    pub fn with_middleware(target: &str, middleware: Vec<GuardFn>) -> Self {
        RouteDecl::Action {
            target: target.to_string(),
            middleware,
        }
    }

    /// The array declaration form: middleware first, target last.
    pub fn chain(middleware: Vec<GuardFn>, target: &str) -> Self {
        Self::with_middleware(target, middleware)
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        RouteDecl::Redirect {
            status,
            location: location.to_string(),
        }
    }
}

/// An ordered route declaration list; declaration order is match priority.
#[derive(Default)]
pub struct RouteDecls {
    entries: Vec<(String, RouteDecl)>,
}

impl RouteDecls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, key: &str, decl: RouteDecl) -> Self {
        self.entries.push((key.to_string(), decl));
        self
    }

    /// Compile every declaration into a fresh routing table.
    pub fn build(&self) -> Result<RouteTable, PatternError> {
        let mut table = RouteTable::new();
        for (key, decl) in &self.entries {
            let (method, spec) = parse_route_key(key)?;
            match decl {
                RouteDecl::Target(target) => {
                    let template = TargetTemplate::parse(target)?;
                    table.register(method, &spec, RouteTarget::Control(template), Vec::new())?;
                }
                RouteDecl::Methods(pairs) => {
                    for (m, target) in pairs {
                        let method = parse_method(m).ok_or_else(|| PatternError::Key {
                            key: key.clone(),
                            reason: format!("unsupported HTTP method `{m}`"),
                        })?;
                        let template = TargetTemplate::parse(target)?;
                        table.register(
                            method,
                            &spec,
                            RouteTarget::Control(template),
                            Vec::new(),
                        )?;
                    }
                }
                RouteDecl::Action { target, middleware } => {
                    let template = TargetTemplate::parse(target)?;
                    table.register(
                        method,
                        &spec,
                        RouteTarget::Control(template),
                        middleware.clone(),
                    )?;
                }
                RouteDecl::Redirect { status, location } => {
                    table.register(
                        method,
                        &spec,
                        RouteTarget::Redirect {
                            status: *status,
                            location: location.clone(),
                        },
                        Vec::new(),
                    )?;
                }
            }
        }
        table.log_summary();
        Ok(table)
    }
}

/// Split a route key into method and path spec; a bare path implies GET.
pub fn parse_route_key(key: &str) -> Result<(Method, String), PatternError> {
    let parts: Vec<&str> = key.split_whitespace().collect();
    match parts.as_slice() {
        [path] => Ok((Method::GET, (*path).to_string())),
        [method, path] => {
            let method = parse_method(method).ok_or_else(|| PatternError::Key {
                key: key.to_string(),
                reason: format!("unsupported HTTP method `{method}`"),
            })?;
            Ok((method, (*path).to_string()))
        }
        [] => Err(PatternError::Key {
            key: key.to_string(),
            reason: "empty route key".to_string(),
        }),
        _ => Err(PatternError::Key {
            key: key.to_string(),
            reason: "expected `/path` or `METHOD /path`".to_string(),
        }),
    }
}

/// The fixed supported method set.
pub fn parse_method(s: &str) -> Option<Method> {
    match s.to_ascii_uppercase().as_str() {
        "GET" => Some(Method::GET),
        "POST" => Some(Method::POST),
        "PUT" => Some(Method::PUT),
        "DELETE" => Some(Method::DELETE),
        "PATCH" => Some(Method::PATCH),
        "HEAD" => Some(Method::HEAD),
        "OPTIONS" => Some(Method::OPTIONS),
        _ => None,
    }
}

/// Load a routing table from a YAML declaration file.
///
/// Supports the closure-free declaration subset: string targets, per-method
/// maps, and redirect objects (`{redirect: 301, location: "/new/$1"}`).
pub fn load_routes_file(path: impl AsRef<Path>) -> anyhow::Result<RouteTable> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading routes file {}", path.display()))?;
    load_routes_str(&content)
}

/// Parse a YAML declaration document into a routing table.
pub fn load_routes_str(content: &str) -> anyhow::Result<RouteTable> {
    let doc: Yaml = serde_yaml::from_str(content).context("parsing routes file")?;
    let map = doc
        .as_mapping()
        .context("routes file must be a mapping of route keys to targets")?;

    let mut decls = RouteDecls::new();
    for (key, value) in map {
        let key = key
            .as_str()
            .context("route keys must be strings")?;
        let decl = decl_from_yaml(key, value)?;
        decls = decls.route(key, decl);
    }
    Ok(decls.build()?)
}

fn decl_from_yaml(key: &str, value: &Yaml) -> anyhow::Result<RouteDecl> {
    match value {
        Yaml::String(target) => Ok(RouteDecl::Target(target.clone())),
        Yaml::Mapping(map) => {
            if let Some(redirect) = map.get("redirect") {
                let status = redirect
                    .as_u64()
                    .with_context(|| format!("route `{key}`: `redirect` must be a status code"))?
                    as u16;
                let location = map
                    .get("location")
                    .and_then(Yaml::as_str)
                    .with_context(|| format!("route `{key}`: redirect needs a `location`"))?;
                Ok(RouteDecl::Redirect {
                    status,
                    location: location.to_string(),
                })
            } else {
                let mut pairs = Vec::new();
                for (method, target) in map {
                    let method = method
                        .as_str()
                        .with_context(|| format!("route `{key}`: method keys must be strings"))?;
                    let target = target
                        .as_str()
                        .with_context(|| format!("route `{key}`: targets must be strings"))?;
                    pairs.push((method.to_string(), target.to_string()));
                }
                if pairs.is_empty() {
                    anyhow::bail!("no action specified for route `{key}`");
                }
                Ok(RouteDecl::Methods(pairs))
            }
        }
        _ => anyhow::bail!("unsupported declaration for route `{key}`"),
    }
}
