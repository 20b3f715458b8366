//! Policy map normalization and guard-chain resolution.

use http::Method;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use switchyard::context::{ErrorPages, RequestContext};
use switchyard::dispatcher::GuardOutcome;
use switchyard::error::DispatchError;
use switchyard::policy::{self, PolicyMap, PolicyRef};
use switchyard::registry::{Controller, GuardFn};
use switchyard::server::ParsedRequest;

fn make_ctx(path: &str) -> RequestContext {
    RequestContext::new(
        Method::GET,
        ParsedRequest::new("GET", path),
        Arc::new(ErrorPages::new()),
    )
}

fn run_chain(chain: &[GuardFn], ctx: &mut RequestContext) {
    for guard in chain {
        match guard(ctx) {
            GuardOutcome::Continue => {}
            _ => break,
        }
    }
}

#[test]
fn bare_keys_normalize_to_get() {
    let mut map = PolicyMap::new();
    map.insert("/login", PolicyRef::Named("x".into())).unwrap();
    assert!(map.get(&Method::GET, "/login").is_some());
    assert!(map.get(&Method::POST, "/login").is_none());
}

#[test]
fn method_names_normalize_case() {
    let mut map = PolicyMap::new();
    map.insert("post /submit", PolicyRef::Named("x".into()))
        .unwrap();
    assert!(map.get(&Method::POST, "/submit").is_some());
}

#[test]
fn unsupported_methods_are_rejected_at_build() {
    let mut map = PolicyMap::new();
    assert!(map.insert("FETCH /x", PolicyRef::Named("x".into())).is_err());
}

#[test]
fn named_policy_resolves_to_declared_guard() {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_in_guard = Arc::clone(&hits);

    let controller = Controller::builder("Home")
        .guard("homeGuard", move |_: &mut RequestContext| {
            hits_in_guard.fetch_add(1, Ordering::SeqCst);
            GuardOutcome::Continue
        })
        .policy("get /", PolicyRef::Named("homeGuard".into()))
        .build()
        .unwrap();

    let chain = policy::resolve(&controller, &Method::GET, "/").unwrap();
    assert_eq!(chain.len(), 1);
    let mut ctx = make_ctx("/");
    run_chain(&chain, &mut ctx);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_named_policy_is_a_config_error() {
    let controller = Controller::builder("Home")
        .policy("get /", PolicyRef::Named("ghost".into()))
        .build()
        .unwrap();

    let err = policy::resolve(&controller, &Method::GET, "/").unwrap_err();
    assert!(matches!(err, DispatchError::Config(_)));
}

#[test]
fn chain_policies_run_in_declared_order() {
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));

    let o1 = Arc::clone(&order);
    let g1: GuardFn = Arc::new(move |_: &mut RequestContext| {
        o1.lock().unwrap().push(1);
        GuardOutcome::Continue
    });
    let o2 = Arc::clone(&order);
    let g2: GuardFn = Arc::new(move |_: &mut RequestContext| {
        o2.lock().unwrap().push(2);
        GuardOutcome::Continue
    });

    let controller = Controller::builder("T")
        .policy("GET /t", PolicyRef::Chain(vec![g1, g2]))
        .build()
        .unwrap();

    let chain = policy::resolve(&controller, &Method::GET, "/t").unwrap();
    assert_eq!(chain.len(), 2);
    let mut ctx = make_ctx("/t");
    run_chain(&chain, &mut ctx);
    assert_eq!(*order.lock().unwrap(), vec![1, 2]);
}

#[test]
fn empty_chain_is_a_config_error() {
    let controller = Controller::builder("T")
        .policy("GET /t", PolicyRef::Chain(Vec::new()))
        .build()
        .unwrap();
    assert!(policy::resolve(&controller, &Method::GET, "/t").is_err());
}

#[test]
fn unmatched_routes_fall_back_to_before() {
    let before_hits = Arc::new(AtomicUsize::new(0));
    let named_hits = Arc::new(AtomicUsize::new(0));

    let before_flag = Arc::clone(&before_hits);
    let named_flag = Arc::clone(&named_hits);

    let controller = Controller::builder("Site")
        .before(move |_: &mut RequestContext| {
            before_flag.fetch_add(1, Ordering::SeqCst);
            GuardOutcome::Continue
        })
        .guard("rootOnly", move |_: &mut RequestContext| {
            named_flag.fetch_add(1, Ordering::SeqCst);
            GuardOutcome::Continue
        })
        .policy("get /", PolicyRef::Named("rootOnly".into()))
        .build()
        .unwrap();

    // `/` has a named policy
    let chain = policy::resolve(&controller, &Method::GET, "/").unwrap();
    let mut ctx = make_ctx("/");
    run_chain(&chain, &mut ctx);
    assert_eq!(named_hits.load(Ordering::SeqCst), 1);
    assert_eq!(before_hits.load(Ordering::SeqCst), 0);

    // `/user` has none and uses the generic before hook
    let chain = policy::resolve(&controller, &Method::GET, "/user").unwrap();
    let mut ctx = make_ctx("/user");
    run_chain(&chain, &mut ctx);
    assert_eq!(before_hits.load(Ordering::SeqCst), 1);
    assert_eq!(named_hits.load(Ordering::SeqCst), 1);
}

#[test]
fn chain_is_never_empty_even_without_declarations() {
    let controller = Controller::builder("Bare").build().unwrap();
    let chain = policy::resolve(&controller, &Method::GET, "/anything").unwrap();
    assert_eq!(chain.len(), 1);
    let mut ctx = make_ctx("/anything");
    assert!(matches!(chain[0](&mut ctx), GuardOutcome::Continue));
}

#[test]
fn duplicate_controller_names_are_rejected() {
    use switchyard::registry::ControllerRegistry;

    let mut registry = ControllerRegistry::new();
    registry
        .register(Controller::builder("User").build().unwrap())
        .unwrap();
    let err = registry
        .register(Controller::builder("User").build().unwrap())
        .unwrap_err();
    assert!(matches!(err, DispatchError::Config(_)));
}
