//! Route table behavior: registration, ordering, lookup.

use http::Method;
use switchyard::error::PatternError;
use switchyard::router::RouteTarget;
use switchyard::routes::{RouteDecl, RouteDecls};

fn target_of(table: &switchyard::RouteTable, method: Method, path: &str) -> String {
    let m = table.lookup(&method, path).expect("expected a match");
    match &m.route.target {
        RouteTarget::Control(t) => t.raw().to_string(),
        RouteTarget::Redirect { status, location } => format!("{status} {location}"),
    }
}

#[test]
fn first_match_wins_by_registration_order() {
    let table = RouteDecls::new()
        .route("GET /dup", RouteDecl::target("A.first"))
        .route("GET /(\\w+)", RouteDecl::target("A.$1"))
        .build()
        .unwrap();

    // both patterns accept /dup; the earlier registration wins
    assert_eq!(target_of(&table, Method::GET, "/dup"), "A.first");
    // the catch-all still serves everything else
    assert_eq!(target_of(&table, Method::GET, "/other"), "A.$1");
}

#[test]
fn catch_all_registered_first_shadows_later_routes() {
    let table = RouteDecls::new()
        .route("GET /(\\w+)", RouteDecl::target("A.$1"))
        .route("GET /dup", RouteDecl::target("A.specific"))
        .build()
        .unwrap();

    assert_eq!(target_of(&table, Method::GET, "/dup"), "A.$1");
}

#[test]
fn methods_are_separate_lists() {
    let table = RouteDecls::new()
        .route(
            "/multi",
            RouteDecl::methods(&[("get", "Index.multiGet"), ("post", "Index.multiPost")]),
        )
        .build()
        .unwrap();

    assert_eq!(target_of(&table, Method::GET, "/multi"), "Index.multiGet");
    assert_eq!(target_of(&table, Method::POST, "/multi"), "Index.multiPost");
    assert!(table.lookup(&Method::DELETE, "/multi").is_none());
}

#[test]
fn lookup_miss_is_not_an_error() {
    let table = RouteDecls::new()
        .route("/", RouteDecl::target("Index.index"))
        .build()
        .unwrap();
    assert!(table.lookup(&Method::GET, "/absent").is_none());
    assert!(table.lookup(&Method::POST, "/").is_none());
}

#[test]
fn capture_bindings_are_returned() {
    let table = RouteDecls::new()
        .route("GET /user/(?<id>\\d+)", RouteDecl::target("User.show"))
        .build()
        .unwrap();

    let m = table.lookup(&Method::GET, "/user/42").unwrap();
    assert_eq!(m.captures.get("id"), Some("42"));
    assert_eq!(m.route.spec(), "/user/(?<id>\\d+)");
}

#[test]
fn invalid_pattern_aborts_build() {
    let err = RouteDecls::new()
        .route("GET /([", RouteDecl::target("A.b"))
        .build()
        .unwrap_err();
    assert!(matches!(err, PatternError::Invalid { .. }));
}

#[test]
fn empty_matching_pattern_is_rejected() {
    let err = RouteDecls::new()
        .route("GET (\\w*)", RouteDecl::target("A.b"))
        .build()
        .unwrap_err();
    assert!(matches!(err, PatternError::MatchesEmpty { .. }));
}

#[test]
fn redirect_status_must_be_3xx() {
    let err = RouteDecls::new()
        .route("GET /old", RouteDecl::redirect(200, "/new"))
        .build()
        .unwrap_err();
    assert!(matches!(err, PatternError::Invalid { .. }));
}

#[test]
fn middleware_is_attached_to_the_route() {
    use std::sync::Arc;
    use switchyard::registry::GuardFn;
    use switchyard::GuardOutcome;

    let mw: GuardFn = Arc::new(|_: &mut switchyard::RequestContext| GuardOutcome::Continue);
    let table = RouteDecls::new()
        .route("GET /m", RouteDecl::with_middleware("A.b", vec![mw]))
        .build()
        .unwrap();

    let m = table.lookup(&Method::GET, "/m").unwrap();
    assert_eq!(m.route.middleware.len(), 1);
}
