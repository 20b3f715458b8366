//! Route declaration parsing: key shapes, builder forms, YAML loading.

use http::Method;
use switchyard::error::PatternError;
use switchyard::router::RouteTarget;
use switchyard::routes::{load_routes_file, load_routes_str, parse_route_key, RouteDecl, RouteDecls};

#[test]
fn bare_keys_imply_get() {
    let (method, path) = parse_route_key("/login").unwrap();
    assert_eq!(method, Method::GET);
    assert_eq!(path, "/login");
}

#[test]
fn explicit_method_keys_parse() {
    let (method, path) = parse_route_key("post /submit").unwrap();
    assert_eq!(method, Method::POST);
    assert_eq!(path, "/submit");
}

#[test]
fn bad_keys_are_rejected() {
    assert!(matches!(
        parse_route_key("FETCH /x"),
        Err(PatternError::Key { .. })
    ));
    assert!(matches!(
        parse_route_key("GET /x extra"),
        Err(PatternError::Key { .. })
    ));
    assert!(matches!(parse_route_key("   "), Err(PatternError::Key { .. })));
}

#[test]
fn declaration_order_is_preserved_per_method() {
    let table = RouteDecls::new()
        .route("GET /a", RouteDecl::target("A.a"))
        .route("GET /(\\w+)", RouteDecl::target("A.$1"))
        .route("POST /a", RouteDecl::target("A.postA"))
        .build()
        .unwrap();

    assert_eq!(table.len(), 3);
    let m = table.lookup(&Method::GET, "/a").unwrap();
    match &m.route.target {
        RouteTarget::Control(t) => assert_eq!(t.raw(), "A.a"),
        RouteTarget::Redirect { .. } => panic!("expected a control target"),
    }
}

#[test]
fn yaml_declarations_build_the_same_table_shapes() {
    let table = load_routes_str(
        r#"
"/": Index.index
"GET /user/(?<id>\\d+)": User.show
"/multi":
  get: Index.multiGet
  post: Index.multiPost
"GET /old/(\\w+)":
  redirect: 301
  location: "/new/$1"
"#,
    )
    .unwrap();

    assert_eq!(table.len(), 5);

    let m = table.lookup(&Method::GET, "/user/7").unwrap();
    assert_eq!(m.captures.get("id"), Some("7"));

    let m = table.lookup(&Method::POST, "/multi").unwrap();
    match &m.route.target {
        RouteTarget::Control(t) => assert_eq!(t.raw(), "Index.multiPost"),
        RouteTarget::Redirect { .. } => panic!("expected a control target"),
    }

    let m = table.lookup(&Method::GET, "/old/page").unwrap();
    match &m.route.target {
        RouteTarget::Redirect { status, location } => {
            assert_eq!(*status, 301);
            assert_eq!(location, "/new/$1");
        }
        RouteTarget::Control(_) => panic!("expected a redirect"),
    }
}

#[test]
fn yaml_with_a_bad_pattern_aborts_the_load() {
    let err = load_routes_str(r#""GET /([": A.b"#).unwrap_err();
    assert!(err.to_string().contains("/(["));
}

#[test]
fn yaml_must_be_a_mapping() {
    assert!(load_routes_str("- just\n- a\n- list\n").is_err());
}

#[test]
fn yaml_empty_method_map_is_rejected() {
    assert!(load_routes_str("\"/multi\": {}\n").is_err());
}

#[test]
fn routes_load_from_a_file() {
    use std::io::Write as _;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "\"/\": Index.index").unwrap();
    writeln!(file, "\"POST /things\": Things.create").unwrap();
    file.flush().unwrap();

    let table = load_routes_file(file.path()).unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.lookup(&Method::POST, "/things").is_some());
}

#[test]
fn missing_file_is_an_error() {
    assert!(load_routes_file("/definitely/not/here.yaml").is_err());
}
