use http::Method;
use ionrouter::dispatcher::{HandlerRequest, HandlerResponse};
use ionrouter::router::{PathPattern, Router};
use ionrouter::RouterError;

fn echo_pattern(req: &mut HandlerRequest) -> HandlerResponse {
    let pattern = req.route_pattern.as_deref().unwrap_or("").to_string();
    HandlerResponse::text(200, pattern)
}

fn echo_params(req: &mut HandlerRequest) -> HandlerResponse {
    let mut pairs: Vec<String> = req
        .path_params()
        .map(|params| params.iter().map(|(k, v)| format!("{k}={v}")).collect())
        .unwrap_or_default();
    pairs.sort();
    HandlerResponse::text(200, pairs.join("&"))
}

fn assert_route_match(router: &Router, method: Method, path: &str, expected_pattern: &str) {
    match router.match_route(&method, path) {
        Some(found) => assert_eq!(
            found.route.pattern().as_str(),
            expected_pattern,
            "{method} {path} matched the wrong route"
        ),
        None => panic!("{method} {path} should match {expected_pattern}"),
    }
}

#[test]
fn test_hello_scenario() {
    let mut router = Router::new();
    router
        .get("/hello/:name/:number/world", echo_params, Some("hello"))
        .unwrap();

    let found = router
        .match_route(&Method::GET, "/hello/test/001/world")
        .unwrap();
    assert_eq!(found.path_params.len(), 2);
    assert_eq!(found.get_path_param("name"), Some("test"));
    assert_eq!(found.get_path_param("number"), Some("001"));

    let res = router.handle(Method::GET, "/hello/test/001/world");
    assert_eq!(res.status, 200);
    assert_eq!(res.body_text(), Some("name=test&number=001"));

    assert_eq!(
        router.reverse_route("hello", &["name", "test", "number", "001"]),
        "/hello/test/001/world"
    );
}

#[test]
fn test_literal_and_variable_scenario() {
    let mut router = Router::new();
    router.get("/abc", echo_pattern, None).unwrap();
    router.get("/abcd", echo_pattern, None).unwrap();
    router.get("/:name", echo_pattern, None).unwrap();
    router.get("/:name/xyz", echo_pattern, None).unwrap();

    assert_route_match(&router, Method::GET, "/abc", "/abc");
    assert_route_match(&router, Method::GET, "/abcd", "/abcd");
    assert_route_match(&router, Method::GET, "/hello", "/:name");
    assert_route_match(&router, Method::GET, "/hello/xyz", "/:name/xyz");

    for path in ["/hello/asdf", "/abc/asdf"] {
        assert!(router.match_route(&Method::GET, path).is_none(), "{path}");
        let res = router.handle(Method::GET, path);
        assert_eq!(res.status, 404, "{path}");
    }
}

#[test]
fn test_first_registered_wins() {
    let mut router = Router::new();
    router.get("/:name", echo_pattern, None).unwrap();
    router.get("/abc", echo_pattern, None).unwrap();
    // the literal route is shadowed by the earlier variable route
    assert_route_match(&router, Method::GET, "/abc", "/:name");
}

#[test]
fn test_trailing_slash_normalization() {
    let mut router = Router::new();
    router.get("/users/:id/", echo_params, None).unwrap();

    assert_route_match(&router, Method::GET, "/users/7", "/users/:id/");
    assert_route_match(&router, Method::GET, "/users/7/", "/users/:id/");
    // only one slash is dropped; the empty segment left behind has no route
    assert!(router.match_route(&Method::GET, "/users/7//").is_none());
    assert!(router.match_route(&Method::GET, "/users/").is_none());
}

#[test]
fn test_variables_bind_only_non_empty_segments() {
    let mut router = Router::new();
    router.get("/a/:x/b", echo_params, None).unwrap();
    assert!(router.match_route(&Method::GET, "/a//b").is_none());
    assert!(router.match_route(&Method::GET, "/a/b").is_none());
    assert_route_match(&router, Method::GET, "/a/1/b", "/a/:x/b");
}

#[test]
fn test_k_variables_give_k_bindings() {
    let patterns = [
        ("/:a", "/1", 1),
        ("/x/:a/:b", "/x/1/2", 2),
        ("/:a/:b/:c/y", "/1/2/3/y", 3),
        ("/:a/:b/:c/:d/:e/:f/:g/:h/:i", "/1/2/3/4/5/6/7/8/9", 9),
    ];
    for (pattern, path, k) in patterns {
        let mut router = Router::new();
        router.get(pattern, echo_params, None).unwrap();
        let found = router.match_route(&Method::GET, path).unwrap();
        assert_eq!(found.path_params.len(), k, "{pattern}");
    }
}

#[test]
fn test_reverse_then_match_round_trip() {
    let mut router = Router::new();
    router
        .get("/files/:owner/:name", echo_params, Some("file"))
        .unwrap();

    let cases = [
        ("ana", "report.pdf"),
        ("bo b", "a/b"),
        ("ünï", "100%"),
    ];
    for (owner, name) in cases {
        let path = router.reverse_route("file", &["owner", owner, "name", name]);
        assert!(!path.is_empty());
        let found = router.match_route(&Method::GET, &path).unwrap();
        assert_eq!(found.get_path_param("owner"), Some(owner), "{path}");
        assert_eq!(found.get_path_param("name"), Some(name), "{path}");
    }
}

#[test]
fn test_reverse_failures_return_empty() {
    let mut router = Router::new();
    router.get("/users/:id", echo_params, Some("user")).unwrap();
    router.get("/", echo_params, Some("root")).unwrap();

    assert_eq!(router.reverse_route("nope", &["id", "1"]), "");
    assert_eq!(router.reverse_route("user", &["id"]), "");
    assert_eq!(router.reverse_route("user", &[]), "");
    assert_eq!(router.reverse_route("user", &["other", "1"]), "");
    assert_eq!(router.reverse_route("user", &["id", "1", "extra", "x"]), "/users/1");
    assert_eq!(router.reverse_route("user", &["id", "1", "id", "2"]), "/users/1");
    assert_eq!(router.reverse_route("user", &["id", ""]), "");
    assert_eq!(router.reverse_route("root", &[]), "/");
}

#[test]
fn test_registration_errors() {
    let mut router = Router::new();
    assert!(matches!(
        router.get("no-slash", echo_params, None),
        Err(RouterError::InvalidPattern { .. })
    ));
    assert!(matches!(
        router.get("/a/:", echo_params, None),
        Err(RouterError::InvalidPattern { .. })
    ));
    assert!(matches!(
        router.register(Method::TRACE, "/a", echo_params, None),
        Err(RouterError::UnsupportedMethod { .. })
    ));
    assert_eq!(router.route_count(), 0);
}

#[test]
fn test_every_routable_method() {
    let mut router = Router::new();
    router.get("/r", echo_pattern, None).unwrap();
    router.post("/r", echo_pattern, None).unwrap();
    router.put("/r", echo_pattern, None).unwrap();
    router.patch("/r", echo_pattern, None).unwrap();
    router.delete("/r", echo_pattern, None).unwrap();
    router.options("/r", echo_pattern, None).unwrap();
    assert_eq!(router.route_count(), 6);

    for method in ionrouter::router::ROUTABLE_METHODS {
        assert_eq!(router.handle(method.clone(), "/r").status, 200, "{method}");
    }
    assert_eq!(router.handle(Method::HEAD, "/r").status, 404);
}

#[test]
fn test_query_string_reaches_handler() {
    let mut router = Router::new();
    router
        .get(
            "/search/:scope",
            |req: &mut HandlerRequest| {
                HandlerResponse::text(
                    200,
                    format!(
                        "{}:{}",
                        req.path_param("scope").unwrap_or_default(),
                        req.get_query_param("q").unwrap_or("")
                    ),
                )
            },
            None,
        )
        .unwrap();
    let res = router.handle(Method::GET, "/search/docs?q=rust+router");
    assert_eq!(res.body_text(), Some("docs:rust router"));
}

#[test]
fn test_percent_encoded_segments_are_decoded() {
    let mut router = Router::new();
    router.get("/tags/:tag", echo_params, None).unwrap();
    let res = router.handle(Method::GET, "/tags/c%2B%2B");
    assert_eq!(res.body_text(), Some("tag=c++"));
}

#[test]
fn test_pattern_reverse_matches_router() {
    let pattern = PathPattern::parse("/hello/:name/:number/world").unwrap();
    assert_eq!(
        pattern.reverse(&["name", "x", "number", "1"]).as_deref(),
        Some("/hello/x/1/world")
    );
}
