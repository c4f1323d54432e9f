use super::*;
use crate::config::{DuplicateNamePolicy, RouterConfig};
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::RouterError;
use http::Method;
use std::sync::Arc;

fn ok(_req: &mut HandlerRequest) -> HandlerResponse {
    HandlerResponse::text(200, "ok")
}

fn echo_route(req: &mut HandlerRequest) -> HandlerResponse {
    HandlerResponse::text(200, req.route_pattern.as_deref().unwrap_or("-").to_string())
}

#[test]
fn test_root_path() {
    let mut router = Router::new();
    router.get("/", ok, None).unwrap();
    let m = router.match_route(&Method::GET, "/").unwrap();
    assert!(m.path_params.is_empty());
    assert!(router.match_route(&Method::GET, "/x").is_none());
}

#[test]
fn test_parameterized_path() {
    let mut router = Router::new();
    router.get("/items/:id", ok, None).unwrap();
    let m = router.match_route(&Method::GET, "/items/123").unwrap();
    assert_eq!(m.get_path_param("id"), Some("123"));
    assert_eq!(m.route.pattern().as_str(), "/items/:id");
}

#[test]
fn test_nested_path() {
    let mut router = Router::new();
    router.get("/a/:b/c", ok, None).unwrap();
    let m = router.match_route(&Method::GET, "/a/1/c").unwrap();
    assert_eq!(m.path_params_map().get("b").map(String::as_str), Some("1"));
    assert!(router.match_route(&Method::GET, "/a/1/d").is_none());
}

#[test]
fn test_method_isolation() {
    let mut router = Router::new();
    router.post("/items", ok, None).unwrap();
    assert!(router.match_route(&Method::POST, "/items").is_some());
    assert!(router.match_route(&Method::GET, "/items").is_none());
    assert!(router.match_route(&Method::HEAD, "/items").is_none());
}

#[test]
fn test_unsupported_method_rejected() {
    let mut router = Router::new();
    let err = router.register(Method::HEAD, "/", ok, None).unwrap_err();
    assert_eq!(err, RouterError::UnsupportedMethod { method: Method::HEAD });
    assert_eq!(router.route_count(), 0);
}

#[test]
fn test_query_string_ignored_for_matching() {
    let mut router = Router::new();
    router.get("/search", ok, None).unwrap();
    assert!(router.match_route(&Method::GET, "/search?q=rust").is_some());
}

#[test]
fn test_registration_order_wins() {
    let mut router = Router::new();
    let first = router.get("/:any", echo_route, None).unwrap();
    let second = router.get("/fixed", echo_route, None).unwrap();
    assert_eq!((first.index(), second.index()), (0, 1));

    let m = router.match_route(&Method::GET, "/fixed").unwrap();
    assert_eq!(m.route.pattern().as_str(), "/:any");
    assert_eq!(router.routes(&Method::GET).len(), 2);
}

#[test]
fn test_duplicate_name_rejected_by_default() {
    let mut router = Router::new();
    router.get("/a", ok, Some("home")).unwrap();
    let err = router.get("/b", ok, Some("home")).unwrap_err();
    assert_eq!(
        err,
        RouterError::DuplicateRouteName {
            name: "home".to_string(),
            existing_pattern: "/a".to_string(),
        }
    );
    // the failed registration leaves no trace
    assert_eq!(router.route_count(), 1);
    assert_eq!(router.reverse_route("home", &[]), "/a");
}

#[test]
fn test_duplicate_name_overwrite_policy() {
    let config = RouterConfig {
        duplicate_names: DuplicateNamePolicy::Overwrite,
        ..RouterConfig::default()
    };
    let mut router = Router::with_config(config);
    router.get("/a", ok, Some("home")).unwrap();
    router.get("/b", ok, Some("home")).unwrap();
    assert_eq!(router.route_count(), 2);
    assert_eq!(router.reverse_route("home", &[]), "/b");
    assert_eq!(router.route_by_name("home").unwrap().pattern().as_str(), "/b");
}

#[test]
fn test_dispatch_writes_bindings_to_state() {
    let mut router = Router::new();
    router
        .get(
            "/users/:id",
            |req: &mut HandlerRequest| {
                let params = req.path_params().unwrap_or_default();
                let raw = req
                    .state()
                    .get::<PathParams>("path")
                    .map(|p| p.len())
                    .unwrap_or(0);
                HandlerResponse::text(200, format!("{}:{raw}", params.get("id").unwrap_or("")))
            },
            None,
        )
        .unwrap();
    let res = router.handle(Method::GET, "/users/42");
    assert_eq!(res.body_text(), Some("42:1"));
}

#[test]
fn test_custom_path_params_key() {
    let config = RouterConfig {
        path_params_key: "route.vars".to_string(),
        ..RouterConfig::default()
    };
    let mut router = Router::with_config(config);
    router
        .get(
            "/:slug",
            |req: &mut HandlerRequest| {
                let under_custom = req.state().get::<PathParams>("route.vars").is_some();
                let under_default = req.state().get::<PathParams>("path").is_some();
                HandlerResponse::text(
                    200,
                    format!(
                        "{}/{under_custom}/{under_default}",
                        req.path_param("slug").unwrap_or_default()
                    ),
                )
            },
            None,
        )
        .unwrap();
    let res = router.handle(Method::GET, "/post-1");
    assert_eq!(res.body_text(), Some("post-1/true/false"));
}

#[test]
fn test_not_found_is_404_and_skips_chain() {
    let mut router = Router::new();
    router.use_middleware(|_next: crate::dispatcher::BoxedHandler| {
        crate::dispatcher::handler(|_req: &mut HandlerRequest| HandlerResponse::text(418, "mw"))
    });
    let res = router.handle(Method::GET, "/nowhere");
    assert_eq!(res.status, 404);
    assert_eq!(res.body["error"], "Not Found");
    assert_eq!(router.state().live_count(), 0);
}

#[test]
fn test_dispatch_sets_route_metadata() {
    let mut router = Router::new();
    router
        .get(
            "/r/:x",
            |req: &mut HandlerRequest| {
                HandlerResponse::text(
                    200,
                    format!(
                        "{}|{}",
                        req.route_pattern.as_deref().unwrap_or(""),
                        req.route_name.as_deref().unwrap_or("")
                    ),
                )
            },
            Some("rx"),
        )
        .unwrap();
    let res = router.handle(Method::GET, "/r/1");
    assert_eq!(res.body_text(), Some("/r/:x|rx"));
}

#[test]
fn test_shared_state_container() {
    let state = Arc::new(crate::state::StateContainer::new());
    let mut router = Router::with_state(RouterConfig::default(), Arc::clone(&state));
    router
        .get(
            "/",
            |req: &mut HandlerRequest| {
                req.state().set("seen", true);
                HandlerResponse::default()
            },
            None,
        )
        .unwrap();
    router.handle(Method::GET, "/");
    assert!(Arc::ptr_eq(router.state(), &state));
    assert_eq!(state.live_count(), 0);
}
