use rhyton::router::{Converter, Pattern, RouteOptions, Router};
use rhyton::{BuildError, ConfigurationError};

fn zoo() -> Router {
    let mut router = Router::new();
    for (pattern, endpoint) in [
        ("/", "root"),
        ("/zoo/animals", "get_animals"),
        ("/zoo/animals/<int:id>", "get_animal"),
        ("/zoo/animals/<int:id>/toys/<toy_id>", "animal_toy"),
        ("/zoo/<category>/animals/<int:id>/habitats/<habitat_id>", "habitat"),
        ("/zoo/health", "health_check"),
        ("/files/<path:rest>", "files"),
    ] {
        router
            .register(pattern, endpoint, RouteOptions::default())
            .unwrap();
    }
    router
}

#[test]
fn test_route_matching() {
    let router = zoo();
    let cases = [
        ("/", "root"),
        ("/zoo/animals", "get_animals"),
        ("/zoo/animals/", "get_animals"),
        ("/zoo/animals/12", "get_animal"),
        ("/zoo/animals/12/toys/ball", "animal_toy"),
        ("/zoo/cats/animals/3/habitats/north", "habitat"),
        ("/zoo/health", "health_check"),
        ("/files/a/b/c", "files"),
    ];
    for (path, endpoint) in cases {
        let m = router
            .route("zoo.example", path)
            .unwrap_or_else(|| panic!("{path} did not match"));
        assert_eq!(&*m.endpoint, endpoint, "{path}");
    }
}

#[test]
fn test_exact_parameter_values() {
    let m = zoo()
        .route("zoo.example", "/zoo/cats/animals/3/habitats/north")
        .unwrap();
    let params: Vec<(&str, &str)> = m.params.iter().collect();
    assert_eq!(
        params,
        vec![("category", "cats"), ("id", "3"), ("habitat_id", "north")]
    );
    assert_eq!(m.params.parse::<u64>("id").unwrap(), 3);
}

#[test]
fn test_unmatched_paths() {
    let router = zoo();
    for path in ["/nope", "/zoo", "/zoo/animals/x", "/zoo/animals/1/toys", "/files"] {
        assert!(router.route("zoo.example", path).is_none(), "{path}");
    }
}

#[test]
fn test_static_segment_beats_placeholder() {
    let mut router = Router::new();
    router
        .register("/zoo/<category>", "category", RouteOptions::default())
        .unwrap();
    router
        .register("/zoo/health", "health", RouteOptions::default())
        .unwrap();
    assert_eq!(&*router.route("h", "/zoo/health").unwrap().endpoint, "health");
    assert_eq!(&*router.route("h", "/zoo/cats").unwrap().endpoint, "category");
}

#[test]
fn test_backtracks_across_placeholders() {
    let mut router = Router::new();
    router
        .register("/a/<int:id>/x", "int_x", RouteOptions::default())
        .unwrap();
    router
        .register("/a/<name>/y", "name_y", RouteOptions::default())
        .unwrap();
    let m = router.route("h", "/a/5/y").unwrap();
    assert_eq!(&*m.endpoint, "name_y");
    assert_eq!(m.params.get("name"), Some("5"));
    assert!(!m.params.contains("id"));
}

#[test]
fn test_percent_decoding() {
    let mut router = Router::new();
    router
        .register("/hello/<name>", "hello", RouteOptions::default())
        .unwrap();
    let m = router.route("h", "/hello/caf%C3%A9").unwrap();
    assert_eq!(m.params.get("name"), Some("café"));
}

#[test]
fn test_host_option() {
    let mut router = Router::new();
    router
        .register("/", "only_b", RouteOptions::default().host("b.example"))
        .unwrap();
    assert!(router.route("a.example", "/").is_none());
    assert_eq!(&*router.route("b.example", "/").unwrap().endpoint, "only_b");
}

#[test]
fn test_invalid_patterns() {
    let mut router = Router::new();
    let err = router
        .register("/a/<bogus:x>", "x", RouteOptions::default())
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::InvalidPattern { .. }));
    assert!(router.is_empty());
}

#[test]
fn test_pattern_introspection() {
    let pattern = Pattern::parse("/files/<int:year>/<path:rest>").unwrap();
    assert_eq!(pattern.as_str(), "/files/<int:year>/<path:rest>");
    assert_eq!(pattern.param_names().collect::<Vec<_>>(), vec!["year", "rest"]);
    assert!(Converter::Int < Converter::String);
    assert!(Converter::String < Converter::Path);
}

#[test]
fn test_reverse_routing() {
    let router = zoo();
    assert_eq!(
        router
            .build("animal_toy", &[("id", "1"), ("toy_id", "rope ball")])
            .unwrap(),
        "/zoo/animals/1/toys/rope%20ball"
    );
    assert_eq!(
        router.build("files", &[("rest", "docs/a b.gmi")]).unwrap(),
        "/files/docs/a%20b.gmi"
    );
    assert_eq!(
        router.build("ghost", &[]),
        Err(BuildError::UnknownEndpoint {
            endpoint: "ghost".to_string()
        })
    );
}

#[test]
fn test_routes_listing_in_registration_order() {
    let router = zoo();
    let endpoints: Vec<&str> = router.routes().map(|r| &*r.endpoint).collect();
    assert_eq!(endpoints.first(), Some(&"root"));
    assert_eq!(endpoints.last(), Some(&"files"));
    assert_eq!(router.len(), 7);
}
