//! Radix tree of path segments.
//!
//! Each node is one segment. Static children are tried before placeholder
//! children; placeholder children are kept sorted by [`Converter`] priority so
//! `<int:id>` wins over `<name>` which wins over `<path:rest>`. Lookup is
//! O(k) in the number of request segments, independent of the route count,
//! apart from backtracking across competing placeholders.

use std::borrow::Cow;
use std::sync::Arc;

use super::core::{ParamVec, RouteEntry};
use super::pattern::{Converter, Segment};

#[derive(Clone)]
struct RadixNode {
    /// Literal text for static nodes, empty for placeholder nodes
    segment: Cow<'static, str>,
    /// Routes terminating here, in registration order
    routes: Vec<Arc<RouteEntry>>,
    /// Placeholder name and converter for placeholder nodes
    param: Option<(Arc<str>, Converter)>,
    children: Vec<RadixNode>,
    param_children: Vec<RadixNode>,
}

impl RadixNode {
    fn new(segment: Cow<'static, str>) -> Self {
        Self {
            segment,
            routes: Vec::new(),
            param: None,
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    fn new_param(name: Arc<str>, converter: Converter) -> Self {
        Self {
            param: Some((name, converter)),
            ..Self::new(Cow::Borrowed(""))
        }
    }

    fn insert(&mut self, segments: &[Segment], route: Arc<RouteEntry>) {
        let Some((segment, remaining)) = segments.split_first() else {
            self.routes.push(route);
            return;
        };

        match segment {
            Segment::Param { name, converter } => {
                // Reuse a placeholder child with the same name and converter
                for child in &mut self.param_children {
                    if let Some((existing, conv)) = &child.param {
                        if existing == name && conv == converter {
                            child.insert(remaining, route);
                            return;
                        }
                    }
                }
                let mut child = RadixNode::new_param(Arc::clone(name), *converter);
                child.insert(remaining, route);
                self.param_children.push(child);
                // stable: equal converters keep registration order
                self.param_children
                    .sort_by_key(|c| c.param.as_ref().map(|(_, conv)| *conv));
            }
            Segment::Static(text) => {
                for child in &mut self.children {
                    if child.segment == text.as_str() {
                        child.insert(remaining, route);
                        return;
                    }
                }
                let mut child = RadixNode::new(Cow::Owned(text.clone()));
                child.insert(remaining, route);
                self.children.push(child);
            }
        }
    }

    /// First route stored at this node that accepts `host`
    fn terminal(&self, host: &str) -> Option<Arc<RouteEntry>> {
        self.routes
            .iter()
            .find(|r| r.options.host.as_deref().map_or(true, |h| h == host))
            .cloned()
    }

    fn search(
        &self,
        segments: &[Cow<'_, str>],
        host: &str,
        params: &mut ParamVec,
    ) -> Option<Arc<RouteEntry>> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.terminal(host);
        };

        for child in &self.children {
            if child.segment == &**segment {
                if let Some(route) = child.search(remaining, host, params) {
                    return Some(route);
                }
            }
        }

        for child in &self.param_children {
            let Some((name, converter)) = &child.param else {
                continue;
            };
            if *converter == Converter::Path {
                // consumes everything that is left
                if let Some(route) = child.terminal(host) {
                    let value = segments.iter().map(|s| &**s).collect::<Vec<&str>>().join("/");
                    params.push((Arc::clone(name), value));
                    return Some(route);
                }
                continue;
            }
            if !converter.accepts(segment) {
                continue;
            }
            params.push((Arc::clone(name), segment.to_string()));
            if let Some(route) = child.search(remaining, host, params) {
                return Some(route);
            }
            // Backtrack: this branch did not lead to a route
            params.pop();
        }

        None
    }
}

/// Radix tree router keyed by path segments
#[derive(Clone)]
pub(crate) struct RadixRouter {
    root: RadixNode,
}

impl Default for RadixRouter {
    fn default() -> Self {
        Self {
            root: RadixNode::new(Cow::Borrowed("")),
        }
    }
}

impl RadixRouter {
    pub(crate) fn insert(&mut self, route: Arc<RouteEntry>) {
        let segments = route.pattern.segments().to_vec();
        self.root.insert(&segments, route);
    }

    /// Find the route for `path` and the placeholder values it captured
    ///
    /// Anything from the first `?` is a query and is not matched. Segments
    /// are percent-decoded before matching; segments that do not decode to
    /// UTF-8 are matched as sent.
    pub(crate) fn route(&self, host: &str, path: &str) -> Option<(Arc<RouteEntry>, ParamVec)> {
        let path = path.split_once('?').map_or(path, |(p, _)| p);
        let segments: Vec<Cow<'_, str>> = path
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::decode(s).unwrap_or(Cow::Borrowed(s)))
            .collect();

        let mut params = ParamVec::new();
        let route = self.root.search(&segments, host, &mut params)?;
        Some((route, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::core::RouteOptions;
    use crate::router::pattern::Pattern;

    fn entry(pattern: &str, endpoint: &str) -> Arc<RouteEntry> {
        entry_with(pattern, endpoint, RouteOptions::default())
    }

    fn entry_with(pattern: &str, endpoint: &str, options: RouteOptions) -> Arc<RouteEntry> {
        Arc::new(RouteEntry {
            pattern: Pattern::parse(pattern).unwrap(),
            endpoint: Arc::from(endpoint),
            options,
        })
    }

    fn router(routes: &[(&str, &str)]) -> RadixRouter {
        let mut r = RadixRouter::default();
        for (pattern, endpoint) in routes {
            r.insert(entry(pattern, endpoint));
        }
        r
    }

    fn param<'a>(params: &'a ParamVec, name: &str) -> Option<&'a str> {
        params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_radix_router_simple_route() {
        let r = router(&[("/health", "health_check")]);
        let (route, params) = r.route("h", "/health").unwrap();
        assert_eq!(&*route.endpoint, "health_check");
        assert!(params.is_empty());
    }

    #[test]
    fn test_radix_router_with_parameter() {
        let r = router(&[("/users/<id>", "get_user")]);
        let (route, params) = r.route("h", "/users/123").unwrap();
        assert_eq!(&*route.endpoint, "get_user");
        assert_eq!(param(&params, "id"), Some("123"));
    }

    #[test]
    fn test_radix_router_different_param_names_same_position() {
        let r = router(&[
            ("/users/<user_id>/posts", "get_user_posts"),
            ("/users/<id>/comments", "get_user_comments"),
        ]);

        let (route, params) = r.route("h", "/users/123/posts").unwrap();
        assert_eq!(&*route.endpoint, "get_user_posts");
        assert_eq!(param(&params, "user_id"), Some("123"));
        assert!(param(&params, "id").is_none());

        let (route, params) = r.route("h", "/users/456/comments").unwrap();
        assert_eq!(&*route.endpoint, "get_user_comments");
        assert_eq!(param(&params, "id"), Some("456"));
        assert!(param(&params, "user_id").is_none());
    }

    #[test]
    fn test_static_beats_placeholder() {
        let r = router(&[("/users/<id>", "get_user"), ("/users/me", "me")]);
        assert_eq!(&*r.route("h", "/users/me").unwrap().0.endpoint, "me");
        assert_eq!(&*r.route("h", "/users/you").unwrap().0.endpoint, "get_user");
    }

    #[test]
    fn test_int_is_tried_before_string() {
        let r = router(&[("/p/<slug>", "by_slug"), ("/p/<int:id>", "by_id")]);
        assert_eq!(&*r.route("h", "/p/42").unwrap().0.endpoint, "by_id");
        assert_eq!(&*r.route("h", "/p/abc").unwrap().0.endpoint, "by_slug");
    }

    #[test]
    fn test_path_consumes_remaining_segments() {
        let r = router(&[("/files/<path:rest>", "files")]);
        let (route, params) = r.route("h", "/files/a/b/c.txt").unwrap();
        assert_eq!(&*route.endpoint, "files");
        assert_eq!(param(&params, "rest"), Some("a/b/c.txt"));
        assert!(r.route("h", "/files").is_none());
    }

    #[test]
    fn test_values_are_percent_decoded() {
        let r = router(&[("/hello/<name>", "hello")]);
        let (_, params) = r.route("h", "/hello/big%20world").unwrap();
        assert_eq!(param(&params, "name"), Some("big world"));
    }

    #[test]
    fn test_host_restricted_route() {
        let mut r = RadixRouter::default();
        r.insert(entry_with(
            "/",
            "capsule_index",
            RouteOptions::default().host("capsule.example"),
        ));
        r.insert(entry("/", "index"));
        assert_eq!(&*r.route("capsule.example", "/").unwrap().0.endpoint, "capsule_index");
        assert_eq!(&*r.route("other.example", "/").unwrap().0.endpoint, "index");
    }

    #[test]
    fn test_no_match() {
        let r = router(&[("/users/<int:id>", "get_user")]);
        assert!(r.route("h", "/posts/123").is_none());
        assert!(r.route("h", "/users/abc").is_none());
        assert!(r.route("h", "/users/1/extra").is_none());
    }
}
