//! Router core: registration, matching and reverse routing.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::pattern::{Pattern, Segment};
use super::radix::RadixRouter;
use crate::error::{BuildError, ConfigurationError};

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Parameter storage for the dispatch path.
///
/// Names are shared with the route tree; values are per-request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Per-route options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// Only match requests for this host
    pub host: Option<String>,
    /// Parameters merged into every match; values captured from the path win
    pub defaults: Vec<(String, String)>,
}

impl RouteOptions {
    /// Restrict the route to `host`
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Add a default parameter value
    #[must_use]
    pub fn default_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.push((name.into(), value.into()));
        self
    }
}

/// A registered route
#[derive(Debug, Clone)]
pub struct RouteEntry {
    /// Compiled pattern
    pub pattern: Pattern,
    /// Endpoint the pattern resolves to
    pub endpoint: Arc<str>,
    /// Options given at registration
    pub options: RouteOptions,
}

/// Named parameters extracted for one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(ParamVec);

impl Params {
    /// Get a parameter by name
    ///
    /// Uses "last write wins" semantics should a name appear twice.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a parameter and parse it
    ///
    /// Fails if the parameter is missing or does not parse as `T`.
    pub fn parse<T>(&self, name: &str) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let raw = self
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("missing parameter '{name}'"))?;
        Ok(raw.parse::<T>()?)
    }

    /// Whether a parameter is present
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate over `(name, value)` pairs in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert to a HashMap
    /// Note: This allocates - use get() in hot paths instead
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        self.0
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

impl From<ParamVec> for Params {
    fn from(v: ParamVec) -> Self {
        Params(v)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Params(
            iter.into_iter()
                .map(|(k, v)| (Arc::from(k.as_ref()), v.into()))
                .collect(),
        )
    }
}

/// Result of successfully matching a request to a route
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route
    pub route: Arc<RouteEntry>,
    /// Endpoint name of the matched route
    pub endpoint: Arc<str>,
    /// Parameters captured from the path plus route defaults
    pub params: Params,
}

/// Maps `(host, path)` pairs to endpoint names
///
/// Patterns are compiled into a radix tree at registration time; the router
/// is read-only once serving starts.
#[derive(Clone, Default)]
pub struct Router {
    radix_router: RadixRouter,
    /// Every route in registration order, for reverse routing and listings
    routes: Vec<Arc<RouteEntry>>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `pattern` and bind it to `endpoint`
    pub fn register(
        &mut self,
        pattern: &str,
        endpoint: &str,
        options: RouteOptions,
    ) -> Result<(), ConfigurationError> {
        let route = Arc::new(RouteEntry {
            pattern: Pattern::parse(pattern)?,
            endpoint: Arc::from(endpoint),
            options,
        });

        debug!(
            pattern = %pattern,
            endpoint = %endpoint,
            host = ?route.options.host,
            "Route compiled"
        );

        self.radix_router.insert(Arc::clone(&route));
        self.routes.push(route);
        Ok(())
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered routes in registration order
    pub fn routes(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routes.iter().map(|r| &**r)
    }

    /// Log the routing table
    pub fn log_routes(&self) {
        let routes_summary: Vec<String> = self
            .routes
            .iter()
            .take(10)
            .map(|r| format!("{} -> {}", r.pattern.as_str(), r.endpoint))
            .collect();

        info!(
            routes_count = self.routes.len(),
            routes_summary = ?routes_summary,
            routing_algorithm = "radix_tree",
            "Routing table loaded"
        );
    }

    /// Match a request to a route
    ///
    /// # Returns
    ///
    /// * `Some(RouteMatch)` - The endpoint and its parameters
    /// * `None` - No route matches (the caller answers "Not Found")
    #[must_use]
    pub fn route(&self, host: &str, path: &str) -> Option<RouteMatch> {
        debug!(host = %host, path = %path, "Route match attempt");

        let match_start = Instant::now();
        let result = self.radix_router.route(host, path);
        let match_duration = match_start.elapsed();

        let Some((route, mut params)) = result else {
            warn!(
                host = %host,
                path = %path,
                duration_us = match_duration.as_micros(),
                "No route matched"
            );
            return None;
        };

        for (name, value) in &route.options.defaults {
            if !params.iter().any(|(k, _)| k.as_ref() == name.as_str()) {
                params.push((Arc::from(name.as_str()), value.clone()));
            }
        }

        if match_duration > Duration::from_millis(1) {
            warn!(
                path = %path,
                endpoint = %route.endpoint,
                route_pattern = %route.pattern.as_str(),
                duration_us = match_duration.as_micros(),
                "Slow route matching detected"
            );
        } else {
            info!(
                path = %path,
                endpoint = %route.endpoint,
                route_pattern = %route.pattern.as_str(),
                path_params = ?params,
                duration_us = match_duration.as_micros(),
                "Route matched"
            );
        }

        Some(RouteMatch {
            endpoint: Arc::clone(&route.endpoint),
            route,
            params: Params(params),
        })
    }

    /// Build a path for `endpoint` from parameter values
    ///
    /// Picks the first route registered for the endpoint whose placeholders
    /// can all be filled. A route is skipped when one of its defaults names a
    /// value the pattern does not capture and `values` disagrees with it.
    /// Values the pattern does not use (and that are not just the route's own
    /// defaults) are appended as a query string, which [`Router::route`]
    /// ignores.
    pub fn build(&self, endpoint: &str, values: &[(&str, &str)]) -> Result<String, BuildError> {
        let mut candidates = self
            .routes
            .iter()
            .filter(|r| r.endpoint.as_ref() == endpoint)
            .peekable();

        if candidates.peek().is_none() {
            return Err(BuildError::UnknownEndpoint {
                endpoint: endpoint.to_string(),
            });
        }

        'routes: for route in candidates {
            // a default for a name the pattern does not capture pins the value
            let conflicts = route.options.defaults.iter().any(|(dk, dv)| {
                !route.pattern.param_names().any(|n| n == dk.as_str())
                    && values
                        .iter()
                        .rev()
                        .find(|(k, _)| *k == dk.as_str())
                        .is_some_and(|(_, v)| *v != dv.as_str())
            });
            if conflicts {
                continue;
            }

            let mut path = String::new();
            let mut used: Vec<&str> = Vec::new();

            for segment in route.pattern.segments() {
                path.push('/');
                match segment {
                    Segment::Static(text) => path.push_str(text),
                    Segment::Param { name, converter } => {
                        let value = values.iter().rev().find(|(k, _)| *k == name.as_ref());
                        match value {
                            Some((_, v)) if converter.accepts(v) => {
                                path.push_str(&converter.encode(v));
                                used.push(name.as_ref());
                            }
                            _ => continue 'routes,
                        }
                    }
                }
            }
            if path.is_empty() {
                path.push('/');
            }

            let query: Vec<String> = values
                .iter()
                .filter(|(k, _)| !used.contains(k))
                .filter(|(k, v)| {
                    !route
                        .options
                        .defaults
                        .iter()
                        .any(|(dk, dv)| dk.as_str() == *k && dv.as_str() == *v)
                })
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            if !query.is_empty() {
                path.push('?');
                path.push_str(&query.join("&"));
            }
            return Ok(path);
        }

        Err(BuildError::MissingValues {
            endpoint: endpoint.to_string(),
        })
    }
}
