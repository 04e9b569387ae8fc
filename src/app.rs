//! # Application
//!
//! [`Application`] is the composition root: it owns the [`Config`], the
//! [`Router`], the [`RouteTable`] mapping endpoints to [`Handler`]s, and the
//! optional template engine. Routes are registered during setup; once
//! [`Application::bind`] has produced a [`Dispatcher`] the application is
//! only read.
//!
//! ## Registration
//!
//! ```rust
//! use rhyton::{Application, Config, Handler, Params, RequestContext};
//!
//! fn hello(_ctx: &mut RequestContext<'_>, params: &Params) -> anyhow::Result<String> {
//!     Ok(format!("hi {}", params.get("name").unwrap_or("stranger")))
//! }
//!
//! let mut app = Application::new(Config::new("example.com").unwrap());
//! // endpoint "hello", taken from the function name
//! app.route("/hello/<name>", Handler::new(hello)).unwrap();
//! // the same handler may back several routes
//! app.route("/hello", Handler::new(hello)).unwrap();
//!
//! let dispatcher = app.bind().unwrap();
//! let response = dispatcher.respond("example.com", "/hello/world", Vec::new()).unwrap();
//! assert_eq!(response.body(), b"hi world");
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::context::RequestContext;
use crate::dispatcher::Dispatcher;
use crate::error::ConfigurationError;
use crate::response::Reply;
use crate::router::{Params, RouteOptions, Router};
use crate::templates::{JinjaTemplates, TemplateEngine};

type HandlerFn =
    dyn for<'c, 'a> Fn(&'c mut RequestContext<'a>, &'c Params) -> anyhow::Result<Reply> + Send + Sync;

/// A request handler
///
/// Wraps any function taking the request context and the matched parameters
/// and returning something convertible into a [`Reply`]. Cloning is cheap and
/// clones are the same handler.
#[derive(Clone)]
pub struct Handler {
    func: Arc<HandlerFn>,
    name: Option<Arc<str>>,
    type_id: TypeId,
    zero_sized: bool,
}

impl Handler {
    /// Wrap `f`
    ///
    /// For `fn` items the handler's name is the function's name; closures
    /// have no name (see [`Handler::named`]).
    ///
    /// The name is read from [`std::any::type_name`], whose output may change
    /// between compiler versions. Endpoints that are reverse-routed (for
    /// example with [`RequestContext::redirect`]) should use
    /// [`Handler::named`] or an explicit endpoint.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(&mut RequestContext<'_>, &Params) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        let name = declared_name::<F>().map(Arc::from);
        Self::build(f, name)
    }

    /// Wrap `f` under an explicit name
    pub fn named<F, R>(name: &str, f: F) -> Self
    where
        F: Fn(&mut RequestContext<'_>, &Params) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        Self::build(f, Some(Arc::from(name)))
    }

    fn build<F, R>(f: F, name: Option<Arc<str>>) -> Self
    where
        F: Fn(&mut RequestContext<'_>, &Params) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        let func = erase(move |ctx, params| f(ctx, params).map(Into::into));
        Self {
            func,
            name,
            type_id: TypeId::of::<F>(),
            zero_sized: std::mem::size_of::<F>() == 0,
        }
    }

    /// The handler's declared name, used as the default endpoint
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether `self` and `other` are the same handler
    ///
    /// True for clones of one handler, and for two handlers wrapping the same
    /// `fn` item or non-capturing closure.
    pub fn same_as(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
            || (self.zero_sized && other.zero_sized && self.type_id == other.type_id)
    }

    /// Invoke the handler
    pub fn call(&self, ctx: &mut RequestContext<'_>, params: &Params) -> anyhow::Result<Reply> {
        (self.func)(ctx, params)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn erase<F>(f: F) -> Arc<HandlerFn>
where
    F: for<'c, 'a> Fn(&'c mut RequestContext<'a>, &'c Params) -> anyhow::Result<Reply>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Last path segment of `F`'s type name, unless `F` is a closure
fn declared_name<F>() -> Option<&'static str> {
    let full = std::any::type_name::<F>();
    let last = full.rsplit("::").next()?;
    if last.is_empty() || last.contains(['{', '<', '>', ' ']) {
        return None;
    }
    Some(last)
}

/// Endpoint name to handler
///
/// Entries are never replaced or removed.
#[derive(Clone, Default)]
pub struct RouteTable {
    handlers: HashMap<Arc<str>, Handler>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `handler` may be bound to `endpoint`
    ///
    /// Returns `Ok(true)` if the endpoint is already bound to this handler.
    fn check(&self, endpoint: &str, handler: &Handler) -> Result<bool, ConfigurationError> {
        match self.handlers.get(endpoint) {
            None => Ok(false),
            Some(existing) if existing.same_as(handler) => Ok(true),
            Some(_) => Err(ConfigurationError::EndpointCollision {
                endpoint: endpoint.to_string(),
            }),
        }
    }

    /// Bind `handler` to `endpoint`
    ///
    /// Binding the same handler again is a no-op; a different one is an
    /// [`ConfigurationError::EndpointCollision`].
    pub fn insert(&mut self, endpoint: &str, handler: Handler) -> Result<(), ConfigurationError> {
        if !self.check(endpoint, &handler)? {
            self.handlers.insert(Arc::from(endpoint), handler);
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, endpoint: &str) -> Option<&Handler> {
        self.handlers.get(endpoint)
    }

    #[must_use]
    pub fn contains(&self, endpoint: &str) -> bool {
        self.handlers.contains_key(endpoint)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Bound endpoint names, in no particular order
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(|k| &**k)
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.endpoints()).finish()
    }
}

/// A Spartan/Gemini application: configuration, routes and handlers
pub struct Application {
    config: Config,
    router: Router,
    route_table: RouteTable,
    templates: Option<Arc<dyn TemplateEngine>>,
}

impl Application {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            router: Router::new(),
            route_table: RouteTable::new(),
            templates: None,
        }
    }

    /// Application for `host` with default configuration
    pub fn for_host(host: impl Into<String>) -> Result<Self, ConfigurationError> {
        Ok(Self::new(Config::new(host)?))
    }

    /// Use `engine` for [`RequestContext::render_template`]
    #[must_use]
    pub fn with_template_engine(mut self, engine: impl TemplateEngine + 'static) -> Self {
        self.templates = Some(Arc::new(engine));
        self
    }

    /// Use a [`JinjaTemplates`] engine built from the configuration
    #[must_use]
    pub fn with_default_templates(self) -> Self {
        let engine = JinjaTemplates::from_config(&self.config);
        self.with_template_engine(engine)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn route_table(&self) -> &RouteTable {
        &self.route_table
    }

    pub fn template_engine(&self) -> Option<&dyn TemplateEngine> {
        self.templates.as_deref()
    }

    /// Register `pattern`
    ///
    /// `endpoint` defaults to the handler's name. Without a handler the route
    /// is only declared; bind one later with [`Application::endpoint`].
    pub fn register(
        &mut self,
        pattern: &str,
        handler: Option<Handler>,
        endpoint: Option<&str>,
        options: RouteOptions,
    ) -> Result<(), ConfigurationError> {
        let endpoint = match (endpoint, handler.as_ref().and_then(Handler::name)) {
            (Some(endpoint), _) | (None, Some(endpoint)) => endpoint.to_string(),
            (None, None) => {
                return Err(ConfigurationError::MissingEndpoint {
                    pattern: pattern.to_string(),
                })
            }
        };

        // Reject a collision before the pattern reaches the router
        if let Some(handler) = &handler {
            self.route_table.check(&endpoint, handler)?;
        }
        self.router.register(pattern, &endpoint, options)?;
        if let Some(handler) = handler {
            self.route_table.insert(&endpoint, handler)?;
        }

        info!(
            pattern = %pattern,
            endpoint = %endpoint,
            bound = self.route_table.contains(&endpoint),
            "Route registered"
        );
        Ok(())
    }

    /// Register `handler` for `pattern` under its own name
    ///
    /// Hands the handler back so it can be registered again.
    pub fn route(&mut self, pattern: &str, handler: Handler) -> Result<Handler, ConfigurationError> {
        self.route_with(pattern, RouteOptions::default(), handler)
    }

    /// [`Application::route`] with route options
    pub fn route_with(
        &mut self,
        pattern: &str,
        options: RouteOptions,
        handler: Handler,
    ) -> Result<Handler, ConfigurationError> {
        self.register(pattern, Some(handler.clone()), None, options)?;
        Ok(handler)
    }

    /// Bind `handler` to an endpoint declared by handler-less routes
    pub fn endpoint(&mut self, name: &str, handler: Handler) -> Result<(), ConfigurationError> {
        self.route_table.insert(name, handler)?;
        info!(endpoint = %name, "Endpoint bound");
        Ok(())
    }

    /// Produce the dispatcher serving this application
    ///
    /// Fails if any route points at an endpoint without a handler.
    pub fn bind(&self) -> Result<Dispatcher<'_>, ConfigurationError> {
        if let Some(route) = self
            .router
            .routes()
            .find(|r| !self.route_table.contains(&r.endpoint))
        {
            return Err(ConfigurationError::UnboundEndpoint {
                endpoint: route.endpoint.to_string(),
            });
        }

        self.router.log_routes();
        info!(
            host = %self.config.host,
            endpoints = self.route_table.len(),
            templates = self.templates.is_some(),
            "Application bound"
        );
        Ok(Dispatcher::new(self))
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("config", &self.config)
            .field("routes", &self.router.len())
            .field("route_table", &self.route_table)
            .field("templates", &self.templates.is_some())
            .finish()
    }
}
