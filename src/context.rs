//! # Request Context
//!
//! A [`RequestContext`] is created by the dispatcher for every routed request
//! and handed to the handler by `&mut`. It carries what the transport
//! delivered (host, path, payload), a request id for log correlation, and a
//! list of teardown callbacks.
//!
//! ## Teardown
//!
//! Callbacks run in registration order, exactly once:
//!
//! - The dispatcher calls [`RequestContext::teardown`] after the handler
//!   returns, whether it succeeded or failed.
//! - If the context is dropped without having been torn down (a panicking
//!   handler, an abandoned dispatch), `Drop` runs the callbacks instead.
//!
//! ```rust
//! use rhyton::{Application, Config, RequestContext};
//!
//! let app = Application::new(Config::new("example.com").unwrap());
//! let mut ctx = RequestContext::new(&app, "example.com", "/", Vec::new());
//! ctx.register_teardown(|ctx| println!("done with {}", ctx.path()));
//! ctx.teardown();
//! ctx.teardown(); // no-op
//! assert!(ctx.is_torn_down());
//! ```

use serde_json::Value as JsonValue;
use std::fmt;
use tracing::debug;

use crate::app::Application;
use crate::config::Config;
use crate::error::BuildError;
use crate::ids::RequestId;
use crate::response::Response;
use crate::templates::TemplateError;

type TeardownFn<'a> = Box<dyn FnOnce(&RequestContext<'a>) + 'a>;

/// Per-request state handed to handlers
pub struct RequestContext<'a> {
    app: &'a Application,
    request_id: RequestId,
    host: String,
    path: String,
    data: Vec<u8>,
    teardown_funcs: Vec<TeardownFn<'a>>,
    torn_down: bool,
}

impl<'a> RequestContext<'a> {
    /// Fresh context for one request against `app`
    pub fn new(
        app: &'a Application,
        host: impl Into<String>,
        path: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self::with_request_id(app, RequestId::new(), host, path, data)
    }

    pub(crate) fn with_request_id(
        app: &'a Application,
        request_id: RequestId,
        host: impl Into<String>,
        path: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            app,
            request_id,
            host: host.into(),
            path: path.into(),
            data,
            teardown_funcs: Vec::new(),
            torn_down: false,
        }
    }

    /// Id used to correlate log events for this request
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw request payload, empty if the client sent none
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether the request carried a payload
    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }

    /// The application serving this request
    pub fn app(&self) -> &'a Application {
        self.app
    }

    pub fn config(&self) -> &'a Config {
        self.app.config()
    }

    /// Run `f` when the request is finished
    ///
    /// Callbacks registered after teardown has run are never called.
    pub fn register_teardown<F>(&mut self, f: F)
    where
        F: FnOnce(&RequestContext<'a>) + 'a,
    {
        self.teardown_funcs.push(Box::new(f));
    }

    /// Run the teardown callbacks in registration order
    ///
    /// Only the first call has any effect.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        let funcs = std::mem::take(&mut self.teardown_funcs);
        debug!(
            request_id = %self.request_id,
            callbacks = funcs.len(),
            "Request teardown"
        );
        for f in funcs {
            f(self);
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Redirect to the path reverse-routed from `endpoint` and `values`
    ///
    /// The path becomes the meta of a status 3 response with an empty body.
    /// Register redirect targets under stable names ([`Handler::named`](crate::Handler::named)
    /// or an explicit endpoint); default names come from the compiler's type names.
    pub fn redirect(&self, endpoint: &str, values: &[(&str, &str)]) -> Result<Response, BuildError> {
        let location = self.app.router().build(endpoint, values)?;
        debug!(
            request_id = %self.request_id,
            endpoint = %endpoint,
            location = %location,
            "Redirect built"
        );
        Ok(Response::redirect(location))
    }

    /// Render `name` through the application's template engine
    pub fn render_template(&self, name: &str, vars: &JsonValue) -> Result<String, TemplateError> {
        self.app
            .template_engine()
            .ok_or(TemplateError::Unavailable)?
            .render_template(name, vars)
    }
}

impl Drop for RequestContext<'_> {
    fn drop(&mut self) {
        if !self.torn_down {
            self.teardown();
        }
    }
}

impl fmt::Debug for RequestContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("data_len", &self.data.len())
            .field("teardown_funcs", &self.teardown_funcs.len())
            .field("torn_down", &self.torn_down)
            .finish()
    }
}
