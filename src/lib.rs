//! # Rhyton
//!
//! **Rhyton** is a small request-routing framework for line-oriented,
//! connection-per-request protocols in the Spartan/Gemini family: the client
//! sends a host and a path, the server answers with a status line
//! (`<status> <meta>\r\n`) and, for successful requests, a body.
//!
//! ## Overview
//!
//! Rhyton does not own sockets. A transport accepts connections, parses the
//! request line, and hands the `(host, path, data)` triple plus a
//! [`ResponseSink`] to [`Dispatcher::handle_request`]. Everything between
//! those two points belongs to Rhyton: matching the path against registered
//! patterns, calling the handler with a per-request context, running
//! teardown callbacks, and turning whatever the handler returned into a
//! well-formed response.
//!
//! ## Architecture
//!
//! - **[`router`]** - Pattern compilation, radix-tree matching and reverse
//!   routing
//! - **[`app`]** - The [`Application`]: configuration, routes and the
//!   endpoint to [`Handler`] table
//! - **[`context`]** - [`RequestContext`], the per-request state handed to
//!   handlers
//! - **[`dispatcher`]** - [`Dispatcher`], the runtime entry point
//! - **[`response`]** - [`Response`], reply normalization and [`abort`]
//! - **[`server`]** - The [`ResponseSink`] seam and the [`WireSink`] writer
//! - **[`templates`]** - [`TemplateEngine`] and the `minijinja`-backed
//!   [`JinjaTemplates`]
//! - **[`config`]** - [`Config`], loaded from code, YAML/JSON or the
//!   environment
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant T as Transport
//!     participant D as Dispatcher
//!     participant R as Router
//!     participant RT as RouteTable
//!     participant C as RequestContext
//!     participant H as Handler
//!
//!     T->>D: handle_request(host, path, data, sink)
//!     D->>D: host == config.host?
//!     alt foreign host
//!         D-->>T: 4 Host ... is not served here
//!     end
//!     D->>R: route(host, path)
//!     alt no match
//!         D-->>T: 4 Not Found
//!     end
//!     R-->>D: (endpoint, params)
//!     D->>RT: get(endpoint)
//!     D->>C: bind(host, path, data)
//!     D->>H: call(ctx, params)
//!     H-->>D: Reply
//!     D->>C: teardown()
//!     D->>D: normalize(reply)
//!     D-->>T: status line [+ body]
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rhyton::{Application, Config, Handler, Params, RequestContext, WireSink};
//!
//! fn hello(_ctx: &mut RequestContext<'_>, params: &Params) -> anyhow::Result<String> {
//!     Ok(format!("hi {}", params.get("name").unwrap_or("you")))
//! }
//!
//! let mut app = Application::new(Config::new("example.com").unwrap());
//! app.route("/hello/<name>", Handler::new(hello)).unwrap();
//!
//! let dispatcher = app.bind().unwrap();
//! let mut sink = WireSink::new(Vec::new());
//! dispatcher
//!     .handle_request("example.com", "/hello/world", Vec::new(), &mut sink)
//!     .unwrap();
//! assert_eq!(sink.into_inner().unwrap(), b"2 text/gemini\r\nhi world");
//! ```
//!
//! ## Handler Replies
//!
//! Handlers return `anyhow::Result<R>` where `R: Into<Reply>`:
//!
//! | Returned | Response |
//! |---|---|
//! | `Response` | as is |
//! | `String`, `&str`, `Vec<u8>`, `&[u8]` | body, `text/gemini`, status 2 |
//! | `(content,)` / `(content, meta)` / `(content, meta, status)` | positional |
//!
//! Errors propagate out of the dispatcher as [`DispatchError::Handler`] after
//! teardown; use [`abort`] to answer with an error status instead.

pub mod app;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod response;
pub mod router;
pub mod server;
pub mod templates;

pub use app::{Application, Handler, RouteTable};
pub use config::Config;
pub use context::RequestContext;
pub use dispatcher::Dispatcher;
pub use error::{
    BuildError, ConfigurationError, DispatchError, ResponseShapeError, RoutingMiss,
};
pub use response::{abort, normalize, Content, Reply, Response, ResponseArgs, StatusFamily};
pub use router::{Params, RouteOptions, Router};
pub use server::{ResponseSink, WireSink};
pub use templates::{JinjaTemplates, TemplateEngine, TemplateError};
