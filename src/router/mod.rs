//! # Router Module
//!
//! Path matching and reverse routing.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling Werkzeug-style patterns (`/hello/<name>`, `/items/<int:id>`,
//!   `/files/<path:rest>`) into a radix tree
//! - Matching an incoming `(host, path)` pair to an endpoint name
//! - Extracting the placeholder values as named parameters
//! - Building paths back from an endpoint and its parameters
//!
//! It knows nothing about handlers: it maps patterns to endpoint *names*,
//! and the application's route table maps names to handlers.
//!
//! ## Example
//!
//! ```rust
//! use rhyton::router::{RouteOptions, Router};
//!
//! let mut router = Router::new();
//! router
//!     .register("/hello/<name>", "hello", RouteOptions::default())
//!     .unwrap();
//!
//! let m = router.route("example.com", "/hello/world").unwrap();
//! assert_eq!(&*m.endpoint, "hello");
//! assert_eq!(m.params.get("name"), Some("world"));
//! assert_eq!(router.build("hello", &[("name", "moon")]).unwrap(), "/hello/moon");
//! ```

mod core;
mod pattern;
mod radix;

pub use core::{ParamVec, Params, RouteEntry, RouteMatch, RouteOptions, Router, MAX_INLINE_PARAMS};
pub use pattern::{Converter, Pattern, Segment};
