//! # Dispatcher Module
//!
//! Turns a parsed `(host, path, data)` request into a [`crate::Response`].
//!
//! ## Request Flow
//!
//! 1. Host check: a request for any host but the configured one is answered
//!    with status 4 and never routed
//! 2. Route match: no match is answered with status 4 `Not Found`
//! 3. Handler lookup by endpoint name
//! 4. A fresh [`crate::RequestContext`] is bound
//! 5. The handler is invoked with the context and the matched parameters
//! 6. Teardown callbacks run, on success and on failure
//! 7. The reply is normalized into a response
//! 8. [`Dispatcher::handle_request`] writes it to the transport's sink
//!
//! ## Error Handling
//!
//! Routing misses never surface as errors. Everything else does, as a
//! [`crate::DispatchError`]:
//!
//! - A failing handler is reported with its endpoint; no error response is
//!   invented
//! - A reply that cannot be written on one status line is rejected
//! - An endpoint the router knows but the route table does not is an
//!   invariant violation that [`crate::Application::bind`] normally rules out
//!
//! A panicking handler unwinds through the dispatcher; the context's `Drop`
//! still runs its teardown callbacks.

mod core;

pub use core::Dispatcher;
