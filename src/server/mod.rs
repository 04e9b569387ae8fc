//! Boundary with the transport.
//!
//! The transport accepts connections, parses the request line and hands the
//! dispatcher `(host, path, data)` plus something implementing
//! [`ResponseSink`]. [`WireSink`] adapts any [`std::io::Write`] into a sink that
//! emits the `<status> <meta>\r\n<body>` wire format.

pub mod response;

pub use response::{ResponseSink, WireSink};
