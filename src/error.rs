//! Error types for registration, dispatch and response handling.
//!
//! Setup mistakes surface as [`ConfigurationError`] and are never caught by the
//! dispatcher. Routing misses are recovered into client-error responses. Every
//! other failure on the request path leaves [`crate::Dispatcher::respond`] as a
//! [`DispatchError`].

use std::fmt;
use std::io;

/// Programmer error detected while the application is being set up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The configuration has no (or an empty) `host`
    MissingHost,
    /// A pattern was registered without an endpoint name and none could be
    /// derived from the handler
    MissingEndpoint {
        /// The pattern being registered
        pattern: String,
    },
    /// An endpoint is already bound to a different handler
    EndpointCollision {
        /// The endpoint name
        endpoint: String,
    },
    /// `abort` was called for a status family that has no default metadata
    NoDefaultMeta {
        /// The requested status code
        status: u8,
    },
    /// A route pattern could not be compiled
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// What is wrong with it
        reason: String,
    },
    /// A route points at an endpoint that no handler was ever bound to
    UnboundEndpoint {
        /// The endpoint name
        endpoint: String,
    },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::MissingHost => {
                write!(f, "configuration error: a non-empty host must be provided")
            }
            ConfigurationError::MissingEndpoint { pattern } => write!(
                f,
                "configuration error: pattern '{pattern}' needs either a named handler or an explicit endpoint"
            ),
            ConfigurationError::EndpointCollision { endpoint } => write!(
                f,
                "configuration error: endpoint collision, '{endpoint}' is already bound to a different handler"
            ),
            ConfigurationError::NoDefaultMeta { status } => write!(
                f,
                "configuration error: no default meta for response code {status}"
            ),
            ConfigurationError::InvalidPattern { pattern, reason } => {
                write!(f, "configuration error: invalid pattern '{pattern}': {reason}")
            }
            ConfigurationError::UnboundEndpoint { endpoint } => write!(
                f,
                "configuration error: endpoint '{endpoint}' is routed but has no handler"
            ),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// A request that could not be routed
///
/// Never escapes the dispatcher: it is turned into a status 4 response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingMiss {
    /// The request names a host this application does not serve
    HostMismatch {
        /// Host named by the request
        requested: String,
        /// Host the application is bound to
        bound: String,
    },
    /// No pattern matched the path
    NotFound {
        /// The requested path
        path: String,
    },
}

impl fmt::Display for RoutingMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingMiss::HostMismatch { requested, bound } => write!(
                f,
                "Host {requested} is not served here (this server is for {bound})"
            ),
            RoutingMiss::NotFound { .. } => write!(f, "Not Found"),
        }
    }
}

impl std::error::Error for RoutingMiss {}

/// A handler reply that cannot be written to the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseShapeError {
    /// Debug rendering of the rejected value
    pub value: String,
    /// Why it was rejected
    pub reason: &'static str,
}

impl fmt::Display for ResponseShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot figure out how to handle handler return value {} ({})",
            self.value, self.reason
        )
    }
}

impl std::error::Error for ResponseShapeError {}

/// Hard failure while dispatching a request
#[derive(Debug)]
pub enum DispatchError {
    /// The handler returned an error; teardown has already run
    Handler {
        /// Endpoint whose handler failed
        endpoint: String,
        /// The handler's error
        source: anyhow::Error,
    },
    /// The handler's reply could not be normalized
    ResponseShape(ResponseShapeError),
    /// The router produced an endpoint the route table does not know
    UnboundEndpoint {
        /// The endpoint name
        endpoint: String,
    },
    /// Writing to the response sink failed
    Io(io::Error),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Handler { endpoint, source } => {
                write!(f, "handler for endpoint '{endpoint}' failed: {source}")
            }
            DispatchError::ResponseShape(e) => write!(f, "{e}"),
            DispatchError::UnboundEndpoint { endpoint } => write!(
                f,
                "router matched endpoint '{endpoint}' but no handler is registered for it"
            ),
            DispatchError::Io(e) => write!(f, "failed to write response: {e}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Handler { source, .. } => Some(&**source),
            DispatchError::ResponseShape(e) => Some(e),
            DispatchError::UnboundEndpoint { .. } => None,
            DispatchError::Io(e) => Some(e),
        }
    }
}

impl From<ResponseShapeError> for DispatchError {
    fn from(e: ResponseShapeError) -> Self {
        DispatchError::ResponseShape(e)
    }
}

impl From<io::Error> for DispatchError {
    fn from(e: io::Error) -> Self {
        DispatchError::Io(e)
    }
}

/// Reverse routing failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// No route is registered for the endpoint
    UnknownEndpoint {
        /// The endpoint name
        endpoint: String,
    },
    /// Routes exist but none can be built from the supplied values
    MissingValues {
        /// The endpoint name
        endpoint: String,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnknownEndpoint { endpoint } => {
                write!(f, "no route is registered for endpoint '{endpoint}'")
            }
            BuildError::MissingValues { endpoint } => write!(
                f,
                "could not build a path for endpoint '{endpoint}' from the supplied values"
            ),
        }
    }
}

impl std::error::Error for BuildError {}
