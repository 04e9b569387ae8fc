//! Responses and the normalizer that turns handler replies into them.
//!
//! A handler may hand back a fully built [`Response`], bare content (text or
//! bytes), or positional `(content, meta, status)` arguments. All three are
//! cases of the closed [`Reply`] enum; anything else does not compile.

use std::fmt;

use crate::error::{ConfigurationError, ResponseShapeError};
use crate::server::ResponseSink;

/// Metadata used when a reply does not carry its own
pub const DEFAULT_META: &str = "text/gemini";

/// Status used when a reply does not carry its own
pub const DEFAULT_STATUS: u8 = 2;

/// Grouping of status codes by their leading decimal digit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusFamily {
    /// `2`: the body is delivered
    Success,
    /// `3`: meta carries the new location
    Redirect,
    /// `4`: the client asked for something that cannot be served
    ClientError,
    /// `5`: the server failed
    ServerError,
}

impl StatusFamily {
    /// Every family the protocol defines
    pub const ALL: [StatusFamily; 4] = [
        StatusFamily::Success,
        StatusFamily::Redirect,
        StatusFamily::ClientError,
        StatusFamily::ServerError,
    ];

    /// Classify a status code by its leading digit
    #[must_use]
    pub fn of(status: u8) -> Option<Self> {
        let mut lead = status;
        while lead >= 10 {
            lead /= 10;
        }
        match lead {
            2 => Some(StatusFamily::Success),
            3 => Some(StatusFamily::Redirect),
            4 => Some(StatusFamily::ClientError),
            5 => Some(StatusFamily::ServerError),
            _ => None,
        }
    }

    /// Leading digit shared by the family's codes
    #[must_use]
    pub fn digit(self) -> u8 {
        match self {
            StatusFamily::Success => 2,
            StatusFamily::Redirect => 3,
            StatusFamily::ClientError => 4,
            StatusFamily::ServerError => 5,
        }
    }

    /// Metadata `abort` falls back to; only error families have one
    #[must_use]
    pub fn default_meta(self) -> Option<&'static str> {
        match self {
            StatusFamily::ClientError => Some("Client Error"),
            StatusFamily::ServerError => Some("Server Error"),
            StatusFamily::Success | StatusFamily::Redirect => None,
        }
    }
}

/// Response body before encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// UTF-8 text
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
}

impl Content {
    /// Body bytes; text is UTF-8 encoded
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Content::Text(s) => s.into_bytes(),
            Content::Bytes(b) => b,
        }
    }
}

impl Default for Content {
    fn default() -> Self {
        Content::Bytes(Vec::new())
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Text(s)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Content {
    fn from(b: Vec<u8>) -> Self {
        Content::Bytes(b)
    }
}

impl From<&[u8]> for Content {
    fn from(b: &[u8]) -> Self {
        Content::Bytes(b.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Content {
    fn from(b: &[u8; N]) -> Self {
        Content::Bytes(b.to_vec())
    }
}

/// A complete response: body, metadata and status code
#[derive(Clone, PartialEq, Eq)]
pub struct Response {
    body: Vec<u8>,
    meta: String,
    status: u8,
}

impl Response {
    /// Build a response from its three parts
    #[must_use]
    pub fn new(content: impl Into<Content>, meta: impl Into<String>, status: u8) -> Self {
        Self {
            body: content.into().into_bytes(),
            meta: meta.into(),
            status,
        }
    }

    /// Success response with the default metadata
    #[must_use]
    pub fn ok(content: impl Into<Content>) -> Self {
        Self::new(content, DEFAULT_META, DEFAULT_STATUS)
    }

    /// Redirect to `location`
    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::new(Content::default(), location, 3)
    }

    /// Body bytes
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Metadata line text
    #[must_use]
    pub fn meta(&self) -> &str {
        &self.meta
    }

    /// Status code
    #[must_use]
    pub fn status(&self) -> u8 {
        self.status
    }

    /// Family of the status code, if it belongs to one
    #[must_use]
    pub fn family(&self) -> Option<StatusFamily> {
        StatusFamily::of(self.status)
    }

    /// Write the status line, and the body for success responses
    pub fn send<S: ResponseSink + ?Sized>(&self, sink: &mut S) -> std::io::Result<()> {
        sink.write_status(self.status, &self.meta)?;
        if self.family() == Some(StatusFamily::Success) {
            sink.write_body(&self.body)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("meta", &self.meta)
            .field("body", &String::from_utf8_lossy(&self.body))
            .finish()
    }
}

/// Positional response arguments; missing trailing values take defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseArgs {
    /// Body
    pub content: Content,
    /// Metadata, defaults to [`DEFAULT_META`]
    pub meta: Option<String>,
    /// Status, defaults to [`DEFAULT_STATUS`]
    pub status: Option<u8>,
}

/// Everything a handler may return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Already built; passed through
    Response(Response),
    /// Bare content wrapped as a success response
    Content(Content),
    /// Constructor arguments
    Args(ResponseArgs),
}

impl From<Response> for Reply {
    fn from(r: Response) -> Self {
        Reply::Response(r)
    }
}

impl From<Content> for Reply {
    fn from(c: Content) -> Self {
        Reply::Content(c)
    }
}

impl From<ResponseArgs> for Reply {
    fn from(a: ResponseArgs) -> Self {
        Reply::Args(a)
    }
}

impl From<String> for Reply {
    fn from(s: String) -> Self {
        Reply::Content(s.into())
    }
}

impl From<&str> for Reply {
    fn from(s: &str) -> Self {
        Reply::Content(s.into())
    }
}

impl From<Vec<u8>> for Reply {
    fn from(b: Vec<u8>) -> Self {
        Reply::Content(b.into())
    }
}

impl From<&[u8]> for Reply {
    fn from(b: &[u8]) -> Self {
        Reply::Content(b.into())
    }
}

impl<const N: usize> From<&[u8; N]> for Reply {
    fn from(b: &[u8; N]) -> Self {
        Reply::Content(b.into())
    }
}

impl<C: Into<Content>> From<(C,)> for Reply {
    fn from((content,): (C,)) -> Self {
        Reply::Args(ResponseArgs {
            content: content.into(),
            meta: None,
            status: None,
        })
    }
}

impl<C: Into<Content>, M: Into<String>> From<(C, M)> for Reply {
    fn from((content, meta): (C, M)) -> Self {
        Reply::Args(ResponseArgs {
            content: content.into(),
            meta: Some(meta.into()),
            status: None,
        })
    }
}

impl<C: Into<Content>, M: Into<String>> From<(C, M, u8)> for Reply {
    fn from((content, meta, status): (C, M, u8)) -> Self {
        Reply::Args(ResponseArgs {
            content: content.into(),
            meta: Some(meta.into()),
            status: Some(status),
        })
    }
}

/// Turn a handler reply into a response
///
/// Fails when the result could not be written as a single status line:
/// metadata containing a line break, or status `0`. The check applies to
/// every [`Reply`] variant, including an already built [`Response`], which
/// otherwise passes through unchanged.
pub fn normalize(reply: impl Into<Reply>) -> Result<Response, ResponseShapeError> {
    let reply = reply.into();
    let response = match &reply {
        Reply::Response(r) => r.clone(),
        Reply::Content(c) => Response::ok(c.clone()),
        Reply::Args(args) => Response::new(
            args.content.clone(),
            args.meta.as_deref().unwrap_or(DEFAULT_META),
            args.status.unwrap_or(DEFAULT_STATUS),
        ),
    };

    if response.status == 0 {
        return Err(ResponseShapeError {
            value: format!("{reply:?}"),
            reason: "status code 0 belongs to no status family",
        });
    }
    if response.meta.contains(['\r', '\n']) {
        return Err(ResponseShapeError {
            value: format!("{reply:?}"),
            reason: "meta must fit on the status line",
        });
    }
    Ok(response)
}

/// Empty-bodied response for `status`, with `meta` or the family default
pub fn abort(status: u8, meta: Option<&str>) -> Result<Response, ConfigurationError> {
    let meta = match meta {
        Some(m) if !m.is_empty() => m,
        _ => StatusFamily::of(status)
            .and_then(StatusFamily::default_meta)
            .ok_or(ConfigurationError::NoDefaultMeta { status })?,
    };
    Ok(Response::new(Content::default(), meta, status))
}
