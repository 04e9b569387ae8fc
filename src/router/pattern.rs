//! Route pattern compilation.
//!
//! Patterns use Werkzeug-style placeholders spanning whole segments:
//! `/hello/<name>`, `/items/<int:id>`, `/files/<path:rest>`.

use std::sync::Arc;

use crate::error::ConfigurationError;

/// How a placeholder matches request segments
///
/// The declaration order is also the order placeholders are tried in when
/// several of them compete for the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Converter {
    /// One segment of ASCII digits
    Int,
    /// One non-empty segment (the default)
    String,
    /// All remaining segments, slashes included
    Path,
}

impl Converter {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Converter::Int),
            "string" | "default" => Some(Converter::String),
            "path" => Some(Converter::Path),
            _ => None,
        }
    }

    /// Whether `value` is something this converter would have matched
    #[must_use]
    pub fn accepts(self, value: &str) -> bool {
        match self {
            Converter::Int => !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
            Converter::String => !value.is_empty() && !value.contains('/'),
            Converter::Path => !value.is_empty(),
        }
    }

    /// Percent-encode `value` for use in a built path
    pub(crate) fn encode(self, value: &str) -> String {
        match self {
            Converter::Path => value
                .split('/')
                .map(|s| urlencoding::encode(s).into_owned())
                .collect::<Vec<_>>()
                .join("/"),
            Converter::Int | Converter::String => urlencoding::encode(value).into_owned(),
        }
    }
}

/// One compiled segment of a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text
    Static(String),
    /// A named placeholder
    Param {
        /// Parameter name handed to the handler
        name: Arc<str>,
        /// Matching rule
        converter: Converter,
    },
}

/// A compiled route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile `source`
    pub fn parse(source: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidPattern {
            pattern: source.to_string(),
            reason: reason.to_string(),
        };

        if !source.starts_with('/') {
            return Err(invalid("patterns must start with '/'"));
        }

        let mut segments: Vec<Segment> = Vec::new();
        for raw in source.split('/').filter(|s| !s.is_empty()) {
            if let Some(Segment::Param {
                converter: Converter::Path,
                ..
            }) = segments.last()
            {
                return Err(invalid("a <path:...> placeholder must be the last segment"));
            }

            let Some(inner) = raw.strip_prefix('<').and_then(|s| s.strip_suffix('>')) else {
                if raw.contains(['<', '>']) {
                    return Err(invalid("placeholders must span a whole segment"));
                }
                segments.push(Segment::Static(raw.to_string()));
                continue;
            };

            let (converter, name) = match inner.split_once(':') {
                Some((conv, name)) => (
                    Converter::parse(conv).ok_or_else(|| invalid("unknown converter"))?,
                    name,
                ),
                None => (Converter::String, inner),
            };
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid("placeholder names must be non-empty identifiers"));
            }
            let duplicate = segments
                .iter()
                .any(|s| matches!(s, Segment::Param { name: n, .. } if n.as_ref() == name));
            if duplicate {
                return Err(invalid("placeholder names must be unique"));
            }
            segments.push(Segment::Param {
                name: Arc::from(name),
                converter,
            });
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The pattern as registered
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Compiled segments, root first
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of all placeholders, in path order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param { name, .. } => Some(name.as_ref()),
            Segment::Static(_) => None,
        })
    }
}
