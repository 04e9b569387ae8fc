//! Template rendering for handlers.
//!
//! [`TemplateEngine`] is the seam handlers render through (via
//! [`crate::RequestContext::render_template`]); [`JinjaTemplates`] is the
//! default engine, a `minijinja` environment loading templates from the
//! configured search directories.
//!
//! Template names are `/`-separated relative paths. Names containing a `..`
//! segment or a backslash never reach the file system and are reported as
//! not found.

use minijinja::{AutoEscape, Environment, ErrorKind};
use serde_json::Value as JsonValue;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;

/// Errors raised while rendering a template
#[derive(Debug)]
pub enum TemplateError {
    /// No search directory holds the template, or the name was rejected
    NotFound {
        /// The requested template name
        name: String,
    },
    /// The application has no template engine configured
    Unavailable,
    /// The template failed to load, parse or render
    Render {
        /// The requested template name
        name: String,
        /// The engine's error
        source: minijinja::Error,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::NotFound { name } => write!(f, "template '{name}' not found"),
            TemplateError::Unavailable => write!(f, "no template engine configured"),
            TemplateError::Render { name, source } => {
                write!(f, "failed to render template '{name}': {source}")
            }
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::Render { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Renders named templates with a set of variables
pub trait TemplateEngine: Send + Sync {
    fn render_template(&self, name: &str, vars: &JsonValue) -> Result<String, TemplateError>;
}

/// Turn a template name into a relative path
///
/// Empty and `.` segments are dropped. Returns `None` for names that would
/// climb out of the search directory or use a platform separator.
#[must_use]
pub fn sanitize_template_name(name: &str) -> Option<PathBuf> {
    let mut path = PathBuf::new();
    for piece in name.split('/') {
        if piece == ".." || piece.contains('\\') || piece.contains(std::path::MAIN_SEPARATOR) {
            return None;
        }
        if !piece.is_empty() && piece != "." {
            path.push(piece);
        }
    }
    if path.as_os_str().is_empty() {
        return None;
    }
    Some(path)
}

fn load_from(searchpath: &[PathBuf], name: &str) -> io::Result<Option<String>> {
    let Some(relative) = sanitize_template_name(name) else {
        return Ok(None);
    };
    for dir in searchpath {
        let candidate = dir.join(&relative);
        if candidate.is_file() {
            debug!(template = %name, path = %candidate.display(), "Template loaded");
            return fs::read_to_string(&candidate).map(Some);
        }
    }
    Ok(None)
}

/// Default template engine backed by `minijinja`
///
/// Loaded templates are cached by the environment for the lifetime of the
/// engine.
pub struct JinjaTemplates {
    env: Environment<'static>,
    searchpath: Vec<PathBuf>,
}

impl JinjaTemplates {
    /// Engine searching `searchpath` in order
    pub fn new<I, P>(searchpath: I, autoescape: bool) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let searchpath: Vec<PathBuf> = searchpath.into_iter().map(Into::into).collect();
        let mut env = Environment::new();

        let dirs = searchpath.clone();
        env.set_loader(move |name| {
            load_from(&dirs, name).map_err(|e| {
                minijinja::Error::new(ErrorKind::InvalidOperation, "could not read template")
                    .with_source(e)
            })
        });
        env.set_auto_escape_callback(move |_name| {
            if autoescape {
                AutoEscape::Html
            } else {
                AutoEscape::None
            }
        });

        Self { env, searchpath }
    }

    /// Engine for the `searchpath` and `autoescape` options of `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.searchpath.iter().cloned(), config.autoescape)
    }

    /// Register a template from memory
    ///
    /// In-memory templates shadow files of the same name.
    pub fn add_template(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), TemplateError> {
        let name = name.into();
        self.env
            .add_template_owned(name.clone(), source.into())
            .map_err(|source| TemplateError::Render { name, source })
    }

    /// Directories searched for templates, in order
    pub fn searchpath(&self) -> &[PathBuf] {
        &self.searchpath
    }
}

impl TemplateEngine for JinjaTemplates {
    fn render_template(&self, name: &str, vars: &JsonValue) -> Result<String, TemplateError> {
        if sanitize_template_name(name).is_none() {
            return Err(TemplateError::NotFound {
                name: name.to_string(),
            });
        }
        let template = self.env.get_template(name).map_err(|e| {
            if e.kind() == ErrorKind::TemplateNotFound {
                TemplateError::NotFound {
                    name: name.to_string(),
                }
            } else {
                TemplateError::Render {
                    name: name.to_string(),
                    source: e,
                }
            }
        })?;
        template.render(vars).map_err(|source| TemplateError::Render {
            name: name.to_string(),
            source,
        })
    }
}

impl fmt::Debug for JinjaTemplates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JinjaTemplates")
            .field("searchpath", &self.searchpath)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_prevents_traversal() {
        assert!(sanitize_template_name("../secret.txt").is_none());
        assert!(sanitize_template_name("a/../../b").is_none());
        assert!(sanitize_template_name("a\\b").is_none());
        assert!(sanitize_template_name("").is_none());
        assert_eq!(
            sanitize_template_name("./pages//index.gmi"),
            Some(PathBuf::from("pages").join("index.gmi"))
        );
    }

    #[test]
    fn test_render_from_searchpath() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("hello.gmi"), "# Hello {{ name }}!").unwrap();

        let searchpath = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let engine = JinjaTemplates::new(searchpath, false);
        let out = engine
            .render_template("hello.gmi", &json!({ "name": "World" }))
            .unwrap();
        assert_eq!(out, "# Hello World!");
    }

    #[test]
    fn test_first_directory_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("t.gmi"), "first").unwrap();
        fs::write(second.path().join("t.gmi"), "second").unwrap();

        let engine = JinjaTemplates::new([first.path(), second.path()], false);
        assert_eq!(engine.render_template("t.gmi", &json!({})).unwrap(), "first");
    }

    #[test]
    fn test_missing_and_rejected_names_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let engine = JinjaTemplates::new([dir.path()], false);
        assert!(matches!(
            engine.render_template("nope.gmi", &json!({})),
            Err(TemplateError::NotFound { .. })
        ));
        assert!(matches!(
            engine.render_template("../nope.gmi", &json!({})),
            Err(TemplateError::NotFound { .. })
        ));
    }

    #[test]
    fn test_autoescape() {
        let vars = json!({ "v": "<b>" });

        let mut plain = JinjaTemplates::new(Vec::<PathBuf>::new(), false);
        plain.add_template("t", "{{ v }}").unwrap();
        assert_eq!(plain.render_template("t", &vars).unwrap(), "<b>");

        let mut escaped = JinjaTemplates::new(Vec::<PathBuf>::new(), true);
        escaped.add_template("t", "{{ v }}").unwrap();
        assert_eq!(escaped.render_template("t", &vars).unwrap(), "&lt;b&gt;");
    }

    #[test]
    fn test_syntax_error_is_render_error() {
        let mut engine = JinjaTemplates::new(Vec::<PathBuf>::new(), false);
        assert!(matches!(
            engine.add_template("bad", "{% if %}"),
            Err(TemplateError::Render { .. })
        ));
    }
}
