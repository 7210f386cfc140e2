//! Error types for ginx-html.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// All errors that can arise from loading or rendering templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template root missing, unreadable, or an I/O failure mid-walk.
    #[error("template io error at {}: {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template source failed to compile. The entry is not registered.
    #[error("failed to parse template {name:?}{}: {source}", origin(.path))]
    Parse {
        name: String,
        /// Source file the template came from; `None` for inline sources.
        path: Option<PathBuf>,
        #[source]
        source: minijinja::Error,
    },

    /// `render` was asked for a name that is not in the namespace.
    #[error("template {name:?} not found")]
    NotFound { name: String },

    /// Execution failed after it started; the sink may hold partial output.
    #[error("failed to render template {name:?}: {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// Delimiter configuration rejected by the template syntax.
    #[error("invalid template syntax configuration: {0}")]
    Syntax(#[source] minijinja::Error),

    /// Engine configuration file could not be read.
    #[error("cannot read engine config at {}: {source}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Engine configuration file is not valid YAML for [`EngineConfig`](crate::EngineConfig).
    #[error("failed to parse engine config at {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl TemplateError {
    /// Template name the error is about, when there is one.
    pub fn template_name(&self) -> Option<&str> {
        match self {
            TemplateError::Parse { name, .. }
            | TemplateError::NotFound { name }
            | TemplateError::Render { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Convenience constructor for [`TemplateError::FileSystem`].
pub(crate) fn fs_err(path: impl Into<PathBuf>, source: std::io::Error) -> TemplateError {
    TemplateError::FileSystem {
        path: path.into(),
        source,
    }
}

fn origin(path: &Option<PathBuf>) -> String {
    path.as_deref()
        .map(|p: &Path| format!(" from {}", p.display()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_template() {
        let err = TemplateError::NotFound {
            name: "sub/page".to_string(),
        };
        assert_eq!(err.to_string(), "template \"sub/page\" not found");
        assert_eq!(err.template_name(), Some("sub/page"));
    }

    #[test]
    fn parse_message_includes_source_path() {
        let source = minijinja::Error::new(minijinja::ErrorKind::SyntaxError, "unexpected end");
        let err = TemplateError::Parse {
            name: "index".to_string(),
            path: Some(PathBuf::from("/srv/templates/index.html")),
            source,
        };
        let msg = err.to_string();
        assert!(msg.contains("\"index\""), "got: {msg}");
        assert!(msg.contains("/srv/templates/index.html"), "got: {msg}");
    }

    #[test]
    fn inline_parse_message_has_no_origin() {
        let source = minijinja::Error::new(minijinja::ErrorKind::SyntaxError, "unexpected end");
        let err = TemplateError::Parse {
            name: "inline".to_string(),
            path: None,
            source,
        };
        assert!(!err.to_string().contains(" from "));
    }

    #[test]
    fn filesystem_error_exposes_io_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = fs_err("/missing", io);
        let source = std::error::Error::source(&err).expect("source");
        assert!(source.to_string().contains("gone"));
        assert!(err.template_name().is_none());
    }
}
