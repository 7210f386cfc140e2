//! Engine configuration: extensions, delimiters and escaping policy.
//!
//! [`EngineConfig`] is plain data so it can live in a YAML file next to the
//! templates:
//!
//! ```yaml
//! extensions: [".html", ".tmpl"]
//! delimiters: { left: "[[", right: "]]" }
//! auto_escape: true
//! strict_undefined: true
//! ```
//!
//! Callable functions are not data; they are attached through
//! [`EngineBuilder::function`](crate::EngineBuilder::function).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;
use crate::path::DEFAULT_EXTENSIONS;

/// A start/end marker pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    pub left: String,
    pub right: String,
}

impl Delimiters {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Delimiters {
            left: left.into(),
            right: right.into(),
        }
    }

    /// `{{` / `}}`, expression output.
    pub fn variable() -> Self {
        Delimiters::new("{{", "}}")
    }

    /// `{%` / `%}`, statements (`if`, `for`, `include`, …).
    pub fn block() -> Self {
        Delimiters::new("{%", "%}")
    }

    /// `{#` / `#}`, comments.
    pub fn comment() -> Self {
        Delimiters::new("{#", "#}")
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Delimiters::variable()
    }
}

/// Compile-time settings for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// File suffixes treated as template sources.
    pub extensions: Vec<String>,
    /// Expression delimiters.
    pub delimiters: Delimiters,
    /// Statement delimiters.
    pub block_delimiters: Delimiters,
    /// Comment delimiters.
    pub comment_delimiters: Delimiters,
    /// HTML-escape every interpolated value.
    pub auto_escape: bool,
    /// Treat undefined fields as render errors instead of empty output.
    pub strict_undefined: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            delimiters: Delimiters::variable(),
            block_delimiters: Delimiters::block(),
            comment_delimiters: Delimiters::comment(),
            auto_escape: true,
            strict_undefined: true,
        }
    }
}

impl EngineConfig {
    /// Read a YAML configuration file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let contents = std::fs::read_to_string(path).map_err(|source| TemplateError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| TemplateError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether the delimiters differ from the stock `{{ }}`/`{% %}`/`{# #}` set.
    pub fn has_custom_syntax(&self) -> bool {
        self.delimiters != Delimiters::variable()
            || self.block_delimiters != Delimiters::block()
            || self.comment_delimiters != Delimiters::comment()
    }
}
