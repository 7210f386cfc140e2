//! # ginx-html
//!
//! HTML template namespace for web handlers. Every template file under a
//! root directory (host or virtual) is compiled into one shared set of
//! named templates, then rendered by name into any `io::Write` sink.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ginx_html::{EngineBuilder, TemplateError};
//! use minijinja::Value;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Index {
//!     title: String,
//! }
//!
//! fn serve() -> Result<(), TemplateError> {
//!     let mut engine = EngineBuilder::new()
//!         .delimiters("[[", "]]")
//!         .function("add", Value::from_function(|a: i64, b: i64| a + b))
//!         .build()?;
//!     engine.load("templates")?;
//!
//!     let stdout = std::io::stdout();
//!     engine.render(stdout.lock(), "index", Index { title: "Home".into() })?;
//!     Ok(())
//! }
//! ```
//!
//! Canonical names are paths relative to the root with `/` separators and
//! the extension removed: `templates/sub/page.html` becomes `sub/page`.
//! Templates refer to each other by these names in `include` and `extends`.

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod path;
pub mod vfs;
pub mod walk;

pub use config::{Delimiters, EngineConfig};
pub use data::DataBinding;
pub use engine::{Engine, EngineBuilder};
pub use error::TemplateError;
pub use path::{derive_name, ExtensionFilter, DEFAULT_EXTENSIONS};
pub use vfs::{MemoryFs, VfsEntry, VirtualFs};
pub use walk::{walk_dir, walk_virtual, WalkEntry};

pub use minijinja;
