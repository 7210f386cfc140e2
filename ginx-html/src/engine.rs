//! MiniJinja-backed template namespace: [`EngineBuilder`] and [`Engine`].
//!
//! # Lifecycle
//!
//! ```text
//! EngineBuilder (extensions, delimiters, functions)
//!     └─ build() ─► Engine
//!                     ├─ load(root) / load_virtual(fs, root)   (&mut self, repeatable)
//!                     └─ render(out, name, data)                (&self, concurrent)
//! ```
//!
//! Syntax and functions are fixed when the engine is built. `load` and
//! `add_template` need `&mut Engine` while `render` only needs `&Engine`, so
//! loading while renders are in flight requires the caller's own lock
//! (`RwLock<Engine>`: write for load, read for render).
//!
//! # Partial loads
//!
//! `load` stops at the first walk, read, or parse failure and returns it.
//! Templates registered before the failure stay in the namespace.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::Path;

use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior, Value};
use serde::Serialize;

use crate::config::{Delimiters, EngineConfig};
use crate::error::{fs_err, TemplateError};
use crate::path::{derive_name, to_slash, ExtensionFilter};
use crate::vfs::VirtualFs;
use crate::walk::{walk_dir, walk_virtual, Tree, Walk};

// ---------------------------------------------------------------------------
// EngineBuilder
// ---------------------------------------------------------------------------

/// Collects configuration and callable functions before any template exists.
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    functions: BTreeMap<String, Value>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a loaded [`EngineConfig`].
    pub fn from_config(config: EngineConfig) -> Self {
        EngineBuilder {
            config,
            functions: BTreeMap::new(),
        }
    }

    /// Replace the recognised template extensions.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Expression delimiters (default `{{` / `}}`).
    pub fn delimiters(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.config.delimiters = Delimiters::new(left, right);
        self
    }

    /// Statement delimiters (default `{%` / `%}`).
    pub fn block_delimiters(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.config.block_delimiters = Delimiters::new(left, right);
        self
    }

    /// Comment delimiters (default `{#` / `#}`).
    pub fn comment_delimiters(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.config.comment_delimiters = Delimiters::new(left, right);
        self
    }

    pub fn auto_escape(mut self, enabled: bool) -> Self {
        self.config.auto_escape = enabled;
        self
    }

    pub fn strict_undefined(mut self, enabled: bool) -> Self {
        self.config.strict_undefined = enabled;
        self
    }

    /// Register a callable under `name`.
    ///
    /// Build the value with [`Value::from_function`]. A function returning
    /// `Err` aborts the render that called it:
    ///
    /// ```rust
    /// use ginx_html::EngineBuilder;
    /// use minijinja::{Error, ErrorKind, Value};
    ///
    /// let engine = EngineBuilder::new()
    ///     .function("add", Value::from_function(|a: i64, b: i64| a + b))
    ///     .function(
    ///         "div",
    ///         Value::from_function(|a: i64, b: i64| {
    ///             a.checked_div(b)
    ///                 .ok_or_else(|| Error::new(ErrorKind::InvalidOperation, "division by zero"))
    ///         }),
    ///     )
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(engine.function_names().collect::<Vec<_>>(), vec!["add", "div"]);
    /// ```
    pub fn function(mut self, name: impl Into<String>, f: Value) -> Self {
        self.functions.insert(name.into(), f);
        self
    }

    /// Compile the configuration into an empty [`Engine`].
    ///
    /// Fails with [`TemplateError::Syntax`] when the delimiters are unusable
    /// (empty or clashing markers).
    pub fn build(self) -> Result<Engine, TemplateError> {
        let mut env = base_environment(&self.config);
        if self.config.has_custom_syntax() {
            env.set_syntax(syntax_config(&self.config)?);
        }
        for (name, f) in &self.functions {
            env.add_global(name.clone(), f.clone());
        }

        Ok(Engine {
            filter: ExtensionFilter::new(&self.config.extensions),
            config: self.config,
            function_names: self.functions.into_keys().collect(),
            env,
            names: BTreeSet::new(),
        })
    }
}

fn base_environment(config: &EngineConfig) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.set_undefined_behavior(if config.strict_undefined {
        UndefinedBehavior::Strict
    } else {
        UndefinedBehavior::Lenient
    });
    // Canonical names carry no extension, so escaping cannot be keyed on it.
    if config.auto_escape {
        env.set_auto_escape_callback(|_: &str| AutoEscape::Html);
    } else {
        env.set_auto_escape_callback(|_: &str| AutoEscape::None);
    }
    env
}

fn syntax_config(config: &EngineConfig) -> Result<SyntaxConfig, TemplateError> {
    for pair in [
        &config.delimiters,
        &config.block_delimiters,
        &config.comment_delimiters,
    ] {
        if pair.left.is_empty() || pair.right.is_empty() {
            return Err(TemplateError::Syntax(minijinja::Error::new(
                ErrorKind::InvalidOperation,
                "template delimiters must not be empty",
            )));
        }
    }
    SyntaxConfig::builder()
        .variable_delimiters(
            config.delimiters.left.clone(),
            config.delimiters.right.clone(),
        )
        .block_delimiters(
            config.block_delimiters.left.clone(),
            config.block_delimiters.right.clone(),
        )
        .comment_delimiters(
            config.comment_delimiters.left.clone(),
            config.comment_delimiters.right.clone(),
        )
        .build()
        .map_err(TemplateError::Syntax)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Compiled template namespace plus the renderer over it.
///
/// Names are unique; registering a name again replaces the earlier entry.
#[derive(Debug)]
pub struct Engine {
    env: Environment<'static>,
    config: EngineConfig,
    filter: ExtensionFilter,
    function_names: Vec<String>,
    names: BTreeSet<String>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with default configuration and no functions.
    pub fn new() -> Self {
        let config = EngineConfig::default();
        Engine {
            env: base_environment(&config),
            filter: ExtensionFilter::new(&config.extensions),
            config,
            function_names: Vec::new(),
            names: BTreeSet::new(),
        }
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Engine from a configuration with no functions.
    pub fn from_config(config: EngineConfig) -> Result<Self, TemplateError> {
        EngineBuilder::from_config(config).build()
    }

    /// The configuration this engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Names of the registered functions, sorted.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.function_names.iter().map(String::as_str)
    }

    // -----------------------------------------------------------------------
    // Namespace
    // -----------------------------------------------------------------------

    /// Compile `source` under `name`, replacing any entry with that name.
    ///
    /// On a syntax error nothing is registered and an existing entry of the
    /// same name is left as it was.
    pub fn add_template(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), TemplateError> {
        self.compile(name.into(), source.into(), None)
    }

    fn compile(
        &mut self,
        name: String,
        source: String,
        path: Option<&Path>,
    ) -> Result<(), TemplateError> {
        if let Err(source) = self.env.add_template_owned(name.clone(), source) {
            return Err(TemplateError::Parse {
                name,
                path: path.map(Path::to_path_buf),
                source,
            });
        }
        tracing::debug!("registered template {name:?}");
        self.names.insert(name);
        Ok(())
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Registered canonical names in sorted order.
    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Register every template file under the host directory `root`.
    ///
    /// `root` is made absolute first. Returns how many templates this call
    /// registered.
    pub fn load(&mut self, root: impl AsRef<Path>) -> Result<usize, TemplateError> {
        let root = root.as_ref();
        let absolute = std::path::absolute(root).map_err(|e| fs_err(root, e))?;
        let root_name = to_slash(&absolute.to_string_lossy());
        self.load_walk(walk_dir(&absolute), &root_name)
    }

    /// Register every template file under `root` inside a virtual tree.
    ///
    /// Use `"."` to load the whole tree.
    pub fn load_virtual<F: VirtualFs + ?Sized>(
        &mut self,
        fs: &F,
        root: &str,
    ) -> Result<usize, TemplateError> {
        self.load_walk(walk_virtual(fs, root), root)
    }

    fn load_walk<T: Tree>(
        &mut self,
        mut walk: Walk<T>,
        root: &str,
    ) -> Result<usize, TemplateError> {
        let mut loaded = 0;
        while let Some(entry) = walk.next() {
            let result = entry.and_then(|entry| {
                if entry.is_dir {
                    return Ok(());
                }
                let path = T::slash_path(&entry.path);
                let Some(ext) = self.filter.is_template(&path) else {
                    tracing::debug!("skipping non-template file {path}");
                    return Ok(());
                };
                let name = derive_name(root, &path, ext);
                let source = walk.tree().read_to_string(&entry.path)?;
                let origin = T::error_path(&entry.path);
                self.compile(name, source, Some(&origin))?;
                loaded += 1;
                Ok(())
            });
            if let Err(err) = result {
                tracing::warn!(
                    "template load under {root} stopped after {loaded} templates: {err}"
                );
                return Err(err);
            }
        }
        tracing::info!("loaded {loaded} templates from {root}");
        Ok(loaded)
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Render `name` against `data`, streaming into `out`.
    ///
    /// Unknown names fail with [`TemplateError::NotFound`] before anything is
    /// written. Once execution starts, output is written as it is produced;
    /// a later failure returns [`TemplateError::Render`] and leaves what was
    /// already written in `out`.
    pub fn render<W, S>(&self, out: W, name: &str, data: S) -> Result<(), TemplateError>
    where
        W: io::Write,
        S: Serialize,
    {
        let template = self.lookup(name)?;
        template
            .render_captured_to(data, out)
            .map(|_| ())
            .map_err(|source| TemplateError::Render {
                name: name.to_string(),
                source,
            })
    }

    /// Render `name` into a `String`.
    pub fn render_to_string<S: Serialize>(
        &self,
        name: &str,
        data: S,
    ) -> Result<String, TemplateError> {
        let template = self.lookup(name)?;
        template.render(data).map_err(|source| TemplateError::Render {
            name: name.to_string(),
            source,
        })
    }

    fn lookup(&self, name: &str) -> Result<minijinja::Template<'_, '_>, TemplateError> {
        self.env.get_template(name).map_err(|source| match source.kind() {
            ErrorKind::TemplateNotFound => TemplateError::NotFound {
                name: name.to_string(),
            },
            _ => TemplateError::Render {
                name: name.to_string(),
                source,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryFs;
    use minijinja::Error;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Page {
        title: String,
    }

    fn page(title: &str) -> Page {
        Page {
            title: title.to_string(),
        }
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn add_template_then_render() {
        let mut engine = Engine::new();
        engine.add_template("greet", "Hello {{ title }}!").unwrap();
        assert_eq!(
            engine.render_to_string("greet", page("World")).unwrap(),
            "Hello World!"
        );
        assert!(engine.has_template("greet"));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn same_name_last_write_wins() {
        let mut engine = Engine::new();
        engine.add_template("t", "first").unwrap();
        engine.add_template("t", "second").unwrap();
        assert_eq!(engine.render_to_string("t", ()).unwrap(), "second");
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn failed_replacement_keeps_previous_entry() {
        let mut engine = Engine::new();
        engine.add_template("t", "ok").unwrap();
        let err = engine.add_template("t", "{% if %}").unwrap_err();
        assert!(
            matches!(err, TemplateError::Parse { path: None, .. }),
            "got: {err}"
        );
        assert_eq!(engine.render_to_string("t", ()).unwrap(), "ok");
    }

    #[test]
    fn unknown_name_writes_nothing() {
        let engine = Engine::new();
        let mut out = Vec::new();
        let err = engine.render(&mut out, "missing", ()).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound { .. }));
        assert_eq!(err.template_name(), Some("missing"));
        assert!(out.is_empty());
    }

    #[test]
    fn html_is_escaped_by_default() {
        let mut engine = Engine::new();
        engine.add_template("t", "<p>{{ title }}</p>").unwrap();
        let out = engine.render_to_string("t", page("<b>&</b>")).unwrap();
        assert!(out.starts_with("<p>&lt;b&gt;&amp;&lt;"), "got: {out}");
        assert!(!out.contains("<b>"));
    }

    #[test]
    fn escaping_can_be_disabled() {
        let mut engine = Engine::builder().auto_escape(false).build().unwrap();
        engine.add_template("t", "{{ title }}").unwrap();
        assert_eq!(engine.render_to_string("t", page("<b>")).unwrap(), "<b>");
    }

    #[test]
    fn missing_field_is_a_render_error_in_strict_mode() {
        let mut engine = Engine::new();
        engine.add_template("t", "{{ nope }}").unwrap();
        let err = engine.render_to_string("t", page("x")).unwrap_err();
        assert!(matches!(err, TemplateError::Render { .. }), "got: {err}");
    }

    #[test]
    fn missing_field_is_empty_in_lenient_mode() {
        let mut engine = Engine::builder().strict_undefined(false).build().unwrap();
        engine.add_template("t", "[{{ nope }}]").unwrap();
        assert_eq!(engine.render_to_string("t", page("x")).unwrap(), "[]");
    }

    #[test]
    fn custom_delimiters_are_honoured() {
        let mut engine = Engine::builder().delimiters("[[", "]]").build().unwrap();
        engine
            .add_template("t", "{{ literal }} [[ title ]]")
            .unwrap();
        assert_eq!(
            engine.render_to_string("t", page("x")).unwrap(),
            "{{ literal }} x"
        );
    }

    #[test]
    fn empty_delimiters_are_rejected() {
        let err = Engine::builder().delimiters("", "]]").build().unwrap_err();
        assert!(matches!(err, TemplateError::Syntax(_)), "got: {err}");
    }

    #[test]
    fn function_failure_aborts_render() {
        let engine_fn = Value::from_function(|| -> Result<String, Error> {
            Err(Error::new(ErrorKind::InvalidOperation, "boom"))
        });
        let mut engine = Engine::builder()
            .function("explode", engine_fn)
            .build()
            .unwrap();
        engine
            .add_template("t", "before {{ explode() }} after")
            .unwrap();
        let err = engine.render_to_string("t", ()).unwrap_err();
        match err {
            TemplateError::Render { name, source } => {
                assert_eq!(name, "t");
                assert!(source.to_string().contains("boom"));
            }
            other => panic!("expected render error, got {other}"),
        }
    }

    #[test]
    fn render_streams_output_written_before_failure() {
        let explode = Value::from_function(|| -> Result<String, Error> {
            Err(Error::new(ErrorKind::InvalidOperation, "boom"))
        });
        let mut engine = Engine::builder()
            .function("explode", explode)
            .build()
            .unwrap();
        engine
            .add_template("t", "kept {{ explode() }} lost")
            .unwrap();

        let mut out = Vec::new();
        let err = engine.render(&mut out, "t", ()).unwrap_err();
        assert!(matches!(err, TemplateError::Render { .. }), "got: {err}");
        assert_eq!(out, b"kept ");
    }

    #[test]
    fn trailing_newline_is_kept() {
        let mut engine = Engine::new();
        engine.add_template("t", "line\n").unwrap();
        assert_eq!(engine.render_to_string("t", ()).unwrap(), "line\n");
    }

    #[test]
    fn load_virtual_registers_matching_files_only() {
        let fs = MemoryFs::from_entries(&[
            ("index.html", "index"),
            ("mail/welcome.jinja", "welcome"),
            ("readme.txt", "readme"),
        ]);
        let mut engine = Engine::new();
        assert_eq!(engine.load_virtual(&fs, ".").unwrap(), 2);
        assert_eq!(
            engine.template_names().collect::<Vec<_>>(),
            vec!["index", "mail/welcome"]
        );
    }

    #[test]
    fn load_virtual_parse_error_keeps_earlier_entries() {
        let fs = MemoryFs::from_entries(&[
            ("a.html", "fine"),
            ("b.html", "{% for %}"),
            ("c.html", "never reached"),
        ]);
        let mut engine = Engine::new();
        let err = engine.load_virtual(&fs, ".").unwrap_err();
        match &err {
            TemplateError::Parse { name, path, .. } => {
                assert_eq!(name, "b");
                assert_eq!(path.as_deref(), Some(Path::new("b.html")));
            }
            other => panic!("expected parse error, got {other}"),
        }
        assert!(engine.has_template("a"));
        assert!(!engine.has_template("c"));
    }
}
