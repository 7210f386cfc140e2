//! Path normalisation, extension matching, and canonical template names.
//!
//! A template's canonical name is its path relative to the load root, with
//! `/` separators and the matched extension removed:
//!
//! | root              | path                            | name        |
//! |-------------------|---------------------------------|-------------|
//! | `/srv/templates`  | `/srv/templates/index.html`     | `index`     |
//! | `/srv/templates`  | `/srv/templates/sub/page.html`  | `sub/page`  |
//! | `C:\tpl`          | `C:\tpl\sub\page.html`          | `sub/page`  |
//! | `.` (virtual)     | `mail/welcome.jinja`            | `mail/welcome` |
//!
//! Everything here is pure string manipulation; the host's separator
//! convention never changes the result.

use std::collections::BTreeSet;

/// Extensions recognised when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".html", ".jinja"];

/// Convert a platform path string to `/`-separated form.
///
/// Backslashes are always treated as separators and a trailing separator is
/// dropped unless the path is the filesystem root itself.
pub fn to_slash(path: &str) -> String {
    let mut out = path.replace('\\', "/");
    while out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

/// Final dotted extension of the last path segment, including the dot.
///
/// Hidden files whose only dot is the leading one (`.html`) have no
/// extension.
pub fn final_extension(path: &str) -> Option<&str> {
    let segment = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match segment.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(&segment[idx..]),
    }
}

/// Derive the canonical template name for `path` discovered under `root`.
///
/// `matched_extension` is the extension the [`ExtensionFilter`] accepted for
/// `path`. A `root` of `""` or `"."` denotes the top of a virtual tree and
/// strips nothing. When `root` is the file itself the base name is used.
pub fn derive_name(root: &str, path: &str, matched_extension: &str) -> String {
    let root = to_slash(root);
    let path = to_slash(path);

    let relative = match root.as_str() {
        "" | "." => path.as_str(),
        root => path.strip_prefix(root).unwrap_or(&path),
    };
    let relative = match relative.strip_prefix('/').unwrap_or(relative) {
        "" => path.rsplit('/').next().unwrap_or(&path),
        rel => rel,
    };
    relative
        .strip_suffix(matched_extension)
        .unwrap_or(relative)
        .to_string()
}

/// Set of file extensions that mark a file as a template source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: BTreeSet<String>,
}

impl ExtensionFilter {
    /// Build a filter from `extensions`; a missing leading dot is added.
    ///
    /// An empty list falls back to [`DEFAULT_EXTENSIONS`].
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set: BTreeSet<String> = extensions
            .into_iter()
            .map(|e| normalize_extension(e.as_ref()))
            .filter(|e| e.len() > 1)
            .collect();
        if set.is_empty() {
            set = DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect();
        }
        ExtensionFilter { extensions: set }
    }

    /// The matched extension when `path` is a template source.
    ///
    /// Matching is exact and case-sensitive.
    pub fn is_template<'p>(&self, path: &'p str) -> Option<&'p str> {
        final_extension(path)
            .filter(|ext| self.extensions.contains(*ext))
    }

    /// Configured extensions in sorted order.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        ExtensionFilter::new(DEFAULT_EXTENSIONS)
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim();
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}
