//! Virtual filesystem abstraction for embedded or in-memory template trees.
//!
//! Paths are `/`-separated and relative to the tree's top, which is named
//! `"."`. [`MemoryFs`] is the bundled implementation; it is typically built
//! from a table of `include_str!` entries baked into the binary:
//!
//! ```rust
//! use ginx_html::MemoryFs;
//!
//! const TPLS: &[(&str, &str)] = &[
//!     ("layouts/base.html", "<html>{% block body %}{% endblock %}</html>"),
//!     ("index.html", "{% extends \"layouts/base\" %}"),
//! ];
//!
//! let fs = MemoryFs::from_entries(TPLS);
//! assert!(fs.contains("layouts/base.html"));
//! ```

use std::collections::BTreeMap;
use std::io;

/// One child of a virtual directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VfsEntry {
    /// Base name of the entry (no separators).
    pub name: String,
    pub is_dir: bool,
}

/// Read-only directory tree that templates can be loaded from.
///
/// Implementations report a missing path with [`io::ErrorKind::NotFound`].
pub trait VirtualFs {
    /// Whether `path` is a directory. Errors when `path` does not exist.
    fn is_dir(&self, path: &str) -> io::Result<bool>;

    /// Children of the directory at `path`, in any order.
    fn read_dir(&self, path: &str) -> io::Result<Vec<VfsEntry>>;

    /// Full contents of the file at `path`.
    fn read_to_string(&self, path: &str) -> io::Result<String>;
}

impl<T: VirtualFs + ?Sized> VirtualFs for &T {
    fn is_dir(&self, path: &str) -> io::Result<bool> {
        (**self).is_dir(path)
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<VfsEntry>> {
        (**self).read_dir(path)
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        (**self).read_to_string(path)
    }
}

/// In-memory [`VirtualFs`]: a map of file paths to contents.
///
/// Directories are implied by the file paths; `"."` is always a directory.
/// When a path is both a file and the parent of other files (`a` and
/// `a/b.html`), it is listed and walked as a directory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: BTreeMap<String, String>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(path, contents)` pairs.
    pub fn from_entries(entries: &[(&str, &str)]) -> Self {
        let mut fs = Self::new();
        for (path, contents) in entries {
            fs.insert(*path, *contents);
        }
        fs
    }

    /// Add or replace the file at `path`.
    pub fn insert(&mut self, path: impl AsRef<str>, contents: impl Into<String>) {
        self.files.insert(clean(path.as_ref()), contents.into());
    }

    /// Whether a file exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&clean(path))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn dir_prefix(path: &str) -> String {
        match clean(path).as_str() {
            "" => String::new(),
            dir => format!("{dir}/"),
        }
    }
}

impl VirtualFs for MemoryFs {
    fn is_dir(&self, path: &str) -> io::Result<bool> {
        let path = clean(path);
        if path.is_empty() {
            return Ok(true);
        }
        let prefix = format!("{path}/");
        if self.files.keys().any(|k| k.starts_with(&prefix)) {
            return Ok(true);
        }
        if self.files.contains_key(&path) {
            return Ok(false);
        }
        Err(not_found(&path))
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<VfsEntry>> {
        if !self.is_dir(path)? {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("not a directory: {path}"),
            ));
        }
        let prefix = Self::dir_prefix(path);
        // name -> is_dir; a directory wins over a file of the same name.
        let mut seen: BTreeMap<&str, bool> = BTreeMap::new();
        for key in self.files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            let (name, is_dir) = match rest.split_once('/') {
                Some((dir, _)) => (dir, true),
                None => (rest, false),
            };
            *seen.entry(name).or_default() |= is_dir;
        }
        Ok(seen
            .into_iter()
            .map(|(name, is_dir)| VfsEntry {
                name: name.to_string(),
                is_dir,
            })
            .collect())
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        let path = clean(path);
        self.files
            .get(&path)
            .cloned()
            .ok_or_else(|| not_found(&path))
    }
}

/// Normalise a virtual path: `/` separators, no `./` prefix, no leading or
/// trailing slash. The tree root becomes `""`.
fn clean(path: &str) -> String {
    let path = crate::path::to_slash(path);
    path.split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {path}"),
    )
}
