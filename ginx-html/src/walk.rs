//! Deterministic, lazy depth-first traversal of template trees.
//!
//! [`walk_dir`] walks the host filesystem and [`walk_virtual`] walks any
//! [`VirtualFs`]. Both yield a directory before its children and visit the
//! children of every directory in lexical (byte-wise) name order, so repeated
//! runs over the same tree produce the same sequence.
//!
//! Host symlinks below the root are reported as non-directory entries and
//! never descended into, so self-referential trees terminate. The first I/O
//! failure is yielded as [`TemplateError::FileSystem`] and ends the walk.

use std::path::{Path, PathBuf};

use crate::error::{fs_err, TemplateError};
use crate::vfs::VirtualFs;

/// A path produced by a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry<P> {
    pub path: P,
    pub is_dir: bool,
}

/// Source of directory listings for [`Walk`].
pub trait Tree {
    type Path: Clone;

    /// Whether `path` is a directory; errors when it cannot be inspected.
    fn root_is_dir(&self, path: &Self::Path) -> Result<bool, TemplateError>;

    /// Children of `dir` as `(path, is_dir)`, sorted by name.
    fn children(&self, dir: &Self::Path) -> Result<Vec<WalkEntry<Self::Path>>, TemplateError>;

    /// Contents of the file at `path`.
    fn read_to_string(&self, path: &Self::Path) -> Result<String, TemplateError>;

    /// `/`-separated rendering of `path`, used for name derivation.
    fn slash_path(path: &Self::Path) -> String;

    /// `path` as reported in errors.
    fn error_path(path: &Self::Path) -> PathBuf;
}

/// Lazy iterator over every entry under a root.
pub struct Walk<T: Tree> {
    tree: T,
    root: Option<T::Path>,
    stack: Vec<WalkEntry<T::Path>>,
    done: bool,
}

impl<T: Tree> Walk<T> {
    pub fn new(tree: T, root: T::Path) -> Self {
        Walk {
            tree,
            root: Some(root),
            stack: Vec::new(),
            done: false,
        }
    }

    /// The tree being walked.
    pub fn tree(&self) -> &T {
        &self.tree
    }

    fn fail(&mut self, err: TemplateError) -> Option<Result<WalkEntry<T::Path>, TemplateError>> {
        self.done = true;
        self.stack.clear();
        Some(Err(err))
    }
}

impl<T: Tree> Iterator for Walk<T> {
    type Item = Result<WalkEntry<T::Path>, TemplateError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(root) = self.root.take() {
            match self.tree.root_is_dir(&root) {
                Ok(is_dir) => self.stack.push(WalkEntry { path: root, is_dir }),
                Err(err) => return self.fail(err),
            }
        }

        let Some(entry) = self.stack.pop() else {
            self.done = true;
            return None;
        };

        if entry.is_dir {
            match self.tree.children(&entry.path) {
                // Reversed so the lexically first child is popped first.
                Ok(children) => self.stack.extend(children.into_iter().rev()),
                Err(err) => return self.fail(err),
            }
        }
        Some(Ok(entry))
    }
}

// ---------------------------------------------------------------------------
// Host filesystem
// ---------------------------------------------------------------------------

/// [`Tree`] over the host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostTree;

impl Tree for HostTree {
    type Path = PathBuf;

    fn root_is_dir(&self, path: &PathBuf) -> Result<bool, TemplateError> {
        // The root may itself be a symlink; only children are never followed.
        let meta = std::fs::metadata(path).map_err(|e| fs_err(path, e))?;
        Ok(meta.is_dir())
    }

    fn children(&self, dir: &PathBuf) -> Result<Vec<WalkEntry<PathBuf>>, TemplateError> {
        let mut children = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| fs_err(dir, e))? {
            let entry = entry.map_err(|e| fs_err(dir, e))?;
            let path = entry.path();
            // file_type() does not follow symlinks.
            let file_type = entry.file_type().map_err(|e| fs_err(&path, e))?;
            children.push((
                entry.file_name(),
                WalkEntry {
                    path,
                    is_dir: file_type.is_dir(),
                },
            ));
        }
        children.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(children.into_iter().map(|(_, e)| e).collect())
    }

    fn read_to_string(&self, path: &PathBuf) -> Result<String, TemplateError> {
        std::fs::read_to_string(path).map_err(|e| fs_err(path, e))
    }

    fn slash_path(path: &PathBuf) -> String {
        crate::path::to_slash(&path.to_string_lossy())
    }

    fn error_path(path: &PathBuf) -> PathBuf {
        path.clone()
    }
}

/// Walk the host filesystem under `root`.
pub fn walk_dir(root: impl AsRef<Path>) -> Walk<HostTree> {
    Walk::new(HostTree, root.as_ref().to_path_buf())
}

// ---------------------------------------------------------------------------
// Virtual filesystem
// ---------------------------------------------------------------------------

/// [`Tree`] over a [`VirtualFs`].
#[derive(Debug, Clone, Copy)]
pub struct VirtualTree<'a, F: ?Sized> {
    fs: &'a F,
}

impl<'a, F: VirtualFs + ?Sized> VirtualTree<'a, F> {
    pub fn new(fs: &'a F) -> Self {
        VirtualTree { fs }
    }
}

impl<F: VirtualFs + ?Sized> Tree for VirtualTree<'_, F> {
    type Path = String;

    fn root_is_dir(&self, path: &String) -> Result<bool, TemplateError> {
        self.fs.is_dir(path).map_err(|e| fs_err(path, e))
    }

    fn children(&self, dir: &String) -> Result<Vec<WalkEntry<String>>, TemplateError> {
        let mut entries = self.fs.read_dir(dir).map_err(|e| fs_err(dir, e))?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries
            .into_iter()
            .map(|e| WalkEntry {
                path: join_virtual(dir, &e.name),
                is_dir: e.is_dir,
            })
            .collect())
    }

    fn read_to_string(&self, path: &String) -> Result<String, TemplateError> {
        self.fs.read_to_string(path).map_err(|e| fs_err(path, e))
    }

    fn slash_path(path: &String) -> String {
        crate::path::to_slash(path)
    }

    fn error_path(path: &String) -> PathBuf {
        PathBuf::from(path)
    }
}

/// Walk a virtual tree under `root` (`"."` for the whole tree).
pub fn walk_virtual<'a, F: VirtualFs + ?Sized>(
    fs: &'a F,
    root: &str,
) -> Walk<VirtualTree<'a, F>> {
    Walk::new(VirtualTree::new(fs), root.to_string())
}

fn join_virtual(dir: &str, name: &str) -> String {
    match dir.trim_end_matches('/') {
        "" | "." => name.to_string(),
        dir => format!("{dir}/{name}"),
    }
}
