//! Locates package directories under the project root.
//!
//! A package is named either by a single directory name (`controllers`) or by a path
//! relative to some directory in the tree (`app/controllers`). The search starts at a
//! directory, looks at it and below it depth-first, then moves outward one parent at a
//! time without ever leaving the project root.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Directory names never searched, in addition to any hidden directory.
pub const IGNORED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    ".vscode",
    ".idea",
];

pub struct PathResolver {
    project_root: PathBuf,
    visited: HashSet<PathBuf>,
}

impl PathResolver {
    /// The root is canonicalised so the boundary check compares like with like.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: normalize(&project_root.into()),
            visited: HashSet::new(),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Find the directory named by `target`, starting at `from` (default: the project root).
    ///
    /// Relative `from` paths are taken relative to the project root. Returns `None` when the
    /// target does not exist within the root, or when `from` lies outside it. Filesystem
    /// errors are treated as the probed path being absent.
    ///
    /// Each call explores the tree afresh; only the recursion below it shares visited state.
    pub fn resolve(&mut self, target: &str, from: Option<&Path>) -> Option<PathBuf> {
        self.visited.clear();
        let start = match from {
            Some(dir) => normalize(&self.project_root.join(dir)),
            None => self.project_root.clone(),
        };

        let target = target.trim_matches('/');
        if target.is_empty() {
            return None;
        }

        let found = self.search(target, start);
        match &found {
            Some(path) => tracing::debug!("Resolved '{}' to {}", target, path.display()),
            None => tracing::debug!(
                "'{}' not found under {}",
                target,
                self.project_root.display()
            ),
        }
        found
    }

    fn search(&mut self, target: &str, dir: PathBuf) -> Option<PathBuf> {
        if !dir.starts_with(&self.project_root) {
            return None;
        }
        if !self.visited.insert(dir.clone()) {
            return None;
        }

        let composed = target.contains('/');

        if !composed && dir.file_name().is_some_and(|name| name == target) {
            return Some(dir);
        }

        if composed {
            let candidate = normalize(&dir.join(target));
            if candidate.starts_with(&self.project_root) && is_dir(&candidate) {
                return Some(candidate);
            }
        }

        let children = subdirectories(&dir);

        if !composed {
            if let Some(hit) = children
                .iter()
                .find(|child| child.file_name().is_some_and(|name| name == target))
            {
                return Some(hit.clone());
            }
        }

        for child in children {
            if let Some(found) = self.search(target, child) {
                return Some(found);
            }
        }

        match dir.parent() {
            Some(parent) if parent.starts_with(&self.project_root) => {
                self.search(target, parent.to_path_buf())
            }
            _ => None,
        }
    }
}

/// Canonical form of `path`, or its lexically cleaned form when it does not exist.
fn normalize(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| lexical_clean(path))
}

fn lexical_clean(path: &Path) -> PathBuf {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other),
        }
    }
    clean
}

fn is_dir(path: &Path) -> bool {
    fs::metadata(path).map(|meta| meta.is_dir()).unwrap_or(false)
}

fn is_ignored(name: &str) -> bool {
    name.starts_with('.') || IGNORED_DIRS.contains(&name)
}

/// Searchable child directories of `dir`, sorted by name. Symlinks are not followed.
fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut children: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter(|entry| !is_ignored(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect();
    children.sort();
    children
}
