//! Local naming: sanitizer, path builder and collision claims
//!
//! Remote names may contain anything, including characters that are illegal
//! on Windows filesystems or awkward in shells. This module turns them into
//! stable local paths.
//!
//! ## Design Notes
//!
//! - [`sanitize_name`] is pure and deterministic, so an unchanged remote name
//!   always maps to the same local name across runs.
//! - The path bound cuts the leaf first and, if needed, every component below
//!   the sync root; segments are never dropped, so the directory structure is
//!   preserved.
//! - Sanitization is lossy and two remote items can collide on one local
//!   name. [`PathClaims`] disambiguates within a run; the ledger keeps the
//!   path each item was written to so the outcome carries over to later
//!   runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::item::RemoteItem;
use super::mime::normalize_extension;
use super::newtypes::RemoteId;

/// Default maximum length of a sanitized name, in characters
pub const DEFAULT_MAX_NAME_LENGTH: usize = 50;
/// Default maximum length of a full local path, in characters
pub const DEFAULT_MAX_PATH_LENGTH: usize = 250;
/// Length each component is cut to once a path exceeds the maximum
pub const DEFAULT_COMPONENT_LIMIT: usize = 30;

const RESERVED: &[char] = &[
    '<', '>', ':', '"', '/', '\\', '|', '?', '*', '(', ')', ',', '&', ';',
];

/// Sanitize a remote name with the default length limit
pub fn sanitize_name(raw: &str) -> String {
    sanitize_name_with_limit(raw, DEFAULT_MAX_NAME_LENGTH)
}

/// Strip reserved and control characters, collapse whitespace, and cut to
/// `max_len` characters
pub fn sanitize_name_with_limit(raw: &str, max_len: usize) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !RESERVED.contains(c))
        .filter(|c| c.is_whitespace() || !c.is_control())
        .collect();

    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(max_len).collect();
    truncated.trim_end().to_string()
}

/// Cut `name` to `limit` characters, keeping its extension when it fits
fn truncate_component(name: &str, limit: usize, keep_extension: bool) -> String {
    if name.chars().count() <= limit {
        return name.to_string();
    }

    if keep_extension {
        if let Some(dot) = name.rfind('.') {
            let ext = &name[dot..];
            let ext_len = ext.chars().count();
            if dot > 0 && ext_len < limit {
                let stem: String = name[..dot].chars().take(limit - ext_len).collect();
                return format!("{stem}{ext}");
            }
        }
    }

    name.chars().take(limit).collect()
}

/// Builds bounded, filesystem-safe local paths below a sync root
#[derive(Debug, Clone)]
pub struct LocalPathBuilder {
    root: PathBuf,
    max_name_length: usize,
    max_path_length: usize,
    component_limit: usize,
}

impl LocalPathBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            component_limit: DEFAULT_COMPONENT_LIMIT,
        }
    }

    /// Override the naming limits
    pub fn with_limits(
        mut self,
        max_name_length: usize,
        max_path_length: usize,
        component_limit: usize,
    ) -> Self {
        self.max_name_length = max_name_length;
        self.max_path_length = max_path_length;
        self.component_limit = component_limit;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local directory for a remote folder below `parent`
    pub fn folder_path(&self, parent: &Path, item: &RemoteItem) -> PathBuf {
        let name = self.local_name(item);
        self.bound(parent.join(name), false)
    }

    /// Local file path for a remote file below `parent`, extension included
    pub fn file_path(&self, parent: &Path, item: &RemoteItem) -> PathBuf {
        let name = normalize_extension(&self.local_name(item), item.mime.extension());
        self.bound(parent.join(name), true)
    }

    /// Sanitized name, falling back to the remote id when nothing usable remains
    fn local_name(&self, item: &RemoteItem) -> String {
        let name = sanitize_name_with_limit(&item.name, self.max_name_length);
        match name.as_str() {
            "" | "." | ".." => item.id.to_string(),
            _ => name,
        }
    }

    /// Enforce the maximum path length
    ///
    /// Paths within the limit are returned untouched. Otherwise the leaf is
    /// cut to the component limit first (keeping its extension when
    /// `leaf_is_file` is set), so the item stays in the directory its parent
    /// already resolved to. Only when that is still too long is every
    /// component below the root cut as well; the item then lives in a
    /// shortened copy of its ancestry and writes create those directories.
    /// Paths outside the root are left alone.
    pub fn bound(&self, path: PathBuf, leaf_is_file: bool) -> PathBuf {
        if self.fits(&path) {
            return path;
        }

        let Ok(relative) = path.strip_prefix(&self.root) else {
            return path;
        };

        let components: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let Some(leaf) = components.last() else {
            return path;
        };
        let last = components.len() - 1;

        let leaf_only = path.with_file_name(truncate_component(
            leaf,
            self.component_limit,
            leaf_is_file,
        ));
        if self.fits(&leaf_only) {
            return leaf_only;
        }

        let mut bounded = self.root.clone();
        for (i, component) in components.iter().enumerate() {
            let keep_extension = leaf_is_file && i == last;
            bounded.push(truncate_component(
                component,
                self.component_limit,
                keep_extension,
            ));
        }
        bounded
    }

    fn fits(&self, path: &Path) -> bool {
        path.to_string_lossy().chars().count() <= self.max_path_length
    }
}

/// Record of which remote id owns each local file path during a run
#[derive(Debug, Default)]
pub struct PathClaims {
    owners: HashMap<PathBuf, RemoteId>,
}

impl PathClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `path` for `id`, returning the path the item should actually use
    ///
    /// The first id to claim a path keeps it. A different id asking for the
    /// same path gets `_<first 8 chars of id>` inserted before the extension.
    pub fn claim(&mut self, path: PathBuf, id: &RemoteId) -> PathBuf {
        match self.owners.get(&path) {
            None => {
                self.owners.insert(path.clone(), id.clone());
                path
            }
            Some(owner) if owner == id => path,
            Some(_) => {
                let disambiguated = Self::disambiguate(&path, id);
                self.owners.insert(disambiguated.clone(), id.clone());
                disambiguated
            }
        }
    }

    /// Claim exactly `path` for `id`
    ///
    /// Returns false, leaving the claims unchanged, when another id already
    /// owns the path.
    pub fn reserve(&mut self, path: PathBuf, id: &RemoteId) -> bool {
        match self.owners.get(&path) {
            Some(owner) => owner == id,
            None => {
                self.owners.insert(path, id.clone());
                true
            }
        }
    }

    /// The path [`claim`](Self::claim) hands `id` when `path` is taken
    pub fn disambiguate(path: &Path, id: &RemoteId) -> PathBuf {
        with_suffix(path, id.short())
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let new_name = match file_name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}_{suffix}{}", &file_name[..dot], &file_name[dot..]),
        _ => format!("{file_name}_{suffix}"),
    };
    path.with_file_name(new_name)
}
