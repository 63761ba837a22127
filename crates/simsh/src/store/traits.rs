//! Node store trait definitions

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path;

/// Size reported for every directory.
pub const DIRECTORY_SIZE: u64 = 4096;

/// Default permissions for new directories.
pub const DIRECTORY_PERMISSIONS: &str = "drwxr-xr-x";

/// Default permissions for new files.
pub const FILE_PERMISSIONS: &str = "-rw-r--r--";

/// Default permissions for executables produced by compilers.
pub const EXECUTABLE_PERMISSIONS: &str = "-rwxr-xr-x";

/// Async store of path-keyed nodes.
///
/// All paths are absolute and normalized. Parent/child relations are
/// derived from the paths themselves: nothing stores a reference to its
/// parent.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Look up a node.
    async fn get(&self, path: &str) -> Option<Node>;

    /// Check if a node exists.
    async fn exists(&self, path: &str) -> bool;

    /// Direct children of a directory, in creation order.
    async fn list_children(&self, dir: &str) -> Vec<Node>;

    /// Every node strictly below `dir`, in path order.
    async fn descendants(&self, dir: &str) -> Vec<Node>;

    /// Create a node.
    ///
    /// Fails with `AlreadyExists` if the path is occupied and with
    /// `NotFound`/`NotADirectory` if the derived parent is not a directory.
    async fn create(&self, node: NewNode) -> Result<Node>;

    /// Create a file, or overwrite an existing file in place.
    ///
    /// Overwriting keeps the node's id and creation time.
    async fn upsert(&self, node: NewNode) -> Result<Node>;

    /// Merge a patch into an existing node, refreshing `updated_at`.
    async fn update(&self, path: &str, patch: NodePatch) -> Result<Node>;

    /// Remove a node and everything below it. `/` is never removed.
    async fn delete(&self, path: &str) -> bool;

    /// Move a node and its subtree to a new path.
    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Number of nodes, root included.
    async fn len(&self) -> usize;
}

/// Node type. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

impl NodeKind {
    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File)
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory)
    }
}

/// One entry of the namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique, monotonically increasing identifier.
    pub id: u64,
    pub path: String,
    /// Final path segment.
    pub name: String,
    pub kind: NodeKind,
    /// `Some` iff `kind` is `File`.
    pub content: Option<String>,
    /// Unix-style permission string, e.g. `-rw-r--r--`. Cosmetic.
    pub permissions: String,
    /// Byte count; directories always report 4096.
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Hidden nodes start with a dot.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }

    /// File content, empty for directories.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// A node about to be created; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNode {
    pub path: String,
    pub kind: NodeKind,
    pub content: Option<String>,
    pub permissions: String,
}

impl NewNode {
    /// A directory with default permissions.
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path::normalize(&path.into()),
            kind: NodeKind::Directory,
            content: None,
            permissions: DIRECTORY_PERMISSIONS.to_string(),
        }
    }

    /// A file with default permissions.
    pub fn file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path::normalize(&path.into()),
            kind: NodeKind::File,
            content: Some(content.into()),
            permissions: FILE_PERMISSIONS.to_string(),
        }
    }

    /// Override the permission string.
    pub fn permissions(mut self, permissions: impl Into<String>) -> Self {
        self.permissions = permissions.into();
        self
    }

    /// Size this node will report once stored.
    pub fn size(&self) -> u64 {
        match self.kind {
            NodeKind::Directory => DIRECTORY_SIZE,
            NodeKind::File => self.content.as_ref().map_or(0, |c| c.len() as u64),
        }
    }
}

/// Partial update for [`NodeStore::update`]. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePatch {
    /// New content; ignored for directories.
    pub content: Option<String>,
    pub permissions: Option<String>,
}

impl NodePatch {
    /// Patch that only refreshes `updated_at`.
    pub fn touch() -> Self {
        Self::default()
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn permissions(permissions: impl Into<String>) -> Self {
        Self {
            permissions: Some(permissions.into()),
            ..Self::default()
        }
    }
}
