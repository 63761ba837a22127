//! In-memory node store implementation

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::traits::{NewNode, Node, NodeKind, NodePatch, NodeStore};
use crate::error::{Error, Result};
use crate::limits::StoreLimits;
use crate::path;

const BASHRC: &str = "\
# ~/.bashrc: executed by bash(1) for non-login shells.

# If not running interactively, don't do anything
case $- in
    *i*) ;;
      *) return;;
esac

HISTCONTROL=ignoreboth
HISTSIZE=1000
HISTFILESIZE=2000

PS1='\\u@\\h:\\w\\$ '

alias ll='ls -l'
alias la='ls -a'
";

const PROFILE: &str = "\
# ~/.profile: executed by the command interpreter for login shells.

if [ -n \"$BASH_VERSION\" ]; then
    if [ -f \"$HOME/.bashrc\" ]; then
        . \"$HOME/.bashrc\"
    fi
fi

if [ -d \"$HOME/bin\" ] ; then
    PATH=\"$HOME/bin:$PATH\"
fi
";

const BASH_LOGOUT: &str = "\
# ~/.bash_logout: executed by bash(1) when login shell exits.

if [ \"$SHLVL\" = 1 ]; then
    [ -x /usr/bin/clear_console ] && /usr/bin/clear_console -q
fi
";

/// In-memory node store.
///
/// One `RwLock` guards the whole namespace: reads run concurrently, every
/// mutation holds the write lock for its full check-then-write sequence.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    limits: StoreLimits,
}

struct Inner {
    nodes: HashMap<String, Node>,
    next_id: u64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create a store seeded with the bootstrap namespace.
    pub fn new() -> Self {
        Self::with_limits(StoreLimits::default())
    }

    /// Create a seeded store with custom limits.
    ///
    /// Bootstrap nodes are inserted without limit checks.
    pub fn with_limits(limits: StoreLimits) -> Self {
        let mut inner = Inner {
            nodes: HashMap::new(),
            next_id: 1,
        };

        for dir in [
            "/",
            "/home",
            path::HOME,
            "/home/user/Documents",
            "/home/user/Projects",
        ] {
            inner.insert(NewNode::directory(dir));
        }

        for (name, content) in [
            (".bashrc", BASHRC),
            (".profile", PROFILE),
            (".bash_logout", BASH_LOGOUT),
        ] {
            inner.insert(NewNode::file(path::join(path::HOME, name), content));
        }

        Self {
            inner: RwLock::new(inner),
            limits,
        }
    }

    /// Limits this store enforces.
    pub fn limits(&self) -> &StoreLimits {
        &self.limits
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_new(&self, inner: &Inner, node: &NewNode) -> Result<()> {
        inner.check_parent(&node.path)?;
        self.limits.validate_path(&node.path)?;
        self.limits.check_node_count(inner.nodes.len(), 1)?;
        self.limits.check_file_size(node.size())?;
        Ok(())
    }
}

impl Inner {
    fn insert(&mut self, node: NewNode) -> Node {
        let now = Utc::now();
        let stored = Node {
            id: self.next_id,
            name: path::file_name(&node.path).to_string(),
            size: node.size(),
            path: node.path,
            kind: node.kind,
            content: match node.kind {
                NodeKind::File => Some(node.content.unwrap_or_default()),
                NodeKind::Directory => None,
            },
            permissions: node.permissions,
            created_at: now,
            updated_at: now,
        };
        self.next_id += 1;
        self.nodes.insert(stored.path.clone(), stored.clone());
        stored
    }

    fn check_parent(&self, path: &str) -> Result<()> {
        let Some(parent) = path::parent(path) else {
            return Err(Error::AlreadyExists(path.to_string()));
        };
        match self.nodes.get(parent) {
            Some(node) if node.is_dir() => Ok(()),
            Some(_) => Err(Error::NotADirectory(path.to_string())),
            None => Err(Error::NotFound(path.to_string())),
        }
    }
}

#[async_trait]
impl NodeStore for InMemoryStore {
    async fn get(&self, path: &str) -> Option<Node> {
        self.read().nodes.get(path).cloned()
    }

    async fn exists(&self, path: &str) -> bool {
        self.read().nodes.contains_key(path)
    }

    async fn list_children(&self, dir: &str) -> Vec<Node> {
        let dir = path::normalize(dir);
        let inner = self.read();
        let mut children: Vec<Node> = inner
            .nodes
            .values()
            .filter(|n| n.path != dir && path::parent(&n.path) == Some(dir.as_str()))
            .cloned()
            .collect();
        children.sort_by_key(|n| n.id);
        children
    }

    async fn descendants(&self, dir: &str) -> Vec<Node> {
        let inner = self.read();
        let mut found: Vec<Node> = inner
            .nodes
            .values()
            .filter(|n| path::is_descendant(&n.path, dir))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.path.cmp(&b.path));
        found
    }

    async fn create(&self, node: NewNode) -> Result<Node> {
        let mut inner = self.write();
        if inner.nodes.contains_key(&node.path) {
            return Err(Error::AlreadyExists(node.path));
        }
        self.check_new(&inner, &node)?;
        Ok(inner.insert(node))
    }

    async fn upsert(&self, node: NewNode) -> Result<Node> {
        let mut inner = self.write();
        if !inner.nodes.contains_key(&node.path) {
            self.check_new(&inner, &node)?;
            return Ok(inner.insert(node));
        }

        let existing = inner
            .nodes
            .get_mut(&node.path)
            .ok_or_else(|| Error::NotFound(node.path.clone()))?;
        match (existing.kind, node.kind) {
            (NodeKind::File, NodeKind::File) => {
                let size = node.size();
                self.limits.check_file_size(size)?;
                existing.content = node.content.or_else(|| Some(String::new()));
                existing.size = size;
            }
            (NodeKind::Directory, NodeKind::Directory) => {}
            (NodeKind::Directory, NodeKind::File) => {
                return Err(Error::IsADirectory(node.path));
            }
            (NodeKind::File, NodeKind::Directory) => {
                return Err(Error::AlreadyExists(node.path));
            }
        }
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn update(&self, path: &str, patch: NodePatch) -> Result<Node> {
        let mut inner = self.write();
        let node = inner
            .nodes
            .get_mut(path)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;

        if let Some(content) = patch.content {
            if node.is_file() {
                let size = content.len() as u64;
                self.limits.check_file_size(size)?;
                node.size = size;
                node.content = Some(content);
            }
        }
        if let Some(permissions) = patch.permissions {
            node.permissions = permissions;
        }
        node.updated_at = Utc::now();
        Ok(node.clone())
    }

    async fn delete(&self, path: &str) -> bool {
        if path == "/" {
            return false;
        }
        let mut inner = self.write();
        if inner.nodes.remove(path).is_none() {
            return false;
        }
        inner.nodes.retain(|p, _| !path::is_descendant(p, path));
        true
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Ok(());
        }
        let mut inner = self.write();

        let source_kind = match inner.nodes.get(from) {
            Some(node) if from != "/" => node.kind,
            Some(_) => return Err(Error::Unsupported(format!("cannot move '{}'", from))),
            None => return Err(Error::NotFound(from.to_string())),
        };
        if path::is_descendant(to, from) {
            return Err(Error::Unsupported(format!(
                "cannot move '{}' to a subdirectory of itself, '{}'",
                from, to
            )));
        }
        inner.check_parent(to)?;

        let mut replaced = false;
        if let Some(target) = inner.nodes.get(to) {
            match (source_kind, target.kind) {
                (_, NodeKind::Directory) => return Err(Error::IsADirectory(to.to_string())),
                (NodeKind::Directory, NodeKind::File) => {
                    return Err(Error::NotADirectory(to.to_string()));
                }
                (NodeKind::File, NodeKind::File) => replaced = true,
            }
        }

        let moving: Vec<String> = inner
            .nodes
            .keys()
            .filter(|p| p.as_str() == from || path::is_descendant(p, from))
            .cloned()
            .collect();
        for old in &moving {
            self.limits.validate_path(&path::rebase(old, from, to))?;
        }

        if replaced {
            inner.nodes.remove(to);
        }
        let now = Utc::now();
        for old in moving {
            if let Some(mut node) = inner.nodes.remove(&old) {
                node.path = path::rebase(&old, from, to);
                node.name = path::file_name(&node.path).to_string();
                if old == from {
                    node.updated_at = now;
                }
                inner.nodes.insert(node.path.clone(), node);
            }
        }
        Ok(())
    }

    async fn len(&self) -> usize {
        self.read().nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::LimitExceeded;

    #[tokio::test]
    async fn test_bootstrap_namespace() {
        let store = InMemoryStore::new();

        for dir in [
            "/",
            "/home",
            "/home/user",
            "/home/user/Documents",
            "/home/user/Projects",
        ] {
            let node = store.get(dir).await.unwrap();
            assert!(node.is_dir(), "{} should be a directory", dir);
            assert_eq!(node.size, 4096);
            assert_eq!(node.content, None);
        }
        for file in [".bashrc", ".profile", ".bash_logout"] {
            let node = store.get(&format!("/home/user/{}", file)).await.unwrap();
            assert!(node.is_file());
            assert_eq!(node.size, node.text().len() as u64);
        }
        assert_eq!(store.len().await, 8);
    }

    #[tokio::test]
    async fn test_create_and_list_children() {
        let store = InMemoryStore::new();
        store
            .create(NewNode::directory("/home/user/proj"))
            .await
            .unwrap();
        store
            .create(NewNode::file("/home/user/proj/b.txt", "b"))
            .await
            .unwrap();
        store
            .create(NewNode::file("/home/user/proj/a.txt", "a"))
            .await
            .unwrap();

        let names: Vec<String> = store
            .list_children("/home/user/proj")
            .await
            .into_iter()
            .map(|n| n.name)
            .collect();
        // Creation order, not name order
        assert_eq!(names, vec!["b.txt", "a.txt"]);
    }

    #[tokio::test]
    async fn test_list_children_excludes_grandchildren() {
        let store = InMemoryStore::new();
        let names: Vec<String> = store
            .list_children("/home")
            .await
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(names, vec!["user"]);

        let root: Vec<String> = store
            .list_children("/")
            .await
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(root, vec!["home"]);
    }

    #[tokio::test]
    async fn test_create_existing_fails() {
        let store = InMemoryStore::new();
        let err = store
            .create(NewNode::directory("/home/user"))
            .await
            .unwrap_err();
        assert_eq!(err, Error::AlreadyExists("/home/user".into()));
    }

    #[tokio::test]
    async fn test_create_missing_parent_fails() {
        let store = InMemoryStore::new();
        let err = store
            .create(NewNode::directory("/home/user/a/b"))
            .await
            .unwrap_err();
        assert_eq!(err, Error::NotFound("/home/user/a/b".into()));
    }

    #[tokio::test]
    async fn test_create_under_file_fails() {
        let store = InMemoryStore::new();
        let err = store
            .create(NewNode::file("/home/user/.bashrc/x", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = InMemoryStore::new();
        let a = store.create(NewNode::file("/a", "")).await.unwrap();
        let b = store.create(NewNode::file("/b", "")).await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_file_in_place() {
        let store = InMemoryStore::new();
        let first = store
            .upsert(NewNode::file("/home/user/out.txt", "one"))
            .await
            .unwrap();
        store
            .update("/home/user/out.txt", NodePatch::permissions("-rwx------"))
            .await
            .unwrap();
        let second = store
            .upsert(NewNode::file("/home/user/out.txt", "three"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.text(), "three");
        assert_eq!(second.size, 5);
        assert_eq!(second.permissions, "-rwx------");
    }

    #[tokio::test]
    async fn test_upsert_file_over_directory_fails() {
        let store = InMemoryStore::new();
        let err = store
            .upsert(NewNode::file("/home/user/Documents", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::IsADirectory(_)));
    }

    #[tokio::test]
    async fn test_update_merges_and_refreshes() {
        let store = InMemoryStore::new();
        let before = store.get("/home/user/.profile").await.unwrap();
        let after = store
            .update("/home/user/.profile", NodePatch::content("x=1"))
            .await
            .unwrap();
        assert_eq!(after.text(), "x=1");
        assert_eq!(after.size, 3);
        assert_eq!(after.permissions, before.permissions);
        assert!(after.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing() {
        let store = InMemoryStore::new();
        let err = store
            .update("/nope", NodePatch::touch())
            .await
            .unwrap_err();
        assert_eq!(err, Error::NotFound("/nope".into()));
    }

    #[tokio::test]
    async fn test_update_content_on_directory_ignored() {
        let store = InMemoryStore::new();
        let node = store
            .update("/home", NodePatch::content("data"))
            .await
            .unwrap();
        assert_eq!(node.content, None);
        assert_eq!(node.size, 4096);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let store = InMemoryStore::new();
        assert!(store.delete("/home/user").await);
        assert!(!store.exists("/home/user").await);
        assert!(!store.exists("/home/user/.bashrc").await);
        assert!(!store.exists("/home/user/Documents").await);
        assert!(store.exists("/home").await);
    }

    #[tokio::test]
    async fn test_delete_root_refused() {
        let store = InMemoryStore::new();
        assert!(!store.delete("/").await);
        assert!(store.exists("/").await);
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let store = InMemoryStore::new();
        assert!(!store.delete("/missing").await);
    }

    #[tokio::test]
    async fn test_rename_moves_subtree() {
        let store = InMemoryStore::new();
        store
            .create(NewNode::file("/home/user/Documents/cv.txt", "cv"))
            .await
            .unwrap();
        store
            .rename("/home/user/Documents", "/home/user/Docs")
            .await
            .unwrap();

        assert!(!store.exists("/home/user/Documents").await);
        let moved = store.get("/home/user/Docs/cv.txt").await.unwrap();
        assert_eq!(moved.name, "cv.txt");
        assert_eq!(moved.text(), "cv");
        assert_eq!(store.get("/home/user/Docs").await.unwrap().name, "Docs");
    }

    #[tokio::test]
    async fn test_rename_into_itself_fails() {
        let store = InMemoryStore::new();
        let err = store
            .rename("/home/user", "/home/user/Documents/user")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_rename_overwrites_file() {
        let store = InMemoryStore::new();
        store.create(NewNode::file("/a", "a")).await.unwrap();
        store.create(NewNode::file("/b", "b")).await.unwrap();
        store.rename("/a", "/b").await.unwrap();
        assert!(!store.exists("/a").await);
        assert_eq!(store.get("/b").await.unwrap().text(), "a");
    }

    #[tokio::test]
    async fn test_node_count_limit() {
        let store = InMemoryStore::with_limits(StoreLimits::new().max_node_count(9));
        store.create(NewNode::file("/one", "")).await.unwrap();
        let err = store.create(NewNode::file("/two", "")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::LimitExceeded(LimitExceeded::NodeCount { .. })
        ));
    }

    #[tokio::test]
    async fn test_file_size_limit() {
        let store = InMemoryStore::with_limits(StoreLimits::new().max_file_size(3));
        store.upsert(NewNode::file("/f", "abc")).await.unwrap();
        let err = store.upsert(NewNode::file("/f", "abcd")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::LimitExceeded(LimitExceeded::FileSize { .. })
        ));
        assert_eq!(store.get("/f").await.unwrap().text(), "abc");
    }

    #[tokio::test]
    async fn test_descendants_sorted_by_path() {
        let store = InMemoryStore::new();
        let paths: Vec<String> = store
            .descendants("/home/user")
            .await
            .into_iter()
            .map(|n| n.path)
            .collect();
        assert_eq!(
            paths,
            vec![
                "/home/user/.bash_logout",
                "/home/user/.bashrc",
                "/home/user/.profile",
                "/home/user/Documents",
                "/home/user/Projects",
            ]
        );
    }

    #[tokio::test]
    async fn test_node_serializes_for_transport() {
        let store = InMemoryStore::new();
        let node = store
            .create(NewNode::file("/home/user/a.txt", "hi"))
            .await
            .unwrap();

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["kind"], "file");
        assert_eq!(json["path"], "/home/user/a.txt");
        assert_eq!(
            json["createdAt"],
            serde_json::to_value(node.created_at).unwrap()
        );
        assert!(json["updatedAt"].is_string());

        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }
}
