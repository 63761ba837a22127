//! Virtual namespace for Simsh
//!
//! Provides the async [`NodeStore`] trait and [`InMemoryStore`], a
//! lock-guarded map from absolute path to [`Node`].

mod memory;
mod traits;

pub use memory::InMemoryStore;
pub use traits::{EXECUTABLE_PERMISSIONS, NewNode, Node, NodeKind, NodePatch, NodeStore};
