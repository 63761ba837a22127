//! Store resource limits.
//!
//! These limits keep a session from growing the namespace without bound.
//! Every check runs inside the store's write lock, before the mutation.

use std::fmt;

/// Default maximum node count (files and directories): 10,000
pub const DEFAULT_MAX_NODE_COUNT: usize = 10_000;

/// Default maximum single file size: 1MB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_000_000;

/// Default maximum total path length: 4096 bytes
pub const DEFAULT_MAX_PATH_LENGTH: usize = 4096;

/// Default maximum name (single component) length: 255 bytes
pub const DEFAULT_MAX_NAME_LENGTH: usize = 255;

/// Store resource limits.
///
/// # Example
///
/// ```rust
/// use simsh::{Shell, StoreLimits};
///
/// let limits = StoreLimits::new()
///     .max_node_count(500)
///     .max_file_size(64 * 1024);
///
/// let shell = Shell::builder().limits(limits).build();
/// ```
///
/// # Default Limits
///
/// | Limit | Default |
/// |-------|---------|
/// | `max_node_count` | 10,000 |
/// | `max_file_size` | 1MB |
/// | `max_path_length` | 4096 |
/// | `max_name_length` | 255 |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLimits {
    /// Maximum number of nodes, root and bootstrap nodes included.
    pub max_node_count: usize,

    /// Maximum size of a single file's content in bytes.
    pub max_file_size: u64,

    /// Maximum total path length in bytes.
    pub max_path_length: usize,

    /// Maximum length of a single path component in bytes.
    pub max_name_length: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_node_count: DEFAULT_MAX_NODE_COUNT,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }
}

impl StoreLimits {
    /// Create new limits with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create unlimited limits (no restrictions).
    pub fn unlimited() -> Self {
        Self {
            max_node_count: usize::MAX,
            max_file_size: u64::MAX,
            max_path_length: usize::MAX,
            max_name_length: usize::MAX,
        }
    }

    /// Set maximum node count.
    pub fn max_node_count(mut self, count: usize) -> Self {
        self.max_node_count = count;
        self
    }

    /// Set maximum single file size.
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Set maximum total path length.
    pub fn max_path_length(mut self, len: usize) -> Self {
        self.max_path_length = len;
        self
    }

    /// Set maximum name length.
    pub fn max_name_length(mut self, len: usize) -> Self {
        self.max_name_length = len;
        self
    }

    /// Validate a normalized absolute path against length limits.
    pub fn validate_path(&self, path: &str) -> Result<(), LimitExceeded> {
        if path.len() > self.max_path_length {
            return Err(LimitExceeded::PathTooLong {
                length: path.len(),
                limit: self.max_path_length,
            });
        }
        for name in path.split('/').filter(|s| !s.is_empty()) {
            if name.len() > self.max_name_length {
                return Err(LimitExceeded::NameTooLong {
                    length: name.len(),
                    limit: self.max_name_length,
                });
            }
        }
        Ok(())
    }

    /// Check whether `additional` new nodes fit next to `current` ones.
    pub fn check_node_count(&self, current: usize, additional: usize) -> Result<(), LimitExceeded> {
        if current.saturating_add(additional) > self.max_node_count {
            return Err(LimitExceeded::NodeCount {
                current,
                limit: self.max_node_count,
            });
        }
        Ok(())
    }

    /// Check a file content size.
    pub fn check_file_size(&self, size: u64) -> Result<(), LimitExceeded> {
        if size > self.max_file_size {
            return Err(LimitExceeded::FileSize {
                size,
                limit: self.max_file_size,
            });
        }
        Ok(())
    }
}

/// A store limit was exceeded.
///
/// Display text is what a shell would print after the operand, e.g.
/// `touch: cannot touch 'x': No space left on device`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitExceeded {
    NodeCount { current: usize, limit: usize },
    FileSize { size: u64, limit: u64 },
    PathTooLong { length: usize, limit: usize },
    NameTooLong { length: usize, limit: usize },
}

impl fmt::Display for LimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitExceeded::NodeCount { .. } | LimitExceeded::FileSize { .. } => {
                write!(f, "No space left on device")
            }
            LimitExceeded::PathTooLong { .. } | LimitExceeded::NameTooLong { .. } => {
                write!(f, "File name too long")
            }
        }
    }
}

impl std::error::Error for LimitExceeded {}
