//! Interpreter state types

use serde::{Deserialize, Serialize};

use crate::path;
use crate::store::NodeStore;

/// Output value of `clear`: tells the front end to wipe its scrollback.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Result of executing one command line.
///
/// Serializes as `{"output", "error"?, "currentDirectory", "success"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    /// Text output
    pub output: String,
    /// Error message; present iff `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Working directory after the command
    pub current_directory: String,
    /// Whether the command succeeded
    pub success: bool,
}

impl CommandResult {
    /// Create a successful result with the given output.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: None,
            current_directory: String::new(),
            success: true,
        }
    }

    /// Create a failed result with the given error and no output.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            error: Some(error.into()),
            current_directory: String::new(),
            success: false,
        }
    }

    /// Aggregate per-operand outcomes of a multi-operand command.
    ///
    /// Succeeds only when `failures` is empty. Otherwise the output lists
    /// every failure and `error` carries the first one.
    pub fn aggregate(failures: Vec<String>) -> Self {
        match failures.first() {
            None => Self::ok(""),
            Some(first) => Self {
                output: failures.join("\n"),
                error: Some(first.clone()),
                current_directory: String::new(),
                success: false,
            },
        }
    }

    /// Set the working directory reported with this result.
    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.current_directory = cwd.into();
        self
    }

    /// Check if the result indicates success.
    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Per-session mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    cwd: String,
    previous_cwd: Option<String>,
    history: Vec<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Fresh state in the home directory.
    pub fn new() -> Self {
        Self {
            cwd: path::HOME.to_string(),
            previous_cwd: None,
            history: Vec::new(),
        }
    }

    /// Current working directory.
    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    /// Working directory before the last `cd`.
    pub fn previous_cwd(&self) -> Option<&str> {
        self.previous_cwd.as_deref()
    }

    /// Change the working directory. Callers verify it is a directory.
    pub(crate) fn set_cwd(&mut self, cwd: impl Into<String>) {
        let old = std::mem::replace(&mut self.cwd, cwd.into());
        self.previous_cwd = Some(old);
    }

    /// Command history in invocation order.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub(crate) fn record(&mut self, line: &str) {
        self.history.push(line.to_string());
    }

    /// Resolve a raw path argument against the working directory.
    pub fn resolve(&self, raw: &str) -> String {
        path::resolve(&self.cwd, raw)
    }

    /// Move to the nearest existing ancestor if the working directory is
    /// gone or no longer a directory.
    pub(crate) async fn revalidate(&mut self, store: &dyn NodeStore) {
        let mut candidate = self.cwd.clone();
        loop {
            if store.get(&candidate).await.is_some_and(|n| n.is_dir()) {
                break;
            }
            match path::parent(&candidate) {
                Some(parent) => candidate = parent.to_string(),
                None => break,
            }
        }
        if candidate != self.cwd {
            tracing::debug!(from = %self.cwd, to = %candidate, "working directory vanished");
            self.cwd = candidate;
        }
    }
}
