//! Simsh - Session-scoped simulated Unix shell
//!
//! A virtual namespace plus a command interpreter. Each session has its own
//! working directory and history; commands act on an in-memory store and
//! return a structured [`CommandResult`]. Developer tools, network clients
//! and system monitors produce canned output and never touch the host.
//!
//! # Example
//!
//! ```rust
//! use simsh::Shell;
//!
//! #[tokio::main]
//! async fn main() -> simsh::Result<()> {
//!     let shell = Shell::new();
//!     let session = shell.create_session();
//!
//!     shell.execute(session, "mkdir proj").await?;
//!     let result = shell.execute(session, "cd proj").await?;
//!     assert_eq!(result.current_directory, "/home/user/proj");
//!
//!     let result = shell.execute(session, "frobnicate").await?;
//!     assert!(!result.success);
//!     assert_eq!(result.error.as_deref(), Some("frobnicate: command not found"));
//!     Ok(())
//! }
//! ```
//!
//! # Isolation
//!
//! By default every session shares one namespace, so a file created in one
//! session is visible in all others. [`Isolation::PerSession`] gives each
//! session a fresh namespace seeded with the bootstrap nodes.

mod commands;
mod error;
mod interpreter;
mod limits;
mod logging_impl;
pub mod path;
mod resources;
mod store;

pub use async_trait::async_trait;
pub use commands::{Context, DEFAULT_HOSTNAME, DEFAULT_USERNAME, Handler, SideEffect, Simulation};
pub use error::{Error, FailureKind, Result};
pub use interpreter::{CLEAR_SCREEN, CommandResult, SessionState};
pub use limits::{LimitExceeded, StoreLimits};
pub use logging_impl::{LogConfig, sanitize_for_log, strip_credentials};
pub use resources::ResourceSnapshot;
pub use store::{InMemoryStore, NewNode, Node, NodeKind, NodePatch, NodeStore};

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use interpreter::Interpreter;

/// Namespace sharing policy between sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Isolation {
    /// All sessions observe and mutate one namespace.
    #[default]
    Shared,
    /// Each session gets its own namespace seeded from the bootstrap set.
    PerSession,
}

/// Opaque handle to a session of a [`Shell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    /// Numeric value of the handle.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Session {
    state: SessionState,
    store: Arc<dyn NodeStore>,
}

/// Main entry point for Simsh.
///
/// Owns the interpreter and every live session. Methods take `&self`, so
/// a `Shell` can sit behind an `Arc` and serve sessions from many tasks.
/// Commands within one session run one at a time; commands of different
/// sessions may run concurrently.
pub struct Shell {
    interpreter: Interpreter,
    isolation: Isolation,
    limits: StoreLimits,
    shared_store: Arc<dyn NodeStore>,
    sessions: Mutex<HashMap<SessionId, Arc<tokio::sync::Mutex<Session>>>>,
    next_id: AtomicU64,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    /// Create a shell with default settings: shared namespace, default
    /// limits, the standard command set.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new ShellBuilder for customized configuration.
    pub fn builder() -> ShellBuilder {
        ShellBuilder::default()
    }

    /// Namespace sharing policy of this shell.
    pub fn isolation(&self) -> Isolation {
        self.isolation
    }

    /// Start a session in `/home/user` with empty history.
    pub fn create_session(&self) -> SessionId {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let store = match self.isolation {
            Isolation::Shared => Arc::clone(&self.shared_store),
            Isolation::PerSession => {
                Arc::new(InMemoryStore::with_limits(self.limits.clone())) as Arc<dyn NodeStore>
            }
        };
        let session = Session {
            state: SessionState::new(),
            store,
        };
        self.sessions()
            .insert(id, Arc::new(tokio::sync::Mutex::new(session)));
        tracing::info!(session = %id, isolation = ?self.isolation, "session created");
        id
    }

    /// Execute one command line in a session.
    ///
    /// The only error is [`Error::SessionNotFound`]; command failures are
    /// reported inside the returned [`CommandResult`].
    pub async fn execute(&self, id: SessionId, line: &str) -> Result<CommandResult> {
        let session = self.session(id)?;
        let mut guard = session.lock().await;
        let Session { state, store } = &mut *guard;
        Ok(self.interpreter.execute(state, store.as_ref(), line).await)
    }

    /// End a session. Returns false if it did not exist.
    ///
    /// Per-session namespaces are dropped with their session.
    pub fn close_session(&self, id: SessionId) -> bool {
        let removed = self.sessions().remove(&id).is_some();
        if removed {
            tracing::info!(session = %id, "session closed");
        }
        removed
    }

    /// Command history of a session, oldest first.
    pub async fn history(&self, id: SessionId) -> Result<Vec<String>> {
        let session = self.session(id)?;
        let guard = session.lock().await;
        Ok(guard.state.history().to_vec())
    }

    /// Working directory of a session.
    pub async fn cwd(&self, id: SessionId) -> Result<String> {
        let session = self.session(id)?;
        let guard = session.lock().await;
        Ok(guard.state.cwd().to_string())
    }

    /// Namespace a session operates on.
    pub async fn store(&self, id: SessionId) -> Result<Arc<dyn NodeStore>> {
        let session = self.session(id)?;
        let guard = session.lock().await;
        Ok(Arc::clone(&guard.store))
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }

    /// Sorted names of every command this shell understands.
    pub fn commands(&self) -> Vec<&'static str> {
        self.interpreter.command_names()
    }

    fn session(&self, id: SessionId) -> Result<Arc<tokio::sync::Mutex<Session>>> {
        self.sessions()
            .get(&id)
            .cloned()
            .ok_or(Error::SessionNotFound(id.0))
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, Arc<tokio::sync::Mutex<Session>>>> {
        // A panic while holding this lock cannot leave the map half-updated.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Builder for customized Shell configuration.
#[derive(Default)]
pub struct ShellBuilder {
    isolation: Isolation,
    limits: Option<StoreLimits>,
    hostname: Option<String>,
    log_config: Option<LogConfig>,
    handlers: Vec<(&'static str, Box<dyn Handler>)>,
}

impl ShellBuilder {
    /// Set the namespace sharing policy.
    pub fn isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = isolation;
        self
    }

    /// Set limits for every namespace this shell creates.
    pub fn limits(mut self, limits: StoreLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Set the simulated hostname (`hostname`, `uname -n`).
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Set logging behavior.
    pub fn log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = Some(log_config);
        self
    }

    /// Register a command, replacing a built-in one of the same name.
    pub fn handler(mut self, name: &'static str, handler: Box<dyn Handler>) -> Self {
        self.handlers.push((name, handler));
        self
    }

    /// Build the Shell instance.
    pub fn build(self) -> Shell {
        let limits = self.limits.unwrap_or_default();
        let mut interpreter = Interpreter::new();

        if let Some(hostname) = self.hostname {
            interpreter.set_hostname(hostname);
        }
        if let Some(log_config) = self.log_config {
            interpreter.set_log_config(log_config);
        }
        for (name, handler) in self.handlers {
            interpreter.register(name, handler);
        }

        Shell {
            interpreter,
            isolation: self.isolation,
            shared_store: Arc::new(InMemoryStore::with_limits(limits.clone())),
            limits,
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let shell = Shell::new();
        let id = shell.create_session();

        let result = shell.execute(id, "pwd").await.unwrap();
        assert_eq!(result.output, "/home/user");

        let result = shell.execute(id, "mkdir proj").await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "");

        let result = shell.execute(id, "cd proj").await.unwrap();
        assert_eq!(result.current_directory, "/home/user/proj");

        assert!(shell.execute(id, "touch a.txt").await.unwrap().success);
        assert_eq!(shell.execute(id, "ls").await.unwrap().output, "a.txt");
        assert_eq!(shell.execute(id, "cat a.txt").await.unwrap().output, "");
        assert!(shell.execute(id, "rm a.txt").await.unwrap().success);
        assert_eq!(shell.execute(id, "ls").await.unwrap().output, "");
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let shell = Shell::new();
        let err = shell.execute(SessionId(42), "pwd").await.unwrap_err();
        assert!(matches!(err, Error::SessionNotFound(42)));
    }

    #[tokio::test]
    async fn test_close_session() {
        let shell = Shell::new();
        let id = shell.create_session();
        assert_eq!(shell.session_count(), 1);
        assert!(shell.close_session(id));
        assert!(!shell.close_session(id));
        assert_eq!(shell.session_count(), 0);
        assert!(shell.execute(id, "pwd").await.is_err());
    }

    #[tokio::test]
    async fn test_history_excludes_blank_lines() {
        let shell = Shell::new();
        let id = shell.create_session();
        shell.execute(id, "pwd").await.unwrap();
        shell.execute(id, "   ").await.unwrap();
        shell.execute(id, "ls -a").await.unwrap();
        assert_eq!(shell.history(id).await.unwrap(), vec!["pwd", "ls -a"]);
    }

    #[tokio::test]
    async fn test_builder_hostname() {
        let shell = Shell::builder().hostname("devbox").build();
        let id = shell.create_session();
        assert_eq!(shell.execute(id, "hostname").await.unwrap().output, "devbox");
    }

    #[tokio::test]
    async fn test_builder_custom_handler() {
        struct Hello;

        #[async_trait]
        impl Handler for Hello {
            async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
                Ok(CommandResult::ok(format!("hello from {}", ctx.cwd())))
            }
        }

        let shell = Shell::builder().handler("hello", Box::new(Hello)).build();
        let id = shell.create_session();
        let result = shell.execute(id, "hello").await.unwrap();
        assert_eq!(result.output, "hello from /home/user");
        assert!(shell.commands().contains(&"hello"));
    }

    #[tokio::test]
    async fn test_builder_limits() {
        let shell = Shell::builder()
            .limits(StoreLimits::new().max_node_count(9))
            .build();
        let id = shell.create_session();
        assert!(shell.execute(id, "mkdir one").await.unwrap().success);
        let result = shell.execute(id, "mkdir two").await.unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_session_ids_unique() {
        let shell = Shell::new();
        let a = shell.create_session();
        let b = shell.create_session();
        assert_ne!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), a.get().to_string());
    }
}
