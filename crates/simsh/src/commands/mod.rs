//! Command handlers
//!
//! Every command is a [`Handler`]: it receives a [`Context`] with the
//! arguments, the session and the namespace, and returns a
//! [`CommandResult`]. Returning `Err` is allowed; the interpreter turns it
//! into a failed result prefixed with the command name.
//!
//! Commands that stand in for external tools (compilers, package managers,
//! VCS, network clients) build a [`Simulation`]: canned text computed from
//! the arguments plus a list of [`SideEffect`]s, applied to the store
//! afterwards.
//!
//! # Custom Handlers
//!
//! ```rust
//! use simsh::{CommandResult, Context, Handler, Shell, async_trait};
//!
//! struct Fortune;
//!
//! #[async_trait]
//! impl Handler for Fortune {
//!     async fn execute(&self, _ctx: Context<'_>) -> simsh::Result<CommandResult> {
//!         Ok(CommandResult::ok("You will write a shell."))
//!     }
//! }
//!
//! let shell = Shell::builder().handler("fortune", Box::new(Fortune)).build();
//! ```

mod archive;
mod cat;
mod echo;
mod editor;
mod fileops;
mod git;
mod grep;
mod ls;
mod navigation;
mod network;
mod session;
mod system;
mod toolchain;

pub use archive::{Tar, Unzip, Zip};
pub use cat::Cat;
pub use echo::Echo;
pub use editor::Editor;
pub use fileops::{Chmod, Cp, Mkdir, Mv, Rm, Touch};
pub use git::Git;
pub use grep::Grep;
pub use ls::{Find, Ls};
pub use navigation::{Cd, Pwd};
pub use network::{Curl, Rsync, Scp, Ssh, Wget};
pub use session::{Clear, Help, History};
pub use system::{Date, Df, Free, Hostname, Ps, Top, Uname, Whoami};
pub use toolchain::{Gcc, Java, Javac, Node, Npm, Pip, Python};

use async_trait::async_trait;

use crate::error::Result;
use crate::interpreter::{CommandResult, SessionState};
use crate::logging_impl::LogConfig;
use crate::path;
use crate::store::{NewNode, NodePatch, NodeStore};

/// Username of the simulated account.
pub const DEFAULT_USERNAME: &str = "user";

/// Default simulated hostname.
pub const DEFAULT_HOSTNAME: &str = "simsh";

/// Execution context for command handlers.
pub struct Context<'a> {
    /// Name the command was invoked as (`python3`, `vi`, ...).
    pub name: &'a str,

    /// Arguments, not including the command name.
    pub args: &'a [String],

    /// Session state: working directory and history.
    pub session: &'a mut SessionState,

    /// The namespace this session operates on.
    pub store: &'a dyn NodeStore,

    /// Simulated hostname.
    pub hostname: &'a str,

    /// Redaction rules for anything a handler logs.
    pub log_config: &'a LogConfig,
}

impl Context<'_> {
    /// Current working directory.
    pub fn cwd(&self) -> &str {
        self.session.cwd()
    }

    /// Resolve a raw path argument against the working directory.
    pub fn resolve(&self, raw: &str) -> String {
        self.session.resolve(raw)
    }
}

/// Trait for implementing command handlers.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Execute the command.
    ///
    /// * `Ok(CommandResult)` - the command ran, successfully or not
    /// * `Err(Error)` - reported as `<name>: <error>`
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult>;
}

/// A filesystem change requested by a simulated tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// Create a directory; existing directories are left alone.
    CreateDir(String),
    /// Create or overwrite a file.
    WriteFile {
        path: String,
        content: String,
        permissions: Option<String>,
    },
}

impl SideEffect {
    pub fn write(path: impl Into<String>, content: impl Into<String>) -> Self {
        SideEffect::WriteFile {
            path: path.into(),
            content: content.into(),
            permissions: None,
        }
    }

    pub fn executable(path: impl Into<String>, content: impl Into<String>) -> Self {
        SideEffect::WriteFile {
            path: path.into(),
            content: content.into(),
            permissions: Some(crate::store::EXECUTABLE_PERMISSIONS.to_string()),
        }
    }
}

/// Canned output of a simulated tool plus the changes it makes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Simulation {
    pub output: String,
    pub effects: Vec<SideEffect>,
}

impl Simulation {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            effects: Vec::new(),
        }
    }

    pub fn effect(mut self, effect: SideEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Apply the side effects in order and turn the simulation into a
    /// successful result.
    ///
    /// If an effect fails, the ones already applied are undone so the
    /// namespace is left as it was.
    pub async fn apply(self, store: &dyn NodeStore) -> Result<CommandResult> {
        let mut undo = Vec::with_capacity(self.effects.len());
        for effect in self.effects {
            if let Err(e) = apply_effect(store, effect, &mut undo).await {
                rollback(store, undo).await;
                return Err(e);
            }
        }
        Ok(CommandResult::ok(self.output))
    }
}

/// How to reverse one applied effect.
enum Undo {
    Remove(String),
    Restore {
        path: String,
        content: String,
        permissions: String,
    },
}

async fn apply_effect(
    store: &dyn NodeStore,
    effect: SideEffect,
    undo: &mut Vec<Undo>,
) -> Result<()> {
    match effect {
        SideEffect::CreateDir(dir) => {
            let existed = store.exists(&dir).await;
            store.upsert(NewNode::directory(dir.clone())).await?;
            if !existed {
                undo.push(Undo::Remove(dir));
            }
        }
        SideEffect::WriteFile {
            path,
            content,
            permissions,
        } => {
            let previous = store.get(&path).await.filter(|n| n.is_file());
            store.upsert(NewNode::file(path.clone(), content)).await?;
            undo.push(match previous {
                Some(node) => Undo::Restore {
                    path: path.clone(),
                    content: node.content.unwrap_or_default(),
                    permissions: node.permissions,
                },
                None => Undo::Remove(path.clone()),
            });
            if let Some(permissions) = permissions {
                store
                    .update(&path, NodePatch::permissions(permissions))
                    .await?;
            }
        }
    }
    Ok(())
}

async fn rollback(store: &dyn NodeStore, undo: Vec<Undo>) {
    for step in undo.into_iter().rev() {
        match step {
            Undo::Remove(path) => {
                store.delete(&path).await;
            }
            Undo::Restore {
                path,
                content,
                permissions,
            } => {
                let patch = NodePatch {
                    content: Some(content),
                    permissions: Some(permissions),
                };
                if let Err(e) = store.update(&path, patch).await {
                    tracing::warn!(path = %path, error = %e, "rollback failed to restore file");
                }
            }
        }
    }
}

/// Split arguments into single-letter flags and operands.
///
/// `-la` yields `l` and `a`. A lone `-` is an operand. Returns the first
/// flag not in `allowed` as the error.
pub(crate) fn split_flags<'a>(
    args: &'a [String],
    allowed: &str,
) -> std::result::Result<(Vec<char>, Vec<&'a str>), char> {
    let mut flags = Vec::new();
    let mut operands = Vec::new();
    for arg in args {
        match arg.strip_prefix('-') {
            Some(letters) if !letters.is_empty() && !arg.starts_with("--") => {
                for c in letters.chars() {
                    if !allowed.contains(c) {
                        return Err(c);
                    }
                    flags.push(c);
                }
            }
            _ => operands.push(arg.as_str()),
        }
    }
    Ok((flags, operands))
}

/// Display form of a resolved path relative to the working directory.
pub(crate) fn display_path(cwd: &str, resolved: &str) -> String {
    if path::is_descendant(resolved, cwd) {
        let prefix = if cwd == "/" { 1 } else { cwd.len() + 1 };
        resolved[prefix..].to_string()
    } else {
        resolved.to_string()
    }
}
