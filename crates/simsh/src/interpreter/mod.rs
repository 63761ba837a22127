//! Interpreter for simulated shell command lines

mod state;

pub use state::{CLEAR_SCREEN, CommandResult, SessionState};

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;

use crate::commands::{self, Context, DEFAULT_HOSTNAME, Handler};
use crate::error::{Error, FailureKind};
use crate::logging_impl::{LogConfig, sanitize_for_log};
use crate::store::NodeStore;

/// Command dispatcher shared by every session of a shell.
///
/// Holds no per-session data: the working directory and history live in
/// the [`SessionState`] passed to [`Interpreter::execute`].
pub struct Interpreter {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
    hostname: String,
    log_config: LogConfig,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Create an interpreter with the standard command set.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();

        // Navigation & files
        handlers.insert("pwd", Box::new(commands::Pwd));
        handlers.insert("cd", Box::new(commands::Cd));
        handlers.insert("ls", Box::new(commands::Ls));
        handlers.insert("find", Box::new(commands::Find));
        handlers.insert("mkdir", Box::new(commands::Mkdir));
        handlers.insert("touch", Box::new(commands::Touch));
        handlers.insert("cat", Box::new(commands::Cat));
        handlers.insert("echo", Box::new(commands::Echo));
        handlers.insert("rm", Box::new(commands::Rm));
        handlers.insert("cp", Box::new(commands::Cp));
        handlers.insert("mv", Box::new(commands::Mv));
        handlers.insert("chmod", Box::new(commands::Chmod));
        handlers.insert("grep", Box::new(commands::Grep));

        // Development tools
        handlers.insert("git", Box::new(commands::Git));
        handlers.insert("python", Box::new(commands::Python));
        handlers.insert("python3", Box::new(commands::Python));
        handlers.insert("node", Box::new(commands::Node));
        handlers.insert("java", Box::new(commands::Java));
        handlers.insert("javac", Box::new(commands::Javac));
        handlers.insert("gcc", Box::new(commands::Gcc));
        handlers.insert("g++", Box::new(commands::Gcc));
        handlers.insert("npm", Box::new(commands::Npm));
        handlers.insert("pip", Box::new(commands::Pip));
        handlers.insert("pip3", Box::new(commands::Pip));
        handlers.insert("nano", Box::new(commands::Editor));
        handlers.insert("vim", Box::new(commands::Editor));
        handlers.insert("vi", Box::new(commands::Editor));

        // Network
        handlers.insert("curl", Box::new(commands::Curl));
        handlers.insert("wget", Box::new(commands::Wget));
        handlers.insert("ssh", Box::new(commands::Ssh));
        handlers.insert("scp", Box::new(commands::Scp));
        handlers.insert("rsync", Box::new(commands::Rsync));

        // System
        handlers.insert("top", Box::new(commands::Top));
        handlers.insert("htop", Box::new(commands::Top));
        handlers.insert("ps", Box::new(commands::Ps));
        handlers.insert("df", Box::new(commands::Df));
        handlers.insert("free", Box::new(commands::Free));
        handlers.insert("uname", Box::new(commands::Uname));
        handlers.insert("whoami", Box::new(commands::Whoami));
        handlers.insert("hostname", Box::new(commands::Hostname));
        handlers.insert("date", Box::new(commands::Date));

        // Archives
        handlers.insert("tar", Box::new(commands::Tar));
        handlers.insert("zip", Box::new(commands::Zip));
        handlers.insert("unzip", Box::new(commands::Unzip));

        // Session
        handlers.insert("clear", Box::new(commands::Clear));
        handlers.insert("help", Box::new(commands::Help));
        handlers.insert("history", Box::new(commands::History));

        Self {
            handlers,
            hostname: DEFAULT_HOSTNAME.to_string(),
            log_config: LogConfig::default(),
        }
    }

    /// Register a handler, replacing any existing one with the same name.
    pub fn register(&mut self, name: &'static str, handler: Box<dyn Handler>) {
        self.handlers.insert(name, handler);
    }

    pub fn set_hostname(&mut self, hostname: impl Into<String>) {
        self.hostname = hostname.into();
    }

    pub fn set_log_config(&mut self, log_config: LogConfig) {
        self.log_config = log_config;
    }

    /// Sorted names of every registered command.
    pub fn command_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Execute one raw command line in a session.
    ///
    /// Never fails: handler errors and panics become a failed
    /// [`CommandResult`]. The returned result always carries the
    /// session's working directory after the command.
    pub async fn execute(
        &self,
        session: &mut SessionState,
        store: &dyn NodeStore,
        line: &str,
    ) -> CommandResult {
        let line = line.trim();
        if line.is_empty() {
            return CommandResult::ok("").with_cwd(session.cwd());
        }

        session.record(line);
        session.revalidate(store).await;

        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return CommandResult::ok("").with_cwd(session.cwd());
        };
        let args: Vec<String> = tokens.map(str::to_string).collect();

        tracing::debug!(
            command = %self.log_config.format_command(name, &args),
            cwd = %session.cwd(),
            "dispatch"
        );

        let result = match self.handlers.get(name) {
            Some(handler) => self.run_handler(handler.as_ref(), name, &args, session, store).await,
            None => CommandResult::err(format!("{}: command not found", name)),
        };

        if let Some(error) = &result.error {
            tracing::debug!(
                command = %self.log_config.truncate(name),
                error = %sanitize_for_log(&self.log_config.truncate(error)),
                "command failed"
            );
        }

        // The command may have removed its own working directory.
        session.revalidate(store).await;
        result.with_cwd(session.cwd())
    }

    async fn run_handler(
        &self,
        handler: &dyn Handler,
        name: &str,
        args: &[String],
        session: &mut SessionState,
        store: &dyn NodeStore,
    ) -> CommandResult {
        let ctx = Context {
            name,
            args,
            session,
            store,
            hostname: &self.hostname,
            log_config: &self.log_config,
        };

        match AssertUnwindSafe(handler.execute(ctx)).catch_unwind().await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                if e.kind() == FailureKind::ResourceLimit {
                    tracing::warn!(command = %name, error = %e, "store limit reached");
                }
                CommandResult::err(format!("{}: {}", name, e))
            }
            Err(panic) => {
                tracing::error!(
                    command = %name,
                    panic = %sanitize_for_log(&panic_message(panic.as_ref())),
                    "handler panicked"
                );
                let e = Error::Internal("handler panicked".to_string());
                CommandResult::err(format!("{}: {}", name, e))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;
    use crate::store::InMemoryStore;
    use async_trait::async_trait;

    struct Boom;

    #[async_trait]
    impl Handler for Boom {
        async fn execute(&self, _ctx: Context<'_>) -> Result<CommandResult> {
            panic!("boom");
        }
    }

    struct Fails;

    #[async_trait]
    impl Handler for Fails {
        async fn execute(&self, _ctx: Context<'_>) -> Result<CommandResult> {
            Err(Error::NotFound("/x".into()))
        }
    }

    #[tokio::test]
    async fn test_blank_line_not_recorded() {
        let interp = Interpreter::new();
        let store = InMemoryStore::new();
        let mut session = SessionState::new();

        let result = interp.execute(&mut session, &store, "   ").await;
        assert!(result.success);
        assert_eq!(result.output, "");
        assert_eq!(result.current_directory, "/home/user");
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_history_records_raw_lines() {
        let interp = Interpreter::new();
        let store = InMemoryStore::new();
        let mut session = SessionState::new();

        interp.execute(&mut session, &store, "  ls   -la ").await;
        interp.execute(&mut session, &store, "bogus").await;
        interp.execute(&mut session, &store, "").await;
        assert_eq!(session.history(), &["ls   -la", "bogus"]);
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let interp = Interpreter::new();
        let store = InMemoryStore::new();
        let mut session = SessionState::new();

        let result = interp.execute(&mut session, &store, "frobnicate --now").await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("frobnicate: command not found"));
        assert_eq!(result.current_directory, "/home/user");
    }

    #[tokio::test]
    async fn test_cwd_reported_after_cd() {
        let interp = Interpreter::new();
        let store = InMemoryStore::new();
        let mut session = SessionState::new();

        let result = interp.execute(&mut session, &store, "cd Documents").await;
        assert_eq!(result.current_directory, "/home/user/Documents");
    }

    #[tokio::test]
    async fn test_handler_error_prefixed() {
        let mut interp = Interpreter::new();
        interp.register("fails", Box::new(Fails));
        let store = InMemoryStore::new();
        let mut session = SessionState::new();

        let result = interp.execute(&mut session, &store, "fails").await;
        assert_eq!(
            result.error.as_deref(),
            Some("fails: No such file or directory")
        );
    }

    #[tokio::test]
    async fn test_panic_contained() {
        let mut interp = Interpreter::new();
        interp.register("boom", Box::new(Boom));
        let store = InMemoryStore::new();
        let mut session = SessionState::new();

        let result = interp.execute(&mut session, &store, "boom").await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("boom: internal error: handler panicked"));

        // Session still usable
        let result = interp.execute(&mut session, &store, "pwd").await;
        assert_eq!(result.output, "/home/user");
    }

    #[tokio::test]
    async fn test_vanished_cwd_falls_back() {
        let interp = Interpreter::new();
        let store = InMemoryStore::new();
        let mut session = SessionState::new();

        interp.execute(&mut session, &store, "mkdir -p a/b").await;
        interp.execute(&mut session, &store, "cd a/b").await;
        interp.execute(&mut session, &store, "rm /home/user/a").await;

        let result = interp.execute(&mut session, &store, "pwd").await;
        assert_eq!(result.output, "/home/user");
    }

    #[test]
    fn test_command_names_cover_reference() {
        let interp = Interpreter::new();
        let names = interp.command_names();
        for name in [
            "pwd", "ls", "cd", "mkdir", "touch", "cat", "echo", "rm", "cp", "mv", "chmod",
            "find", "grep", "git", "curl", "wget", "python", "python3", "node", "java",
            "javac", "gcc", "g++", "top", "htop", "ps", "df", "free", "uname", "whoami",
            "nano", "vim", "vi", "tar", "zip", "unzip", "ssh", "scp", "rsync", "clear",
            "help",
        ] {
            assert!(names.contains(&name), "{}", name);
        }
    }
}
