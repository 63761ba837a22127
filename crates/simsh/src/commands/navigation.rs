//! Navigation commands (cd, pwd)

use async_trait::async_trait;

use super::{Context, Handler};
use crate::error::Result;
use crate::interpreter::CommandResult;
use crate::path;

/// The cd command - change directory.
///
/// Usage: cd [DIR | ~ | -]
///
/// Without an operand, changes to the home directory.
pub struct Cd;

#[async_trait]
impl Handler for Cd {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        if ctx.args.len() > 1 {
            return Ok(CommandResult::err("cd: too many arguments"));
        }

        let target = ctx.args.first().map(|s| s.as_str()).unwrap_or(path::HOME);

        let (resolved, echo) = if target == "-" {
            match ctx.session.previous_cwd() {
                Some(previous) => (previous.to_string(), true),
                None => return Ok(CommandResult::err("cd: OLDPWD not set")),
            }
        } else {
            (ctx.resolve(target), false)
        };

        match ctx.store.get(&resolved).await {
            Some(node) if node.is_dir() => {
                ctx.session.set_cwd(resolved.clone());
                Ok(CommandResult::ok(if echo { resolved } else { String::new() }))
            }
            Some(_) => Ok(CommandResult::err(format!(
                "cd: not a directory: {}",
                target
            ))),
            None => Ok(CommandResult::err(format!(
                "cd: no such file or directory: {}",
                target
            ))),
        }
    }
}

/// The pwd command - print working directory.
pub struct Pwd;

#[async_trait]
impl Handler for Pwd {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        Ok(CommandResult::ok(ctx.cwd()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{run, run_in};
    use crate::interpreter::SessionState;
    use crate::store::{InMemoryStore, NewNode, NodeStore};

    #[tokio::test]
    async fn test_pwd() {
        let store = InMemoryStore::new();
        let result = run(&Pwd, "pwd", &[], &store).await;
        assert_eq!(result.output, "/home/user");
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_cd_relative() {
        let store = InMemoryStore::new();
        let mut session = SessionState::new();
        let result = run_in(&Cd, "cd", &["Documents"], &store, &mut session).await;
        assert!(result.success);
        assert_eq!(result.output, "");
        assert_eq!(session.cwd(), "/home/user/Documents");
    }

    #[tokio::test]
    async fn test_cd_default_home() {
        let store = InMemoryStore::new();
        let mut session = SessionState::new();
        run_in(&Cd, "cd", &["/"], &store, &mut session).await;
        assert_eq!(session.cwd(), "/");

        run_in(&Cd, "cd", &[], &store, &mut session).await;
        assert_eq!(session.cwd(), "/home/user");
    }

    #[tokio::test]
    async fn test_cd_parent() {
        let store = InMemoryStore::new();
        let mut session = SessionState::new();
        run_in(&Cd, "cd", &[".."], &store, &mut session).await;
        assert_eq!(session.cwd(), "/home");
    }

    #[tokio::test]
    async fn test_cd_missing() {
        let store = InMemoryStore::new();
        let mut session = SessionState::new();
        let result = run_in(&Cd, "cd", &["nowhere"], &store, &mut session).await;
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("cd: no such file or directory: nowhere")
        );
        assert_eq!(session.cwd(), "/home/user");
    }

    #[tokio::test]
    async fn test_cd_file_rejected() {
        let store = InMemoryStore::new();
        store
            .create(NewNode::file("/home/user/f.txt", ""))
            .await
            .unwrap();
        let mut session = SessionState::new();
        let result = run_in(&Cd, "cd", &["f.txt"], &store, &mut session).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("cd: not a directory: f.txt"));
        assert_eq!(session.cwd(), "/home/user");
    }

    #[tokio::test]
    async fn test_cd_dash() {
        let store = InMemoryStore::new();
        let mut session = SessionState::new();
        let result = run_in(&Cd, "cd", &["-"], &store, &mut session).await;
        assert!(!result.success);

        run_in(&Cd, "cd", &["/home"], &store, &mut session).await;
        let result = run_in(&Cd, "cd", &["-"], &store, &mut session).await;
        assert_eq!(result.output, "/home/user");
        assert_eq!(session.cwd(), "/home/user");
    }

    #[tokio::test]
    async fn test_cd_too_many_arguments() {
        let store = InMemoryStore::new();
        let result = run(&Cd, "cd", &["a", "b"], &store).await;
        assert_eq!(result.error.as_deref(), Some("cd: too many arguments"));
    }
}
