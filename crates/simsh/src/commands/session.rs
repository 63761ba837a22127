//! Session commands (clear, help, history)

use async_trait::async_trait;

use super::{Context, Handler};
use crate::error::Result;
use crate::interpreter::{CLEAR_SCREEN, CommandResult};

/// The clear command - ask the front end to wipe the screen.
pub struct Clear;

#[async_trait]
impl Handler for Clear {
    async fn execute(&self, _ctx: Context<'_>) -> Result<CommandResult> {
        Ok(CommandResult::ok(CLEAR_SCREEN))
    }
}

const HELP_TEXT: &str = "\
Available commands:

Navigation & files
  pwd                         Print the working directory
  cd [DIR | ~ | - | ..]       Change the working directory
  ls [-l] [-a] [-1] [PATH]    List directory contents
  mkdir [-p] DIR...           Create directories
  touch FILE...               Create empty files
  cat [-n] FILE               Print file contents
  echo TEXT [> FILE]          Print text, or write it with > / >>
  rm [-rf] PATH...            Remove files and directories
  cp [-r] SRC DEST            Copy files and directories
  mv SRC DEST                 Move or rename
  chmod MODE PATH...          Change permissions (755, u+x, rwxr-xr-x)
  find [PATH] [-name PAT] [-type f|d]
                              Search for files
  grep [-inv] PATTERN FILE    Print lines containing PATTERN

Development
  git clone|init|status|add|commit|push|pull|log|branch
  python, python3 [FILE]      Run a Python script
  node [FILE]                 Run a JavaScript file
  javac FILE.java             Compile Java source
  java CLASS                  Run a compiled Java class
  gcc, g++ [-o OUT] FILE      Compile C/C++ source
  npm install|init|run        Node package manager
  pip, pip3 install|list      Python package manager
  nano, vim, vi FILE          View a file in an editor

Network
  curl [-I] [-o FILE] URL     Fetch a URL
  wget [-O FILE] URL          Download a URL to a file
  ssh [USER@]HOST             Connect to a remote host
  scp SRC DEST                Copy to or from a remote host
  rsync SRC DEST              Synchronize files

System
  top, htop                   Show system activity
  ps [aux]                    List processes
  df [-h]                     Show disk usage
  free [-h|-m]                Show memory usage
  uname [-a]                  Print system information
  whoami, hostname, date      Print user, host name, current time

Archives
  tar -c|-x|-t [-vzf] ARCHIVE [FILE...]
  zip ARCHIVE FILE...         Create a zip archive
  unzip ARCHIVE               Extract a zip archive

Session
  history                     Show command history
  clear                       Clear the screen
  help                        Show this help";

/// The help command - print the command reference.
pub struct Help;

#[async_trait]
impl Handler for Help {
    async fn execute(&self, _ctx: Context<'_>) -> Result<CommandResult> {
        Ok(CommandResult::ok(HELP_TEXT))
    }
}

/// The history command - numbered list of this session's commands.
///
/// Usage: history [N]
pub struct History;

#[async_trait]
impl Handler for History {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let history = ctx.session.history();
        let skip = match ctx.args.first() {
            None => 0,
            Some(n) => match n.parse::<usize>() {
                Ok(n) => history.len().saturating_sub(n),
                Err(_) => {
                    return Ok(CommandResult::err(format!(
                        "history: {}: numeric argument required",
                        n
                    )));
                }
            },
        };

        let lines: Vec<String> = history
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(i, line)| format!("{:>5}  {}", i + 1, line))
            .collect();
        Ok(CommandResult::ok(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{run, run_in};
    use crate::interpreter::SessionState;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn test_clear() {
        let store = InMemoryStore::new();
        let result = run(&Clear, "clear", &[], &store).await;
        assert_eq!(result.output, CLEAR_SCREEN);
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_help_lists_every_command_group() {
        let store = InMemoryStore::new();
        let result = run(&Help, "help", &[], &store).await;
        for cmd in ["pwd", "git clone", "curl", "top", "tar", "history"] {
            assert!(result.output.contains(cmd), "{}", cmd);
        }
    }

    #[tokio::test]
    async fn test_history_numbered() {
        let store = InMemoryStore::new();
        let mut session = SessionState::new();
        session.record("pwd");
        session.record("ls -la");
        session.record("history");

        let result = run_in(&History, "history", &[], &store, &mut session).await;
        assert_eq!(result.output, "    1  pwd\n    2  ls -la\n    3  history");

        let result = run_in(&History, "history", &["1"], &store, &mut session).await;
        assert_eq!(result.output, "    3  history");

        let result = run_in(&History, "history", &["x"], &store, &mut session).await;
        assert!(!result.success);
    }
}
