//! cat command

use async_trait::async_trait;

use super::{Context, Handler, split_flags};
use crate::error::{Error, Result};
use crate::interpreter::CommandResult;

/// The cat command - print file contents.
///
/// Usage: cat [-n] FILE...
///
/// Contents of several files are concatenated. `-n` numbers output lines.
pub struct Cat;

#[async_trait]
impl Handler for Cat {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let (flags, files) = match split_flags(ctx.args, "n") {
            Ok(parsed) => parsed,
            Err(c) => {
                return Ok(CommandResult::err(format!("cat: invalid option -- '{}'", c)));
            }
        };
        if files.is_empty() {
            return Err(Error::MissingOperand("file operand"));
        }

        let mut raw = String::new();
        for file in files {
            match ctx.store.get(&ctx.resolve(file)).await {
                Some(node) if node.is_dir() => {
                    return Ok(CommandResult::err(format!("cat: {}: Is a directory", file)));
                }
                Some(node) => raw.push_str(node.text()),
                None => {
                    return Ok(CommandResult::err(format!(
                        "cat: {}: No such file or directory",
                        file
                    )));
                }
            }
        }

        if flags.contains(&'n') {
            raw = raw
                .lines()
                .enumerate()
                .map(|(i, line)| format!("{:>6}\t{}", i + 1, line))
                .collect::<Vec<_>>()
                .join("\n");
        }

        Ok(CommandResult::ok(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::run;
    use crate::store::{InMemoryStore, NewNode, NodeStore};

    #[tokio::test]
    async fn test_cat_file() {
        let store = InMemoryStore::new();
        store
            .create(NewNode::file("/home/user/notes.txt", "one\ntwo"))
            .await
            .unwrap();
        let result = run(&Cat, "cat", &["notes.txt"], &store).await;
        assert!(result.success);
        assert_eq!(result.output, "one\ntwo");
    }

    #[tokio::test]
    async fn test_cat_empty_file() {
        let store = InMemoryStore::new();
        store
            .create(NewNode::file("/home/user/a.txt", ""))
            .await
            .unwrap();
        let result = run(&Cat, "cat", &["a.txt"], &store).await;
        assert!(result.success);
        assert_eq!(result.output, "");
    }

    #[tokio::test]
    async fn test_cat_missing() {
        let store = InMemoryStore::new();
        let result = run(&Cat, "cat", &["missing.txt"], &store).await;
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("cat: missing.txt: No such file or directory")
        );
    }

    #[tokio::test]
    async fn test_cat_directory() {
        let store = InMemoryStore::new();
        let result = run(&Cat, "cat", &["Documents"], &store).await;
        assert_eq!(result.error.as_deref(), Some("cat: Documents: Is a directory"));
    }

    #[tokio::test]
    async fn test_cat_missing_operand() {
        let store = InMemoryStore::new();
        let result = run(&Cat, "cat", &[], &store).await;
        assert_eq!(result.error.as_deref(), Some("cat: missing file operand"));
    }

    #[tokio::test]
    async fn test_cat_number_lines() {
        let store = InMemoryStore::new();
        store
            .create(NewNode::file("/home/user/a.txt", "x\ny"))
            .await
            .unwrap();
        let result = run(&Cat, "cat", &["-n", "a.txt"], &store).await;
        assert_eq!(result.output, "     1\tx\n     2\ty");
    }
}
