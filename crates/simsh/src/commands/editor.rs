//! Text editors (nano, vim, vi)
//!
//! Sessions carry no terminal, so editors only render the first screen
//! of the file and exit. Nothing is written back.

use async_trait::async_trait;

use super::{Context, Handler};
use crate::error::Result;
use crate::interpreter::CommandResult;

/// Lines of file content shown on the simulated screen.
const SCREEN_LINES: usize = 20;

const READ_ONLY_HINT: &str =
    "(interactive editing is not supported in this shell; use echo TEXT > FILE to write)";

/// Editor command, registered as `nano`, `vim` and `vi`.
///
/// Usage: nano FILE
pub struct Editor;

#[async_trait]
impl Handler for Editor {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let Some(file) = ctx.args.iter().rev().find(|a| !a.starts_with('-') && !a.starts_with('+'))
        else {
            return Ok(CommandResult::err(format!("Usage: {} FILE", ctx.name)));
        };

        let content = match ctx.store.get(&ctx.resolve(file)).await {
            Some(node) if node.is_dir() => {
                return Ok(CommandResult::err(format!(
                    "{}: {}: Is a directory",
                    ctx.name, file
                )));
            }
            Some(node) => Some(node.content.unwrap_or_default()),
            None => None,
        };

        let screen = if ctx.name == "nano" {
            nano_screen(file, content.as_deref())
        } else {
            vim_screen(file, content.as_deref())
        };
        Ok(CommandResult::ok(format!("{}\n{}", screen, READ_ONLY_HINT)))
    }
}

fn nano_screen(file: &str, content: Option<&str>) -> String {
    let mut lines = vec![format!("  GNU nano 6.2{:>30}", file), String::new()];
    let status = match content {
        Some(text) => {
            lines.extend(text.lines().take(SCREEN_LINES).map(str::to_string));
            format!("[ Read {} lines ]", text.lines().count())
        }
        None => "[ New File ]".to_string(),
    };
    lines.push(String::new());
    lines.push(status);
    lines.push("^G Help  ^O Write Out  ^W Where Is  ^K Cut  ^X Exit".to_string());
    lines.join("\n")
}

fn vim_screen(file: &str, content: Option<&str>) -> String {
    let mut lines: Vec<String> = Vec::new();
    let status = match content {
        Some(text) => {
            lines.extend(text.lines().take(SCREEN_LINES).map(str::to_string));
            format!("\"{}\" {}L, {}B", file, text.lines().count(), text.len())
        }
        None => format!("\"{}\" [New]", file),
    };
    let shown = lines.len();
    lines.extend(std::iter::repeat_n("~".to_string(), SCREEN_LINES.saturating_sub(shown).min(5)));
    lines.push(status);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::run;
    use crate::store::{InMemoryStore, NewNode, NodeStore};

    #[tokio::test]
    async fn test_nano_existing_file() {
        let store = InMemoryStore::new();
        store
            .create(NewNode::file("/home/user/notes.txt", "alpha\nbeta"))
            .await
            .unwrap();
        let result = run(&Editor, "nano", &["notes.txt"], &store).await;
        assert!(result.success);
        assert!(result.output.starts_with("  GNU nano 6.2"));
        assert!(result.output.contains("alpha\nbeta"));
        assert!(result.output.contains("[ Read 2 lines ]"));
    }

    #[tokio::test]
    async fn test_vim_new_file_not_created() {
        let store = InMemoryStore::new();
        let result = run(&Editor, "vim", &["draft.md"], &store).await;
        assert!(result.success);
        assert!(result.output.contains("\"draft.md\" [New]"));
        assert!(!store.exists("/home/user/draft.md").await);
    }

    #[tokio::test]
    async fn test_vi_status_line() {
        let store = InMemoryStore::new();
        store
            .create(NewNode::file("/home/user/a.txt", "abc"))
            .await
            .unwrap();
        let result = run(&Editor, "vi", &["a.txt"], &store).await;
        assert!(result.output.contains("\"a.txt\" 1L, 3B"));
    }

    #[tokio::test]
    async fn test_editor_errors() {
        let store = InMemoryStore::new();
        let result = run(&Editor, "nano", &[], &store).await;
        assert_eq!(result.error.as_deref(), Some("Usage: nano FILE"));

        let result = run(&Editor, "vim", &["Documents"], &store).await;
        assert_eq!(result.error.as_deref(), Some("vim: Documents: Is a directory"));
    }
}
