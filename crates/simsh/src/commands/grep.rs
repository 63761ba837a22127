//! grep - plain substring line filter
//!
//! Usage:
//!   grep pattern file
//!   grep -i pattern file        # case insensitive
//!   grep -n pattern file        # show line numbers
//!   grep -v pattern file        # invert match
//!   grep -c pattern file        # count matches
//!
//! Patterns are literal text, never regular expressions.

use async_trait::async_trait;

use super::{Context, Handler};
use crate::error::Result;
use crate::interpreter::CommandResult;

const USAGE: &str = "Usage: grep [-inv] PATTERN FILE";

/// grep command - substring filter over a file's lines
pub struct Grep;

#[derive(Default)]
struct GrepOptions {
    pattern: String,
    files: Vec<String>,
    ignore_case: bool,
    invert_match: bool,
    line_numbers: bool,
    count_only: bool,
}

impl GrepOptions {
    fn parse(args: &[String]) -> std::result::Result<Self, String> {
        let mut opts = GrepOptions::default();
        let mut positional = Vec::new();

        for arg in args {
            if arg.starts_with('-') && arg.len() > 1 && !arg.starts_with("--") {
                // Combined flags like -in
                for c in arg[1..].chars() {
                    match c {
                        'i' => opts.ignore_case = true,
                        'v' => opts.invert_match = true,
                        'n' => opts.line_numbers = true,
                        'c' => opts.count_only = true,
                        _ => return Err(format!("grep: invalid option -- '{}'", c)),
                    }
                }
            } else {
                positional.push(arg.replace(['"', '\''], ""));
            }
        }

        if positional.len() < 2 {
            return Err(USAGE.to_string());
        }
        opts.pattern = positional.remove(0);
        opts.files = positional;
        Ok(opts)
    }

    fn matches(&self, line: &str) -> bool {
        let found = if self.ignore_case {
            line.to_lowercase().contains(&self.pattern.to_lowercase())
        } else {
            line.contains(&self.pattern)
        };
        found != self.invert_match
    }
}

#[async_trait]
impl Handler for Grep {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let opts = match GrepOptions::parse(ctx.args) {
            Ok(opts) => opts,
            Err(msg) => return Ok(CommandResult::err(msg)),
        };
        let with_filename = opts.files.len() > 1;

        let mut output = Vec::new();
        for file in &opts.files {
            let content = match ctx.store.get(&ctx.resolve(file)).await {
                Some(node) if node.is_dir() => {
                    return Ok(CommandResult::err(format!("grep: {}: Is a directory", file)));
                }
                Some(node) => node.content.unwrap_or_default(),
                None => {
                    return Ok(CommandResult::err(format!(
                        "grep: {}: No such file or directory",
                        file
                    )));
                }
            };

            let hits: Vec<(usize, &str)> = content
                .lines()
                .enumerate()
                .filter(|(_, line)| opts.matches(line))
                .collect();

            if opts.count_only {
                if with_filename {
                    output.push(format!("{}:{}", file, hits.len()));
                } else {
                    output.push(hits.len().to_string());
                }
                continue;
            }

            for (num, line) in hits {
                let mut rendered = String::new();
                if with_filename {
                    rendered.push_str(file);
                    rendered.push(':');
                }
                if opts.line_numbers {
                    rendered.push_str(&format!("{}:", num + 1));
                }
                rendered.push_str(line);
                output.push(rendered);
            }
        }

        Ok(CommandResult::ok(output.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::run;
    use crate::store::{InMemoryStore, NewNode, NodeStore};

    async fn store_with_log() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .create(NewNode::file(
                "/home/user/app.log",
                "INFO start\nERROR disk full\ninfo retry\nERROR timeout",
            ))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_grep_substring() {
        let store = store_with_log().await;
        let result = run(&Grep, "grep", &["ERROR", "app.log"], &store).await;
        assert!(result.success);
        assert_eq!(result.output, "ERROR disk full\nERROR timeout");
    }

    #[tokio::test]
    async fn test_grep_is_not_regex() {
        let store = store_with_log().await;
        let result = run(&Grep, "grep", &["E.*R", "app.log"], &store).await;
        assert_eq!(result.output, "");
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_grep_ignore_case_with_numbers() {
        let store = store_with_log().await;
        let result = run(&Grep, "grep", &["-in", "info", "app.log"], &store).await;
        assert_eq!(result.output, "1:INFO start\n3:info retry");
    }

    #[tokio::test]
    async fn test_grep_invert_and_count() {
        let store = store_with_log().await;
        let result = run(&Grep, "grep", &["-v", "ERROR", "app.log"], &store).await;
        assert_eq!(result.output, "INFO start\ninfo retry");

        let result = run(&Grep, "grep", &["-c", "ERROR", "app.log"], &store).await;
        assert_eq!(result.output, "2");
    }

    #[tokio::test]
    async fn test_grep_quoted_pattern() {
        let store = store_with_log().await;
        let result = run(&Grep, "grep", &["\"timeout\"", "app.log"], &store).await;
        assert_eq!(result.output, "ERROR timeout");
    }

    #[tokio::test]
    async fn test_grep_missing_file() {
        let store = InMemoryStore::new();
        let result = run(&Grep, "grep", &["x", "nope.txt"], &store).await;
        assert_eq!(
            result.error.as_deref(),
            Some("grep: nope.txt: No such file or directory")
        );
    }

    #[tokio::test]
    async fn test_grep_directory() {
        let store = InMemoryStore::new();
        let result = run(&Grep, "grep", &["x", "Documents"], &store).await;
        assert_eq!(result.error.as_deref(), Some("grep: Documents: Is a directory"));
    }

    #[tokio::test]
    async fn test_grep_usage() {
        let store = InMemoryStore::new();
        let result = run(&Grep, "grep", &["only-pattern"], &store).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(USAGE));
    }
}
