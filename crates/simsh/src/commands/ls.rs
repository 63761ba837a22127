//! Directory listing commands - ls, find

use async_trait::async_trait;

use super::{Context, DEFAULT_USERNAME, Handler, split_flags};
use crate::error::Result;
use crate::interpreter::CommandResult;
use crate::path;
use crate::store::Node;

/// Options for ls command
#[derive(Default)]
struct LsOptions {
    long: bool,
    all: bool,
    one_per_line: bool,
}

/// The ls command - list directory contents.
///
/// Usage: ls [-l] [-a] [-1] [PATH...]
///
/// Options:
///   -l   Long listing, in creation order
///   -a   Include entries starting with `.`
///   -1   One entry per line
///
/// The short format sorts names lexicographically and joins them with two
/// spaces.
pub struct Ls;

#[async_trait]
impl Handler for Ls {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let (flags, mut operands) = match split_flags(ctx.args, "la1") {
            Ok(parsed) => parsed,
            Err(c) => {
                return Ok(CommandResult::err(format!("ls: invalid option -- '{}'", c)));
            }
        };
        let opts = LsOptions {
            long: flags.contains(&'l'),
            all: flags.contains(&'a'),
            one_per_line: flags.contains(&'1'),
        };

        if operands.is_empty() {
            operands.push(".");
        }
        let with_headers = operands.len() > 1;

        let mut sections = Vec::new();
        let mut failures = Vec::new();
        for operand in operands {
            let resolved = ctx.resolve(operand);
            let Some(node) = ctx.store.get(&resolved).await else {
                failures.push(format!(
                    "ls: cannot access '{}': No such file or directory",
                    operand
                ));
                continue;
            };

            let listing = if node.is_dir() {
                let children: Vec<Node> = ctx
                    .store
                    .list_children(&resolved)
                    .await
                    .into_iter()
                    .filter(|n| opts.all || !n.is_hidden())
                    .collect();
                render(&children, &opts, true)
            } else {
                let mut single = node;
                single.name = operand.to_string();
                render(&[single], &opts, false)
            };

            if with_headers {
                sections.push(format!("{}:\n{}", operand, listing));
            } else {
                sections.push(listing);
            }
        }

        let output = sections.join("\n\n");
        match failures.first() {
            None => Ok(CommandResult::ok(output)),
            Some(first) => {
                let mut result = CommandResult::err(first.clone());
                result.output = failures
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::once(output.as_str()).filter(|s| !s.is_empty()))
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(result)
            }
        }
    }
}

fn render(nodes: &[Node], opts: &LsOptions, with_total: bool) -> String {
    if opts.long {
        let mut lines = Vec::with_capacity(nodes.len() + 1);
        if with_total {
            let blocks: u64 = nodes.iter().map(|n| n.size.div_ceil(1024) * 4).sum();
            lines.push(format!("total {}", blocks));
        }
        lines.extend(nodes.iter().map(format_long_entry));
        return lines.join("\n");
    }

    let mut names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
    names.sort_unstable();
    names.join(if opts.one_per_line { "\n" } else { "  " })
}

fn format_long_entry(node: &Node) -> String {
    let links = if node.is_dir() { 2 } else { 1 };
    format!(
        "{} {} {} {} {:>6} {} {}",
        node.permissions,
        links,
        DEFAULT_USERNAME,
        DEFAULT_USERNAME,
        node.size,
        node.updated_at.format("%b %e %H:%M"),
        node.name
    )
}

/// The find command - search for nodes below a directory.
///
/// Usage: find [PATH] [-name PATTERN] [-type f|d]
///
/// `-name *` matches everything. Other patterns have their `*` wildcards
/// stripped and match as a substring of the name.
pub struct Find;

#[async_trait]
impl Handler for Find {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let mut start: Option<&str> = None;
        let mut name_pattern: Option<String> = None;
        let mut type_filter: Option<char> = None;

        let mut args = ctx.args.iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-name" | "-iname" => match args.next() {
                    Some(pattern) => name_pattern = Some(pattern.replace(['"', '\''], "")),
                    None => {
                        return Ok(CommandResult::err(
                            "find: missing argument to `-name'",
                        ));
                    }
                },
                "-type" => match args.next().map(|s| s.as_str()) {
                    Some("f") => type_filter = Some('f'),
                    Some("d") => type_filter = Some('d'),
                    Some(other) => {
                        return Ok(CommandResult::err(format!(
                            "find: Unknown argument to -type: {}",
                            other
                        )));
                    }
                    None => {
                        return Ok(CommandResult::err(
                            "find: missing argument to `-type'",
                        ));
                    }
                },
                other if other.starts_with('-') => {
                    return Ok(CommandResult::err(format!(
                        "find: unknown predicate `{}'",
                        other
                    )));
                }
                other => {
                    if start.is_none() {
                        start = Some(other);
                    }
                }
            }
        }

        let start = start.unwrap_or(".");
        let root = ctx.resolve(start);
        let Some(root_node) = ctx.store.get(&root).await else {
            return Ok(CommandResult::ok(""));
        };

        let mut candidates = vec![root_node];
        candidates.extend(ctx.store.descendants(&root).await);

        let needle = name_pattern.as_deref().map(|p| p.replace('*', ""));
        let matches: Vec<String> = candidates
            .iter()
            .filter(|n| match &needle {
                Some(needle) => name_pattern.as_deref() == Some("*") || n.name.contains(needle.as_str()),
                None => true,
            })
            .filter(|n| match type_filter {
                Some('f') => n.is_file(),
                Some('d') => n.is_dir(),
                _ => true,
            })
            .map(|n| display_found(start, &root, &n.path))
            .collect();

        Ok(CommandResult::ok(matches.join("\n")))
    }
}

/// Render a found path the way it was reached from the typed start.
fn display_found(start: &str, root: &str, found: &str) -> String {
    if found == root {
        return start.to_string();
    }
    let rel = path::rebase(found, root, "/");
    let start = start.trim_end_matches('/');
    format!("{}{}", start, rel)
}
