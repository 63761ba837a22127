//! echo command

use async_trait::async_trait;

use super::{Context, Handler};
use crate::error::Result;
use crate::interpreter::CommandResult;
use crate::store::NewNode;

/// The echo command - print or write text.
///
/// Usage: echo [-e] [TEXT...] [> FILE | >> FILE]
///
/// Double quotes are stripped from the text. With `>` the text replaces the
/// file content, with `>>` it is appended as a new line.
pub struct Echo;

/// Where echo sends its text.
#[derive(Debug, PartialEq, Eq)]
enum Redirect<'a> {
    Stdout,
    Truncate(&'a str),
    Append(&'a str),
}

#[async_trait]
impl Handler for Echo {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let mut args: &[String] = ctx.args;
        let mut interpret_escapes = false;
        while let Some(first) = args.first() {
            match first.as_str() {
                "-e" => interpret_escapes = true,
                "-n" | "-E" => {}
                _ => break,
            }
            args = &args[1..];
        }

        let (words, redirect) = match split_redirect(args) {
            Ok(split) => split,
            Err(msg) => return Ok(CommandResult::err(msg)),
        };

        let mut text = words.join(" ").replace('"', "");
        if interpret_escapes {
            text = text.replace("\\n", "\n").replace("\\t", "\t");
        }

        match redirect {
            Redirect::Stdout => Ok(CommandResult::ok(text)),
            Redirect::Truncate(file) => write_file(&ctx, file, text).await,
            Redirect::Append(file) => {
                let resolved = ctx.resolve(file);
                let content = match ctx.store.get(&resolved).await {
                    Some(node) if !node.text().is_empty() => format!("{}\n{}", node.text(), text),
                    _ => text,
                };
                write_file(&ctx, file, content).await
            }
        }
    }
}

/// Split the words to print from a trailing `>`/`>>` redirection.
///
/// Accepts both `> file` and `>file`.
fn split_redirect(args: &[String]) -> std::result::Result<(Vec<&str>, Redirect<'_>), String> {
    let Some(pos) = args.iter().position(|a| a.starts_with('>')) else {
        return Ok((args.iter().map(String::as_str).collect(), Redirect::Stdout));
    };

    let words = args[..pos].iter().map(String::as_str).collect();
    let token = args[pos].as_str();
    let (append, attached) = match token.strip_prefix(">>") {
        Some(rest) => (true, rest),
        None => (false, &token[1..]),
    };
    let target = if attached.is_empty() {
        args.get(pos + 1).map(String::as_str)
    } else {
        Some(attached)
    };

    match target {
        Some(file) => {
            let file = file.trim_matches('"');
            Ok((
                words,
                if append {
                    Redirect::Append(file)
                } else {
                    Redirect::Truncate(file)
                },
            ))
        }
        None => Err("syntax error near unexpected token `newline'".to_string()),
    }
}

async fn write_file(ctx: &Context<'_>, file: &str, content: String) -> Result<CommandResult> {
    match ctx.store.upsert(NewNode::file(ctx.resolve(file), content)).await {
        Ok(_) => Ok(CommandResult::ok("")),
        Err(e) => Ok(CommandResult::err(format!("echo: {}: {}", file, e))),
    }
}
