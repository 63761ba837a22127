//! File operation commands - mkdir, touch, rm, cp, mv, chmod

use async_trait::async_trait;

use super::{Context, Handler, split_flags};
use crate::error::{Error, Result};
use crate::interpreter::CommandResult;
use crate::path;
use crate::store::{NewNode, Node, NodePatch, NodeStore};

/// The mkdir command - create directories.
///
/// Usage: mkdir [-p] DIRECTORY...
///
/// Each operand is attempted independently; the command fails if any of
/// them failed.
pub struct Mkdir;

#[async_trait]
impl Handler for Mkdir {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let (flags, dirs) = match split_flags(ctx.args, "p") {
            Ok(parsed) => parsed,
            Err(c) => {
                return Ok(CommandResult::err(format!(
                    "mkdir: invalid option -- '{}'",
                    c
                )));
            }
        };
        if dirs.is_empty() {
            return Err(Error::MissingOperand("operand"));
        }
        let parents = flags.contains(&'p');

        let mut failures = Vec::new();
        for dir in dirs {
            let resolved = ctx.resolve(dir);
            let outcome = if parents {
                create_with_parents(ctx.store, &resolved).await
            } else {
                ctx.store.create(NewNode::directory(resolved)).await.map(|_| ())
            };
            if let Err(e) = outcome {
                failures.push(format!("mkdir: cannot create directory '{}': {}", dir, e));
            }
        }

        Ok(CommandResult::aggregate(failures))
    }
}

async fn create_with_parents(store: &dyn NodeStore, target: &str) -> Result<()> {
    let mut current = String::new();
    for segment in target.split('/').filter(|s| !s.is_empty()) {
        current.push('/');
        current.push_str(segment);
        match store.get(&current).await {
            Some(node) if node.is_dir() => {}
            Some(_) => return Err(Error::AlreadyExists(current)),
            None => match store.create(NewNode::directory(current.clone())).await {
                Ok(_) => {}
                // Created by another session since the lookup.
                Err(Error::AlreadyExists(_))
                    if store.get(&current).await.is_some_and(|n| n.is_dir()) => {}
                Err(e) => return Err(e),
            },
        }
    }
    Ok(())
}

/// The touch command - create empty files.
///
/// Usage: touch FILE...
///
/// Existing paths keep their content; only their modification time moves.
pub struct Touch;

#[async_trait]
impl Handler for Touch {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let files: Vec<&String> = ctx.args.iter().filter(|a| !a.starts_with('-')).collect();
        if files.is_empty() {
            return Err(Error::MissingOperand("file operand"));
        }

        let mut failures = Vec::new();
        for file in files {
            let resolved = ctx.resolve(file);
            let outcome = if ctx.store.exists(&resolved).await {
                ctx.store.update(&resolved, NodePatch::touch()).await
            } else {
                ctx.store.create(NewNode::file(resolved, "")).await
            };
            if let Err(e) = outcome {
                failures.push(format!("touch: cannot touch '{}': {}", file, e));
            }
        }

        Ok(CommandResult::aggregate(failures))
    }
}

/// The rm command - remove files or directories.
///
/// Usage: rm [-rf] FILE...
///
/// Directories are removed together with everything below them.
///
/// Options:
///   -f   Ignore nonexistent files
///   -r   Accepted for compatibility
pub struct Rm;

#[async_trait]
impl Handler for Rm {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let (flags, files) = match split_flags(ctx.args, "rRf") {
            Ok(parsed) => parsed,
            Err(c) => {
                return Ok(CommandResult::err(format!("rm: invalid option -- '{}'", c)));
            }
        };
        if files.is_empty() {
            return Err(Error::MissingOperand("operand"));
        }
        let force = flags.contains(&'f');

        let mut failures = Vec::new();
        for file in files {
            let resolved = ctx.resolve(file);
            if resolved == "/" {
                failures.push("rm: it is dangerous to operate recursively on '/'".to_string());
                continue;
            }
            if !ctx.store.delete(&resolved).await && !force {
                failures.push(format!(
                    "rm: cannot remove '{}': No such file or directory",
                    file
                ));
            }
        }

        Ok(CommandResult::aggregate(failures))
    }
}

/// Source and destination operands of cp/mv, with the final target path.
struct Transfer<'a> {
    src: &'a str,
    dst: &'a str,
    source: Node,
    target: String,
}

async fn plan_transfer<'a>(
    ctx: &Context<'_>,
    cmd: &str,
    operands: &[&'a str],
) -> std::result::Result<Transfer<'a>, CommandResult> {
    let (src, dst) = match operands {
        [] => return Err(CommandResult::err(format!("{}: missing file operand", cmd))),
        [src] => {
            return Err(CommandResult::err(format!(
                "{}: missing destination file operand after '{}'",
                cmd, src
            )));
        }
        [src, dst] => (*src, *dst),
        [_, _, extra, ..] => {
            return Err(CommandResult::err(format!(
                "{}: extra operand '{}'",
                cmd, extra
            )));
        }
    };

    let Some(source) = ctx.store.get(&ctx.resolve(src)).await else {
        return Err(CommandResult::err(format!(
            "{}: cannot stat '{}': No such file or directory",
            cmd, src
        )));
    };

    let dst_resolved = ctx.resolve(dst);
    let target = match ctx.store.get(&dst_resolved).await {
        Some(node) if node.is_dir() => path::join(&dst_resolved, &source.name),
        _ => dst_resolved,
    };

    if source.path == target {
        return Err(CommandResult::err(format!(
            "{}: '{}' and '{}' are the same file",
            cmd, src, dst
        )));
    }

    Ok(Transfer {
        src,
        dst,
        source,
        target,
    })
}

/// The cp command - copy files and directories.
///
/// Usage: cp [-r] SOURCE DEST
///
/// A directory source is copied with its whole subtree. If DEST is an
/// existing directory the copy lands inside it.
pub struct Cp;

#[async_trait]
impl Handler for Cp {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let (_, operands) = match split_flags(ctx.args, "rRpf") {
            Ok(parsed) => parsed,
            Err(c) => {
                return Ok(CommandResult::err(format!("cp: invalid option -- '{}'", c)));
            }
        };
        let transfer = match plan_transfer(&ctx, "cp", &operands).await {
            Ok(transfer) => transfer,
            Err(result) => return Ok(result),
        };

        if transfer.source.is_dir() && path::is_descendant(&transfer.target, &transfer.source.path)
        {
            return Ok(CommandResult::err(format!(
                "cp: cannot copy a directory, '{}', into itself, '{}'",
                transfer.src, transfer.dst
            )));
        }

        if let Err(e) = copy_tree(ctx.store, &transfer.source, &transfer.target).await {
            return Ok(CommandResult::err(format!(
                "cp: cannot create '{}': {}",
                transfer.dst, e
            )));
        }
        Ok(CommandResult::ok(""))
    }
}

async fn copy_tree(store: &dyn NodeStore, source: &Node, target: &str) -> Result<()> {
    let descendants = if source.is_dir() {
        store.descendants(&source.path).await
    } else {
        Vec::new()
    };

    copy_node(store, source, target.to_string()).await?;
    // Path order puts every directory before its children.
    for node in &descendants {
        copy_node(store, node, path::rebase(&node.path, &source.path, target)).await?;
    }
    Ok(())
}

async fn copy_node(store: &dyn NodeStore, node: &Node, target: String) -> Result<()> {
    let new = if node.is_dir() {
        NewNode::directory(target.clone())
    } else {
        NewNode::file(target.clone(), node.text())
    };
    store.upsert(new).await?;
    store
        .update(&target, NodePatch::permissions(node.permissions.clone()))
        .await?;
    Ok(())
}

/// The mv command - move or rename files and directories.
///
/// Usage: mv SOURCE DEST
pub struct Mv;

#[async_trait]
impl Handler for Mv {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let (_, operands) = match split_flags(ctx.args, "f") {
            Ok(parsed) => parsed,
            Err(c) => {
                return Ok(CommandResult::err(format!("mv: invalid option -- '{}'", c)));
            }
        };
        let transfer = match plan_transfer(&ctx, "mv", &operands).await {
            Ok(transfer) => transfer,
            Err(result) => return Ok(result),
        };

        match ctx.store.rename(&transfer.source.path, &transfer.target).await {
            Ok(()) => Ok(CommandResult::ok("")),
            Err(Error::Unsupported(reason)) => Ok(CommandResult::err(format!("mv: {}", reason))),
            Err(e) => Ok(CommandResult::err(format!(
                "mv: cannot move '{}' to '{}': {}",
                transfer.src, transfer.dst, e
            ))),
        }
    }
}

/// The chmod command - change the permission string.
///
/// Usage: chmod MODE FILE...
///
/// MODE is octal (`755`), symbolic (`u+x`, `go-w`, `+x`, `a=r`) or a
/// literal nine-character string (`rwxr-xr-x`). The type character stays
/// `d` for directories and `-` for files. Permissions are cosmetic.
pub struct Chmod;

#[async_trait]
impl Handler for Chmod {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let (mode, files) = match ctx.args {
            [] => return Err(Error::MissingOperand("operand")),
            [mode] => {
                return Ok(CommandResult::err(format!(
                    "chmod: missing operand after '{}'",
                    mode
                )));
            }
            [mode, files @ ..] => (mode.as_str(), files),
        };

        let mut failures = Vec::new();
        for file in files {
            let resolved = ctx.resolve(file);
            let Some(node) = ctx.store.get(&resolved).await else {
                failures.push(format!(
                    "chmod: cannot access '{}': No such file or directory",
                    file
                ));
                continue;
            };
            let Some(permissions) = apply_mode(&node.permissions, node.is_dir(), mode) else {
                return Ok(CommandResult::err(format!("chmod: invalid mode: '{}'", mode)));
            };
            ctx.store
                .update(&resolved, NodePatch::permissions(permissions))
                .await?;
        }

        Ok(CommandResult::aggregate(failures))
    }
}

const RWX: [char; 3] = ['r', 'w', 'x'];

/// Compute a new permission string, or `None` for an invalid mode.
fn apply_mode(current: &str, is_dir: bool, mode: &str) -> Option<String> {
    let type_char = if is_dir { 'd' } else { '-' };

    let mut bits: [bool; 9] = [false; 9];
    for (i, c) in current.chars().skip(1).take(9).enumerate() {
        bits[i] = c != '-';
    }

    if !mode.is_empty() && mode.len() <= 4 && mode.chars().all(|c| ('0'..='7').contains(&c)) {
        let digits: Vec<u32> = mode.chars().filter_map(|c| c.to_digit(8)).collect();
        let digits = &digits[digits.len().saturating_sub(3)..];
        let padded: Vec<u32> = std::iter::repeat_n(0, 3 - digits.len())
            .chain(digits.iter().copied())
            .collect();
        for (class, value) in padded.iter().enumerate() {
            for (offset, mask) in [4, 2, 1].iter().enumerate() {
                bits[class * 3 + offset] = value & mask != 0;
            }
        }
    } else if is_literal(mode) {
        for (i, c) in mode.chars().enumerate() {
            bits[i] = c != '-';
        }
    } else {
        for clause in mode.split(',') {
            apply_symbolic(&mut bits, clause)?;
        }
    }

    let mut out = String::with_capacity(10);
    out.push(type_char);
    for (i, set) in bits.iter().enumerate() {
        out.push(if *set { RWX[i % 3] } else { '-' });
    }
    Some(out)
}

fn is_literal(mode: &str) -> bool {
    mode.len() == 9
        && mode
            .chars()
            .enumerate()
            .all(|(i, c)| c == '-' || c == RWX[i % 3])
}

fn apply_symbolic(bits: &mut [bool; 9], clause: &str) -> Option<()> {
    let op_pos = clause.find(['+', '-', '='])?;
    let (who, rest) = clause.split_at(op_pos);
    let mut chars = rest.chars();
    let op = chars.next()?;
    let perms: Vec<usize> = chars
        .map(|c| RWX.iter().position(|p| *p == c))
        .collect::<Option<_>>()?;

    let classes: Vec<usize> = if who.is_empty() || who.contains('a') {
        vec![0, 1, 2]
    } else {
        who.chars()
            .map(|c| match c {
                'u' => Some(0),
                'g' => Some(1),
                'o' => Some(2),
                _ => None,
            })
            .collect::<Option<_>>()?
    };

    for class in classes {
        if op == '=' {
            for offset in 0..3 {
                bits[class * 3 + offset] = false;
            }
        }
        for &offset in &perms {
            bits[class * 3 + offset] = op != '-';
        }
    }
    Some(())
}
