//! Git command.
//!
//! Simulates repository operations on the node store. Nothing is tracked:
//! `clone` and `init` create the directory layout a real checkout would
//! have, every other subcommand answers with canned text.
//!
//! # Supported Subcommands
//!
//! - `git clone <url> [dir]` - Create a repository with starter files
//! - `git init [dir]` - Create `.git` in a directory
//! - `git status`, `git add`, `git commit -m <msg>`, `git push`,
//!   `git pull`, `git log`, `git branch`, `git --version`

use async_trait::async_trait;
use serde_json::json;
use sha1::{Digest, Sha1};
use url::Url;

use super::{Context, Handler, SideEffect, Simulation};
use crate::error::{Error, Result};
use crate::interpreter::CommandResult;
use crate::logging_impl::strip_credentials;
use crate::path;

const VERSION: &str = "git version 2.43.0";
const DEFAULT_BRANCH: &str = "main";
const INITIAL_COMMIT_DATE: &str = "Mon Jan 1 09:00:00 2024 +0000";

const USAGE: &str = "usage: git [--version] <command> [<args>]\n\n\
These are common Git commands:\n\
   clone     Clone a repository into a new directory\n\
   init      Create an empty Git repository\n\
   add       Add file contents to the index\n\
   status    Show the working tree status\n\
   commit    Record changes to the repository\n\
   log       Show commit logs\n\
   branch    List branches\n\
   pull      Fetch from and integrate with another repository\n\
   push      Update remote refs along with associated objects";

const GITIGNORE: &str = "node_modules/\n.env\n*.log\ndist/\n.DS_Store";

/// Git command.
pub struct Git;

#[async_trait]
impl Handler for Git {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let Some(subcommand) = ctx.args.first() else {
            return Ok(CommandResult::err(USAGE));
        };
        let rest = &ctx.args[1..];

        match subcommand.as_str() {
            "--version" | "version" => Ok(CommandResult::ok(VERSION)),
            "clone" => clone(&ctx, rest).await,
            "init" => init(&ctx, rest).await,
            "status" => Ok(CommandResult::ok(format!(
                "On branch {}\nYour branch is up to date with 'origin/{}'.\n\n\
                 nothing to commit, working tree clean",
                DEFAULT_BRANCH, DEFAULT_BRANCH
            ))),
            "add" => Ok(CommandResult::ok("")),
            "commit" => Ok(commit(rest)),
            "push" => Ok(CommandResult::ok(format!(
                "Enumerating objects: 5, done.\n\
                 Counting objects: 100% (5/5), done.\n\
                 Writing objects: 100% (3/3), 312 bytes | 312.00 KiB/s, done.\n\
                 Total 3 (delta 1), reused 0 (delta 0), pack-reused 0\n\
                 To origin\n   {}..{}  {} -> {}",
                short_id(&["push", "base"]),
                short_id(&["push", rest.join(" ").as_str()]),
                DEFAULT_BRANCH,
                DEFAULT_BRANCH
            ))),
            "pull" => Ok(CommandResult::ok("Already up to date.")),
            "log" => Ok(CommandResult::ok(format!(
                "commit {}\nAuthor: user <user@simsh.local>\nDate:   {}\n\n    Initial commit",
                object_id(&["commit", "Initial commit"]),
                INITIAL_COMMIT_DATE
            ))),
            "branch" => Ok(CommandResult::ok(format!("* {}", DEFAULT_BRANCH))),
            other => Ok(CommandResult::err(format!(
                "git: '{}' is not a git command. See 'git --help'.",
                other
            ))),
        }
    }
}

/// Repository name from a clone URL: last path segment without `.git`.
///
/// Handles both URLs and scp-style `git@host:owner/repo.git` remotes.
fn repo_name(remote: &str) -> Option<String> {
    let path_part = match Url::parse(remote) {
        Ok(url) => url.path().to_string(),
        Err(_) => remote.rsplit_once(':').map(|(_, p)| p.to_string())?,
    };
    let last = path_part.trim_end_matches('/').rsplit('/').next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    (!name.is_empty()).then(|| name.to_string())
}

async fn clone(ctx: &Context<'_>, args: &[String]) -> Result<CommandResult> {
    let operands: Vec<&str> = args
        .iter()
        .filter(|a| !a.starts_with('-'))
        .map(String::as_str)
        .collect();
    let Some(remote) = operands.first() else {
        return Ok(CommandResult::err(
            "fatal: You must specify a repository to clone.",
        ));
    };
    let Some(name) = operands
        .get(1)
        .map(|d| d.to_string())
        .or_else(|| repo_name(remote))
    else {
        return Ok(CommandResult::err(format!(
            "fatal: repository '{}' does not exist",
            remote
        )));
    };

    let target = ctx.resolve(&name);
    if ctx.store.exists(&target).await {
        return Ok(CommandResult::err(format!(
            "fatal: destination path '{}' already exists and is not an empty directory.",
            name
        )));
    }
    tracing::debug!(remote = %ctx.log_config.redact_url(remote), target = %target, "simulated clone");
    let origin = strip_credentials(remote);

    let package = json!({
        "name": path::file_name(&target).to_lowercase(),
        "version": "1.0.0",
        "description": format!("Cloned from {}", origin),
        "main": "index.js",
        "scripts": {
            "start": "node index.js",
            "test": "echo \"Error: no test specified\" && exit 1"
        },
        "license": "MIT"
    });
    let package = serde_json::to_string_pretty(&package)
        .map_err(|e| Error::Internal(e.to_string()))?;

    let digest = Sha1::digest(origin.as_bytes());
    let objects = 20 + u32::from(digest[0]) % 180;
    let deltas = objects / 3;
    let output = format!(
        "Cloning into '{name}'...\n\
         remote: Enumerating objects: {objects}, done.\n\
         remote: Counting objects: 100% ({objects}/{objects}), done.\n\
         remote: Compressing objects: 100% ({deltas}/{deltas}), done.\n\
         remote: Total {objects} (delta {deltas}), reused {objects} (delta {deltas}), pack-reused 0\n\
         Receiving objects: 100% ({objects}/{objects}), done.\n\
         Resolving deltas: 100% ({deltas}/{deltas}), done."
    );

    Simulation::new(output)
        .effect(SideEffect::CreateDir(target.clone()))
        .effect(SideEffect::CreateDir(path::join(&target, ".git")))
        .effect(SideEffect::write(
            path::join(&target, "README.md"),
            format!("# {}\n\nCloned from {}", path::file_name(&target), origin),
        ))
        .effect(SideEffect::write(path::join(&target, ".gitignore"), GITIGNORE))
        .effect(SideEffect::write(path::join(&target, "package.json"), package))
        .apply(ctx.store)
        .await
}

async fn init(ctx: &Context<'_>, args: &[String]) -> Result<CommandResult> {
    let dir = args
        .iter()
        .find(|a| !a.starts_with('-'))
        .map(|d| ctx.resolve(d))
        .unwrap_or_else(|| ctx.cwd().to_string());
    let git_dir = path::join(&dir, ".git");

    if ctx.store.exists(&git_dir).await {
        return Ok(CommandResult::ok(format!(
            "Reinitialized existing Git repository in {}/",
            git_dir
        )));
    }

    Simulation::new(format!("Initialized empty Git repository in {}/", git_dir))
        .effect(SideEffect::CreateDir(dir))
        .effect(SideEffect::CreateDir(git_dir.clone()))
        .effect(SideEffect::write(
            path::join(&git_dir, "HEAD"),
            format!("ref: refs/heads/{}", DEFAULT_BRANCH),
        ))
        .apply(ctx.store)
        .await
}

fn commit(args: &[String]) -> CommandResult {
    let message = args
        .iter()
        .position(|a| a == "-m")
        .map(|pos| args[pos + 1..].join(" ").replace(['"', '\''], ""))
        .filter(|m| !m.is_empty());
    match message {
        Some(message) => CommandResult::ok(format!(
            "[{} {}] {}\n 1 file changed, 1 insertion(+)",
            DEFAULT_BRANCH,
            short_id(&["commit", message.as_str()]),
            message
        )),
        None => CommandResult::err("Aborting commit due to empty commit message."),
    }
}

/// Hex SHA-1 over the parts, so identical arguments name identical objects.
fn object_id(parts: &[&str]) -> String {
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn short_id(parts: &[&str]) -> String {
    let mut id = object_id(parts);
    id.truncate(7);
    id
}
