//! Archive commands - tar, zip, unzip
//!
//! Archives are ordinary files holding a manifest of the archived paths,
//! one per line after a header. Contents are not stored, so extraction
//! only reports the entries.

use async_trait::async_trait;

use super::{Context, Handler, SideEffect, Simulation, display_path};
use crate::error::Result;
use crate::interpreter::CommandResult;

const MANIFEST_HEADER: &str = "SIMSH-ARCHIVE 1";

const TAR_USAGE: &str = "Usage: tar -c|-x|-t [-vzf] ARCHIVE [FILE...]";

/// Collect archive entries for the operands, failing on the first missing
/// one with its typed name.
async fn collect_entries(
    ctx: &Context<'_>,
    operands: &[&str],
) -> std::result::Result<Vec<String>, String> {
    let mut entries = Vec::new();
    for operand in operands {
        let resolved = ctx.resolve(operand);
        let Some(node) = ctx.store.get(&resolved).await else {
            return Err(operand.to_string());
        };
        let base = operand.trim_end_matches('/');
        if node.is_dir() {
            entries.push(format!("{}/", base));
            for child in ctx.store.descendants(&resolved).await {
                let rel = display_path(&resolved, &child.path);
                let suffix = if child.is_dir() { "/" } else { "" };
                entries.push(format!("{}/{}{}", base, rel, suffix));
            }
        } else {
            entries.push(base.to_string());
        }
    }
    Ok(entries)
}

fn manifest(entries: &[String]) -> String {
    let mut out = String::from(MANIFEST_HEADER);
    for entry in entries {
        out.push('\n');
        out.push_str(entry);
    }
    out
}

/// Entries of an archive file; foreign files yield none.
fn read_manifest(content: &str) -> Vec<&str> {
    let mut lines = content.lines();
    if lines.next() != Some(MANIFEST_HEADER) {
        return Vec::new();
    }
    lines.collect()
}

/// The tar command - create, list or extract archives.
///
/// Usage: tar -c|-x|-t [-vzf] ARCHIVE [FILE...]
///
/// Mode letters may be given without a dash (`tar czf out.tgz dir`).
pub struct Tar;

#[async_trait]
impl Handler for Tar {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        if ctx.args.len() < 2 {
            return Ok(CommandResult::err(TAR_USAGE));
        }
        let mode = ctx.args[0].trim_start_matches('-');
        let verbose = mode.contains('v');
        let archive = ctx.args[1].as_str();
        let operands: Vec<&str> = ctx.args[2..].iter().map(String::as_str).collect();

        if mode.contains('c') {
            if operands.is_empty() {
                return Ok(CommandResult::err(
                    "tar: Cowardly refusing to create an empty archive",
                ));
            }
            let entries = match collect_entries(&ctx, &operands).await {
                Ok(entries) => entries,
                Err(missing) => {
                    return Ok(CommandResult::err(format!(
                        "tar: {}: Cannot stat: No such file or directory",
                        missing
                    )));
                }
            };
            let output = if verbose { entries.join("\n") } else { String::new() };
            return Simulation::new(output)
                .effect(SideEffect::write(ctx.resolve(archive), manifest(&entries)))
                .apply(ctx.store)
                .await;
        }

        if mode.contains('x') || mode.contains('t') {
            let Some(node) = ctx.store.get(&ctx.resolve(archive)).await.filter(|n| n.is_file())
            else {
                return Ok(CommandResult::err(format!(
                    "tar: {}: Cannot open: No such file or directory",
                    archive
                )));
            };
            let listing = mode.contains('t');
            let output = if verbose || listing {
                read_manifest(node.text()).join("\n")
            } else {
                String::new()
            };
            return Ok(CommandResult::ok(output));
        }

        Ok(CommandResult::err(format!(
            "tar: You must specify one of the '-Acdtrux' options\n{}",
            TAR_USAGE
        )))
    }
}

/// The zip command - package files into a `.zip` archive.
///
/// Usage: zip [-r] ARCHIVE FILE...
pub struct Zip;

#[async_trait]
impl Handler for Zip {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let operands: Vec<&str> = ctx
            .args
            .iter()
            .filter(|a| !a.starts_with('-'))
            .map(String::as_str)
            .collect();
        let [archive, files @ ..] = operands.as_slice() else {
            return Ok(CommandResult::err(
                "zip error: Nothing to do! (try: zip -r archive.zip dir)",
            ));
        };
        if files.is_empty() {
            return Ok(CommandResult::err(format!(
                "zip error: Nothing to do! ({})",
                archive
            )));
        }

        let name = if archive.ends_with(".zip") {
            archive.to_string()
        } else {
            format!("{}.zip", archive)
        };
        let entries = match collect_entries(&ctx, files).await {
            Ok(entries) => entries,
            Err(missing) => {
                return Ok(CommandResult::err(format!(
                    "zip warning: name not matched: {}\n\nzip error: Nothing to do! ({})",
                    missing, name
                )));
            }
        };

        let output = entries
            .iter()
            .map(|e| format!("  adding: {} (stored 0%)", e))
            .collect::<Vec<_>>()
            .join("\n");
        Simulation::new(output)
            .effect(SideEffect::write(ctx.resolve(&name), manifest(&entries)))
            .apply(ctx.store)
            .await
    }
}

/// The unzip command - list the entries of a `.zip` archive.
///
/// Usage: unzip ARCHIVE
pub struct Unzip;

#[async_trait]
impl Handler for Unzip {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let Some(archive) = ctx.args.iter().find(|a| !a.starts_with('-')) else {
            return Ok(CommandResult::err(
                "UnZip 6.00 of 20 April 2009\nUsage: unzip [-opts] file[.zip] [list] [-d exdir]",
            ));
        };

        let mut found = None;
        for candidate in [archive.clone(), format!("{}.zip", archive)] {
            if let Some(node) = ctx.store.get(&ctx.resolve(&candidate)).await {
                if node.is_file() {
                    found = Some((candidate, node));
                    break;
                }
            }
        }
        let Some((name, node)) = found else {
            return Ok(CommandResult::err(format!(
                "unzip:  cannot find or open {a}, {a}.zip or {a}.ZIP.",
                a = archive
            )));
        };

        let mut lines = vec![format!("Archive:  {}", name)];
        for entry in read_manifest(node.text()) {
            if entry.ends_with('/') {
                lines.push(format!("   creating: {}", entry));
            } else {
                lines.push(format!("  inflating: {}", entry));
            }
        }
        Ok(CommandResult::ok(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::run;
    use crate::store::{InMemoryStore, NewNode, NodeStore};
    use pretty_assertions::assert_eq;

    async fn store_with_project() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .create(NewNode::directory("/home/user/site"))
            .await
            .unwrap();
        store
            .create(NewNode::file("/home/user/site/index.html", "<html>"))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_tar_create_and_list() {
        let store = store_with_project().await;
        let result = run(&Tar, "tar", &["-czvf", "site.tgz", "site"], &store).await;
        assert!(result.success);
        assert_eq!(result.output, "site/\nsite/index.html");
        assert!(store.get("/home/user/site.tgz").await.unwrap().is_file());

        let result = run(&Tar, "tar", &["tf", "site.tgz"], &store).await;
        assert_eq!(result.output, "site/\nsite/index.html");
    }

    #[tokio::test]
    async fn test_tar_extract_requires_archive() {
        let store = InMemoryStore::new();
        let result = run(&Tar, "tar", &["-xf", "missing.tar"], &store).await;
        assert_eq!(
            result.error.as_deref(),
            Some("tar: missing.tar: Cannot open: No such file or directory")
        );
    }

    #[tokio::test]
    async fn test_tar_usage_and_missing_member() {
        let store = InMemoryStore::new();
        let result = run(&Tar, "tar", &["-c"], &store).await;
        assert_eq!(result.error.as_deref(), Some(TAR_USAGE));

        let result = run(&Tar, "tar", &["-cf", "out.tar", "ghost"], &store).await;
        assert_eq!(
            result.error.as_deref(),
            Some("tar: ghost: Cannot stat: No such file or directory")
        );
        assert!(!store.exists("/home/user/out.tar").await);
    }

    #[tokio::test]
    async fn test_zip_then_unzip() {
        let store = store_with_project().await;
        let result = run(&Zip, "zip", &["-r", "bundle", "site"], &store).await;
        assert!(result.success);
        assert_eq!(
            result.output,
            "  adding: site/ (stored 0%)\n  adding: site/index.html (stored 0%)"
        );
        assert!(store.exists("/home/user/bundle.zip").await);

        let result = run(&Unzip, "unzip", &["bundle"], &store).await;
        assert_eq!(
            result.output,
            "Archive:  bundle.zip\n   creating: site/\n  inflating: site/index.html"
        );
    }

    #[tokio::test]
    async fn test_zip_errors() {
        let store = InMemoryStore::new();
        assert!(!run(&Zip, "zip", &[], &store).await.success);
        assert!(!run(&Zip, "zip", &["only.zip"], &store).await.success);
        assert!(!run(&Zip, "zip", &["a.zip", "ghost"], &store).await.success);
    }

    #[tokio::test]
    async fn test_unzip_missing() {
        let store = InMemoryStore::new();
        let result = run(&Unzip, "unzip", &["nope"], &store).await;
        assert_eq!(
            result.error.as_deref(),
            Some("unzip:  cannot find or open nope, nope.zip or nope.ZIP.")
        );
        assert!(!run(&Unzip, "unzip", &[], &store).await.success);
    }
}
