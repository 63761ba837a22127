//! Language toolchain commands - interpreters, compilers, package managers
//!
//! Interpreters never execute code. They echo the string literals passed
//! to the language's print call in the source, or a canned line when
//! there are none. Compilers check their inputs and drop a placeholder
//! artifact next to them.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Context, Handler, SideEffect, Simulation};
use crate::error::{Error, Result};
use crate::interpreter::CommandResult;
use crate::path;
use crate::store;

const PYTHON_VERSION: &str = "3.11.4";
const NODE_VERSION: &str = "v20.11.0";
const NPM_VERSION: &str = "10.2.4";
const JAVA_VERSION: &str = "17.0.9";

/// Collect the leading string literal of every `call(` in `source`.
///
/// `print("a", x)` yields `a`; calls whose first argument is not a literal
/// are skipped.
fn extract_literals(source: &str, call: &str) -> Vec<String> {
    let needle = format!("{}(", call);
    let mut found = Vec::new();
    let mut rest = source;
    while let Some(idx) = rest.find(&needle) {
        rest = &rest[idx + needle.len()..];
        let arg = rest.trim_start();
        let Some(quote) = arg.chars().next().filter(|c| matches!(c, '"' | '\'' | '`')) else {
            continue;
        };
        if let Some(end) = arg[1..].find(quote) {
            found.push(arg[1..1 + end].to_string());
        }
    }
    found
}

/// Look up a source file, mapping absence and directories to errors.
async fn source_file(ctx: &Context<'_>, raw: &str) -> Result<store::Node> {
    let resolved = ctx.resolve(raw);
    match ctx.store.get(&resolved).await {
        Some(node) if node.is_dir() => Err(Error::IsADirectory(resolved)),
        Some(node) => Ok(node),
        None => Err(Error::NotFound(resolved)),
    }
}

/// Output of a simulated script run.
fn script_output(source: &str, call: &str) -> String {
    let lines = extract_literals(source, call);
    if lines.is_empty() {
        "Script executed successfully".to_string()
    } else {
        lines.join("\n")
    }
}

/// The python command - simulated Python interpreter.
///
/// Usage: python [--version] [-c CODE] [FILE]
///
/// Registered as both `python` and `python3`.
pub struct Python;

#[async_trait]
impl Handler for Python {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        match ctx.args.first().map(String::as_str) {
            None => Ok(CommandResult::ok(format!(
                "Python {} (main, Jun  7 2023, 12:45:48) [GCC 11.4.0] on linux\n\
                 Type \"help\", \"copyright\", \"credits\" or \"license\" for more information.\n\
                 (interactive mode is not available in this shell)",
                PYTHON_VERSION
            ))),
            Some("--version" | "-V") => Ok(CommandResult::ok(format!("Python {}", PYTHON_VERSION))),
            Some("-c") => {
                let code = ctx.args[1..].join(" ");
                let code = code.trim_matches(['"', '\'']);
                Ok(CommandResult::ok(extract_literals(code, "print").join("\n")))
            }
            Some(file) => match source_file(&ctx, file).await {
                Ok(node) => Ok(CommandResult::ok(script_output(node.text(), "print"))),
                Err(e) => Ok(CommandResult::err(format!(
                    "{}: can't open file '{}': [Errno 2] {}",
                    ctx.name,
                    ctx.resolve(file),
                    e
                ))),
            },
        }
    }
}

/// The node command - simulated Node.js runtime.
///
/// Usage: node [-v] [-e CODE] [FILE]
pub struct Node;

#[async_trait]
impl Handler for Node {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        match ctx.args.first().map(String::as_str) {
            None => Ok(CommandResult::ok(format!(
                "Welcome to Node.js {}.\nType \".help\" for more information.\n\
                 (interactive mode is not available in this shell)",
                NODE_VERSION
            ))),
            Some("-v" | "--version") => Ok(CommandResult::ok(NODE_VERSION)),
            Some("-e" | "--eval") => {
                let code = ctx.args[1..].join(" ");
                Ok(CommandResult::ok(
                    extract_literals(&code, "console.log").join("\n"),
                ))
            }
            Some(file) => match source_file(&ctx, file).await {
                Ok(node) => Ok(CommandResult::ok(script_output(node.text(), "console.log"))),
                Err(Error::IsADirectory(_)) => Ok(CommandResult::err(format!(
                    "Error: EISDIR: illegal operation on a directory, read '{}'",
                    ctx.resolve(file)
                ))),
                Err(_) => Ok(CommandResult::err(format!(
                    "Error: Cannot find module '{}'",
                    ctx.resolve(file)
                ))),
            },
        }
    }
}

/// The java command - run a compiled class.
///
/// Usage: java [-version] CLASS
///
/// `CLASS.class` must exist in the working directory. Output comes from
/// the `System.out.println` literals of `CLASS.java` when present.
pub struct Java;

#[async_trait]
impl Handler for Java {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let Some(class) = ctx.args.iter().find(|a| !a.starts_with('-')) else {
            if ctx.args.iter().any(|a| a == "-version" || a == "--version") {
                return Ok(CommandResult::ok(format!(
                    "openjdk version \"{v}\" 2023-10-17\n\
                     OpenJDK Runtime Environment (build {v}+9)\n\
                     OpenJDK 64-Bit Server VM (build {v}+9, mixed mode, sharing)",
                    v = JAVA_VERSION
                )));
            }
            return Ok(CommandResult::err(
                "Usage: java [options] <mainclass> [args...]",
            ));
        };
        let class = class.strip_suffix(".class").unwrap_or(class.as_str());

        if source_file(&ctx, &format!("{}.class", class)).await.is_err() {
            return Ok(CommandResult::err(format!(
                "Error: Could not find or load main class {}\n\
                 Caused by: java.lang.ClassNotFoundException: {}",
                class, class
            )));
        }

        let output = match source_file(&ctx, &format!("{}.java", class)).await {
            Ok(source) => script_output(source.text(), "System.out.println"),
            Err(_) => "Program executed successfully".to_string(),
        };
        Ok(CommandResult::ok(output))
    }
}

/// The javac command - compile Java sources into class files.
///
/// Usage: javac FILE.java...
///
/// Each `X.java` produces `X.class` in the same directory.
pub struct Javac;

#[async_trait]
impl Handler for Javac {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let sources: Vec<&String> = ctx.args.iter().filter(|a| !a.starts_with('-')).collect();
        if sources.is_empty() {
            return Ok(CommandResult::err("error: no source files"));
        }

        let mut simulation = Simulation::new("");
        for source in sources {
            let Some(stem) = source.strip_suffix(".java") else {
                return Ok(CommandResult::err(format!(
                    "error: Class names, '{}', are only accepted if annotation processing is explicitly requested",
                    source
                )));
            };
            if let Err(e) = source_file(&ctx, source).await {
                if matches!(e, Error::NotFound(_)) {
                    return Ok(CommandResult::err(format!("error: file not found: {}", source)));
                }
                return Err(e);
            }
            simulation = simulation.effect(SideEffect::write(
                ctx.resolve(&format!("{}.class", stem)),
                format!("CAFEBABE compiled from {}", path::file_name(source)),
            ));
        }

        simulation.apply(ctx.store).await
    }
}

/// The gcc command - compile C/C++ sources.
///
/// Usage: gcc [-o OUTPUT] FILE...
///
/// Registered as `gcc` and `g++`. The output defaults to `a.out` in the
/// working directory and is created executable.
pub struct Gcc;

#[async_trait]
impl Handler for Gcc {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let mut output: Option<&str> = None;
        let mut inputs: Vec<&str> = Vec::new();

        let mut args = ctx.args.iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-o" => match args.next() {
                    Some(out) => output = Some(out.as_str()),
                    None => {
                        return Ok(CommandResult::err(format!(
                            "{}: error: missing filename after '-o'",
                            ctx.name
                        )));
                    }
                },
                "--version" => {
                    return Ok(CommandResult::ok(format!(
                        "{} (Ubuntu 11.4.0-1ubuntu1~22.04) 11.4.0",
                        ctx.name
                    )));
                }
                _ if arg.starts_with('-') => {}
                _ => inputs.push(arg.as_str()),
            }
        }

        if inputs.is_empty() {
            return Ok(CommandResult::err(format!(
                "{}: fatal error: no input files\ncompilation terminated.",
                ctx.name
            )));
        }
        for input in &inputs {
            if let Err(e) = source_file(&ctx, input).await {
                return Ok(CommandResult::err(format!(
                    "{name}: error: {input}: {e}\n{name}: fatal error: no input files\n\
                     compilation terminated.",
                    name = ctx.name
                )));
            }
        }

        let target = ctx.resolve(output.unwrap_or("a.out"));
        Simulation::new("")
            .effect(SideEffect::executable(
                target,
                format!("ELF 64-bit LSB executable built from {}", inputs.join(" ")),
            ))
            .apply(ctx.store)
            .await
    }
}

/// The npm command - canned Node.js package manager.
///
/// Usage: npm <install|init|run|start|test|-v> [ARGS]
///
/// `install` creates `node_modules/` (and a directory per named package),
/// `init` writes `package.json`, `run` looks scripts up in `package.json`.
pub struct Npm;

#[async_trait]
impl Handler for Npm {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let Some(subcommand) = ctx.args.first() else {
            return Ok(CommandResult::err(
                "Usage: npm <command>\n\nwhere <command> is one of:\n    \
                 init, install, run, start, test, -v",
            ));
        };
        let rest = &ctx.args[1..];

        match subcommand.as_str() {
            "-v" | "--version" => Ok(CommandResult::ok(NPM_VERSION)),
            "install" | "i" | "add" => npm_install(&ctx, rest).await,
            "init" => npm_init(&ctx).await,
            "run" | "run-script" => match rest.first() {
                Some(script) => npm_run(&ctx, script).await,
                None => npm_list_scripts(&ctx).await,
            },
            "start" | "test" => npm_run(&ctx, subcommand).await,
            other => Ok(CommandResult::err(format!(
                "Unknown command: \"{}\"\n\nTo see a list of supported npm commands, run:\n  npm help",
                other
            ))),
        }
    }
}

async fn npm_install(ctx: &Context<'_>, packages: &[String]) -> Result<CommandResult> {
    let modules = ctx.resolve("node_modules");
    let named: Vec<&String> = packages.iter().filter(|p| !p.starts_with('-')).collect();
    let count = if named.is_empty() { 127 } else { named.len() * 12 };

    let mut simulation = Simulation::new(format!(
        "\nadded {count} packages, and audited {} packages in 3s\n\n\
         {} packages are looking for funding\n  run `npm fund` for details\n\n\
         found 0 vulnerabilities",
        count + 1,
        count / 8
    ))
    .effect(SideEffect::CreateDir(modules.clone()));
    for package in named {
        let name = package
            .split('@')
            .find(|s| !s.is_empty())
            .unwrap_or(package.as_str());
        simulation = simulation.effect(SideEffect::CreateDir(path::join(&modules, name)));
    }
    simulation.apply(ctx.store).await
}

async fn npm_init(ctx: &Context<'_>) -> Result<CommandResult> {
    let target = ctx.resolve("package.json");
    let manifest = json!({
        "name": path::file_name(ctx.cwd()).to_lowercase(),
        "version": "1.0.0",
        "description": "",
        "main": "index.js",
        "scripts": {
            "test": "echo \"Error: no test specified\" && exit 1"
        },
        "keywords": [],
        "author": "",
        "license": "ISC"
    });
    let manifest =
        serde_json::to_string_pretty(&manifest).map_err(|e| Error::Internal(e.to_string()))?;

    Simulation::new(format!("Wrote to {}:\n\n{}", target, manifest))
        .effect(SideEffect::write(target, manifest))
        .apply(ctx.store)
        .await
}

/// Parse `package.json` in the working directory.
async fn read_manifest(ctx: &Context<'_>) -> std::result::Result<Value, CommandResult> {
    let target = ctx.resolve("package.json");
    let Some(node) = ctx.store.get(&target).await.filter(|n| n.is_file()) else {
        return Err(CommandResult::err(format!(
            "npm ERR! code ENOENT\nnpm ERR! enoent Could not read package.json: \
             no such file or directory, open '{}'",
            target
        )));
    };
    serde_json::from_str(node.text()).map_err(|e| {
        CommandResult::err(format!(
            "npm ERR! code EJSONPARSE\nnpm ERR! JSON.parse Failed to parse json: {}",
            e
        ))
    })
}

async fn npm_run(ctx: &Context<'_>, script: &str) -> Result<CommandResult> {
    let manifest = match read_manifest(ctx).await {
        Ok(manifest) => manifest,
        Err(result) => return Ok(result),
    };
    let Some(command) = manifest["scripts"][script].as_str() else {
        return Ok(CommandResult::err(format!(
            "npm ERR! Missing script: \"{}\"",
            script
        )));
    };
    let name = manifest["name"].as_str().unwrap_or("package");
    let version = manifest["version"].as_str().unwrap_or("1.0.0");
    Ok(CommandResult::ok(format!(
        "\n> {}@{} {}\n> {}\n",
        name, version, script, command
    )))
}

async fn npm_list_scripts(ctx: &Context<'_>) -> Result<CommandResult> {
    let manifest = match read_manifest(ctx).await {
        Ok(manifest) => manifest,
        Err(result) => return Ok(result),
    };
    let scripts: Vec<String> = manifest["scripts"]
        .as_object()
        .map(|map| {
            map.iter()
                .map(|(name, cmd)| format!("  {}\n    {}", name, cmd.as_str().unwrap_or_default()))
                .collect()
        })
        .unwrap_or_default();
    Ok(CommandResult::ok(format!(
        "Scripts available via `npm run-script`:\n{}",
        scripts.join("\n")
    )))
}

/// The pip command - canned Python package manager.
///
/// Usage: pip <install|list|freeze|--version> [PACKAGES]
///
/// Registered as `pip` and `pip3`. Nothing is written to the store.
pub struct Pip;

#[async_trait]
impl Handler for Pip {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let Some(subcommand) = ctx.args.first() else {
            return Ok(CommandResult::err(format!(
                "\nUsage:\n  {} <command> [options]\n\nCommands:\n  \
                 install    Install packages.\n  list       List installed packages.\n  \
                 freeze     Output installed packages in requirements format.",
                ctx.name
            )));
        };

        match subcommand.as_str() {
            "--version" | "-V" => Ok(CommandResult::ok(format!(
                "pip 23.3.1 from /usr/lib/python3/dist-packages/pip (python {})",
                &PYTHON_VERSION[..4]
            ))),
            "install" => {
                let packages: Vec<&str> = ctx.args[1..]
                    .iter()
                    .filter(|p| !p.starts_with('-'))
                    .map(String::as_str)
                    .collect();
                if packages.is_empty() {
                    return Ok(CommandResult::err(
                        "ERROR: You must give at least one requirement to install (see \"pip help install\")",
                    ));
                }
                let mut lines = Vec::new();
                for package in &packages {
                    lines.push(format!("Collecting {}", package));
                    lines.push(format!(
                        "  Downloading {}-1.0.0-py3-none-any.whl (45 kB)",
                        package
                    ));
                }
                lines.push(format!(
                    "Installing collected packages: {}",
                    packages.join(", ")
                ));
                let installed: Vec<String> =
                    packages.iter().map(|p| format!("{}-1.0.0", p)).collect();
                lines.push(format!("Successfully installed {}", installed.join(" ")));
                Ok(CommandResult::ok(lines.join("\n")))
            }
            "list" => Ok(CommandResult::ok(
                "Package    Version\n---------- -------\n\
                 pip        23.3.1\nsetuptools 68.2.2\nwheel      0.41.2",
            )),
            "freeze" => Ok(CommandResult::ok("")),
            other => Ok(CommandResult::err(format!(
                "ERROR: unknown command \"{}\"",
                other
            ))),
        }
    }
}
