//! JSON-lines session protocol
//!
//! One request per line on stdin, one response per line on stdout.
//!
//! Requests:
//! - `{"id": 1, "op": "create"}`
//! - `{"id": 2, "op": "execute", "session": 1, "command": "ls -la"}`
//! - `{"id": 3, "op": "close", "session": 1}`
//!
//! Responses echo `id` and carry either `session`, `result` (a
//! serialized `CommandResult`) or `error`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use simsh::{CommandResult, SessionId, Shell};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Op {
    Create,
    Execute { session: SessionId, command: String },
    Close { session: SessionId },
}

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: serde_json::Value,
    #[serde(flatten)]
    op: Op,
}

#[derive(Debug, Default, Serialize, PartialEq)]
struct Response {
    id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<CommandResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    closed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Response {
    fn error(id: serde_json::Value, message: String) -> Self {
        Self {
            id,
            error: Some(message),
            ..Self::default()
        }
    }
}

/// Serve requests until stdin closes.
pub async fn run(shell: &Shell) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read line from stdin")?
    {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(shell, &line).await;
        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        stdout.write_all(encoded.as_bytes()).await?;
        stdout.flush().await?;
    }

    Ok(())
}

async fn handle_line(shell: &Shell, line: &str) -> Response {
    let request: Request = match serde_json::from_str(line) {
        Ok(req) => req,
        Err(e) => {
            return Response::error(serde_json::Value::Null, format!("Parse error: {}", e));
        }
    };
    let id = request.id;

    match request.op {
        Op::Create => Response {
            id,
            session: Some(shell.create_session()),
            ..Response::default()
        },
        Op::Execute { session, command } => match shell.execute(session, &command).await {
            Ok(result) => Response {
                id,
                session: Some(session),
                result: Some(result),
                ..Response::default()
            },
            Err(e) => Response::error(id, e.to_string()),
        },
        Op::Close { session } => Response {
            id,
            session: Some(session),
            closed: Some(shell.close_session(session)),
            ..Response::default()
        },
    }
}
