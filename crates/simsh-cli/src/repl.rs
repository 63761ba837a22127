//! Interactive read-eval-print loop

use anyhow::Result;
use simsh::{DEFAULT_USERNAME, SessionId, Shell, path};

/// Prompt in the usual `user@host:~/dir$ ` shape.
fn prompt(hostname: &str, cwd: &str) -> String {
    let shown = match cwd.strip_prefix(path::HOME) {
        Some("") => "~".to_string(),
        Some(rest) if rest.starts_with('/') => format!("~{}", rest),
        _ => cwd.to_string(),
    };
    format!("{}@{}:{}$ ", DEFAULT_USERNAME, hostname, shown)
}

fn is_exit(line: &str) -> bool {
    matches!(line.trim(), "exit" | "logout")
}

async fn eval(shell: &Shell, session: SessionId, line: &str) -> Result<String> {
    let result = shell.execute(session, line).await?;
    crate::print_result(&result);
    Ok(result.current_directory)
}

#[cfg(feature = "interactive")]
pub async fn run(shell: &Shell, hostname: &str) -> Result<()> {
    use rustyline::DefaultEditor;
    use rustyline::error::ReadlineError;

    let session = shell.create_session();
    let mut cwd = shell.cwd(session).await?;
    let mut editor = DefaultEditor::new()?;

    loop {
        match editor.readline(&prompt(hostname, &cwd)) {
            Ok(line) => {
                if is_exit(&line) {
                    break;
                }
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }
                cwd = eval(shell, session, &line).await?;
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    shell.close_session(session);
    Ok(())
}

#[cfg(not(feature = "interactive"))]
pub async fn run(shell: &Shell, hostname: &str) -> Result<()> {
    use std::io::Write;
    use tokio::io::{AsyncBufReadExt, BufReader};

    let session = shell.create_session();
    let mut cwd = shell.cwd(session).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}", prompt(hostname, &cwd));
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if is_exit(&line) {
            break;
        }
        cwd = eval(shell, session, &line).await?;
    }

    shell.close_session(session);
    Ok(())
}
