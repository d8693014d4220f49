//! External command execution.
//!
//! Every invocation blocks (awaits) to completion; nothing runs in the
//! background. Commands are spawned directly, never through a shell.

use ambar_shared::errors::{AmbarError, AmbarResult};
use std::process::Stdio;
use tokio::process::Command;

/// Render a program and its arguments for logs and error messages.
pub fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program.to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run a command with inherited stdio and fail on non-zero exit.
pub async fn run_strict(program: &str, args: &[String]) -> AmbarResult<()> {
    let line = display_command(program, args);
    tracing::debug!(command = %line, "Running command");

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .status()
        .await
        .map_err(|e| AmbarError::command(&line, e))?;

    if !status.success() {
        return Err(AmbarError::command(
            &line,
            match status.code() {
                Some(code) => format!("exit status {code}"),
                None => "terminated by signal".to_string(),
            },
        ));
    }
    Ok(())
}

/// Run a command and capture its stdout; fail on non-zero exit.
pub async fn capture(program: &str, args: &[String]) -> AmbarResult<String> {
    let line = display_command(program, args);
    tracing::debug!(command = %line, "Capturing command output");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| AmbarError::command(&line, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AmbarError::command(&line, stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Whether a command can be spawned and exits zero, with output discarded.
pub async fn probe(program: &str, args: &[String]) -> bool {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Convenience for building argument vectors from string literals.
pub fn args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}
