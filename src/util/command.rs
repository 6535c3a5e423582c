use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{BackupError, Result};
use crate::types::Secret;

/// What the child process sees on its standard streams.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    None,
    /// Written followed by a newline, then stdin is closed.
    Secret(&'a Secret),
    /// Inherit the controlling terminal; output is not captured.
    Terminal,
}

pub trait CommandRunner: Send + Sync {
    /// Runs `program` to completion and returns its combined output.
    fn run(&self, program: &str, args: &[String], input: Input<'_>) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

pub fn format_command(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], input: Input<'_>) -> Result<String> {
        tracing::debug!("{}", format_command(program, args));
        let mut cmd = Command::new(program);
        cmd.args(args);

        if let Input::Terminal = input {
            let status = cmd.status().map_err(|e| command_error(program, e, ""))?;
            if !status.success() {
                return Err(command_error(program, status, ""));
            }
            return Ok(String::new());
        }

        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        match input {
            Input::Secret(_) => cmd.stdin(Stdio::piped()),
            _ => cmd.stdin(Stdio::null()),
        };

        let mut child = cmd.spawn().map_err(|e| command_error(program, e, ""))?;
        if let Input::Secret(secret) = input {
            if let Some(mut stdin) = child.stdin.take() {
                let mut line = zeroize::Zeroizing::new(String::with_capacity(secret.expose().len() + 1));
                line.push_str(secret.expose());
                line.push('\n');
                if let Err(e) = stdin.write_all(line.as_bytes()) {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(BackupError::message(format!(
                        "failed to write to stdin of {}: {}",
                        program, e
                    )));
                }
            }
        }

        let out = child
            .wait_with_output()
            .map_err(|e| command_error(program, e, ""))?;
        let mut combined = String::from_utf8_lossy(&out.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&out.stderr));
        if !out.status.success() {
            return Err(command_error(program, out.status, &combined));
        }
        Ok(combined)
    }
}

fn command_error(program: &str, reason: impl std::fmt::Display, output: &str) -> BackupError {
    BackupError::Command {
        program: program.to_string(),
        reason: reason.to_string(),
        output: output.trim_end().to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn captures_stdout_and_stderr() {
        let out = SystemRunner
            .run("sh", &args(&["-c", "echo out; echo err 1>&2"]), Input::None)
            .expect("run");
        assert!(out.contains("out"));
        assert!(out.contains("err"));
    }

    #[test]
    fn secret_is_written_to_stdin() {
        let secret = Secret::new("s3cret".to_string());
        let out = SystemRunner
            .run("sh", &args(&["-c", "read line; echo got:$line"]), Input::Secret(&secret))
            .expect("run");
        assert_eq!(out.trim(), "got:s3cret");
    }

    #[test]
    fn failure_carries_program_and_output() {
        let err = SystemRunner
            .run("sh", &args(&["-c", "echo boom; exit 3"]), Input::None)
            .unwrap_err();
        match err {
            BackupError::Command { program, output, .. } => {
                assert_eq!(program, "sh");
                assert_eq!(output, "boom");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn missing_program_is_an_error() {
        let err = SystemRunner
            .run("zfs-backup-no-such-binary", &[], Input::None)
            .unwrap_err();
        assert!(err.to_string().starts_with("zfs-backup-no-such-binary failed:"));
    }
}
