use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("{0}")]
    Message(String),
    #[error("{program} failed: {reason}\nOutput: {output}")]
    Command {
        program: String,
        reason: String,
        output: String,
    },
    #[error("{context}: {source}")]
    Step {
        context: String,
        #[source]
        source: Box<BackupError>,
    },
    #[error("could not detect backup device")]
    DeviceNotDetected,
    #[error("{0}")]
    Config(ConfigError),
    #[error("{0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parse config: {0}")]
    Parse(String),
    #[error("{0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, BackupError>;

impl BackupError {
    pub fn message(msg: impl Into<String>) -> Self {
        BackupError::Message(msg.into())
    }

    /// Wraps the error with the description of the step that failed.
    pub fn context(self, context: impl Into<String>) -> Self {
        BackupError::Step {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<ConfigError> for BackupError {
    fn from(err: ConfigError) -> Self {
        BackupError::Config(err)
    }
}

/// Attaches a step description to a failed result.
pub trait StepContext<T> {
    fn step(self, context: &str) -> Result<T>;
}

impl<T> StepContext<T> for Result<T> {
    fn step(self, context: &str) -> Result<T> {
        self.map_err(|err| err.context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_names_program_and_output() {
        let err = BackupError::Command {
            program: "zpool".to_string(),
            reason: "exit status: 1".to_string(),
            output: "cannot import 'NIXBACKUPS': no such pool available".to_string(),
        };
        let wrapped = err.context("failed to import pool");
        assert_eq!(
            wrapped.to_string(),
            "failed to import pool: zpool failed: exit status: 1\nOutput: cannot import 'NIXBACKUPS': no such pool available"
        );
    }
}
