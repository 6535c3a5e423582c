pub mod cli;
pub mod config;
pub mod error;
pub mod tui;
pub mod types;
pub mod util;
pub mod workflow;
pub mod zfs;

pub use error::{BackupError, Result};
pub use types::{OperationKind, OperationRequest, OperationResult, Outcome, Secret};
pub use workflow::Workflow;
