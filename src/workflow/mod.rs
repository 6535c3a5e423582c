//! The four operations offered by the tool.
//!
//! Each operation is a fixed sequence of tool invocations. Steps are either
//! fatal (the error ends the operation and becomes its outcome) or best
//! effort (a warning line is added to the transcript and the sequence goes
//! on). Nothing already done is rolled back.

use chrono::{Local, NaiveDateTime};

use crate::config::Settings;
use crate::error::{Result, StepContext};
use crate::types::{OperationKind, OperationRequest, OperationResult, Outcome, Transcript};
use crate::util::command::CommandRunner;
use crate::zfs::{parse, Tools};

mod backup;
mod force;
mod prepare;
pub mod prune;
mod report;
mod unmount;


pub struct Workflow<R: CommandRunner> {
    runner: R,
    settings: Settings,
}

impl<R: CommandRunner> Workflow<R> {
    pub fn new(runner: R, settings: Settings) -> Self {
        Self { runner, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub(crate) fn tools(&self) -> Tools<'_, R> {
        Tools::new(&self.runner, &self.settings.binaries)
    }

    /// Read-only listing that fails when the caller lacks ZFS privileges.
    pub fn check_permissions(&self) -> Result<()> {
        self.tools().probe().map(|_| ())
    }

    pub fn execute(&self, request: OperationRequest) -> OperationResult {
        self.execute_at(request, Local::now().naive_local())
    }

    /// Runs `request` as if the local time were `now`. The request, and the
    /// secret it may hold, is dropped before the result is returned.
    pub fn execute_at(&self, request: OperationRequest, now: NaiveDateTime) -> OperationResult {
        let kind = request.kind();
        tracing::info!("starting {}", kind);
        let mut transcript = Transcript::new();
        let result = match &request {
            OperationRequest::Backup { secret } => backup::run(self, secret, now, &mut transcript),
            OperationRequest::ForceBackup { secret } => {
                force::run(self, secret, now, &mut transcript)
            }
            OperationRequest::Prepare { device } => prepare::run(self, device, &mut transcript),
            OperationRequest::Unmount => unmount::run(self, &mut transcript),
        };
        drop(request);
        finish(kind, transcript, result)
    }

    /// Creates `<dataset>@<label>` on the source dataset.
    fn take_snapshot(&self, now: NaiveDateTime, t: &mut Transcript) -> Result<String> {
        let label = parse::snapshot_label(now, &self.settings.snapshot_suffix);
        let name = format!("{}@{}", self.settings.source_dataset, label);
        t.step(format!("Creating local snapshot {}", name));
        self.tools().snapshot(&name).step("failed to create snapshot")?;
        Ok(name)
    }

    /// Exports the backup pool and powers off its drive. Export is fatal even
    /// when the drive could not be identified; power-off never is.
    fn detach_backup_pool(&self, t: &mut Transcript) -> Result<()> {
        let tools = self.tools();
        let pool = &self.settings.backup_pool;
        let device = tools
            .pool_status(pool)
            .map_err(|err| err.context("could not get pool status"))
            .and_then(|status| parse::backup_device(&status));

        t.step(format!("Exporting the {} pool", pool));
        match device {
            Ok(device) => {
                tools.export(pool).step("failed to export pool")?;
                t.step(format!("Powering off the USB drive ({})", device));
                if let Err(err) = tools.power_off(&device) {
                    t.warn(format!("failed to power off device: {}", err));
                }
            }
            Err(err) => {
                t.warn(format!(
                    "skipping device power-off due to device detection failure: {}",
                    err
                ));
                tools.export(pool).step("failed to export pool")?;
            }
        }
        Ok(())
    }
}

fn finish(kind: OperationKind, transcript: Transcript, result: Result<()>) -> OperationResult {
    let outcome = match result {
        Ok(()) => {
            tracing::info!("{} finished", kind);
            Outcome::Success
        }
        Err(err) => {
            tracing::error!("{} failed: {}", kind, err);
            Outcome::Failure(err.to_string())
        }
    };
    OperationResult {
        kind,
        transcript,
        outcome,
    }
}
