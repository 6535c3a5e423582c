use chrono::NaiveDateTime;

use crate::error::{Result, StepContext};
use crate::types::{Secret, Transcript};
use crate::util::command::CommandRunner;
use crate::workflow::Workflow;
use crate::zfs::Replication;

/// Full resend that lets syncoid delete conflicting snapshots on the backup
/// pool. The session asks for confirmation before this runs.
pub(super) fn run<R: CommandRunner>(
    wf: &Workflow<R>,
    secret: &Secret,
    now: NaiveDateTime,
    t: &mut Transcript,
) -> Result<()> {
    let settings = wf.settings();
    let tools = wf.tools();
    let pool = &settings.backup_pool;

    t.step(format!("Importing {} from the USB drive", pool));
    tools.import(pool).step("failed to import pool")?;

    t.step(format!("Loading encryption key for {}", pool));
    tools
        .load_key(pool, secret)
        .step("failed to load encryption key")?;

    wf.take_snapshot(now, t)?;

    t.step("Force sending the snapshots to the backup disk");
    tools
        .replicate(
            &settings.source_dataset,
            &settings.backup_dataset,
            Replication::Forced,
        )
        .step("syncoid failed")?;

    t.step("Listing snapshots now that they are copied to the backup disk");
    match tools.list_snapshots() {
        Ok(listing) => t.detail(listing),
        Err(err) => t.warn(format!("failed to list snapshots: {}", err)),
    }

    t.done("Force backup completed successfully!");
    Ok(())
}
