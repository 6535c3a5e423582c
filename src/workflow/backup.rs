use chrono::NaiveDateTime;

use crate::error::{Result, StepContext};
use crate::types::{Secret, Transcript};
use crate::util::command::CommandRunner;
use crate::workflow::{prune, report, Workflow};
use crate::zfs::parse::{self, KEY_AVAILABLE};
use crate::zfs::Replication;

/// Incremental backup of the source dataset into the backup pool.
pub(super) fn run<R: CommandRunner>(
    wf: &Workflow<R>,
    secret: &Secret,
    now: NaiveDateTime,
    t: &mut Transcript,
) -> Result<()> {
    let settings = wf.settings();
    let tools = wf.tools();
    let pool = &settings.backup_pool;

    t.step(format!("Checking if {} is already imported", pool));
    let pools = tools.list_pools().step("failed to check pool status")?;
    if !parse::pool_imported(&pools, pool) {
        t.step(format!("Importing {} from the USB drive", pool));
        tools.import(pool).step("failed to import pool")?;
        t.step(format!("Loading encryption key for {}", pool));
        tools
            .load_key(pool, secret)
            .step("failed to load encryption key")?;
    } else {
        t.info(format!("{} is already imported", pool));
        let status = tools.key_status(pool).step("failed to check key status")?;
        if status != KEY_AVAILABLE {
            t.step(format!(
                "Loading encryption key for {} (key status: {})",
                pool, status
            ));
            tools
                .load_key(pool, secret)
                .step("failed to load encryption key")?;
        } else {
            t.info("Encryption key is already loaded");
        }
    }

    wf.take_snapshot(now, t)?;

    t.step("Sending snapshots incrementally to the backup disk");
    tools
        .replicate(
            &settings.source_dataset,
            &settings.backup_dataset,
            Replication::Incremental,
        )
        .step("syncoid failed")?;

    t.step(format!(
        "Bookmarking and destroying local snapshots beyond the newest {}",
        settings.keep_local
    ));
    match prune::prune_local(&tools, settings) {
        Ok(summary) => summary.record(t),
        Err(err) => t.warn(format!("failed to prune local snapshots: {}", err)),
    }

    t.step("Pruning old snapshots on the backup disk (keeping monthly archives)");
    match prune::prune_backup(&tools, settings, now.date()) {
        Ok(summary) => summary.record(t),
        Err(err) => t.warn(format!("failed to prune backup snapshots: {}", err)),
    }

    match report::generate(&tools, settings) {
        Ok(report) => t.detail(report.to_string()),
        Err(err) => t.warn(format!("failed to generate report: {}", err)),
    }

    wf.detach_backup_pool(t)?;

    t.done("Backup completed successfully!");
    Ok(())
}
