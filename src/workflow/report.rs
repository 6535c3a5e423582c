use crate::config::Settings;
use crate::error::Result;
use crate::util::command::CommandRunner;
use crate::zfs::parse::{oldest_snapshot, Report};
use crate::zfs::{SnapshotOrder, Tools};

/// Gathers the post-backup summary. Only the snapshot name listing is
/// required; the oldest snapshot and free space lines are dropped when their
/// listings fail.
pub fn generate<R: CommandRunner + ?Sized>(
    tools: &Tools<'_, R>,
    settings: &Settings,
) -> Result<Report> {
    let oldest = tools
        .snapshots_by_creation()
        .ok()
        .and_then(|listing| oldest_snapshot(&listing, &settings.backup_dataset));

    let names = tools.snapshot_names(SnapshotOrder::Unsorted)?;
    let mut report = Report::from_names(
        &names,
        &settings.source_snapshot_prefix(),
        &settings.backup_snapshot_prefix(),
    );
    report.oldest_backup = oldest;
    report.local_free = tools.available(&settings.source_pool).ok();
    report.backup_free = tools.available(&settings.backup_pool).ok();
    Ok(report)
}
