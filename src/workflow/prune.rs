//! Snapshot retention for the source and backup datasets.

use chrono::NaiveDate;

use crate::config::Settings;
use crate::error::Result;
use crate::types::Transcript;
use crate::util::command::CommandRunner;
use crate::zfs::parse::{bookmark_name, retention_months, snapshots_with_prefix, within_retention};
use crate::zfs::{SnapshotOrder, Tools};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PruneSummary {
    pub pruned: Vec<String>,
    pub failures: Vec<String>,
}

impl PruneSummary {
    pub fn record(&self, t: &mut Transcript) {
        t.info(format!("{} snapshot(s) pruned", self.pruned.len()));
        for failure in &self.failures {
            t.warn(failure.clone());
        }
    }
}

/// Everything past the `keep` newest snapshots. `names` must be sorted
/// newest first.
pub fn local_candidates(names: &str, prefix: &str, keep: usize) -> Vec<String> {
    snapshots_with_prefix(names, prefix)
        .into_iter()
        .skip(keep)
        .collect()
}

/// Snapshots whose name carries none of the retained `YYYY-MM` tokens.
pub fn backup_candidates(names: &str, prefix: &str, months: &[String]) -> Vec<String> {
    snapshots_with_prefix(names, prefix)
        .into_iter()
        .filter(|snapshot| !within_retention(snapshot, months))
        .collect()
}

pub fn prune_local<R: CommandRunner + ?Sized>(
    tools: &Tools<'_, R>,
    settings: &Settings,
) -> Result<PruneSummary> {
    let names = tools.snapshot_names(SnapshotOrder::NewestFirst)?;
    let doomed = local_candidates(&names, &settings.source_snapshot_prefix(), settings.keep_local);
    Ok(bookmark_and_destroy(tools, doomed))
}

pub fn prune_backup<R: CommandRunner + ?Sized>(
    tools: &Tools<'_, R>,
    settings: &Settings,
    today: NaiveDate,
) -> Result<PruneSummary> {
    let months = retention_months(today, settings.keep_months);
    let names = tools.snapshot_names(SnapshotOrder::Unsorted)?;
    let doomed = backup_candidates(&names, &settings.backup_snapshot_prefix(), &months);
    Ok(bookmark_and_destroy(tools, doomed))
}

fn bookmark_and_destroy<R: CommandRunner + ?Sized>(
    tools: &Tools<'_, R>,
    snapshots: Vec<String>,
) -> PruneSummary {
    let mut summary = PruneSummary::default();
    for snapshot in snapshots {
        let bookmark = bookmark_name(&snapshot);
        if let Err(err) = tools.bookmark(&snapshot, &bookmark) {
            summary
                .failures
                .push(format!("bookmark {}: {}", snapshot, err));
        }
        match tools.destroy(&snapshot) {
            Ok(()) => summary.pruned.push(snapshot),
            Err(err) => summary.failures.push(format!("destroy {}: {}", snapshot, err)),
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn newest_first(count: usize) -> String {
        (0..count)
            .map(|i| format!("NIXROOT/home@2025-01-{:02}.10h-00-Home\n", 31 - i))
            .collect()
    }

    #[test]
    fn keeps_seven_newest_local() {
        for n in [0, 3, 7, 8, 12] {
            let names = newest_first(n);
            let doomed = local_candidates(&names, "NIXROOT/home@", 7);
            assert_eq!(doomed.len(), n.saturating_sub(7), "n = {}", n);
            let all = snapshots_with_prefix(&names, "NIXROOT/home@");
            assert_eq!(doomed, all[all.len().min(7)..].to_vec());
        }
    }

    #[test]
    fn local_prune_ignores_other_datasets() {
        let names = "NIXBACKUPS/home@x\nNIXROOT/home@a\nNIXROOT/var@b\n";
        assert_eq!(
            local_candidates(names, "NIXROOT/home@", 0),
            vec!["NIXROOT/home@a".to_string()]
        );
    }

    #[test]
    fn backup_prune_keeps_recent_months() {
        let months = vec![
            "2025-03".to_string(),
            "2025-02".to_string(),
            "2025-01".to_string(),
        ];
        let names = "NIXBACKUPS/home@2025-03-01.10h-00-Home\n\
NIXBACKUPS/home@2025-01-15.10h-00-Home\n\
NIXBACKUPS/home@2024-12-31.23h-59-Home\n\
NIXBACKUPS/home@2024-03-01.10h-00-Home\n\
NIXROOT/home@2020-01-01.10h-00-Home\n";
        let doomed = backup_candidates(names, "NIXBACKUPS/home@", &months);
        assert_eq!(
            doomed,
            vec![
                "NIXBACKUPS/home@2024-12-31.23h-59-Home".to_string(),
                "NIXBACKUPS/home@2024-03-01.10h-00-Home".to_string(),
            ]
        );
    }
}
