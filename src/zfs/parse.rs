//! Parsers for the line-oriented output of `zfs` and `zpool`.
//!
//! Everything here is pure; callers re-run the underlying listing every time
//! because pool state can change between calls.

use std::fmt;
use std::sync::OnceLock;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::{BackupError, Result};

pub const KEY_AVAILABLE: &str = "available";
pub const DEVICE_PREFIX: &str = "/dev/";
const SNAPSHOT_TIME_FORMAT: &str = "%Y-%m-%d.%Hh-%M";
const MONTH_FORMAT: &str = "%Y-%m";

/// Substring match against `zpool list` output.
pub fn pool_imported(pool_list: &str, pool: &str) -> bool {
    pool_list.contains(pool)
}

pub fn key_status(property_output: &str) -> &str {
    property_output.trim()
}

fn device_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s+(sd[a-z]+|nvme[0-9]+n[0-9]+)(?:p?[0-9]+)?\s+ONLINE")
            .expect("device pattern is a valid regex")
    })
}

/// Finds the whole-disk device backing a pool from `zpool status` output.
///
/// Only the first ONLINE `sdX`/`nvmeXnY` line is used, so for mirrored or
/// striped pools the remaining devices are ignored.
pub fn backup_device(pool_status: &str) -> Result<String> {
    for line in pool_status.lines() {
        if let Some(caps) = device_line().captures(line) {
            let device = &caps[1];
            if device.starts_with(DEVICE_PREFIX) {
                return Ok(device.to_string());
            }
            return Ok(format!("{}{}", DEVICE_PREFIX, device));
        }
    }
    Err(BackupError::DeviceNotDetected)
}

/// Names starting with `prefix`, in input order.
pub fn snapshots_with_prefix(names: &str, prefix: &str) -> Vec<String> {
    names
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(prefix))
        .map(str::to_string)
        .collect()
}

/// `pool/ds@label` becomes `pool/ds#label`.
pub fn bookmark_name(snapshot: &str) -> String {
    snapshot.replacen('@', "#", 1)
}

/// Label for a new snapshot, e.g. `2025-03-09.14h-05-Home`.
pub fn snapshot_label(now: NaiveDateTime, suffix: &str) -> String {
    format!("{}-{}", now.format(SNAPSHOT_TIME_FORMAT), suffix)
}

/// `YYYY-MM` tokens for the current month and the `count - 1` before it.
pub fn retention_months(today: NaiveDate, count: u32) -> Vec<String> {
    let first = today.with_day0(0).unwrap_or(today);
    (0..count)
        .filter_map(|back| first.checked_sub_months(Months::new(back)))
        .map(|month| month.format(MONTH_FORMAT).to_string())
        .collect()
}

pub fn within_retention(snapshot: &str, months: &[String]) -> bool {
    months.iter().any(|month| snapshot.contains(month.as_str()))
}

pub fn missing_count(local: usize, backup: usize) -> usize {
    local.saturating_sub(backup)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub oldest_backup: Option<String>,
    pub local_count: usize,
    pub backup_count: usize,
    pub local_free: Option<String>,
    pub backup_free: Option<String>,
}

impl Report {
    /// Counts come from one `zfs list -H -o name -t snapshot` listing.
    pub fn from_names(names: &str, local_prefix: &str, backup_prefix: &str) -> Self {
        Report {
            local_count: snapshots_with_prefix(names, local_prefix).len(),
            backup_count: snapshots_with_prefix(names, backup_prefix).len(),
            ..Report::default()
        }
    }

    pub fn missing(&self) -> usize {
        missing_count(self.local_count, self.backup_count)
    }
}

/// First line of a creation-sorted `name,creation` listing that belongs to
/// `dataset`, whitespace collapsed.
pub fn oldest_snapshot(listing: &str, dataset: &str) -> Option<String> {
    let needle = format!("{}@", dataset);
    listing
        .lines()
        .find(|line| line.trim_start().starts_with(&needle))
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Backup Report Summary")?;
        writeln!(f, "{}", "─".repeat(50))?;
        if let Some(oldest) = &self.oldest_backup {
            writeln!(f, "• Oldest snapshot: {}", oldest)?;
        }
        writeln!(f, "• Snapshots on local: {}", self.local_count)?;
        writeln!(f, "• Snapshots on backup: {}", self.backup_count)?;
        writeln!(f, "• Missing snapshots: {}", self.missing())?;
        if let Some(free) = &self.local_free {
            writeln!(f, "• Free space on local: {}", free)?;
        }
        if let Some(free) = &self.backup_free {
            writeln!(f, "• Free space on backup: {}", free)?;
        }
        Ok(())
    }
}
