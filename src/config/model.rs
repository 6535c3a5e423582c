use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SOURCE_POOL: &str = "NIXROOT";
pub const DEFAULT_SOURCE_DATASET: &str = "NIXROOT/home";
pub const DEFAULT_BACKUP_POOL: &str = "NIXBACKUPS";
pub const DEFAULT_BACKUP_DATASET: &str = "NIXBACKUPS/home";
pub const DEFAULT_SNAPSHOT_SUFFIX: &str = "Home";
pub const DEFAULT_KEEP_LOCAL: usize = 7;
pub const DEFAULT_KEEP_MONTHS: u32 = 3;

/// On-disk form; every key is optional.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, rename = "sourcePool", skip_serializing_if = "Option::is_none")]
    pub source_pool: Option<String>,
    #[serde(default, rename = "sourceDataset", skip_serializing_if = "Option::is_none")]
    pub source_dataset: Option<String>,
    #[serde(default, rename = "backupPool", skip_serializing_if = "Option::is_none")]
    pub backup_pool: Option<String>,
    #[serde(default, rename = "backupDataset", skip_serializing_if = "Option::is_none")]
    pub backup_dataset: Option<String>,
    #[serde(default, rename = "snapshotSuffix", skip_serializing_if = "Option::is_none")]
    pub snapshot_suffix: Option<String>,
    #[serde(default, rename = "keepLocal", skip_serializing_if = "Option::is_none")]
    pub keep_local: Option<usize>,
    #[serde(default, rename = "keepMonths", skip_serializing_if = "Option::is_none")]
    pub keep_months: Option<u32>,
    #[serde(default, rename = "requireRoot", skip_serializing_if = "Option::is_none")]
    pub require_root: Option<bool>,
    #[serde(default, rename = "logFile", skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub binaries: BinariesConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct BinariesConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zfs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zpool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syncoid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udisksctl: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binaries {
    pub zfs: String,
    pub zpool: String,
    pub syncoid: String,
    pub udisksctl: String,
}

impl Default for Binaries {
    fn default() -> Self {
        Self {
            zfs: "zfs".to_string(),
            zpool: "zpool".to_string(),
            syncoid: "syncoid".to_string(),
            udisksctl: "udisksctl".to_string(),
        }
    }
}

/// Validated runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source_pool: String,
    pub source_dataset: String,
    pub backup_pool: String,
    pub backup_dataset: String,
    pub snapshot_suffix: String,
    pub keep_local: usize,
    pub keep_months: u32,
    pub require_root: bool,
    pub log_file: Option<PathBuf>,
    pub binaries: Binaries,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_pool: DEFAULT_SOURCE_POOL.to_string(),
            source_dataset: DEFAULT_SOURCE_DATASET.to_string(),
            backup_pool: DEFAULT_BACKUP_POOL.to_string(),
            backup_dataset: DEFAULT_BACKUP_DATASET.to_string(),
            snapshot_suffix: DEFAULT_SNAPSHOT_SUFFIX.to_string(),
            keep_local: DEFAULT_KEEP_LOCAL,
            keep_months: DEFAULT_KEEP_MONTHS,
            require_root: false,
            log_file: None,
            binaries: Binaries::default(),
        }
    }
}

impl Settings {
    /// `<dataset>@`, the prefix every local snapshot name starts with.
    pub fn source_snapshot_prefix(&self) -> String {
        format!("{}@", self.source_dataset)
    }

    pub fn backup_snapshot_prefix(&self) -> String {
        format!("{}@", self.backup_dataset)
    }
}
