use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use crate::config::model::{Binaries, Config, Settings};
use crate::error::{BackupError, ConfigError, Result};

pub const CONFIG_FILE: &str = "/etc/zfs-backup.yaml";

/// Loads settings from `path`, or from [`CONFIG_FILE`] when none is given.
/// The default file is optional; an explicitly named one is not.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let (path, required) = match path {
        Some(path) => (path, true),
        None => (Path::new(CONFIG_FILE), false),
    };
    let mut contents = String::new();
    match File::open(path) {
        Ok(mut file) => {
            file.read_to_string(&mut contents)
                .map_err(|e| BackupError::message(format!("read {}: {}", path.display(), e)))?;
        }
        Err(err) if err.kind() == ErrorKind::NotFound && !required => {
            tracing::debug!("no config at {}; using defaults", path.display());
            return Ok(Settings::default());
        }
        Err(err) => {
            return Err(BackupError::message(format!("open {}: {}", path.display(), err)));
        }
    }
    parse_settings(&contents)
}

pub fn parse_settings(contents: &str) -> Result<Settings> {
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    let cfg: Config =
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    parse_runtime(cfg)
}

fn parse_runtime(cfg: Config) -> Result<Settings> {
    let defaults = Settings::default();
    let binaries = Binaries {
        zfs: cfg.binaries.zfs.unwrap_or(defaults.binaries.zfs),
        zpool: cfg.binaries.zpool.unwrap_or(defaults.binaries.zpool),
        syncoid: cfg.binaries.syncoid.unwrap_or(defaults.binaries.syncoid),
        udisksctl: cfg.binaries.udisksctl.unwrap_or(defaults.binaries.udisksctl),
    };
    let settings = Settings {
        source_pool: cfg.source_pool.unwrap_or(defaults.source_pool),
        source_dataset: cfg.source_dataset.unwrap_or(defaults.source_dataset),
        backup_pool: cfg.backup_pool.unwrap_or(defaults.backup_pool),
        backup_dataset: cfg.backup_dataset.unwrap_or(defaults.backup_dataset),
        snapshot_suffix: cfg.snapshot_suffix.unwrap_or(defaults.snapshot_suffix),
        keep_local: cfg.keep_local.unwrap_or(defaults.keep_local),
        keep_months: cfg.keep_months.unwrap_or(defaults.keep_months),
        require_root: cfg.require_root.unwrap_or(defaults.require_root),
        log_file: cfg.log_file,
        binaries,
    };
    validate(&settings)?;
    Ok(settings)
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c == '@' || c == '#')
}

fn validate(settings: &Settings) -> Result<()> {
    for (key, value) in [
        ("sourcePool", &settings.source_pool),
        ("sourceDataset", &settings.source_dataset),
        ("backupPool", &settings.backup_pool),
        ("backupDataset", &settings.backup_dataset),
        ("snapshotSuffix", &settings.snapshot_suffix),
    ] {
        if !is_valid_name(value) {
            return Err(ConfigError::Invalid(format!(
                "{} {:?} must be non-empty without whitespace, '@' or '#'",
                key, value
            ))
            .into());
        }
    }
    for (key, dataset, pool) in [
        ("sourceDataset", &settings.source_dataset, &settings.source_pool),
        ("backupDataset", &settings.backup_dataset, &settings.backup_pool),
    ] {
        if !dataset.starts_with(&format!("{}/", pool)) {
            return Err(ConfigError::Invalid(format!(
                "{} {} is not inside pool {}",
                key, dataset, pool
            ))
            .into());
        }
    }
    if settings.keep_local == 0 {
        return Err(ConfigError::Invalid("keepLocal must be at least 1".to_string()).into());
    }
    if !(1..=12).contains(&settings.keep_months) {
        return Err(ConfigError::Invalid(format!(
            "keepMonths must be between 1 and 12, got {}",
            settings.keep_months
        ))
        .into());
    }
    let bins = &settings.binaries;
    for (key, value) in [
        ("zfs", &bins.zfs),
        ("zpool", &bins.zpool),
        ("syncoid", &bins.syncoid),
        ("udisksctl", &bins.udisksctl),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("binaries.{} is empty", key)).into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_settings_from_file() {
        let mut file = NamedTempFile::new().expect("tempfile");
        let yaml = r#"
sourcePool: "tank"
sourceDataset: "tank/home"
backupPool: "vault"
backupDataset: "vault/home"
keepLocal: 10
binaries:
  syncoid: "/usr/sbin/syncoid"
"#;
        file.write_all(yaml.as_bytes()).expect("write");
        let settings = load_settings(Some(file.path())).expect("load");
        assert_eq!(settings.source_dataset, "tank/home");
        assert_eq!(settings.backup_pool, "vault");
        assert_eq!(settings.keep_local, 10);
        assert_eq!(settings.keep_months, 3);
        assert_eq!(settings.binaries.syncoid, "/usr/sbin/syncoid");
        assert_eq!(settings.binaries.zfs, "zfs");
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings = parse_settings("").expect("parse");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.source_snapshot_prefix(), "NIXROOT/home@");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("absent.yaml");
        assert!(load_settings(Some(&path)).is_err());
    }

    #[test]
    fn dataset_must_live_in_its_pool() {
        let err = parse_settings("backupPool: vault\n").unwrap_err();
        assert!(err.to_string().contains("backupDataset NIXBACKUPS/home is not inside pool vault"));
    }

    #[test]
    fn rejects_bad_retention() {
        assert!(parse_settings("keepLocal: 0\n").is_err());
        assert!(parse_settings("keepMonths: 13\n").is_err());
        assert!(parse_settings("snapshotSuffix: \"a b\"\n").is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = parse_settings("sourcePol: tank\n").unwrap_err();
        assert!(err.to_string().starts_with("parse config:"));
    }
}
