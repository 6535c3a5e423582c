use crate::config::Binaries;
use crate::error::Result;
use crate::types::Secret;
use crate::util::command::{CommandRunner, Input};

pub mod parse;

/// Sort order for snapshot name listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOrder {
    /// Whatever order `zfs list` produces.
    Unsorted,
    NewestFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replication {
    /// `--create-bookmark`: incremental, bookmarks the source.
    Incremental,
    /// `--force-delete`: may destroy conflicting destination snapshots.
    Forced,
}

/// Argument builders for the storage tools, run through a [`CommandRunner`].
pub struct Tools<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    bins: &'a Binaries,
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl<'a, R: CommandRunner + ?Sized> Tools<'a, R> {
    pub fn new(runner: &'a R, bins: &'a Binaries) -> Self {
        Self { runner, bins }
    }

    fn zfs(&self, list: &[&str]) -> Result<String> {
        self.runner.run(&self.bins.zfs, &args(list), Input::None)
    }

    fn zpool(&self, list: &[&str]) -> Result<String> {
        self.runner.run(&self.bins.zpool, &args(list), Input::None)
    }

    /// Read-only probe used as the startup permission check.
    pub fn probe(&self) -> Result<String> {
        self.zfs(&["list", "-H", "-o", "name"])
    }

    pub fn list_pools(&self) -> Result<String> {
        self.zpool(&["list"])
    }

    pub fn list_filesystems(&self) -> Result<String> {
        self.zfs(&["list"])
    }

    pub fn list_snapshots(&self) -> Result<String> {
        self.zfs(&["list", "-t", "snapshot"])
    }

    pub fn snapshot_names(&self, order: SnapshotOrder) -> Result<String> {
        match order {
            SnapshotOrder::Unsorted => self.zfs(&["list", "-H", "-o", "name", "-t", "snapshot"]),
            SnapshotOrder::NewestFirst => {
                self.zfs(&["list", "-H", "-o", "name", "-t", "snapshot", "-S", "creation"])
            }
        }
    }

    /// `name,creation` listing, oldest first.
    pub fn snapshots_by_creation(&self) -> Result<String> {
        self.zfs(&["list", "-t", "snapshot", "-o", "name,creation", "-s", "creation"])
    }

    pub fn available(&self, dataset: &str) -> Result<String> {
        self.zfs(&["list", "-H", "-o", "available", dataset])
            .map(|out| out.trim().to_string())
    }

    pub fn import(&self, pool: &str) -> Result<()> {
        self.zpool(&["import", pool]).map(|_| ())
    }

    pub fn export(&self, pool: &str) -> Result<()> {
        self.zpool(&["export", pool]).map(|_| ())
    }

    pub fn pool_status(&self, pool: &str) -> Result<String> {
        self.zpool(&["status", pool])
    }

    pub fn key_status(&self, dataset: &str) -> Result<String> {
        self.zfs(&["get", "-H", "-o", "value", "keystatus", dataset])
            .map(|out| parse::key_status(&out).to_string())
    }

    pub fn load_key(&self, dataset: &str, secret: &Secret) -> Result<()> {
        self.runner
            .run(&self.bins.zfs, &args(&["load-key", dataset]), Input::Secret(secret))
            .map(|_| ())
    }

    pub fn snapshot(&self, name: &str) -> Result<()> {
        self.zfs(&["snapshot", name]).map(|_| ())
    }

    pub fn bookmark(&self, snapshot: &str, bookmark: &str) -> Result<()> {
        self.zfs(&["bookmark", snapshot, bookmark]).map(|_| ())
    }

    pub fn destroy(&self, snapshot: &str) -> Result<()> {
        self.zfs(&["destroy", snapshot]).map(|_| ())
    }

    /// Creates an encrypted pool; `zpool` prompts for the passphrase itself.
    pub fn create_encrypted_pool(&self, pool: &str, device: &str) -> Result<()> {
        let list = [
            "create",
            "-O",
            "encryption=aes-256-gcm",
            "-O",
            "keyformat=passphrase",
            "-O",
            "keylocation=prompt",
            "-O",
            "compression=zstd",
            "-O",
            "atime=off",
            pool,
            device,
        ];
        self.runner
            .run(&self.bins.zpool, &args(&list), Input::Terminal)
            .map(|_| ())
    }

    pub fn replicate(&self, source: &str, dest: &str, mode: Replication) -> Result<()> {
        let flag = match mode {
            Replication::Incremental => "--create-bookmark",
            Replication::Forced => "--force-delete",
        };
        self.runner
            .run(&self.bins.syncoid, &args(&[flag, source, dest]), Input::None)
            .map(|_| ())
    }

    pub fn power_off(&self, device: &str) -> Result<()> {
        self.runner
            .run(&self.bins.udisksctl, &args(&["power-off", "-b", device]), Input::None)
            .map(|_| ())
    }
}
