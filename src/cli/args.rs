use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::types::OperationKind;

#[derive(Parser, Debug)]
#[command(
    name = "zfs-backup",
    disable_help_flag = true,
    disable_version_flag = true,
    group(ArgGroup::new("mode").args(["backup", "force_backup", "unmount"]).multiple(false))
)]
pub struct Cli {
    #[arg(long, short = 'b')]
    pub backup: bool,
    #[arg(long, short = 'f')]
    pub force_backup: bool,
    #[arg(long, short = 'u')]
    pub unmount: bool,

    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, short = 'v')]
    pub verbose: bool,

    #[arg(long, short = 'h')]
    pub help: bool,
}

impl Cli {
    /// Operation selected on the command line; `None` means interactive.
    pub fn mode(&self) -> Option<OperationKind> {
        if self.backup {
            Some(OperationKind::Backup)
        } else if self.force_backup {
            Some(OperationKind::ForceBackup)
        } else if self.unmount {
            Some(OperationKind::Unmount)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("zfs-backup").chain(args.iter().copied()))
    }

    #[test]
    fn no_flags_is_interactive() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.mode(), None);
        assert!(!cli.help);
    }

    #[test]
    fn mode_flags() {
        assert_eq!(parse(&["-b"]).unwrap().mode(), Some(OperationKind::Backup));
        assert_eq!(
            parse(&["--force-backup"]).unwrap().mode(),
            Some(OperationKind::ForceBackup)
        );
        assert_eq!(parse(&["-u"]).unwrap().mode(), Some(OperationKind::Unmount));
    }

    #[test]
    fn help_and_config() {
        let cli = parse(&["-h", "--config", "/tmp/zfs.yaml", "-v"]).unwrap();
        assert!(cli.help);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/zfs.yaml")));
    }

    #[test]
    fn modes_are_exclusive() {
        let err = parse(&["-b", "-u"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = parse(&["--prepare"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }
}
