fn main() {
    if let Err(err) = zfs_backup::cli::run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
