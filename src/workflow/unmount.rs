use crate::error::Result;
use crate::types::Transcript;
use crate::util::command::CommandRunner;
use crate::workflow::Workflow;
use crate::zfs::Tools;

pub(super) fn run<R: CommandRunner>(wf: &Workflow<R>, t: &mut Transcript) -> Result<()> {
    let tools = wf.tools();

    t.step(format!("Unmounting the {} pool", wf.settings().backup_pool));
    t.info("BEFORE STATE:");
    capture_state(&tools, t);

    wf.detach_backup_pool(t)?;

    t.info("AFTER STATE:");
    capture_state(&tools, t);

    t.done("Safe to unplug the external drive");
    Ok(())
}

fn capture_state<R: CommandRunner + ?Sized>(tools: &Tools<'_, R>, t: &mut Transcript) {
    match tools.list_pools() {
        Ok(pools) => {
            t.info("ZFS Pools:");
            t.detail(pools);
        }
        Err(err) => t.warn(format!("failed to list pools: {}", err)),
    }
    match tools.list_filesystems() {
        Ok(filesystems) => {
            t.info("ZFS Filesystems:");
            t.detail(filesystems);
        }
        Err(err) => t.warn(format!("failed to list filesystems: {}", err)),
    }
}
