use crate::error::{Result, StepContext};
use crate::types::Transcript;
use crate::util::command::CommandRunner;
use crate::workflow::Workflow;

pub(super) fn run<R: CommandRunner>(wf: &Workflow<R>, device: &str, t: &mut Transcript) -> Result<()> {
    let pool = &wf.settings().backup_pool;

    t.step(format!("Preparing backup device {}", device));
    t.step(format!("Creating encrypted ZFS pool {}", pool));
    wf.tools()
        .create_encrypted_pool(pool, device)
        .step("failed to create pool")?;

    t.done(format!(
        "Backup device {} prepared as encrypted ZFS pool {}",
        device, pool
    ));
    Ok(())
}
