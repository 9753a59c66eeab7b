//! `pvemedia disconnect` — Stop the container, then unmount the media drive.

use std::path::PathBuf;

use clap::Args;
use pvemedia_common::constants;
use pvemedia_common::types::CtId;
use pvemedia_provision::attach;
use pvemedia_provision::fstab::Fstab;
use pvemedia_provision::lxc::PctRuntime;

/// Arguments for the `disconnect` command.
#[derive(Args, Debug)]
pub struct DisconnectArgs {
    /// Container ID.
    #[arg(long, default_value_t = 200)]
    pub ct_id: u32,

    /// Host mount point of the media drive.
    #[arg(long, default_value = constants::DEFAULT_MOUNT_POINT)]
    pub mount_point: PathBuf,
}

/// Executes the `disconnect` command.
///
/// # Errors
///
/// Returns an error if stopping or unmounting fails.
pub fn execute(args: DisconnectArgs) -> anyhow::Result<()> {
    let runtime = PctRuntime::new();
    let table = Fstab::system();
    attach::disconnect(&runtime, &table, CtId::new(args.ct_id), &args.mount_point)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    eprintln!("container {} stopped, media drive unmounted", args.ct_id);
    Ok(())
}
