//! `pvemedia connect` — Mount the media drive, then start the container.

use std::path::PathBuf;

use clap::Args;
use pvemedia_common::constants;
use pvemedia_common::types::CtId;
use pvemedia_provision::attach;
use pvemedia_provision::fstab::Fstab;
use pvemedia_provision::lxc::PctRuntime;

/// Arguments for the `connect` command.
#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Container ID.
    #[arg(long, default_value_t = 200)]
    pub ct_id: u32,

    /// Host mount point of the media drive.
    #[arg(long, default_value = constants::DEFAULT_MOUNT_POINT)]
    pub mount_point: PathBuf,
}

/// Executes the `connect` command.
///
/// # Errors
///
/// Returns an error if mounting or starting fails.
pub fn execute(args: ConnectArgs) -> anyhow::Result<()> {
    let runtime = PctRuntime::new();
    let table = Fstab::system();
    attach::connect(&runtime, &table, CtId::new(args.ct_id), &args.mount_point)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    eprintln!("media drive mounted, container {} started", args.ct_id);
    Ok(())
}
