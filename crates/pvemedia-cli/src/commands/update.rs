//! `pvemedia update` — Upgrade Jellyfin inside the container.

use clap::Args;
use pvemedia_common::types::CtId;
use pvemedia_provision::lxc::PctRuntime;
use pvemedia_provision::media_server;

/// Arguments for the `update` command.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Container ID.
    #[arg(long, default_value_t = 200)]
    pub ct_id: u32,
}

/// Executes the `update` command.
///
/// # Errors
///
/// Returns an error if any in-container upgrade step fails.
pub fn execute(args: UpdateArgs) -> anyhow::Result<()> {
    let runtime = PctRuntime::new();
    let id = CtId::new(args.ct_id);
    eprintln!("updating media server in container {id}...");
    media_server::update(&runtime, id).map_err(|e| anyhow::anyhow!("{e}"))?;
    eprintln!("media server up to date");
    Ok(())
}
