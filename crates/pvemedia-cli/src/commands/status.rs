//! `pvemedia status` — Show container and media-server state.

use clap::Args;
use pvemedia_common::types::CtId;
use pvemedia_provision::lxc::{ContainerRuntime, PctRuntime};

use crate::output;

/// Arguments for the `status` command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Container ID.
    #[arg(long, default_value_t = 200)]
    pub ct_id: u32,
}

/// Executes the `status` command.
///
/// # Errors
///
/// Returns an error if the container status query fails.
pub fn execute(args: StatusArgs) -> anyhow::Result<()> {
    let runtime = PctRuntime::new();
    let id = CtId::new(args.ct_id);

    let ct_status = runtime.status(id).map_err(|e| anyhow::anyhow!("{e}"))?;
    tracing::debug!(id = %id, status = %ct_status, "queried container status");
    eprintln!("container {id}: {}", output::colorize_status(&ct_status));

    // Service state is best-effort; an unreachable container is already
    // reported by the line above.
    if ct_status.contains("running") {
        let out = runtime
            .exec(id, &["systemctl", "is-active", "jellyfin"])
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        eprintln!("jellyfin service: {}", out.stdout.trim());
    }
    Ok(())
}
