//! # pvemedia — Proxmox media container CLI
//!
//! Provisions an unprivileged LXC container running Jellyfin and wires an
//! external USB media drive into it.

mod commands;
mod output;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
