//! CLI command definitions and dispatch.

pub mod connect;
pub mod disconnect;
pub mod provision;
pub mod status;
pub mod update;

use clap::{Parser, Subcommand};

/// pvemedia — Jellyfin LXC provisioning for Proxmox VE.
#[derive(Parser, Debug)]
#[command(name = "pvemedia", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the media container, register the media drive, and install Jellyfin.
    Provision(provision::ProvisionArgs),
    /// Mount the media drive, then start the container.
    Connect(connect::ConnectArgs),
    /// Stop the container, then unmount the media drive.
    Disconnect(disconnect::DisconnectArgs),
    /// Upgrade Jellyfin inside the container.
    Update(update::UpdateArgs),
    /// Show container and media-server status.
    Status(status::StatusArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Provision(args) => provision::execute(args),
        Command::Connect(args) => connect::execute(args),
        Command::Disconnect(args) => disconnect::execute(args),
        Command::Update(args) => update::execute(args),
        Command::Status(args) => status::execute(args),
    }
}
