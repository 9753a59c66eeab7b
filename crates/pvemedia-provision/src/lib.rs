//! # pvemedia-provision
//!
//! Provisioning core for the pvemedia workspace.
//!
//! Every interaction with the host — device metadata queries, the persistent
//! mount table, package installation, the LXC runtime, ownership changes —
//! goes through a capability trait with a real shell-out implementation, so
//! the whole provisioning sequence can be exercised against in-memory fakes.

pub mod attach;
pub mod device;
pub mod fstab;
pub mod idmap;
pub mod lxc;
pub mod media_server;
pub mod orchestrator;
pub mod packages;
pub mod process;
