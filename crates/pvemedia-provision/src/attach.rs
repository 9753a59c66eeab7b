//! Connect/disconnect helper for the external media drive.
//!
//! The ordering is fixed: the drive must be mounted before the container
//! starts so the bind mount sees real data, and the container must be
//! stopped before the drive is unmounted so nothing holds the mount busy.

use std::path::Path;

use pvemedia_common::error::Result;
use pvemedia_common::types::CtId;

use crate::fstab::MountTable;
use crate::lxc::ContainerRuntime;

/// Mounts the media drive, then starts the container.
///
/// # Errors
///
/// Fails fast: a mount failure leaves the container untouched.
pub fn connect(
    runtime: &dyn ContainerRuntime,
    table: &dyn MountTable,
    id: CtId,
    mount_point: &Path,
) -> Result<()> {
    tracing::info!(id = %id, mount_point = %mount_point.display(), "connecting media drive");
    table.mount(mount_point)?;
    runtime.start(id)?;
    Ok(())
}

/// Stops the container, then unmounts the media drive.
///
/// # Errors
///
/// Fails fast: a stop failure leaves the drive mounted.
pub fn disconnect(
    runtime: &dyn ContainerRuntime,
    table: &dyn MountTable,
    id: CtId,
    mount_point: &Path,
) -> Result<()> {
    tracing::info!(id = %id, mount_point = %mount_point.display(), "disconnecting media drive");
    runtime.stop(id)?;
    table.unmount(mount_point)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use pvemedia_common::config::ProvisionConfig;
    use pvemedia_common::error::ProvisionError;

    use crate::process::CmdOutput;

    /// Records the order of mount/start/stop/unmount calls.
    struct Trace(RefCell<Vec<&'static str>>);

    struct TracedRuntime<'a> {
        trace: &'a Trace,
        fail_stop: bool,
    }

    struct TracedTable<'a> {
        trace: &'a Trace,
        fail_mount: bool,
    }

    impl ContainerRuntime for TracedRuntime<'_> {
        fn ensure_template(&self, _storage: &str, _template: &str) -> Result<()> {
            Ok(())
        }

        fn create(&self, _config: &ProvisionConfig) -> Result<()> {
            Ok(())
        }

        fn start(&self, _id: CtId) -> Result<()> {
            self.trace.0.borrow_mut().push("start");
            Ok(())
        }

        fn stop(&self, _id: CtId) -> Result<()> {
            if self.fail_stop {
                return Err(ProvisionError::CommandFailed {
                    program: "pct".into(),
                    status: 1,
                    stderr: "container busy".into(),
                });
            }
            self.trace.0.borrow_mut().push("stop");
            Ok(())
        }

        fn status(&self, _id: CtId) -> Result<String> {
            Ok("status: running".into())
        }

        fn exec(&self, _id: CtId, _command: &[&str]) -> Result<CmdOutput> {
            Ok(CmdOutput {
                stdout: String::new(),
                stderr: String::new(),
                status: 0,
            })
        }

        fn read_config(&self, _id: CtId) -> Result<String> {
            Ok(String::new())
        }

        fn append_config(&self, _id: CtId, _line: &str) -> Result<()> {
            Ok(())
        }
    }

    impl MountTable for TracedTable<'_> {
        fn read(&self) -> Result<String> {
            Ok(String::new())
        }

        fn append(&self, _line: &str) -> Result<()> {
            Ok(())
        }

        fn remove(&self, _line: &str) -> Result<()> {
            Ok(())
        }

        fn apply(&self) -> Result<()> {
            Ok(())
        }

        fn mount(&self, _mount_point: &Path) -> Result<()> {
            if self.fail_mount {
                return Err(ProvisionError::CommandFailed {
                    program: "mount".into(),
                    status: 32,
                    stderr: "no such device".into(),
                });
            }
            self.trace.0.borrow_mut().push("mount");
            Ok(())
        }

        fn unmount(&self, _mount_point: &Path) -> Result<()> {
            self.trace.0.borrow_mut().push("unmount");
            Ok(())
        }
    }

    #[test]
    fn connect_mounts_before_starting() {
        let trace = Trace(RefCell::new(Vec::new()));
        let rt = TracedRuntime {
            trace: &trace,
            fail_stop: false,
        };
        let table = TracedTable {
            trace: &trace,
            fail_mount: false,
        };
        connect(&rt, &table, CtId::new(200), Path::new("/mnt/media")).expect("connect");
        assert_eq!(*trace.0.borrow(), vec!["mount", "start"]);
    }

    #[test]
    fn connect_leaves_container_stopped_when_mount_fails() {
        let trace = Trace(RefCell::new(Vec::new()));
        let rt = TracedRuntime {
            trace: &trace,
            fail_stop: false,
        };
        let table = TracedTable {
            trace: &trace,
            fail_mount: true,
        };
        assert!(connect(&rt, &table, CtId::new(200), Path::new("/mnt/media")).is_err());
        assert!(trace.0.borrow().is_empty());
    }

    #[test]
    fn disconnect_stops_before_unmounting() {
        let trace = Trace(RefCell::new(Vec::new()));
        let rt = TracedRuntime {
            trace: &trace,
            fail_stop: false,
        };
        let table = TracedTable {
            trace: &trace,
            fail_mount: false,
        };
        disconnect(&rt, &table, CtId::new(200), Path::new("/mnt/media")).expect("disconnect");
        assert_eq!(*trace.0.borrow(), vec!["stop", "unmount"]);
    }

    #[test]
    fn disconnect_keeps_drive_mounted_when_stop_fails() {
        let trace = Trace(RefCell::new(Vec::new()));
        let rt = TracedRuntime {
            trace: &trace,
            fail_stop: true,
        };
        let table = TracedTable {
            trace: &trace,
            fail_mount: false,
        };
        assert!(disconnect(&rt, &table, CtId::new(200), Path::new("/mnt/media")).is_err());
        assert!(trace.0.borrow().is_empty());
    }
}
