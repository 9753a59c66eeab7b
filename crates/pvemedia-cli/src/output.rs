//! Formatted output helpers for CLI commands.

use pvemedia_common::types::IdMapping;

/// ANSI bold.
pub const BOLD: &str = "\x1b[1m";
/// ANSI dim.
pub const DIM: &str = "\x1b[2m";
/// ANSI green.
pub const GREEN: &str = "\x1b[32m";
/// ANSI red.
pub const RED: &str = "\x1b[31m";
/// ANSI reset.
pub const RESET: &str = "\x1b[0m";

/// Formats an ID mapping as `uid:gid -> host_uid:host_gid`.
#[must_use]
pub fn format_mapping(mapping: &IdMapping) -> String {
    format!(
        "{}:{} -> {}:{}",
        mapping.container_uid, mapping.container_gid, mapping.host_uid, mapping.host_gid
    )
}

/// Colors a container status line green when running, red otherwise.
#[must_use]
pub fn colorize_status(status: &str) -> String {
    let color = if status.contains("running") { GREEN } else { RED };
    format!("{color}{status}{RESET}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_mapping_shows_both_ranges() {
        let mapping = IdMapping {
            container_uid: 992,
            container_gid: 992,
            host_uid: 100_992,
            host_gid: 100_992,
        };
        assert_eq!(format_mapping(&mapping), "992:992 -> 100992:100992");
    }

    #[test]
    fn running_status_is_green() {
        assert!(colorize_status("status: running").starts_with(GREEN));
    }

    #[test]
    fn stopped_status_is_red() {
        assert!(colorize_status("status: stopped").starts_with(RED));
    }
}
