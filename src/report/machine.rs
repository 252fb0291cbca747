//! Host identity captured in report metadata
//!
//! Linux-specific sources (procfs) degrade to the `"unknown"` sentinel on
//! other platforms; fields are never omitted.

use serde::{Deserialize, Serialize};

/// Sentinel for host facts that could not be discovered
pub const UNKNOWN: &str = "unknown";

/// Machine the report was generated on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineInfo {
    pub hostname: String,
    pub os: String,
    pub kernel: String,
    pub cpu_model: String,
}

impl MachineInfo {
    #[must_use]
    pub fn detect() -> Self {
        Self {
            hostname: hostname().unwrap_or_else(|| UNKNOWN.to_string()),
            os: os_name(),
            kernel: kernel_release().unwrap_or_else(|| UNKNOWN.to_string()),
            cpu_model: cpu_model().unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    let s = s.trim().to_string();
    (!s.is_empty()).then_some(s)
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    std::process::Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .and_then(non_empty)
}

fn hostname() -> Option<String> {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .ok()
        .and_then(non_empty)
        .or_else(|| std::env::var("HOSTNAME").ok().and_then(non_empty))
        .or_else(|| command_output("hostname", &[]))
}

/// Platform name in the conventional capitalisation (`Linux`, `Darwin`, `Windows`)
fn os_name() -> String {
    match std::env::consts::OS {
        "linux" => "Linux".to_string(),
        "macos" => "Darwin".to_string(),
        "windows" => "Windows".to_string(),
        other => other.to_string(),
    }
}

fn kernel_release() -> Option<String> {
    std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .ok()
        .and_then(non_empty)
        .or_else(|| command_output("uname", &["-r"]))
}

/// CPU model name from /proc/cpuinfo (Linux only)
fn cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("model name"))
                    .and_then(|l| l.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
            .and_then(non_empty)
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Commit of the working directory, if it is a git checkout
pub fn git_commit() -> Option<String> {
    command_output("git", &["rev-parse", "HEAD"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_never_leaves_fields_empty() {
        let machine = MachineInfo::detect();
        assert!(!machine.hostname.is_empty());
        assert!(!machine.os.is_empty());
        assert!(!machine.kernel.is_empty());
        assert!(!machine.cpu_model.is_empty());
    }

    #[test]
    fn test_non_empty_trims() {
        assert_eq!(non_empty("  host\n".to_string()), Some("host".to_string()));
        assert_eq!(non_empty(" \n".to_string()), None);
    }
}
