//! Platform descriptor and pure detection helpers.
//!
//! Reading `/etc/os-release` and probing `PATH` happen in
//! `crate::infra::platform`; everything here takes data in and returns data out.

use serde::Serialize;

/// Sentinel used wherever a platform value could not be determined.
pub const UNKNOWN: &str = "unknown";

/// Immutable description of the host the scripts run on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Platform {
    os: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    distribution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    package_manager: Option<String>,
}

impl Platform {
    #[must_use]
    pub fn new(
        os: impl Into<String>,
        distribution: Option<String>,
        package_manager: Option<String>,
    ) -> Self {
        let os = os.into();
        Self {
            os: if os.is_empty() { UNKNOWN.to_string() } else { os },
            distribution,
            package_manager,
        }
    }

    /// Operating system identifier (`linux`, `macos`, `windows`, ...).
    #[must_use]
    pub fn os(&self) -> &str {
        &self.os
    }

    /// Linux distribution `ID`, if known.
    #[must_use]
    pub fn distribution(&self) -> Option<&str> {
        self.distribution.as_deref()
    }

    /// Detected package manager, if any.
    #[must_use]
    pub fn package_manager(&self) -> Option<&str> {
        self.package_manager.as_deref()
    }

    /// Package manager as exported to scripts (`unknown` when absent).
    #[must_use]
    pub fn package_manager_label(&self) -> &str {
        self.package_manager.as_deref().unwrap_or(UNKNOWN)
    }

    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    /// Extension of the scripts this platform executes.
    #[must_use]
    pub fn script_extension(&self) -> &'static str {
        if self.is_windows() { "ps1" } else { "sh" }
    }
}

/// Map a Rust target OS name onto the identifier exported as `PLATFORM`.
#[must_use]
pub fn os_identifier(target_os: &str) -> String {
    match target_os {
        "" => UNKNOWN.to_string(),
        "macos" | "ios" => "macos".to_string(),
        other => other.to_string(),
    }
}

/// Extract the `ID` field from os-release content.
///
/// Returns `None` when the field is missing or empty. Quotes are stripped and
/// the value is lowercased.
#[must_use]
pub fn parse_os_release(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let value = line.trim().strip_prefix("ID=")?;
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then(|| value.to_ascii_lowercase())
    })
}

/// Ordered package-manager probe list for an OS, distribution hint first.
#[must_use]
pub fn package_manager_candidates(os: &str, distribution: Option<&str>) -> Vec<&'static str> {
    let base: &[&'static str] = match os {
        "linux" => &["apt", "dnf", "yum", "pacman", "zypper", "apk", "nix"],
        "macos" => &["brew", "port"],
        "windows" => &["winget", "choco", "scoop"],
        _ => &[],
    };
    let mut candidates = Vec::with_capacity(base.len());
    if let Some(hint) = distribution.and_then(distribution_hint) {
        candidates.push(hint);
    }
    for pm in base {
        if !candidates.contains(pm) {
            candidates.push(pm);
        }
    }
    candidates
}

fn distribution_hint(distribution: &str) -> Option<&'static str> {
    match distribution {
        "ubuntu" | "debian" | "linuxmint" | "pop" | "raspbian" | "kali" => Some("apt"),
        "fedora" | "rhel" | "centos" | "rocky" | "almalinux" => Some("dnf"),
        "arch" | "manjaro" | "endeavouros" => Some("pacman"),
        "alpine" => Some("apk"),
        "nixos" => Some("nix"),
        d if d.starts_with("opensuse") || d == "sles" => Some("zypper"),
        _ => None,
    }
}
