//! Host platform detection.
//!
//! Reads os-release and probes `PATH`; the parsing and candidate lists live in
//! `crate::domain::platform`.

use crate::domain::platform::{
    Platform, os_identifier, package_manager_candidates, parse_os_release,
};

const OS_RELEASE_PATHS: [&str; 2] = ["/etc/os-release", "/usr/lib/os-release"];

/// Detect the running platform. Never fails; unknown parts stay unset.
#[must_use]
pub fn detect() -> Platform {
    let os = os_identifier(std::env::consts::OS);
    let distribution = if os == "linux" { read_distribution() } else { None };
    let package_manager = package_manager_candidates(&os, distribution.as_deref())
        .into_iter()
        .find(|pm| which::which(pm).is_ok())
        .map(str::to_string);
    tracing::debug!(
        %os,
        distribution = distribution.as_deref().unwrap_or("unknown"),
        package_manager = package_manager.as_deref().unwrap_or("unknown"),
        "platform detected"
    );
    Platform::new(os, distribution, package_manager)
}

fn read_distribution() -> Option<String> {
    OS_RELEASE_PATHS.iter().find_map(|path| {
        let content = std::fs::read_to_string(path).ok()?;
        parse_os_release(&content)
    })
}
