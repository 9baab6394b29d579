//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layer boundaries hold:
//! the domain stays pure and the application layer never reaches into
//! infrastructure or presentation code.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Read a file and strip comment lines to avoid false positives.
fn read_non_comment_lines(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|l| {
            let trimmed = l.trim();
            !trimmed.starts_with("//") && !trimmed.starts_with("/*") && !trimmed.starts_with('*')
        })
        .map(String::from)
        .collect()
}

fn src_dir(layer: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(layer)
}

/// Every `(file, line)` in `layer` that mentions one of `forbidden`.
fn violations(layer: &str, forbidden: &[&str]) -> Vec<String> {
    let mut found = Vec::new();
    for file in collect_rs_files(&src_dir(layer)) {
        let rel = file
            .strip_prefix(env!("CARGO_MANIFEST_DIR"))
            .unwrap_or(&file)
            .display()
            .to_string();
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            for pattern in forbidden {
                if line.contains(pattern) {
                    found.push(format!("{rel}:{}: `{pattern}` in: {}", i + 1, line.trim()));
                }
            }
        }
    }
    found
}

#[test]
fn domain_has_no_io_or_outer_layer_imports() {
    let found = violations(
        "domain",
        &[
            "tokio",
            "std::fs",
            "std::process",
            "std::net",
            "crate::infra",
            "crate::application",
            "crate::commands",
            "crate::output",
        ],
    );
    assert!(
        found.is_empty(),
        "domain layer must stay pure:\n{}",
        found.join("\n")
    );
}

#[test]
fn application_does_not_depend_on_infra_or_presentation() {
    let found = violations(
        "application",
        &["crate::infra", "crate::commands", "crate::output", "crate::app::"],
    );
    assert!(
        found.is_empty(),
        "application layer must depend only on domain:\n{}",
        found.join("\n")
    );
}

#[test]
fn commands_do_not_branch_on_json_inline() {
    let mut found = Vec::new();
    for file in collect_rs_files(&src_dir("commands")) {
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            let trimmed = line.trim();
            if line.contains("json: bool") || trimmed.starts_with("if json") {
                found.push(format!("{}:{}: {trimmed}", file.display(), i + 1));
            }
        }
    }
    assert!(
        found.is_empty(),
        "commands must render through Renderer:\n{}",
        found.join("\n")
    );
}

#[test]
fn commands_do_not_spawn_processes_directly() {
    let found = violations("commands", &["std::process::Command", "tokio::process"]);
    assert!(found.is_empty(), "{}", found.join("\n"));
}
