//! Architecture enforcement tests.
//!
//! The library is layered: `core` knows nothing of realms at runtime
//! except through its config builder, `world` and `forge` report errors
//! with `thiserror` types, and only the `rw` binary installs a log
//! subscriber. These tests catch violations in CI.
//!
//! # Test Categories
//!
//! 1. **Layering** - Lower layers must not import the CLI
//! 2. **Error Types** - Library layers must not use `anyhow`
//! 3. **Logging** - Only `main.rs` may install a subscriber
//! 4. **Commands** - Every command module is dispatched

use std::fs;
use std::path::{Path, PathBuf};

/// Library directories that must stay free of CLI concerns.
const LIBRARY_DIRS: &[&str] = &["src/core", "src/world", "src/forge"];

/// Collect every `.rs` file below `dir`.
fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).unwrap_or_else(|_| panic!("Failed to read {}", dir.display())) {
            let path = entry.expect("Failed to read entry").path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|e| e == "rs") {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

/// Source text before the first `#[cfg(test)]`.
fn non_test_source(path: &Path) -> String {
    let content =
        fs::read_to_string(path).unwrap_or_else(|_| panic!("Failed to read {}", path.display()));
    match content.find("#[cfg(test)]") {
        Some(pos) => content[..pos].to_string(),
        None => content,
    }
}

fn assert_no_violations(violations: Vec<String>) {
    assert!(
        violations.is_empty(),
        "Architecture violations found:\n  {}",
        violations.join("\n  ")
    );
}

// =============================================================================
// Layering
// =============================================================================

#[test]
fn library_layers_do_not_import_cli() {
    let mut violations = Vec::new();
    for dir in LIBRARY_DIRS {
        for path in rust_files(Path::new(dir)) {
            if non_test_source(&path).contains("crate::cli") {
                violations.push(format!("{}: imports crate::cli", path.display()));
            }
        }
    }
    assert_no_violations(violations);
}

// =============================================================================
// Error Types
// =============================================================================

#[test]
fn library_layers_do_not_use_anyhow() {
    let mut violations = Vec::new();
    for dir in LIBRARY_DIRS {
        for path in rust_files(Path::new(dir)) {
            if non_test_source(&path).contains("anyhow") {
                violations.push(format!(
                    "{}: uses anyhow - library errors must be thiserror enums",
                    path.display()
                ));
            }
        }
    }
    assert_no_violations(violations);
}

#[test]
fn library_layers_do_not_unwrap() {
    let mut violations = Vec::new();
    for dir in LIBRARY_DIRS {
        for path in rust_files(Path::new(dir)) {
            let source = non_test_source(&path);
            for (line_no, line) in source.lines().enumerate() {
                let code = line.trim_start();
                // doc examples may unwrap
                if code.starts_with("//") {
                    continue;
                }
                if code.contains(".unwrap()") || code.contains(".expect(") {
                    violations.push(format!("{}:{}: {}", path.display(), line_no + 1, code));
                }
            }
        }
    }
    assert_no_violations(violations);
}

// =============================================================================
// Logging
// =============================================================================

#[test]
fn only_binary_installs_subscriber() {
    let mut violations = Vec::new();
    for path in rust_files(Path::new("src")) {
        if path.ends_with("main.rs") {
            continue;
        }
        if non_test_source(&path).contains("tracing_subscriber") {
            violations.push(format!("{}: references tracing_subscriber", path.display()));
        }
    }
    assert_no_violations(violations);
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn every_command_module_is_dispatched() {
    let command_dir = Path::new("src/cli/commands");
    let dispatch = fs::read_to_string(command_dir.join("mod.rs")).expect("Failed to read mod.rs");

    let mut violations = Vec::new();
    for path in rust_files(command_dir) {
        let stem = path.file_stem().unwrap().to_str().unwrap();
        if stem == "mod" {
            continue;
        }
        if !dispatch.contains(&format!("mod {stem};")) {
            violations.push(format!("{stem}.rs: not declared in commands/mod.rs"));
        }
        if !dispatch.contains(&format!("{stem}::{stem}(")) {
            violations.push(format!("{stem}.rs: not reachable from dispatch()"));
        }
    }
    assert_no_violations(violations);
}
