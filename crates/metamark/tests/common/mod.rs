//! Common test utilities.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Get the path to the test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn metamark_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_metamark"))
}

/// Run the binary with `args`, from inside `cwd`.
pub fn run_in(cwd: &Path, args: &[&str]) -> Output {
    metamark_bin()
        .current_dir(cwd)
        .args(args)
        .output()
        .expect("Failed to run metamark")
}

/// Create a temporary directory holding a copy of the fixture project.
pub fn create_temp_project() -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("Failed to create temp dir");
    let fixtures = fixtures_dir().join("project");

    std::fs::copy(fixtures.join("marks.json"), temp.path().join("marks.json"))
        .expect("Failed to copy marks.json");

    std::fs::create_dir_all(temp.path().join("build")).expect("Failed to create build dir");
    std::fs::copy(
        fixtures.join("build/shapes.ast.json"),
        temp.path().join("build/shapes.ast.json"),
    )
    .expect("Failed to copy shapes.ast.json");

    std::fs::create_dir_all(temp.path().join("out")).expect("Failed to create out dir");

    temp
}

/// Read and parse a written `.meta` document.
pub fn read_meta(path: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e))
}
