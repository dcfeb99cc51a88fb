//! Integration tests that run the metamark binary

mod common;

use common::{create_temp_project, read_meta, run_in};

#[test]
fn test_extract_writes_meta_files() {
    let project = create_temp_project();
    let root = project.path();

    let output = run_in(
        root,
        &["extract", "--root", ".", "--output", "out", "--marks", "marks.json"],
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "Command should succeed: {}", stderr);

    let shape_h = read_meta(&root.join("out/include/geo/shape.h.meta"));
    let shape = &shape_h["records"][0];
    assert_eq!(shape["name"], "Shape");
    assert_eq!(shape["full_name"], "Geo::Shape");
    assert_eq!(shape["attrs"], serde_json::json!(["serializable"]));
    assert_eq!(shape["comment"], "Anything with an area.");
    assert_eq!(shape["fields"][0]["full_name"], "Geo::Shape::id");
    assert_eq!(shape["fields"][0]["access"], "protected");
    assert_eq!(shape["methods"][0]["is_pure_virtual"], true);
    assert_eq!(shape_h["enums"][0]["constants"][1]["value"], 1);

    let shapes_cpp = read_meta(&root.join("out/src/shapes.cpp.meta"));
    let param = &shapes_cpp["functions"][0]["params"][0];
    assert_eq!(param["full_name"], "Geo::make_circle::0");
    assert_eq!(param["attrs"], serde_json::json!(["radius"]));
    assert_eq!(param["is_default"], true);
    assert_eq!(param["default_value"], "1.0");

    // No location at all: filed under the sentinel bucket
    let unresolved = read_meta(&root.join("out/_unresolved.meta"));
    assert_eq!(unresolved["variables"][0]["full_name"], "Geo::origin");
    assert_eq!(unresolved["variables"][0]["raw_type"], "const Geo::Point");

    assert!(
        stderr.contains("did you mean") && stderr.contains("Geo::Shpae"),
        "Should suggest a fix for the misspelled mark: {}",
        stderr
    );
}

#[test]
fn test_extract_document_key_order() {
    let project = create_temp_project();
    let root = project.path();

    let output = run_in(root, &["extract", "-r", ".", "-o", "out", "-m", "marks.json"]);
    assert!(output.status.success());

    let raw = std::fs::read_to_string(root.join("out/include/geo/shape.h.meta")).unwrap();
    let records = raw.find("\"records\"").unwrap();
    let variables = raw.find("\"variables\"").unwrap();
    let functions = raw.find("\"functions\"").unwrap();
    let enums = raw.find("\"enums\"").unwrap();
    assert!(records < variables && variables < functions && functions < enums);
    assert!(raw.starts_with(r#"{"records":[{"name":"Shape","full_name":"Geo::Shape","attrs""#));
}

#[test]
fn test_extract_skip_unresolved() {
    let project = create_temp_project();
    let root = project.path();

    let output = run_in(
        root,
        &["extract", "-r", ".", "-o", "out", "-m", "marks.json", "--skip-unresolved"],
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "Command should succeed: {}", stderr);
    assert!(!root.join("out/_unresolved.meta").exists());
    assert!(root.join("out/include/geo/shape.h.meta").is_file());
    assert!(stderr.contains("unresolvable"), "Should report skips: {}", stderr);
}

#[test]
fn test_extract_explicit_trees_pretty() {
    let project = create_temp_project();
    let root = project.path();

    let output = run_in(
        root,
        &[
            "extract",
            "-r",
            ".",
            "-o",
            "out",
            "-m",
            "marks.json",
            "--pretty",
            "build/shapes.ast.json",
        ],
    );
    assert!(output.status.success());

    let raw = std::fs::read_to_string(root.join("out/src/shapes.cpp.meta")).unwrap();
    assert!(raw.contains("\n  \"functions\""), "Should be indented: {}", raw);
}

#[test]
fn test_extract_missing_output_dir_fails() {
    let project = create_temp_project();
    let root = project.path();

    let output = run_in(
        root,
        &["extract", "-r", ".", "-o", "missing", "-m", "marks.json"],
    );
    assert!(!output.status.success(), "Command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"), "stderr: {}", stderr);
    assert!(!root.join("missing").exists());
}

#[test]
fn test_extract_missing_root_fails() {
    let project = create_temp_project();
    let root = project.path();

    let output = run_in(
        root,
        &["extract", "-r", "nope", "-o", "out", "-m", "marks.json"],
    );
    assert!(!output.status.success(), "Command should fail");
    let written = std::fs::read_dir(root.join("out")).unwrap().count();
    assert_eq!(written, 0, "Nothing should be written");
}

#[test]
fn test_extract_uses_default_config() {
    let project = create_temp_project();
    let root = project.path();
    std::fs::create_dir_all(root.join(".config/metamark")).unwrap();
    std::fs::write(
        root.join(".config/metamark/config.json"),
        r#"{ "marks": ["marks.json"], "output": "out", "unresolved": "skip",
             "include": ["build/*.ast.json"] }"#,
    )
    .unwrap();

    let output = run_in(root, &["extract"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "Command should succeed: {}", stderr);
    assert!(root.join("out/include/geo/shape.h.meta").is_file());
    assert!(!root.join("out/_unresolved.meta").exists());
}

#[test]
fn test_extract_refuses_paths_outside_output() {
    let project = create_temp_project();
    let root = project.path();
    std::fs::write(
        root.join("build/outside.ast.json"),
        r#"{ "directory": "..", "decls": [
            { "kind": "function", "name": "leak", "qualified_name": "leak",
              "return_type": "void", "location": { "file": "../elsewhere/leak.h", "line": 1 } }
        ] }"#,
    )
    .unwrap();
    std::fs::write(root.join("extra.json"), r#"{ "leak": [] }"#).unwrap();

    let output = run_in(
        root,
        &["extract", "-r", ".", "-o", "out", "-m", "marks.json", "-m", "extra.json"],
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "Command should succeed: {}", stderr);
    assert!(stderr.contains("outside the output directory"), "stderr: {}", stderr);
    assert!(root.join("out/include/geo/shape.h.meta").is_file());
}

#[test]
fn test_marks_command() {
    let project = create_temp_project();
    let root = project.path();
    std::fs::write(root.join("later.json"), r#"{ "Geo :: Shape": ["replaced"] }"#).unwrap();

    let output = run_in(root, &["marks", "-m", "marks.json", "-m", "later.json"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let merged: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(merged["Geo::Shape"], serde_json::json!(["replaced"]));
    assert_eq!(merged["Geo::make_circle::0"], serde_json::json!(["radius"]));
}

#[test]
fn test_marks_command_reports_bad_files() {
    let project = create_temp_project();
    let root = project.path();
    std::fs::write(root.join("bad.json"), "[1, 2]").unwrap();

    let output = run_in(root, &["marks", "-m", "bad.json", "-m", "marks.json"]);
    assert!(output.status.success(), "Bad mark files are not fatal");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not a JSON object"), "stderr: {}", stderr);
}

#[test]
fn test_dump_command() {
    let project = create_temp_project();
    let root = project.path();

    let output = run_in(root, &["dump", "build/shapes.ast.json", "-m", "marks.json"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("unit src/shapes.cpp"), "stdout: {}", stdout);
    assert!(
        stdout.contains("*   class Geo::Shape [serializable]"),
        "stdout: {}",
        stdout
    );
    assert!(stdout.contains("constant Circle = 0"), "stdout: {}", stdout);
}
