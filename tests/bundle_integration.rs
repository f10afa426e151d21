/*!
 * Integration tests for the code2md binary and library
 */

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use code2md::config::{Args, Config};
use code2md::{run_bundle, Code2MdError};
use indicatif::ProgressBar;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn documents(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(root.join("codereview"))
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.ends_with(".md"))
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_library_pipeline_from_args() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    write(root, "src/a.ts", "const a = 1;");
    write(root, "src/b.py", "b = 2");
    write(root, "node_modules/x.ts", "ignored");
    write(root, ".code2md.json", r#"{ "defaultExtensions": ["ts", "py"] }"#);

    let args = <Args as clap::Parser>::parse_from(["code2md", "--root", root.to_str().unwrap()]);
    let config = Config::from_args(args).unwrap();
    config.validate().unwrap();

    let report = run_bundle(&config, Arc::new(ProgressBar::hidden()))
        .await
        .unwrap();

    let paths: Vec<_> = report.file_details.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["src/a.ts", "src/b.py"]);
    assert_eq!(documents(root).len(), 1);
}

#[tokio::test]
async fn test_library_reports_no_matching_files() {
    let temp_dir = tempdir().unwrap();
    write(temp_dir.path(), "notes.bin", "data");

    let args = <Args as clap::Parser>::parse_from([
        "code2md",
        "--root",
        temp_dir.path().to_str().unwrap(),
        "--extensions",
        "rs",
    ]);
    let config = Config::from_args(args).unwrap();

    let result = run_bundle(&config, Arc::new(ProgressBar::hidden())).await;
    assert!(matches!(result, Err(Code2MdError::NoMatchingFiles)));
}

#[test]
fn test_cli_bundles_and_prints_summary() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    write(root, "lib/main.go", "package main");
    write(root, "lib/keep.log", "kept");
    write(root, "lib/drop.log", "dropped");

    let output = Command::new(env!("CARGO_BIN_EXE_code2md"))
        .args([
            "--root",
            root.to_str().unwrap(),
            "--extensions",
            "go,log",
            "--ignore-patterns",
            "*.log,!keep.log",
        ])
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to run code2md");

    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Processed 2 of 2 files"));

    let names = documents(root);
    assert_eq!(names.len(), 1);
    let document = fs::read_to_string(root.join("codereview").join(&names[0])).unwrap();
    assert!(document.contains("- [lib/keep.log](#file-lib-keep-log)"));
    assert!(document.contains("```go\npackage main\n```"));
    assert!(!document.contains("drop.log"));
}

#[test]
fn test_cli_missing_root_fails() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("missing");

    let output = Command::new(env!("CARGO_BIN_EXE_code2md"))
        .args(["--root", missing.to_str().unwrap()])
        .output()
        .expect("Failed to run code2md");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error: "));
    assert_eq!(stderr.trim_end().lines().count(), 1);
}

#[test]
fn test_cli_generates_completions() {
    let output = Command::new(env!("CARGO_BIN_EXE_code2md"))
        .args(["--generate", "bash"])
        .output()
        .expect("Failed to run code2md");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("code2md"));
}
