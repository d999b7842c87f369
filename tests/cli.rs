//! End-to-end tests that run the built `docqa` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn docqa_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("docqa");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("alpha.txt"),
        "Alpha notes.\n\nThe quarterly report is due on March 31.\n\nSubmit it to the finance team.",
    )
    .unwrap();
    fs::write(
        files_dir.join("people.csv"),
        "name,role\nAda,engineer\nGrace,admiral\n",
    )
    .unwrap();
    fs::write(files_dir.join("empty.txt"), "").unwrap();
    fs::write(files_dir.join("slides.pptx"), "not supported").unwrap();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_content = format!(
        r#"[chunking]
max_chars = 40
overlap_chars = 10

[embedding]
provider = "hashing"

[llm]
provider = "groq"
api_key_env = "DOCQA_CLI_TEST_KEY"

[log]
responses_path = "{}/responses.txt"
"#,
        root.display()
    );
    let config_path = config_dir.join("docqa.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_docqa(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = docqa_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("--progress")
        .arg("off")
        .args(args)
        .env_remove("DOCQA_CLI_TEST_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docqa binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_ingest_directory_reports_summaries_and_failures() {
    let (tmp, config) = setup_test_env();
    let files = tmp.path().join("files");

    let (stdout, stderr, success) = run_docqa(&config, &["ingest", files.to_str().unwrap()]);
    assert!(success, "ingest failed: {}", stderr);

    assert!(stdout.contains("File: alpha.txt"));
    assert!(stdout.contains("Type: Text"));
    assert!(stdout.contains("File: people.csv"));
    assert!(stdout.contains("Number of records: 2"));
    assert!(stdout.contains("Some files failed to process:"));
    assert!(stdout.contains("empty.txt: Empty document"));
    assert!(stdout.contains("slides.pptx: Unsupported file type: .pptx"));
    assert!(stdout.contains("Processed 2 file(s)"));
}

#[test]
fn test_ingest_only_empty_files_fails() {
    let (tmp, config) = setup_test_env();
    let empty = tmp.path().join("files").join("empty.txt");

    let (stdout, stderr, success) = run_docqa(&config, &["ingest", empty.to_str().unwrap()]);
    assert!(!success);
    assert!(stdout.contains("empty.txt: Empty document"));
    assert!(stderr.contains("No valid documents were processed. Please check your files."));
}

#[test]
fn test_ingest_missing_file_is_reported() {
    let (tmp, config) = setup_test_env();
    let alpha = tmp.path().join("files").join("alpha.txt");
    let missing = tmp.path().join("files").join("missing.txt");

    let (stdout, stderr, success) = run_docqa(
        &config,
        &["ingest", alpha.to_str().unwrap(), missing.to_str().unwrap()],
    );
    assert!(success, "ingest failed: {}", stderr);
    assert!(stdout.contains("missing.txt: failed to read file"));
}

#[test]
fn test_ask_without_credential_fails_fast() {
    let (tmp, config) = setup_test_env();
    let files = tmp.path().join("files");

    let (_stdout, stderr, success) = run_docqa(
        &config,
        &["ask", "--question", "When is the report due?", files.to_str().unwrap()],
    );
    assert!(!success);
    assert!(stderr.contains("DOCQA_CLI_TEST_KEY not found in environment variables"));
    assert!(!tmp.path().join("responses.txt").exists());
}

#[test]
fn test_invalid_config_rejected() {
    let (tmp, config) = setup_test_env();
    fs::write(&config, "[chunking]\nmax_chars = 10\noverlap_chars = 10\n").unwrap();
    let files = tmp.path().join("files");

    let (_stdout, _stderr, success) = run_docqa(&config, &["ingest", files.to_str().unwrap()]);
    assert!(!success);
}

#[test]
fn test_missing_config_uses_defaults() {
    let (tmp, _config) = setup_test_env();
    let alpha = tmp.path().join("files").join("alpha.txt");
    let absent = tmp.path().join("nowhere.toml");

    let (stdout, stderr, success) = run_docqa(&absent, &["ingest", alpha.to_str().unwrap()]);
    assert!(success, "ingest failed: {}", stderr);
    assert!(stdout.contains("Number of chunks: 1"));
}
