//! Integration tests for the ambient-score CLI.
//!
//! These run the built binary and check its output and exit codes.

use std::process::Command;

fn ambient_score() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ambient-score"))
}

#[test]
fn test_json_output_names_winner() {
    let output = ambient_score()
        .args(["--json", "#ff0000:10", "#808080:60"])
        .output()
        .expect("Failed to execute ambient-score");
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
    assert_eq!(json["winner"]["hex"], "#ff0000");
    assert_eq!(json["candidates"].as_array().map(Vec::len), Some(2));
    assert!(json["candidates"][1]["rejection_reason"].is_string());
}

#[test]
fn test_text_output_explains_scores() {
    let output = ambient_score()
        .arg("#ff0000:10")
        .output()
        .expect("Failed to execute ambient-score");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Sat:80 | Bri:-50 | Prev:25 | Hue:15 = 70"), "{}", stdout);
    assert!(stdout.contains("Red/Orange hue"));
}

#[test]
fn test_invalid_color_exits_with_error() {
    let output = ambient_score()
        .arg("#nothex")
        .output()
        .expect("Failed to execute ambient-score");
    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_help_shows_examples() {
    let output = ambient_score()
        .arg("--help")
        .output()
        .expect("Failed to execute ambient-score");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(r##"ambient-score "#ff0000:12.5""##), "{}", stdout);
}
