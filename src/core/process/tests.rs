// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{ProcessBuilder, ProcessFlags};

#[cfg(unix)]
#[tokio::test]
async fn test_process_echo() {
    let output = ProcessBuilder::which("echo")
        .expect("echo should be in PATH")
        .arg("hello")
        .run()
        .await
        .expect("echo should succeed");

    assert!(output.success());
    insta::assert_snapshot!(output.stdout().trim(), @"hello");
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_exit_code_allowed() {
    let output = ProcessBuilder::which("sh")
        .expect("sh should be in PATH")
        .args(["-c", "exit 42"])
        .flag(ProcessFlags::ALLOW_FAILURE)
        .run()
        .await
        .expect("process should complete");

    assert_eq!(output.exit_code(), 42);
    assert!(!output.success());
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_exit_code_rejected() {
    let result = ProcessBuilder::which("sh")
        .expect("sh should be in PATH")
        .args(["-c", "exit 1"])
        .run()
        .await;

    assert!(result.is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_env() {
    let output = ProcessBuilder::which("sh")
        .expect("sh should be in PATH")
        .args(["-c", "echo $KHMOD_TEST_VAR"])
        .env("KHMOD_TEST_VAR", "test_value")
        .run()
        .await
        .expect("process should succeed");

    assert_eq!(output.stdout().trim(), "test_value");
}

#[test]
fn test_executable_lookup_missing() {
    let result = ProcessBuilder::which("definitely-not-a-real-executable-khmod");
    assert!(result.is_err());
}

#[test]
fn test_success_codes_override() {
    let builder = ProcessBuilder::new("/bin/true").success_codes([0, 3]);
    insta::assert_debug_snapshot!(builder.success_codes, @r"
    {
        0,
        3,
    }
    ");
}
