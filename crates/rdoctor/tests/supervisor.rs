#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for child supervision: capture ordering, terminal
//! records and exit-code resolution, using real `sh` children.

use rdoctor::subprocess::{Supervisor, SupervisorError};
use rdoctor_core::{CapturedLine, Origin};
use tokio::sync::mpsc;

fn sh(script: &str) -> Vec<String> {
    vec!["sh".into(), "-c".into(), script.into()]
}

async fn run_capture(script: &str) -> (i32, Vec<CapturedLine>) {
    let (tx, mut rx) = mpsc::channel(256);
    let child = Supervisor::spawn(&sh(script), tx).unwrap();
    assert!(child.pid().is_some());
    let collector = tokio::spawn(async move {
        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        lines
    });
    let code = child.wait().await;
    (code, collector.await.unwrap())
}

fn stream(lines: &[CapturedLine], origin: Origin) -> Vec<&CapturedLine> {
    lines.iter().filter(|l| l.origin == origin).collect()
}

#[tokio::test]
async fn hello_on_stdout_then_clean_exit() {
    let (code, lines) = run_capture("echo hello").await;

    assert_eq!(code, 0);
    let out = stream(&lines, Origin::Stdout);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].text, "hello");
    assert_eq!(out[0].sequence, 1);
    assert!(!out[0].terminal);
    assert!(out[1].terminal);
    assert_eq!(out[1].sequence, 2);
    assert!(out[1].text.is_empty());

    let err = stream(&lines, Origin::Stderr);
    assert_eq!(err.len(), 1);
    assert!(err[0].terminal);
    assert_eq!(err[0].sequence, 1);
}

#[tokio::test]
async fn streams_are_numbered_independently() {
    let (code, lines) = run_capture("echo a; echo x >&2; echo b; echo y >&2; echo z >&2").await;

    assert_eq!(code, 0);
    let out: Vec<u64> = stream(&lines, Origin::Stdout).iter().map(|l| l.sequence).collect();
    let err: Vec<u64> = stream(&lines, Origin::Stderr).iter().map(|l| l.sequence).collect();
    assert_eq!(out, [1, 2, 3]);
    assert_eq!(err, [1, 2, 3, 4]);
}

#[tokio::test]
async fn sequences_stay_ordered_and_terminal_is_last() {
    let script = "i=1; while [ $i -le 200 ]; do echo line$i; i=$((i+1)); done";
    let (code, lines) = run_capture(script).await;

    assert_eq!(code, 0);
    let out = stream(&lines, Origin::Stdout);
    assert!(out.windows(2).all(|w| w[0].sequence < w[1].sequence));
    let last = out.last().unwrap();
    assert!(last.terminal);
    assert_eq!(last.sequence, 201);
    assert_eq!(out.iter().filter(|l| l.terminal).count(), 1);
}

#[tokio::test]
async fn exit_code_is_passed_through() {
    let (code, _) = run_capture("exit 7").await;
    assert_eq!(code, 7);
}

#[tokio::test]
async fn killed_child_reports_signal_convention_and_still_closes_streams() {
    let (code, lines) = run_capture("echo before; kill -KILL $$").await;

    assert_eq!(code, 128 + 9);
    assert_eq!(lines.iter().filter(|l| l.terminal).count(), 2);
}

#[tokio::test]
async fn missing_program_is_a_spawn_failure() {
    let (tx, _rx) = mpsc::channel(8);
    let command = vec!["/nonexistent/rdoctor-test-binary".to_string()];
    let err = Supervisor::spawn(&command, tx).err().unwrap();
    assert!(matches!(err, SupervisorError::SpawnFailed { .. }), "got {err:?}");
}

#[tokio::test]
async fn empty_command_is_rejected() {
    let (tx, _rx) = mpsc::channel(8);
    let err = Supervisor::spawn(&[], tx).err().unwrap();
    assert!(matches!(err, SupervisorError::EmptyCommand));
}
