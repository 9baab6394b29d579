//! Integration tests for the script runner against a real `sh`.

#![cfg(unix)]
#![allow(clippy::expect_used)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rigup_cli::application::ports::{OutputSink, RunRequest, ScriptRunner};
use rigup_cli::domain::execution::{FailureCause, Stream, TranscriptLine};
use rigup_cli::infra::process_runner::{NullSink, TokioScriptRunner};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Sink that keeps every mirrored line.
#[derive(Clone, Default)]
struct RecordingSink {
    lines: Arc<Mutex<Vec<TranscriptLine>>>,
}

impl OutputSink for RecordingSink {
    fn line(&self, line: &TranscriptLine) {
        self.lines.lock().expect("sink lock").push(line.clone());
    }
}

struct Fixture {
    dir: TempDir,
    env: BTreeMap<String, String>,
    cancel: CancellationToken,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
            env: BTreeMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    fn script(&self, body: &str) -> PathBuf {
        let path = self.dir.path().join("script.sh");
        std::fs::write(&path, body).expect("write script");
        path
    }

    fn request<'a>(&'a self, script: &'a Path, timeout: Duration) -> RunRequest<'a> {
        RunRequest {
            script,
            working_dir: self.dir.path(),
            env: &self.env,
            timeout,
            cancel: &self.cancel,
        }
    }
}

const GENEROUS: Duration = Duration::from_secs(30);

#[tokio::test]
async fn test_successful_script_captures_both_streams() {
    let fx = Fixture::new();
    let script = fx.script("echo out\necho err >&2\n");

    let result = TokioScriptRunner::new(NullSink)
        .run(&fx.request(&script, GENEROUS))
        .await;

    assert!(result.success);
    assert_eq!(result.exit_code, 0);
    assert!(result.failure.is_none());
    assert_eq!(result.lines(Stream::Stdout).collect::<Vec<_>>(), vec!["out"]);
    assert_eq!(result.lines(Stream::Stderr).collect::<Vec<_>>(), vec!["err"]);
}

#[tokio::test]
async fn test_non_zero_exit_preserves_code_and_output() {
    let fx = Fixture::new();
    let script = fx.script("echo before\necho oops >&2\nexit 7\n");

    let result = TokioScriptRunner::new(NullSink)
        .run(&fx.request(&script, GENEROUS))
        .await;

    assert!(!result.success);
    assert_eq!(result.exit_code, 7);
    assert_eq!(result.failure, Some(FailureCause::NonZeroExit { code: 7 }));
    assert_eq!(result.lines(Stream::Stdout).collect::<Vec<_>>(), vec!["before"]);
    assert_eq!(result.lines(Stream::Stderr).collect::<Vec<_>>(), vec!["oops"]);
}

#[tokio::test]
async fn test_per_stream_order_is_preserved_under_volume() {
    let fx = Fixture::new();
    let script = fx.script(
        "i=0\nwhile [ $i -lt 500 ]; do\n  echo \"out $i\"\n  echo \"err $i\" >&2\n  i=$((i+1))\ndone\n",
    );

    let sink = RecordingSink::default();
    let result = TokioScriptRunner::new(sink.clone())
        .run(&fx.request(&script, GENEROUS))
        .await;

    assert!(result.success);
    let expected_out: Vec<String> = (0..500).map(|i| format!("out {i}")).collect();
    let expected_err: Vec<String> = (0..500).map(|i| format!("err {i}")).collect();
    assert_eq!(result.lines(Stream::Stdout).collect::<Vec<_>>(), expected_out);
    assert_eq!(result.lines(Stream::Stderr).collect::<Vec<_>>(), expected_err);
    assert_eq!(*sink.lines.lock().expect("sink lock"), result.transcript);
}

#[tokio::test]
async fn test_environment_and_working_dir_are_applied() {
    let mut fx = Fixture::new();
    fx.env.insert("TOOL_NAME".to_string(), "jq".to_string());
    let script = fx.script("echo \"$TOOL_NAME\"\npwd\n");

    let result = TokioScriptRunner::new(NullSink)
        .run(&fx.request(&script, GENEROUS))
        .await;

    let out: Vec<_> = result.lines(Stream::Stdout).collect();
    assert_eq!(out[0], "jq");
    let pwd = std::fs::canonicalize(out[1]).expect("pwd exists");
    let dir = std::fs::canonicalize(fx.dir.path()).expect("dir exists");
    assert_eq!(pwd, dir);
}

#[tokio::test]
async fn test_invalid_utf8_is_decoded_lossily() {
    let fx = Fixture::new();
    let script = fx.script("printf 'caf\\351\\n'\n");

    let result = TokioScriptRunner::new(NullSink)
        .run(&fx.request(&script, GENEROUS))
        .await;

    assert!(result.success);
    assert_eq!(
        result.lines(Stream::Stdout).collect::<Vec<_>>(),
        vec!["caf\u{FFFD}"]
    );
}

#[tokio::test]
async fn test_timeout_kills_script_and_keeps_partial_output() {
    let fx = Fixture::new();
    let script = fx.script("echo started\nsleep 30\necho never\n");
    let started = Instant::now();

    let result = TokioScriptRunner::new(NullSink)
        .run(&fx.request(&script, Duration::from_millis(500)))
        .await;

    assert!(result.is_timeout());
    assert!(!result.success);
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "took {:?}",
        started.elapsed()
    );
    assert_eq!(result.lines(Stream::Stdout).collect::<Vec<_>>(), vec!["started"]);
}

#[tokio::test]
async fn test_timeout_kills_background_children_too() {
    let fx = Fixture::new();
    let script = fx.script("sleep 30 &\nsleep 30\n");
    let started = Instant::now();

    let result = TokioScriptRunner::new(NullSink)
        .run(&fx.request(&script, Duration::from_millis(300)))
        .await;

    assert!(result.is_timeout());
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "took {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_cancellation_kills_script() {
    let fx = Fixture::new();
    let script = fx.script("echo waiting\nsleep 30\n");
    let trigger = fx.cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });
    let started = Instant::now();

    let result = TokioScriptRunner::new(NullSink)
        .run(&fx.request(&script, GENEROUS))
        .await;

    assert_eq!(result.failure, Some(FailureCause::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_missing_working_dir_is_start_failure() {
    let fx = Fixture::new();
    let script = fx.script("echo hi\n");
    let missing = fx.dir.path().join("does-not-exist");
    let request = RunRequest {
        working_dir: &missing,
        ..fx.request(&script, GENEROUS)
    };

    let result = TokioScriptRunner::new(NullSink).run(&request).await;

    assert!(!result.success);
    assert_eq!(result.exit_code, 0);
    assert!(matches!(
        result.failure,
        Some(FailureCause::ProcessStart { .. })
    ));
}
