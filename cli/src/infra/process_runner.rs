//! Infrastructure implementation of the `ScriptRunner` port.
//!
//! Scripts run under the native shell as their own process group. Two reader
//! tasks forward tagged lines over a channel; the controlling loop owns the
//! transcript, mirrors each line to the sink and races process exit against
//! the cancellation token. The timeout is a timer task that cancels a child
//! token, so timeout and caller cancellation share one kill path.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::application::ports::{OutputSink, RunRequest, ScriptRunner};
use crate::domain::execution::{ExecutionResult, FailureCause, Stream, TranscriptLine};

/// How long to wait for readers to hit EOF after the process is gone.
pub const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Sink that discards every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn line(&self, _line: &TranscriptLine) {}
}

/// Production `ScriptRunner` backed by `tokio::process`.
pub struct TokioScriptRunner<S = NullSink> {
    sink: S,
}

impl<S: OutputSink> TokioScriptRunner<S> {
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

enum Exit {
    Status(std::io::Result<std::process::ExitStatus>),
    Killed,
}

impl<S: OutputSink> ScriptRunner for TokioScriptRunner<S> {
    async fn run(&self, request: &RunRequest<'_>) -> ExecutionResult {
        let started = Instant::now();
        let (program, mut command) = shell_command(request.script);
        command
            .current_dir(request.working_dir)
            .envs(request.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let mut command = tokio::process::Command::from(command);
        command.kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(program, error = %e, "cannot start script");
                return ExecutionResult::not_run(FailureCause::ProcessStart {
                    reason: format!("failed to spawn {program}: {e}"),
                });
            }
        };
        let pid = child.id();
        tracing::debug!(?pid, script = %request.script.display(), "script started");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(forward_lines(stdout, Stream::Stdout, tx.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(forward_lines(stderr, Stream::Stderr, tx.clone())));
        }
        drop(tx);

        let cancel = request.cancel.child_token();
        let expired = Arc::new(AtomicBool::new(false));
        let timer = {
            let cancel = cancel.clone();
            let expired = Arc::clone(&expired);
            let timeout = request.timeout;
            tokio::spawn(async move {
                tokio::select! {
                    () = tokio::time::sleep(timeout) => {
                        expired.store(true, Ordering::SeqCst);
                        cancel.cancel();
                    }
                    () = cancel.cancelled() => {}
                }
            })
        };

        let mut transcript = Vec::new();
        let mut open = true;
        let exit = loop {
            tokio::select! {
                line = rx.recv(), if open => match line {
                    Some(line) => {
                        self.sink.line(&line);
                        transcript.push(line);
                    }
                    None => open = false,
                },
                status = child.wait() => break Exit::Status(status),
                () = cancel.cancelled() => break Exit::Killed,
            }
        };
        timer.abort();

        let (code, killed) = match exit {
            Exit::Status(Ok(status)) => (status.code(), false),
            Exit::Status(Err(e)) => {
                tracing::warn!(error = %e, "lost track of script process");
                (None, false)
            }
            Exit::Killed => {
                kill_process_group(pid).await;
                if let Err(e) = child.kill().await {
                    tracing::debug!(error = %e, "kill after group kill failed");
                }
                (None, true)
            }
        };

        let drain = async {
            while let Some(line) = rx.recv().await {
                self.sink.line(&line);
                transcript.push(line);
            }
        };
        if tokio::time::timeout(DRAIN_GRACE, drain).await.is_err() {
            tracing::debug!("output readers still open after grace period, aborting");
        }
        for reader in readers {
            reader.abort();
            let _ = reader.await;
        }

        let duration = started.elapsed();
        if !killed {
            return ExecutionResult::completed(code, transcript, duration);
        }
        if expired.load(Ordering::SeqCst) {
            tracing::warn!(timeout_s = request.timeout.as_secs(), "script timed out");
            ExecutionResult::timed_out(request.timeout, code, transcript, duration)
        } else {
            tracing::info!("script cancelled");
            ExecutionResult::cancelled(code, transcript, duration)
        }
    }
}

/// The native shell invocation for `script`.
fn shell_command(script: &Path) -> (&'static str, std::process::Command) {
    if cfg!(windows) {
        let mut command = std::process::Command::new("powershell");
        command
            .args([
                "-NoProfile",
                "-NonInteractive",
                "-ExecutionPolicy",
                "Bypass",
                "-File",
            ])
            .arg(script);
        ("powershell", command)
    } else {
        let mut command = std::process::Command::new("sh");
        command.arg(script);
        ("sh", command)
    }
}

/// Read `reader` line by line, decoding lossily, until EOF or the receiver
/// goes away.
async fn forward_lines<R>(reader: R, stream: Stream, tx: UnboundedSender<TranscriptLine>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                while matches!(buf.last(), Some(b'\n' | b'\r')) {
                    buf.pop();
                }
                let text = String::from_utf8_lossy(&buf).into_owned();
                if tx.send(TranscriptLine::new(stream, text)).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(stream = stream.tag(), error = %e, "output read failed");
                break;
            }
        }
    }
}

/// SIGKILL the whole process group led by `pid`.
#[cfg(unix)]
async fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };
    let group = format!("-{pid}");
    let status = tokio::process::Command::new("kill")
        .args(["-KILL", "--", &group])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = status {
        tracing::debug!(pid, error = %e, "cannot signal process group");
    }
}

#[cfg(not(unix))]
#[allow(clippy::unused_async)]
async fn kill_process_group(_pid: Option<u32>) {}
