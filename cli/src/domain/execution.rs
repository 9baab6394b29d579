//! Script execution outcomes and transcripts.

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

/// Which output stream a transcript line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// One line of script output tagged with its stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptLine {
    pub stream: Stream,
    pub text: String,
}

impl TranscriptLine {
    #[must_use]
    pub fn new(stream: Stream, text: impl Into<String>) -> Self {
        Self {
            stream,
            text: text.into(),
        }
    }
}

impl fmt::Display for TranscriptLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stream.tag(), self.text)
    }
}

/// Why an execution did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureCause {
    /// The script could not be fetched from the source.
    Fetch { reason: String },
    /// The script could not be written to the scratch directory.
    Materialization { reason: String },
    /// The interpreter could not be started.
    ProcessStart { reason: String },
    /// The script exceeded its time bound and was killed.
    Timeout { after_secs: u64 },
    /// The run was cancelled by the caller and the script was killed.
    Cancelled,
    /// The script exited with a non-zero code.
    NonZeroExit { code: i32 },
    /// The script was terminated by a signal and produced no exit code.
    Terminated,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch { reason } => write!(f, "fetch failed: {reason}"),
            Self::Materialization { reason } => write!(f, "could not write script: {reason}"),
            Self::ProcessStart { reason } => write!(f, "could not start script: {reason}"),
            Self::Timeout { after_secs } => write!(f, "timed out after {after_secs}s"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::NonZeroExit { code } => write!(f, "exited with code {code}"),
            Self::Terminated => write!(f, "terminated by signal"),
        }
    }
}

/// Outcome of one script run. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub transcript: Vec<TranscriptLine>,
    /// Process exit code; `0` when the process never started, `-1` when it
    /// was killed without producing one.
    pub exit_code: i32,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureCause>,
}

impl ExecutionResult {
    /// Result for a process that ran to completion.
    ///
    /// `code` is `None` when the process was terminated by a signal.
    #[must_use]
    pub fn completed(
        code: Option<i32>,
        transcript: Vec<TranscriptLine>,
        duration: Duration,
    ) -> Self {
        let (success, exit_code, failure) = match code {
            Some(0) => (true, 0, None),
            Some(code) => (false, code, Some(FailureCause::NonZeroExit { code })),
            None => (false, -1, Some(FailureCause::Terminated)),
        };
        Self {
            success,
            transcript,
            exit_code,
            duration,
            failure,
        }
    }

    /// Result for a process killed because its timeout elapsed.
    #[must_use]
    pub fn timed_out(
        timeout: Duration,
        exit_code: Option<i32>,
        transcript: Vec<TranscriptLine>,
        duration: Duration,
    ) -> Self {
        Self {
            success: false,
            transcript,
            exit_code: exit_code.unwrap_or(-1),
            duration,
            failure: Some(FailureCause::Timeout {
                after_secs: timeout.as_secs(),
            }),
        }
    }

    /// Result for a process killed because the caller cancelled the run.
    #[must_use]
    pub fn cancelled(
        exit_code: Option<i32>,
        transcript: Vec<TranscriptLine>,
        duration: Duration,
    ) -> Self {
        Self {
            success: false,
            transcript,
            exit_code: exit_code.unwrap_or(-1),
            duration,
            failure: Some(FailureCause::Cancelled),
        }
    }

    /// Result for a failure that happened before any process ran.
    #[must_use]
    pub fn not_run(cause: FailureCause) -> Self {
        Self {
            success: false,
            transcript: Vec::new(),
            exit_code: 0,
            duration: Duration::ZERO,
            failure: Some(cause),
        }
    }

    /// Successful result that records a message instead of running a script.
    #[must_use]
    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            success: true,
            transcript: vec![TranscriptLine::new(Stream::Stdout, message)],
            exit_code: 0,
            duration: Duration::ZERO,
            failure: None,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.failure, Some(FailureCause::Timeout { .. }))
    }

    /// Lines of one stream, in emission order.
    pub fn lines(&self, stream: Stream) -> impl Iterator<Item = &str> {
        self.transcript
            .iter()
            .filter(move |l| l.stream == stream)
            .map(|l| l.text.as_str())
    }

    /// Annotated transcript, one `[stream] text` line per captured line.
    #[must_use]
    pub fn transcript_text(&self) -> String {
        let mut out = String::new();
        for line in &self.transcript {
            out.push_str(&line.to_string());
            out.push('\n');
        }
        out
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)] // signature fixed by serde
fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}
