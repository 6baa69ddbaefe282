// ── Bootstrap status snapshots ──
//
// Immutable values emitted by the initialization controller on every phase
// transition and every retry countdown tick.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use strum::{Display, EnumString, IntoStaticStr};

/// A step of the bootstrap sequence, or one of its outcome states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    NetworkCheck,
    ConfigValidation,
    RemoteInit,
    Authentication,
    DependencyInit,
    Success,
    Error,
    Retrying,
}

impl Phase {
    /// The happy-path sequence, in order.
    pub const SEQUENCE: [Phase; 5] = [
        Phase::NetworkCheck,
        Phase::ConfigValidation,
        Phase::RemoteInit,
        Phase::Authentication,
        Phase::DependencyInit,
    ];

    /// Progress reported when this phase is entered.
    pub fn progress(self) -> Option<f32> {
        match self {
            Phase::NetworkCheck => Some(0.0),
            Phase::ConfigValidation => Some(0.2),
            Phase::RemoteInit => Some(0.4),
            Phase::Authentication => Some(0.6),
            Phase::DependencyInit => Some(0.8),
            Phase::Success => Some(1.0),
            Phase::Error | Phase::Retrying => None,
        }
    }

    /// `Success` and `Error` end a run (an `Error` may still be followed
    /// by `Retrying` when attempts remain).
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Success | Phase::Error)
    }
}

/// Failure classes a bootstrap run can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    NetworkUnavailable,
    InvalidConfiguration,
    UnsupportedTarget,
    RemoteServiceError,
    AuthenticationDisabled,
    RetriesExhausted,
}

impl ErrorKind {
    /// Whether re-attempting may succeed without caller intervention.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::NetworkUnavailable | Self::RemoteServiceError)
    }
}

/// The error record carried by an `Error` status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitError {
    pub kind: ErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl InitError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Synthesize the terminal error for an exhausted retry budget.
    pub fn exhausted(attempts: u32, last: &InitError) -> Self {
        Self {
            kind: ErrorKind::RetriesExhausted,
            message: format!("gave up after {attempts} attempts"),
            detail: Some(format!("{}: {}", last.kind, last.message)),
        }
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)?;
        if let Some(ref detail) = self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

impl std::error::Error for InitError {}

/// One immutable snapshot of bootstrap progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitializationStatus {
    pub phase: Phase,
    pub current_attempt: u32,
    pub max_attempts: u32,
    pub progress: Option<f32>,
    #[serde(with = "duration_ms")]
    pub next_retry_in: Option<Duration>,
    pub is_retrying: bool,
    pub error: Option<InitError>,
}

impl InitializationStatus {
    pub(crate) fn phase(phase: Phase, attempt: u32, max_attempts: u32) -> Self {
        Self {
            phase,
            current_attempt: attempt,
            max_attempts,
            progress: phase.progress(),
            next_retry_in: None,
            is_retrying: false,
            error: None,
        }
    }

    pub(crate) fn failed(
        error: InitError,
        attempt: u32,
        max_attempts: u32,
        progress: Option<f32>,
        will_retry: bool,
    ) -> Self {
        Self {
            phase: Phase::Error,
            current_attempt: attempt,
            max_attempts,
            progress,
            next_retry_in: None,
            is_retrying: will_retry,
            error: Some(error),
        }
    }

    pub(crate) fn retrying(remaining: Duration, attempt: u32, max_attempts: u32) -> Self {
        Self {
            phase: Phase::Retrying,
            current_attempt: attempt,
            max_attempts,
            progress: None,
            next_retry_in: Some(remaining),
            is_retrying: true,
            error: None,
        }
    }

    /// Short human label, e.g. `"remote_init (attempt 2/5)"`.
    pub fn label(&self) -> String {
        format!(
            "{} (attempt {}/{})",
            self.phase, self.current_attempt, self.max_attempts
        )
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::Serializer;

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => s.serialize_none(),
        }
    }
}
