//! The fail-fast channel.
//!
//! Contract violations are programming errors, so the default reaction is to
//! log a diagnostic and abort the process. [`EnforcementConfig`] can switch
//! the process to unwinding panics instead, which is what test suites and
//! hosts that isolate work behind `catch_unwind` want.
//!
//! This channel is deliberately separate from the `Result` values returned by
//! the `try_*` operations: those never abort, and [`Enforce::enforce`] is the
//! single bridge from one to the other.

use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::Violation;

/// How a fatal contract violation terminates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Log, print the diagnostic to stderr and `std::process::abort`.
    #[default]
    Abort,
    /// Panic with the diagnostic.
    Panic,
}

impl FailureMode {
    fn to_raw(self) -> u8 {
        match self {
            Self::Abort => 0,
            Self::Panic => 1,
        }
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Panic,
            _ => Self::Abort,
        }
    }
}

static FAILURE_MODE: AtomicU8 = AtomicU8::new(0);

/// Process-wide enforcement settings.
///
/// Deserializable so hosts can carry it in their own configuration files:
///
/// ```json
/// { "failure_mode": "panic" }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnforcementConfig {
    failure_mode: FailureMode,
}

impl EnforcementConfig {
    pub fn failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Publish these settings for every wrapper in the process.
    ///
    /// Later calls replace earlier ones.
    pub fn install(&self) {
        FAILURE_MODE.store(self.failure_mode.to_raw(), Ordering::SeqCst);
        tracing::debug!(failure_mode = ?self.failure_mode, "enforcement config installed");
    }
}

/// The currently installed failure mode.
pub fn failure_mode() -> FailureMode {
    FailureMode::from_raw(FAILURE_MODE.load(Ordering::SeqCst))
}

/// Terminate on a violation according to the installed [`FailureMode`].
#[track_caller]
pub fn fail_fast<V: Violation + ?Sized>(violation: &V) -> ! {
    let kind = violation.kind();
    tracing::error!(
        %kind,
        configuration_defect = violation.is_configuration_defect(),
        "contract violation: {violation}"
    );
    match failure_mode() {
        FailureMode::Panic => panic!("contract violation ({kind}): {violation}"),
        FailureMode::Abort => {
            eprintln!("contract violation ({kind}): {violation}");
            std::process::abort()
        }
    }
}

/// Route the error side of a `Result` through [`fail_fast`].
pub trait Enforce<T> {
    fn enforce(self) -> T;
}

impl<T, V: Violation> Enforce<T> for Result<T, V> {
    #[track_caller]
    fn enforce(self) -> T {
        match self {
            Ok(value) => value,
            Err(violation) => fail_fast(&violation),
        }
    }
}
