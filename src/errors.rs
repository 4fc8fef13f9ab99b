//! Convene Error Handling - Unified Engine Error API
//!
//! Two layers only: [`Failure`] is the original cause raised inside invoked
//! code, carried intact through every wrapping layer; [`ConveneError`] is the
//! unified error type for everything the engine itself can report.

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

// ============================================================================
// FAILURE - The preserved original cause
// ============================================================================

/// The original failure raised inside invoked code.
///
/// The message lives behind an `Arc` so that clones of one failure share
/// identity: however many wrapping layers a failure crosses, the cause the
/// caller finally observes is the same one the invoked method raised, and
/// [`Failure::same_cause`] can prove it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Failure {
    message: Arc<str>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Arc::from(message.into()),
        }
    }

    /// The failure message, exactly as raised.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if `other` is (a clone of) the same original cause,
    /// not merely an equal message.
    pub fn same_cause(&self, other: &Failure) -> bool {
        Arc::ptr_eq(&self.message, &other.message)
    }
}

impl PartialEq for Failure {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

impl Eq for Failure {}

// ============================================================================
// CONVENE ERROR - Unified engine error
// ============================================================================

/// Unified error type for all engine failure modes.
///
/// `Case` is the common path: the invoked method raised, and the cause is
/// forwarded transparently. The remaining variants are the engine's own:
/// substrate faults at the dispatch boundary and configuration gaps.
#[derive(Debug, Error, Diagnostic)]
pub enum ConveneError {
    /// A failure raised by invoked code, unwrapped to its original cause.
    #[error(transparent)]
    #[diagnostic(code(convene::case_failure))]
    Case(#[from] Failure),

    /// The dispatch boundary itself failed; the failure did not originate
    /// in the invoked method.
    #[error("invocation of '{type_name}::{method}' failed at the dispatch boundary: {message}")]
    #[diagnostic(
        code(convene::invocation),
        help("check that the bound closure matches the fixture's concrete type")
    )]
    Invocation {
        type_name: String,
        method: String,
        message: String,
    },

    /// No factory was registered for a selected fixture type.
    #[error("no factory registered for fixture type '{type_name}'")]
    #[diagnostic(
        code(convene::missing_factory),
        help("register one with Dispatch::factory before running")
    )]
    MissingFactory { type_name: String },

    /// A selected method has no dispatch entry.
    #[error("no dispatch entry for '{type_name}::{method}'")]
    #[diagnostic(
        code(convene::missing_dispatch),
        help("register the method with Dispatch::bind before running")
    )]
    MissingDispatch { type_name: String, method: String },
}

impl ConveneError {
    /// The preserved original cause, if this error is a case failure.
    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            ConveneError::Case(failure) => Some(failure),
            _ => None,
        }
    }
}
