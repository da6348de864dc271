//! Error kinds surfaced through a command's completion slot.

use thiserror::Error;

/// Everything that can go wrong talking to one engine process.
///
/// These map 1:1 onto the per-game error kinds in the error handling design:
/// the enclosing game layer observes them through a command's result and
/// decides whether to retry or resign.
#[derive(Debug, Error)]
pub enum Error {
    /// The adapter has already transitioned to `Dead`; no command is sent.
    #[error("engine adapter is dead")]
    DeadEngine,

    /// The engine replied with a `?` frame. The payload is the engine's own
    /// explanation, verbatim.
    #[error("engine reported failure: {0}")]
    ProtocolFailure(String),

    /// The frame's first non-whitespace byte was neither `=` nor `?`.
    #[error("unexpected engine output: {0}")]
    UnexpectedOutput(String),

    /// Writing to the engine's stdin failed.
    #[error("transport error: {0}")]
    TransportError(#[source] std::io::Error),

    /// The process exited (or stdout hit EOF) while a command was pending.
    #[error("engine process exited while a command was pending")]
    EngineExited,
}
