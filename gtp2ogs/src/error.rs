//! Top-level error taxonomy. Every fatal startup condition maps to one of
//! these and exits the process with status 1; everything else is handled
//! in place and logged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration is invalid: {0}")]
    ConfigInvalid(String),

    #[error("authentication with the server failed: {0}")]
    AuthFailed(String),

    #[error("socket disconnected: {0}")]
    SocketDisconnected(String),

    #[error("rest call failed: {0}")]
    RestCallFailed(#[from] reqwest::Error),
}
