use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ModelResult<T> = error_stack::Result<T, Error>;

#[derive(Error, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Error {
    #[error("Parse error")]
    ParseError,

    #[error("Reqwest error: {0}")]
    ReqwestError(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Client error {status}: {body}")]
    ClientError { status: u16, body: String },

    #[error("Serde deserialize error: {0}")]
    SerdeDeserialize(String),

    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl Error {
    /// Timeouts, connection failures, rate limiting and 5xx answers. A re-fetch may succeed.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::ReqwestError(_)
                | Error::Timeout
                | Error::ServerError { .. }
                | Error::ClientError {
                    status: 408 | 429,
                    ..
                }
        )
    }
}
