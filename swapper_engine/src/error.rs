use error_stack::{AttachmentKind, FrameKind, Report};
use serde::{Deserialize, Serialize};
use swapper_models::error::Error as ModelError;
use thiserror::Error;

pub type EngineResult<T> = error_stack::Result<T, Error>;

#[derive(Error, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Error {
    /// The source cannot quote this pair. Expected steady state, excluded from ranking.
    #[error("No route available: {0}")]
    NoRouteAvailable(String),

    /// Timeout, connection failure or 5xx. Re-fetching may succeed.
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// The source refused our credentials, usually a missing or revoked API key
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Quote expired")]
    QuoteExpired,

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Token approval required for spender {spender}")]
    ApprovalRequired { spender: String },

    #[error("Transaction build failure: {0}")]
    TransactionBuildFailure(String),

    #[error("Broadcast failure: {0}")]
    BroadcastFailure(String),

    #[error("No quotes available")]
    NoQuotesAvailable,

    #[error("Nothing to withdraw")]
    NothingToWithdraw,

    #[error("Trading halted for {0}")]
    TradingHalted(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Parse error")]
    ParseError,

    #[error("Response error")]
    ResponseError,

    #[error("Models error")]
    ModelsError,
}

impl Error {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TransportFailure(_))
    }

    /// Failures that must reach the user, as opposed to a source declining to quote
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::NoRouteAvailable(_))
    }
}

/// Lifts a model report into the engine taxonomy, keeping transport failures retryable
pub fn from_model_report(report: Report<ModelError>) -> Report<Error> {
    let context = if report.current_context().is_transport() {
        Error::TransportFailure(report.current_context().to_string())
    } else {
        Error::ModelsError
    };
    report.change_context(context)
}

pub trait ReportDisplayExt {
    fn format(&self) -> String;
}

impl ReportDisplayExt for Report<Error> {
    /// Current context followed by the printable attachments, for user-facing messages
    fn format(&self) -> String {
        let mut output = self.current_context().to_string();

        for frame in self.frames() {
            if let FrameKind::Attachment(AttachmentKind::Printable(attachment)) = frame.kind() {
                output.push_str(&format!(": {attachment}"));
            }
        }

        output
    }
}
