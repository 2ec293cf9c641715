//! Error types for the pixstake system

use thiserror::Error;

/// Provider message raised when the wallet user declines a request.
pub const USER_REJECTED_REQUEST: &str = "User rejected the request.";
/// Provider message raised when the wallet refuses to sign a transaction.
pub const TRANSACTION_REJECTED: &str = "Transaction rejected";
/// Fragment of the simulation error returned for an unfunded fee payer.
pub const INSUFFICIENT_FUNDS_FRAGMENT: &str =
    "Attempt to debit an account but found no record of a prior credit";

#[derive(Debug, Error)]
pub enum Error {
    #[error("Address derivation failed: {0}")]
    Derivation(String),

    #[error("Failed to decode stake record: expected {expected} bytes, got {actual}")]
    Decode { expected: usize, actual: usize },

    #[error("User rejected the request.")]
    SignerRejected,

    #[error("{0}")]
    Signer(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Transactions not finalized after {attempts} status polls")]
    ConfirmationTimeout { attempts: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// User-facing bucket an action failure falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Cancelled,
    InsufficientFunds,
    Unexpected,
}

impl Error {
    /// Buckets a failure the way the wallet surfaces it to the user.
    ///
    /// Wallet providers only hand back strings, so signer and RPC messages are
    /// matched against the known provider texts.
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::SignerRejected => FailureKind::Cancelled,
            Error::InsufficientFunds(_) => FailureKind::InsufficientFunds,
            Error::Signer(message) | Error::Network(message) | Error::Other(message) => {
                classify_message(message)
            }
            Error::Rpc { message, .. } => classify_message(message),
            _ => FailureKind::Unexpected,
        }
    }
}

pub fn classify_message(message: &str) -> FailureKind {
    match message {
        USER_REJECTED_REQUEST | TRANSACTION_REJECTED => FailureKind::Cancelled,
        m if m.contains(INSUFFICIENT_FUNDS_FRAGMENT) => FailureKind::InsufficientFunds,
        _ => FailureKind::Unexpected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_cancellations() {
        assert_eq!(Error::SignerRejected.kind(), FailureKind::Cancelled);
        assert_eq!(
            Error::Signer("Transaction rejected".to_string()).kind(),
            FailureKind::Cancelled
        );
        assert_eq!(
            Error::Signer("User rejected the request.".to_string()).kind(),
            FailureKind::Cancelled
        );
    }

    #[test]
    fn test_debit_simulation_failure_is_insufficient_funds() {
        let err = Error::Rpc {
            code: -32002,
            message: "failed to send transaction: Transaction simulation failed: \
                Attempt to debit an account but found no record of a prior credit."
                .to_string(),
        };
        assert_eq!(err.kind(), FailureKind::InsufficientFunds);
    }

    #[test]
    fn test_everything_else_is_unexpected() {
        assert_eq!(
            Error::ConfirmationTimeout { attempts: 3 }.kind(),
            FailureKind::Unexpected
        );
        assert_eq!(
            Error::Signer("wallet disconnected".to_string()).kind(),
            FailureKind::Unexpected
        );
        assert_eq!(
            Error::Derivation("no bump".to_string()).kind(),
            FailureKind::Unexpected
        );
    }
}
