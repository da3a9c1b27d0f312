//! RPC error types.

use thiserror::Error;

use crate::protocol::Response;

/// Everything that can stop a request from producing a success response.
///
/// [`RpcError::into_response`] is the one place an error becomes a wire
/// response: business-rule failures map to `status: failure`, everything
/// else to `status: error`.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Failure(String),

    #[error("ledger error: {0}")]
    Ledger(#[from] careledger_ledger::LedgerError),

    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RpcError {
    /// Whether this is an expected business condition rather than a fault.
    pub fn is_failure(&self) -> bool {
        matches!(self, RpcError::Failure(_))
    }

    pub fn into_response(self) -> Response {
        match self {
            RpcError::Failure(message) => Response::failure(message),
            other => Response::error(other.to_string()),
        }
    }
}

impl From<careledger_accounts::AccountsError> for RpcError {
    fn from(e: careledger_accounts::AccountsError) -> Self {
        match e {
            careledger_accounts::AccountsError::LockPoisoned => RpcError::LockPoisoned("account"),
        }
    }
}

/// Errors seen by a client talking to a node.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode request: {0}")]
    Encode(serde_json::Error),

    #[error("could not decode response: {0}")]
    Decode(serde_json::Error),
}
