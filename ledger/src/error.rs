use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("chain integrity violation at index {index}: {reason}")]
    IntegrityViolation { index: u64, reason: String },

    #[error("stored chain is empty")]
    EmptyChain,

    #[error("storage error: {0}")]
    Storage(#[from] careledger_store::StoreError),
}
