use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonStoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed ledger file {path}: {reason}")]
    Malformed { path: String, reason: String },
}

impl From<JsonStoreError> for careledger_store::StoreError {
    fn from(e: JsonStoreError) -> Self {
        match e {
            JsonStoreError::Io { source, .. } => careledger_store::StoreError::Io(source),
            JsonStoreError::Malformed { .. } => {
                careledger_store::StoreError::Corruption(e.to_string())
            }
        }
    }
}
