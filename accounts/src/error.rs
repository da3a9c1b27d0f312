use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountsError {
    #[error("account table lock poisoned")]
    LockPoisoned,
}
