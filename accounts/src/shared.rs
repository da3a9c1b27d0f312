//! The lock-guarded account table injected into every node.

use std::sync::{Mutex, MutexGuard};

use crate::{AccountTable, AccountsError, IncentiveRules};

/// The process-wide account table behind one exclusive lock.
///
/// A single instance is created per registry and handed (as an `Arc`) to
/// every node server, since balances are shared across nodes. Callers hold
/// the guard for the whole check-then-mutate step of a credit.
pub struct SharedAccounts {
    table: Mutex<AccountTable>,
    rules: IncentiveRules,
}

impl SharedAccounts {
    pub fn new(table: AccountTable, rules: IncentiveRules) -> Self {
        Self {
            table: Mutex::new(table),
            rules,
        }
    }

    /// Acquire the account lock.
    pub fn lock(&self) -> Result<MutexGuard<'_, AccountTable>, AccountsError> {
        self.table.lock().map_err(|_| AccountsError::LockPoisoned)
    }

    pub fn rules(&self) -> &IncentiveRules {
        &self.rules
    }
}

impl Default for SharedAccounts {
    fn default() -> Self {
        Self::new(AccountTable::with_default_roles(), IncentiveRules::default())
    }
}
