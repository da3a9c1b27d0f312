//! Account table shared by every node in a registry.
//!
//! Maps an identity to its password and an optional incentive balance.
//! Roles without a balance never accrue incentive. Balances only change
//! through [`AccountTable::apply_incentive`], driven by the record type of
//! an appended block and the [`IncentiveRules`] table.

pub mod error;
pub mod incentives;
pub mod shared;
pub mod table;

pub use error::AccountsError;
pub use incentives::{IncentiveCredit, IncentiveRule, IncentiveRules};
pub use shared::SharedAccounts;
pub use table::{AccountRecord, AccountTable};
