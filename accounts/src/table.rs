//! Identity → credentials and balance.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use careledger_types::Payload;

use crate::incentives::{IncentiveCredit, IncentiveRules};

/// Credentials and optional incentive balance of one identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub password: String,
    /// `None` for roles that never earn incentive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<u64>,
}

impl AccountRecord {
    /// An identity that earns incentive, starting from `balance`.
    pub fn earning(password: impl Into<String>, balance: u64) -> Self {
        Self {
            password: password.into(),
            balance: Some(balance),
        }
    }

    /// An identity that can log in but never earns incentive.
    pub fn login_only(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            balance: None,
        }
    }
}

/// The account table itself. Not synchronized; see [`crate::SharedAccounts`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountTable {
    accounts: BTreeMap<String, AccountRecord>,
}

impl AccountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The static role table every registry starts from unless configured
    /// otherwise.
    pub fn with_default_roles() -> Self {
        let mut table = Self::new();
        table.insert("doctor", AccountRecord::earning("doc123", 0));
        table.insert("diagnostic", AccountRecord::earning("diag123", 0));
        table.insert("pharmacy", AccountRecord::earning("pharm123", 0));
        table.insert("hospital", AccountRecord::login_only("hosp123"));
        table.insert("patient1", AccountRecord::login_only("pat123"));
        table
    }

    pub fn insert(&mut self, identity: impl Into<String>, record: AccountRecord) {
        self.accounts.insert(identity.into(), record);
    }

    /// Exact password match. Unknown identities simply fail.
    pub fn authenticate(&self, identity: &str, password: &str) -> bool {
        self.accounts
            .get(identity)
            .is_some_and(|record| record.password == password)
    }

    /// Add `amount` to `identity`'s balance.
    ///
    /// Returns the new balance, or `None` (without error) if the identity is
    /// unknown or has no balance field. Never introduces a balance field.
    pub fn credit(&mut self, identity: &str, amount: u64) -> Option<u64> {
        let balance = self.accounts.get_mut(identity)?.balance.as_mut()?;
        *balance = balance.saturating_add(amount);
        Some(*balance)
    }

    /// The balance of `identity`, if it exists and carries one.
    pub fn get_balance(&self, identity: &str) -> Option<u64> {
        self.accounts.get(identity)?.balance
    }

    pub fn get(&self, identity: &str) -> Option<&AccountRecord> {
        self.accounts.get(identity)
    }

    /// Apply the incentive rule matching `payload`'s record type.
    ///
    /// Returns the credit that was applied, or `None` when no rule matches,
    /// the beneficiary field is absent, or the beneficiary earns nothing.
    pub fn apply_incentive(
        &mut self,
        rules: &IncentiveRules,
        payload: &Payload,
    ) -> Option<IncentiveCredit> {
        let (beneficiary, amount) = rules.resolve(payload)?;
        let balance = self.credit(&beneficiary, amount)?;
        Some(IncentiveCredit {
            beneficiary,
            amount,
            balance,
        })
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }
}
