//! Incentive rules keyed on a payload's record type.

use serde::{Deserialize, Serialize};

use careledger_types::{payload_action, Payload};

/// Credit `amount` to the identity named by `payload[beneficiary_field]`
/// whenever a block with `payload.action == action` is appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveRule {
    pub action: String,
    pub beneficiary_field: String,
    pub amount: u64,
}

impl IncentiveRule {
    pub fn new(action: &str, beneficiary_field: &str, amount: u64) -> Self {
        Self {
            action: action.to_string(),
            beneficiary_field: beneficiary_field.to_string(),
            amount,
        }
    }
}

/// A credit applied as the result of an incentive rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IncentiveCredit {
    pub beneficiary: String,
    pub amount: u64,
    /// Beneficiary's balance after the credit.
    pub balance: u64,
}

/// The fixed, extensible rule table.
///
/// Record types without a rule (e.g. `medicine_purchase`) earn nothing;
/// this is not an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncentiveRules {
    rules: Vec<IncentiveRule>,
}

impl Default for IncentiveRules {
    fn default() -> Self {
        Self::new(vec![
            IncentiveRule::new("blood_test", "doctor", 10),
            IncentiveRule::new("report", "diagnostic", 5),
            IncentiveRule::new("prescription", "doctor", 5),
        ])
    }
}

impl IncentiveRules {
    pub fn new(rules: Vec<IncentiveRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[IncentiveRule] {
        &self.rules
    }

    pub fn rule_for(&self, action: &str) -> Option<&IncentiveRule> {
        self.rules.iter().find(|r| r.action == action)
    }

    /// Resolve the beneficiary and amount for `payload`, if any rule applies.
    pub fn resolve(&self, payload: &Payload) -> Option<(String, u64)> {
        let rule = self.rule_for(payload_action(payload)?)?;
        let beneficiary = payload.get(&rule.beneficiary_field)?.as_str()?;
        Some((beneficiary.to_string(), rule.amount))
    }
}
