//! Routes decoded requests to the ledger and the account table.
//!
//! Locking discipline:
//! - the node's ledger sits behind its own `RwLock`; appends take it
//!   exclusively, chain reads take it shared
//! - the account table is one `Mutex` shared by every node of a registry
//! - the two locks are never held together: `add_block` releases the ledger
//!   lock before taking the account lock for the incentive step
//! - no lock is ever held across network I/O

use std::sync::{Arc, RwLock};

use careledger_accounts::SharedAccounts;
use careledger_ledger::{Ledger, LedgerSummary};
use careledger_types::{payload_action, NodeId, Payload};
use tracing::{debug, info, warn};

use crate::protocol::{parse_request, Request, Response};
use crate::RpcError;

/// Outcome of dispatching one raw request.
#[derive(Debug)]
pub struct Dispatched {
    /// The request's action, if the request could be decoded.
    pub action: Option<&'static str>,
    pub response: Response,
}

/// Per-node request dispatcher.
pub struct Dispatcher {
    node_id: NodeId,
    ledger: RwLock<Ledger>,
    accounts: Arc<SharedAccounts>,
}

impl Dispatcher {
    pub fn new(ledger: Ledger, accounts: Arc<SharedAccounts>) -> Self {
        Self {
            node_id: ledger.node_id().clone(),
            ledger: RwLock::new(ledger),
            accounts,
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn accounts(&self) -> &Arc<SharedAccounts> {
        &self.accounts
    }

    /// Decode, route and answer one raw request. Never fails: every error
    /// is converted to a `failure` or `error` response here.
    pub fn dispatch(&self, raw: &[u8]) -> Dispatched {
        let request = match parse_request(raw) {
            Ok(request) => request,
            Err(e) => {
                warn!(node = %self.node_id, "rejected request: {e}");
                return Dispatched {
                    action: None,
                    response: e.into_response(),
                };
            }
        };

        let action = request.action();
        let response = match self.handle(request) {
            Ok(response) => response,
            Err(e) if e.is_failure() => {
                debug!(node = %self.node_id, action, "request failed: {e}");
                e.into_response()
            }
            Err(e) => {
                warn!(node = %self.node_id, action, "request error: {e}");
                e.into_response()
            }
        };
        Dispatched {
            action: Some(action),
            response,
        }
    }

    /// Route an already-decoded request.
    pub fn handle(&self, request: Request) -> Result<Response, RpcError> {
        match request {
            Request::Login { username, password } => self.login(&username, &password),
            Request::AddBlock { data } => self.add_block(data),
            Request::GetChain => self.get_chain(),
            Request::GetBalance { user } => self.get_balance(&user),
        }
    }

    fn login(&self, username: &str, password: &str) -> Result<Response, RpcError> {
        let authenticated = self.accounts.lock()?.authenticate(username, password);
        if authenticated {
            info!(node = %self.node_id, user = username, "login succeeded");
            Ok(Response::success_message(format!(
                "{username} logged in successfully."
            )))
        } else {
            Err(RpcError::Failure(login_failure_message(username).into()))
        }
    }

    fn add_block(&self, data: Payload) -> Result<Response, RpcError> {
        if payload_action(&data).is_none() {
            return Err(RpcError::InvalidRequest(
                "data.action must be a string".into(),
            ));
        }

        let block = {
            let mut ledger = self
                .ledger
                .write()
                .map_err(|_| RpcError::LockPoisoned("ledger"))?;
            ledger.append(data)?
        };

        let credit = {
            let mut table = self.accounts.lock()?;
            table.apply_incentive(self.accounts.rules(), &block.payload)
        };
        if let Some(credit) = credit {
            info!(
                node = %self.node_id,
                beneficiary = %credit.beneficiary,
                amount = credit.amount,
                balance = credit.balance,
                "incentive credited"
            );
        }

        Ok(Response::appended(
            format!("Block added by {} with index {}.", self.node_id, block.index),
            block.index,
        ))
    }

    fn get_chain(&self) -> Result<Response, RpcError> {
        let chain = self
            .ledger
            .read()
            .map_err(|_| RpcError::LockPoisoned("ledger"))?
            .snapshot();
        Ok(Response::chain(chain))
    }

    fn get_balance(&self, user: &str) -> Result<Response, RpcError> {
        match self.accounts.lock()?.get_balance(user) {
            Some(balance) => Ok(Response::balance(balance)),
            None => Err(RpcError::Failure(
                "User not found or no balance attribute.".into(),
            )),
        }
    }

    /// Current ledger summary, for metrics and logs.
    pub fn summary(&self) -> Result<LedgerSummary, RpcError> {
        Ok(self
            .ledger
            .read()
            .map_err(|_| RpcError::LockPoisoned("ledger"))?
            .summary())
    }
}

/// Patient identities get their own wording on a failed login.
fn login_failure_message(username: &str) -> &'static str {
    if username.starts_with("patient") {
        "Invalid patient ID or password."
    } else {
        "Invalid credentials."
    }
}
