//! Wire request and response shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use careledger_types::{Block, Payload};

use crate::RpcError;

/// A decoded request, discriminated by its `action` field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    Login { username: String, password: String },
    AddBlock { data: Payload },
    GetChain,
    GetBalance { user: String },
}

impl Request {
    /// Every action a node understands.
    pub const ACTIONS: [&'static str; 4] = ["login", "add_block", "get_chain", "get_balance"];

    pub fn action(&self) -> &'static str {
        match self {
            Request::Login { .. } => "login",
            Request::AddBlock { .. } => "add_block",
            Request::GetChain => "get_chain",
            Request::GetBalance { .. } => "get_balance",
        }
    }
}

/// A response, discriminated by its `status` field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Success {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chain: Option<Vec<Block>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        balance: Option<u64>,
    },
    /// An expected business condition, e.g. bad credentials.
    Failure { message: String },
    /// A malformed request or an internal fault.
    Error { message: String },
}

impl Response {
    pub fn success_message(message: impl Into<String>) -> Self {
        Response::Success {
            message: Some(message.into()),
            index: None,
            chain: None,
            balance: None,
        }
    }

    pub fn appended(message: impl Into<String>, index: u64) -> Self {
        Response::Success {
            message: Some(message.into()),
            index: Some(index),
            chain: None,
            balance: None,
        }
    }

    pub fn chain(chain: Vec<Block>) -> Self {
        Response::Success {
            message: None,
            index: None,
            chain: Some(chain),
            balance: None,
        }
    }

    pub fn balance(balance: u64) -> Self {
        Response::Success {
            message: None,
            index: None,
            chain: None,
            balance: Some(balance),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Response::Failure {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Response::Success { .. } => "success",
            Response::Failure { .. } => "failure",
            Response::Error { .. } => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }
}

/// Decode raw request bytes, classifying every problem as a validation error.
pub fn parse_request(raw: &[u8]) -> Result<Request, RpcError> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| RpcError::InvalidRequest(format!("malformed JSON: {e}")))?;

    let action = match value.as_object() {
        Some(obj) => obj.get("action"),
        None => {
            return Err(RpcError::InvalidRequest(
                "request must be a JSON object".into(),
            ))
        }
    };
    match action {
        None => return Err(RpcError::InvalidRequest("missing action".into())),
        Some(Value::String(a)) if !Request::ACTIONS.contains(&a.as_str()) => {
            return Err(RpcError::InvalidRequest(format!("unknown action: {a}")))
        }
        Some(Value::String(_)) => {}
        Some(_) => return Err(RpcError::InvalidRequest("action must be a string".into())),
    }

    serde_json::from_value(value).map_err(|e| RpcError::InvalidRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invalid_message(raw: &str) -> String {
        match parse_request(raw.as_bytes()) {
            Err(RpcError::InvalidRequest(msg)) => msg,
            other => panic!("expected invalid request, got {other:?}"),
        }
    }

    #[test]
    fn parses_every_request_shape() {
        assert_eq!(
            parse_request(br#"{"action":"login","username":"doctor","password":"doc123"}"#)
                .unwrap(),
            Request::Login {
                username: "doctor".into(),
                password: "doc123".into()
            }
        );
        assert_eq!(
            parse_request(br#"{"action":"get_chain"}"#).unwrap(),
            Request::GetChain
        );
        assert_eq!(
            parse_request(br#"{"action":"get_balance","user":"doctor"}"#).unwrap(),
            Request::GetBalance {
                user: "doctor".into()
            }
        );
        match parse_request(br#"{"action":"add_block","data":{"action":"report","diagnostic":"diagnostic"}}"#).unwrap() {
            Request::AddBlock { data } => assert_eq!(data["diagnostic"], json!("diagnostic")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn classifies_malformed_requests() {
        assert!(invalid_message("{nope").contains("malformed JSON"));
        assert!(invalid_message("[1,2]").contains("JSON object"));
        assert_eq!(invalid_message(r#"{"username":"doctor"}"#), "missing action");
        assert_eq!(invalid_message(r#"{"action":"mine"}"#), "unknown action: mine");
        assert_eq!(invalid_message(r#"{"action":7}"#), "action must be a string");
        assert!(invalid_message(r#"{"action":"get_balance"}"#).contains("user"));
        assert!(!invalid_message(r#"{"action":"add_block","data":"text"}"#).is_empty());
    }

    #[test]
    fn response_wire_shapes() {
        assert_eq!(
            serde_json::to_value(Response::appended("ok", 3)).unwrap(),
            json!({"status": "success", "message": "ok", "index": 3})
        );
        assert_eq!(
            serde_json::to_value(Response::balance(10)).unwrap(),
            json!({"status": "success", "balance": 10})
        );
        assert_eq!(
            serde_json::to_value(Response::failure("Invalid credentials.")).unwrap(),
            json!({"status": "failure", "message": "Invalid credentials."})
        );
        assert_eq!(
            serde_json::to_value(Response::error("missing action")).unwrap(),
            json!({"status": "error", "message": "missing action"})
        );
    }

    #[test]
    fn response_decodes_from_wire() {
        let decoded: Response =
            serde_json::from_str(r#"{"status":"success","balance":15}"#).unwrap();
        assert_eq!(decoded, Response::balance(15));
        let decoded: Response =
            serde_json::from_str(r#"{"status":"failure","message":"nope"}"#).unwrap();
        assert_eq!(decoded.status(), "failure");
    }

    #[test]
    fn request_encodes_with_action_tag() {
        let value = serde_json::to_value(Request::GetBalance {
            user: "doctor".into(),
        })
        .unwrap();
        assert_eq!(value, json!({"action": "get_balance", "user": "doctor"}));
        assert_eq!(
            serde_json::to_value(Request::GetChain).unwrap(),
            json!({"action": "get_chain"})
        );
    }
}
