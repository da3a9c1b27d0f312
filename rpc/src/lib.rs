//! Request protocol for careledger nodes.
//!
//! One JSON object request per connection, one JSON object response:
//! - `login`: check credentials against the shared account table
//! - `add_block`: append a record to the node's chain and apply incentives
//! - `get_chain`: return the node's full chain
//! - `get_balance`: read an identity's incentive balance

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod framing;
pub mod protocol;

pub use client::{send_raw, send_request};
pub use dispatcher::{Dispatched, Dispatcher};
pub use error::{ClientError, RpcError};
pub use framing::{read_message, write_message, FrameError, DEFAULT_MAX_MESSAGE_SIZE};
pub use protocol::{parse_request, Request, Response};
