//! DRC server - line-delimited JSON-RPC over stdin/stdout
//!
//! # Module Structure
//! - `protocol` - JSON-RPC request/response types
//! - `state` - Server state management
//! - `handlers` - Request handlers organized by functionality

pub mod handlers;
pub mod protocol;
pub mod state;

pub use handlers::dispatch;
pub use protocol::{error_codes, ErrorResponse, Notification, Request, Response};
pub use state::{DrcAsyncResult, ServerEvent, ServerState};
