//! # heapscope-agent - Instrumentation Agent Connection
//!
//! Talks to the instrumentation agent injected into the target process:
//! JSON-RPC 2.0 over a WebSocket, one background task owning the socket,
//! and a typed view of the agent's heap exports.
//!
//! Depends on [`heapscope_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Connection
//! - [`AgentClient`] - Owns the socket; construct at start-up, close at exit
//! - [`AgentHandle`] - Clonable handle for issuing calls
//! - [`ConnectOptions`] - Request timeout and other connection knobs
//!
//! ### Heap exports
//! - [`HeapAgent`] - The RPC surface consumed by the command handlers
//! - [`rpc`] - Export names
//!
//! ### Protocol
//! - [`parse_agent_message()`] - Classify a raw text frame
//! - [`CallTracker`] - Pair responses with waiting callers

pub mod client;
pub mod heap;
pub mod protocol;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use client::{
    validate_agent_url, AgentClient, AgentHandle, ConnectOptions, ConnectionState,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use heap::{decode, rpc, HeapAgent, LocalHeapAgent};
pub use protocol::{
    parse_agent_message, AgentMessage, AgentNotification, AgentRequest, AgentResponse,
    AgentRpcError, CallTracker,
};
