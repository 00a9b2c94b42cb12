//! JSON-RPC 2.0 framing for the instrumentation agent's WebSocket endpoint.
//!
//! The agent answers requests with `{id, result}` or `{id, error}` frames and
//! may push notifications (`{method, params}` without an id), e.g. console
//! output produced by an evaluated script. This module defines those frames,
//! the message classifier, and the tracker that pairs responses with the
//! callers waiting on them.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use heapscope_core::prelude::*;

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 request sent to the agent.
#[derive(Debug, Serialize)]
pub struct AgentRequest {
    /// Always `"2.0"`.
    pub jsonrpc: &'static str,
    pub id: String,
    /// RPC export name, e.g. `"iosHeapPrintIvars"`.
    pub method: String,
    /// Positional arguments of the export.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl AgentRequest {
    pub fn new(id: String, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 response from the agent.
#[derive(Debug, Deserialize)]
pub struct AgentResponse {
    /// Echo of the request id. Agents may echo it as a number.
    #[serde(default, deserialize_with = "id_as_string")]
    pub id: Option<String>,
    pub result: Option<Value>,
    pub error: Option<AgentRpcError>,
}

impl AgentResponse {
    /// Collapse the response into the call's outcome.
    ///
    /// A `null` result is valid (void exports such as script evaluation).
    pub fn into_result(self) -> Result<Value> {
        match (self.error, self.result) {
            (Some(err), _) => Err(Error::agent(err.code, err.message)),
            (None, Some(result)) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Deserialize)]
pub struct AgentRpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

/// Unsolicited message pushed by the agent.
#[derive(Debug, Deserialize)]
pub struct AgentNotification {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

fn id_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

// ---------------------------------------------------------------------------
// Parsed message discriminant
// ---------------------------------------------------------------------------

/// The result of classifying a raw WebSocket text frame.
#[derive(Debug)]
pub enum AgentMessage {
    Response(AgentResponse),
    Notification(AgentNotification),
    /// Anything we could not interpret.
    Unknown(String),
}

/// Classify a raw text frame.
///
/// A non-null `"id"` makes a response; otherwise a `"method"` makes a
/// notification; anything else is [`AgentMessage::Unknown`].
pub fn parse_agent_message(text: &str) -> AgentMessage {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return AgentMessage::Unknown(text.to_string()),
    };

    let has_id = value.get("id").is_some_and(|v| !v.is_null());
    let has_method = value.get("method").is_some();

    let parsed = if has_id {
        serde_json::from_value(value).map(AgentMessage::Response)
    } else if has_method {
        serde_json::from_value(value).map(AgentMessage::Notification)
    } else {
        return AgentMessage::Unknown(text.to_string());
    };

    parsed.unwrap_or_else(|_| AgentMessage::Unknown(text.to_string()))
}

// ---------------------------------------------------------------------------
// Request tracker
// ---------------------------------------------------------------------------

/// A caller waiting for its response.
struct PendingCall {
    method: String,
    reply_tx: oneshot::Sender<Result<Value>>,
    sent_at: Instant,
}

/// Pairs in-flight requests with their responses.
///
/// Owned by the I/O task; each call gets a fresh numeric id and a oneshot
/// channel that receives the call's outcome.
pub struct CallTracker {
    next_id: u64,
    pending: HashMap<String, PendingCall>,
}

impl CallTracker {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            pending: HashMap::new(),
        }
    }

    /// Allocate an id for `method` and park `reply_tx` under it.
    pub fn register(
        &mut self,
        method: impl Into<String>,
        reply_tx: oneshot::Sender<Result<Value>>,
    ) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;

        self.pending.insert(
            id.clone(),
            PendingCall {
                method: method.into(),
                reply_tx,
                sent_at: Instant::now(),
            },
        );
        id
    }

    /// Forget a call whose request never made it onto the wire.
    pub fn abandon(&mut self, id: &str) -> Option<oneshot::Sender<Result<Value>>> {
        self.pending.remove(id).map(|call| call.reply_tx)
    }

    /// Deliver a response. Returns `false` when no caller is waiting on `id`.
    pub fn complete(&mut self, id: &str, response: AgentResponse) -> bool {
        match self.pending.remove(id) {
            Some(call) => {
                // The caller may have given up already.
                let _ = call.reply_tx.send(response.into_result());
                true
            }
            None => false,
        }
    }

    /// Fail every call pending for longer than `timeout`.
    ///
    /// Returns the ids that were expired.
    pub fn expire_older_than(&mut self, timeout: Duration) -> Vec<String> {
        let now = Instant::now();
        let stale: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, call)| now.duration_since(call.sent_at) >= timeout)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            if let Some(call) = self.pending.remove(id) {
                let timeout_ms = timeout.as_millis().try_into().unwrap_or(u64::MAX);
                let _ = call.reply_tx.send(Err(Error::timeout(call.method, timeout_ms)));
            }
        }
        stale
    }

    /// Fail every pending call; used when the connection goes away.
    pub fn fail_all(&mut self) {
        for (_, call) in self.pending.drain() {
            let _ = call.reply_tx.send(Err(Error::ChannelClosed));
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for CallTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
