//! WebSocket client for the instrumentation agent.
//!
//! [`AgentClient::connect`] opens the socket and spawns a background task
//! that owns it. Callers talk to the task through a clonable
//! [`AgentHandle`]: each [`AgentHandle::request`] is queued on a bounded
//! command channel, written to the socket with a fresh id, and answered
//! through a oneshot channel once the matching response frame arrives.
//!
//! ```text
//!   AgentHandle::request ──cmd──▶ I/O task ──text frame──▶ agent
//!          ▲                        │
//!          └──────oneshot───────────┘ (CallTracker pairs ids)
//! ```
//!
//! There is no reconnection: once the socket closes every pending and future
//! call fails with [`Error::ChannelClosed`].

use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use heapscope_core::prelude::*;

use crate::protocol::{parse_agent_message, AgentMessage, AgentRequest, CallTracker};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default upper bound on a single agent call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Capacity of the command channel (bounded, to apply backpressure).
const CMD_CHANNEL_CAPACITY: usize = 32;

/// How often the I/O task sweeps for calls the agent never answered.
const EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Connection state shared between the handle and the I/O task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// Options for [`AgentClient::connect`].
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub request_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Messages from handles to the I/O task.
enum ClientCommand {
    Call {
        method: String,
        params: Option<Value>,
        reply_tx: oneshot::Sender<Result<Value>>,
    },
    Close,
}

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

// ---------------------------------------------------------------------------
// AgentHandle
// ---------------------------------------------------------------------------

/// Clonable handle for calling the agent.
///
/// All clones share one socket. Once the client is closed or the socket
/// drops, calls return [`Error::ChannelClosed`].
#[derive(Clone)]
pub struct AgentHandle {
    cmd_tx: mpsc::Sender<ClientCommand>,
    state: Arc<RwLock<ConnectionState>>,
    request_timeout: Duration,
}

impl std::fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentHandle")
            .field("connection_state", &self.connection_state())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl AgentHandle {
    /// Call an agent export and wait for its result.
    ///
    /// # Errors
    ///
    /// - [`Error::ChannelClosed`] if the connection is gone.
    /// - [`Error::Agent`] if the agent answered with a JSON-RPC error.
    /// - [`Error::Timeout`] if no answer arrived within the request timeout.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.cmd_tx
            .send(ClientCommand::Call {
                method: method.to_string(),
                params,
                reply_tx,
            })
            .await
            .map_err(|_| Error::ChannelClosed)?;

        match tokio::time::timeout(self.request_timeout, reply_rx).await {
            Ok(reply) => reply.map_err(|_| Error::ChannelClosed)?,
            Err(_) => Err(Error::timeout(method, duration_ms(self.request_timeout))),
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

// ---------------------------------------------------------------------------
// AgentClient
// ---------------------------------------------------------------------------

/// Owner of the agent connection.
///
/// Construct once at start-up, hand out [`AgentHandle`]s, and call
/// [`AgentClient::close`] on the way out.
#[derive(Debug)]
pub struct AgentClient {
    handle: AgentHandle,
    task: JoinHandle<()>,
}

impl AgentClient {
    /// Connect to the agent at `url` (a `ws://` or `wss://` URL).
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAgentUrl`] if `url` is not a WebSocket URL.
    /// - [`Error::Transport`] if the socket cannot be opened.
    pub async fn connect(url: &str, options: ConnectOptions) -> Result<Self> {
        let url = validate_agent_url(url)?;
        let state = Arc::new(RwLock::new(ConnectionState::Connecting));

        info!("Connecting to agent at {}", url);
        let (ws_stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|err| Error::transport(format!("{url}: {err}")))?;
        set_state(&state, ConnectionState::Connected);

        let (cmd_tx, cmd_rx) = mpsc::channel(CMD_CHANNEL_CAPACITY);
        let task = tokio::spawn(run_io_task(
            ws_stream,
            cmd_rx,
            Arc::clone(&state),
            options.request_timeout,
        ));

        Ok(Self {
            handle: AgentHandle {
                cmd_tx,
                state,
                request_timeout: options.request_timeout,
            },
            task,
        })
    }

    pub fn handle(&self) -> AgentHandle {
        self.handle.clone()
    }

    /// Send a Close frame and wait for the I/O task to finish.
    pub async fn close(self) {
        // The task may already be gone.
        let _ = self.handle.cmd_tx.send(ClientCommand::Close).await;
        if let Err(err) = self.task.await {
            warn!("Agent I/O task ended abnormally: {}", err);
        }
    }
}

/// Check that `url` parses and uses a WebSocket scheme.
pub fn validate_agent_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| Error::invalid_agent_url(url, e.to_string()))?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(parsed),
        other => Err(Error::invalid_agent_url(
            url,
            format!("expected ws:// or wss://, got {other}://"),
        )),
    }
}

// ---------------------------------------------------------------------------
// Background task
// ---------------------------------------------------------------------------

async fn run_io_task(
    ws_stream: WsStream,
    mut cmd_rx: mpsc::Receiver<ClientCommand>,
    state: Arc<RwLock<ConnectionState>>,
    request_timeout: Duration,
) {
    let (mut ws_sink, mut ws_source) = ws_stream.split();
    let mut tracker = CallTracker::new();

    let mut sweep = tokio::time::interval(EXPIRY_SWEEP_INTERVAL);
    sweep.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            frame = ws_source.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        route_frame(text.as_str(), &mut tracker);
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        info!("Agent closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ping/Pong/Binary
                    }
                    Some(Err(err)) => {
                        warn!("Agent socket read error: {}", err);
                        break;
                    }
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ClientCommand::Call { method, params, reply_tx }) => {
                        send_call(&method, params, reply_tx, &mut tracker, &mut ws_sink).await;
                    }
                    Some(ClientCommand::Close) | None => {
                        debug!("Closing agent connection");
                        let _ = ws_sink.send(WsMessage::Close(None)).await;
                        let _ = ws_sink.close().await;
                        break;
                    }
                }
            }

            _ = sweep.tick() => {
                let expired = tracker.expire_older_than(request_timeout);
                if !expired.is_empty() {
                    debug!("Expired {} unanswered agent call(s): {:?}", expired.len(), expired);
                }
            }
        }
    }

    tracker.fail_all();
    set_state(&state, ConnectionState::Disconnected);
    debug!("Agent I/O task exiting");
}

/// Hand a response to its caller, or log whatever else arrived.
fn route_frame(text: &str, tracker: &mut CallTracker) {
    match parse_agent_message(text) {
        AgentMessage::Response(mut response) => match response.id.take() {
            Some(id) => {
                if !tracker.complete(&id, response) {
                    debug!("Agent response for unknown call id {}", id);
                }
            }
            None => debug!("Agent response without id dropped"),
        },
        AgentMessage::Notification(note) => {
            info!(method = %note.method, "agent: {}", note.params);
        }
        AgentMessage::Unknown(raw) => {
            debug!(
                "Ignoring unrecognised agent frame: {}",
                raw.chars().take(120).collect::<String>()
            );
        }
    }
}

/// Register a call and write its request frame.
async fn send_call(
    method: &str,
    params: Option<Value>,
    reply_tx: oneshot::Sender<Result<Value>>,
    tracker: &mut CallTracker,
    ws_sink: &mut SplitSink<WsStream, WsMessage>,
) {
    // Registered before the write so a fast response always finds its slot.
    let id = tracker.register(method, reply_tx);
    let request = AgentRequest::new(id.clone(), method, params);

    let outcome = match serde_json::to_string(&request) {
        Ok(json) => {
            trace!("-> {}", json);
            ws_sink
                .send(WsMessage::Text(json.into()))
                .await
                .map_err(|err| Error::transport(format!("send `{method}`: {err}")))
        }
        Err(err) => Err(Error::protocol(format!("encode `{method}`: {err}"))),
    };

    if let Err(err) = outcome {
        if let Some(reply_tx) = tracker.abandon(&id) {
            let _ = reply_tx.send(Err(err));
        }
    }
}

fn set_state(state: &RwLock<ConnectionState>, next: ConnectionState) {
    *state.write().unwrap_or_else(|e| e.into_inner()) = next;
}

fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis().try_into().unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detached_handle(timeout: Duration) -> (AgentHandle, mpsc::Receiver<ClientCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let handle = AgentHandle {
            cmd_tx,
            state: Arc::new(RwLock::new(ConnectionState::Connected)),
            request_timeout: timeout,
        };
        (handle, cmd_rx)
    }

    #[test]
    fn test_validate_agent_url_accepts_websocket_schemes() {
        assert!(validate_agent_url("ws://127.0.0.1:27042/heap").is_ok());
        assert!(validate_agent_url("wss://device.local/agent").is_ok());
    }

    #[test]
    fn test_validate_agent_url_rejects_other_schemes() {
        let err = validate_agent_url("http://127.0.0.1:27042").unwrap_err();
        assert!(matches!(err, Error::InvalidAgentUrl { .. }));
        assert!(err.to_string().contains("http://"));

        assert!(validate_agent_url("not a url").is_err());
    }

    #[tokio::test]
    async fn test_request_fails_when_task_is_gone() {
        let (handle, cmd_rx) = detached_handle(DEFAULT_REQUEST_TIMEOUT);
        drop(cmd_rx);

        let err = handle.request("iosHeapPrintMethods", None).await.unwrap_err();
        assert!(matches!(err, Error::ChannelClosed));
    }

    #[tokio::test]
    async fn test_request_receives_reply_from_task() {
        let (handle, mut cmd_rx) = detached_handle(DEFAULT_REQUEST_TIMEOUT);

        let responder = tokio::spawn(async move {
            if let Some(ClientCommand::Call {
                method,
                params,
                reply_tx,
            }) = cmd_rx.recv().await
            {
                assert_eq!(method, "iosHeapPrintLiveInstances");
                assert_eq!(params, Some(json!(["NSString"])));
                let _ = reply_tx.send(Ok(json!([])));
            }
        });

        let result = handle
            .request("iosHeapPrintLiveInstances", Some(json!(["NSString"])))
            .await
            .unwrap();
        assert_eq!(result, json!([]));
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn test_request_times_out() {
        let (handle, mut cmd_rx) = detached_handle(Duration::from_millis(20));

        // Keep the command but never answer it.
        let holder = tokio::spawn(async move {
            let cmd = cmd_rx.recv().await;
            tokio::time::sleep(Duration::from_millis(200)).await;
            drop(cmd);
        });

        let err = handle.request("iosHeapExecMethod", None).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { timeout_ms: 20, .. }));
        holder.await.unwrap();
    }

    #[test]
    fn test_handle_debug_shows_state() {
        let (handle, _rx) = detached_handle(DEFAULT_REQUEST_TIMEOUT);
        let debug_str = format!("{:?}", handle);
        assert!(debug_str.contains("AgentHandle"));
        assert!(debug_str.contains("Connected"));
    }

    #[test]
    fn test_handle_clone_shares_state() {
        let (handle, _rx) = detached_handle(DEFAULT_REQUEST_TIMEOUT);
        let cloned = handle.clone();

        set_state(&handle.state, ConnectionState::Disconnected);
        assert!(!handle.is_connected());
        assert!(!cloned.is_connected());
    }

    #[test]
    fn test_handle_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AgentHandle>();
    }

    #[test]
    fn test_route_frame_completes_pending_call() {
        let mut tracker = CallTracker::new();
        let (tx, mut rx) = oneshot::channel();
        let id = tracker.register("iosHeapPrintIvars", tx);

        let frame = format!(r#"{{"jsonrpc":"2.0","id":"{id}","result":["Foo",{{}}]}}"#);
        route_frame(&frame, &mut tracker);

        assert_eq!(tracker.pending_count(), 0);
        assert_eq!(rx.try_recv().unwrap().unwrap(), json!(["Foo", {}]));
    }

    #[test]
    fn test_route_frame_ignores_notifications() {
        let mut tracker = CallTracker::new();
        tracker.register("m", oneshot::channel().0);

        route_frame(
            r#"{"jsonrpc":"2.0","method":"console","params":{"message":"hi"}}"#,
            &mut tracker,
        );
        assert_eq!(tracker.pending_count(), 1);
    }
}
