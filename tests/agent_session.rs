//! End-to-end tests: real agent client against an in-process mock agent.
//!
//! The mock accepts one WebSocket connection and answers each JSON-RPC call
//! with the `result` of a fixture, or a method-not-found error.

use std::collections::HashMap;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use heapscope_agent::{rpc, AgentClient, ConnectOptions, ConnectionState};
use heapscope_app::{Console, Dispatcher, NoTerminalPrompt, Outcome};
use heapscope_core::Error;

/// Load a JSON fixture file from tests/fixtures/agent_responses/
fn load_fixture(name: &str) -> Value {
    let path = format!(
        "{}/tests/fixtures/agent_responses/{}.json",
        env!("CARGO_MANIFEST_DIR"),
        name
    );
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e));
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("Bad fixture {}: {}", name, e))
}

fn fixture_result(name: &str) -> Value {
    load_fixture(name)["result"].clone()
}

/// Serve one connection; report every request received on the returned
/// channel.
async fn spawn_mock_agent(
    results: HashMap<&'static str, Value>,
) -> (String, mpsc::UnboundedReceiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        while let Some(Ok(frame)) = ws.next().await {
            let Message::Text(text) = frame else {
                continue;
            };
            let request: Value = serde_json::from_str(text.as_str()).unwrap();
            let method = request["method"].as_str().unwrap_or_default().to_string();

            let reply = match results.get(method.as_str()) {
                Some(result) => json!({ "jsonrpc": "2.0", "id": request["id"], "result": result }),
                None => json!({
                    "jsonrpc": "2.0",
                    "id": request["id"],
                    "error": { "code": -32601, "message": format!("Method not found: {method}") }
                }),
            };
            let _ = seen_tx.send(request);

            if ws.send(Message::text(reply.to_string())).await.is_err() {
                break;
            }
        }
    });

    (format!("ws://{}/heap", addr), seen_rx)
}

fn tokens(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

async fn connect(url: &str) -> AgentClient {
    AgentClient::connect(url, ConnectOptions::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_instances_round_trip() {
    let (url, mut seen) = spawn_mock_agent(HashMap::from([(
        rpc::LIST_LIVE_INSTANCES,
        fixture_result("live_instances"),
    )]))
    .await;
    let client = connect(&url).await;
    let mut dispatcher = Dispatcher::new(client.handle(), NoTerminalPrompt, Console::buffer());

    let outcome = dispatcher
        .dispatch(&tokens("ios heap search instances NSURLSession"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Completed);
    let request = seen.recv().await.unwrap();
    assert_eq!(request["jsonrpc"], "2.0");
    assert_eq!(request["params"], json!(["NSURLSession"]));

    let text = dispatcher.into_console().text();
    assert!(text.contains("0x600001130660"));
    assert!(text.contains("0x600001131a40"));
    client.close().await;
}

#[tokio::test]
async fn test_ivars_and_methods_share_one_connection() {
    let (url, mut seen) = spawn_mock_agent(HashMap::from([
        (rpc::DUMP_IVARS, fixture_result("ivars")),
        (rpc::LIST_METHODS, fixture_result("methods")),
    ]))
    .await;
    let client = connect(&url).await;
    let mut dispatcher = Dispatcher::new(client.handle(), NoTerminalPrompt, Console::buffer());

    dispatcher
        .dispatch(&tokens("ivars 0x7fb9c8c0aa00 --to-utf8"))
        .await
        .unwrap();
    dispatcher
        .dispatch(&tokens("methods 0x7fb9c8c0aa00 --without-arguments"))
        .await
        .unwrap();

    assert_eq!(
        seen.recv().await.unwrap()["params"],
        json!(["0x7fb9c8c0aa00", true])
    );
    assert_eq!(
        seen.recv().await.unwrap()["params"],
        json!(["0x7fb9c8c0aa00"])
    );

    let text = dispatcher.into_console().text();
    assert!(text.contains("<UINavigationController:0x7fb9ca01c400>"));
    assert!(text.contains("'Settings'"));
    assert!(text.contains("- [UIViewController viewDidLoad]"));
    assert!(!text.contains("setTitle:"));
    client.close().await;
}

#[tokio::test]
async fn test_execute_and_inline_evaluate() {
    let (url, mut seen) = spawn_mock_agent(HashMap::from([
        (rpc::INVOKE_METHOD, json!("<UIViewController: 0x1>")),
        (rpc::EVALUATE_SCRIPT, Value::Null),
    ]))
    .await;
    let client = connect(&url).await;
    let mut dispatcher = Dispatcher::new(client.handle(), NoTerminalPrompt, Console::buffer());

    let executed = dispatcher
        .dispatch(&tokens("execute 0x1 description --return-string"))
        .await
        .unwrap();
    let evaluated = dispatcher
        .dispatch(&tokens("evaluate 0xABC --inline a b c"))
        .await
        .unwrap();

    assert_eq!(executed, Outcome::Completed);
    assert_eq!(evaluated, Outcome::Completed);
    assert_eq!(
        seen.recv().await.unwrap()["params"],
        json!(["0x1", "description", true])
    );
    assert_eq!(
        seen.recv().await.unwrap()["params"],
        json!(["0xABC", "abc"])
    );
    assert!(dispatcher
        .into_console()
        .text()
        .contains("'<UIViewController: 0x1>'"));
    client.close().await;
}

#[tokio::test]
async fn test_agent_error_reaches_caller() {
    let (url, _seen) = spawn_mock_agent(HashMap::new()).await;
    let client = connect(&url).await;
    let mut dispatcher = Dispatcher::new(client.handle(), NoTerminalPrompt, Console::buffer());

    let err = dispatcher
        .dispatch(&tokens("methods 0xdeadbeef"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Agent { code: -32601, .. }));
    assert!(err.is_recoverable());
    assert!(client.handle().is_connected());
    client.close().await;
}

#[tokio::test]
async fn test_close_disconnects_handles() {
    let (url, _seen) = spawn_mock_agent(HashMap::new()).await;
    let client = connect(&url).await;
    let handle = client.handle();
    assert_eq!(handle.connection_state(), ConnectionState::Connected);

    client.close().await;

    assert_eq!(handle.connection_state(), ConnectionState::Disconnected);
    let err = handle.request(rpc::LIST_METHODS, None).await.unwrap_err();
    assert!(err.is_remote_fault());
}

#[tokio::test]
async fn test_unreachable_agent_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = AgentClient::connect(&format!("ws://{}/heap", addr), ConnectOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport { .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_http_url_rejected_before_connecting() {
    let err = AgentClient::connect("http://127.0.0.1:1/heap", ConnectOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidAgentUrl { .. }));
}
