//! Integration tests for multi-endpoint JSON-RPC fallback
//!
//! Each endpoint is a separate mock server so that the number of requests it received
//! can be asserted independently.

use price_guard::rpc_client::{EndpointFailure, FailureSink, ResilientRpcClient, RpcError, RpcRequest};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_millis(500);

async fn endpoint(template: ResponseTemplate, expected_requests: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(template)
        .expect(expected_requests)
        .mount(&server)
        .await;
    server
}

fn result(value: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": value }))
}

#[derive(Default)]
struct RecordingSink {
    failures: Mutex<Vec<(String, &'static str)>>,
}

impl FailureSink for RecordingSink {
    fn report(&self, endpoint: &str, _request: &RpcRequest, failure: &EndpointFailure) {
        self.failures
            .lock()
            .unwrap()
            .push((endpoint.to_string(), failure.reason()));
    }
}

/// The third endpoint answers; the fourth must never be contacted
#[tokio::test]
async fn test_falls_back_in_order_and_stops_at_first_success() {
    let failing = endpoint(ResponseTemplate::new(500).set_body_string("boom"), 1).await;
    let no_result = endpoint(
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "header not found" }
        })),
        1,
    )
    .await;
    let healthy = endpoint(result(json!("0x75bcd15")), 1).await;
    let never = endpoint(result(json!("0x0")), 0).await;

    let sink = Arc::new(RecordingSink::default());
    let client = ResilientRpcClient::new().with_failure_sink(sink.clone());
    let endpoints = vec![failing.uri(), no_result.uri(), healthy.uri(), never.uri()];
    let request = client.request("eth_blockNumber", vec![]);

    let value = client.send(&request, &endpoints, TIMEOUT).await.unwrap();
    assert_eq!(value, json!("0x75bcd15"));

    let failures = sink.failures.lock().unwrap().clone();
    assert_eq!(
        failures,
        vec![
            (failing.uri(), "http_status"),
            (no_result.uri(), "missing_result"),
        ],
        "Every discarded attempt should reach the sink, in order"
    );
}

#[tokio::test]
async fn test_slow_endpoint_times_out_and_next_one_answers() {
    let slow = endpoint(result(json!("0x1")).set_delay(Duration::from_secs(2)), 1).await;
    let fast = endpoint(result(json!("0x2")), 1).await;

    let sink = Arc::new(RecordingSink::default());
    let client = ResilientRpcClient::new().with_failure_sink(sink.clone());
    let request = client.request("eth_blockNumber", vec![]);

    let value = client
        .send(&request, &[slow.uri(), fast.uri()], Duration::from_millis(200))
        .await
        .unwrap();
    assert_eq!(value, json!("0x2"));
    assert_eq!(sink.failures.lock().unwrap()[0].1, "timeout");
}

#[tokio::test]
async fn test_all_endpoints_failed_lists_every_attempt() {
    let a = endpoint(ResponseTemplate::new(503), 1).await;
    let b = endpoint(ResponseTemplate::new(200).set_body_string("not json"), 1).await;

    let client = ResilientRpcClient::new();
    let endpoints = vec![a.uri(), b.uri(), "ftp://nowhere".to_string()];
    let request = client.request("eth_call", vec![]);

    let err = client.send(&request, &endpoints, TIMEOUT).await.unwrap_err();
    assert_eq!(
        err,
        RpcError::AllEndpointsFailed {
            method: "eth_call".to_string(),
            endpoints,
        }
    );
    assert!(err.to_string().contains("3 endpoints"));
}

#[tokio::test]
async fn test_null_result_is_returned_not_skipped() {
    let null = endpoint(result(Value::Null), 1).await;
    let never = endpoint(result(json!("0x1")), 0).await;

    let client = ResilientRpcClient::new();
    let request = client.request("eth_getBlockByNumber", vec![json!("0x1"), json!(false)]);
    let value = client
        .send(&request, &[null.uri(), never.uri()], TIMEOUT)
        .await
        .unwrap();
    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn test_request_body_is_json_rpc_2() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "jsonrpc": "2.0",
            "method": "eth_call",
            "params": [{ "to": "0x0000000000000000000000000000000000000001", "data": "0x" }, "latest"]
        })))
        .respond_with(result(json!("0x")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ResilientRpcClient::new();
    let request = client.request(
        "eth_call",
        vec![
            json!({ "to": "0x0000000000000000000000000000000000000001", "data": "0x" }),
            json!("latest"),
        ],
    );
    client.send(&request, &[server.uri()], TIMEOUT).await.unwrap();
}

/// Single-connection WebSocket node. `reply` receives the request id and returns the
/// frames to send back, in order; the connection is closed afterwards.
async fn ws_node<F>(reply: F) -> String
where
    F: FnOnce(u64) -> Vec<Message> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        let request = loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => break serde_json::from_str::<Value>(&text).unwrap(),
                Some(Ok(_)) => continue,
                _ => return,
            }
        };
        let id = request["id"].as_u64().unwrap();
        for frame in reply(id) {
            if ws.send(frame).await.is_err() {
                return;
            }
        }
        let _ = ws.close(None).await;
    });

    format!("ws://{}", addr)
}

#[tokio::test]
async fn test_ws_endpoint_skips_frames_with_other_ids() {
    let endpoint = ws_node(|id| {
        vec![
            Message::Text(json!({ "jsonrpc": "2.0", "id": id + 1000, "result": "0xdead" }).to_string()),
            Message::Binary(
                json!({ "jsonrpc": "2.0", "id": id, "result": "0x75bcd15" })
                    .to_string()
                    .into_bytes(),
            ),
        ]
    })
    .await;

    let client = ResilientRpcClient::new();
    let request = client.request("eth_blockNumber", vec![]);
    let value = client.send(&request, &[endpoint], TIMEOUT).await.unwrap();
    assert_eq!(value, json!("0x75bcd15"), "Only the frame carrying the request id counts");
}

#[tokio::test]
async fn test_ws_close_without_response_falls_back_to_http() {
    let closing = ws_node(|_| vec![]).await;
    let healthy = endpoint(result(json!("0x2a")), 1).await;

    let sink = Arc::new(RecordingSink::default());
    let client = ResilientRpcClient::new().with_failure_sink(sink.clone());
    let request = client.request("eth_blockNumber", vec![]);

    let value = client
        .send(&request, &[closing.clone(), healthy.uri()], TIMEOUT)
        .await
        .unwrap();
    assert_eq!(value, json!("0x2a"));
    assert_eq!(
        sink.failures.lock().unwrap().clone(),
        vec![(closing, "transport")],
        "A socket closed before answering is a transport failure"
    );
}
