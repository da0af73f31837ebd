//! Integration tests for the client session: correlation, timeouts,
//! cancellation, subscriptions, and the connection lifecycle.
//!
//! Each test spins up an in-process mock gateway (a real WebSocket server)
//! and drives the public client API against it over an actual socket.

use std::future::Future;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use nekolink::prelude::*;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

// =========================================================================
// Mock gateway helpers
// =========================================================================

/// Binds a listener on a random port.
///
/// Also installs the tracing subscriber (once) so `RUST_LOG=nekolink=trace`
/// makes a failing test narrate itself.
async fn bind_gateway() -> (String, TcpListener) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr").to_string();
    (addr, listener)
}

/// Accepts exactly one WebSocket connection.
async fn accept_one(listener: &TcpListener) -> ServerWs {
    let (stream, _) = listener.accept().await.expect("accept");
    tokio_tungstenite::accept_async(stream).await.expect("ws accept")
}

/// Builds a client pointed at the mock gateway.
fn client_for(addr: &str) -> NekoClient<WebSocketConnector> {
    NekoClient::builder().url(format!("ws://{addr}")).build()
}

/// Reads the next text frame and parses it as a call frame.
async fn read_request(ws: &mut ServerWs) -> Value {
    loop {
        let msg = ws.next().await.expect("frame").expect("read");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("request json");
        }
    }
}

/// A successful response envelope for the given echo.
fn ok_response(echo: &str, data: Value) -> String {
    json!({"status": "ok", "retcode": 0, "data": data, "echo": echo}).to_string()
}

async fn send_text(ws: &mut ServerWs, text: String) {
    ws.send(Message::Text(text.into())).await.expect("send");
}

/// Bounds a future so a broken test fails instead of hanging.
async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("test step timed out")
}

// =========================================================================
// Call correlation
// =========================================================================

#[tokio::test]
async fn test_call_resolves_with_matching_response() {
    let (addr, listener) = bind_gateway().await;
    let gateway = tokio::spawn(async move {
        let mut ws = accept_one(&listener).await;
        let request = read_request(&mut ws).await;
        assert_eq!(request["action"], "get_status");
        let echo = request["echo"].as_str().expect("echo").to_string();
        send_text(&mut ws, ok_response(&echo, json!({"online": true}))).await;
        ws
    });

    let client = client_for(&addr);
    within(client.connect()).await.expect("connect");

    let response = within(client.send_raw("get_status", json!({})))
        .await
        .expect("call should resolve");
    assert!(response.is_ok());
    assert_eq!(response.data.unwrap()["online"], true);

    let _ws = gateway.await.unwrap();
}

#[tokio::test]
async fn test_concurrent_calls_resolve_out_of_order() {
    let (addr, listener) = bind_gateway().await;
    let gateway = tokio::spawn(async move {
        let mut ws = accept_one(&listener).await;
        // Wait until both calls are on the wire, then answer the second
        // one first.
        let _first = read_request(&mut ws).await;
        let _second = read_request(&mut ws).await;
        send_text(&mut ws, ok_response("call-two", json!({"n": 2}))).await;
        send_text(&mut ws, ok_response("call-one", json!({"n": 1}))).await;
        ws
    });

    let client = client_for(&addr);
    within(client.connect()).await.expect("connect");

    let one = client.send_raw_with(
        "first_action",
        json!({}),
        CallOptions::new().echo("call-one"),
    );
    let two = client.send_raw_with(
        "second_action",
        json!({}),
        CallOptions::new().echo("call-two"),
    );
    let (one, two) = within(async { tokio::join!(one, two) }).await;

    // Each caller got its own payload, not the other's.
    assert_eq!(one.unwrap().data.unwrap()["n"], 1);
    assert_eq!(two.unwrap().data.unwrap()["n"], 2);

    let _ws = gateway.await.unwrap();
}

#[tokio::test]
async fn test_timeout_releases_token_for_reuse() {
    let (addr, listener) = bind_gateway().await;
    let gateway = tokio::spawn(async move {
        let mut ws = accept_one(&listener).await;
        // Never answer the first request; answer the second.
        let _starved = read_request(&mut ws).await;
        let retry = read_request(&mut ws).await;
        assert_eq!(retry["echo"], "reused");
        send_text(&mut ws, ok_response("reused", json!({"try": 2}))).await;
        ws
    });

    let client = client_for(&addr);
    within(client.connect()).await.expect("connect");

    let starved = within(client.send_raw_with(
        "slow_action",
        json!({}),
        CallOptions::new()
            .echo("reused")
            .timeout(Duration::from_millis(100)),
    ))
    .await;
    assert!(matches!(starved, Err(ClientError::Timeout(e)) if e == "reused"));

    // The token was released on timeout, so the same echo registers again.
    let retry = within(client.send_raw_with(
        "slow_action",
        json!({}),
        CallOptions::new().echo("reused"),
    ))
    .await
    .expect("second call should resolve");
    assert_eq!(retry.data.unwrap()["try"], 2);

    let _ws = gateway.await.unwrap();
}

#[tokio::test]
async fn test_cancel_fails_one_call_without_touching_another() {
    let (addr, listener) = bind_gateway().await;
    let gateway = tokio::spawn(async move {
        let mut ws = accept_one(&listener).await;
        let _a = read_request(&mut ws).await;
        let _b = read_request(&mut ws).await;
        // Only the unrelated call gets an answer.
        send_text(&mut ws, ok_response("kept", json!({"ok": true}))).await;
        ws
    });

    let client = client_for(&addr);
    within(client.connect()).await.expect("connect");

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let doomed = client.send_raw_with(
        "doomed_action",
        json!({}),
        CallOptions::new().echo("doomed").cancel(token),
    );
    let kept = client.send_raw_with("kept_action", json!({}), CallOptions::new().echo("kept"));
    let (doomed, kept) = within(async { tokio::join!(doomed, kept) }).await;

    assert!(matches!(doomed, Err(ClientError::Cancelled(e)) if e == "doomed"));
    assert!(kept.expect("unrelated call unaffected").is_ok());

    let _ws = gateway.await.unwrap();
}

#[tokio::test]
async fn test_duplicate_echo_rejected_before_send() {
    let (addr, listener) = bind_gateway().await;
    let gateway = tokio::spawn(async move {
        let mut ws = accept_one(&listener).await;
        let first = read_request(&mut ws).await;
        assert_eq!(first["echo"], "dup");
        // Answer late so the first call is still pending when the second
        // one collides.
        tokio::time::sleep(Duration::from_millis(300)).await;
        send_text(&mut ws, ok_response("dup", json!({}))).await;
        // Exactly one request ever arrives: the colliding call failed
        // before reaching the wire.
        ws
    });

    let client = client_for(&addr);
    within(client.connect()).await.expect("connect");

    let background = client.clone();
    let pending = tokio::spawn(async move {
        background
            .send_raw_with("held_action", json!({}), CallOptions::new().echo("dup"))
            .await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let collision = within(client.send_raw_with(
        "held_action",
        json!({}),
        CallOptions::new().echo("dup"),
    ))
    .await;
    assert!(matches!(
        collision,
        Err(ClientError::Call(CallError::DuplicateEcho(e))) if e == "dup"
    ));

    // The original call still resolves normally.
    let original = within(pending).await.unwrap();
    assert!(original.expect("original call").is_ok());

    let _ws = gateway.await.unwrap();
}

#[tokio::test]
async fn test_call_without_connection_fails_immediately() {
    let client = NekoClient::builder().url("ws://127.0.0.1:9").build();
    let result = client.send_raw("anything", json!({})).await;
    assert!(matches!(result, Err(ClientError::NotConnected)));
}

// =========================================================================
// Subscriptions
// =========================================================================

#[tokio::test]
async fn test_events_reach_every_subscriber_in_wire_order() {
    let (addr, listener) = bind_gateway().await;
    let gateway = tokio::spawn(async move {
        let mut ws = accept_one(&listener).await;
        send_text(
            &mut ws,
            json!({
                "post_type": "notice", "notice_type": "notify", "sub_type": "poke",
                "time": 1, "self_id": 1, "user_id": 2, "target_id": 3
            })
            .to_string(),
        )
        .await;
        send_text(
            &mut ws,
            json!({
                "post_type": "message", "message_type": "group",
                "time": 2, "self_id": 1, "user_id": 2, "group_id": 9,
                "message": [{"type": "text", "data": {"text": "hi"}}]
            })
            .to_string(),
        )
        .await;
        ws
    });

    let client = client_for(&addr);
    let mut first = client.events();
    let mut second = client.events();
    within(client.connect()).await.expect("connect");

    for events in [&mut first, &mut second] {
        let poke = within(events.recv()).await.expect("poke event");
        assert!(matches!(poke, Event::Notice(NoticeEvent::Poke(_))));

        let message = within(events.recv()).await.expect("message event");
        match message {
            Event::Message(MessageEvent::Group(msg)) => assert_eq!(msg.group_id, 9),
            other => panic!("expected group message, got {other:?}"),
        }
    }

    let _ws = gateway.await.unwrap();
}

#[tokio::test]
async fn test_responses_published_matched_or_not() {
    let (addr, listener) = bind_gateway().await;
    let gateway = tokio::spawn(async move {
        let mut ws = accept_one(&listener).await;
        // A stray response nobody asked for...
        send_text(&mut ws, ok_response("stray", json!({"s": 1}))).await;
        // ...then a real answer to the pending call.
        let request = read_request(&mut ws).await;
        let echo = request["echo"].as_str().unwrap().to_string();
        send_text(&mut ws, ok_response(&echo, json!({"s": 2}))).await;
        ws
    });

    let client = client_for(&addr);
    let mut responses = client.responses();
    within(client.connect()).await.expect("connect");

    let stray = within(responses.recv()).await.expect("stray envelope");
    assert_eq!(stray.echo.as_deref(), Some("stray"));

    let call = within(client.send_raw("probe", json!({})))
        .await
        .expect("call resolves");
    assert_eq!(call.data.unwrap()["s"], 2);

    // The matched envelope is still published to the generic stream.
    let matched = within(responses.recv()).await.expect("matched envelope");
    assert_eq!(matched.data.unwrap()["s"], 2);

    let _ws = gateway.await.unwrap();
}

#[tokio::test]
async fn test_malformed_frame_does_not_kill_receive_loop() {
    let (addr, listener) = bind_gateway().await;
    let gateway = tokio::spawn(async move {
        let mut ws = accept_one(&listener).await;
        let request = read_request(&mut ws).await;
        let echo = request["echo"].as_str().unwrap().to_string();
        // Garbage first; the loop must shrug it off and keep reading.
        send_text(&mut ws, "this is not json".to_string()).await;
        send_text(&mut ws, ok_response(&echo, json!({"alive": true}))).await;
        ws
    });

    let client = client_for(&addr);
    within(client.connect()).await.expect("connect");

    let response = within(client.send_raw("probe", json!({})))
        .await
        .expect("call resolves despite garbage frame");
    assert_eq!(response.data.unwrap()["alive"], true);

    let _ws = gateway.await.unwrap();
}

// =========================================================================
// Connection lifecycle
// =========================================================================

#[tokio::test]
async fn test_connect_while_open_is_noop() {
    let (addr, listener) = bind_gateway().await;
    let gateway = tokio::spawn(async move {
        // Exactly one connection is ever accepted.
        let mut ws = accept_one(&listener).await;
        let request = read_request(&mut ws).await;
        let echo = request["echo"].as_str().unwrap().to_string();
        send_text(&mut ws, ok_response(&echo, json!({}))).await;
        ws
    });

    let client = client_for(&addr);
    within(client.connect()).await.expect("first connect");
    within(client.connect()).await.expect("second connect is a no-op");
    assert!(client.is_connected().await);

    // The original link still works.
    let response = within(client.send_raw("probe", json!({}))).await;
    assert!(response.is_ok());

    let _ws = gateway.await.unwrap();
}

#[tokio::test]
async fn test_explicit_disconnect_notifies_exactly_once() {
    let (addr, listener) = bind_gateway().await;
    let gateway = tokio::spawn(async move {
        let mut ws = accept_one(&listener).await;
        // Drain until the client goes away.
        while ws.next().await.is_some() {}
    });

    let client = client_for(&addr);
    let mut disconnects = client.disconnects();
    within(client.connect()).await.expect("connect");

    within(client.disconnect()).await;
    assert!(!client.is_connected().await);

    within(disconnects.recv()).await.expect("one notification");
    assert!(
        disconnects.try_recv().is_err(),
        "no second notification for the same connection"
    );

    // Disconnecting again is a quiet no-op.
    within(client.disconnect()).await;
    assert!(disconnects.try_recv().is_err());

    gateway.await.unwrap();
}

#[tokio::test]
async fn test_remote_close_fails_pending_call_and_notifies_once() {
    let (addr, listener) = bind_gateway().await;
    let gateway = tokio::spawn(async move {
        let mut ws = accept_one(&listener).await;
        let _request = read_request(&mut ws).await;
        // Hang up with the call still outstanding.
        ws.close(None).await.expect("server close");
    });

    let client = client_for(&addr);
    let mut disconnects = client.disconnects();
    within(client.connect()).await.expect("connect");

    // The orphaned call must fail by its own timeout, not hang forever.
    let orphaned = within(client.send_raw_with(
        "orphaned_action",
        json!({}),
        CallOptions::new().timeout(Duration::from_millis(300)),
    ))
    .await;
    assert!(matches!(orphaned, Err(ClientError::Timeout(_))));

    within(disconnects.recv()).await.expect("one notification");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(disconnects.try_recv().is_err(), "notification fired once");

    assert!(!client.is_connected().await);
    gateway.await.unwrap();
}

#[tokio::test]
async fn test_reconnect_after_disconnect() {
    let (addr, listener) = bind_gateway().await;
    let gateway = tokio::spawn(async move {
        // First connection: the client hangs up.
        let mut first = accept_one(&listener).await;
        while first.next().await.is_some() {}
        // Second connection: answer one call.
        let mut second = accept_one(&listener).await;
        let request = read_request(&mut second).await;
        let echo = request["echo"].as_str().unwrap().to_string();
        send_text(&mut second, ok_response(&echo, json!({"round": 2}))).await;
        second
    });

    let client = client_for(&addr);
    within(client.connect()).await.expect("first connect");
    within(client.disconnect()).await;

    within(client.connect()).await.expect("reconnect");
    let response = within(client.send_raw("probe", json!({})))
        .await
        .expect("call on fresh link");
    assert_eq!(response.data.unwrap()["round"], 2);

    let _ws = gateway.await.unwrap();
}

// =========================================================================
// Typed facade
// =========================================================================

#[tokio::test]
async fn test_send_group_msg_typed_round_trip() {
    let (addr, listener) = bind_gateway().await;
    let gateway = tokio::spawn(async move {
        let mut ws = accept_one(&listener).await;
        let request = read_request(&mut ws).await;
        assert_eq!(request["action"], "send_group_msg");
        assert_eq!(request["params"]["group_id"], 123456);
        // Chain ordering survives serialization: reply leads, text merged.
        assert_eq!(request["params"]["message"][0]["type"], "reply");
        assert_eq!(request["params"]["message"][1]["type"], "text");
        assert_eq!(
            request["params"]["message"][1]["data"]["text"],
            "hello world"
        );
        let echo = request["echo"].as_str().unwrap().to_string();
        send_text(&mut ws, ok_response(&echo, json!({"message_id": 4242}))).await;
        ws
    });

    let client = client_for(&addr);
    within(client.connect()).await.expect("connect");

    let chain = MessageChain::new().text("hello ").text("world").reply(7);
    let response = within(client.send_group_msg(123456, chain))
        .await
        .expect("typed call");
    assert!(response.is_ok());
    assert_eq!(response.data.unwrap().message_id, 4242);

    let _ws = gateway.await.unwrap();
}

#[tokio::test]
async fn test_get_group_info_typed_round_trip() {
    let (addr, listener) = bind_gateway().await;
    let gateway = tokio::spawn(async move {
        let mut ws = accept_one(&listener).await;
        let request = read_request(&mut ws).await;
        assert_eq!(request["action"], "get_group_info");
        assert_eq!(request["params"]["group_id"], 99);
        let echo = request["echo"].as_str().unwrap().to_string();
        send_text(
            &mut ws,
            ok_response(
                &echo,
                json!({
                    "group_id": "99",
                    "group_name": "rustaceans",
                    "member_count": 128,
                    "max_member_count": 500,
                    "group_all_shut": 0
                }),
            ),
        )
        .await;
        ws
    });

    let client = client_for(&addr);
    within(client.connect()).await.expect("connect");

    let response = within(client.get_group_info(99)).await.expect("typed call");
    let info = response.data.expect("payload");
    // group_id arrived string-encoded and still parsed.
    assert_eq!(info.group_id, 99);
    assert_eq!(info.group_name.as_deref(), Some("rustaceans"));
    assert_eq!(info.member_count, 128);

    let _ws = gateway.await.unwrap();
}
