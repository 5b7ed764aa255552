//! End-to-end tests against a real server on an ephemeral port.

#![allow(clippy::panic)]

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use remote_ws::api;
use remote_ws::app_state::AppState;
use remote_ws::chat::ChatRoom;
use remote_ws::dispatch::Dispatcher;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> SocketAddr {
    let Ok(dispatcher) = Dispatcher::new(ChatRoom::new()) else {
        panic!("valid configuration");
    };
    let app = api::build_router("/ws").with_state(AppState::new(dispatcher.into_handler()));

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind ephemeral port");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn connect(addr: SocketAddr) -> Socket {
    let Ok((socket, _)) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await else {
        panic!("websocket handshake");
    };
    socket
}

async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let Some(Ok(msg)) = socket.next().await else {
            panic!("socket ended early");
        };
        if let Message::Text(text) = msg {
            let Ok(value) = serde_json::from_str(text.as_str()) else {
                panic!("frame is not json: {}", text.as_str());
            };
            return value;
        }
    }
}

async fn call(socket: &mut Socket, frame: Value) {
    if socket.send(Message::text(frame.to_string())).await.is_err() {
        panic!("send failed");
    }
}

#[tokio::test]
async fn open_sends_exports_first() {
    let addr = spawn_server().await;
    let mut socket = connect(addr).await;

    assert_eq!(
        next_json(&mut socket).await,
        json!({"exports": ["login", "quit", "say"]})
    );
}

#[tokio::test]
async fn calls_flow_both_ways() {
    let addr = spawn_server().await;
    let mut ada = connect(addr).await;
    let _ = next_json(&mut ada).await;

    call(&mut ada, json!({"action": "login", "args": ["ada"]})).await;
    assert_eq!(
        next_json(&mut ada).await,
        json!({"action": "joined", "args": ["ada"]})
    );

    // A bad call is dropped without a reply and the connection stays usable.
    call(&mut ada, json!({"action": "teleport", "args": []})).await;
    call(&mut ada, json!({"action": "say", "args": ["still here"]})).await;
    assert_eq!(
        next_json(&mut ada).await,
        json!({"action": "said", "args": ["ada", "still here"]})
    );
}

#[tokio::test]
async fn quit_closes_from_server_side() {
    let addr = spawn_server().await;
    let mut socket = connect(addr).await;
    let _ = next_json(&mut socket).await;

    call(&mut socket, json!({"action": "quit", "args": []})).await;

    let closed = loop {
        match socket.next().await {
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break true,
            Some(Ok(_)) => {}
        }
    };
    assert!(closed);
}

#[tokio::test]
async fn health_reports_open_connections() {
    let addr = spawn_server().await;
    let mut socket = connect(addr).await;
    let _ = next_json(&mut socket).await;

    let Ok(response) = reqwest::get(format!("http://{addr}/health")).await else {
        panic!("health request");
    };
    assert!(response.status().is_success());
    let Ok(body) = response.json::<Value>().await else {
        panic!("health body");
    };
    assert_eq!(body.get("status"), Some(&json!("healthy")));
    assert_eq!(body.get("open_connections"), Some(&json!(1)));
}
