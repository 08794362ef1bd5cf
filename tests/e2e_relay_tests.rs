//! End-to-end tests for the WebSocket relay protocol.

#![allow(clippy::panic)]

mod common;

use common::{TestServer, assert_silent, join, recv_json, send_json, send_text};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

#[tokio::test]
async fn three_peers_join_and_one_disconnects() {
    let server = TestServer::spawn().await;
    let mut p1 = server.connect().await;
    let mut p2 = server.connect().await;
    let mut p3 = server.connect().await;

    assert_eq!(join(&mut p1, "R1", "p1").await, json!({"type": "peers", "peers": []}));

    assert_eq!(
        join(&mut p2, "R1", "p2").await,
        json!({"type": "peers", "peers": ["p1"]})
    );
    assert_eq!(recv_json(&mut p1).await, json!({"type": "new-peer", "peerId": "p2"}));

    assert_eq!(
        join(&mut p3, "R1", "p3").await,
        json!({"type": "peers", "peers": ["p1", "p2"]})
    );
    let new_p3 = json!({"type": "new-peer", "peerId": "p3"});
    assert_eq!(recv_json(&mut p1).await, new_p3);
    assert_eq!(recv_json(&mut p2).await, new_p3);

    if p2.close(None).await.is_err() {
        panic!("close failed");
    }
    let left = json!({"type": "peer-left", "peerId": "p2"});
    assert_eq!(recv_json(&mut p1).await, left);
    assert_eq!(recv_json(&mut p3).await, left);

    let Ok(response) = reqwest::get(server.http_url("/api/v1/rooms/R1")).await else {
        panic!("room request failed");
    };
    let Ok(body) = response.json::<Value>().await else {
        panic!("room body is not json");
    };
    let peers: Vec<&str> = body
        .get("peers")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|p| p.get("peer_id").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(peers, vec!["p1", "p3"]);
}

#[tokio::test]
async fn signal_is_unicast_verbatim() {
    let server = TestServer::spawn().await;
    let mut p1 = server.connect().await;
    let mut p2 = server.connect().await;
    let mut p3 = server.connect().await;
    join(&mut p1, "R1", "p1").await;
    join(&mut p2, "R1", "p2").await;
    recv_json(&mut p1).await;
    join(&mut p3, "R1", "p3").await;
    recv_json(&mut p1).await;
    recv_json(&mut p2).await;

    send_json(
        &mut p1,
        json!({"type": "signal", "roomId": "R1", "to": "p3", "from": "p1", "signal": {"sdp": "v=0..."}}),
    )
    .await;

    assert_eq!(
        recv_json(&mut p3).await,
        json!({"type": "signal", "from": "p1", "signal": {"sdp": "v=0..."}})
    );
    assert_silent(&mut p2).await;
    assert_silent(&mut p1).await;
}

#[tokio::test]
async fn signal_to_missing_peer_is_silently_dropped() {
    let server = TestServer::spawn().await;
    let mut p1 = server.connect().await;
    join(&mut p1, "R1", "p1").await;

    send_json(
        &mut p1,
        json!({"type": "signal", "roomId": "R1", "to": "ghost", "from": "p1", "signal": {}}),
    )
    .await;
    assert_silent(&mut p1).await;

    // Still serving.
    send_json(&mut p1, json!({"type": "mute", "roomId": "R1", "peerId": "p1", "value": true})).await;
    assert_silent(&mut p1).await;
}

#[tokio::test]
async fn mute_and_speaking_reach_everyone_else() {
    let server = TestServer::spawn().await;
    let mut p1 = server.connect().await;
    let mut p2 = server.connect().await;
    join(&mut p1, "R1", "p1").await;
    join(&mut p2, "R1", "p2").await;
    recv_json(&mut p1).await;

    send_json(&mut p2, json!({"type": "mute", "roomId": "R1", "peerId": "p2", "value": true})).await;
    send_json(
        &mut p2,
        json!({"type": "speaking", "roomId": "R1", "peerId": "p2", "value": false}),
    )
    .await;

    assert_eq!(
        recv_json(&mut p1).await,
        json!({"type": "mute", "peerId": "p2", "value": true})
    );
    assert_eq!(
        recv_json(&mut p1).await,
        json!({"type": "speaking", "peerId": "p2", "value": false})
    );
    assert_silent(&mut p2).await;
}

#[tokio::test]
async fn garbage_does_not_end_the_connection() {
    let server = TestServer::spawn().await;
    let mut ws = server.connect().await;

    send_text(&mut ws, "{{{ not json").await;
    send_text(&mut ws, r#"{"roomId":"R1"}"#).await;
    send_text(&mut ws, r#"{"type":"wave","roomId":"R1"}"#).await;
    assert_silent(&mut ws).await;

    assert_eq!(join(&mut ws, "R1", "p1").await, json!({"type": "peers", "peers": []}));
}

#[tokio::test]
async fn duplicate_identity_gets_error_reply() {
    let server = TestServer::spawn().await;
    let mut first = server.connect().await;
    let mut second = server.connect().await;
    join(&mut first, "R1", "p1").await;

    let reply = join(&mut second, "R1", "p1").await;
    assert_eq!(reply.get("type"), Some(&json!("error")));
    assert_eq!(reply.get("code"), Some(&json!(2001)));
    assert_silent(&mut first).await;

    // A fresh identity works on the same connection.
    assert_eq!(
        join(&mut second, "R1", "p1-b").await,
        json!({"type": "peers", "peers": ["p1"]})
    );
}

#[tokio::test]
async fn last_member_leaving_deletes_room() {
    let server = TestServer::spawn().await;
    let mut ws = server.connect().await;
    join(&mut ws, "solo", "p1").await;
    server.wait_for_room_count(1).await;

    drop(ws);
    server.wait_for_room_count(0).await;

    let Ok(response) = reqwest::get(server.http_url("/api/v1/rooms/solo")).await else {
        panic!("room request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn explicit_leave_notifies_and_closes() {
    let server = TestServer::spawn().await;
    let mut p1 = server.connect().await;
    let mut p2 = server.connect().await;
    join(&mut p1, "R1", "p1").await;
    join(&mut p2, "R1", "p2").await;
    recv_json(&mut p1).await;

    send_json(&mut p2, json!({"type": "leave"})).await;
    assert_eq!(
        recv_json(&mut p1).await,
        json!({"type": "peer-left", "peerId": "p2"})
    );

    let ended = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        loop {
            match p2.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "server should close the socket after leave");
}

#[tokio::test]
async fn binary_frames_are_accepted() {
    let server = TestServer::spawn().await;
    let mut ws = server.connect().await;

    let join = json!({"type": "join", "roomId": "R1", "peerId": "bin"}).to_string();
    if ws.send(Message::binary(join.into_bytes())).await.is_err() {
        panic!("send failed");
    }
    assert_eq!(recv_json(&mut ws).await, json!({"type": "peers", "peers": []}));
}

#[tokio::test]
async fn rooms_are_isolated() {
    let server = TestServer::spawn().await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;
    join(&mut a, "A", "a").await;
    assert_eq!(join(&mut b, "B", "b").await, json!({"type": "peers", "peers": []}));

    send_json(&mut a, json!({"type": "mute", "roomId": "A", "peerId": "a", "value": true})).await;
    assert_silent(&mut a).await;
    assert_silent(&mut b).await;
}

#[tokio::test]
async fn concurrent_joins_all_register() {
    let server = TestServer::spawn().await;
    let count = 10;

    let mut handles = Vec::new();
    for i in 0..count {
        let mut ws = server.connect().await;
        handles.push(tokio::spawn(async move {
            let reply = join(&mut ws, "crowd", &format!("p{i}")).await;
            (ws, reply)
        }));
    }

    let mut sizes = Vec::new();
    let mut sockets = Vec::new();
    for handle in handles {
        let Ok((ws, reply)) = handle.await else {
            panic!("join task failed");
        };
        let Some(peers) = reply.get("peers").and_then(Value::as_array) else {
            panic!("unexpected reply {reply}");
        };
        sizes.push(peers.len());
        sockets.push(ws);
    }
    sizes.sort_unstable();
    assert_eq!(sizes, (0..count).collect::<Vec<_>>());
    assert_eq!(server.state.registry.peer_count().await, count);
}
