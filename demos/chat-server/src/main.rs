//! A minimal chat server built on Roomcast.
//!
//! Clients connect over WebSocket, optionally authenticate with a
//! `name:<who>` token, join rooms by name, and exchange messages. Run it
//! and point any WebSocket client at port 8080:
//!
//! ```text
//! > {"type":"Join","room_id":"lobby"}
//! < {"type":"Joined","room_id":"lobby"}
//! > {"type":"Send","room_id":"lobby","payload":"hello"}
//! < {"type":"Delivered","message":{...,"payload":"hello"}}
//! ```

use roomcast::prelude::*;

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Accepts tokens of the form `name:<who>` and uses `<who>` as the
/// user id. Stands in for a real credential check.
struct NameTokenAuth;

impl Authenticator for NameTokenAuth {
    async fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        match token.strip_prefix("name:") {
            Some(name) if !name.is_empty() => Ok(UserId::new(name)),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    roomcast::init_tracing();

    let server = RoomcastServerBuilder::new()
        .bind("0.0.0.0:8080")
        .build(NameTokenAuth, MemoryStore::new(), OpenRooms)
        .await?;

    server.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message;

    type Ws = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn start() -> String {
        let server = RoomcastServerBuilder::new()
            .bind("127.0.0.1:0")
            .build(NameTokenAuth, MemoryStore::new(), OpenRooms)
            .await
            .expect("server should build");
        let addr = server.local_addr().expect("local addr").to_string();
        tokio::spawn(async move {
            let _ = server.run().await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        addr
    }

    async fn connect(addr: &str) -> Ws {
        let (ws, _) =
            tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .expect("should connect");
        ws
    }

    async fn roundtrip(ws: &mut Ws, event: &ClientEvent) -> ServerEvent {
        let text = serde_json::to_string(event).expect("encode");
        ws.send(Message::text(text)).await.expect("send");
        let msg = ws.next().await.unwrap().expect("recv");
        serde_json::from_slice(&msg.into_data()).expect("decode")
    }

    #[tokio::test]
    async fn test_name_token_sets_identity() {
        let addr = start().await;
        let mut ws = connect(&addr).await;

        let answer = roundtrip(
            &mut ws,
            &ClientEvent::Authenticate {
                token: "name:alice".into(),
            },
        )
        .await;

        match answer {
            ServerEvent::Authenticated { user_id } => {
                assert_eq!(user_id, UserId::new("alice"));
            }
            other => panic!("expected Authenticated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bad_token_is_rejected() {
        let addr = start().await;
        let mut ws = connect(&addr).await;

        let answer = roundtrip(
            &mut ws,
            &ClientEvent::Authenticate {
                token: "password123".into(),
            },
        )
        .await;

        assert!(matches!(
            answer,
            ServerEvent::Error {
                reason: ErrorReason::AuthInvalid,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_join_and_send_round_trip() {
        let addr = start().await;
        let mut ws = connect(&addr).await;

        let joined = roundtrip(
            &mut ws,
            &ClientEvent::Join {
                room_id: RoomId::new("lobby"),
            },
        )
        .await;
        assert!(matches!(joined, ServerEvent::Joined { .. }));

        let answer = roundtrip(
            &mut ws,
            &ClientEvent::Send {
                room_id: RoomId::new("lobby"),
                payload: "hello".into(),
            },
        )
        .await;

        match answer {
            ServerEvent::Delivered { message } => {
                assert_eq!(message.payload, "hello");
            }
            other => panic!("expected Delivered, got {other:?}"),
        }
    }
}
