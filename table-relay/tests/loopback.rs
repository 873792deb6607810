//! Two peers meeting through a relay on the loopback interface.

use std::sync::Arc;
use std::time::Duration;

use tablesync_peer::{
    RelayTransport, RetryPolicy, Role, Session, SessionConfig, Transport, TransportError,
    TransportEvent,
};
use tablesync_relay::{serve, Config, Relay};
use tablesync_types::{Action, Card, CardId, JoinMetadata, PlayerId, Position, Zone};
use tokio::net::TcpListener;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

async fn start_relay() -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(Arc::new(Relay::new(Config::default())), listener));
    addr
}

fn metadata() -> JoinMetadata {
    JoinMetadata {
        password: "pw".into(),
        display_name: "Alice".into(),
        player_id: PlayerId::new("alice"),
    }
}

async fn next(transport: &RelayTransport) -> TransportEvent {
    timeout(WAIT, transport.next_event()).await.unwrap().unwrap()
}

#[tokio::test]
async fn channel_carries_payloads() {
    let addr = start_relay().await;
    let host = RelayTransport::connect(addr).await.unwrap();
    let peer = RelayTransport::connect(addr).await.unwrap();

    host.listen("R1").await.unwrap();
    let channel = peer.dial("R1", metadata()).await.unwrap();

    match next(&host).await {
        TransportEvent::Opened {
            channel: c,
            metadata,
            inbound,
        } => {
            assert_eq!(c, channel);
            assert!(inbound);
            assert_eq!(metadata.unwrap().player_id, PlayerId::new("alice"));
        }
        other => panic!("expected Opened, got {:?}", other),
    }
    assert!(matches!(next(&peer).await, TransportEvent::Opened { inbound: false, .. }));

    peer.send(channel, b"hello").await.unwrap();
    match next(&host).await {
        TransportEvent::Data { bytes, .. } => assert_eq!(bytes, b"hello"),
        other => panic!("expected Data, got {:?}", other),
    }
}

#[tokio::test]
async fn second_listener_is_refused() {
    let addr = start_relay().await;
    let a = RelayTransport::connect(addr).await.unwrap();
    let b = RelayTransport::connect(addr).await.unwrap();
    a.listen("R1").await.unwrap();
    assert_eq!(
        b.listen("R1").await,
        Err(TransportError::AddressInUse("R1".into()))
    );
    assert_eq!(
        b.dial("R2", metadata()).await,
        Err(TransportError::Unreachable("R2".into()))
    );
}

#[tokio::test]
async fn vanished_host_closes_channel_and_frees_address() {
    let addr = start_relay().await;
    let host = RelayTransport::connect(addr).await.unwrap();
    let peer = RelayTransport::connect(addr).await.unwrap();
    host.listen("R1").await.unwrap();
    let channel = peer.dial("R1", metadata()).await.unwrap();
    let _ = next(&peer).await;

    host.shutdown().await;
    match next(&peer).await {
        TransportEvent::Closed { channel: c, .. } => assert_eq!(c, channel),
        other => panic!("expected Closed, got {:?}", other),
    }
    assert!(!peer.is_open(channel));

    // The relay releases the address once it notices the disconnect.
    let successor = RelayTransport::connect(addr).await.unwrap();
    let mut listened = false;
    for _ in 0..50 {
        if successor.listen("R1").await.is_ok() {
            listened = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(listened);
}

#[tokio::test]
async fn sessions_share_a_table_through_the_relay() {
    let addr = start_relay().await;
    let config = |id: &str| {
        SessionConfig::new("R1", "pw", id.to_uppercase())
            .with_player_id(PlayerId::new(id))
            .with_retry(RetryPolicy::fixed(
                Duration::from_millis(20),
                Duration::from_millis(100),
            ))
            .with_rng_seed(3)
    };

    let host = Session::host(
        Arc::new(RelayTransport::connect(addr).await.unwrap()),
        config("host"),
    );
    timeout(WAIT, host.wait_until(|v| v.role == Some(Role::Host)))
        .await
        .unwrap()
        .unwrap();

    let alice = Session::join(
        Arc::new(RelayTransport::connect(addr).await.unwrap()),
        config("alice"),
    );
    let view = timeout(WAIT, alice.wait_until(|v| v.table.players.len() == 2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.role, Some(Role::Client));

    let card = Card::new(
        CardId::new("c1"),
        "Island",
        PlayerId::new("alice"),
        Zone::Battlefield,
        Position::new(5.0, 5.0),
    );
    alice.request(Action::Add { card: card.clone() }).await.unwrap();
    let view = timeout(WAIT, alice.wait_until(|v| !v.table.board.is_empty()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.table.board, vec![card]);
}
