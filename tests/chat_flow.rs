use std::sync::Arc;

use parlour::chat::{
    ChatState,
    event::ServerEvent,
    registry::ConnId,
    session::RoomSession,
    store::HistoryStore,
};
use parlour::config::RoomConfig;
use parlour::db;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tokio::sync::mpsc::{self, UnboundedReceiver};

async fn chat_state() -> (Arc<ChatState>, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init(&pool).await.unwrap();
    let chat = Arc::new(ChatState::new(
        RoomConfig::from_list(["news", "kpop"]),
        HistoryStore::new(pool.clone()),
    ));
    (chat, pool)
}

fn connect(chat: &ChatState, identity: &str) -> (RoomSession, UnboundedReceiver<ServerEvent>) {
    let conn = ConnId::new();
    let (tx, rx) = mpsc::unbounded_channel();
    chat.register(identity, conn, tx);
    (RoomSession::new(conn, identity.to_owned()), rx)
}

fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn room_message_reaches_every_member_including_sender() {
    let (chat, _pool) = chat_state().await;
    let (mut alice, mut alice_rx) = connect(&chat, "alice");
    let (mut bob, mut bob_rx) = connect(&chat, "bob");
    alice.join(&chat, "news");
    bob.join(&chat, "news");
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    chat.send_room_message("alice", "news", "hi").await.unwrap();

    for rx in [&mut alice_rx, &mut bob_rx] {
        let events = drain(rx);
        assert_eq!(events.len(), 1);
        let ServerEvent::RoomMessage(msg) = &events[0] else {
            panic!("expected a room message, got {:?}", events[0]);
        };
        assert_eq!(msg.sender, "alice");
        assert_eq!(msg.text, "hi");
        assert_eq!(msg.room, "news");
        assert!(!msg.id.is_empty());
        assert!(msg.sent_at > 0);
    }
}

#[tokio::test]
async fn private_message_only_reaches_sender_and_target() {
    let (chat, _pool) = chat_state().await;
    let (_alice, mut alice_rx) = connect(&chat, "alice");
    let (_bob, mut bob_rx) = connect(&chat, "bob");
    let (_carol, mut carol_rx) = connect(&chat, "carol");

    chat.send_private_message("alice", "bob", "hey").await.unwrap();

    for rx in [&mut alice_rx, &mut bob_rx] {
        let events = drain(rx);
        assert_eq!(events.len(), 1);
        let ServerEvent::PrivateMessage(msg) = &events[0] else {
            panic!("expected a private message, got {:?}", events[0]);
        };
        assert_eq!(msg.sender, "alice");
        assert_eq!(msg.target, "bob");
        assert_eq!(msg.text, "hey");
    }
    assert!(drain(&mut carol_rx).is_empty());
}

#[tokio::test]
async fn self_addressed_private_message_arrives_twice() {
    let (chat, _pool) = chat_state().await;
    let (_alice, mut alice_rx) = connect(&chat, "alice");

    chat.send_private_message("alice", "alice", "note to self")
        .await
        .unwrap();

    // One delivery per registry lookup: sender's, then target's.
    assert_eq!(drain(&mut alice_rx).len(), 2);
}

#[tokio::test]
async fn private_message_persists_without_a_live_target() {
    let (chat, _pool) = chat_state().await;
    let (_alice, mut alice_rx) = connect(&chat, "alice");

    chat.send_private_message("alice", "bob", "see you").await.unwrap();

    assert_eq!(drain(&mut alice_rx).len(), 1);
    let replay = chat
        .history()
        .recent_private_messages("bob", "alice", 200)
        .await
        .unwrap();
    assert_eq!(replay.len(), 1);
    assert_eq!(replay[0].text, "see you");
}

#[tokio::test]
async fn switching_rooms_leaves_the_old_room_first() {
    let (chat, _pool) = chat_state().await;
    let (mut alice, mut alice_rx) = connect(&chat, "alice");
    let (mut bob, mut bob_rx) = connect(&chat, "bob");
    alice.join(&chat, "news");
    bob.join(&chat, "news");
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    alice.join(&chat, "kpop");

    assert_eq!(alice.joined_room(), Some("kpop"));
    assert_eq!(chat.members_of("kpop"), vec!["alice".to_owned()]);
    assert_eq!(chat.members_of("news"), vec!["bob".to_owned()]);

    // Old-room observers see the shrunken snapshot, then the notice.
    let bob_events = drain(&mut bob_rx);
    assert_eq!(
        bob_events,
        vec![
            ServerEvent::RoomMembers {
                room: "news".to_owned(),
                members: vec!["bob".to_owned()],
            },
            ServerEvent::RoomSystem {
                room: "news".to_owned(),
                message: "alice left the room.".to_owned(),
            },
        ]
    );

    // New-room join order is notice first, snapshot second.
    let alice_events = drain(&mut alice_rx);
    assert_eq!(
        alice_events,
        vec![
            ServerEvent::RoomSystem {
                room: "kpop".to_owned(),
                message: "alice joined the room.".to_owned(),
            },
            ServerEvent::RoomMembers {
                room: "kpop".to_owned(),
                members: vec!["alice".to_owned()],
            },
        ]
    );
}

#[tokio::test]
async fn explicit_leave_broadcasts_snapshot_then_notice() {
    let (chat, _pool) = chat_state().await;
    let (mut alice, mut alice_rx) = connect(&chat, "alice");
    let (mut bob, mut bob_rx) = connect(&chat, "bob");
    alice.join(&chat, "news");
    bob.join(&chat, "news");
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    alice.leave(&chat, "news");

    assert_eq!(alice.joined_room(), None);
    assert_eq!(
        drain(&mut bob_rx),
        vec![
            ServerEvent::RoomMembers {
                room: "news".to_owned(),
                members: vec!["bob".to_owned()],
            },
            ServerEvent::RoomSystem {
                room: "news".to_owned(),
                message: "alice left the room.".to_owned(),
            },
        ]
    );
}

#[tokio::test]
async fn leave_notifies_even_when_not_a_member() {
    let (chat, _pool) = chat_state().await;
    let (mut alice, mut alice_rx) = connect(&chat, "alice");
    let (mut bob, mut bob_rx) = connect(&chat, "bob");
    bob.join(&chat, "news");
    drain(&mut bob_rx);

    // At-least-once policy: the broadcasts fire regardless of membership.
    alice.leave(&chat, "news");

    assert_eq!(drain(&mut bob_rx).len(), 2);
    assert!(drain(&mut alice_rx).is_empty());
}

#[tokio::test]
async fn disconnect_sends_snapshot_but_no_system_notice() {
    let (chat, _pool) = chat_state().await;
    let (mut alice, mut alice_rx) = connect(&chat, "alice");
    let (mut bob, mut bob_rx) = connect(&chat, "bob");
    alice.join(&chat, "news");
    bob.join(&chat, "news");
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    alice.disconnect(&chat);

    assert!(!chat.is_registered("alice"));
    assert_eq!(
        drain(&mut bob_rx),
        vec![ServerEvent::RoomMembers {
            room: "news".to_owned(),
            members: vec!["bob".to_owned()],
        }]
    );
}

#[tokio::test]
async fn joining_an_unconfigured_room_is_a_no_op() {
    let (chat, _pool) = chat_state().await;
    let (mut alice, mut alice_rx) = connect(&chat, "alice");
    let (mut bob, mut bob_rx) = connect(&chat, "bob");
    bob.join(&chat, "news");
    drain(&mut bob_rx);

    alice.join(&chat, "gardening");

    assert_eq!(alice.joined_room(), None);
    assert!(!chat.is_room_tracked("gardening"));
    assert!(drain(&mut alice_rx).is_empty());
    assert!(drain(&mut bob_rx).is_empty());
}

#[tokio::test]
async fn connection_is_in_at_most_one_room() {
    let (chat, _pool) = chat_state().await;
    let (mut alice, _alice_rx) = connect(&chat, "alice");

    alice.join(&chat, "news");
    alice.join(&chat, "kpop");
    alice.join(&chat, "news");

    assert_eq!(alice.joined_room(), Some("news"));
    assert_eq!(chat.members_of("news"), vec!["alice".to_owned()]);
    assert!(!chat.is_room_tracked("kpop"));

    alice.leave(&chat, "news");
    assert_eq!(alice.joined_room(), None);
    assert!(!chat.is_room_tracked("news"));
}

#[tokio::test]
async fn room_typing_skips_the_originators_connections() {
    let (chat, _pool) = chat_state().await;
    let (mut alice, mut alice_rx) = connect(&chat, "alice");
    let (_alice2, mut alice2_rx) = connect(&chat, "alice");
    let (mut bob, mut bob_rx) = connect(&chat, "bob");
    alice.join(&chat, "news");
    bob.join(&chat, "news");
    drain(&mut alice_rx);
    drain(&mut alice2_rx);
    drain(&mut bob_rx);

    chat.room_typing("alice", "news", true);

    assert!(drain(&mut alice_rx).is_empty());
    assert!(drain(&mut alice2_rx).is_empty());
    assert_eq!(
        drain(&mut bob_rx),
        vec![ServerEvent::RoomTyping {
            room: "news".to_owned(),
            sender: "alice".to_owned(),
            is_typing: true,
        }]
    );
}

#[tokio::test]
async fn private_typing_reaches_the_target_only() {
    let (chat, _pool) = chat_state().await;
    let (_alice, mut alice_rx) = connect(&chat, "alice");
    let (_bob, mut bob_rx) = connect(&chat, "bob");
    let (_carol, mut carol_rx) = connect(&chat, "carol");

    chat.private_typing("alice", "bob", true);
    chat.private_typing("alice", "bob", false);

    assert!(drain(&mut alice_rx).is_empty());
    assert!(drain(&mut carol_rx).is_empty());
    assert_eq!(
        drain(&mut bob_rx),
        vec![
            ServerEvent::PrivateTyping {
                sender: "alice".to_owned(),
                target: "bob".to_owned(),
                is_typing: true,
            },
            ServerEvent::PrivateTyping {
                sender: "alice".to_owned(),
                target: "bob".to_owned(),
                is_typing: false,
            },
        ]
    );
}

#[tokio::test]
async fn nothing_is_broadcast_when_the_durable_write_fails() {
    let (chat, pool) = chat_state().await;
    let (mut alice, mut alice_rx) = connect(&chat, "alice");
    alice.join(&chat, "news");
    drain(&mut alice_rx);

    sqlx::query("DROP TABLE room_messages")
        .execute(&pool)
        .await
        .unwrap();

    let result = chat.send_room_message("alice", "news", "hi").await;
    assert!(result.is_err());
    assert!(drain(&mut alice_rx).is_empty());
}

#[tokio::test]
async fn empty_room_or_text_is_dropped_silently() {
    let (chat, _pool) = chat_state().await;
    let (mut alice, mut alice_rx) = connect(&chat, "alice");
    alice.join(&chat, "news");
    drain(&mut alice_rx);

    chat.send_room_message("alice", "", "hi").await.unwrap();
    chat.send_room_message("alice", "news", "").await.unwrap();
    chat.send_private_message("alice", "", "hi").await.unwrap();
    chat.send_private_message("alice", "bob", "").await.unwrap();

    assert!(drain(&mut alice_rx).is_empty());
    assert!(chat
        .history()
        .recent_room_messages("news", 200)
        .await
        .unwrap()
        .is_empty());
}
