//! Integration tests for the `ludo-db` room store.
//!
//! These tests require a live `Dragonfly` (or Redis) instance. Run with:
//!
//! ```bash
//! docker compose up -d
//! cargo test -p ludo-db -- --ignored
//! docker compose down
//! ```
//!
//! All tests are marked `#[ignore]` so they are skipped during normal
//! `cargo test` runs.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use ludo_core::RoomRepository;
use ludo_db::{DragonflyRepository, room_key};
use ludo_types::{Color, Player, Room, RoomId, RuleSet};

/// `Dragonfly` connection URL for the local Docker instance.
const DRAGONFLY_URL: &str = "redis://localhost:6379";

async fn connect() -> DragonflyRepository {
    DragonflyRepository::connect(DRAGONFLY_URL, 60)
        .await
        .expect("Dragonfly must be running for integration tests")
}

#[tokio::test]
#[ignore = "requires a running Dragonfly instance"]
async fn room_round_trips_through_dragonfly() {
    let repo = connect().await;
    let mut room = Room::new(RoomId::from("it-room"), RuleSet::default());
    room.players.push(Player::new("ada", Color::Red));
    room.players.push(Player::new("bo", Color::Green));

    repo.save_room(&room).await.unwrap();
    let loaded = repo.load_room(&room.id).await.unwrap();
    assert_eq!(loaded, Some(room.clone()));

    repo.delete_room(&room.id).await.unwrap();
    assert!(repo.load_room(&room.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a running Dragonfly instance"]
async fn corrupt_document_is_a_codec_error() {
    let repo = connect().await;
    let room_id = RoomId::from("it-corrupt");
    repo.set_json(&room_key(&room_id), &"not a room").await.unwrap();

    let err = repo.load_room(&room_id).await.unwrap_err();
    assert!(matches!(err, ludo_core::RepositoryError::Codec(_)));
    repo.delete_room(&room_id).await.unwrap();
}
