//! End-to-end room flows through the registry and room actors.
//!
//! Time is paused, so turn clocks, auto-skips and reconnect grace periods
//! elapse instantly whenever every task is waiting on a timer.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use ludo_core::{
    ConnectionHandle, EngineError, EventReceiver, InMemoryRepository, LudoConfig, RepositoryError,
    RoomRegistry, RoomRepository,
};
use ludo_types::{
    ClientAction, ClientMessage, ErrorCode, PlayerId, Room, RoomId, RuleKey, ServerEvent,
    SkipReason, TurnPhase,
};

const ROOM: &str = "flow";

fn config() -> LudoConfig {
    let mut config = LudoConfig::default();
    config.rules.power_ups = false;
    config.rules.trap_zones = false;
    config.timing.reconnect_grace_seconds = 5;
    config.seed = Some(7);
    config
}

fn registry(config: LudoConfig) -> (RoomRegistry, Arc<InMemoryRepository>) {
    let repo = Arc::new(InMemoryRepository::new());
    let registry = RoomRegistry::new(Arc::new(config), repo.clone());
    (registry, repo)
}

fn message(action: ClientAction) -> ClientMessage {
    ClientMessage {
        room_id: RoomId::from(ROOM),
        player_id: None,
        action,
    }
}

fn join(name: &str, player_id: Option<PlayerId>) -> ClientMessage {
    message(ClientAction::Join {
        player_name: name.to_owned(),
        player_id,
    })
}

async fn wait_for(rx: &mut EventReceiver, pred: impl Fn(&ServerEvent) -> bool) -> ServerEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(600), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("connection queue closed");
        if pred(&event) {
            return event;
        }
    }
}

struct Seat {
    conn: ConnectionHandle,
    rx: EventReceiver,
    id: PlayerId,
}

async fn seat(registry: &RoomRegistry, name: &str) -> Seat {
    let (conn, rx) = ConnectionHandle::open();
    let id = registry
        .dispatch(&conn, join(name, None))
        .await
        .unwrap()
        .expect("join returns a seat");
    Seat { conn, rx, id }
}

async fn started_game(registry: &RoomRegistry) -> (Seat, Seat) {
    let mut ada = seat(registry, "ada").await;
    let mut bo = seat(registry, "bo").await;
    let ready = || message(ClientAction::SetReady { ready: true });
    registry.dispatch(&ada.conn, ready()).await.unwrap();
    registry.dispatch(&bo.conn, ready()).await.unwrap();
    for rx in [&mut ada.rx, &mut bo.rx] {
        wait_for(rx, |e| matches!(e, ServerEvent::GameStarted { .. })).await;
    }
    (ada, bo)
}

#[tokio::test(start_paused = true)]
async fn lobby_fills_and_game_starts() {
    let (registry, repo) = registry(config());
    let (ada, mut bo) = started_game(&registry).await;

    let room = registry.snapshot(&RoomId::from(ROOM)).await.unwrap();
    assert_eq!(room.phase, TurnPhase::RollPending);
    assert_eq!(room.current_player_id(), Some(ada.id));
    assert_eq!(room.players.len(), 2);
    assert_eq!(registry.room_count().await, 1);
    assert!(
        repo.load_room(&RoomId::from(ROOM))
            .await
            .unwrap()
            .is_some_and(|r| r.phase == TurnPhase::RollPending)
    );

    // Out-of-turn roll is unicast back and changes nothing.
    let err = registry
        .dispatch(&bo.conn, message(ClientAction::RollDice))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotYourTurn { player_id: bo.id });
    wait_for(&mut bo.rx, |e| {
        matches!(e, ServerEvent::Error { code: ErrorCode::NotYourTurn, .. })
    })
    .await;
    assert_eq!(registry.snapshot(&RoomId::from(ROOM)).await.unwrap(), room);
}

#[tokio::test(start_paused = true)]
async fn claimed_seat_must_match_connection() {
    let (registry, _repo) = registry(config());
    let (ada, mut bo) = started_game(&registry).await;

    let mut spoofed = message(ClientAction::RollDice);
    spoofed.player_id = Some(ada.id);
    let err = registry.dispatch(&bo.conn, spoofed).await.unwrap_err();
    assert_eq!(err, EngineError::SessionMismatch);
    wait_for(&mut bo.rx, |e| {
        matches!(e, ServerEvent::Error { code: ErrorCode::SessionMismatch, .. })
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn idle_turn_times_out() {
    let (registry, _repo) = registry(config());
    let (ada, mut bo) = started_game(&registry).await;

    let skipped = wait_for(&mut bo.rx, |e| matches!(e, ServerEvent::TurnSkipped { .. })).await;
    assert_eq!(skipped, ServerEvent::TurnSkipped {
        player_id: ada.id,
        reason: SkipReason::Timeout,
    });
    let room = registry.snapshot(&RoomId::from(ROOM)).await.unwrap();
    assert_eq!(room.current_player_id(), Some(bo.id));
    assert_eq!(room.players[1].turn_time_remaining, 15);
}

#[tokio::test(start_paused = true)]
async fn roll_resolves_to_move_or_auto_skip() {
    let (registry, _repo) = registry(config());
    let (mut ada, _bo) = started_game(&registry).await;

    registry
        .dispatch(&ada.conn, message(ClientAction::RollDice))
        .await
        .unwrap();
    let rolled = wait_for(&mut ada.rx, |e| matches!(e, ServerEvent::DiceRolled { .. })).await;
    let ServerEvent::DiceRolled {
        value,
        movable_tokens,
        ..
    } = rolled
    else {
        return;
    };

    if movable_tokens.is_empty() {
        assert_ne!(value, 6);
        let skipped = wait_for(&mut ada.rx, |e| matches!(e, ServerEvent::TurnSkipped { .. })).await;
        assert_eq!(skipped, ServerEvent::TurnSkipped {
            player_id: ada.id,
            reason: SkipReason::NoLegalMoves,
        });
    } else {
        assert_eq!(value, 6);
        assert_eq!(movable_tokens.len(), 4);
        registry
            .dispatch(
                &ada.conn,
                message(ClientAction::MoveToken {
                    token_id: movable_tokens[0],
                }),
            )
            .await
            .unwrap();
        let moved = wait_for(&mut ada.rx, |e| matches!(e, ServerEvent::TokenMoved(_))).await;
        assert!(matches!(moved, ServerEvent::TokenMoved(outcome) if outcome.extra_turn && outcome.to == 0));
    }
}

#[tokio::test(start_paused = true)]
async fn reconnect_reclaims_seat() {
    let (registry, _repo) = registry(config());
    let (mut ada, bo) = started_game(&registry).await;
    let room_id = RoomId::from(ROOM);

    registry.disconnect(&room_id, bo.conn.id).await;
    wait_for(&mut ada.rx, |e| {
        matches!(e, ServerEvent::PlayerDisconnected { player_id } if *player_id == bo.id)
    })
    .await;

    let (conn, mut rx) = ConnectionHandle::open();
    let id = registry
        .dispatch(&conn, join("bo", Some(bo.id)))
        .await
        .unwrap();
    assert_eq!(id, Some(bo.id));
    wait_for(&mut rx, |e| {
        matches!(e, ServerEvent::Welcome { player_id, .. } if *player_id == bo.id)
    })
    .await;
    wait_for(&mut ada.rx, |e| {
        matches!(e, ServerEvent::PlayerReconnected { player_id } if *player_id == bo.id)
    })
    .await;

    // The old connection no longer speaks for the seat.
    let err = registry
        .dispatch(&bo.conn, message(ClientAction::SetReady { ready: false }))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::SessionMismatch);
    let room = registry.snapshot(&room_id).await.unwrap();
    assert!(room.players.iter().all(|p| p.connected));
}

#[tokio::test(start_paused = true)]
async fn expired_grace_forfeits_and_empty_room_closes() {
    let (registry, repo) = registry(config());
    let (mut ada, bo) = started_game(&registry).await;
    let room_id = RoomId::from(ROOM);

    registry.disconnect(&room_id, bo.conn.id).await;
    let ended = wait_for(&mut ada.rx, |e| matches!(e, ServerEvent::GameEnded { .. })).await;
    assert!(matches!(ended, ServerEvent::GameEnded { winner_id, .. } if winner_id == ada.id));

    let err = registry
        .dispatch(&ada.conn, message(ClientAction::RollDice))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidPhase { .. }));

    registry
        .dispatch(&ada.conn, message(ClientAction::Leave))
        .await
        .unwrap();
    for _ in 0..50 {
        if registry.room_count().await == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(registry.room_count().await, 0);
    assert!(repo.is_empty().await);
    assert!(matches!(
        registry.snapshot(&room_id).await,
        Err(EngineError::RoomNotFound(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn actions_for_unknown_rooms_are_rejected() {
    let (registry, _repo) = registry(config());
    let (conn, mut rx) = ConnectionHandle::open();
    let err = registry
        .dispatch(&conn, message(ClientAction::RollDice))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::RoomNotFound(_)));
    wait_for(&mut rx, |e| {
        matches!(e, ServerEvent::Error { code: ErrorCode::RoomNotFound, .. })
    })
    .await;

    let mut bad = join("ada", None);
    bad.room_id = RoomId::from("no spaces allowed");
    assert!(matches!(
        registry.dispatch(&conn, bad).await,
        Err(EngineError::Validation { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn persisted_room_is_restored_on_join() {
    let repo = Arc::new(InMemoryRepository::new());
    let config = Arc::new(config());
    let ada_id = {
        let registry = RoomRegistry::new(Arc::clone(&config), repo.clone());
        let (ada, _bo) = started_game(&registry).await;
        ada.id
    };

    // A fresh registry stands in for a restarted server.
    let registry = RoomRegistry::new(config, repo);
    let (conn, mut rx) = ConnectionHandle::open();
    let id = registry
        .dispatch(&conn, join("ada", Some(ada_id)))
        .await
        .unwrap();
    assert_eq!(id, Some(ada_id));
    let snapshot = wait_for(&mut rx, |e| matches!(e, ServerEvent::StateSnapshot(_))).await;
    let ServerEvent::StateSnapshot(room) = snapshot else {
        return;
    };
    assert!(room.is_started());
    assert!(room.player(ada_id).is_some_and(|p| p.connected));
    assert!(room.players.iter().any(|p| !p.connected));
}

#[tokio::test(start_paused = true)]
async fn connected_seat_cannot_be_taken_over() {
    let (registry, _repo) = registry(config());
    let (mut ada, _bo) = started_game(&registry).await;

    let (intruder, mut intruder_rx) = ConnectionHandle::open();
    let err = registry
        .dispatch(&intruder, join("ada", Some(ada.id)))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::SessionMismatch);
    wait_for(&mut intruder_rx, |e| {
        matches!(e, ServerEvent::Error { code: ErrorCode::SessionMismatch, .. })
    })
    .await;

    // The intruder holds no seat; the owner still does.
    let err = registry
        .dispatch(&intruder, message(ClientAction::RollDice))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::SessionMismatch);
    registry
        .dispatch(&ada.conn, message(ClientAction::RollDice))
        .await
        .unwrap();
    wait_for(&mut ada.rx, |e| {
        matches!(e, ServerEvent::DiceRolled { player_id, .. } if *player_id == ada.id)
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn dropped_socket_seat_can_be_reclaimed_before_disconnect_arrives() {
    let (registry, _repo) = registry(config());
    let (ada, mut bo) = started_game(&registry).await;

    // The socket is gone but nobody reported the disconnect yet.
    drop(ada.rx);
    let (conn, mut rx) = ConnectionHandle::open();
    let id = registry
        .dispatch(&conn, join("ada", Some(ada.id)))
        .await
        .unwrap();
    assert_eq!(id, Some(ada.id));
    wait_for(&mut rx, |e| matches!(e, ServerEvent::Welcome { .. })).await;
    wait_for(&mut bo.rx, |e| {
        matches!(e, ServerEvent::PlayerReconnected { player_id } if *player_id == ada.id)
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn repeated_join_from_owner_is_idempotent() {
    let (registry, _repo) = registry(config());
    let (mut ada, _bo) = started_game(&registry).await;

    let id = registry
        .dispatch(&ada.conn, join("ada", Some(ada.id)))
        .await
        .unwrap();
    assert_eq!(id, Some(ada.id));
    wait_for(&mut ada.rx, |e| matches!(e, ServerEvent::Welcome { .. })).await;
    let room = registry.snapshot(&RoomId::from(ROOM)).await.unwrap();
    assert_eq!(room.players.len(), 2);
    assert!(room.players.iter().all(|p| p.connected));
}

/// Repository whose loads of one room take far longer than anything else.
struct SlowLoads {
    inner: InMemoryRepository,
    slow_room: RoomId,
    delay: Duration,
}

impl RoomRepository for SlowLoads {
    fn load_room<'a>(
        &'a self,
        room_id: &'a RoomId,
    ) -> BoxFuture<'a, Result<Option<Room>, RepositoryError>> {
        Box::pin(async move {
            if *room_id == self.slow_room {
                tokio::time::sleep(self.delay).await;
            }
            self.inner.load_room(room_id).await
        })
    }

    fn save_room<'a>(&'a self, room: &'a Room) -> BoxFuture<'a, Result<(), RepositoryError>> {
        self.inner.save_room(room)
    }

    fn delete_room<'a>(
        &'a self,
        room_id: &'a RoomId,
    ) -> BoxFuture<'a, Result<(), RepositoryError>> {
        self.inner.delete_room(room_id)
    }
}

#[tokio::test(start_paused = true)]
async fn slow_room_load_does_not_block_other_rooms() {
    let repo = Arc::new(SlowLoads {
        inner: InMemoryRepository::new(),
        slow_room: RoomId::from("slow"),
        delay: Duration::from_secs(30),
    });
    let registry = RoomRegistry::new(Arc::new(config()), repo);
    let ada = seat(&registry, "ada").await;

    let slow_registry = registry.clone();
    let slow_join = tokio::spawn(async move {
        let (conn, _rx) = ConnectionHandle::open();
        let mut message = join("bo", None);
        message.room_id = RoomId::from("slow");
        slow_registry.dispatch(&conn, message).await
    });
    tokio::task::yield_now().await;

    let vote = message(ClientAction::VoteRule {
        rule: RuleKey::KillZone,
        enabled: true,
    });
    let result = tokio::time::timeout(Duration::from_secs(2), registry.dispatch(&ada.conn, vote))
        .await
        .expect("unrelated room waited on a repository load");
    assert_eq!(result, Ok(None));

    assert!(slow_join.await.unwrap().unwrap().is_some());
    assert_eq!(registry.room_count().await, 2);
}
