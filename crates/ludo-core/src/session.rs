//! The room actor.
//!
//! Each room is owned by one task that processes commands strictly in
//! arrival order. Client actions, disconnects and timer firings all enter
//! through the same mailbox, so no two mutations of a room ever overlap.
//!
//! ```text
//!  socket tasks ──┐
//!  turn ticker ───┼──> mpsc mailbox ──> RoomActor ──> coordinator / seating
//!  respawns ──────┤                        │
//!  grace timers ──┘                        ├──> broadcast to bound connections
//!                                          └──> RoomRepository::save_room
//! ```
//!
//! Timer tasks hold only a weak sender and tag their messages with an
//! epoch. A message from a superseded timer is ignored.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ludo_types::{ClientAction, ConnectionId, PlayerId, Room, RoomId, ServerEvent};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::config::LudoConfig;
use crate::coordinator;
use crate::error::EngineError;
use crate::repository::RoomRepository;
use crate::seating;
use crate::timer::TimerSlot;
use crate::transition::{Directive, Transition};
use crate::transport::ConnectionHandle;

type Reply<T> = oneshot::Sender<Result<T, EngineError>>;

/// Messages processed by a room actor.
#[derive(Debug)]
enum RoomCommand {
    Join {
        conn: ConnectionHandle,
        name: String,
        player_id: Option<PlayerId>,
        reply: Reply<PlayerId>,
    },
    Action {
        conn: ConnectionHandle,
        player_id: Option<PlayerId>,
        action: ClientAction,
        reply: Reply<()>,
    },
    Disconnect {
        conn_id: ConnectionId,
    },
    Snapshot {
        reply: Reply<Room>,
    },
    TurnTick {
        epoch: u64,
    },
    AutoSkip {
        epoch: u64,
    },
    Respawn,
    GraceExpired {
        player_id: PlayerId,
        epoch: u64,
    },
}

/// Sending side of a room's mailbox.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room this handle addresses.
    pub const fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Whether the actor has stopped accepting commands.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Whether both handles address the same actor.
    pub fn same_channel(&self, other: &Self) -> bool {
        self.tx.same_channel(&other.tx)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> RoomCommand,
    ) -> Result<T, EngineError> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(build(reply)).await.is_err() {
            return Err(EngineError::RoomClosed(self.room_id.clone()));
        }
        match rx.await {
            Ok(result) => result,
            Err(_dropped) => Err(EngineError::RoomClosed(self.room_id.clone())),
        }
    }

    /// Seat `conn` in the room, or rebind it to an existing seat.
    ///
    /// # Errors
    ///
    /// Returns the join rejection, or [`EngineError::RoomClosed`] if the
    /// room shut down first.
    pub async fn join(
        &self,
        conn: ConnectionHandle,
        name: String,
        player_id: Option<PlayerId>,
    ) -> Result<PlayerId, EngineError> {
        self.request(|reply| RoomCommand::Join {
            conn,
            name,
            player_id,
            reply,
        })
        .await
    }

    /// Submit a game action from a bound connection.
    ///
    /// # Errors
    ///
    /// Returns the rejection already unicast to the connection, or
    /// [`EngineError::RoomClosed`].
    pub async fn act(
        &self,
        conn: ConnectionHandle,
        player_id: Option<PlayerId>,
        action: ClientAction,
    ) -> Result<(), EngineError> {
        self.request(|reply| RoomCommand::Action {
            conn,
            player_id,
            action,
            reply,
        })
        .await
    }

    /// Report that a connection went away. Unknown connections are ignored.
    pub async fn disconnect(&self, conn_id: ConnectionId) {
        if self
            .tx
            .send(RoomCommand::Disconnect { conn_id })
            .await
            .is_err()
        {
            tracing::debug!(room_id = %self.room_id, "disconnect for closed room");
        }
    }

    /// A copy of the current room state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RoomClosed`] if the room shut down.
    pub async fn snapshot(&self) -> Result<Room, EngineError> {
        self.request(|reply| RoomCommand::Snapshot { reply }).await
    }
}

#[derive(Debug, Default)]
struct GraceTimer {
    epoch: u64,
    timer: TimerSlot,
}

struct RoomActor {
    room: Room,
    config: Arc<LudoConfig>,
    repo: Arc<dyn RoomRepository>,
    rng: StdRng,
    bindings: HashMap<PlayerId, ConnectionHandle>,
    rx: mpsc::Receiver<RoomCommand>,
    tx: mpsc::WeakSender<RoomCommand>,
    turn_timer: TimerSlot,
    turn_epoch: u64,
    grace_timers: HashMap<PlayerId, GraceTimer>,
    grace_epoch: u64,
    respawns: JoinSet<()>,
}

/// Spawn the actor owning `room` and return its handle.
///
/// A `restored` room was loaded from the repository: every seat starts
/// disconnected with a reconnect grace period, and a running game resumes
/// its turn timer.
pub fn spawn_room(
    room: Room,
    restored: bool,
    config: Arc<LudoConfig>,
    repo: Arc<dyn RoomRepository>,
) -> RoomHandle {
    let room_id = room.id.clone();
    let (mut actor, tx) = RoomActor::new(room, config, repo);
    if restored {
        actor.resume();
    }
    tracing::info!(room_id = %room_id, restored, "room opened");
    tokio::spawn(actor.run());
    RoomHandle { room_id, tx }
}

impl RoomActor {
    fn new(
        room: Room,
        config: Arc<LudoConfig>,
        repo: Arc<dyn RoomRepository>,
    ) -> (Self, mpsc::Sender<RoomCommand>) {
        let (tx, rx) = mpsc::channel(config.server.mailbox_capacity.max(1));
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let actor = Self {
            room,
            config,
            repo,
            rng,
            bindings: HashMap::new(),
            rx,
            tx: tx.downgrade(),
            turn_timer: TimerSlot::new(),
            turn_epoch: 0,
            grace_timers: HashMap::new(),
            grace_epoch: 0,
            respawns: JoinSet::new(),
        };
        (actor, tx)
    }

    async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            self.handle(command).await;
            while self.respawns.try_join_next().is_some() {}
            if seating::is_abandoned(&self.room) {
                self.close().await;
                return;
            }
        }
    }

    fn resume(&mut self) {
        let seats: Vec<PlayerId> = self
            .room
            .players
            .iter()
            .filter(|p| !p.left)
            .map(|p| p.id)
            .collect();
        for player in &mut self.room.players {
            player.connected = false;
        }
        for player_id in seats {
            self.start_grace(player_id);
        }
        if let Some(directive) = coordinator::turn_timer_directive(&self.room, &self.config) {
            self.apply_directive(directive);
        }
    }

    async fn close(&mut self) {
        self.cancel_timers();
        self.grace_timers.clear();
        if let Err(e) = self.repo.delete_room(&self.room.id).await {
            tracing::warn!(room_id = %self.room.id, error = %e, "failed to delete room");
        }
        self.rx.close();
        while let Ok(command) = self.rx.try_recv() {
            let closed = EngineError::RoomClosed(self.room.id.clone());
            match command {
                RoomCommand::Join { reply, .. } => drop(reply.send(Err(closed))),
                RoomCommand::Action { reply, .. } => drop(reply.send(Err(closed))),
                RoomCommand::Snapshot { reply } => drop(reply.send(Err(closed))),
                _ => {}
            }
        }
        tracing::info!(room_id = %self.room.id, "room closed");
    }

    async fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join {
                conn,
                name,
                player_id,
                reply,
            } => {
                let result = self.join(&conn, &name, player_id).await;
                if let Err(e) = &result {
                    self.reject(&conn, e);
                }
                drop(reply.send(result));
            }
            RoomCommand::Action {
                conn,
                player_id,
                action,
                reply,
            } => {
                let name = action.name();
                let result = match self.perform(&conn, player_id, action) {
                    Ok(transition) => {
                        self.commit(transition).await;
                        Ok(())
                    }
                    Err(e) => {
                        tracing::warn!(
                            room_id = %self.room.id,
                            action = name,
                            error = %e,
                            "action rejected"
                        );
                        self.reject(&conn, &e);
                        Err(e)
                    }
                };
                drop(reply.send(result));
            }
            RoomCommand::Disconnect { conn_id } => self.disconnect(conn_id).await,
            RoomCommand::Snapshot { reply } => drop(reply.send(Ok(self.room.clone()))),
            RoomCommand::TurnTick { epoch } => {
                if epoch == self.turn_epoch {
                    let result = coordinator::tick_turn_clock(&mut self.room, &self.config);
                    self.commit_internal(result).await;
                }
            }
            RoomCommand::AutoSkip { epoch } => {
                if epoch == self.turn_epoch {
                    let result = coordinator::skip_turn(
                        &mut self.room,
                        ludo_types::SkipReason::NoLegalMoves,
                        &self.config,
                    );
                    self.commit_internal(result).await;
                }
            }
            RoomCommand::Respawn => {
                let transition = coordinator::respawn_power_up(&mut self.room, &mut self.rng);
                if !transition.events.is_empty() {
                    self.commit(transition).await;
                }
            }
            RoomCommand::GraceExpired { player_id, epoch } => {
                self.grace_expired(player_id, epoch).await;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Seats
    // -----------------------------------------------------------------------

    fn bound_player(&self, conn_id: ConnectionId) -> Option<PlayerId> {
        self.bindings
            .iter()
            .find(|(_, conn)| conn.id == conn_id)
            .map(|(player_id, _)| *player_id)
    }

    async fn join(
        &mut self,
        conn: &ConnectionHandle,
        name: &str,
        player_id: Option<PlayerId>,
    ) -> Result<PlayerId, EngineError> {
        if let Some(bound) = self.bound_player(conn.id) {
            if player_id != Some(bound) {
                return Err(EngineError::validation(
                    "connection already holds a seat in this room",
                ));
            }
            // Repeated join from the owning connection.
            conn.send(ServerEvent::Welcome {
                room_id: self.room.id.clone(),
                player_id: bound,
            });
            conn.send(ServerEvent::StateSnapshot(Box::new(self.room.clone())));
            return Ok(bound);
        }
        if let Some(requested) = player_id
            && self.bindings.get(&requested).is_some_and(ConnectionHandle::is_closed)
        {
            // The old socket is gone but its disconnect has not arrived yet.
            self.bindings.remove(&requested);
            let result = seating::disconnect(&mut self.room, requested, &self.config);
            self.commit_internal(result).await;
        }
        let joined = seating::join_player(&mut self.room, name, player_id, &self.config)?;
        self.grace_timers.remove(&joined.player_id);
        self.bindings.insert(joined.player_id, conn.clone());
        conn.send(ServerEvent::Welcome {
            room_id: self.room.id.clone(),
            player_id: joined.player_id,
        });
        self.commit(joined.transition).await;
        Ok(joined.player_id)
    }

    /// Resolve the seat a connection acts for.
    fn seat_for(
        &self,
        conn: &ConnectionHandle,
        claimed: Option<PlayerId>,
    ) -> Result<PlayerId, EngineError> {
        let bound = self
            .bound_player(conn.id)
            .ok_or(EngineError::SessionMismatch)?;
        match claimed {
            Some(player_id) if player_id != bound => Err(EngineError::SessionMismatch),
            _ => Ok(bound),
        }
    }

    fn perform(
        &mut self,
        conn: &ConnectionHandle,
        claimed: Option<PlayerId>,
        action: ClientAction,
    ) -> Result<Transition, EngineError> {
        let player_id = self.seat_for(conn, claimed)?;
        let room = &mut self.room;
        let config = &self.config;
        let rng = &mut self.rng;
        match action {
            ClientAction::Join { .. } => Err(EngineError::validation("already seated")),
            ClientAction::SetReady { ready } => {
                seating::set_ready(room, player_id, ready, config, rng)
            }
            ClientAction::VoteRule { rule, enabled } => {
                seating::vote_rule(room, player_id, rule, enabled)
            }
            ClientAction::RollDice => coordinator::roll_dice(room, player_id, config, rng),
            ClientAction::MoveToken { token_id } => {
                coordinator::move_token(room, player_id, token_id, config, rng)
            }
            ClientAction::UsePowerUp { target } => {
                coordinator::use_power_up(room, player_id, &target)
            }
            ClientAction::Leave => {
                let transition = seating::leave(room, player_id, config, rng)?;
                self.bindings.remove(&player_id);
                self.grace_timers.remove(&player_id);
                Ok(transition)
            }
        }
    }

    async fn disconnect(&mut self, conn_id: ConnectionId) {
        let Some(player_id) = self.bound_player(conn_id) else {
            return;
        };
        self.bindings.remove(&player_id);
        let result = seating::disconnect(&mut self.room, player_id, &self.config);
        let left = self.room.player(player_id).is_none_or(|p| p.left);
        self.commit_internal(result).await;
        if !left {
            self.start_grace(player_id);
        }
    }

    fn start_grace(&mut self, player_id: PlayerId) {
        self.grace_epoch = self.grace_epoch.wrapping_add(1);
        let epoch = self.grace_epoch;
        let delay = Duration::from_secs(self.config.timing.reconnect_grace_seconds);
        let tx = self.tx.clone();
        let grace = self.grace_timers.entry(player_id).or_default();
        grace.epoch = epoch;
        grace.timer.arm(async move {
            tokio::time::sleep(delay).await;
            send_weak(&tx, RoomCommand::GraceExpired { player_id, epoch }).await;
        });
    }

    async fn grace_expired(&mut self, player_id: PlayerId, epoch: u64) {
        if self
            .grace_timers
            .get(&player_id)
            .is_none_or(|g| g.epoch != epoch)
        {
            return;
        }
        self.grace_timers.remove(&player_id);
        let still_away = self
            .room
            .player(player_id)
            .is_some_and(|p| !p.connected && !p.left);
        if !still_away {
            return;
        }
        tracing::info!(room_id = %self.room.id, player_id = %player_id, "reconnect grace expired");
        let result = seating::leave(&mut self.room, player_id, &self.config, &mut self.rng);
        self.commit_internal(result).await;
    }

    // -----------------------------------------------------------------------
    // Fan-out
    // -----------------------------------------------------------------------

    fn broadcast(&self, event: &ServerEvent) {
        for conn in self.bindings.values() {
            conn.send(event.clone());
        }
    }

    fn reject(&self, conn: &ConnectionHandle, error: &EngineError) {
        tracing::debug!(room_id = %self.room.id, code = ?error.code(), "error sent");
        conn.send(ServerEvent::Error {
            code: error.code(),
            message: error.to_string(),
        });
    }

    /// Broadcast a transition, persist the room and arm its timers.
    async fn commit(&mut self, transition: Transition) {
        let clock_only = transition.is_clock_only();
        for event in &transition.events {
            self.broadcast(event);
        }
        if !clock_only {
            self.broadcast(&ServerEvent::StateSnapshot(Box::new(self.room.clone())));
            if let Err(e) = self.repo.save_room(&self.room).await {
                tracing::warn!(room_id = %self.room.id, error = %e, "failed to save room");
            }
        }
        for directive in transition.directives {
            self.apply_directive(directive);
        }
    }

    /// Commit the outcome of a server-initiated transition. Failures have no
    /// client to report to and are only logged.
    async fn commit_internal(&mut self, result: Result<Transition, EngineError>) {
        match result {
            Ok(transition) => self.commit(transition).await,
            Err(e) => {
                tracing::warn!(room_id = %self.room.id, error = %e, "internal transition failed");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    const fn next_turn_epoch(&mut self) -> u64 {
        self.turn_epoch = self.turn_epoch.wrapping_add(1);
        self.turn_epoch
    }

    fn needs_turn_clock(&self) -> bool {
        self.room.is_started()
            && !self.room.is_ended()
            && (self.room.rules.timed_moves
                || self.room.current_player().is_some_and(|p| !p.connected))
    }

    fn apply_directive(&mut self, directive: Directive) {
        match directive {
            Directive::RestartTurnTimer { .. } => {
                let epoch = self.next_turn_epoch();
                if !self.needs_turn_clock() {
                    self.turn_timer.cancel();
                    return;
                }
                let period = Duration::from_millis(self.config.timing.turn_tick_ms.max(1));
                let tx = self.tx.clone();
                self.turn_timer.arm(async move {
                    loop {
                        tokio::time::sleep(period).await;
                        if !send_weak(&tx, RoomCommand::TurnTick { epoch }).await {
                            break;
                        }
                    }
                });
            }
            Directive::ScheduleAutoSkip { delay_ms, .. } => {
                let epoch = self.next_turn_epoch();
                let tx = self.tx.clone();
                self.turn_timer.arm(async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    send_weak(&tx, RoomCommand::AutoSkip { epoch }).await;
                });
            }
            Directive::ScheduleRespawn { delay_ms } => {
                let tx = self.tx.clone();
                self.respawns.spawn(async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    send_weak(&tx, RoomCommand::Respawn).await;
                });
            }
            Directive::CancelAll => self.cancel_timers(),
        }
    }

    fn cancel_timers(&mut self) {
        self.next_turn_epoch();
        self.turn_timer.cancel();
        self.respawns.abort_all();
    }
}

/// Deliver a timer message if the room is still alive.
async fn send_weak(tx: &mpsc::WeakSender<RoomCommand>, command: RoomCommand) -> bool {
    let Some(tx) = tx.upgrade() else {
        return false;
    };
    tx.send(command).await.is_ok()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use ludo_types::{ErrorCode, RuleSet};

    use super::*;
    use crate::repository::InMemoryRepository;

    fn open(config: LudoConfig) -> (RoomHandle, Arc<InMemoryRepository>) {
        let repo = Arc::new(InMemoryRepository::new());
        let room = Room::new(RoomId::from("actor"), RuleSet::default());
        let handle = spawn_room(room, false, Arc::new(config), repo.clone());
        (handle, repo)
    }

    #[tokio::test]
    async fn join_sends_welcome_then_broadcasts() {
        let (handle, repo) = open(LudoConfig::default());
        let (conn, mut rx) = ConnectionHandle::open();
        let player_id = handle.join(conn, "ada".into(), None).await.unwrap();

        assert!(matches!(
            rx.recv().await,
            Some(ServerEvent::Welcome { player_id: id, .. }) if id == player_id
        ));
        assert!(matches!(rx.recv().await, Some(ServerEvent::PlayerJoined { .. })));
        assert!(matches!(rx.recv().await, Some(ServerEvent::StateSnapshot(_))));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn unbound_connection_is_rejected() {
        let (handle, _repo) = open(LudoConfig::default());
        let (seated, _seated_rx) = ConnectionHandle::open();
        handle.join(seated, "ada".into(), None).await.unwrap();

        let (stranger, mut rx) = ConnectionHandle::open();
        let err = handle
            .act(stranger, None, ClientAction::RollDice)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::SessionMismatch);
        assert!(matches!(
            rx.recv().await,
            Some(ServerEvent::Error {
                code: ErrorCode::SessionMismatch,
                ..
            })
        ));
    }

    fn started_actor() -> (RoomActor, mpsc::Sender<RoomCommand>) {
        let mut config = LudoConfig::default();
        config.rules.power_ups = false;
        config.rules.trap_zones = false;
        config.seed = Some(11);
        let mut room = Room::new(RoomId::from("actor"), config.rules.rule_set());
        let mut rng = StdRng::seed_from_u64(11);
        for name in ["ada", "bo"] {
            let joined = seating::join_player(&mut room, name, None, &config).unwrap();
            seating::set_ready(&mut room, joined.player_id, true, &config, &mut rng).unwrap();
        }
        assert!(room.is_started());
        RoomActor::new(
            room,
            Arc::new(config),
            Arc::new(InMemoryRepository::new()),
        )
    }

    async fn drain(actor: &mut RoomActor) {
        while let Ok(command) = actor.rx.try_recv() {
            actor.handle(command).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn previous_turn_clock_is_ignored_after_move() {
        let (mut actor, _tx) = started_actor();
        let ada = actor.room.players[0].id;
        let bo = actor.room.players[1].id;
        actor.apply_directive(Directive::RestartTurnTimer { player_id: ada });

        // Three beats of ada's clock are queued but not yet processed.
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        actor.room.players[0].tokens[0].position = 0;
        let token_id = actor.room.players[0].tokens[0].id;
        let config = Arc::clone(&actor.config);
        let rolled = coordinator::apply_roll(&mut actor.room, ada, 2, &config).unwrap();
        actor.commit(rolled).await;
        let moved =
            coordinator::move_token(&mut actor.room, ada, token_id, &config, &mut actor.rng)
                .unwrap();
        actor.commit(moved).await;
        assert_eq!(actor.room.current_player_id(), Some(bo));

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        drain(&mut actor).await;

        let limit = actor.room.rules.move_time_limit_seconds;
        assert_eq!(actor.room.current_player_id(), Some(bo));
        assert_eq!(actor.room.players[1].turn_time_remaining, limit - 2);
        assert_eq!(actor.room.players[0].turn_time_remaining, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_respawn_places_power_up() {
        let (mut actor, _tx) = started_actor();
        actor.room.rules.power_ups_enabled = true;
        actor.apply_directive(Directive::ScheduleRespawn { delay_ms: 1_000 });
        assert_eq!(actor.respawns.len(), 1);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let command = actor.rx.try_recv().unwrap();
        assert!(matches!(command, RoomCommand::Respawn));
        actor.handle(command).await;
        assert_eq!(actor.room.power_ups.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_aborts_pending_respawns() {
        let (mut actor, _tx) = started_actor();
        actor.room.rules.power_ups_enabled = true;
        actor.apply_directive(Directive::ScheduleRespawn { delay_ms: 1_000 });
        actor.apply_directive(Directive::ScheduleRespawn { delay_ms: 2_000 });
        actor.apply_directive(Directive::CancelAll);

        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert!(actor.rx.try_recv().is_err());
        assert!(actor.room.power_ups.is_empty());
        assert!(!actor.turn_timer.is_armed());
    }

    #[tokio::test]
    async fn failed_first_join_closes_room() {
        let (handle, _repo) = open(LudoConfig::default());
        let (conn, _rx) = ConnectionHandle::open();
        let err = handle.join(conn, "  ".into(), None).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
        assert!(matches!(
            handle.snapshot().await,
            Err(EngineError::RoomClosed(_))
        ));
        assert!(handle.is_closed());
    }
}
