//! What a state transition produced: events to broadcast and timer
//! directives for the room actor.
//!
//! The coordinator never touches a clock. It describes the timers the room
//! needs and leaves arming, cancelling and epoch bookkeeping to the actor.

use ludo_types::{PlayerId, ServerEvent};

/// A timer instruction for the room actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Cancel the running turn timer and start a fresh countdown for the
    /// current player if the room needs one.
    RestartTurnTimer {
        /// Whose turn the clock belongs to.
        player_id: PlayerId,
    },
    /// Replace the turn timer with a one-shot skip of a turn that has no
    /// legal move.
    ScheduleAutoSkip {
        /// Whose turn will be skipped.
        player_id: PlayerId,
        /// Delay before the skip fires.
        delay_ms: u64,
    },
    /// Spawn a replacement power-up later.
    ScheduleRespawn {
        /// Delay before the spawn.
        delay_ms: u64,
    },
    /// Stop every game timer; the game is over.
    CancelAll,
}

/// Events and directives produced by one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    /// Events in emission order.
    pub events: Vec<ServerEvent>,
    /// Timer directives in application order.
    pub directives: Vec<Directive>,
}

impl Transition {
    /// An empty transition.
    pub const fn new() -> Self {
        Self {
            events: Vec::new(),
            directives: Vec::new(),
        }
    }

    /// Append an event.
    pub fn emit(&mut self, event: ServerEvent) {
        self.events.push(event);
    }

    /// Append a directive.
    pub fn direct(&mut self, directive: Directive) {
        self.directives.push(directive);
    }

    /// Append everything another transition produced.
    pub fn merge(&mut self, other: Self) {
        self.events.extend(other.events);
        self.directives.extend(other.directives);
    }

    /// Whether nothing beyond the turn clock countdown happened. Such
    /// transitions are not worth persisting.
    pub fn is_clock_only(&self) -> bool {
        self.directives.is_empty()
            && self
                .events
                .iter()
                .all(|e| matches!(e, ServerEvent::TurnClock { .. }))
    }
}
