use std::time::{Duration, Instant};

use crate::message::{ClientMessage, ServerMessage, Stroke};
use crate::types::{ConnectionId, Millis, DRAWER_PLACEHOLDER, TURN_ENDED_NOTICE};

pub const DEFAULT_TURN_DURATION: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    EveryoneExcept(ConnectionId),
    Only(ConnectionId),
}

impl Audience {
    pub fn includes(&self, connection_id: ConnectionId) -> bool {
        match *self {
            Audience::Everyone => true,
            Audience::EveryoneExcept(excluded) => excluded != connection_id,
            Audience::Only(target) => target == connection_id,
        }
    }
}

/// A message the arbiter wants delivered, and to whom.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub audience: Audience,
    pub message: ServerMessage,
}

impl Delivery {
    fn new(audience: Audience, message: ServerMessage) -> Self {
        Self { audience, message }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Nobody is drawing and the cooldown has elapsed.
    Idle,
    Cooldown { remaining: Duration },
    Active { drawer: ConnectionId },
}

/// Decides who may draw.
///
/// Holds the only shared session state: the current drawer and the moment
/// the last turn ended. `turn_ended_at` is also stamped when a turn starts,
/// so while a turn is active it marks the start of that turn.
///
/// An active turn is never revoked by time. The duration only bounds the
/// cooldown that follows a drawer leaving.
#[derive(Debug)]
pub struct TurnArbiter {
    turn_duration: Duration,
    current_drawer: Option<ConnectionId>,
    turn_ended_at: Option<Instant>,
}

impl TurnArbiter {
    pub fn new(turn_duration: Duration) -> Self {
        Self {
            turn_duration,
            current_drawer: None,
            turn_ended_at: None,
        }
    }

    pub fn turn_duration(&self) -> Duration {
        self.turn_duration
    }

    pub fn current_drawer(&self) -> Option<ConnectionId> {
        self.current_drawer
    }

    pub fn state(&self, now: Instant) -> TurnState {
        if let Some(drawer) = self.current_drawer {
            return TurnState::Active { drawer };
        }
        let remaining = self.remaining(now);
        if remaining > Duration::from_millis(0) {
            TurnState::Cooldown { remaining }
        } else {
            TurnState::Idle
        }
    }

    /// Greeting for a freshly opened connection.
    pub fn connect(&self, now: Instant) -> ServerMessage {
        let active = self.current_drawer.is_some();
        ServerMessage::Init {
            can_draw: !active,
            time_left: if active {
                as_millis(self.remaining(now))
            } else {
                0
            },
            drawer: if active {
                Some(DRAWER_PLACEHOLDER.to_owned())
            } else {
                None
            },
        }
    }

    pub fn handle(
        &mut self,
        from: ConnectionId,
        message: ClientMessage,
        now: Instant,
    ) -> Vec<Delivery> {
        match message {
            ClientMessage::RequestTurn => self.request_turn(from, now),
            ClientMessage::Draw {
                x0,
                y0,
                x1,
                y1,
                color,
            } => self.draw(from, Stroke::new(x0, y0, x1, y1, color)),
            ClientMessage::Clear => self.clear(from),
        }
    }

    pub fn request_turn(&mut self, from: ConnectionId, now: Instant) -> Vec<Delivery> {
        match self.state(now) {
            TurnState::Idle => {
                self.current_drawer = Some(from);
                self.turn_ended_at = Some(now);
                log::info!("Connection {} took the turn", from);

                let duration = as_millis(self.turn_duration);
                vec![
                    Delivery::new(
                        Audience::Everyone,
                        ServerMessage::NewTurn {
                            drawer: DRAWER_PLACEHOLDER.to_owned(),
                            time_left: duration,
                        },
                    ),
                    Delivery::new(Audience::Only(from), ServerMessage::YourTurn { duration }),
                ]
            }
            TurnState::Active { .. } | TurnState::Cooldown { .. } => {
                log::debug!("Rejected turn request from connection {}", from);
                vec![Delivery::new(
                    Audience::Only(from),
                    ServerMessage::TurnInfo {
                        can_draw: false,
                        time_left: as_millis(self.remaining(now)),
                    },
                )]
            }
        }
    }

    pub fn draw(&self, from: ConnectionId, stroke: Stroke) -> Vec<Delivery> {
        if !self.is_drawer(from) {
            log::debug!("Ignored draw from non-drawer {}", from);
            return Vec::new();
        }
        vec![Delivery::new(
            Audience::EveryoneExcept(from),
            ServerMessage::Draw(stroke),
        )]
    }

    pub fn clear(&self, from: ConnectionId) -> Vec<Delivery> {
        if !self.is_drawer(from) {
            log::debug!("Ignored clear from non-drawer {}", from);
            return Vec::new();
        }
        vec![Delivery::new(Audience::Everyone, ServerMessage::Clear)]
    }

    /// Must be called after `from` has left the registry, so the notice only
    /// reaches the remaining connections.
    pub fn disconnect(&mut self, from: ConnectionId, now: Instant) -> Vec<Delivery> {
        if !self.is_drawer(from) {
            return Vec::new();
        }
        self.current_drawer = None;
        self.turn_ended_at = Some(now);
        log::info!("Drawer {} left, cooldown started", from);

        vec![Delivery::new(
            Audience::Everyone,
            ServerMessage::TurnEnded {
                message: TURN_ENDED_NOTICE.to_owned(),
            },
        )]
    }

    fn is_drawer(&self, connection_id: ConnectionId) -> bool {
        self.current_drawer == Some(connection_id)
    }

    /// Time left of `turn_duration` measured from `turn_ended_at`.
    fn remaining(&self, now: Instant) -> Duration {
        match self.turn_ended_at {
            Some(at) => self
                .turn_duration
                .checked_sub(now.saturating_duration_since(at))
                .unwrap_or_default(),
            None => Duration::from_millis(0),
        }
    }
}

impl Default for TurnArbiter {
    fn default() -> Self {
        Self::new(DEFAULT_TURN_DURATION)
    }
}

fn as_millis(duration: Duration) -> Millis {
    duration.as_millis() as Millis
}
