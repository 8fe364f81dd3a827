//! Reconnection state machine.
//!
//! The supervisor owns no I/O. The connection loop feeds it events and
//! performs the [`Action`] it returns. Each connect attempt gets a fresh
//! generation number; events tagged with an older generation are stale and
//! ignored, so only one attempt is ever outstanding.

use std::time::Duration;

use slidesync_common::Role;

use crate::backoff::BackoffPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Input to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorEvent {
    Start,
    /// The transport for this attempt is open.
    Connected { generation: u64 },
    /// The attempt failed, timed out, or its live connection dropped.
    Dropped { generation: u64 },
    /// The backoff delay scheduled after `generation` has elapsed.
    TimerElapsed { generation: u64 },
}

/// What the connection loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Connect { generation: u64 },
    /// Announce the role on the freshly opened transport.
    Join(Role),
    RetryAfter { generation: u64, delay: Duration },
}

pub struct Supervisor<B> {
    role: Role,
    state: ConnectionState,
    generation: u64,
    backoff: B,
}

impl<B: BackoffPolicy> Supervisor<B> {
    pub fn new(role: Role, backoff: B) -> Self {
        Self {
            role,
            state: ConnectionState::Disconnected,
            generation: 0,
            backoff,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn handle(&mut self, event: SupervisorEvent) -> Option<Action> {
        match (self.state, event) {
            (ConnectionState::Disconnected, SupervisorEvent::Start) => Some(self.begin_attempt()),
            (ConnectionState::Disconnected, SupervisorEvent::TimerElapsed { generation })
                if generation == self.generation =>
            {
                Some(self.begin_attempt())
            }
            (ConnectionState::Connecting, SupervisorEvent::Connected { generation })
                if generation == self.generation =>
            {
                self.state = ConnectionState::Connected;
                self.backoff.reset();
                Some(Action::Join(self.role))
            }
            (
                ConnectionState::Connecting | ConnectionState::Connected,
                SupervisorEvent::Dropped { generation },
            ) if generation == self.generation => {
                self.state = ConnectionState::Disconnected;
                Some(Action::RetryAfter {
                    generation,
                    delay: self.backoff.next_delay(),
                })
            }
            _ => None,
        }
    }

    fn begin_attempt(&mut self) -> Action {
        self.generation += 1;
        self.state = ConnectionState::Connecting;
        Action::Connect {
            generation: self.generation,
        }
    }
}
