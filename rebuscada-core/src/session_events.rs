use rebuscada_types::{Guess, PlayerStanding};

use crate::SessionKey;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PuzzleResolved {
        key: SessionKey,
        resumed: bool,
    },
    GuessAccepted {
        key: SessionKey,
        guess: Guess,
    },
    HintRevealed {
        key: SessionKey,
        guess: Guess,
    },
    DuplicateGuess {
        key: SessionKey,
        word: String,
        message: String,
    },
    GuessRejected {
        key: SessionKey,
        word: String,
        message: String,
    },
    RequestFailed {
        message: String,
    },
    GameWon {
        key: SessionKey,
        attempts: usize,
    },
    GameSurrendered {
        key: SessionKey,
        solution: String,
    },
    SessionRestarted,
    SessionAdopted {
        key: SessionKey,
    },
    StorageReset {
        version: String,
    },
    Redirected {
        url: String,
    },
    CompetitionJoined {
        competition_id: String,
        puzzle: String,
    },
    CompetitionLeft {
        competition_id: String,
    },
    CompetitionExpired {
        competition_id: String,
        message: String,
    },
    StandingsUpdated {
        competition_id: String,
        standings: Vec<PlayerStanding>,
    },
}

impl SessionEvent {
    pub fn session_key(&self) -> Option<&SessionKey> {
        match self {
            SessionEvent::PuzzleResolved { key, .. }
            | SessionEvent::GuessAccepted { key, .. }
            | SessionEvent::HintRevealed { key, .. }
            | SessionEvent::DuplicateGuess { key, .. }
            | SessionEvent::GuessRejected { key, .. }
            | SessionEvent::GameWon { key, .. }
            | SessionEvent::GameSurrendered { key, .. }
            | SessionEvent::SessionAdopted { key } => Some(key),
            _ => None,
        }
    }
}

/// Event handler trait for anything rendering or recording session events
pub trait SessionEventHandler: Send {
    fn handle_event(&mut self, event: SessionEvent);
}

/// Simple event bus for distributing session events
pub struct SessionEventBus {
    handlers: Vec<Box<dyn SessionEventHandler>>,
}

impl SessionEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn SessionEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn publish(&mut self, event: SessionEvent) {
        tracing::debug!(?event, "session event");
        for handler in &mut self.handlers {
            handler.handle_event(event.clone());
        }
    }
}

impl Default for SessionEventBus {
    fn default() -> Self {
        Self::new()
    }
}
