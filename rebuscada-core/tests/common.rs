#![allow(dead_code)]

use rebuscada_core::{Session, SessionEvent, SessionEventHandler, SessionKey};
use rebuscada_types::Guess;
use std::sync::{Arc, Mutex};

/// Creates a ranked guess; rank 0 is the exact answer
pub fn create_test_guess(word: &str, rank: u32) -> Guess {
    Guess {
        word: word.to_string(),
        canonical_form: None,
        rank,
        total_words: 10_000,
        is_correct: rank == 0,
        is_hint: false,
    }
}

/// Creates a guess whose canonical form differs from the typed word
pub fn create_inflected_guess(word: &str, canonical: &str, rank: u32) -> Guess {
    Guess {
        canonical_form: Some(canonical.to_string()),
        ..create_test_guess(word, rank)
    }
}

pub fn create_test_hint(word: &str, rank: u32) -> Guess {
    Guess {
        is_hint: true,
        ..create_test_guess(word, rank)
    }
}

/// A session for published game number 12
pub fn create_standard_session() -> Session {
    Session::new(SessionKey::new("rellotge", Some(12)))
}

/// A session that already holds the given guesses
pub fn create_session_with_guesses(guesses: &[(&str, u32)]) -> Session {
    let mut session = create_standard_session();
    for (word, rank) in guesses {
        session
            .apply_guess(create_test_guess(word, *rank))
            .expect("Session should accept guesses");
    }
    session
}

pub fn assert_sorted_by_rank(session: &Session) {
    let ranks: Vec<u32> = session.state.guesses.iter().map(|g| g.rank).collect();
    assert!(
        ranks.windows(2).all(|pair| pair[0] <= pair[1]),
        "Guesses not sorted by rank: {:?}",
        ranks
    );
}

/// Event collector for testing event emissions
#[derive(Clone)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn has_event_type(&self, check_fn: impl Fn(&SessionEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(check_fn)
    }
}

impl SessionEventHandler for EventCollector {
    fn handle_event(&mut self, event: SessionEvent) {
        self.events.lock().unwrap().push(event);
    }
}
