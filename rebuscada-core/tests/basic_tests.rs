mod common;

use common::*;
use rebuscada_core::{
    GuessOutcome, PuzzleRequest, SessionEvent, SessionEventBus, SessionPhase, SessionState,
    encode_custom_word, from_roman, parse_puzzle_request, to_roman,
};

#[test]
fn test_session_creation() {
    let session = create_standard_session();
    assert_eq!(session.phase(), SessionPhase::Playing);
    assert!(session.state.guesses.is_empty());
    assert_eq!(session.key().storage_id(), "joc:12");
}

#[test]
fn test_sorted_after_every_insertion() {
    let mut session = create_standard_session();
    let ranks = [812, 3, 45, 3, 2048, 17, 1, 999, 45, 260];
    for (i, rank) in ranks.iter().enumerate() {
        let word = format!("paraula{}", i);
        session.apply_guess(create_test_guess(&word, *rank)).unwrap();
        assert_sorted_by_rank(&session);
        assert_eq!(session.state.guesses.len(), i + 1);
    }
}

#[test]
fn test_tried_forms_track_guesses() {
    let mut session = create_session_with_guesses(&[("hora", 40), ("minut", 22)]);
    session
        .apply_guess(create_inflected_guess("segons", "segon", 30))
        .unwrap();

    let expected: Vec<String> = session
        .state
        .guesses
        .iter()
        .map(|g| g.tried_form().to_string())
        .collect();
    assert_eq!(session.state.tried_forms.len(), expected.len());
    for form in expected {
        assert!(session.state.tried_forms.contains(&form));
    }
}

#[test]
fn test_duplicate_leaves_list_unchanged() {
    let mut session = create_session_with_guesses(&[("hora", 40)]);
    let before = session.state.guesses.clone();

    let outcome = session
        .apply_guess(create_inflected_guess("hores", "hora", 40))
        .unwrap();
    assert!(matches!(outcome, GuessOutcome::Duplicate { .. }));
    assert_eq!(session.state.guesses, before);
}

#[test]
fn test_hint_at_rank_zero_wins() {
    let mut session = create_session_with_guesses(&[("hora", 40)]);
    session.apply_guess(create_test_hint("rellotge", 0)).unwrap();
    assert_eq!(session.phase(), SessionPhase::Won);
    assert_eq!(session.state.hints_used, 1);
    assert!(session.ensure_playing().is_err());
}

#[test]
fn test_saved_state_normalizes_on_load() {
    let mut state = SessionState::new(create_standard_session().key().clone());
    state.guesses.push(create_test_guess("any", 300));
    state.guesses.push(create_test_guess("hora", 4));
    // tried_forms deliberately left empty

    let session = rebuscada_core::Session::from_state(state);
    assert_sorted_by_rank(&session);
    assert!(session.state.tried_forms.contains("any"));
    assert!(session.state.tried_forms.contains("hora"));
}

#[test]
fn test_roman_game_ids() {
    assert_eq!(to_roman(1994).unwrap(), "MCMXCIV");
    assert_eq!(from_roman("MCMXCIV").unwrap(), 1994);
    assert_eq!(
        parse_puzzle_request(vec![("joc", "XLII")]).unwrap(),
        PuzzleRequest::Game(42)
    );
}

#[test]
fn test_custom_word_parameter() {
    let encoded = encode_custom_word("rellotge");
    assert_eq!(
        parse_puzzle_request(vec![("word", encoded.as_str())]).unwrap(),
        PuzzleRequest::CustomWord("rellotge".to_string())
    );
}

#[test]
fn test_event_collection() {
    let collector = EventCollector::new();
    let mut bus = SessionEventBus::new();
    bus.add_handler(Box::new(collector.clone()));

    bus.publish(SessionEvent::SessionRestarted);
    bus.publish(SessionEvent::RequestFailed {
        message: "xarxa".to_string(),
    });

    assert_eq!(collector.event_count(), 2);
    assert!(collector.has_event_type(|e| matches!(e, SessionEvent::RequestFailed { .. })));
    assert!(matches!(collector.get_events()[0], SessionEvent::SessionRestarted));
}
