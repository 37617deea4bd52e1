
use rebuscada_client::terminal::render_session;
use rebuscada_client::{ApiError, ClientError, Location, ResolveError};
use rebuscada_core::{GuessOutcome, SessionEvent, SessionKey, SessionPhase, SessionState, encode_custom_word};
use rebuscada_types::{GameStatusLabel, messages};
use test_helpers::*;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_daily_puzzle_resolution() {
    let setup = TestClientSetup::new();
    let mut tab = setup.tab(PAGE_URL);

    let phase = assert_ok!(tab.client.start().await);
    assert_eq!(phase, SessionPhase::Playing);

    let session = tab.client.session().unwrap();
    assert_eq!(session.key(), &SessionKey::new(DAILY_WORD, Some(DAILY_ID)));
    assert!(tab.events.has_event_type(|e| matches!(
        e,
        SessionEvent::PuzzleResolved { resumed: false, .. }
    )));
}

#[tokio::test]
async fn test_guesses_are_kept_sorted_by_rank() {
    let setup = TestClientSetup::new();
    let mut tab = setup.started_tab().await;

    submit_all(&mut tab.client, &["mar", "hora", "temps"]).await;

    assert_eq!(guessed_words(&tab.client), vec!["hora", "temps", "mar"]);
    let last = tab.client.session().unwrap().last_guess().unwrap();
    assert_eq!(last.word, "temps");
}

#[tokio::test]
async fn test_input_is_normalized_and_empty_input_ignored() {
    let setup = TestClientSetup::new();
    let mut tab = setup.started_tab().await;

    let outcome = assert_ok!(tab.client.submit_guess("   ").await);
    assert!(outcome.is_none());
    assert_eq!(setup.api.guess_count(), 0);

    assert_ok!(tab.client.submit_guess("  HORA ").await);
    let state = setup.api.state.lock().unwrap();
    assert_eq!(state.guess_requests[0].word, "hora");
    assert_eq!(state.guess_requests[0].context.puzzle.as_deref(), Some(DAILY_WORD));
    assert!(state.guess_requests[0].context.competition_id.is_none());
}

#[tokio::test]
async fn test_winning_disables_input() {
    let setup = TestClientSetup::new();
    let mut tab = setup.started_tab().await;

    submit_all(&mut tab.client, &["hora"]).await;
    let outcome = assert_ok!(tab.client.submit_guess("rellotge").await);
    assert!(matches!(outcome, Some(GuessOutcome::Accepted { won: true, .. })));
    assert_eq!(tab.client.phase(), SessionPhase::Won);
    assert!(tab.events.has_event_type(|e| matches!(
        e,
        SessionEvent::GameWon { attempts: 2, .. }
    )));

    let requests_before = setup.api.guess_count();
    assert!(matches!(
        tab.client.submit_guess("minut").await,
        Err(ClientError::GameOver)
    ));
    assert!(matches!(
        tab.client.request_hint().await,
        Err(ClientError::GameOver)
    ));
    assert!(matches!(
        tab.client.surrender().await,
        Err(ClientError::GameOver)
    ));
    assert_eq!(setup.api.guess_count(), requests_before);
    assert_eq!(ClientError::GameOver.to_string(), messages::GAME_OVER);
}

#[tokio::test]
async fn test_duplicate_canonical_form_is_not_added() {
    let setup = TestClientSetup::new();
    let mut tab = setup.started_tab().await;

    submit_all(&mut tab.client, &["gats"]).await;
    let outcome = assert_ok!(tab.client.submit_guess("gat").await);

    match outcome {
        Some(GuessOutcome::Duplicate { earlier, .. }) => assert_eq!(earlier, "gats"),
        other => panic!("Expected a duplicate, got {:?}", other),
    }
    assert_eq!(guessed_words(&tab.client), vec!["gats"]);
    assert!(tab.client.session().unwrap().error().is_some());
    assert!(tab.events.has_event_type(|e| matches!(e, SessionEvent::DuplicateGuess { .. })));
}

#[tokio::test]
async fn test_rejected_word_can_be_explained() {
    let setup = TestClientSetup::new();
    let mut tab = setup.started_tab().await;

    assert!(matches!(
        tab.client.why_not().await,
        Err(ClientError::NothingToExplain)
    ));

    let err = assert_err!(tab.client.submit_guess("xyzzy").await);
    assert!(matches!(err, ClientError::Api(ApiError::Rejected { .. })));

    let session = tab.client.session().unwrap();
    assert_eq!(session.phase(), SessionPhase::Playing);
    assert_eq!(session.rejected_word.as_deref(), Some("xyzzy"));
    assert!(session.error().unwrap().contains("xyzzy"));
    assert!(session.state.guesses.is_empty());

    let explanation = assert_ok!(tab.client.why_not().await);
    assert!(explanation.reason.contains("xyzzy"));
}

#[tokio::test]
async fn test_network_failure_reports_generic_message() {
    let setup = TestClientSetup::new();
    let mut tab = setup.started_tab().await;

    setup.api.set_network_down(true);
    let err = assert_err!(tab.client.submit_guess("hora").await);
    assert!(matches!(err, ClientError::Api(ApiError::Network(_))));

    let session = tab.client.session().unwrap();
    assert_eq!(session.error(), Some(messages::NETWORK_ERROR));
    assert!(session.rejected_word.is_none());
    assert_eq!(session.phase(), SessionPhase::Playing);

    setup.api.set_network_down(false);
    assert_ok!(tab.client.submit_guess("hora").await);
    assert_eq!(guessed_words(&tab.client), vec!["hora"]);
}

#[tokio::test]
async fn test_hint_sends_history_and_is_marked() {
    let setup = TestClientSetup::new();
    let mut tab = setup.started_tab().await;
    setup.api.push_hint("minut", 8);

    submit_all(&mut tab.client, &["temps"]).await;
    let outcome = assert_ok!(tab.client.request_hint().await);
    assert!(matches!(outcome, GuessOutcome::Accepted { won: false, .. }));

    let session = tab.client.session().unwrap();
    assert_eq!(session.state.hints_used, 1);
    assert_eq!(session.state.player_guess_count(), 1);
    assert!(session.state.guesses[0].is_hint);

    let state = setup.api.state.lock().unwrap();
    assert_eq!(state.hint_requests.len(), 1);
    assert_eq!(state.hint_requests[0].history.len(), 1);
    assert_eq!(state.hint_requests[0].history[0].word, "temps");
    drop(state);

    assert!(tab.events.has_event_type(|e| matches!(e, SessionEvent::HintRevealed { .. })));
}

#[tokio::test]
async fn test_surrender_reveals_solution_and_unlocks_ranking() {
    let setup = TestClientSetup::new();
    let mut tab = setup.started_tab().await;

    assert!(matches!(
        tab.client.ranking().await,
        Err(ClientError::GameInProgress)
    ));

    let solution = assert_ok!(tab.client.surrender().await);
    assert_eq!(solution, DAILY_WORD);
    assert_eq!(tab.client.phase(), SessionPhase::Surrendered);
    assert_eq!(
        tab.client.session().unwrap().state.solution.as_deref(),
        Some(DAILY_WORD)
    );

    let ranking = assert_ok!(tab.client.ranking().await);
    assert_eq!(ranking.ranking[0].rank, 0);

    // Surrendering with no guesses still counts as a played game
    let saved = tab
        .client
        .repository()
        .load(&SessionKey::new(DAILY_WORD, Some(DAILY_ID)))
        .await
        .unwrap();
    assert!(saved.surrendered);
}

#[tokio::test]
async fn test_future_game_redirects_to_default_page() {
    let setup = TestClientSetup::new();
    let mut tab = setup.tab("https://rebuscada.cat/?joc=L");

    let err = assert_err!(tab.client.start().await);
    assert!(matches!(
        err,
        ClientError::Resolve(ResolveError::FutureGame {
            requested: 50,
            current: DAILY_ID
        })
    ));
    assert!(tab.client.location().url().query().is_none());
    assert!(tab.client.session().is_none());
    assert!(tab.events.has_event_type(|e| matches!(e, SessionEvent::Redirected { .. })));

    // The default page plays the puzzle of the day
    assert_ok!(tab.client.resolve().await);
    assert_eq!(tab.client.session().unwrap().key().puzzle, DAILY_WORD);
}

#[tokio::test]
async fn test_published_game_and_unknown_game() {
    let setup = TestClientSetup::new();

    let mut tab = setup.tab("https://rebuscada.cat/?joc=XL");
    assert_ok!(tab.client.start().await);
    assert_eq!(
        tab.client.session().unwrap().key(),
        &SessionKey::new("cadira", Some(40))
    );

    setup.api.state.lock().unwrap().games.retain(|game| game.id != 41);
    let mut tab = setup.tab("https://rebuscada.cat/?joc=XLI");
    let err = assert_err!(tab.client.start().await);
    assert!(matches!(err, ClientError::Resolve(ResolveError::UnknownGame(41))));
}

#[tokio::test]
async fn test_invalid_roman_numeral_is_rejected() {
    let setup = TestClientSetup::new();
    let mut tab = setup.tab("https://rebuscada.cat/?joc=IIII");

    let err = assert_err!(tab.client.start().await);
    assert!(matches!(
        err,
        ClientError::Resolve(ResolveError::InvalidParameter(_))
    ));
}

#[tokio::test]
async fn test_custom_word_game() {
    let setup = TestClientSetup::new();
    let url = format!("{}?word={}", PAGE_URL, encode_custom_word("hora"));
    let mut tab = setup.tab(&url);

    assert_ok!(tab.client.start().await);
    let key = tab.client.session().unwrap().key().clone();
    assert_eq!(key, SessionKey::new("hora", None));
    assert_eq!(key.storage_id(), "paraula:hora");

    let url = format!("{}?word={}", PAGE_URL, encode_custom_word("zzz"));
    let mut tab = setup.tab(&url);
    let err = assert_err!(tab.client.start().await);
    assert!(matches!(
        err,
        ClientError::Resolve(ResolveError::CustomWordRejected(_))
    ));
}

#[tokio::test]
async fn test_custom_word_is_not_shown_while_playing() {
    let setup = TestClientSetup::new();
    let url = format!("{}?word={}", PAGE_URL, encode_custom_word("hora"));
    let mut tab = setup.tab(&url);
    assert_ok!(tab.client.start().await);
    submit_all(&mut tab.client, &["temps"]).await;

    let rendered = render_session(tab.client.session().unwrap());
    assert!(rendered.contains("paraula personalitzada"));
    assert!(!rendered.contains("hora"));
    assert!(tab.events.has_event_type(|e| matches!(
        e,
        SessionEvent::PuzzleResolved { key, .. } if !key.to_string().contains("hora")
    )));

    assert_ok!(tab.client.surrender().await);
    let rendered = render_session(tab.client.session().unwrap());
    assert!(rendered.contains("La paraula era «hora»"));
}

#[tokio::test]
async fn test_progress_is_restored_on_next_visit() {
    let setup = TestClientSetup::new();
    let mut first = setup.started_tab().await;
    submit_all(&mut first.client, &["temps", "hora"]).await;

    let mut second = setup.tab(PAGE_URL);
    assert_ok!(second.client.start().await);

    assert_eq!(guessed_words(&second.client), vec!["hora", "temps"]);
    assert!(second.events.has_event_type(|e| matches!(
        e,
        SessionEvent::PuzzleResolved { resumed: true, .. }
    )));
}

#[tokio::test]
async fn test_unavailable_storage_never_blocks_play() {
    let setup = TestClientSetup::new();
    setup.store.set_unavailable(true);

    let mut tab = setup.started_tab().await;
    submit_all(&mut tab.client, &["hora"]).await;
    assert_eq!(guessed_words(&tab.client), vec!["hora"]);

    setup.store.set_unavailable(false);
    assert!(setup.repository().list_sessions().await.is_empty());
}

#[tokio::test]
async fn test_restart_clears_saved_games() {
    let setup = TestClientSetup::new();
    let mut tab = setup.started_tab().await;
    submit_all(&mut tab.client, &["hora"]).await;
    assert_eq!(setup.repository().list_sessions().await.len(), 1);

    let phase = assert_ok!(tab.client.restart().await);
    assert_eq!(phase, SessionPhase::Playing);
    assert!(guessed_words(&tab.client).is_empty());
    assert!(setup.repository().list_sessions().await.is_empty());
    assert!(tab.events.has_event_type(|e| matches!(e, SessionEvent::SessionRestarted)));
    // Not in a competition, so nothing to confirm
    assert_eq!(setup.confirm.prompt_count(), 0);
}

#[tokio::test]
async fn test_backend_version_change_wipes_storage() {
    let setup = TestClientSetup::new();
    let repository = setup.repository();
    repository.set_api_version("0.9.0").await;
    let mut state = SessionState::new(SessionKey::new(DAILY_WORD, Some(DAILY_ID)));
    state.guesses.push(rebuscada_types::Guess {
        word: "hora".to_string(),
        canonical_form: None,
        rank: 3,
        total_words: TOTAL_WORDS,
        is_correct: false,
        is_hint: false,
    });
    repository.save(&state).await;

    let mut tab = setup.started_tab().await;

    assert!(guessed_words(&tab.client).is_empty());
    assert_eq!(repository.api_version().await.as_deref(), Some("1.0.0"));
    assert!(tab.events.has_event_type(|e| matches!(
        e,
        SessionEvent::StorageReset { version } if version == "1.0.0"
    )));

    // Same version on the next start keeps everything
    submit_all(&mut tab.client, &["hora"]).await;
    let second = setup.started_tab().await;
    assert_eq!(guessed_words(&second.client), vec!["hora"]);
    assert!(!second.events.has_event_type(|e| matches!(e, SessionEvent::StorageReset { .. })));
}

#[tokio::test]
async fn test_version_check_failure_is_not_fatal() {
    let setup = TestClientSetup::new();
    setup.repository().set_api_version("0.9.0").await;
    setup.api.set_network_down(true);

    let mut tab = setup.tab(PAGE_URL);
    tab.client.check_version().await;

    assert_eq!(setup.repository().api_version().await.as_deref(), Some("0.9.0"));
    assert!(!tab.events.has_event_type(|e| matches!(e, SessionEvent::StorageReset { .. })));
}

#[tokio::test]
async fn test_previous_games_list() {
    let setup = TestClientSetup::new();
    let mut tab = setup.started_tab().await;

    assert_ok!(tab.client.open_game(41).await);
    assert_eq!(tab.client.location().param("joc").as_deref(), Some("XLI"));
    submit_all(&mut tab.client, &["hora", "finestra"]).await;

    assert_ok!(tab.client.open_game(40).await);
    assert_ok!(tab.client.surrender().await);

    let games = assert_ok!(tab.client.previous_games().await);
    let summary: Vec<_> = games
        .iter()
        .map(|game| (game.roman.as_str(), game.status, game.guess_count))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("XLII", GameStatusLabel::InProgress, 0),
            ("XLI", GameStatusLabel::Found, 2),
            ("XL", GameStatusLabel::Abandoned, 0),
        ]
    );
}

#[tokio::test]
async fn test_previous_games_skip_unpublished() {
    let setup = TestClientSetup::new();
    setup.api.state.lock().unwrap().current_game_id = 41;
    let tab = setup.tab(PAGE_URL);

    let games = assert_ok!(tab.client.previous_games().await);
    let ids: Vec<_> = games.iter().map(|game| game.id).collect();
    assert_eq!(ids, vec![41, 40]);
}

#[tokio::test]
async fn test_open_default_returns_to_daily() {
    let setup = TestClientSetup::new();
    let mut tab = setup.tab("https://rebuscada.cat/?joc=XL");
    assert_ok!(tab.client.start().await);

    assert_ok!(tab.client.open_default().await);
    assert!(tab.client.location().url().query().is_none());
    assert_eq!(tab.client.session().unwrap().key().game_id, Some(DAILY_ID));
}

#[tokio::test]
async fn test_share_link_encodes_word() {
    let setup = TestClientSetup::new();
    let tab = setup.started_tab().await;

    let link = tab.client.share_link("  Hora ").unwrap();
    let shared = Location::parse(&link).unwrap();
    assert_eq!(shared.param("word"), Some(encode_custom_word("hora")));
    assert_eq!(shared.url().path(), "/");
    assert!(tab.client.share_link("   ").is_none());
}

#[tokio::test]
async fn test_hint_on_solution_wins() {
    let setup = TestClientSetup::new();
    let mut tab = setup.started_tab().await;
    setup.api.push_hint(DAILY_WORD, 0);

    let outcome = assert_ok!(tab.client.request_hint().await);
    assert!(matches!(outcome, GuessOutcome::Accepted { won: true, .. }));
    assert_eq!(tab.client.phase(), SessionPhase::Won);
    assert!(tab.events.has_event_type(|e| matches!(e, SessionEvent::GameWon { .. })));
}
