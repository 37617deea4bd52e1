use std::sync::Arc;

use rebuscada_core::{
    GuessOutcome, ResolvedPuzzle, Session, SessionEvent, SessionEventBus,
    SessionEventHandler, SessionKey, SessionPhase, normalize_guess, status_label, to_roman,
};
use rebuscada_persistence::SessionRepository;
use rebuscada_types::{
    CompetitionInfo, GameNumber, GameSummary, Guess, GuessRequest, HintRequest, PlayContext,
    PlayerStanding, RankingResponse, SurrenderRequest, WhyNotRequest, WhyNotResponse,
};

use crate::api::GameApi;
use crate::competition::{CompetitionOverlay, Confirm};
use crate::error::{ApiError, ClientError, ResolveError};
use crate::location::Location;
use crate::push::PushConnector;
use crate::resolver::{PuzzleResolver, Resolution};

pub(crate) const LEAVE_PROMPT: &str =
    "Ets en una competició. Si continues, la deixaràs. Vols continuar?";

/// Drives one game session against the backend: resolution, guesses, hints,
/// surrender, persistence and the competition overlay. Every operation takes
/// `&mut self`, so two requests can never be in flight at once.
pub struct GameClient {
    pub(crate) api: Arc<dyn GameApi>,
    pub(crate) push: Arc<dyn PushConnector>,
    pub(crate) confirm: Arc<dyn Confirm>,
    pub(crate) repository: SessionRepository,
    pub(crate) location: Location,
    pub(crate) player_name: Option<String>,
    pub(crate) session: Option<Session>,
    pub(crate) competition: Option<CompetitionOverlay>,
    events: SessionEventBus,
}

impl GameClient {
    pub fn new(
        api: Arc<dyn GameApi>,
        push: Arc<dyn PushConnector>,
        confirm: Arc<dyn Confirm>,
        repository: SessionRepository,
        location: Location,
    ) -> Self {
        Self {
            api,
            push,
            confirm,
            repository,
            location,
            player_name: None,
            session: None,
            competition: None,
            events: SessionEventBus::new(),
        }
    }

    pub fn with_player_name(mut self, player_name: Option<String>) -> Self {
        self.player_name = player_name;
        self
    }

    pub fn add_event_handler(&mut self, handler: Box<dyn SessionEventHandler>) {
        self.events.add_handler(handler);
    }

    pub(crate) fn publish(&mut self, event: SessionEvent) {
        self.events.publish(event);
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.session
            .as_ref()
            .map(Session::phase)
            .unwrap_or(SessionPhase::Idle)
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn repository(&self) -> &SessionRepository {
        &self.repository
    }

    pub fn player_name(&self) -> Option<&str> {
        self.player_name.as_deref()
    }

    pub fn competition(&self) -> Option<&CompetitionInfo> {
        self.competition.as_ref().map(|overlay| &overlay.info)
    }

    pub fn standings(&self) -> &[PlayerStanding] {
        self.competition
            .as_ref()
            .map(|overlay| overlay.board.standings())
            .unwrap_or(&[])
    }

    /// Version check, then puzzle resolution and hydration
    pub async fn start(&mut self) -> Result<SessionPhase, ClientError> {
        self.check_version().await;
        self.resolve().await
    }

    /// Saved data written against another backend version is discarded
    pub async fn check_version(&mut self) {
        let version = match self.api.version().await {
            Ok(response) => response.version,
            Err(err) => {
                tracing::warn!("Version check failed: {}", err);
                return;
            }
        };

        match self.repository.api_version().await {
            Some(stored) if stored == version => return,
            Some(stored) => {
                tracing::info!(
                    "Backend version changed from {} to {}, discarding saved games",
                    stored,
                    version
                );
                self.repository.wipe().await;
                self.publish(SessionEvent::StorageReset {
                    version: version.clone(),
                });
            }
            None => {}
        }
        self.repository.set_api_version(&version).await;
    }

    /// Resolve the puzzle named by the page address and load its saved state
    pub async fn resolve(&mut self) -> Result<SessionPhase, ClientError> {
        // A competition found expired is dropped from the address, so the
        // second pass always resolves something else
        for _ in 0..2 {
            let resolution = PuzzleResolver::new(self.api.as_ref(), &self.repository)
                .resolve(&mut self.location)
                .await;

            let resolution = match resolution {
                Ok(resolution) => resolution,
                Err(err) => {
                    if matches!(err, ResolveError::FutureGame { .. }) {
                        let url = self.location.to_string();
                        self.publish(SessionEvent::Redirected { url });
                    }
                    tracing::info!("Puzzle resolution failed: {}", err);
                    self.session = None;
                    return Err(err.into());
                }
            };

            let result = match resolution {
                Resolution::Ready {
                    puzzle,
                    expired_competition,
                } => {
                    if let Some(competition_id) = expired_competition {
                        self.teardown_competition(&competition_id, true).await;
                    }
                    self.activate(puzzle).await
                }
                Resolution::CompetitionPending(competition_id) => {
                    let Some(player_name) = self.player_name.clone() else {
                        self.session = None;
                        return Err(ClientError::NameRequired(Some(competition_id)));
                    };
                    self.join_inner(&competition_id, player_name)
                        .await
                        .map(|_| self.phase())
                }
            };

            match result {
                Err(ClientError::CompetitionExpired(_)) => continue,
                other => return other,
            }
        }
        Err(ClientError::NoPuzzle)
    }

    async fn activate(&mut self, resolved: ResolvedPuzzle) -> Result<SessionPhase, ClientError> {
        let key = resolved.session_key();
        let saved = self.repository.load(&key).await;
        let resumed = saved.is_some();
        let session = match saved {
            Some(state) => Session::from_state(state),
            None => Session::new(key.clone()),
        };

        tracing::info!(
            "Playing {} ({:?}{})",
            key,
            resolved.source,
            if resumed { ", resumed" } else { "" }
        );
        self.session = Some(session);
        self.publish(SessionEvent::PuzzleResolved { key, resumed });

        if let Some(competition_id) = resolved.competition_id {
            self.resume_competition(&competition_id).await?;
        }
        Ok(self.phase())
    }

    /// Key of the active session, refusing when the game is already over
    fn playable_key(&self) -> Result<SessionKey, ClientError> {
        let session = self.session.as_ref().ok_or(ClientError::NoPuzzle)?;
        session
            .ensure_playing()
            .map_err(|_| ClientError::GameOver)?;
        Ok(session.key().clone())
    }

    pub(crate) fn play_context(&self, key: &SessionKey) -> PlayContext {
        let player_name = key.competition_id.as_ref().and_then(|_| {
            self.competition
                .as_ref()
                .map(|overlay| overlay.info.player_name.clone())
        });
        PlayContext {
            puzzle: Some(key.puzzle.clone()),
            competition_id: key.competition_id.clone(),
            player_name,
        }
    }

    pub(crate) async fn save(&self) {
        if let Some(session) = &self.session {
            self.repository.save(&session.state).await;
        }
    }

    /// Submit raw input as a guess. Empty input does nothing.
    pub async fn submit_guess(&mut self, input: &str) -> Result<Option<GuessOutcome>, ClientError> {
        let Some(word) = normalize_guess(input) else {
            return Ok(None);
        };
        let key = self.playable_key()?;
        let request = GuessRequest {
            word: word.clone(),
            context: self.play_context(&key),
        };

        match self.api.guess(&request).await {
            Ok(response) => self.record(response.into_guess(false)).await.map(Some),
            Err(err) => Err(self.request_failed(&key, Some(&word), err).await),
        }
    }

    pub async fn request_hint(&mut self) -> Result<GuessOutcome, ClientError> {
        let key = self.playable_key()?;
        let history = self
            .session
            .as_ref()
            .map(|session| session.state.history())
            .unwrap_or_default();
        let request = HintRequest {
            history,
            context: self.play_context(&key),
        };

        match self.api.hint(&request).await {
            Ok(response) => self.record(response.into_guess(true)).await,
            Err(err) => Err(self.request_failed(&key, None, err).await),
        }
    }

    /// Give up; returns the solution
    pub async fn surrender(&mut self) -> Result<String, ClientError> {
        let key = self.playable_key()?;
        let request = SurrenderRequest {
            context: self.play_context(&key),
        };

        let response = match self.api.surrender(&request).await {
            Ok(response) => response,
            Err(err) => return Err(self.request_failed(&key, None, err).await),
        };

        let session = self.session.as_mut().ok_or(ClientError::NoPuzzle)?;
        session
            .apply_surrender(response.solution.clone())
            .map_err(|_| ClientError::GameOver)?;
        tracing::info!("Surrendered {}", key);

        self.publish(SessionEvent::GameSurrendered {
            key,
            solution: response.solution.clone(),
        });
        self.save().await;
        Ok(response.solution)
    }

    async fn record(&mut self, guess: Guess) -> Result<GuessOutcome, ClientError> {
        let session = self.session.as_mut().ok_or(ClientError::NoPuzzle)?;
        let is_hint = guess.is_hint;
        let outcome = session
            .apply_guess(guess)
            .map_err(|_| ClientError::GameOver)?;
        let key = session.key().clone();
        let attempts = session.state.guesses.len();

        match &outcome {
            GuessOutcome::Accepted { guess, won } => {
                let event = if is_hint {
                    SessionEvent::HintRevealed {
                        key: key.clone(),
                        guess: guess.clone(),
                    }
                } else {
                    SessionEvent::GuessAccepted {
                        key: key.clone(),
                        guess: guess.clone(),
                    }
                };
                self.publish(event);
                if *won {
                    tracing::info!("Solved {} in {} attempts", key, attempts);
                    self.publish(SessionEvent::GameWon { key, attempts });
                }
            }
            GuessOutcome::Duplicate { word, message, .. } => {
                self.publish(SessionEvent::DuplicateGuess {
                    key,
                    word: word.clone(),
                    message: message.clone(),
                });
            }
        }

        self.save().await;
        Ok(outcome)
    }

    /// Record a failed request on the session. A competition the backend no
    /// longer knows is torn down and the client goes back to single player.
    async fn request_failed(
        &mut self,
        key: &SessionKey,
        word: Option<&str>,
        err: ApiError,
    ) -> ClientError {
        if let Some(competition_id) = key.competition_id.as_ref().filter(|_| err.is_not_found()) {
            if self.competition_is_gone(competition_id).await {
                self.teardown_competition(competition_id, true).await;
                self.return_to_single_player().await;
                return ClientError::CompetitionExpired(competition_id.clone());
            }
        }

        let message = err.user_message();
        let event = match (self.session.as_mut(), word) {
            (Some(session), Some(word)) if err.is_rejection() => {
                session.apply_rejection(word, message.clone());
                SessionEvent::GuessRejected {
                    key: key.clone(),
                    word: word.to_string(),
                    message,
                }
            }
            (session, _) => {
                if let Some(session) = session {
                    session.apply_failure(message.clone());
                }
                if !err.is_rejection() {
                    tracing::warn!("Request for {} failed: {}", key, err);
                }
                SessionEvent::RequestFailed { message }
            }
        };
        self.publish(event);
        err.into()
    }

    /// A 404 on a play request may be about the word; only the competition
    /// lookup itself tells whether the competition is gone.
    async fn competition_is_gone(&self, competition_id: &str) -> bool {
        match self.api.competition_state(competition_id).await {
            Err(err) if err.is_not_found() => true,
            Err(err) => {
                tracing::warn!("Could not check competition {}: {}", competition_id, err);
                false
            }
            Ok(_) => false,
        }
    }

    /// Forget every saved game and resolve again from scratch
    pub async fn restart(&mut self) -> Result<SessionPhase, ClientError> {
        self.confirm_leave().await?;
        self.repository.clear().await;
        self.session = None;
        tracing::info!("Restarting");
        self.publish(SessionEvent::SessionRestarted);
        self.resolve().await
    }

    /// Switch to a published game by number
    pub async fn open_game(&mut self, game_id: GameNumber) -> Result<SessionPhase, ClientError> {
        self.confirm_leave().await?;
        self.location
            .select_game(game_id)
            .map_err(|e| ResolveError::InvalidParameter(e.to_string()))?;
        self.resolve().await
    }

    /// Back to the default page, which plays the puzzle of the day
    pub async fn open_default(&mut self) -> Result<SessionPhase, ClientError> {
        self.confirm_leave().await?;
        self.location.redirect_to_default();
        self.resolve().await
    }

    /// Explanation for the last word the backend refused
    pub async fn why_not(&self) -> Result<WhyNotResponse, ClientError> {
        let session = self.session.as_ref().ok_or(ClientError::NoPuzzle)?;
        let word = session
            .rejected_word
            .clone()
            .ok_or(ClientError::NothingToExplain)?;
        let request = WhyNotRequest {
            word,
            puzzle: Some(session.key().puzzle.clone()),
        };
        Ok(self.api.why_not(&request).await?)
    }

    /// Closest words to the solution; only available once the game is over
    pub async fn ranking(&self) -> Result<RankingResponse, ClientError> {
        let session = self.session.as_ref().ok_or(ClientError::NoPuzzle)?;
        if !session.state.is_over() {
            return Err(ClientError::GameInProgress);
        }
        Ok(self.api.ranking(&session.key().puzzle).await?)
    }

    /// Published games, newest first, with their local status
    pub async fn previous_games(&self) -> Result<Vec<GameSummary>, ClientError> {
        let response = self.api.public_games().await?;
        let current = response.current_game_id;

        let mut summaries = Vec::new();
        for game in response.games.into_iter().filter(|game| game.id <= current) {
            let state = self
                .repository
                .load(&SessionKey::new(game.name.clone(), Some(game.id)))
                .await;
            summaries.push(GameSummary {
                id: game.id,
                roman: to_roman(game.id).unwrap_or_else(|_| game.id.to_string()),
                status: status_label(state.as_ref()),
                guess_count: state
                    .as_ref()
                    .map(|state| state.guesses.len() as u32)
                    .unwrap_or(0),
                name: game.name,
            });
        }
        summaries.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(summaries)
    }

    /// Link that starts a custom game for `word`
    pub fn share_link(&self, word: &str) -> Option<String> {
        normalize_guess(word).map(|word| self.location.share_link(&word))
    }
}
