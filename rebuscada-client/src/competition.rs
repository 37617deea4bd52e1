use async_trait::async_trait;
use std::collections::HashMap;

use rebuscada_core::{Session, SessionEvent, SessionKey, StandingsBoard};
use rebuscada_types::{
    CompetitionInfo, CompetitionJoined, CompetitionPush, CreateCompetitionRequest,
    JoinCompetitionRequest, PlayerStanding, PushKind, messages,
};

use crate::error::ClientError;
use crate::game_client::{GameClient, LEAVE_PROMPT};
use crate::push::PushConnection;

/// Asks the player before discarding a live competition membership
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Competition membership as seen by this client
pub struct CompetitionOverlay {
    pub info: CompetitionInfo,
    pub board: StandingsBoard,
    connection: Option<PushConnection>,
}

impl CompetitionOverlay {
    pub fn new(info: CompetitionInfo) -> Self {
        Self {
            info,
            board: StandingsBoard::new(),
            connection: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub(crate) fn close(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
        self.board.clear();
    }
}

fn player_name(input: &str, competition_id: Option<&str>) -> Result<String, ClientError> {
    let name = input.trim();
    if name.is_empty() {
        return Err(ClientError::NameRequired(competition_id.map(str::to_string)));
    }
    Ok(name.to_string())
}

impl GameClient {
    pub fn is_push_connected(&self) -> bool {
        self.competition
            .as_ref()
            .is_some_and(CompetitionOverlay::is_connected)
    }

    /// Start a competition on the current puzzle, carrying the guesses made
    /// so far. Returns the new competition id.
    pub async fn create_competition(&mut self, name: &str) -> Result<String, ClientError> {
        let name = player_name(name, None)?;
        self.confirm_leave().await?;

        let session = self.session.as_ref().ok_or(ClientError::NoPuzzle)?;
        let request = CreateCompetitionRequest {
            creator_name: name.clone(),
            puzzle: session.key().puzzle.clone(),
            existing_guesses: session.state.history(),
        };

        let joined = self.api.create_competition(&request).await?;
        let competition_id = joined.competition_id.clone();
        tracing::info!("Created competition {}", competition_id);

        match self.enter(joined, name).await {
            Err(err @ ClientError::CompetitionExpired(_)) => {
                self.return_to_single_player().await;
                Err(err)
            }
            Err(err) => Err(err),
            Ok(()) => Ok(competition_id),
        }
    }

    /// Join an existing competition. Joining the one already joined is a
    /// no-op; switching from another asks first.
    pub async fn join_competition(
        &mut self,
        competition_id: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        let name = player_name(name, Some(competition_id))?;
        if self
            .competition
            .as_ref()
            .is_some_and(|overlay| overlay.info.competition_id == competition_id)
        {
            return Ok(());
        }
        self.confirm_leave().await?;

        let result = self.join_inner(competition_id, name).await;
        if let Err(ClientError::CompetitionExpired(_)) = &result {
            self.return_to_single_player().await;
        }
        result
    }

    pub(crate) async fn join_inner(
        &mut self,
        competition_id: &str,
        player_name: String,
    ) -> Result<(), ClientError> {
        // Progress only carries over from a single-player session
        let existing_guesses = self
            .session
            .as_ref()
            .filter(|session| session.key().competition_id.is_none())
            .map(|session| session.state.history())
            .unwrap_or_default();
        let request = JoinCompetitionRequest {
            player_name: player_name.clone(),
            existing_guesses,
        };

        match self.api.join_competition(competition_id, &request).await {
            Ok(joined) => {
                tracing::info!("Joined competition {} as {}", competition_id, player_name);
                self.enter(joined, player_name).await
            }
            Err(err) if err.is_not_found() => {
                self.teardown_competition(competition_id, true).await;
                Err(ClientError::CompetitionExpired(competition_id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn enter(
        &mut self,
        joined: CompetitionJoined,
        player_name: String,
    ) -> Result<(), ClientError> {
        let info = CompetitionInfo {
            competition_id: joined.competition_id,
            puzzle: joined.puzzle,
            player_name,
        };
        self.repository.save_competition(&info).await;
        self.location.set_competition(Some(&info.competition_id));
        self.player_name = Some(info.player_name.clone());

        self.switch_session_to(&info).await;
        self.competition = Some(CompetitionOverlay::new(info.clone()));
        self.connect_push().await;
        self.publish(SessionEvent::CompetitionJoined {
            competition_id: info.competition_id,
            puzzle: info.puzzle,
        });

        match self.pull_standings().await {
            Err(err @ ClientError::CompetitionExpired(_)) => Err(err),
            _ => Ok(()),
        }
    }

    /// Make the competition's session the active one. Progress on the same
    /// puzzle carries over; another puzzle starts fresh.
    pub(crate) async fn switch_session_to(&mut self, info: &CompetitionInfo) {
        let key = SessionKey::new(info.puzzle.clone(), None)
            .with_competition(Some(info.competition_id.clone()));

        let saved = self.repository.load(&key).await;
        let resumed = saved.is_some();
        let session = match saved {
            Some(state) => Session::from_state(state),
            None => {
                let carried = self
                    .session
                    .as_ref()
                    .filter(|session| session.key().puzzle == info.puzzle)
                    .map(|session| session.state.clone());
                match carried {
                    Some(mut state) => {
                        state.key = key.clone();
                        Session::from_state(state)
                    }
                    None => Session::new(key.clone()),
                }
            }
        };

        self.session = Some(session);
        self.save().await;
        self.publish(SessionEvent::PuzzleResolved { key, resumed });
    }

    /// Leave the current competition and go back to single player
    pub async fn leave_competition(&mut self) -> Result<(), ClientError> {
        if self.competition.is_none() {
            return Err(ClientError::NotInCompetition);
        }
        self.leave_quietly().await;
        self.return_to_single_player().await;
        Ok(())
    }

    /// Ask before dropping a live competition; declining aborts the caller
    pub(crate) async fn confirm_leave(&mut self) -> Result<(), ClientError> {
        if self.competition.is_none() {
            return Ok(());
        }
        if !self.confirm.confirm(LEAVE_PROMPT).await {
            tracing::info!("Kept current competition");
            return Err(ClientError::Cancelled);
        }
        self.leave_quietly().await;
        Ok(())
    }

    /// Best-effort leave: backend failures are logged and ignored
    async fn leave_quietly(&mut self) {
        let Some(mut overlay) = self.competition.take() else {
            return;
        };
        let competition_id = overlay.info.competition_id.clone();
        if let Err(err) = self
            .api
            .leave_competition(&competition_id, &overlay.info.player_name)
            .await
        {
            tracing::warn!("Leaving competition {} failed: {}", competition_id, err);
        }

        overlay.close();
        self.repository.clear_competition().await;
        self.location.set_competition(None);
        tracing::info!("Left competition {}", competition_id);
        self.publish(SessionEvent::CompetitionLeft { competition_id });
    }

    /// Drop the overlay without telling the backend
    pub(crate) async fn teardown_competition(&mut self, competition_id: &str, expired: bool) {
        if let Some(mut overlay) = self.competition.take() {
            overlay.close();
        }
        self.repository.clear_competition().await;
        self.location.set_competition(None);

        if expired {
            tracing::info!("Competition {} has expired", competition_id);
            self.publish(SessionEvent::CompetitionExpired {
                competition_id: competition_id.to_string(),
                message: messages::COMPETITION_EXPIRED.to_string(),
            });
        }
    }

    /// Re-resolve unless a single-player session is already active
    pub(crate) async fn return_to_single_player(&mut self) {
        let needs_resolution = self
            .session
            .as_ref()
            .is_none_or(|session| session.key().competition_id.is_some());
        if !needs_resolution {
            return;
        }
        if let Err(err) = self.resolve().await {
            tracing::warn!("Could not return to single player: {}", err);
            self.publish(SessionEvent::RequestFailed {
                message: err.to_string(),
            });
        }
    }

    /// Reattach to a competition recorded in storage
    pub(crate) async fn resume_competition(
        &mut self,
        competition_id: &str,
    ) -> Result<(), ClientError> {
        if self
            .competition
            .as_ref()
            .is_some_and(|overlay| overlay.info.competition_id == competition_id)
        {
            return Ok(());
        }
        let Some(info) = self
            .repository
            .load_competition()
            .await
            .filter(|info| info.competition_id == competition_id)
        else {
            tracing::warn!("No saved membership for competition {}", competition_id);
            return Ok(());
        };

        self.player_name = Some(info.player_name.clone());
        self.competition = Some(CompetitionOverlay::new(info));
        self.connect_push().await;

        match self.pull_standings().await {
            Err(err @ ClientError::CompetitionExpired(_)) => Err(err),
            _ => Ok(()),
        }
    }

    pub(crate) async fn connect_push(&mut self) {
        let Some(competition_id) = self
            .competition
            .as_ref()
            .map(|overlay| overlay.info.competition_id.clone())
        else {
            return;
        };

        match self.push.connect(&competition_id).await {
            Ok(connection) => {
                if let Some(overlay) = self.competition.as_mut() {
                    overlay.connection = Some(connection);
                }
            }
            Err(err) => {
                tracing::warn!("Push feed for {} unavailable: {}", competition_id, err);
            }
        }
    }

    /// Fetch standings over HTTP. A missing competition is torn down.
    pub(crate) async fn pull_standings(&mut self) -> Result<(), ClientError> {
        let competition_id = self
            .competition
            .as_ref()
            .map(|overlay| overlay.info.competition_id.clone())
            .ok_or(ClientError::NotInCompetition)?;

        match self.api.competition_state(&competition_id).await {
            Ok(state) => {
                self.replace_standings(state.players);
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                self.teardown_competition(&competition_id, true).await;
                Err(ClientError::CompetitionExpired(competition_id))
            }
            Err(err) => {
                tracing::warn!("Standings for {} unavailable: {}", competition_id, err);
                Err(err.into())
            }
        }
    }

    pub async fn refresh_standings(&mut self) -> Result<&[PlayerStanding], ClientError> {
        if let Err(err) = self.pull_standings().await {
            if matches!(err, ClientError::CompetitionExpired(_)) {
                self.return_to_single_player().await;
            }
            return Err(err);
        }
        Ok(self.standings())
    }

    fn replace_standings(&mut self, players: HashMap<String, PlayerStanding>) {
        let Some(overlay) = self.competition.as_mut() else {
            return;
        };
        overlay.board.replace(players);
        let event = SessionEvent::StandingsUpdated {
            competition_id: overlay.info.competition_id.clone(),
            standings: overlay.board.standings().to_vec(),
        };
        self.publish(event);
    }

    /// Next push message; pending forever while no feed is open
    pub async fn next_push(&mut self) -> Option<CompetitionPush> {
        let Some(connection) = self
            .competition
            .as_mut()
            .and_then(|overlay| overlay.connection.as_mut())
        else {
            return std::future::pending().await;
        };

        let push = connection.recv().await;
        if push.is_none() {
            if let Some(overlay) = self.competition.as_mut() {
                tracing::warn!(
                    "Push feed for {} ended; standings will only refresh on demand",
                    overlay.info.competition_id
                );
                overlay.connection = None;
            }
        }
        push
    }

    /// Every snapshot replaces the cached standings wholesale
    pub fn apply_push(&mut self, push: CompetitionPush) {
        match (push.kind, push.players) {
            (PushKind::Init | PushKind::Update, Some(players)) => self.replace_standings(players),
            (kind, _) => tracing::debug!("Ignoring push message {:?}", kind),
        }
    }
}
