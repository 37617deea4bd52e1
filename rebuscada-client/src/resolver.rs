use rebuscada_core::{PuzzleRequest, PuzzleSource, ResolvedPuzzle};
use rebuscada_persistence::SessionRepository;
use rebuscada_types::{GameNumber, GuessRequest, PlayContext};

use crate::api::GameApi;
use crate::error::{ApiError, ResolveError};
use crate::location::Location;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Ready {
        puzzle: ResolvedPuzzle,
        /// Competition named in the page address that the backend no longer
        /// knows about; the address has already been cleaned up.
        expired_competition: Option<String>,
    },
    /// The page asks for a competition this client has not joined yet
    CompetitionPending(String),
}

/// Chooses the active puzzle from the page address and the backend.
pub struct PuzzleResolver<'a> {
    api: &'a dyn GameApi,
    repository: &'a SessionRepository,
}

impl<'a> PuzzleResolver<'a> {
    pub fn new(api: &'a dyn GameApi, repository: &'a SessionRepository) -> Self {
        Self { api, repository }
    }

    pub async fn resolve(&self, location: &mut Location) -> Result<Resolution, ResolveError> {
        let request = location
            .puzzle_request()
            .map_err(|e| ResolveError::InvalidParameter(format!("{:#}", e)))?;
        tracing::debug!("Resolving puzzle for {:?}", request);

        match request {
            PuzzleRequest::CustomWord(word) => self.custom_word(word).await.map(ready),
            PuzzleRequest::Game(game_id) => self.published_game(game_id, location).await.map(ready),
            PuzzleRequest::Competition(competition_id) => {
                self.competition(competition_id, location).await
            }
            PuzzleRequest::Daily => self.daily().await.map(ready),
        }
    }

    async fn custom_word(&self, word: String) -> Result<ResolvedPuzzle, ResolveError> {
        let check = GuessRequest {
            word: word.clone(),
            context: PlayContext {
                puzzle: Some(word.clone()),
                ..PlayContext::default()
            },
        };

        match self.api.guess(&check).await {
            Ok(_) => Ok(ResolvedPuzzle {
                puzzle: word,
                game_id: None,
                competition_id: None,
                source: PuzzleSource::CustomWord,
            }),
            Err(err) if err.is_rejection() => {
                tracing::info!("Custom word rejected by backend: {}", err);
                Err(ResolveError::CustomWordRejected(err.user_message()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn published_game(
        &self,
        game_id: GameNumber,
        location: &mut Location,
    ) -> Result<ResolvedPuzzle, ResolveError> {
        let games = self.api.public_games().await?;

        if game_id > games.current_game_id {
            tracing::info!(
                "Game {} requested before publication (current {})",
                game_id,
                games.current_game_id
            );
            location.redirect_to_default();
            return Err(ResolveError::FutureGame {
                requested: game_id,
                current: games.current_game_id,
            });
        }

        let game = games
            .games
            .into_iter()
            .find(|game| game.id == game_id)
            .ok_or(ResolveError::UnknownGame(game_id))?;

        Ok(ResolvedPuzzle {
            puzzle: game.name,
            game_id: Some(game_id),
            competition_id: None,
            source: PuzzleSource::Game,
        })
    }

    async fn competition(
        &self,
        competition_id: String,
        location: &mut Location,
    ) -> Result<Resolution, ResolveError> {
        let info = match self.repository.load_competition().await {
            Some(info) if info.competition_id == competition_id => info,
            _ => return Ok(Resolution::CompetitionPending(competition_id)),
        };

        match self.api.competition_state(&competition_id).await {
            Ok(_) => {}
            Err(ApiError::NotFound { .. }) => {
                tracing::info!("Competition {} no longer exists", competition_id);
                location.set_competition(None);
                let puzzle = self.daily().await?;
                return Ok(Resolution::Ready {
                    puzzle,
                    expired_competition: Some(competition_id),
                });
            }
            // Resume optimistically; the standings pull will retry
            Err(err) => tracing::warn!("Could not verify competition {}: {}", competition_id, err),
        }

        Ok(ready(ResolvedPuzzle {
            puzzle: info.puzzle,
            game_id: None,
            competition_id: Some(competition_id),
            source: PuzzleSource::Competition,
        }))
    }

    async fn daily(&self) -> Result<ResolvedPuzzle, ResolveError> {
        let daily = self.api.daily_puzzle().await?;
        Ok(ResolvedPuzzle {
            puzzle: daily.word,
            game_id: Some(daily.id),
            competition_id: None,
            source: PuzzleSource::Daily,
        })
    }
}

fn ready(puzzle: ResolvedPuzzle) -> Resolution {
    Resolution::Ready {
        puzzle,
        expired_competition: None,
    }
}
