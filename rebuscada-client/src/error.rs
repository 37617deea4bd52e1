use rebuscada_types::{GameNumber, messages};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{detail}")]
    Rejected { status: u16, detail: String },
    #[error("{detail}")]
    NotFound { detail: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Text shown to the player. Transport problems all read the same.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected { detail, .. } | ApiError::NotFound { detail } => detail.clone(),
            ApiError::Network(_) | ApiError::Decode(_) => messages::NETWORK_ERROR.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Whether the backend answered (as opposed to a transport failure)
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { .. } | ApiError::NotFound { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Invalid puzzle parameter: {0}")]
    InvalidParameter(String),
    #[error("{0}")]
    CustomWordRejected(String),
    #[error("Game {requested} is not published yet (current game is {current})")]
    FutureGame {
        requested: GameNumber,
        current: GameNumber,
    },
    #[error("Game {0} does not exist")]
    UnknownGame(GameNumber),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("No puzzle has been resolved yet")]
    NoPuzzle,
    #[error("{}", messages::GAME_OVER)]
    GameOver,
    #[error("The game is still in progress")]
    GameInProgress,
    #[error("There is no rejected word to explain")]
    NothingToExplain,
    #[error("Not in a competition")]
    NotInCompetition,
    /// Carries the competition being joined; creating one has no id yet
    #[error("A player name is needed to take part in a competition")]
    NameRequired(Option<String>),
    #[error("{}", messages::COMPETITION_EXPIRED)]
    CompetitionExpired(String),
    #[error("Cancelled")]
    Cancelled,
    #[error("Invalid page URL: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
