pub mod api;
pub mod command;
pub mod competition;
pub mod config;
pub mod error;
pub mod game_client;
pub mod location;
pub mod push;
pub mod resolver;
pub mod sync;
pub mod terminal;

pub use api::{GameApi, HttpGameApi};
pub use competition::{CompetitionOverlay, Confirm};
pub use config::Config;
pub use error::{ApiError, ClientError, ResolveError};
pub use game_client::GameClient;
pub use location::Location;
pub use push::{PushConnection, PushConnector, WsPushConnector};
pub use resolver::{PuzzleResolver, Resolution};
