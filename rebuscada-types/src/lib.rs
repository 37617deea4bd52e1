pub mod api;
pub mod competition;
pub mod errors;
pub mod game;

// Re-export all types
pub use api::*;
pub use competition::*;
pub use errors::*;
pub use game::*;
