pub mod proximity;
pub mod puzzle;
pub mod roman;
pub mod session;
pub mod session_events;
pub mod standings;

// Re-export main components
pub use proximity::*;
pub use puzzle::*;
pub use roman::*;
pub use session::*;
pub use session_events::*;
pub use standings::*;
