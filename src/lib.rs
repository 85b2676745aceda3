pub mod args;
pub mod config;
pub mod error;
pub mod logging;
pub mod sessions;
pub mod streaming;
pub mod theme;
pub mod transport;
pub mod types;

// Re-export the types most callers need at crate root for convenience
pub use error::{ChatError, Result};
pub use sessions::{ChatSession, Role, TranscriptEntry};
pub use streaming::{FallbackController, StreamController};
pub use transport::{ChatTransport, HttpTransport};
pub use types::{ChatRequest, ChatResult, WorkflowStep};
