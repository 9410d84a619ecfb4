mod engine;
mod plan;
mod progress;
mod view;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use engine::{SessionEngine, Submission};
pub use plan::{Selection, SessionOptions, build_order};
pub use progress::SessionProgress;
pub use view::{SessionObserver, SessionPhase, SessionSnapshot};
