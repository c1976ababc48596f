//! Action dispatch engine.
//!
//! Provides a generic dispatch loop: record → reduce → route → repeat until
//! settled. Actions form causal chains through the recorder's sequence numbers.
//!
//! Consumers define their domain by implementing `Reducer` (pure state updates)
//! and `Router` (turns one action into follow-up actions).

pub mod engine;
pub mod record;
pub mod traits;

pub use engine::Engine;
pub use record::{MemoryActionLog, RecordedAction};
pub use traits::{ActionLike, ActionRecorder, Reducer, Router};
