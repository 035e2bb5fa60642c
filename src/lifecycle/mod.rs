//! The event lifecycle: validated transitions between `scheduled`,
//! `in-progress`, and `completed`, over an injected store.

pub mod engine;
pub mod error;

pub use engine::{EventDraft, EventLifecycle, EventPatch};
pub use error::LifecycleError;
