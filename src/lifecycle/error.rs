use thiserror::Error;

use crate::model::EventStatus;
use crate::scoring::ScoringError;
use crate::store::StoreError;

/// Failures surfaced by lifecycle operations. Everything here is detected
/// before the single store write, so an operation either fully applies or
/// leaves the event untouched. Messages are written for the person running
/// the command.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("event name cannot be empty")]
    EmptyName,
    #[error("event category cannot be empty")]
    EmptyCategory,
    #[error("an event named \"{0}\" already exists")]
    DuplicateName(String),
    #[error("no event with id {0}")]
    NotFound(String),
    #[error("event is {from}, cannot move to {to}")]
    InvalidTransition { from: EventStatus, to: EventStatus },
    #[error("event is already scheduled")]
    AlreadyScheduled,
    #[error("cannot delete an event while it is in progress")]
    CannotDeleteActive,
    #[error("cannot delete a completed event; reset it first to discard its results")]
    CannotDeleteCompleted,
    #[error("results cannot be empty")]
    EmptyResults,
    #[error("results must assign first place")]
    MissingFirstPlace,
    #[error("placement {0} is assigned more than once")]
    DuplicatePlacement(u32),
    #[error("placement {0} is not in the event's scoring table")]
    UnknownPlacement(u32),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
