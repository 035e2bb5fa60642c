use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use super::error::LifecycleError;
use crate::model::{Event, EventKind, EventResult, EventStatus};
use crate::scoring::{validate_scoring, ScoringConfig};
use crate::store::CompetitionStore;

/// Input for [`EventLifecycle::create`].
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub name: String,
    pub category_id: String,
    pub kind: EventKind,
    pub scoring: ScoringConfig,
}

/// Input for [`EventLifecycle::update`]; only supplied fields are validated
/// and applied.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub name: Option<String>,
    pub category_id: Option<String>,
    pub kind: Option<EventKind>,
    pub scoring: Option<ScoringConfig>,
}

/// The event state machine, bound to an injected store.
///
/// Every operation is one read, validation, then one whole-record write;
/// concurrent callers race at the store and the last write wins.
pub struct EventLifecycle {
    store: Arc<dyn CompetitionStore>,
}

impl EventLifecycle {
    pub fn new(store: Arc<dyn CompetitionStore>) -> Self {
        Self { store }
    }

    /// Schedule a new event.
    ///
    /// # Errors
    /// `EmptyName`, `EmptyCategory`, any `ScoringError` from the table, or
    /// `DuplicateName` when another event already uses the name
    /// (case-insensitively).
    pub fn create(&self, draft: EventDraft) -> Result<Event, LifecycleError> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(LifecycleError::EmptyName);
        }
        if draft.category_id.trim().is_empty() {
            return Err(LifecycleError::EmptyCategory);
        }
        validate_scoring(&draft.scoring)?;
        self.ensure_name_free(&name, None)?;

        let event = Event {
            id: String::new(), // assigned by the store
            name,
            category_id: draft.category_id,
            kind: draft.kind,
            status: EventStatus::Scheduled,
            scoring: draft.scoring,
            start_time: None,
            end_time: None,
            results: None,
        };
        let id = self.store.create_event(event)?;
        info!("created event {}", id);
        self.fetch(&id)
    }

    /// Edit fields of an event. Supplied fields are re-validated with the
    /// same rules as `create`; omitted fields are untouched.
    ///
    /// The state machine does not care whether the event already completed:
    /// changing `scoring` on a completed event changes its historical
    /// contribution on the next aggregation pass.
    pub fn update(&self, id: &str, patch: EventPatch) -> Result<Event, LifecycleError> {
        let mut event = self.fetch(id)?;

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(LifecycleError::EmptyName);
            }
            self.ensure_name_free(&name, Some(id))?;
            event.name = name;
        }
        if let Some(category_id) = patch.category_id {
            if category_id.trim().is_empty() {
                return Err(LifecycleError::EmptyCategory);
            }
            event.category_id = category_id;
        }
        if let Some(kind) = patch.kind {
            event.kind = kind;
        }
        if let Some(scoring) = patch.scoring {
            validate_scoring(&scoring)?;
            event.scoring = scoring;
        }

        self.store.update_event(id, event)?;
        self.fetch(id)
    }

    /// Move a scheduled event to `in-progress`, stamping `start_time`.
    pub fn start(&self, id: &str) -> Result<Event, LifecycleError> {
        let mut event = self.fetch(id)?;
        ensure_can_move(&event, EventStatus::InProgress)?;

        event.status = EventStatus::InProgress;
        event.start_time = Some(Utc::now());
        self.store.update_event(id, event)?;
        info!("started event {}", id);
        self.fetch(id)
    }

    /// Record results and complete an in-progress event.
    ///
    /// Results are stored verbatim, in the order given. Placements must be
    /// unique, include first place, and exist in the event's scoring table;
    /// a scored placement may go unclaimed and then contributes nothing.
    /// Participant ids are not checked here — standings aggregation treats
    /// dangling participants as orphaned data.
    pub fn complete(
        &self,
        id: &str,
        results: Vec<EventResult>,
    ) -> Result<Event, LifecycleError> {
        let mut event = self.fetch(id)?;
        ensure_can_move(&event, EventStatus::Completed)?;
        validate_results(&results, &event.scoring)?;

        event.status = EventStatus::Completed;
        event.end_time = Some(Utc::now());
        event.results = Some(results);
        self.store.update_event(id, event)?;
        info!("completed event {}", id);
        self.fetch(id)
    }

    /// Return a started or completed event to `scheduled`, removing
    /// `start_time`, `end_time`, and `results` entirely so aggregation sees
    /// it as never run.
    pub fn reset(&self, id: &str) -> Result<Event, LifecycleError> {
        let mut event = self.fetch(id)?;
        if event.status == EventStatus::Scheduled {
            return Err(LifecycleError::AlreadyScheduled);
        }

        event.status = EventStatus::Scheduled;
        event.start_time = None;
        event.end_time = None;
        event.results = None;
        self.store.update_event(id, event)?;
        info!("reset event {}", id);
        self.fetch(id)
    }

    /// Delete a scheduled event. In-progress and completed events are
    /// protected: their results (present or imminent) feed the standings.
    pub fn delete(&self, id: &str) -> Result<(), LifecycleError> {
        let event = self.fetch(id)?;
        match event.status {
            EventStatus::InProgress => Err(LifecycleError::CannotDeleteActive),
            EventStatus::Completed => Err(LifecycleError::CannotDeleteCompleted),
            EventStatus::Scheduled => {
                self.store.delete_event(id)?;
                info!("deleted event {}", id);
                Ok(())
            }
        }
    }

    fn fetch(&self, id: &str) -> Result<Event, LifecycleError> {
        self.store
            .event(id)?
            .ok_or_else(|| LifecycleError::NotFound(id.to_string()))
    }

    fn ensure_name_free(&self, name: &str, exclude: Option<&str>) -> Result<(), LifecycleError> {
        let wanted = name.to_lowercase();
        for event in self.store.events()? {
            if Some(event.id.as_str()) == exclude {
                continue;
            }
            if event.name.trim().to_lowercase() == wanted {
                return Err(LifecycleError::DuplicateName(event.name));
            }
        }
        Ok(())
    }
}

fn ensure_can_move(event: &Event, to: EventStatus) -> Result<(), LifecycleError> {
    if !event.status.can_transition_to(to) {
        return Err(LifecycleError::InvalidTransition {
            from: event.status,
            to,
        });
    }
    Ok(())
}

/// Check a result list against the event's scoring table. Order matters:
/// emptiness, then a first place, then duplicate placements, then placements
/// the table does not score.
fn validate_results(
    results: &[EventResult],
    scoring: &ScoringConfig,
) -> Result<(), LifecycleError> {
    if results.is_empty() {
        return Err(LifecycleError::EmptyResults);
    }
    if !results.iter().any(|result| result.placement == 1) {
        return Err(LifecycleError::MissingFirstPlace);
    }
    let mut seen = HashSet::new();
    for result in results {
        if !seen.insert(result.placement) {
            return Err(LifecycleError::DuplicatePlacement(result.placement));
        }
    }
    for result in results {
        if !scoring.contains(result.placement) {
            return Err(LifecycleError::UnknownPlacement(result.placement));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn engine() -> EventLifecycle {
        EventLifecycle::new(Arc::new(MemoryStore::new()))
    }

    fn draft(name: &str) -> EventDraft {
        EventDraft {
            name: name.to_string(),
            category_id: "c1".to_string(),
            kind: EventKind::Individual,
            scoring: ScoringConfig::new([(1, 5), (2, 3), (3, 1)]),
        }
    }

    fn result(placement: u32, participant: &str) -> EventResult {
        EventResult {
            placement,
            participant_id: participant.to_string(),
        }
    }

    #[test]
    fn test_create_schedules_a_bare_event() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();

        assert_eq!(event.status, EventStatus::Scheduled);
        assert_eq!(event.name, "Sack Race");
        assert!(event.start_time.is_none());
        assert!(event.end_time.is_none());
        assert!(event.results.is_none());
        assert!(!event.id.is_empty());
    }

    #[test]
    fn test_create_trims_the_name() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("  Sack Race  ")).unwrap();
        assert_eq!(event.name, "Sack Race");
    }

    #[test]
    fn test_create_rejects_blank_name_and_category() {
        let lifecycle = engine();

        let err = lifecycle.create(draft("   ")).unwrap_err();
        assert!(matches!(err, LifecycleError::EmptyName));

        let mut d = draft("Sack Race");
        d.category_id = "  ".to_string();
        let err = lifecycle.create(d).unwrap_err();
        assert!(matches!(err, LifecycleError::EmptyCategory));
    }

    #[test]
    fn test_create_rejects_bad_scoring() {
        let lifecycle = engine();
        let mut d = draft("Sack Race");
        d.scoring = ScoringConfig::new([(2, 3)]);

        let err = lifecycle.create(d).unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Scoring(crate::scoring::ScoringError::MissingFirstPlace)
        ));
    }

    #[test]
    fn test_create_rejects_duplicate_name_case_insensitively() {
        let lifecycle = engine();
        lifecycle.create(draft("Sack Race")).unwrap();

        let err = lifecycle.create(draft("sack race")).unwrap_err();
        assert!(matches!(err, LifecycleError::DuplicateName(_)));

        let err = lifecycle.create(draft("  SACK RACE ")).unwrap_err();
        assert!(matches!(err, LifecycleError::DuplicateName(_)));
    }

    #[test]
    fn test_update_keeps_own_name_and_patches_fields() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();

        // Re-submitting its own name is not a duplicate.
        let updated = lifecycle
            .update(
                &event.id,
                EventPatch {
                    name: Some("Sack Race".to_string()),
                    kind: Some(EventKind::Group),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.kind, EventKind::Group);
        assert_eq!(updated.name, "Sack Race");
    }

    #[test]
    fn test_update_rejects_taken_name() {
        let lifecycle = engine();
        lifecycle.create(draft("Sack Race")).unwrap();
        let other = lifecycle.create(draft("Quiz Night")).unwrap();

        let err = lifecycle
            .update(
                &other.id,
                EventPatch {
                    name: Some("SACK race".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, LifecycleError::DuplicateName(_)));
    }

    #[test]
    fn test_update_validates_supplied_scoring_only() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();

        let err = lifecycle
            .update(
                &event.id,
                EventPatch {
                    scoring: Some(ScoringConfig::new([])),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Scoring(crate::scoring::ScoringError::EmptyConfig)
        ));

        // Nothing was written.
        let unchanged = lifecycle
            .update(&event.id, EventPatch::default())
            .unwrap();
        assert_eq!(unchanged.scoring, event.scoring);
    }

    #[test]
    fn test_update_missing_event() {
        let lifecycle = engine();
        let err = lifecycle.update("e99", EventPatch::default()).unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(_)));
    }

    #[test]
    fn test_start_sets_status_and_time() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();

        let started = lifecycle.start(&event.id).unwrap();
        assert_eq!(started.status, EventStatus::InProgress);
        assert!(started.start_time.is_some());
        assert!(started.end_time.is_none());
    }

    #[test]
    fn test_start_twice_is_an_invalid_transition() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();
        lifecycle.start(&event.id).unwrap();

        let err = lifecycle.start(&event.id).unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::InvalidTransition {
                from: EventStatus::InProgress,
                to: EventStatus::InProgress,
            }
        ));
    }

    #[test]
    fn test_complete_requires_in_progress() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();

        let err = lifecycle
            .complete(&event.id, vec![result(1, "p1")])
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::InvalidTransition {
                from: EventStatus::Scheduled,
                to: EventStatus::Completed,
            }
        ));
    }

    #[test]
    fn test_complete_stores_results_verbatim() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();
        lifecycle.start(&event.id).unwrap();

        // Input order is preserved, not sorted by placement.
        let completed = lifecycle
            .complete(&event.id, vec![result(3, "p3"), result(1, "p1")])
            .unwrap();
        assert_eq!(completed.status, EventStatus::Completed);
        assert!(completed.end_time.is_some());
        assert_eq!(
            completed.results,
            Some(vec![result(3, "p3"), result(1, "p1")])
        );
    }

    #[test]
    fn test_complete_rejects_empty_results() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();
        lifecycle.start(&event.id).unwrap();

        let err = lifecycle.complete(&event.id, vec![]).unwrap_err();
        assert!(matches!(err, LifecycleError::EmptyResults));
    }

    #[test]
    fn test_complete_requires_a_first_place() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();
        lifecycle.start(&event.id).unwrap();

        let err = lifecycle
            .complete(&event.id, vec![result(2, "p1"), result(3, "p2")])
            .unwrap_err();
        assert!(matches!(err, LifecycleError::MissingFirstPlace));
    }

    #[test]
    fn test_complete_rejects_repeated_placement() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();
        lifecycle.start(&event.id).unwrap();

        let err = lifecycle
            .complete(&event.id, vec![result(1, "p1"), result(1, "p2")])
            .unwrap_err();
        assert!(matches!(err, LifecycleError::DuplicatePlacement(1)));
    }

    #[test]
    fn test_complete_rejects_placement_outside_scoring() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();
        lifecycle.start(&event.id).unwrap();

        let err = lifecycle
            .complete(&event.id, vec![result(1, "p1"), result(4, "p2")])
            .unwrap_err();
        assert!(matches!(err, LifecycleError::UnknownPlacement(4)));
    }

    #[test]
    fn test_complete_allows_unclaimed_placements() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();
        lifecycle.start(&event.id).unwrap();

        // Scoring covers 1..3 but only first place is claimed.
        let completed = lifecycle
            .complete(&event.id, vec![result(1, "p1")])
            .unwrap();
        assert_eq!(completed.results.unwrap().len(), 1);
    }

    #[test]
    fn test_reset_restores_the_freshly_created_shape() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();
        lifecycle.start(&event.id).unwrap();
        lifecycle
            .complete(&event.id, vec![result(1, "p1")])
            .unwrap();

        let reset = lifecycle.reset(&event.id).unwrap();
        assert_eq!(reset.status, EventStatus::Scheduled);
        assert!(reset.start_time.is_none());
        assert!(reset.end_time.is_none());
        assert!(reset.results.is_none());

        // Indistinguishable from never started, so it can run again.
        lifecycle.start(&event.id).unwrap();
    }

    #[test]
    fn test_reset_from_in_progress_is_allowed() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();
        lifecycle.start(&event.id).unwrap();

        let reset = lifecycle.reset(&event.id).unwrap();
        assert_eq!(reset.status, EventStatus::Scheduled);
        assert!(reset.start_time.is_none());
    }

    #[test]
    fn test_reset_of_scheduled_event_fails() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();

        let err = lifecycle.reset(&event.id).unwrap_err();
        assert!(matches!(err, LifecycleError::AlreadyScheduled));
    }

    #[test]
    fn test_delete_only_from_scheduled() {
        let lifecycle = engine();

        let scheduled = lifecycle.create(draft("Sack Race")).unwrap();
        lifecycle.delete(&scheduled.id).unwrap();
        assert!(matches!(
            lifecycle.start(&scheduled.id).unwrap_err(),
            LifecycleError::NotFound(_)
        ));

        let active = lifecycle.create(draft("Quiz Night")).unwrap();
        lifecycle.start(&active.id).unwrap();
        assert!(matches!(
            lifecycle.delete(&active.id).unwrap_err(),
            LifecycleError::CannotDeleteActive
        ));

        lifecycle
            .complete(&active.id, vec![result(1, "p1")])
            .unwrap();
        assert!(matches!(
            lifecycle.delete(&active.id).unwrap_err(),
            LifecycleError::CannotDeleteCompleted
        ));
    }

    #[test]
    fn test_operations_on_missing_ids_fail_with_not_found() {
        let lifecycle = engine();
        assert!(matches!(
            lifecycle.start("e1").unwrap_err(),
            LifecycleError::NotFound(_)
        ));
        assert!(matches!(
            lifecycle.complete("e1", vec![result(1, "p1")]).unwrap_err(),
            LifecycleError::NotFound(_)
        ));
        assert!(matches!(
            lifecycle.reset("e1").unwrap_err(),
            LifecycleError::NotFound(_)
        ));
        assert!(matches!(
            lifecycle.delete("e1").unwrap_err(),
            LifecycleError::NotFound(_)
        ));
    }

    #[test]
    fn test_scoring_edit_after_completion_is_permitted() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();
        lifecycle.start(&event.id).unwrap();
        lifecycle
            .complete(&event.id, vec![result(1, "p1")])
            .unwrap();

        let updated = lifecycle
            .update(
                &event.id,
                EventPatch {
                    scoring: Some(ScoringConfig::new([(1, 100)])),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.scoring.points_for(1), Some(100));
        // Results stay as recorded; the new table applies at aggregation.
        assert_eq!(updated.results.unwrap().len(), 1);
    }

    #[test]
    fn test_failed_validation_writes_nothing() {
        let lifecycle = engine();
        let event = lifecycle.create(draft("Sack Race")).unwrap();
        lifecycle.start(&event.id).unwrap();

        let before = lifecycle.update(&event.id, EventPatch::default()).unwrap();
        let _ = lifecycle
            .complete(&event.id, vec![result(2, "p1")])
            .unwrap_err();
        let after = lifecycle.update(&event.id, EventPatch::default()).unwrap();

        assert_eq!(before.status, after.status);
        assert!(after.results.is_none());
        assert!(after.end_time.is_none());
    }
}
