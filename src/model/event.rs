use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scoring::ScoringConfig;

/// Who places in an event: `individual` events place players, `group` events
/// place houses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Individual,
    Group,
}

impl EventKind {
    /// Parse the CLI/file spelling ("individual" or "group").
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "individual" => Ok(EventKind::Individual),
            "group" => Ok(EventKind::Group),
            other => bail!("Invalid event kind: {} (expected individual or group)", other),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Individual => write!(f, "individual"),
            EventKind::Group => write!(f, "group"),
        }
    }
}

/// Where an event sits in its lifecycle. Created `scheduled`; no terminal
/// state — a completed event can be reset back to `scheduled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventStatus {
    Scheduled,
    InProgress,
    Completed,
}

impl EventStatus {
    /// Statuses this one may move to directly.
    pub fn allowed_transitions(&self) -> &'static [EventStatus] {
        match self {
            EventStatus::Scheduled => &[EventStatus::InProgress],
            EventStatus::InProgress => &[EventStatus::Completed, EventStatus::Scheduled],
            EventStatus::Completed => &[EventStatus::Scheduled],
        }
    }

    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Parse the CLI/file spelling ("scheduled", "in-progress", "completed").
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" => Ok(EventStatus::Scheduled),
            "in-progress" | "in_progress" => Ok(EventStatus::InProgress),
            "completed" => Ok(EventStatus::Completed),
            other => bail!(
                "Invalid event status: {} (expected scheduled, in-progress, or completed)",
                other
            ),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Scheduled => write!(f, "scheduled"),
            EventStatus::InProgress => write!(f, "in-progress"),
            EventStatus::Completed => write!(f, "completed"),
        }
    }
}

/// One placement-to-participant assignment within a completed event.
/// `participant_id` is a player id on individual events, a house id on group
/// events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResult {
    pub placement: u32,
    pub participant_id: String,
}

/// A competition event. Owns its scoring table and (once completed) its
/// results; houses, players, and categories are referenced by id only.
///
/// Field presence tracks the lifecycle: `start_time` exists from start until
/// reset, `end_time` and `results` exist exactly while completed. The
/// optional fields are dropped from the serialized record when absent, so a
/// reset event round-trips without leftover keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    /// Unique among events, compared case-insensitively.
    pub name: String,
    pub category_id: String,
    pub kind: EventKind,
    pub status: EventStatus,
    pub scoring: ScoringConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<EventResult>>,
}

impl Event {
    /// Completed with at least one recorded result — the only shape that
    /// contributes to standings.
    pub fn is_scored(&self) -> bool {
        self.status == EventStatus::Completed
            && self.results.as_ref().is_some_and(|r| !r.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> Event {
        Event {
            id: "e1".to_string(),
            name: "Sack Race".to_string(),
            category_id: "c1".to_string(),
            kind: EventKind::Individual,
            status: EventStatus::Scheduled,
            scoring: ScoringConfig::new([(1, 5), (2, 3), (3, 1)]),
            start_time: None,
            end_time: None,
            results: None,
        }
    }

    #[test]
    fn test_transition_table() {
        use EventStatus::*;

        assert!(Scheduled.can_transition_to(InProgress));
        assert!(!Scheduled.can_transition_to(Completed));
        assert!(!Scheduled.can_transition_to(Scheduled));

        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Scheduled));
        assert!(!InProgress.can_transition_to(InProgress));

        assert!(Completed.can_transition_to(Scheduled));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Completed));
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&EventStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");

        let back: EventStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(back, EventStatus::InProgress);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(EventKind::parse("individual").unwrap(), EventKind::Individual);
        assert_eq!(EventKind::parse(" Group ").unwrap(), EventKind::Group);
        assert!(EventKind::parse("team").is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(EventStatus::parse("scheduled").unwrap(), EventStatus::Scheduled);
        assert_eq!(EventStatus::parse("In-Progress").unwrap(), EventStatus::InProgress);
        assert_eq!(EventStatus::parse("in_progress").unwrap(), EventStatus::InProgress);
        assert!(EventStatus::parse("done").is_err());
    }

    #[test]
    fn test_absent_fields_are_omitted_from_json() {
        let event = sample_event();
        let json = serde_json::to_string(&event).unwrap();

        // A never-started event has no trace of the lifecycle fields, not
        // nulls. Aggregation and reset semantics rely on real absence.
        assert!(!json.contains("start_time"));
        assert!(!json.contains("end_time"));
        assert!(!json.contains("results"));
    }

    #[test]
    fn test_completed_event_round_trips() {
        let mut event = sample_event();
        event.status = EventStatus::Completed;
        event.start_time = Some(Utc::now());
        event.end_time = Some(Utc::now());
        event.results = Some(vec![EventResult {
            placement: 1,
            participant_id: "p1".to_string(),
        }]);

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_is_scored() {
        let mut event = sample_event();
        assert!(!event.is_scored());

        event.status = EventStatus::Completed;
        event.results = Some(vec![]);
        assert!(!event.is_scored());

        event.results = Some(vec![EventResult {
            placement: 1,
            participant_id: "p1".to_string(),
        }]);
        assert!(event.is_scored());

        event.status = EventStatus::InProgress;
        assert!(!event.is_scored());
    }
}
