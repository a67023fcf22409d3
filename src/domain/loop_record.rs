//! Loop record and related types
//!
//! A Loop is one goal instance living in a single period of its tier. The
//! serialized form is the collaborator contract shared with persistence and
//! the sync service, so field names follow the camelCase wire shape.

use crate::domain::tier::Tier;
use crate::id::{generate_loop_id, generate_subtask_id};
use serde::{Deserialize, Serialize};

/// Display colors offered for new loops
pub const PALETTE: [&str; 8] = [
    "#FF6B35", "#A78BFA", "#60A5FA", "#34D399", "#F472B6", "#FBBF24", "#FB7185", "#38BDF8",
];

/// A single goal instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loop {
    //=== Identity ===
    /// Opaque unique identifier, immutable after creation
    pub id: String,

    /// Which time tier the loop belongs to
    pub tier: Tier,

    //=== Behavior ===
    /// Open loops persist until resolved; windowed loops expire with their period
    #[serde(rename = "type")]
    pub kind: LoopKind,

    /// `Some(tier)` when a fresh instance is generated every period
    #[serde(default)]
    pub recurrence: Option<Tier>,

    /// Stored lifecycle status; `Closed` is derived, never written by rollover
    #[serde(default)]
    pub status: LoopStatus,

    //=== Display ===
    pub title: String,
    #[serde(default)]
    pub color: String,

    //=== Placement ===
    /// Period key matching the tier's granularity
    pub period: String,

    /// Weak reference to a parent loop one tier up; may dangle
    #[serde(default)]
    pub linked_to: Option<String>,

    /// Source period this instance was carried forward from
    #[serde(default)]
    pub rolled_from: Option<String>,

    //=== Work ===
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

/// Whether a loop is bound to its period window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopKind {
    /// No deadline; unfinished work carries forward
    Open,
    /// Must resolve within its period or is marked expired
    Windowed,
}

/// Stored status of a loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopStatus {
    #[default]
    Active,
    Expired,
    /// Display state for a fully completed loop. Accepted on the wire but
    /// the engine derives it from progress instead of storing it.
    Closed,
}

/// One checklist step of a loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

impl Subtask {
    /// Create a new, not-yet-done subtask with a fresh id
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: generate_subtask_id(),
            text: text.into(),
            done: false,
        }
    }

    /// Copy with a fresh id, optionally keeping the done flag
    pub fn fresh_copy(&self, keep_done: bool) -> Self {
        Self {
            id: generate_subtask_id(),
            text: self.text.clone(),
            done: keep_done && self.done,
        }
    }
}

impl Loop {
    /// Create a new active, non-recurring, unlinked loop
    pub fn new(tier: Tier, kind: LoopKind, title: impl Into<String>, period: impl Into<String>) -> Self {
        Self {
            id: generate_loop_id(),
            tier,
            kind,
            recurrence: None,
            status: LoopStatus::Active,
            title: title.into(),
            color: PALETTE[0].to_string(),
            period: period.into(),
            linked_to: None,
            rolled_from: None,
            subtasks: Vec::new(),
        }
    }

    /// Make the loop recur every period of its own tier
    pub fn recurring(mut self) -> Self {
        self.recurrence = Some(self.tier);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn link_to(mut self, parent_id: impl Into<String>) -> Self {
        self.linked_to = Some(parent_id.into());
        self
    }

    /// Append a subtask per text, in order
    pub fn with_steps<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subtasks.extend(texts.into_iter().map(Subtask::new));
        self
    }

    /// Returns true if a fresh instance is generated every period
    pub fn is_recurring(&self) -> bool {
        self.recurrence == Some(self.tier)
    }

    pub fn is_expired(&self) -> bool {
        self.status == LoopStatus::Expired
    }

    pub fn is_active(&self) -> bool {
        self.status == LoopStatus::Active
    }

    /// Number of subtasks marked done
    pub fn done_count(&self) -> usize {
        self.subtasks.iter().filter(|s| s.done).count()
    }

    /// New instance carrying unfinished work into `target`.
    ///
    /// Subtasks keep their order and done flags but get fresh ids.
    pub fn carried_into(&self, source: &str, target: &str) -> Self {
        Self {
            id: generate_loop_id(),
            period: target.to_string(),
            rolled_from: Some(source.to_string()),
            status: LoopStatus::Active,
            subtasks: self.subtasks.iter().map(|s| s.fresh_copy(true)).collect(),
            ..self.clone()
        }
    }

    /// Fresh recurring instance for `target` with every subtask reset
    pub fn regenerated_for(&self, target: &str) -> Self {
        Self {
            id: generate_loop_id(),
            period: target.to_string(),
            rolled_from: None,
            status: LoopStatus::Active,
            subtasks: self.subtasks.iter().map(|s| s.fresh_copy(false)).collect(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Loop {
        let mut l = Loop::new(Tier::Weekly, LoopKind::Open, "Build auth", "2024-W10")
            .with_steps(["Set up db", "Login flow", "Protect routes"]);
        l.subtasks[0].done = true;
        l
    }

    #[test]
    fn test_new_loop_defaults() {
        let l = Loop::new(Tier::Daily, LoopKind::Windowed, "Read", "2024-03-05");
        assert_eq!(l.status, LoopStatus::Active);
        assert!(l.recurrence.is_none());
        assert!(l.linked_to.is_none());
        assert!(l.rolled_from.is_none());
        assert!(l.subtasks.is_empty());
        assert_eq!(l.color, PALETTE[0]);
    }

    #[test]
    fn test_recurring_uses_own_tier() {
        let l = Loop::new(Tier::Weekly, LoopKind::Windowed, "Gym", "2024-W10").recurring();
        assert_eq!(l.recurrence, Some(Tier::Weekly));
        assert!(l.is_recurring());
    }

    #[test]
    fn test_carried_into_preserves_done_and_order() {
        let src = sample();
        let carried = src.carried_into("2024-W10", "2024-W11");

        assert_ne!(carried.id, src.id);
        assert_eq!(carried.period, "2024-W11");
        assert_eq!(carried.rolled_from.as_deref(), Some("2024-W10"));
        let texts: Vec<_> = carried.subtasks.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Set up db", "Login flow", "Protect routes"]);
        let done: Vec<_> = carried.subtasks.iter().map(|s| s.done).collect();
        assert_eq!(done, vec![true, false, false]);
        for (a, b) in carried.subtasks.iter().zip(&src.subtasks) {
            assert_ne!(a.id, b.id);
        }
    }

    #[test]
    fn test_regenerated_for_resets_subtasks() {
        let src = sample().recurring();
        let fresh = src.regenerated_for("2024-W11");

        assert!(fresh.rolled_from.is_none());
        assert_eq!(fresh.subtasks.len(), 3);
        assert!(fresh.subtasks.iter().all(|s| !s.done));
        assert_eq!(fresh.title, src.title);
        assert_eq!(fresh.recurrence, Some(Tier::Weekly));
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let l = sample().link_to("m1");
        let value = serde_json::to_value(&l).unwrap();

        assert_eq!(value["type"], "open");
        assert_eq!(value["tier"], "weekly");
        assert_eq!(value["status"], "active");
        assert_eq!(value["linkedTo"], "m1");
        assert!(value["rolledFrom"].is_null());
        assert!(value["recurrence"].is_null());
        assert_eq!(value["subtasks"][0]["done"], true);
    }

    #[test]
    fn test_deserialize_tolerates_missing_optionals_and_extra_fields() {
        let json = r#"{
            "id": "w1", "tier": "weekly", "type": "windowed",
            "title": "Gym", "period": "2024-W10",
            "subtasks": [{"id": "a", "text": "Mon"}],
            "created_at": "2024-03-01T10:00:00"
        }"#;
        let l: Loop = serde_json::from_str(json).unwrap();

        assert_eq!(l.status, LoopStatus::Active);
        assert_eq!(l.kind, LoopKind::Windowed);
        assert!(l.recurrence.is_none());
        assert!(!l.subtasks[0].done);
    }

    #[test]
    fn test_closed_status_accepted_on_wire() {
        let status: LoopStatus = serde_json::from_str("\"closed\"").unwrap();
        assert_eq!(status, LoopStatus::Closed);
    }
}
