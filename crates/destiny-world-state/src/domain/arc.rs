//! Narrative arcs and arc progress.

use serde::{Deserialize, Serialize};

/// A named narrative phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub milestones: &'static [&'static str],
}

/// Known arcs, in story order.
pub const TIMELINE: &[ArcDefinition] = &[
    ArcDefinition {
        id: "intro",
        name: "The Beginning of the End",
        description: "The discovery of cursed energy.",
        milestones: &["Awakening", "First Exorcism"],
    },
    ArcDefinition {
        id: "shibuya",
        name: "Shibuya Incident",
        description: "Absolute chaos in Tokyo.",
        milestones: &["Gojo Sealed", "Sukuna Rampage"],
    },
];

impl ArcDefinition {
    /// Looks up a known arc by id.
    #[must_use]
    pub fn find(id: &str) -> Option<&'static ArcDefinition> {
        TIMELINE.iter().find(|arc| arc.id == id)
    }
}

/// Upper bound of arc progress, in percent.
pub const ARC_PROGRESS_CAP: f64 = 100.0;

/// Tracks which arc the world is in and how far along it is.
///
/// Progress is always within `0..=100`. Moving to another arc is decided
/// by the caller through [`ArcProgressTracker::restart`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcProgressTracker {
    /// Identifier of the current arc.
    pub arc_id: String,
    /// Completion percentage of the current arc.
    pub progress: f64,
}

impl ArcProgressTracker {
    /// Starts tracking `arc_id` from zero.
    #[must_use]
    pub fn new(arc_id: impl Into<String>) -> Self {
        Self {
            arc_id: arc_id.into(),
            progress: 0.0,
        }
    }

    /// Adds `delta` and clamps the result into `0..=100`. Non-finite deltas
    /// are ignored. Returns the new progress.
    pub fn advance(&mut self, delta: f64) -> f64 {
        if delta.is_finite() {
            self.progress = (self.progress + delta).clamp(0.0, ARC_PROGRESS_CAP);
        }
        self.progress
    }

    /// Whether the current arc has reached 100%.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress >= ARC_PROGRESS_CAP
    }

    /// Switches to `arc_id` and resets progress.
    pub fn restart(&mut self, arc_id: impl Into<String>) {
        self.arc_id = arc_id.into();
        self.progress = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_accumulates_within_arc() {
        let mut tracker = ArcProgressTracker::new("intro");

        tracker.advance(12.5);
        let progress = tracker.advance(7.5);

        assert!((progress - 20.0).abs() < f64::EPSILON);
        assert!(!tracker.is_complete());
    }

    #[test]
    fn test_advance_clamps_to_one_hundred() {
        let mut tracker = ArcProgressTracker::new("intro");
        tracker.progress = 95.0;

        let progress = tracker.advance(30.0);

        assert!((progress - 100.0).abs() < f64::EPSILON);
        assert!(tracker.is_complete());
    }

    #[test]
    fn test_advance_clamps_to_zero_on_negative_delta() {
        let mut tracker = ArcProgressTracker::new("intro");
        tracker.progress = 4.0;

        assert!(tracker.advance(-10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_advance_ignores_nan() {
        let mut tracker = ArcProgressTracker::new("intro");
        tracker.progress = 40.0;

        let progress = tracker.advance(f64::NAN);

        assert!((progress - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_find_known_arc() {
        assert_eq!(ArcDefinition::find("shibuya").map(|a| a.name), Some("Shibuya Incident"));
        assert!(ArcDefinition::find("culling_game").is_none());
    }
}
