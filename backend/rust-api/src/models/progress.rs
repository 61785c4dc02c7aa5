use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProgressError;

/// One stage of the fixed learning progression. The sequence is part of the
/// product contract: completing a level moves the learner to the next entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Comparison,
    Simplification,
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl Level {
    /// Canonical order, first to last. Fixed at build time.
    pub const SEQUENCE: [Level; 6] = [
        Level::Comparison,
        Level::Simplification,
        Level::Addition,
        Level::Subtraction,
        Level::Multiplication,
        Level::Division,
    ];

    pub fn first() -> Level {
        Level::SEQUENCE[0]
    }

    /// Successor in the sequence; the last level has none.
    pub fn next(self) -> Option<Level> {
        let index = Level::SEQUENCE.iter().position(|level| *level == self)?;
        Level::SEQUENCE.get(index + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Comparison => "comparison",
            Level::Simplification => "simplification",
            Level::Addition => "addition",
            Level::Subtraction => "subtraction",
            Level::Multiplication => "multiplication",
            Level::Division => "division",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::SEQUENCE
            .iter()
            .copied()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| ProgressError::InvalidLevel(s.to_string()))
    }
}

/// Per-level record of the best score seen, attempt count and completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelProgress {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub attempts: u32,
    /// Part of the stored shape; the update rule never writes it.
    #[serde(default)]
    pub last_attempt: Option<String>,
}

/// Per-user aggregate, stored as a single document keyed by `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: String,
    #[serde(default = "Level::first")]
    pub current_level: Level,
    #[serde(default)]
    pub completed_levels: Vec<Level>,
    #[serde(default)]
    pub progress: HashMap<String, LevelProgress>,
}

impl UserProgress {
    /// Fresh record for a user the store has never seen.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            current_level: Level::first(),
            completed_levels: Vec::new(),
            progress: HashMap::new(),
        }
    }

    /// Applies one attempt on `level` to this record.
    ///
    /// Scores are a running maximum and never regress, `attempts` counts
    /// every call, and a recorded completion is permanent. Only the first
    /// completion of a level appends it to `completed_levels` and advances
    /// `current_level` to that level's successor; the last level has no
    /// successor and leaves `current_level` alone.
    pub fn apply_update(&mut self, level: Level, score: u32, completed: bool) {
        let entry = self
            .progress
            .entry(level.as_str().to_string())
            .or_default();
        entry.score = entry.score.max(score);
        entry.attempts += 1;
        entry.completed = entry.completed || completed;

        if completed && !self.completed_levels.contains(&level) {
            self.completed_levels.push(level);
            // Advancement follows the level just completed, not
            // current_level: first-time completion of an earlier level moves
            // the learner back to its successor. Known product quirk, kept
            // on purpose.
            if let Some(next) = level.next() {
                self.current_level = next;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_sequence_order_and_successors() {
        assert_eq!(Level::first(), Level::Comparison);
        assert_eq!(Level::Comparison.next(), Some(Level::Simplification));
        assert_eq!(Level::Simplification.next(), Some(Level::Addition));
        assert_eq!(Level::Addition.next(), Some(Level::Subtraction));
        assert_eq!(Level::Subtraction.next(), Some(Level::Multiplication));
        assert_eq!(Level::Multiplication.next(), Some(Level::Division));
        assert_eq!(Level::Division.next(), None);
    }

    #[test]
    fn level_parses_canonical_names_only() {
        assert_eq!("comparison".parse::<Level>().unwrap(), Level::Comparison);
        assert_eq!("division".parse::<Level>().unwrap(), Level::Division);

        let err = "geometry".parse::<Level>().unwrap_err();
        assert!(matches!(err, ProgressError::InvalidLevel(ref name) if name == "geometry"));
    }

    #[test]
    fn score_is_a_running_max_in_either_order() {
        let mut record = UserProgress::new("u1");
        record.apply_update(Level::Addition, 40, false);
        record.apply_update(Level::Addition, 90, false);
        assert_eq!(record.progress["addition"].score, 90);

        let mut record = UserProgress::new("u2");
        record.apply_update(Level::Addition, 90, false);
        record.apply_update(Level::Addition, 40, false);
        assert_eq!(record.progress["addition"].score, 90);
        assert_eq!(record.progress["addition"].attempts, 2);
    }

    #[test]
    fn attempts_count_every_call() {
        let mut record = UserProgress::new("u1");
        record.apply_update(Level::Comparison, 50, false);
        record.apply_update(Level::Comparison, 100, true);
        record.apply_update(Level::Comparison, 0, false);
        record.apply_update(Level::Comparison, 0, true);
        assert_eq!(record.progress["comparison"].attempts, 4);
    }

    #[test]
    fn completion_is_sticky() {
        let mut record = UserProgress::new("u1");
        record.apply_update(Level::Comparison, 80, true);
        record.apply_update(Level::Comparison, 20, false);
        assert!(record.progress["comparison"].completed);
    }

    #[test]
    fn completed_levels_has_no_duplicates() {
        let mut record = UserProgress::new("u1");
        record.apply_update(Level::Comparison, 80, true);
        record.apply_update(Level::Comparison, 95, true);
        record.apply_update(Level::Comparison, 60, true);
        assert_eq!(record.completed_levels, vec![Level::Comparison]);
    }

    #[test]
    fn first_completion_advances_to_successor() {
        let mut record = UserProgress::new("u1");
        record.apply_update(Level::Comparison, 80, true);
        assert_eq!(record.current_level, Level::Simplification);
    }

    #[test]
    fn completing_last_level_leaves_current_level_unchanged() {
        let mut record = UserProgress::new("u1");
        record.apply_update(Level::Division, 100, true);
        assert_eq!(record.current_level, Level::Comparison);
        assert_eq!(record.completed_levels, vec![Level::Division]);
    }

    #[test]
    fn repeat_completion_does_not_advance_again() {
        let mut record = UserProgress::new("u1");
        record.apply_update(Level::Comparison, 80, true);
        record.apply_update(Level::Simplification, 70, true);
        assert_eq!(record.current_level, Level::Addition);

        // Re-submitting an already completed level counts the attempt but
        // moves nothing.
        record.apply_update(Level::Comparison, 99, true);
        assert_eq!(record.current_level, Level::Addition);
        assert_eq!(
            record.completed_levels,
            vec![Level::Comparison, Level::Simplification]
        );
        assert_eq!(record.progress["comparison"].attempts, 2);
    }

    #[test]
    fn first_completion_of_earlier_level_moves_current_level_backward() {
        let mut record = UserProgress::new("u1");
        record.apply_update(Level::Simplification, 70, true);
        assert_eq!(record.current_level, Level::Addition);

        // Comparison was never completed before, so its first completion
        // advances to its own successor, behind where the learner was.
        record.apply_update(Level::Comparison, 80, true);
        assert_eq!(record.current_level, Level::Simplification);
    }

    #[test]
    fn update_rule_never_writes_last_attempt() {
        let mut record = UserProgress::new("u1");
        record.apply_update(Level::Comparison, 80, true);
        assert_eq!(record.progress["comparison"].last_attempt, None);
    }

    #[test]
    fn serializes_with_level_names_as_strings() {
        let mut record = UserProgress::new("u1");
        record.apply_update(Level::Comparison, 80, true);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["current_level"], "simplification");
        assert_eq!(json["completed_levels"][0], "comparison");
        assert_eq!(json["progress"]["comparison"]["score"], 80);
    }

    #[test]
    fn deserializes_missing_fields_to_defaults() {
        let record: UserProgress =
            serde_json::from_value(serde_json::json!({ "user_id": "u1" })).unwrap();
        assert_eq!(record.current_level, Level::Comparison);
        assert!(record.completed_levels.is_empty());
        assert!(record.progress.is_empty());
    }
}
