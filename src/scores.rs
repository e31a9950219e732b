//! Best results per level preset
//!
//! One entry per (difficulty, debuff) pair. Completion beats failure, then
//! more tokens, then fewer frames. Persistence is left to the host via JSON.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::sim::LevelOutcome;
use crate::tuning::{Debuff, Difficulty};

/// Best outcome for one preset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub difficulty: Difficulty,
    pub debuff: Debuff,
    pub outcome: LevelOutcome,
}

/// Order outcomes best-first
pub fn compare_outcomes(a: &LevelOutcome, b: &LevelOutcome) -> Ordering {
    b.completed
        .cmp(&a.completed)
        .then(b.tokens_collected.cmp(&a.tokens_collected))
        .then(a.frames.cmp(&b.frames))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    /// Sorted by difficulty, then debuff
    pub entries: Vec<ScoreEntry>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn best(&self, difficulty: Difficulty, debuff: Debuff) -> Option<&LevelOutcome> {
        self.entries
            .iter()
            .find(|e| e.difficulty == difficulty && e.debuff == debuff)
            .map(|e| &e.outcome)
    }

    /// Check if an outcome would replace the stored best
    pub fn qualifies(&self, difficulty: Difficulty, debuff: Debuff, outcome: &LevelOutcome) -> bool {
        self.best(difficulty, debuff)
            .map(|best| compare_outcomes(outcome, best) == Ordering::Less)
            .unwrap_or(true)
    }

    /// Record an outcome. Returns true if it is a new best.
    pub fn record(&mut self, difficulty: Difficulty, debuff: Debuff, outcome: LevelOutcome) -> bool {
        if !self.qualifies(difficulty, debuff, &outcome) {
            return false;
        }

        let key = (difficulty, debuff);
        match self
            .entries
            .binary_search_by(|e| (e.difficulty, e.debuff).cmp(&key))
        {
            Ok(i) => self.entries[i].outcome = outcome,
            Err(i) => self.entries.insert(
                i,
                ScoreEntry {
                    difficulty,
                    debuff,
                    outcome,
                },
            ),
        }
        log::info!(
            "New best for {} / {}: {}/{} tokens",
            difficulty.as_str(),
            debuff.label(),
            outcome.tokens_collected,
            outcome.tokens_available
        );
        true
    }

    /// Presets completed at least once
    pub fn completed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.completed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string(self)?)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(completed: bool, tokens: u32, frames: u64) -> LevelOutcome {
        LevelOutcome {
            completed,
            tokens_collected: tokens,
            tokens_available: 5,
            frames,
        }
    }

    #[test]
    fn test_first_outcome_is_best() {
        let mut board = Scoreboard::new();
        assert!(board.is_empty());
        assert!(board.record(Difficulty::Easy, Debuff::None, outcome(false, 0, 100)));
        assert_eq!(board.best(Difficulty::Easy, Debuff::None), Some(&outcome(false, 0, 100)));
        assert_eq!(board.best(Difficulty::Hard, Debuff::None), None);
    }

    #[test]
    fn test_completion_beats_tokens() {
        let mut board = Scoreboard::new();
        board.record(Difficulty::Easy, Debuff::None, outcome(false, 5, 100));
        assert!(board.record(Difficulty::Easy, Debuff::None, outcome(true, 0, 900)));
        assert!(!board.record(Difficulty::Easy, Debuff::None, outcome(false, 5, 10)));
        assert!(board.record(Difficulty::Easy, Debuff::None, outcome(true, 1, 900)));
        assert!(board.record(Difficulty::Easy, Debuff::None, outcome(true, 1, 800)));
        // Equal is not an improvement
        assert!(!board.record(Difficulty::Easy, Debuff::None, outcome(true, 1, 800)));
        assert_eq!(board.completed_count(), 1);
    }

    #[test]
    fn test_entries_sorted_by_preset() {
        let mut board = Scoreboard::new();
        board.record(Difficulty::Hard, Debuff::None, outcome(true, 0, 1));
        board.record(Difficulty::Easy, Debuff::LackContrast, outcome(true, 0, 1));
        board.record(Difficulty::Easy, Debuff::None, outcome(true, 0, 1));
        let keys: Vec<_> = board.entries.iter().map(|e| (e.difficulty, e.debuff)).collect();
        assert_eq!(
            keys,
            vec![
                (Difficulty::Easy, Debuff::None),
                (Difficulty::Easy, Debuff::LackContrast),
                (Difficulty::Hard, Debuff::None),
            ]
        );
    }

    #[test]
    fn test_json_round_trip() {
        let mut board = Scoreboard::new();
        board.record(Difficulty::Medium, Debuff::PanicProne, outcome(true, 3, 1234));
        let json = board.to_json().unwrap();
        assert_eq!(Scoreboard::from_json(&json).unwrap(), board);
    }
}
