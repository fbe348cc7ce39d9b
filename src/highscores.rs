//! High score leaderboard system
//!
//! Tracks the top 10 scores. Persisted by the host to a JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Player's score
    pub score: u64,
    /// Level reached
    pub level: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: u64,
}

/// High score leaderboard
///
/// Sorted by score descending. Equal scores rank the newer entry first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Ties displace the lowest entry since newer wins
        self.entries.last().is_none_or(|e| score >= e.score)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        Some(self.insertion_index(score) + 1)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, score: u64, level: u32, timestamp: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let index = self.insertion_index(score);
        self.entries.insert(
            index,
            HighScoreEntry {
                score,
                level,
                timestamp,
            },
        );

        // Trim to max size
        self.entries.truncate(MAX_HIGH_SCORES);

        Some(index + 1)
    }

    /// First slot whose score the new score matches or beats
    fn insertion_index(&self, score: u64) -> usize {
        self.entries
            .iter()
            .position(|e| score >= e.score)
            .unwrap_or(self.entries.len())
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut scores: HighScores = serde_json::from_str(json)?;
        // Files may be hand-edited
        scores
            .entries
            .sort_by(|a, b| b.score.cmp(&a.score).then(b.timestamp.cmp(&a.timestamp)));
        scores.entries.truncate(MAX_HIGH_SCORES);
        Ok(scores)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load high scores from a file, starting fresh if it is missing or corrupt
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let Ok(json) = std::fs::read_to_string(path) else {
            log::info!("No high scores found, starting fresh");
            return Self::new();
        };
        match Self::from_json(&json) {
            Ok(scores) => {
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Err(e) => {
                log::warn!("High score file {} unreadable ({}), starting fresh", path.display(), e);
                Self::new()
            }
        }
    }

    /// Save high scores to a file
    pub fn save_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_descending_and_capped() {
        let mut scores = HighScores::new();
        for (i, score) in [50, 300, 10, 900, 120, 75, 640, 20, 30, 40, 500, 5].iter().enumerate() {
            scores.add_score(*score, 1, i as u64);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        let values: Vec<u64> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(values, vec![900, 640, 500, 300, 120, 75, 50, 40, 30, 20]);
        assert_eq!(scores.top_score(), Some(900));
    }

    #[test]
    fn test_ties_rank_newer_first() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(100, 1, 1000), Some(1));
        assert_eq!(scores.add_score(100, 2, 2000), Some(1));
        assert_eq!(scores.entries[0].timestamp, 2000);
        assert_eq!(scores.entries[1].timestamp, 1000);
    }

    #[test]
    fn test_zero_never_qualifies() {
        let mut scores = HighScores::new();
        assert!(!scores.qualifies(0));
        assert_eq!(scores.add_score(0, 1, 0), None);
        assert!(scores.is_empty());
    }

    #[test]
    fn test_full_board_rejects_lower_scores() {
        let mut scores = HighScores::new();
        for i in 0..MAX_HIGH_SCORES as u64 {
            scores.add_score(100 + i * 10, 1, i);
        }
        assert!(!scores.qualifies(99));
        assert_eq!(scores.potential_rank(99), None);
        // Matching the lowest score still gets in, as the newer entry
        assert_eq!(scores.potential_rank(100), Some(MAX_HIGH_SCORES));
        assert_eq!(scores.add_score(100, 3, 99), Some(MAX_HIGH_SCORES));
        assert_eq!(scores.entries.last().map(|e| e.timestamp), Some(99));
    }

    #[test]
    fn test_json_is_resorted() {
        let json = r#"{ "entries": [
            { "score": 10, "level": 1, "timestamp": 1 },
            { "score": 30, "level": 2, "timestamp": 2 }
        ] }"#;
        let scores = HighScores::from_json(json).expect("valid json");
        assert_eq!(scores.top_score(), Some(30));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir()
            .join(format!("neon-breakout-scores-{}.json", std::process::id()));
        let mut scores = HighScores::new();
        scores.add_score(420, 3, 7);
        scores.save_to(&path).expect("writable temp dir");
        assert_eq!(HighScores::load_from(&path), scores);
        let _ = std::fs::remove_file(&path);
    }
}
