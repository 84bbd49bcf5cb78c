//! Episode statistics tracking.
//!
//! [`EpisodeStats`] records cumulative counts across finished episodes:
//! how each one ended, total steps, and per-episode reward history.

use armgym_core::traits::EpisodeObserver;
use armgym_core::types::{EpisodeOutcome, EpisodeSummary};
use serde::Serialize;

// ---------------------------------------------------------------------------
// EpisodeStats
// ---------------------------------------------------------------------------

/// Cumulative statistics across episodes.
#[derive(Clone, Debug, Default, Serialize)]
pub struct EpisodeStats {
    /// Total number of completed episodes.
    pub episodes_completed: u32,
    /// Episodes where the grasp predicate held at least once.
    pub successes: u32,
    pub collisions: u32,
    pub underground: u32,
    pub truncations: u32,
    /// Total steps across all episodes.
    pub total_steps: u64,
    /// Total reward per completed episode.
    pub reward_history: Vec<f32>,
}

impl EpisodeStats {
    /// Create empty stats.
    pub const fn new() -> Self {
        Self {
            episodes_completed: 0,
            successes: 0,
            collisions: 0,
            underground: 0,
            truncations: 0,
            total_steps: 0,
            reward_history: Vec::new(),
        }
    }

    /// Record one finished episode.
    pub fn record(&mut self, summary: &EpisodeSummary) {
        self.episodes_completed += 1;
        self.total_steps += u64::from(summary.steps);
        self.reward_history.push(summary.total_reward);
        if summary.succeeded {
            self.successes += 1;
        }
        match summary.outcome {
            EpisodeOutcome::Collision => self.collisions += 1,
            EpisodeOutcome::Underground => self.underground += 1,
            EpisodeOutcome::Truncated => self.truncations += 1,
        }
    }

    /// Average total reward across completed episodes.
    pub fn mean_episode_reward(&self) -> Option<f32> {
        if self.reward_history.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.reward_history.iter().sum::<f32>() / self.reward_history.len() as f32)
    }

    /// Average episode length in steps.
    pub fn mean_episode_length(&self) -> Option<f32> {
        if self.episodes_completed == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.total_steps as f32 / self.episodes_completed as f32)
    }

    /// Fraction of completed episodes with a grasp success.
    pub fn success_rate(&self) -> Option<f32> {
        if self.episodes_completed == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.successes as f32 / self.episodes_completed as f32)
    }

    /// Reset all statistics.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl EpisodeObserver for EpisodeStats {
    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        self.record(summary);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
