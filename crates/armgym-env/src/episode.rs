//! Episode bookkeeping: step count, accumulated reward, end state.
//!
//! An episode is a single rollout from reset to termination or truncation.

use armgym_core::types::{EpisodeOutcome, EpisodeSummary};

// ---------------------------------------------------------------------------
// EpisodeState
// ---------------------------------------------------------------------------

/// Lifecycle state of an episode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EpisodeState {
    /// Before the first reset.
    #[default]
    Idle,
    /// Actively stepping.
    Running,
    /// Ended by collision or by leaving the workspace floor.
    Terminated(EpisodeOutcome),
    /// Ended by the step budget.
    Truncated,
}

impl EpisodeState {
    /// Returns `true` if the episode is finished.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated(_) | Self::Truncated)
    }

    /// Returns `true` if the episode is active.
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Why the episode ended, if it has.
    pub const fn outcome(self) -> Option<EpisodeOutcome> {
        match self {
            Self::Terminated(outcome) => Some(outcome),
            Self::Truncated => Some(EpisodeOutcome::Truncated),
            Self::Idle | Self::Running => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Episode
// ---------------------------------------------------------------------------

/// Tracks the current episode's state.
#[derive(Clone, Debug, Default)]
pub struct Episode {
    /// Current lifecycle state.
    pub state: EpisodeState,
    /// Number of steps taken this episode.
    pub step_count: u32,
    /// Total accumulated reward this episode.
    pub total_reward: f32,
    /// Grasp success seen on any step this episode.
    pub succeeded: bool,
    /// Number of episodes started since creation.
    pub episode_number: u32,
}

impl Episode {
    /// Start a new episode.
    pub const fn reset(&mut self) {
        self.state = EpisodeState::Running;
        self.step_count = 0;
        self.total_reward = 0.0;
        self.succeeded = false;
        self.episode_number += 1;
    }

    /// Advance one step, accumulating reward. Returns `false` if the
    /// episode is not running.
    pub fn advance(&mut self, reward: f32, success: bool) -> bool {
        if self.state != EpisodeState::Running {
            return false;
        }
        self.step_count += 1;
        self.total_reward += reward;
        self.succeeded |= success;
        true
    }

    /// Mark the episode as terminated.
    pub const fn terminate(&mut self, outcome: EpisodeOutcome) {
        self.state = EpisodeState::Terminated(outcome);
    }

    /// Check if the episode is truncated by `max_steps`.
    /// Returns `true` and sets the state if the limit is reached while
    /// running.
    pub fn check_truncation(&mut self, max_steps: u32) -> bool {
        if self.step_count >= max_steps && self.state == EpisodeState::Running {
            self.state = EpisodeState::Truncated;
            return true;
        }
        false
    }

    /// Summary of a finished episode. `None` while it is still running.
    pub fn summary(&self) -> Option<EpisodeSummary> {
        self.state.outcome().map(|outcome| EpisodeSummary {
            episode_number: self.episode_number,
            steps: self.step_count,
            total_reward: self.total_reward,
            outcome,
            succeeded: self.succeeded,
        })
    }

    /// Whether the episode is in a terminal state.
    pub const fn is_done(&self) -> bool {
        self.state.is_terminal()
    }

    /// Whether the episode is actively running.
    pub const fn is_running(&self) -> bool {
        self.state.is_running()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- EpisodeState --

    #[test]
    fn state_default_is_idle() {
        assert_eq!(EpisodeState::default(), EpisodeState::Idle);
    }

    #[test]
    fn state_terminal_detection() {
        assert!(!EpisodeState::Idle.is_terminal());
        assert!(!EpisodeState::Running.is_terminal());
        assert!(EpisodeState::Terminated(EpisodeOutcome::Collision).is_terminal());
        assert!(EpisodeState::Truncated.is_terminal());
    }

    #[test]
    fn state_outcome() {
        assert_eq!(EpisodeState::Running.outcome(), None);
        assert_eq!(
            EpisodeState::Terminated(EpisodeOutcome::Underground).outcome(),
            Some(EpisodeOutcome::Underground)
        );
        assert_eq!(
            EpisodeState::Truncated.outcome(),
            Some(EpisodeOutcome::Truncated)
        );
    }

    // -- Episode --

    #[test]
    fn episode_default_is_idle() {
        let ep = Episode::default();
        assert_eq!(ep.state, EpisodeState::Idle);
        assert_eq!(ep.step_count, 0);
        assert!(ep.total_reward.abs() < f32::EPSILON);
        assert_eq!(ep.episode_number, 0);
        assert!(ep.summary().is_none());
    }

    #[test]
    fn episode_reset_transitions_to_running() {
        let mut ep = Episode::default();
        ep.reset();
        assert!(ep.is_running());
        assert_eq!(ep.episode_number, 1);
        ep.reset();
        assert_eq!(ep.episode_number, 2);
    }

    #[test]
    fn episode_advance_accumulates() {
        let mut ep = Episode::default();
        ep.reset();
        assert!(ep.advance(1.5, false));
        assert!(ep.advance(2.0, true));
        assert!(ep.advance(0.5, false));
        assert_eq!(ep.step_count, 3);
        assert!((ep.total_reward - 4.0).abs() < f32::EPSILON);
        assert!(ep.succeeded);
    }

    #[test]
    fn episode_advance_fails_when_not_running() {
        let mut ep = Episode::default();
        assert!(!ep.advance(1.0, false)); // Idle
        ep.reset();
        ep.terminate(EpisodeOutcome::Collision);
        assert!(!ep.advance(1.0, false));
        assert_eq!(ep.step_count, 0);
    }

    #[test]
    fn episode_check_truncation() {
        let mut ep = Episode::default();
        ep.reset();
        for _ in 0..9 {
            ep.advance(1.0, false);
        }
        assert!(!ep.check_truncation(10));
        ep.advance(1.0, false);
        assert!(ep.check_truncation(10));
        assert_eq!(ep.state, EpisodeState::Truncated);
    }

    #[test]
    fn truncation_does_not_override_termination() {
        let mut ep = Episode::default();
        ep.reset();
        ep.advance(-100.0, false);
        ep.terminate(EpisodeOutcome::Collision);
        assert!(!ep.check_truncation(1));
        assert_eq!(ep.state.outcome(), Some(EpisodeOutcome::Collision));
    }

    #[test]
    fn summary_reports_finished_episode() {
        let mut ep = Episode::default();
        ep.reset();
        ep.advance(2.0, true);
        ep.terminate(EpisodeOutcome::Underground);
        let s = ep.summary().unwrap();
        assert_eq!(s.episode_number, 1);
        assert_eq!(s.steps, 1);
        assert_eq!(s.outcome, EpisodeOutcome::Underground);
        assert!(s.succeeded);
    }
}
