//! Reward and termination engine.
//!
//! Turns consecutive raw observations into a scalar reward, a termination
//! flag and a per-term breakdown. Truncation on the step budget is not
//! decided here.

use armgym_core::config::RewardConfig;
use armgym_core::types::{RawObservation, RewardComponents};
use tracing::debug;

// ---------------------------------------------------------------------------
// EngineState
// ---------------------------------------------------------------------------

/// Whether the engine has a valid previous frame to diff against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Right after [`RewardEngine::reset_state`]; motion terms are zero.
    #[default]
    AwaitingFirstStep,
    /// At least one reward has been computed this episode.
    Running,
}

// ---------------------------------------------------------------------------
// RewardOutcome
// ---------------------------------------------------------------------------

/// Result of one [`RewardEngine::calculate_reward`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RewardOutcome {
    /// Sum of all components.
    pub reward: f32,
    /// Collision or underground triggered.
    pub terminated: bool,
    pub components: RewardComponents,
    /// Grasp predicate held.
    pub success: bool,
    pub collision: bool,
    pub underground: bool,
}

// ---------------------------------------------------------------------------
// RewardEngine
// ---------------------------------------------------------------------------

/// Stateful reward function over consecutive observations.
///
/// Terms:
/// - distance: `(previous - current distance) * distance_scale`
/// - alignment: `dot(unit(displacement), direction_to_target) * alignment_scale`,
///   zero below `motion_epsilon` of displacement
/// - grasp: `grasp_bonus` when the laser reads closer than
///   `grasp_distance_threshold` while the gripper holds an object
/// - collision: `collision_penalty`, terminates
/// - underground (optional): penalty when TCP z < 0, terminates
/// - survival (optional): bonus on every non-terminal step
///
/// Distance and alignment are zero while [`EngineState::AwaitingFirstStep`].
/// Collision and underground penalties add up when both trigger.
#[derive(Debug, Clone)]
pub struct RewardEngine {
    config: RewardConfig,
    state: EngineState,
    previous_distance: f32,
    previous_position: [f32; 3],
}

impl Default for RewardEngine {
    fn default() -> Self {
        Self::new(RewardConfig::default())
    }
}

impl RewardEngine {
    pub const fn new(config: RewardConfig) -> Self {
        Self {
            config,
            state: EngineState::AwaitingFirstStep,
            previous_distance: 0.0,
            previous_position: [0.0; 3],
        }
    }

    pub const fn config(&self) -> &RewardConfig {
        &self.config
    }

    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// Seed the previous frame from `initial` and await the first step.
    pub const fn reset_state(&mut self, initial: &RawObservation) {
        self.previous_distance = initial.distance_to_target;
        self.previous_position = initial.tool_center_point_position;
        self.state = EngineState::AwaitingFirstStep;
    }

    /// Seed the previous frame from `initial` and treat it as a valid
    /// previous step, so the next call already earns motion terms.
    pub const fn begin_episode(&mut self, initial: &RawObservation) {
        self.reset_state(initial);
        self.state = EngineState::Running;
    }

    /// Compute the reward for `obs` and advance the previous frame.
    ///
    /// Total for any observation: non-finite terms are reported as zero.
    pub fn calculate_reward(&mut self, obs: &RawObservation) -> RewardOutcome {
        let cfg = &self.config;
        let first = self.state == EngineState::AwaitingFirstStep;
        let current_distance = obs.distance_to_target;
        let current_position = obs.tool_center_point_position;

        let mut c = RewardComponents::default();

        if !first {
            c.distance = finite_or_zero((self.previous_distance - current_distance) * cfg.distance_scale);
            c.alignment = finite_or_zero(self.alignment(current_position, obs.direction_to_target));
        }

        let success =
            obs.laser_sensor_distance < cfg.grasp_distance_threshold && obs.is_gripping_object;
        if success {
            c.grasp = cfg.grasp_bonus;
        }

        let collision = obs.collision_detected;
        if collision {
            c.collision = cfg.collision_penalty;
        }

        let underground = match cfg.underground_penalty {
            Some(penalty) if current_position[2] < 0.0 => {
                c.underground = penalty;
                true
            }
            _ => false,
        };

        let terminated = collision || underground;
        if !terminated {
            if let Some(bonus) = cfg.survival_bonus {
                c.survival = bonus;
            }
        }

        // Always advance, also on termination: only reset reseeds.
        self.previous_distance = current_distance;
        self.previous_position = current_position;
        self.state = EngineState::Running;

        let reward = c.total();
        debug!(
            reward,
            distance = c.distance,
            alignment = c.alignment,
            grasp = c.grasp,
            terminated,
            "reward computed"
        );

        RewardOutcome {
            reward,
            terminated,
            components: c,
            success,
            collision,
            underground,
        }
    }

    fn alignment(&self, current: [f32; 3], direction: [f32; 3]) -> f32 {
        let d = [
            current[0] - self.previous_position[0],
            current[1] - self.previous_position[1],
            current[2] - self.previous_position[2],
        ];
        let magnitude = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
        if !(magnitude >= self.config.motion_epsilon && magnitude.is_finite()) {
            return 0.0;
        }
        let dot = (d[0] * direction[0] + d[1] * direction[1] + d[2] * direction[2]) / magnitude;
        dot * self.config.alignment_scale
    }
}

const fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
