use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Width of the normalized observation vector.
pub const OBSERVATION_DIM: usize = 17;

/// Width of the action vector: 5 joint deltas, axis-6 orientation, gripper.
pub const ACTION_DIM: usize = 7;

/// Maximum number of arm joints the observation layout reserves slots for.
pub const MAX_JOINTS: usize = 6;

/// Laser distance reported when the simulator omits it (nothing in range).
pub const DEFAULT_LASER_DISTANCE: f32 = 1.0;

// ---------------------------------------------------------------------------
// JointCount
// ---------------------------------------------------------------------------

/// Number of joints reported by the simulator, in `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointCount(usize);

impl JointCount {
    /// Validate a joint count detected from an observation.
    pub fn new(count: usize) -> Result<Self, ProtocolError> {
        if count == 0 || count > MAX_JOINTS {
            return Err(ProtocolError::InvalidJointCount(count));
        }
        Ok(Self(count))
    }

    pub const fn get(self) -> usize {
        self.0
    }

    /// Number of joint deltas that can be commanded (the sixth axis is
    /// driven by the discrete orientation bit instead).
    pub const fn commandable(self) -> usize {
        if self.0 < 5 { self.0 } else { 5 }
    }
}

impl std::fmt::Display for JointCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RawObservation
// ---------------------------------------------------------------------------

const fn default_gripper_state() -> f32 {
    1.0
}
const fn default_laser_distance() -> f32 {
    DEFAULT_LASER_DISTANCE
}
fn default_joint_angles() -> Vec<f32> {
    vec![0.0; MAX_JOINTS]
}
const fn default_orientation_one_hot() -> [f32; 2] {
    [1.0, 0.0]
}

/// Physical telemetry for one exchange, in simulator units.
///
/// Angles are degrees, positions meters. Every field missing from the wire
/// takes the default documented on the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct RawObservation {
    /// Joint angles in degrees. Default: six zeros.
    #[serde(default = "default_joint_angles")]
    pub joint_angles: Vec<f32>,
    /// Tool center point position in meters. Default: origin.
    #[serde(default)]
    pub tool_center_point_position: [f32; 3],
    /// Unit vector from the TCP towards the target. Default: zero.
    #[serde(default)]
    pub direction_to_target: [f32; 3],
    /// Default: 0.
    #[serde(default)]
    pub distance_to_target: f32,
    /// 1.0 = fully open. Default: fully open.
    #[serde(default = "default_gripper_state")]
    pub gripper_state: f32,
    #[serde(default)]
    pub is_gripping_object: bool,
    #[serde(default)]
    pub laser_sensor_hit: bool,
    /// Default: maximum range.
    #[serde(default = "default_laser_distance")]
    pub laser_sensor_distance: f32,
    #[serde(default)]
    pub collision_detected: bool,
    /// `[vertical, horizontal]`. Default: index 0 set.
    #[serde(default = "default_orientation_one_hot")]
    pub target_orientation_one_hot: [f32; 2],
    #[serde(default)]
    pub is_reset_frame: bool,
}

impl Default for RawObservation {
    fn default() -> Self {
        Self {
            joint_angles: default_joint_angles(),
            tool_center_point_position: [0.0; 3],
            direction_to_target: [0.0; 3],
            distance_to_target: 0.0,
            gripper_state: default_gripper_state(),
            is_gripping_object: false,
            laser_sensor_hit: false,
            laser_sensor_distance: default_laser_distance(),
            collision_detected: false,
            target_orientation_one_hot: default_orientation_one_hot(),
            is_reset_frame: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Kind tag of a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    #[serde(rename = "STEP")]
    Step,
    #[serde(rename = "RESET")]
    Reset,
    #[serde(rename = "CONFIG")]
    Configure,
}

/// Discrete target orientation of the sixth axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

impl From<Orientation> for u8 {
    fn from(o: Orientation) -> Self {
        match o {
            Orientation::Vertical => 0,
            Orientation::Horizontal => 1,
        }
    }
}

impl TryFrom<u8> for Orientation {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Vertical),
            1 => Ok(Self::Horizontal),
            other => Err(format!("orientation must be 0 or 1, got {other}")),
        }
    }
}

/// A single request to the simulator.
///
/// Only the fields meaningful for the kind are populated; the constructors
/// are the only way to build one outside this crate's tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Command {
    #[serde(rename = "Type")]
    kind: CommandKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    actions: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gripper_close_value: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    axis6_orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    simulation_mode_enabled: Option<bool>,
}

impl Command {
    /// Move the joints by `deltas` degrees, set the sixth axis and gripper.
    pub const fn step(deltas: Vec<f32>, orientation: Orientation, gripper: f32) -> Self {
        Self {
            kind: CommandKind::Step,
            actions: Some(deltas),
            gripper_close_value: Some(gripper),
            axis6_orientation: Some(orientation),
            simulation_mode_enabled: None,
        }
    }

    /// Start a new episode.
    pub const fn reset() -> Self {
        Self {
            kind: CommandKind::Reset,
            actions: None,
            gripper_close_value: None,
            axis6_orientation: None,
            simulation_mode_enabled: None,
        }
    }

    /// Switch between instant (training) and smooth (simulation) motion.
    pub const fn configure(simulation_mode: bool) -> Self {
        Self {
            kind: CommandKind::Configure,
            actions: None,
            gripper_close_value: None,
            axis6_orientation: None,
            simulation_mode_enabled: Some(simulation_mode),
        }
    }

    pub const fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn actions(&self) -> Option<&[f32]> {
        self.actions.as_deref()
    }

    pub const fn gripper_close_value(&self) -> Option<f32> {
        self.gripper_close_value
    }

    pub const fn axis6_orientation(&self) -> Option<Orientation> {
        self.axis6_orientation
    }

    pub const fn simulation_mode_enabled(&self) -> Option<bool> {
        self.simulation_mode_enabled
    }
}

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// Fixed-width normalized observation, every component in `[-1, 1]`.
///
/// Layout: 6 joint angles, gripper state, 3 TCP position, 3 direction to
/// target, laser distance, is-gripping, 2 target orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    data: [f32; OBSERVATION_DIM],
}

impl Observation {
    pub const fn new(data: [f32; OBSERVATION_DIM]) -> Self {
        Self { data }
    }

    pub const fn zeros() -> Self {
        Self {
            data: [0.0; OBSERVATION_DIM],
        }
    }

    #[allow(clippy::unused_self)]
    pub const fn len(&self) -> usize {
        OBSERVATION_DIM
    }

    #[allow(clippy::unused_self)]
    pub const fn is_empty(&self) -> bool {
        false
    }

    pub const fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub const fn into_array(self) -> [f32; OBSERVATION_DIM] {
        self.data
    }
}

impl std::ops::Index<usize> for Observation {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        &self.data[i]
    }
}

// ---------------------------------------------------------------------------
// BoxSpace
// ---------------------------------------------------------------------------

/// Continuous box space. Follows Gymnasium conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    pub low: Vec<f32>,
    pub high: Vec<f32>,
}

impl BoxSpace {
    /// A box of `dim` components, each bounded by `[low, high]`.
    pub fn uniform(dim: usize, low: f32, high: f32) -> Self {
        Self {
            low: vec![low; dim],
            high: vec![high; dim],
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        vec![self.low.len()]
    }

    pub fn contains(&self, values: &[f32]) -> bool {
        values.len() == self.low.len()
            && values
                .iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(v, (l, h))| v >= l && v <= h)
    }
}

// ---------------------------------------------------------------------------
// RewardComponents
// ---------------------------------------------------------------------------

/// Named reward terms; the total reward is their sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardComponents {
    pub distance: f32,
    pub alignment: f32,
    pub grasp: f32,
    pub collision: f32,
    pub underground: f32,
    pub survival: f32,
}

impl RewardComponents {
    pub fn total(&self) -> f32 {
        self.distance + self.alignment + self.grasp + self.collision + self.underground + self.survival
    }
}

// ---------------------------------------------------------------------------
// StepResult / ResetResult
// ---------------------------------------------------------------------------

/// Diagnostics of one reward computation and the running episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub reward_components: RewardComponents,
    /// Grasp predicate held this step.
    pub success: bool,
    pub collision: bool,
    pub underground: bool,
    pub episode_length: u32,
    pub episode_reward: f32,
}

/// Result of `env.step(action)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    /// Episode ended due to collision or leaving the workspace floor.
    pub terminated: bool,
    /// Episode ended due to the step budget.
    pub truncated: bool,
    pub info: StepInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetInfo {
    pub joint_count: usize,
    pub is_reset_frame: bool,
}

/// Result of `env.reset()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResetResult {
    pub observation: Observation,
    pub info: ResetInfo,
}

// ---------------------------------------------------------------------------
// EpisodeSummary
// ---------------------------------------------------------------------------

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeOutcome {
    Collision,
    Underground,
    Truncated,
}

/// Handed to an episode observer once per finished episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// 1-based index since the environment was created.
    pub episode_number: u32,
    pub steps: u32,
    pub total_reward: f32,
    pub outcome: EpisodeOutcome,
    /// The grasp predicate held on at least one step.
    pub succeeded: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
