//! Raw telemetry to the fixed 17-wide observation vector.
//!
//! Layout (indices):
//!
//! | range   | content                                   |
//! |---------|-------------------------------------------|
//! | 0..6    | joint angles / joint limit, zero-padded   |
//! | 6       | gripper state                             |
//! | 7..10   | TCP position / workspace radius           |
//! | 10..13  | direction to target, unchanged            |
//! | 13      | laser distance / laser max range          |
//! | 14      | is-gripping flag (0 or 1)                 |
//! | 15..17  | target orientation one-hot                |
//!
//! Every component is clipped to `[-1, 1]` after assembly.

use armgym_core::config::NormalizationConfig;
use armgym_core::error::ProtocolError;
use armgym_core::types::{JointCount, MAX_JOINTS, OBSERVATION_DIM, Observation, RawObservation};
use tracing::{info, warn};

pub const GRIPPER_INDEX: usize = 6;
pub const TCP_RANGE: std::ops::Range<usize> = 7..10;
pub const DIRECTION_RANGE: std::ops::Range<usize> = 10..13;
pub const LASER_INDEX: usize = 13;
pub const GRIPPING_INDEX: usize = 14;
pub const ORIENTATION_RANGE: std::ops::Range<usize> = 15..17;

// ---------------------------------------------------------------------------
// Joint count detection
// ---------------------------------------------------------------------------

/// Detect the joint count from `raw`, or check it against the cached one.
///
/// The first call fills `cached`; later calls fail with
/// [`ProtocolError::JointCountChanged`] if the simulator reports a
/// different number of joints.
pub fn detect_joint_count(
    cached: &mut Option<JointCount>,
    raw: &RawObservation,
) -> Result<JointCount, ProtocolError> {
    let got = raw.joint_angles.len();
    match *cached {
        Some(joints) if joints.get() == got => Ok(joints),
        Some(joints) => {
            warn!(detected = joints.get(), got, "simulator changed its joint count");
            Err(ProtocolError::JointCountChanged {
                detected: joints.get(),
                got,
            })
        }
        None => {
            let joints = JointCount::new(got)?;
            info!(joints = got, "detected joint count from simulator");
            *cached = Some(joints);
            Ok(joints)
        }
    }
}

// ---------------------------------------------------------------------------
// ObservationNormalizer
// ---------------------------------------------------------------------------

/// Maps [`RawObservation`]s into bounded [`Observation`]s.
#[derive(Debug, Clone, Default)]
pub struct ObservationNormalizer {
    config: NormalizationConfig,
}

impl ObservationNormalizer {
    /// `config` must have passed `EnvConfig::validate`.
    pub const fn new(config: NormalizationConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &NormalizationConfig {
        &self.config
    }

    /// Normalize `raw` for an arm with `joints` joints.
    ///
    /// Angles beyond `joints` are ignored; missing angles read as zero.
    pub fn normalize(&self, raw: &RawObservation, joints: JointCount) -> Observation {
        let mut out = [0.0_f32; OBSERVATION_DIM];

        for (slot, (angle, limit)) in out[..MAX_JOINTS]
            .iter_mut()
            .zip(raw.joint_angles.iter().zip(self.config.joint_limits))
            .take(joints.get())
        {
            *slot = angle / limit;
        }

        out[GRIPPER_INDEX] = raw.gripper_state;
        for (slot, p) in out[TCP_RANGE].iter_mut().zip(raw.tool_center_point_position) {
            *slot = p / self.config.workspace_radius;
        }
        out[DIRECTION_RANGE].copy_from_slice(&raw.direction_to_target);
        out[LASER_INDEX] = raw.laser_sensor_distance / self.config.laser_max_range;
        out[GRIPPING_INDEX] = if raw.is_gripping_object { 1.0 } else { 0.0 };
        out[ORIENTATION_RANGE].copy_from_slice(&raw.target_orientation_one_hot);

        for v in &mut out {
            *v = clip_unit(*v);
        }
        Observation::new(out)
    }
}

/// Clip to `[-1, 1]`. NaN maps to 0.
fn clip_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
