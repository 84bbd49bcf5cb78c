//! Action vector to simulator command.

use armgym_core::config::ActionConfig;
use armgym_core::error::ValidationError;
use armgym_core::types::{ACTION_DIM, Command, JointCount, Orientation};

/// Action slots reserved for joint deltas.
pub const DELTA_SLOTS: usize = 5;
/// Action index of the axis-6 orientation bit.
pub const ORIENTATION_INDEX: usize = 5;
/// Action index of the gripper command.
pub const GRIPPER_INDEX: usize = 6;

// ---------------------------------------------------------------------------
// DecodedAction
// ---------------------------------------------------------------------------

/// A decoded action in simulator units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedAction {
    /// Joint deltas in degrees for all reserved slots.
    pub joint_deltas: [f32; DELTA_SLOTS],
    /// How many leading deltas the simulator understands.
    pub commandable: usize,
    pub orientation: Orientation,
    /// Continuous gripper close value, passed through unscaled.
    pub gripper: f32,
}

impl DecodedAction {
    /// The deltas that are actually sent.
    pub fn commanded_deltas(&self) -> &[f32] {
        &self.joint_deltas[..self.commandable]
    }

    pub fn into_command(self) -> Command {
        Command::step(self.commanded_deltas().to_vec(), self.orientation, self.gripper)
    }
}

// ---------------------------------------------------------------------------
// ActionDecoder
// ---------------------------------------------------------------------------

/// Scales the `[-1, 1]` action box into joint deltas, an orientation bit
/// and a gripper command.
///
/// Range is not validated: out-of-box components scale linearly.
#[derive(Debug, Clone, Default)]
pub struct ActionDecoder {
    config: ActionConfig,
}

impl ActionDecoder {
    pub const fn new(config: ActionConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &ActionConfig {
        &self.config
    }

    pub fn decode(&self, action: &[f32], joints: JointCount) -> Result<DecodedAction, ValidationError> {
        if action.len() != ACTION_DIM {
            return Err(ValidationError::ActionDimMismatch {
                expected: ACTION_DIM,
                got: action.len(),
            });
        }

        let mut joint_deltas = [0.0; DELTA_SLOTS];
        for (delta, a) in joint_deltas.iter_mut().zip(action) {
            *delta = a * self.config.max_delta_degrees;
        }

        let orientation = if action[ORIENTATION_INDEX] < 0.0 {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        };

        Ok(DecodedAction {
            joint_deltas,
            commandable: joints.commandable(),
            orientation,
            gripper: action[GRIPPER_INDEX],
        })
    }

    /// Binary reading of a gripper command against the close threshold.
    pub fn is_gripper_closed(&self, gripper: f32) -> bool {
        gripper > self.config.gripper_close_threshold
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use armgym_core::types::CommandKind;

    fn joints(n: usize) -> JointCount {
        JointCount::new(n).unwrap()
    }

    #[test]
    fn scales_joint_deltas() {
        let decoder = ActionDecoder::default();
        let d = decoder
            .decode(&[1.0, -0.5, 0.0, 0.25, -1.0, 0.0, 0.0], joints(6))
            .unwrap();
        assert_eq!(d.joint_deltas, [10.0, -5.0, 0.0, 2.5, -10.0]);
        assert_eq!(d.commandable, 5);
        assert_eq!(d.commanded_deltas().len(), 5);
    }

    #[test]
    fn fewer_joints_limit_commanded_deltas() {
        let d = ActionDecoder::default()
            .decode(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.0, 0.0], joints(3))
            .unwrap();
        assert_eq!(d.commanded_deltas().len(), 3);
        assert_relative_eq!(d.joint_deltas[4], 5.0);
    }

    #[test]
    fn orientation_threshold_at_zero() {
        let decoder = ActionDecoder::default();
        let at = |v: f32| {
            decoder
                .decode(&[0.0, 0.0, 0.0, 0.0, 0.0, v, 0.0], joints(6))
                .unwrap()
                .orientation
        };
        assert_eq!(at(-0.001), Orientation::Vertical);
        assert_eq!(at(-1.0), Orientation::Vertical);
        assert_eq!(at(0.0), Orientation::Horizontal);
        assert_eq!(at(0.7), Orientation::Horizontal);
    }

    #[test]
    fn gripper_passes_through_unscaled() {
        let decoder = ActionDecoder::default();
        let d = decoder
            .decode(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.3], joints(6))
            .unwrap();
        assert_relative_eq!(d.gripper, 0.3);
        assert!(!decoder.is_gripper_closed(d.gripper));
        assert!(decoder.is_gripper_closed(0.9));
    }

    #[test]
    fn out_of_range_scales_linearly() {
        let d = ActionDecoder::default()
            .decode(&[2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 3.0], joints(6))
            .unwrap();
        assert_relative_eq!(d.joint_deltas[0], 20.0);
        assert_relative_eq!(d.gripper, 3.0);
    }

    #[test]
    fn wrong_width_rejected() {
        let err = ActionDecoder::default().decode(&[0.0; 6], joints(6)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ActionDimMismatch {
                expected: 7,
                got: 6
            }
        );
    }

    #[test]
    fn into_command_is_step() {
        let cmd = ActionDecoder::default()
            .decode(&[0.5, 0.5, 0.0, 0.0, 0.0, -1.0, 1.0], joints(2))
            .unwrap()
            .into_command();
        assert_eq!(cmd.kind(), CommandKind::Step);
        assert_eq!(cmd.actions(), Some(&[5.0, 5.0][..]));
        assert_eq!(cmd.axis6_orientation(), Some(Orientation::Vertical));
        assert_eq!(cmd.gripper_close_value(), Some(1.0));
    }
}
