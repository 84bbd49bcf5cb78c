//! Builders for raw simulator observations and their wire form.

use armgym_core::types::RawObservation;

// ---------------------------------------------------------------------------
// ObservationBuilder
// ---------------------------------------------------------------------------

/// Fluent builder over [`RawObservation`], starting from the wire defaults.
#[derive(Debug, Clone, Default)]
pub struct ObservationBuilder {
    obs: RawObservation,
}

impl ObservationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn joints(mut self, angles: &[f32]) -> Self {
        self.obs.joint_angles = angles.to_vec();
        self
    }

    #[must_use]
    pub fn tcp(mut self, position: [f32; 3]) -> Self {
        self.obs.tool_center_point_position = position;
        self
    }

    #[must_use]
    pub fn direction(mut self, direction: [f32; 3]) -> Self {
        self.obs.direction_to_target = direction;
        self
    }

    #[must_use]
    pub fn distance(mut self, distance: f32) -> Self {
        self.obs.distance_to_target = distance;
        self
    }

    #[must_use]
    pub fn gripper_state(mut self, state: f32) -> Self {
        self.obs.gripper_state = state;
        self
    }

    #[must_use]
    pub fn gripping(mut self, gripping: bool) -> Self {
        self.obs.is_gripping_object = gripping;
        self
    }

    /// Laser reading; a reading shorter than the max range counts as a hit.
    #[must_use]
    pub fn laser(mut self, distance: f32) -> Self {
        self.obs.laser_sensor_hit = distance < 1.0;
        self.obs.laser_sensor_distance = distance;
        self
    }

    #[must_use]
    pub fn collision(mut self, collision: bool) -> Self {
        self.obs.collision_detected = collision;
        self
    }

    #[must_use]
    pub fn orientation_one_hot(mut self, one_hot: [f32; 2]) -> Self {
        self.obs.target_orientation_one_hot = one_hot;
        self
    }

    #[must_use]
    pub fn reset_frame(mut self, reset: bool) -> Self {
        self.obs.is_reset_frame = reset;
        self
    }

    pub fn build(self) -> RawObservation {
        self.obs
    }

    /// Serialize with the canonical (PascalCase) keys.
    pub fn to_json(&self) -> serde_json::Value {
        observation_json(&self.obs)
    }
}

/// Canonical JSON form of a raw observation.
pub fn observation_json(obs: &RawObservation) -> serde_json::Value {
    serde_json::to_value(obs).unwrap_or_default()
}

/// Observation at `distance` from the target with the TCP at `tcp`.
pub fn observation_at(distance: f32, tcp: [f32; 3]) -> RawObservation {
    ObservationBuilder::new().distance(distance).tcp(tcp).build()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
