use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::address::SimAddress;
use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

fn default_address() -> String {
    "tcp://localhost:5555".into()
}
const fn default_timeout_ms() -> u64 {
    5000
}
const fn default_max_episode_steps() -> u32 {
    500
}
const fn default_joint_limits() -> [f32; 6] {
    [90.0, 90.0, 90.0, 180.0, 90.0, 90.0]
}
const fn default_workspace_radius() -> f32 {
    0.6
}
const fn default_laser_max_range() -> f32 {
    1.0
}
const fn default_max_delta_degrees() -> f32 {
    10.0
}
const fn default_gripper_close_threshold() -> f32 {
    0.5
}
const fn default_distance_scale() -> f32 {
    10.0
}
const fn default_alignment_scale() -> f32 {
    0.5
}
const fn default_grasp_bonus() -> f32 {
    100.0
}
const fn default_collision_penalty() -> f32 {
    -100.0
}
const fn default_grasp_distance_threshold() -> f32 {
    0.05
}
const fn default_motion_epsilon() -> f32 {
    1e-6
}

// ---------------------------------------------------------------------------
// Binding / KeyCasing
// ---------------------------------------------------------------------------

/// How messages are carried to the simulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    /// Plain TCP, every message prefixed by a 4-byte big-endian length.
    #[default]
    Framed,
    /// Message-oriented request/reply socket; the transport does the framing.
    RequestReply,
}

/// Casing of the top-level JSON keys on the wire.
///
/// `Pascal` matches `JsonUtility` field names (`JointAngles`); `Camel`
/// lower-cases the first letter (`jointAngles`). A deployment must use one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCasing {
    #[default]
    Pascal,
    Camel,
}

// ---------------------------------------------------------------------------
// NormalizationConfig
// ---------------------------------------------------------------------------

/// Constants mapping physical units into `[-1, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationConfig {
    /// Per-joint angle limit in degrees, sliced to the detected joint count.
    #[serde(default = "default_joint_limits")]
    pub joint_limits: [f32; 6],
    /// TCP coordinates are divided by this (meters).
    #[serde(default = "default_workspace_radius")]
    pub workspace_radius: f32,
    /// Laser distance is divided by this (meters).
    #[serde(default = "default_laser_max_range")]
    pub laser_max_range: f32,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            joint_limits: default_joint_limits(),
            workspace_radius: default_workspace_radius(),
            laser_max_range: default_laser_max_range(),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Joint delta produced by an action component of magnitude 1.
    #[serde(default = "default_max_delta_degrees")]
    pub max_delta_degrees: f32,
    /// For callers that need a binary open/closed decision. The decoder
    /// itself passes the gripper value through.
    #[serde(default = "default_gripper_close_threshold")]
    pub gripper_close_threshold: f32,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            max_delta_degrees: default_max_delta_degrees(),
            gripper_close_threshold: default_gripper_close_threshold(),
        }
    }
}

// ---------------------------------------------------------------------------
// RewardConfig
// ---------------------------------------------------------------------------

/// Reward shaping constants.
///
/// The grasp bonus is paid when the laser distance is below
/// `grasp_distance_threshold` while the gripper holds an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    #[serde(default = "default_distance_scale")]
    pub distance_scale: f32,
    #[serde(default = "default_alignment_scale")]
    pub alignment_scale: f32,
    #[serde(default = "default_grasp_bonus")]
    pub grasp_bonus: f32,
    #[serde(default = "default_collision_penalty")]
    pub collision_penalty: f32,
    #[serde(default = "default_grasp_distance_threshold")]
    pub grasp_distance_threshold: f32,
    /// TCP displacements shorter than this earn no alignment term.
    #[serde(default = "default_motion_epsilon")]
    pub motion_epsilon: f32,
    /// Applied and terminates the episode when the TCP goes below z = 0.
    /// `None` disables the check.
    #[serde(default)]
    pub underground_penalty: Option<f32>,
    /// Added on every non-terminal step. `None` disables it.
    #[serde(default)]
    pub survival_bonus: Option<f32>,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            distance_scale: default_distance_scale(),
            alignment_scale: default_alignment_scale(),
            grasp_bonus: default_grasp_bonus(),
            collision_penalty: default_collision_penalty(),
            grasp_distance_threshold: default_grasp_distance_threshold(),
            motion_epsilon: default_motion_epsilon(),
            underground_penalty: None,
            survival_bonus: None,
        }
    }
}

// ---------------------------------------------------------------------------
// EnvConfig
// ---------------------------------------------------------------------------

/// Complete environment configuration, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Simulator address, `tcp://host:port` (default port 5555).
    #[serde(default = "default_address")]
    pub address: String,
    /// Bound on connect and on every request/reply exchange.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub binding: Binding,
    #[serde(default)]
    pub key_casing: KeyCasing,
    /// Steps after which an episode is truncated.
    #[serde(default = "default_max_episode_steps")]
    pub max_episode_steps: u32,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(default)]
    pub action: ActionConfig,
    #[serde(default)]
    pub reward: RewardConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            timeout_ms: default_timeout_ms(),
            binding: Binding::default(),
            key_casing: KeyCasing::default(),
            max_episode_steps: default_max_episode_steps(),
            normalization: NormalizationConfig::default(),
            action: ActionConfig::default(),
            reward: RewardConfig::default(),
        }
    }
}

impl EnvConfig {
    /// Validate configuration. Returns Err on degenerate values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        SimAddress::parse(&self.address)?;
        if self.timeout_ms == 0 {
            return Err(ConfigError::invalid("timeout_ms", "must be > 0"));
        }
        if self.max_episode_steps == 0 {
            return Err(ConfigError::invalid("max_episode_steps", "must be > 0"));
        }

        let norm = &self.normalization;
        if let Some(i) = norm.joint_limits.iter().position(|l| !positive(*l)) {
            return Err(ConfigError::invalid(
                "normalization.joint_limits",
                format!("limit {i} must be finite and > 0"),
            ));
        }
        if !positive(norm.workspace_radius) {
            return Err(ConfigError::invalid(
                "normalization.workspace_radius",
                "must be finite and > 0",
            ));
        }
        if !positive(norm.laser_max_range) {
            return Err(ConfigError::invalid(
                "normalization.laser_max_range",
                "must be finite and > 0",
            ));
        }

        if !positive(self.action.max_delta_degrees) {
            return Err(ConfigError::invalid(
                "action.max_delta_degrees",
                "must be finite and > 0",
            ));
        }
        if !self.action.gripper_close_threshold.is_finite() {
            return Err(ConfigError::invalid(
                "action.gripper_close_threshold",
                "must be finite",
            ));
        }

        self.reward.validate()
    }

    /// Simulator address, parsed.
    pub fn sim_address(&self) -> Result<SimAddress, ConfigError> {
        SimAddress::parse(&self.address)
    }

    /// Receive/connect timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

impl RewardConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("reward.distance_scale", self.distance_scale),
            ("reward.alignment_scale", self.alignment_scale),
            ("reward.grasp_bonus", self.grasp_bonus),
            ("reward.grasp_distance_threshold", self.grasp_distance_threshold),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::invalid(field, "must be finite"));
            }
        }
        if !(self.collision_penalty.is_finite() && self.collision_penalty <= 0.0) {
            return Err(ConfigError::invalid(
                "reward.collision_penalty",
                "must be finite and <= 0",
            ));
        }
        if !positive(self.motion_epsilon) {
            return Err(ConfigError::invalid(
                "reward.motion_epsilon",
                "must be finite and > 0",
            ));
        }
        if let Some(p) = self.underground_penalty {
            if !(p.is_finite() && p <= 0.0) {
                return Err(ConfigError::invalid(
                    "reward.underground_penalty",
                    "must be finite and <= 0",
                ));
            }
        }
        if let Some(b) = self.survival_bonus {
            if !b.is_finite() {
                return Err(ConfigError::invalid("reward.survival_bonus", "must be finite"));
            }
        }
        Ok(())
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- defaults ----

    #[test]
    fn env_config_default_values() {
        let cfg = EnvConfig::default();
        assert_eq!(cfg.address, "tcp://localhost:5555");
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.binding, Binding::Framed);
        assert_eq!(cfg.key_casing, KeyCasing::Pascal);
        assert_eq!(cfg.max_episode_steps, 500);
        assert_eq!(
            cfg.normalization.joint_limits,
            [90.0, 90.0, 90.0, 180.0, 90.0, 90.0]
        );
        assert!((cfg.normalization.workspace_radius - 0.6).abs() < f32::EPSILON);
        assert!((cfg.action.max_delta_degrees - 10.0).abs() < f32::EPSILON);
        assert!((cfg.reward.collision_penalty - (-100.0)).abs() < f32::EPSILON);
        assert!(cfg.reward.underground_penalty.is_none());
        assert!(cfg.reward.survival_bonus.is_none());
    }

    #[test]
    fn env_config_default_validates() {
        assert!(EnvConfig::default().validate().is_ok());
    }

    // ---- validate ----

    #[test]
    fn rejects_zero_workspace_radius() {
        let mut cfg = EnvConfig::default();
        cfg.normalization.workspace_radius = 0.0;
        let err = cfg.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "normalization.workspace_radius")
        );
    }

    #[test]
    fn rejects_zero_joint_limit() {
        let mut cfg = EnvConfig::default();
        cfg.normalization.joint_limits[3] = 0.0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("limit 3"));
    }

    #[test]
    fn rejects_nan_laser_range() {
        let mut cfg = EnvConfig::default();
        cfg.normalization.laser_max_range = f32::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout_and_budget() {
        let cfg = EnvConfig {
            timeout_ms: 0,
            ..EnvConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = EnvConfig {
            max_episode_steps: 0,
            ..EnvConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_bad_address() {
        let cfg = EnvConfig {
            address: "http://localhost:5555".into(),
            ..EnvConfig::default()
        };
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ConfigError::InvalidAddress { .. }
        ));
    }

    #[test]
    fn rejects_positive_collision_penalty() {
        let mut cfg = EnvConfig::default();
        cfg.reward.collision_penalty = 5.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_positive_underground_penalty() {
        let mut cfg = EnvConfig::default();
        cfg.reward.underground_penalty = Some(1.0);
        assert!(cfg.validate().is_err());
    }

    // ---- TOML ----

    #[test]
    fn toml_empty_uses_defaults() {
        let cfg: EnvConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, EnvConfig::default());
    }

    #[test]
    fn toml_deserialization() {
        let toml_str = r#"
            address = "tcp://10.0.0.5:6000"
            timeout_ms = 2000
            binding = "request_reply"
            key_casing = "camel"
            max_episode_steps = 200

            [normalization]
            workspace_radius = 0.8

            [reward]
            grasp_distance_threshold = 0.3
            underground_penalty = -50.0
            survival_bonus = 0.01
        "#;
        let cfg: EnvConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.timeout_ms, 2000);
        assert_eq!(cfg.binding, Binding::RequestReply);
        assert_eq!(cfg.key_casing, KeyCasing::Camel);
        assert_eq!(cfg.max_episode_steps, 200);
        assert!((cfg.normalization.workspace_radius - 0.8).abs() < f32::EPSILON);
        assert!((cfg.normalization.laser_max_range - 1.0).abs() < f32::EPSILON);
        assert_eq!(cfg.reward.underground_penalty, Some(-50.0));
        assert_eq!(cfg.reward.survival_bonus, Some(0.01));
        assert!((cfg.reward.distance_scale - 10.0).abs() < f32::EPSILON);
        assert_eq!(cfg.sim_address().unwrap().port, 6000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn from_file_roundtrip() {
        let dir = std::env::temp_dir().join("armgym_test_env_config");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("env.toml");
        std::fs::write(&path, "max_episode_steps = 42\n").unwrap();

        let cfg = EnvConfig::from_file(&path).unwrap();
        assert_eq!(cfg.max_episode_steps, 42);

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_dir(&dir);
    }

    #[test]
    fn from_file_invalid() {
        let dir = std::env::temp_dir().join("armgym_test_env_config_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("env.toml");
        std::fs::write(&path, "[normalization]\nworkspace_radius = 0.0\n").unwrap();

        assert!(EnvConfig::from_file(&path).is_err());

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_dir(&dir);
    }

    #[test]
    fn from_file_not_found() {
        let err = EnvConfig::from_file("/nonexistent/armgym.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
