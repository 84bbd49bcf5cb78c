// armgym-core: Types, traits, config and errors for the robot-arm gym adapter.

pub mod address;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub mod prelude {
    pub use crate::address::{DEFAULT_PORT, SimAddress};
    pub use crate::config::{
        ActionConfig, Binding, EnvConfig, KeyCasing, NormalizationConfig, RewardConfig,
    };
    pub use crate::error::{
        ArmError, ConfigError, ProtocolError, StateError, TransportError, ValidationError,
    };
    pub use crate::traits::{EpisodeObserver, Transport};
    pub use crate::types::{
        ACTION_DIM, BoxSpace, Command, CommandKind, DEFAULT_LASER_DISTANCE, EpisodeOutcome,
        EpisodeSummary, JointCount, MAX_JOINTS, OBSERVATION_DIM, Observation, Orientation,
        RawObservation, ResetInfo, ResetResult, RewardComponents, StepInfo, StepResult,
    };
}
