// armgym-env: Transport-free environment logic for the robot-arm gym adapter.

pub mod action;
pub mod episode;
pub mod normalizer;
pub mod reward;
pub mod stats;

pub mod prelude {
    pub use crate::action::{ActionDecoder, DecodedAction};
    pub use crate::episode::{Episode, EpisodeState};
    pub use crate::normalizer::{ObservationNormalizer, detect_joint_count};
    pub use crate::reward::{EngineState, RewardEngine, RewardOutcome};
    pub use crate::stats::EpisodeStats;
}
