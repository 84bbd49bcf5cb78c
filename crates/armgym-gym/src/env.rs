//! Gymnasium-style environment driving the external arm simulator.
//!
//! [`RobotArmEnv`] owns one simulator connection and one reward engine. It
//! exposes the `reset`/`step` API that training loops expect, plus
//! `configure` and `close` for interactive callers.

use armgym_core::config::EnvConfig;
use armgym_core::error::{ArmError, StateError};
use armgym_core::traits::{EpisodeObserver, Transport};
use armgym_core::types::{
    ACTION_DIM, BoxSpace, Command, EpisodeOutcome, JointCount, OBSERVATION_DIM, RawObservation,
    ResetInfo, ResetResult, StepInfo, StepResult,
};
use armgym_env::action::ActionDecoder;
use armgym_env::episode::{Episode, EpisodeState};
use armgym_env::normalizer::{ObservationNormalizer, detect_joint_count};
use armgym_env::reward::RewardEngine;
use tracing::{debug, info, warn};

use crate::client::SimClient;
use crate::codec::CommandCodec;

// ---------------------------------------------------------------------------
// LifecycleState
// ---------------------------------------------------------------------------

/// Public state of a [`RobotArmEnv`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// No connection to the simulator.
    Disconnected,
    /// Connected, no episode started yet.
    Connected,
    /// The last episode ended; `reset` starts the next one.
    Idle,
    /// An episode is running; `step` is allowed.
    InEpisode,
    /// `close` was called. Terminal.
    Closed,
}

// ---------------------------------------------------------------------------
// RobotArmEnv
// ---------------------------------------------------------------------------

/// Episode lifecycle controller for one simulated arm.
///
/// Each instance owns exactly one connection; run several instances for
/// parallel rollouts.
pub struct RobotArmEnv {
    config: EnvConfig,
    client: SimClient,
    normalizer: ObservationNormalizer,
    decoder: ActionDecoder,
    reward: RewardEngine,
    episode: Episode,
    joints: Option<JointCount>,
    closed: bool,
    observer: Option<Box<dyn EpisodeObserver>>,
    obs_space: BoxSpace,
    act_space: BoxSpace,
}

impl RobotArmEnv {
    /// Create an environment from `config` without connecting.
    pub fn new(config: EnvConfig) -> Result<Self, ArmError> {
        config.validate()?;
        let client = SimClient::from_config(&config)?;
        Ok(Self::assemble(config, client))
    }

    /// Create an environment from `config` and connect to the simulator.
    pub fn open(config: EnvConfig) -> Result<Self, ArmError> {
        let mut env = Self::new(config)?;
        env.connect()?;
        Ok(env)
    }

    /// Create an environment over a caller-supplied transport.
    ///
    /// `config.binding` and `config.address` are ignored.
    pub fn with_transport(config: EnvConfig, transport: Box<dyn Transport>) -> Result<Self, ArmError> {
        config.validate()?;
        let client = SimClient::new(transport, CommandCodec::new(config.key_casing));
        Ok(Self::assemble(config, client))
    }

    fn assemble(config: EnvConfig, client: SimClient) -> Self {
        Self {
            normalizer: ObservationNormalizer::new(config.normalization.clone()),
            decoder: ActionDecoder::new(config.action.clone()),
            reward: RewardEngine::new(config.reward.clone()),
            config,
            client,
            episode: Episode::default(),
            joints: None,
            closed: false,
            observer: None,
            obs_space: BoxSpace::uniform(OBSERVATION_DIM, -1.0, 1.0),
            act_space: BoxSpace::uniform(ACTION_DIM, -1.0, 1.0),
        }
    }

    // -- accessors --

    /// Observation space: 17 components in `[-1, 1]`.
    pub const fn observation_space(&self) -> &BoxSpace {
        &self.obs_space
    }

    /// Action space: 7 components in `[-1, 1]`.
    pub const fn action_space(&self) -> &BoxSpace {
        &self.act_space
    }

    pub const fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Joint count detected from the first observation, if any arrived yet.
    pub const fn joint_count(&self) -> Option<JointCount> {
        self.joints
    }

    /// Steps taken in the current (or last) episode.
    pub const fn step_count(&self) -> u32 {
        self.episode.step_count
    }

    pub const fn episode(&self) -> &Episode {
        &self.episode
    }

    pub const fn reward_engine(&self) -> &RewardEngine {
        &self.reward
    }

    pub fn state(&self) -> LifecycleState {
        if self.closed {
            return LifecycleState::Closed;
        }
        if !self.client.is_connected() {
            return LifecycleState::Disconnected;
        }
        match self.episode.state {
            EpisodeState::Idle => LifecycleState::Connected,
            EpisodeState::Running => LifecycleState::InEpisode,
            EpisodeState::Terminated(_) | EpisodeState::Truncated => LifecycleState::Idle,
        }
    }

    /// Receive a summary whenever an episode ends. Replaces any previous
    /// observer.
    pub fn set_observer(&mut self, observer: impl EpisodeObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    // -- lifecycle --

    /// Connect to the simulator. No-op while connected.
    pub fn connect(&mut self) -> Result<(), ArmError> {
        if self.closed {
            return Err(StateError::Closed.into());
        }
        self.client.connect()
    }

    /// Start a new episode.
    ///
    /// The reset frame seeds the reward engine as the previous step, so the
    /// first `step` is rewarded for progress relative to it.
    pub fn reset(&mut self) -> Result<ResetResult, ArmError> {
        self.ensure_open()?;
        let (raw, joints) = self.exchange_observation(&Command::reset())?;

        self.reward.begin_episode(&raw);
        self.episode.reset();
        debug!(episode = self.episode.episode_number, joints = %joints, "episode reset");

        Ok(ResetResult {
            observation: self.normalizer.normalize(&raw, joints),
            info: ResetInfo {
                joint_count: joints.get(),
                is_reset_frame: raw.is_reset_frame,
            },
        })
    }

    /// Apply `action` (7 values, nominally in `[-1, 1]`) for one step.
    ///
    /// If the reply cannot be used, the episode is abandoned without a
    /// summary and `reset` is required.
    pub fn step(&mut self, action: &[f32]) -> Result<StepResult, ArmError> {
        self.ensure_open()?;
        let joints = match (self.episode.state, self.joints) {
            (EpisodeState::Running, Some(joints)) => joints,
            _ => return Err(StateError::NoEpisode.into()),
        };

        let command = self.decoder.decode(action, joints)?.into_command();
        let (raw, _) = self.exchange_observation(&command)?;

        let outcome = self.reward.calculate_reward(&raw);
        self.episode.advance(outcome.reward, outcome.success);

        let max_steps = self.config.max_episode_steps;
        let truncated = self.episode.step_count >= max_steps;
        if outcome.terminated {
            self.episode.terminate(if outcome.collision {
                EpisodeOutcome::Collision
            } else {
                EpisodeOutcome::Underground
            });
        } else {
            self.episode.check_truncation(max_steps);
        }
        self.notify_if_done();

        Ok(StepResult {
            observation: self.normalizer.normalize(&raw, joints),
            reward: outcome.reward,
            terminated: outcome.terminated,
            truncated,
            info: StepInfo {
                reward_components: outcome.components,
                success: outcome.success,
                collision: outcome.collision,
                underground: outcome.underground,
                episode_length: self.episode.step_count,
                episode_reward: self.episode.total_reward,
            },
        })
    }

    /// Switch the simulator between instant (`false`) and smooth (`true`)
    /// motion. Leaves the episode untouched.
    pub fn configure(&mut self, simulation_mode: bool) -> Result<(), ArmError> {
        self.ensure_open()?;
        self.exchange(&Command::configure(simulation_mode))?;
        info!(simulation_mode, "simulator mode configured");
        Ok(())
    }

    /// Disconnect and refuse further use. Idempotent.
    pub fn close(&mut self) {
        self.client.disconnect();
        if !self.closed {
            self.closed = true;
            debug!("environment closed");
        }
    }

    fn ensure_open(&self) -> Result<(), StateError> {
        if self.closed {
            return Err(StateError::Closed);
        }
        if !self.client.is_connected() {
            return Err(StateError::NotConnected);
        }
        Ok(())
    }

    /// A transport failure abandons the running episode.
    fn exchange(&mut self, command: &Command) -> Result<RawObservation, ArmError> {
        self.client.send_command(command).inspect_err(|e| {
            if e.is_transport() {
                self.episode.state = EpisodeState::Idle;
            }
        })
    }

    /// Send a RESET or STEP and check the reply's joint count.
    ///
    /// Any failure abandons the episode: the simulator may already have
    /// acted on the command, so only a fresh `reset` may continue.
    fn exchange_observation(&mut self, command: &Command) -> Result<(RawObservation, JointCount), ArmError> {
        let result = self.client.send_command(command).and_then(|raw| {
            let joints = detect_joint_count(&mut self.joints, &raw)?;
            Ok((raw, joints))
        });
        if let Err(e) = &result {
            if self.episode.is_running() {
                warn!(error = %e, step = self.episode.step_count, "episode abandoned");
            }
            self.episode.state = EpisodeState::Idle;
        }
        result
    }

    fn notify_if_done(&mut self) {
        let Some(summary) = self.episode.summary() else {
            return;
        };
        debug!(
            episode = summary.episode_number,
            steps = summary.steps,
            reward = summary.total_reward,
            outcome = ?summary.outcome,
            "episode finished"
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.on_episode_end(&summary);
        }
    }
}

impl std::fmt::Debug for RobotArmEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotArmEnv")
            .field("state", &self.state())
            .field("client", &self.client)
            .field("joints", &self.joints)
            .field("episode", &self.episode)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
