//! Integration test: drive `RobotArmEnv` against a fake simulator over TCP.
//!
//! The fake speaks the real wire format (4-byte big-endian length prefix,
//! JSON body) on a loopback port, so these tests cover framing, codec,
//! transport, normalization, reward and lifecycle together.

use std::time::Duration;

use approx::assert_relative_eq;
use armgym_core::config::{EnvConfig, KeyCasing};
use armgym_core::error::{ArmError, StateError, TransportError};
use armgym_core::types::{EpisodeOutcome, EpisodeSummary};
use armgym_env::stats::EpisodeStats;
use armgym_gym::prelude::*;
use armgym_test_utils::{FakeSimulator, ObservationBuilder, SimReply, random_action, seeded_rng};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

const NEUTRAL: [f32; 7] = [0.0; 7];

fn config_for(sim: &FakeSimulator) -> EnvConfig {
    EnvConfig {
        address: sim.address(),
        timeout_ms: 2000,
        ..EnvConfig::default()
    }
}

#[test]
fn reset_then_step_matches_reaching_scenario() {
    let sim = FakeSimulator::reaching().unwrap();
    let mut env = RobotArmEnv::open(config_for(&sim)).unwrap();

    let reset = env.reset().unwrap();
    assert_eq!(reset.info.joint_count, 6);
    assert!(reset.info.is_reset_frame);
    assert_eq!(reset.observation.len(), 17);

    let step = env.step(&NEUTRAL).unwrap();
    let c = step.info.reward_components;
    assert_relative_eq!(c.distance, 1.0, epsilon = 1e-5);
    assert!(c.alignment > 0.0);
    assert_relative_eq!(c.alignment, 0.5, epsilon = 1e-5);
    assert!(c.grasp.abs() < f32::EPSILON);
    assert!(c.collision.abs() < f32::EPSILON);
    assert!(!step.terminated);
    assert!(!step.truncated);
    // TCP at x = 0.1 m over a 0.6 m workspace radius
    assert_relative_eq!(step.observation[7], 0.1 / 0.6, epsilon = 1e-5);

    let received = sim.received();
    assert_eq!(received[0], json!({"Type": "RESET"}));
    assert_eq!(received[1]["Type"], "STEP");
    assert_eq!(received[1]["Actions"].as_array().unwrap().len(), 5);
    assert_eq!(received[1]["Axis6Orientation"], 1);
}

#[test]
fn truncation_only_at_episode_budget() {
    let sim = FakeSimulator::spawn(|_| SimReply::Json(ObservationBuilder::new().distance(0.5).to_json())).unwrap();
    let mut env = RobotArmEnv::open(config_for(&sim)).unwrap();
    env.reset().unwrap();

    for step in 1..=500u32 {
        let s = env.step(&NEUTRAL).unwrap();
        assert_eq!(s.truncated, step == 500, "step {step}");
        assert!(!s.terminated);
        assert_eq!(s.info.episode_length, step);
    }
    assert_eq!(env.state(), LifecycleState::Idle);
    assert!(matches!(
        env.step(&NEUTRAL).unwrap_err(),
        ArmError::State(StateError::NoEpisode)
    ));
}

#[test]
fn collision_ends_episode_and_notifies_observer() {
    let sim = FakeSimulator::spawn(|cmd: &Value| {
        let collided = cmd["Type"] == "STEP";
        SimReply::Json(
            ObservationBuilder::new()
                .distance(0.5)
                .collision(collided)
                .to_json(),
        )
    })
    .unwrap();
    let stats = Arc::new(Mutex::new(EpisodeStats::new()));
    let mut env = RobotArmEnv::open(config_for(&sim)).unwrap();
    {
        let stats = Arc::clone(&stats);
        env.set_observer(move |s: &EpisodeSummary| stats.lock().unwrap().record(s));
    }

    for _ in 0..3 {
        env.reset().unwrap();
        let s = env.step(&NEUTRAL).unwrap();
        assert!(s.terminated);
        assert!(s.info.collision);
        assert_relative_eq!(s.reward, -100.0);
    }

    let stats = stats.lock().unwrap();
    assert_eq!(stats.episodes_completed, 3);
    assert_eq!(stats.collisions, 3);
    assert_eq!(stats.total_steps, 3);
}

#[test]
fn configure_round_trip() {
    let sim = FakeSimulator::reaching().unwrap();
    let mut env = RobotArmEnv::open(config_for(&sim)).unwrap();
    env.configure(true).unwrap();
    env.configure(false).unwrap();
    let received = sim.received();
    assert_eq!(received[0], json!({"Type": "CONFIG", "SimulationModeEnabled": true}));
    assert_eq!(received[1], json!({"Type": "CONFIG", "SimulationModeEnabled": false}));
    assert_eq!(env.state(), LifecycleState::Connected);
}

#[test]
fn camel_casing_deployment() {
    let sim = FakeSimulator::spawn(|cmd: &Value| {
        assert!(cmd.get("type").is_some());
        SimReply::Json(json!({"jointAngles": [90.0, 0.0, 0.0], "distanceToTarget": 0.3}))
    })
    .unwrap();
    let config = EnvConfig {
        key_casing: KeyCasing::Camel,
        ..config_for(&sim)
    };
    let mut env = RobotArmEnv::open(config).unwrap();
    let reset = env.reset().unwrap();
    assert_eq!(reset.info.joint_count, 3);
    assert_relative_eq!(reset.observation[0], 1.0);
    assert_eq!(sim.received()[0], json!({"type": "RESET"}));
}

#[test]
fn silent_simulator_times_out_and_disconnects() {
    let sim = FakeSimulator::scripted(vec![
        SimReply::Json(ObservationBuilder::new().to_json()),
        SimReply::Silent,
    ])
    .unwrap();
    let config = EnvConfig {
        timeout_ms: 200,
        ..config_for(&sim)
    };
    let mut env = RobotArmEnv::open(config).unwrap();
    env.reset().unwrap();

    let err = env.step(&NEUTRAL).unwrap_err();
    assert!(matches!(
        err,
        ArmError::Transport(TransportError::Timeout(d)) if d == Duration::from_millis(200)
    ));
    assert_eq!(env.state(), LifecycleState::Disconnected);
    assert!(matches!(
        env.reset().unwrap_err(),
        ArmError::State(StateError::NotConnected)
    ));
}

#[test]
fn peer_closing_mid_frame_is_transport_error() {
    let sim = FakeSimulator::scripted(vec![SimReply::Truncated {
        announced: 64,
        body: b"{\"JointAngles\":".to_vec(),
    }])
    .unwrap();
    let mut env = RobotArmEnv::open(config_for(&sim)).unwrap();
    let err = env.reset().unwrap_err();
    assert!(matches!(
        err,
        ArmError::Transport(TransportError::PeerClosed { expected: 64, .. })
    ));
    assert_eq!(env.state(), LifecycleState::Disconnected);
}

#[test]
fn reconnect_after_failure() {
    let mut calls = 0;
    let sim = FakeSimulator::spawn(move |_| {
        calls += 1;
        if calls == 2 {
            SimReply::Close
        } else {
            SimReply::Json(ObservationBuilder::new().distance(0.5).to_json())
        }
    })
    .unwrap();
    let mut env = RobotArmEnv::open(config_for(&sim)).unwrap();
    env.reset().unwrap();
    assert!(env.step(&NEUTRAL).unwrap_err().is_transport());

    env.connect().unwrap();
    env.reset().unwrap();
    assert!(env.step(&NEUTRAL).is_ok());
}

#[test]
fn connect_refused_is_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = EnvConfig {
        address: format!("tcp://127.0.0.1:{port}"),
        timeout_ms: 500,
        ..EnvConfig::default()
    };
    let err = RobotArmEnv::open(config).unwrap_err();
    assert!(matches!(
        err,
        ArmError::Transport(TransportError::Connect { .. })
    ));
}

#[test]
fn random_rollout_stays_in_bounds() {
    let sim = FakeSimulator::reaching().unwrap();
    let mut env = RobotArmEnv::open(config_for(&sim)).unwrap();
    let obs_space = env.observation_space().clone();
    let mut rng = seeded_rng(5);

    env.reset().unwrap();
    for _ in 0..20 {
        let action = random_action(&mut rng);
        let s = env.step(&action).unwrap();
        assert!(obs_space.contains(s.observation.as_slice()));
        assert!(s.reward.is_finite());
    }
    env.close();
    assert_eq!(env.state(), LifecycleState::Closed);
}

#[test]
fn client_send_raw_over_tcp() {
    let sim = FakeSimulator::spawn(|cmd: &Value| SimReply::Json(json!({"Echo": cmd.clone()}))).unwrap();
    let mut client = SimClient::from_config(&config_for(&sim)).unwrap();
    client.connect().unwrap();
    let reply = client.send_raw(json!({"Type": "PING"})).unwrap();
    assert_eq!(reply["Echo"]["Type"], "PING");
    client.disconnect();
    client.disconnect();
}

#[test]
fn summary_outcome_on_truncation() {
    let sim = FakeSimulator::spawn(|_| SimReply::Json(ObservationBuilder::new().to_json())).unwrap();
    let config = EnvConfig {
        max_episode_steps: 2,
        ..config_for(&sim)
    };
    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let mut env = RobotArmEnv::open(config).unwrap();
    {
        let outcomes = Arc::clone(&outcomes);
        env.set_observer(move |s: &EpisodeSummary| outcomes.lock().unwrap().push(s.outcome));
    }
    env.reset().unwrap();
    env.step(&NEUTRAL).unwrap();
    assert!(env.step(&NEUTRAL).unwrap().truncated);
    assert_eq!(*outcomes.lock().unwrap(), vec![EpisodeOutcome::Truncated]);
}
