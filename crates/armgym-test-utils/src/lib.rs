//! Shared test fixtures and utilities for armgym crates.
//!
//! Provides raw-observation builders, a scripted in-memory transport,
//! chunking readers, a fake length-framed simulator and deterministic RNG.

pub mod chunked;
pub mod fake_sim;
pub mod fixtures;
pub mod mocks;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use chunked::{ChunkedReader, ChunkedWriter};
pub use fake_sim::{FakeSimulator, SimReply};
pub use fixtures::{ObservationBuilder, observation_at, observation_json};
pub use mocks::{ScriptedReply, ScriptedTransport};
pub use rng::{random_action, seeded_rng};
