//! In-memory [`Transport`] driven by a script of replies.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use armgym_core::error::{ArmError, TransportError};
use armgym_core::traits::Transport;

// ---------------------------------------------------------------------------
// ScriptedReply
// ---------------------------------------------------------------------------

/// One scripted outcome of a `request` call.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return these bytes as the reply payload.
    Bytes(Vec<u8>),
    /// Fail with [`TransportError::Timeout`].
    Timeout,
    /// Fail with [`TransportError::PeerClosed`].
    PeerClosed,
}

impl ScriptedReply {
    /// Reply with the JSON encoding of `value`.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::Bytes(value.to_string().into_bytes())
    }
}

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ScriptState {
    replies: VecDeque<ScriptedReply>,
    requests: Vec<Vec<u8>>,
    connected: bool,
    connects: u32,
    disconnects: u32,
    refuse_connect: bool,
}

/// Transport whose replies come from a queue.
///
/// Cloning shares the script, so a test can keep a clone as a handle after
/// moving the transport into the environment.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build with an initial reply script.
    pub fn with_replies(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        let t = Self::new();
        t.lock().replies.extend(replies);
        t
    }

    /// Append a reply to the script.
    pub fn push(&self, reply: ScriptedReply) {
        self.lock().replies.push_back(reply);
    }

    /// Append a JSON reply to the script.
    pub fn push_json(&self, value: &serde_json::Value) {
        self.push(ScriptedReply::json(value));
    }

    /// Make subsequent `connect` calls fail.
    pub fn refuse_connect(&self, refuse: bool) {
        self.lock().refuse_connect = refuse;
    }

    /// Every request payload sent so far.
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.lock().requests.clone()
    }

    /// Every request payload sent so far, parsed as JSON.
    pub fn request_json(&self) -> Vec<serde_json::Value> {
        self.lock()
            .requests
            .iter()
            .filter_map(|r| serde_json::from_slice(r).ok())
            .collect()
    }

    pub fn connects(&self) -> u32 {
        self.lock().connects
    }

    pub fn disconnects(&self) -> u32 {
        self.lock().disconnects
    }

    /// Replies still queued.
    pub fn remaining(&self) -> usize {
        self.lock().replies.len()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Transport for ScriptedTransport {
    fn connect(&mut self) -> Result<(), ArmError> {
        let mut state = self.lock();
        if state.refuse_connect {
            return Err(TransportError::Connect {
                address: "scripted".into(),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            }
            .into());
        }
        if !state.connected {
            state.connected = true;
            state.connects += 1;
        }
        Ok(())
    }

    fn request(&mut self, payload: &[u8]) -> Result<Vec<u8>, ArmError> {
        let mut state = self.lock();
        state.requests.push(payload.to_vec());
        match state.replies.pop_front() {
            Some(ScriptedReply::Bytes(bytes)) => Ok(bytes),
            Some(ScriptedReply::Timeout) => {
                Err(TransportError::Timeout(Duration::from_millis(5000)).into())
            }
            Some(ScriptedReply::PeerClosed) | None => Err(TransportError::PeerClosed {
                received: 0,
                expected: 4,
            }
            .into()),
        }
    }

    fn disconnect(&mut self) {
        let mut state = self.lock();
        if state.connected {
            state.connected = false;
            state.disconnects += 1;
        }
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ScriptedTransport"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
