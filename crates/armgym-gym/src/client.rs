//! Simulator client: command codec on top of a transport.

use armgym_core::config::{Binding, EnvConfig};
use armgym_core::error::{ArmError, ConfigError, StateError};
use armgym_core::traits::Transport;
use armgym_core::types::{Command, RawObservation};
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::CommandCodec;
use crate::transport::TcpTransport;

/// Build the transport selected by `config.binding`.
pub fn transport_from_config(config: &EnvConfig) -> Result<Box<dyn Transport>, ConfigError> {
    let address = config.sim_address()?;
    match config.binding {
        Binding::Framed => Ok(Box::new(TcpTransport::new(address, config.timeout()))),
        #[cfg(feature = "zmq")]
        Binding::RequestReply => Ok(Box::new(crate::reqrep::ZmqTransport::new(
            address,
            config.timeout(),
        ))),
        #[cfg(not(feature = "zmq"))]
        Binding::RequestReply => Err(ConfigError::BindingUnavailable(
            "request_reply (build with the `zmq` feature)".into(),
        )),
    }
}

// ---------------------------------------------------------------------------
// SimClient
// ---------------------------------------------------------------------------

/// Sends commands to the simulator and decodes its observations.
///
/// One request is outstanding at a time. A transport failure disconnects
/// the client; [`connect`](Self::connect) must be called again.
pub struct SimClient {
    transport: Box<dyn Transport>,
    codec: CommandCodec,
}

impl SimClient {
    pub fn new(transport: Box<dyn Transport>, codec: CommandCodec) -> Self {
        Self { transport, codec }
    }

    /// Client with the transport and key casing named by `config`.
    pub fn from_config(config: &EnvConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            transport_from_config(config)?,
            CommandCodec::new(config.key_casing),
        ))
    }

    pub fn connect(&mut self) -> Result<(), ArmError> {
        self.transport.connect()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Safe to call any number of times.
    pub fn disconnect(&mut self) {
        self.transport.disconnect();
    }

    pub const fn codec(&self) -> CommandCodec {
        self.codec
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Send `command` and decode the observation it answers with.
    pub fn send_command(&mut self, command: &Command) -> Result<RawObservation, ArmError> {
        let payload = self.codec.encode(command)?;
        debug!(kind = ?command.kind(), bytes = payload.len(), "sending command");
        let reply = self.exchange(&payload)?;
        self.codec.decode_observation(&reply).map_err(|e| {
            warn!(error = %e, "undecodable observation from simulator");
            e.into()
        })
    }

    /// Send an arbitrary JSON document and return the decoded reply.
    ///
    /// Keys are passed through the codec's casing in both directions.
    pub fn send_raw(&mut self, request: Value) -> Result<Value, ArmError> {
        let payload = self.codec.encode_value(request)?;
        let reply = self.exchange(&payload)?;
        Ok(self.codec.decode_value(&reply)?)
    }

    fn exchange(&mut self, payload: &[u8]) -> Result<Vec<u8>, ArmError> {
        if !self.transport.is_connected() {
            return Err(StateError::NotConnected.into());
        }
        self.transport.request(payload).inspect_err(|e| {
            if e.is_transport() {
                warn!(error = %e, "transport failure, disconnecting");
                self.transport.disconnect();
            }
        })
    }
}

impl std::fmt::Debug for SimClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimClient")
            .field("transport", &self.transport.name())
            .field("connected", &self.transport.is_connected())
            .field("codec", &self.codec)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
