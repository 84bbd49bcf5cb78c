//! Request/reply transport over a ZeroMQ `REQ` socket.
//!
//! The socket provides message framing, so payloads are sent as-is. A
//! receive timeout leaves the `REQ` socket unable to send again; the caller
//! must disconnect and reconnect, which recreates it.

use std::time::Duration;

use armgym_core::address::SimAddress;
use armgym_core::error::{ArmError, TransportError};
use armgym_core::traits::Transport;
use tracing::{debug, info, warn};

use crate::framing::MAX_MESSAGE_SIZE;

pub struct ZmqTransport {
    address: SimAddress,
    timeout: Duration,
    context: zmq::Context,
    socket: Option<zmq::Socket>,
}

impl ZmqTransport {
    pub fn new(address: SimAddress, timeout: Duration) -> Self {
        Self {
            address,
            timeout,
            context: zmq::Context::new(),
            socket: None,
        }
    }

    fn timeout_ms(&self) -> i32 {
        i32::try_from(self.timeout.as_millis()).unwrap_or(i32::MAX)
    }

    fn map_err(&self, e: zmq::Error) -> ArmError {
        match e {
            zmq::Error::EAGAIN => TransportError::Timeout(self.timeout).into(),
            other => TransportError::Socket(other.to_string()).into(),
        }
    }
}

impl Transport for ZmqTransport {
    fn connect(&mut self) -> Result<(), ArmError> {
        if self.socket.is_some() {
            return Ok(());
        }
        let endpoint = self.address.endpoint();
        let connect_err = |e: zmq::Error| TransportError::Connect {
            address: endpoint.clone(),
            source: std::io::Error::other(e.to_string()),
        };
        let socket = self.context.socket(zmq::REQ).map_err(connect_err)?;
        socket.set_linger(0).map_err(connect_err)?;
        socket.set_rcvtimeo(self.timeout_ms()).map_err(connect_err)?;
        socket.set_sndtimeo(self.timeout_ms()).map_err(connect_err)?;
        socket.connect(&endpoint).map_err(connect_err)?;
        info!(%endpoint, "connected to simulator (request/reply)");
        self.socket = Some(socket);
        Ok(())
    }

    fn request(&mut self, payload: &[u8]) -> Result<Vec<u8>, ArmError> {
        let Some(socket) = self.socket.as_ref() else {
            return Err(TransportError::Socket("not connected".into()).into());
        };
        socket.send(payload, 0).map_err(|e| self.map_err(e))?;
        let reply = socket.recv_bytes(0).map_err(|e| self.map_err(e))?;
        if reply.len() > MAX_MESSAGE_SIZE {
            return Err(armgym_core::error::ProtocolError::PayloadTooLarge {
                size: reply.len(),
                max: MAX_MESSAGE_SIZE,
            }
            .into());
        }
        debug!(sent = payload.len(), received = reply.len(), "message exchanged");
        Ok(reply)
    }

    fn disconnect(&mut self) {
        if let Some(socket) = self.socket.take() {
            if let Err(e) = socket.disconnect(&self.address.endpoint()) {
                warn!(error = %e, "error while closing simulator socket");
            }
            info!(address = %self.address, "disconnected from simulator");
        }
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ZmqTransport"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_before_connect_fails() {
        let mut t = ZmqTransport::new(SimAddress::parse("tcp://127.0.0.1:5999").unwrap(), Duration::from_millis(100));
        assert!(!t.is_connected());
        assert!(t.request(b"{}").unwrap_err().is_transport());
    }

    #[test]
    fn unanswered_request_times_out() {
        let mut t = ZmqTransport::new(SimAddress::parse("tcp://127.0.0.1:5998").unwrap(), Duration::from_millis(100));
        t.connect().unwrap();
        let err = t.request(b"{}").unwrap_err();
        assert!(matches!(err, ArmError::Transport(TransportError::Timeout(_))));
        t.disconnect();
        t.disconnect();
        assert!(!t.is_connected());
    }

    #[test]
    fn exchanges_with_rep_socket() {
        let ctx = zmq::Context::new();
        let rep = ctx.socket(zmq::REP).unwrap();
        rep.bind("tcp://127.0.0.1:*").unwrap();
        let endpoint = rep.get_last_endpoint().unwrap().unwrap();
        let server = std::thread::spawn(move || {
            let msg = rep.recv_bytes(0).unwrap();
            rep.send(&msg[..], 0).unwrap();
        });

        let mut t = ZmqTransport::new(SimAddress::parse(&endpoint).unwrap(), Duration::from_secs(2));
        t.connect().unwrap();
        assert_eq!(t.request(br#"{"Type":"RESET"}"#).unwrap(), br#"{"Type":"RESET"}"#);
        server.join().unwrap();
    }
}
