//! Length-framed TCP transport.

use std::io::ErrorKind;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use armgym_core::address::SimAddress;
use armgym_core::error::{ArmError, TransportError};
use armgym_core::traits::Transport;
use tracing::{debug, info, warn};

use crate::framing::{read_frame, write_frame};

// ---------------------------------------------------------------------------
// TcpTransport
// ---------------------------------------------------------------------------

/// Blocking TCP connection carrying big-endian length-prefixed frames.
///
/// Connect, send and receive are each bounded by `timeout`. Any error
/// during a request leaves the stream unusable; the caller disconnects.
#[derive(Debug)]
pub struct TcpTransport {
    address: SimAddress,
    timeout: Duration,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub const fn new(address: SimAddress, timeout: Duration) -> Self {
        Self {
            address,
            timeout,
            stream: None,
        }
    }

    pub const fn address(&self) -> &SimAddress {
        &self.address
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn open(&self) -> Result<TcpStream, TransportError> {
        let target = self.address.socket_addr();
        let connect_err = |source: std::io::Error| TransportError::Connect {
            address: self.address.to_string(),
            source,
        };

        let mut last_err = None;
        for addr in target.to_socket_addrs().map_err(connect_err)? {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.timeout)).map_err(connect_err)?;
                    stream.set_write_timeout(Some(self.timeout)).map_err(connect_err)?;
                    stream.set_nodelay(true).map_err(connect_err)?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(connect_err(last_err.unwrap_or_else(|| {
            std::io::Error::new(ErrorKind::NotFound, "address resolved to nothing")
        })))
    }

    /// Map socket timeouts onto [`TransportError::Timeout`].
    fn classify(&self, err: ArmError) -> ArmError {
        match err {
            ArmError::Transport(TransportError::Io(e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                TransportError::Timeout(self.timeout).into()
            }
            other => other,
        }
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self) -> Result<(), ArmError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let stream = self.open()?;
        info!(address = %self.address, "connected to simulator");
        self.stream = Some(stream);
        Ok(())
    }

    fn request(&mut self, payload: &[u8]) -> Result<Vec<u8>, ArmError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(TransportError::Io(std::io::Error::from(ErrorKind::NotConnected)).into());
        };
        let result = write_frame(stream, payload).and_then(|()| read_frame(stream));
        match result {
            Ok(reply) => {
                debug!(sent = payload.len(), received = reply.len(), "frame exchanged");
                Ok(reply)
            }
            Err(e) => Err(self.classify(e)),
        }
    }

    fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                if e.kind() != ErrorKind::NotConnected {
                    warn!(error = %e, "error while closing simulator connection");
                }
            }
            info!(address = %self.address, "disconnected from simulator");
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "TcpTransport"
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
