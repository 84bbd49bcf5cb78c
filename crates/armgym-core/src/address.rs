//! Simulator address parsing (`tcp://host:port`).

use std::fmt;

use crate::error::ConfigError;

/// Port used when the address does not name one.
pub const DEFAULT_PORT: u16 = 5555;

/// Host and port of the simulator endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimAddress {
    pub host: String,
    pub port: u16,
}

impl SimAddress {
    /// Parse `tcp://host:port`, `://host:port`, `host:port` or `host`.
    ///
    /// Any scheme other than `tcp` is rejected.
    pub fn parse(address: &str) -> Result<Self, ConfigError> {
        let invalid = |message: &str| ConfigError::InvalidAddress {
            address: address.to_string(),
            message: message.to_string(),
        };

        let rest = match address.split_once("://") {
            Some(("tcp" | "", rest)) => rest,
            Some((scheme, _)) => return Err(invalid(&format!("unsupported scheme {scheme:?}"))),
            None => address,
        };

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| invalid(&format!("invalid port {port:?}")))?;
                (host, port)
            }
            None => (rest, DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(invalid("empty host"));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// `host:port`, suitable for socket resolution.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `tcp://host:port`, suitable for message-queue endpoints.
    pub fn endpoint(&self) -> String {
        format!("tcp://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for SimAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.endpoint())
    }
}
