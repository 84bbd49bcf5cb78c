//! Simulator wire protocol and Gymnasium-style environment for armgym.
//!
//! Provides the length-prefixed framing, the JSON command codec, the TCP
//! (and optional ZeroMQ request/reply) transports, [`client::SimClient`],
//! and the episode lifecycle controller [`env::RobotArmEnv`].

pub mod client;
pub mod codec;
pub mod env;
pub mod framing;
#[cfg(feature = "zmq")]
pub mod reqrep;
pub mod transport;

pub mod prelude {
    pub use crate::client::{SimClient, transport_from_config};
    pub use crate::codec::CommandCodec;
    pub use crate::env::{LifecycleState, RobotArmEnv};
    pub use crate::framing::{MAX_MESSAGE_SIZE, read_frame, write_frame};
    #[cfg(feature = "zmq")]
    pub use crate::reqrep::ZmqTransport;
    pub use crate::transport::TcpTransport;
}
