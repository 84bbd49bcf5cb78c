use crate::error::ArmError;
use crate::types::EpisodeSummary;

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// A strictly alternating request/reply byte channel to the simulator.
///
/// Implementations carry one opaque payload per request and return exactly
/// one payload per reply. Framing, if the medium needs it, is the
/// implementation's concern.
pub trait Transport: Send {
    /// Open the channel. Calling it while connected is a no-op.
    fn connect(&mut self) -> Result<(), ArmError>;

    /// Send one request and block until its reply arrives.
    ///
    /// On any error the channel is left in an unknown state and the caller
    /// must [`disconnect`](Self::disconnect) before reuse.
    fn request(&mut self, payload: &[u8]) -> Result<Vec<u8>, ArmError>;

    /// Close the channel. Idempotent; teardown errors are swallowed.
    fn disconnect(&mut self);

    /// Whether [`connect`](Self::connect) succeeded and no disconnect followed.
    fn is_connected(&self) -> bool;

    /// Human-readable name for this transport.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self) -> Result<(), ArmError> {
        (**self).connect()
    }

    fn request(&mut self, payload: &[u8]) -> Result<Vec<u8>, ArmError> {
        (**self).request(payload)
    }

    fn disconnect(&mut self) {
        (**self).disconnect();
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// ---------------------------------------------------------------------------
// EpisodeObserver
// ---------------------------------------------------------------------------

/// Receives a summary once per finished episode.
///
/// Closures `FnMut(&EpisodeSummary)` implement this trait.
pub trait EpisodeObserver: Send {
    fn on_episode_end(&mut self, summary: &EpisodeSummary);
}

impl<F> EpisodeObserver for F
where
    F: FnMut(&EpisodeSummary) + Send,
{
    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        self(summary);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
