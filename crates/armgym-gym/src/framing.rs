//! Length-prefixed framing for the simulator wire protocol.
//!
//! Every message on the wire is a 4-byte **big-endian** `u32` length prefix
//! followed by that many bytes of UTF-8 JSON payload.
//!
//! # Wire format
//!
//! ```text
//! +----------------+------------------+
//! | Length (4B BE) | JSON Payload     |
//! +----------------+------------------+
//! ```

use std::io::{ErrorKind, Read, Write};

use armgym_core::error::{ArmError, ProtocolError, TransportError};

/// Maximum accepted payload size (16 MiB).
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Write one frame: the big-endian length prefix, then `payload`.
///
/// The writer is flushed afterwards.
pub fn write_frame(writer: &mut impl Write, payload: &[u8]) -> Result<(), ArmError> {
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        }
        .into());
    }

    // MAX_MESSAGE_SIZE fits in u32.
    let len = u32::try_from(payload.len())
        .map_err(|_| ProtocolError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        })?
        .to_be_bytes();
    writer.write_all(&len).map_err(TransportError::Io)?;
    writer.write_all(payload).map_err(TransportError::Io)?;
    writer.flush().map_err(TransportError::Io)?;
    Ok(())
}

/// Read one complete frame and return its payload.
///
/// Never returns a partial frame: if the peer closes before the prefix or
/// the body is complete, this fails with [`TransportError::PeerClosed`].
pub fn read_frame(reader: &mut impl Read) -> Result<Vec<u8>, ArmError> {
    let mut len_buf = [0u8; 4];
    recv_exact(reader, &mut len_buf)?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        }
        .into());
    }

    let mut payload = vec![0u8; len];
    recv_exact(reader, &mut payload)?;
    Ok(payload)
}

/// Fill `buf` completely, looping over short reads.
///
/// A zero-length read before `buf` is full means the peer closed the
/// connection mid-frame.
pub fn recv_exact(reader: &mut impl Read, buf: &mut [u8]) -> Result<(), TransportError> {
    let mut received = 0;
    while received < buf.len() {
        match reader.read(&mut buf[received..]) {
            Ok(0) => {
                return Err(TransportError::PeerClosed {
                    received,
                    expected: buf.len(),
                });
            }
            Ok(n) => received += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(TransportError::Io(e)),
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use armgym_test_utils::{ChunkedReader, ChunkedWriter, seeded_rng};
    use rand::Rng;
    use std::io::Cursor;

    fn framed(payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        write_frame(&mut buf, payload).unwrap();
        buf
    }

    #[test]
    fn length_prefix_is_big_endian() {
        let buf = framed(b"{\"Type\":\"RESET\"}");
        assert_eq!(&buf[..4], &[0, 0, 0, 16]);
        assert_eq!(&buf[4..], b"{\"Type\":\"RESET\"}");
    }

    #[test]
    fn roundtrip_through_cursor() {
        let buf = framed(b"{}");
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_frame(&mut cursor).unwrap(), b"{}");
    }

    #[test]
    fn multiple_frames_in_sequence() {
        let mut buf = framed(b"one");
        buf.extend(framed(b"two"));
        buf.extend(framed(b""));
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_frame(&mut cursor).unwrap(), b"one");
        assert_eq!(read_frame(&mut cursor).unwrap(), b"two");
        assert!(read_frame(&mut cursor).unwrap().is_empty());
    }

    #[test]
    fn reassembles_frame_from_single_byte_chunks() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let mut reader = ChunkedReader::new(framed(&payload), 1);
        assert_eq!(read_frame(&mut reader).unwrap(), payload);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn reassembles_frames_from_random_chunks() {
        let mut rng = seeded_rng(11);
        for _ in 0..50 {
            let len = rng.random_range(0..4096);
            let payload: Vec<u8> = (0..len).map(|_| rng.random()).collect();
            let chunk = rng.random_range(1..64);
            let mut reader = ChunkedReader::new(framed(&payload), chunk);
            assert_eq!(read_frame(&mut reader).unwrap(), payload);
        }
    }

    #[test]
    fn write_survives_short_writes() {
        let mut writer = ChunkedWriter::new(3);
        write_frame(&mut writer, b"hello world").unwrap();
        assert_eq!(writer.written, framed(b"hello world"));
    }

    #[test]
    fn peer_closed_before_any_body_byte() {
        let mut reader = ChunkedReader::new(vec![0, 0, 0, 12], 2);
        let err = read_frame(&mut reader).unwrap_err();
        assert!(matches!(
            err,
            ArmError::Transport(TransportError::PeerClosed {
                received: 0,
                expected: 12
            })
        ));
    }

    #[test]
    fn peer_closed_mid_body() {
        let mut bytes = vec![0, 0, 0, 10];
        bytes.extend_from_slice(b"abcd");
        let err = read_frame(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(
            err,
            ArmError::Transport(TransportError::PeerClosed {
                received: 4,
                expected: 10
            })
        ));
    }

    #[test]
    fn peer_closed_mid_prefix() {
        let err = read_frame(&mut Cursor::new(vec![0, 0])).unwrap_err();
        assert!(matches!(
            err,
            ArmError::Transport(TransportError::PeerClosed {
                received: 2,
                expected: 4
            })
        ));
    }

    #[test]
    fn oversized_prefix_rejected_before_body() {
        let len = u32::try_from(MAX_MESSAGE_SIZE + 1).unwrap().to_be_bytes();
        let err = read_frame(&mut Cursor::new(len.to_vec())).unwrap_err();
        assert!(matches!(
            err,
            ArmError::Protocol(ProtocolError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn oversized_payload_rejected_on_write() {
        let payload = vec![b' '; MAX_MESSAGE_SIZE + 1];
        let mut buf = Vec::new();
        let err = write_frame(&mut buf, &payload).unwrap_err();
        assert!(matches!(
            err,
            ArmError::Protocol(ProtocolError::PayloadTooLarge { .. })
        ));
        assert!(buf.is_empty());
    }
}
