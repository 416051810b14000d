use std::time::{Duration, Instant};

use tracing::trace;

use crate::photon::fragments::{Fragment, FragmentBuffer};
use crate::photon::reader::ByteReader;
use crate::photon::DecodeError;

/// Fixed 12-byte envelope at the start of every datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub peer_id: u16,
    pub flags: u8,
    pub command_count: u8,
    pub timestamp: u32,
    pub challenge: u32,
}

pub const FRAME_HEADER_LEN: usize = 12;
pub const COMMAND_HEADER_LEN: usize = 12;

/// Command-type bytes inside a frame.
pub mod command_type {
    pub const ACK: u8 = 1;
    pub const CONNECT: u8 = 2;
    pub const VERIFY_CONNECT: u8 = 3;
    pub const DISCONNECT: u8 = 4;
    pub const PING: u8 = 5;
    pub const RELIABLE: u8 = 6;
    pub const UNRELIABLE: u8 = 7;
    pub const FRAGMENT: u8 = 8;
}

/// Splits datagrams into application-message payloads.
///
/// Stateful only for fragment reassembly; everything else is a pure pass
/// over the datagram bytes. Acks, connect/disconnect control commands, and
/// unrecognized command types are consumed silently.
pub struct FrameDecoder {
    fragments: FragmentBuffer,
}

impl FrameDecoder {
    pub fn new(fragment_ttl: Duration) -> Self {
        Self {
            fragments: FragmentBuffer::new(fragment_ttl),
        }
    }

    /// Decodes one datagram into zero or more command payloads ready for
    /// message decoding. Completed fragment sets surface here as a single
    /// reassembled payload.
    pub fn decode(&mut self, datagram: &[u8]) -> Result<Vec<Vec<u8>>, DecodeError> {
        self.decode_at(datagram, Instant::now())
    }

    /// Drops fragment sets that outlived their TTL; returns the count.
    pub fn purge_expired_fragments(&mut self) -> usize {
        self.fragments.purge_expired(Instant::now())
    }

    /// Incomplete fragment sets currently held.
    pub fn pending_fragment_sets(&self) -> usize {
        self.fragments.pending_sets()
    }

    fn decode_at(&mut self, datagram: &[u8], now: Instant) -> Result<Vec<Vec<u8>>, DecodeError> {
        if datagram.len() < FRAME_HEADER_LEN {
            return Err(DecodeError::MalformedHeader {
                reason: "datagram shorter than the frame header",
            });
        }

        let mut reader = ByteReader::new(datagram);
        let header = parse_header(&mut reader)?;

        let mut payloads = Vec::new();
        for _ in 0..header.command_count {
            let command = parse_command(&mut reader)?;
            match command.command_type {
                command_type::RELIABLE | command_type::UNRELIABLE => {
                    payloads.push(command.payload.to_vec());
                }
                command_type::FRAGMENT => {
                    let fragment = parse_fragment(command.payload)?;
                    if let Some(payload) =
                        self.fragments.insert(header.peer_id, fragment, now)?
                    {
                        payloads.push(payload);
                    }
                }
                other => {
                    trace!(command_type = other, "skipping control command");
                }
            }
        }
        Ok(payloads)
    }
}

pub fn parse_header(reader: &mut ByteReader<'_>) -> Result<FrameHeader, DecodeError> {
    Ok(FrameHeader {
        peer_id: reader.read_u16()?,
        flags: reader.read_u8()?,
        command_count: reader.read_u8()?,
        timestamp: reader.read_u32()?,
        challenge: reader.read_u32()?,
    })
}

struct Command<'a> {
    command_type: u8,
    payload: &'a [u8],
}

// Sub-header: type, channel, flags, reserved, length (includes the
// sub-header itself), sequence number.
fn parse_command<'a>(reader: &mut ByteReader<'a>) -> Result<Command<'a>, DecodeError> {
    let command_type = reader.read_u8()?;
    let _channel_id = reader.read_u8()?;
    let _command_flags = reader.read_u8()?;
    let _reserved = reader.read_u8()?;
    let command_length = reader.read_u32()? as usize;
    let _sequence_number = reader.read_u32()?;

    if command_length < COMMAND_HEADER_LEN {
        return Err(DecodeError::MalformedHeader {
            reason: "command length shorter than its own header",
        });
    }
    let payload = reader.read_bytes(command_length - COMMAND_HEADER_LEN)?;
    Ok(Command {
        command_type,
        payload,
    })
}

// Fragment payload prefix: start sequence, count, number, total length,
// offset; the remaining bytes are the fragment data.
fn parse_fragment(payload: &[u8]) -> Result<Fragment, DecodeError> {
    let mut reader = ByteReader::new(payload);
    let start_sequence = reader.read_u32()?;
    let fragment_count = reader.read_u32()?;
    let fragment_number = reader.read_u32()?;
    let total_length = reader.read_u32()?;
    let fragment_offset = reader.read_u32()?;
    let data = reader.read_bytes(reader.remaining())?.to_vec();
    Ok(Fragment {
        start_sequence,
        fragment_count,
        fragment_number,
        total_length,
        fragment_offset,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_frame(peer_id: u16, commands: &[(u8, &[u8])]) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.extend_from_slice(&peer_id.to_be_bytes());
        frame.push(0); // flags
        frame.push(commands.len() as u8);
        frame.extend_from_slice(&0u32.to_be_bytes()); // timestamp
        frame.extend_from_slice(&0u32.to_be_bytes()); // challenge
        for (index, (command_type, payload)) in commands.iter().enumerate() {
            frame.push(*command_type);
            frame.push(0); // channel
            frame.push(0); // command flags
            frame.push(0); // reserved
            frame.extend_from_slice(&((payload.len() + COMMAND_HEADER_LEN) as u32).to_be_bytes());
            frame.extend_from_slice(&(index as u32 + 1).to_be_bytes());
            frame.extend_from_slice(payload);
        }
        frame
    }

    fn fragment_payload(
        start: u32,
        count: u32,
        number: u32,
        total: u32,
        offset: u32,
        data: &[u8],
    ) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&start.to_be_bytes());
        payload.extend_from_slice(&count.to_be_bytes());
        payload.extend_from_slice(&number.to_be_bytes());
        payload.extend_from_slice(&total.to_be_bytes());
        payload.extend_from_slice(&offset.to_be_bytes());
        payload.extend_from_slice(data);
        payload
    }

    #[test]
    fn short_datagram_is_malformed() {
        let mut decoder = FrameDecoder::new(Duration::from_secs(10));
        let err = decoder.decode(&[0u8; 11]).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedHeader { .. }));
        assert!(decoder.decode(&[]).is_err());
    }

    #[test]
    fn reliable_and_unreliable_payloads_come_back() {
        let mut decoder = FrameDecoder::new(Duration::from_secs(10));
        let frame = build_frame(
            1,
            &[
                (command_type::RELIABLE, b"first"),
                (command_type::UNRELIABLE, b"second"),
            ],
        );
        let payloads = decoder.decode(&frame).unwrap();
        assert_eq!(payloads, vec![b"first".to_vec(), b"second".to_vec()]);
    }

    #[test]
    fn control_commands_are_consumed_silently() {
        let mut decoder = FrameDecoder::new(Duration::from_secs(10));
        let frame = build_frame(
            1,
            &[
                (command_type::ACK, &[0u8; 8]),
                (command_type::PING, &[]),
                (command_type::RELIABLE, b"real"),
                (command_type::DISCONNECT, &[]),
            ],
        );
        let payloads = decoder.decode(&frame).unwrap();
        assert_eq!(payloads, vec![b"real".to_vec()]);
    }

    #[test]
    fn command_length_lying_about_the_buffer_is_an_error() {
        let mut decoder = FrameDecoder::new(Duration::from_secs(10));
        let mut frame = build_frame(1, &[(command_type::RELIABLE, b"abcdef")]);
        let len = frame.len();
        frame.truncate(len - 3);
        assert!(matches!(
            decoder.decode(&frame),
            Err(DecodeError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn command_length_below_header_size_is_malformed() {
        let mut frame = build_frame(1, &[(command_type::RELIABLE, b"")]);
        // Overwrite the command length field (offset 12 + 4) with 4
        frame[16..20].copy_from_slice(&4u32.to_be_bytes());
        let mut decoder = FrameDecoder::new(Duration::from_secs(10));
        assert!(matches!(
            decoder.decode(&frame),
            Err(DecodeError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn fragments_across_datagrams_reassemble() {
        let mut decoder = FrameDecoder::new(Duration::from_secs(10));

        // Second half arrives first
        let late = fragment_payload(5, 2, 1, 10, 6, b"6789");
        let early = fragment_payload(5, 2, 0, 10, 0, b"012345");

        let none = decoder
            .decode(&build_frame(1, &[(command_type::FRAGMENT, &late)]))
            .unwrap();
        assert!(none.is_empty());
        assert_eq!(decoder.pending_fragment_sets(), 1);

        let payloads = decoder
            .decode(&build_frame(1, &[(command_type::FRAGMENT, &early)]))
            .unwrap();
        assert_eq!(payloads, vec![b"0123456789".to_vec()]);
        assert_eq!(decoder.pending_fragment_sets(), 0);
    }

    #[test]
    fn expired_fragment_set_yields_no_payload() {
        let mut decoder = FrameDecoder::new(Duration::from_millis(0));
        let half = fragment_payload(5, 2, 0, 4, 0, b"ab");
        decoder
            .decode(&build_frame(1, &[(command_type::FRAGMENT, &half)]))
            .unwrap();
        // TTL of zero: the set is already stale
        assert_eq!(decoder.purge_expired_fragments(), 1);
        assert_eq!(decoder.pending_fragment_sets(), 0);
    }

    #[test]
    fn zero_command_frame_is_valid_and_empty() {
        let mut decoder = FrameDecoder::new(Duration::from_secs(10));
        let frame = build_frame(9, &[]);
        assert!(decoder.decode(&frame).unwrap().is_empty());
    }
}
