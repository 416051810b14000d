// Single-threaded ingestion pipeline: datagram in, store mutations out.
// Decode failures are local to the offending datagram and never stop the
// loop.

mod metrics;
mod router;

pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use router::{route, EventCode};

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::photon::message::decode_command_payload;
use crate::photon::{Decoded, FrameDecoder};
use crate::world::World;

/// Runs Frame → Message → Route → Store synchronously per datagram.
///
/// Owned by exactly one ingestion task; the fragment reassembly state
/// inside the frame decoder is the only thing that makes this `&mut`.
pub struct Pipeline {
    world: Arc<World>,
    frames: FrameDecoder,
    metrics: Arc<PipelineMetrics>,
}

impl Pipeline {
    pub fn new(world: Arc<World>, fragment_ttl: Duration) -> Self {
        Self {
            world,
            frames: FrameDecoder::new(fragment_ttl),
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn world(&self) -> Arc<World> {
        Arc::clone(&self.world)
    }

    /// Processes one captured datagram end to end.
    pub fn process_datagram(&mut self, bytes: &[u8]) {
        self.metrics.record_datagram();

        let expired = self.frames.purge_expired_fragments();
        if expired > 0 {
            self.metrics.record_expired_fragment_sets(expired);
        }

        let payloads = match self.frames.decode(bytes) {
            Ok(payloads) => payloads,
            Err(error) => {
                self.metrics.record_decode_failure();
                debug!(error = %error, len = bytes.len(), "discarded undecodable datagram");
                return;
            }
        };

        for payload in payloads {
            self.metrics.record_command();
            match decode_command_payload(&payload) {
                Ok(Decoded::Message(message)) => {
                    route(&self.world, &message, &self.metrics);
                }
                Ok(Decoded::Skipped { message_type }) => {
                    self.metrics.record_message_skipped();
                    trace!(message_type = message_type, "skipped untracked message type");
                }
                Err(error) => {
                    self.metrics.record_decode_failure();
                    debug!(error = %error, "discarded undecodable command payload");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::MobsInfo;
    use crate::photon::frame::{command_type, COMMAND_HEADER_LEN};
    use crate::photon::message::encode_event_payload;
    use crate::photon::value::{tag, Value};
    use crate::photon::Parameters;

    fn frame_with_reliable(payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.extend_from_slice(&1u16.to_be_bytes()); // peer id
        frame.push(0); // flags
        frame.push(1); // command count
        frame.extend_from_slice(&0u32.to_be_bytes()); // timestamp
        frame.extend_from_slice(&0u32.to_be_bytes()); // challenge
        frame.push(command_type::RELIABLE);
        frame.push(0);
        frame.push(0);
        frame.push(0);
        frame.extend_from_slice(&((payload.len() + COMMAND_HEADER_LEN) as u32).to_be_bytes());
        frame.extend_from_slice(&1u32.to_be_bytes());
        frame.extend_from_slice(payload);
        frame
    }

    fn pipeline() -> Pipeline {
        let world = Arc::new(World::new(Arc::new(MobsInfo::new())));
        Pipeline::new(world, Duration::from_secs(10))
    }

    #[test]
    fn event_datagram_mutates_the_world() {
        let mut pipeline = pipeline();
        let params: Parameters = [
            (0u8, Value::Int(42)),
            (
                1,
                Value::Array {
                    element_tag: tag::FLOAT,
                    items: vec![Value::Float(10.0), Value::Float(-5.0)],
                },
            ),
            (2, Value::String("Foo".into())),
        ]
        .into_iter()
        .collect();
        let payload = encode_event_payload(EventCode::NewCharacter as u8, &params);

        pipeline.process_datagram(&frame_with_reliable(&payload));

        let world = pipeline.world();
        assert_eq!(world.players().len(), 1);
        let snapshot = pipeline.metrics().snapshot();
        assert_eq!(snapshot.datagrams, 1);
        assert_eq!(snapshot.commands, 1);
        assert_eq!(snapshot.events_routed, 1);
    }

    #[test]
    fn garbage_datagram_does_not_stop_the_loop() {
        let mut pipeline = pipeline();
        pipeline.process_datagram(&[0xFF; 5]);
        pipeline.process_datagram(b"not a photon frame at all........");

        // A valid datagram right after still lands
        let payload = encode_event_payload(
            EventCode::NewCage as u8,
            &[
                (0u8, Value::Int(7)),
                (
                    1,
                    Value::Array {
                        element_tag: tag::FLOAT,
                        items: vec![Value::Float(0.0), Value::Float(0.0)],
                    },
                ),
            ]
            .into_iter()
            .collect(),
        );
        pipeline.process_datagram(&frame_with_reliable(&payload));

        let world = pipeline.world();
        assert_eq!(world.cages().len(), 1);
        assert!(pipeline.metrics().snapshot().decode_failures >= 1);
    }

    #[test]
    fn skipped_message_types_are_counted() {
        let mut pipeline = pipeline();
        pipeline.process_datagram(&frame_with_reliable(&[0xF3, 99, 0, 0]));
        assert_eq!(pipeline.metrics().snapshot().messages_skipped, 1);
    }
}
