use crate::buffer::BufferPool;
use crate::message::{FragmentHeader, Message};
use crate::outbound;
use crate::reassembly::InboundFlight;
use crate::record::RecordLayer;
use crate::Error;

/// Post-finish responder for peer re-sends of their last flight.
///
/// RFC 6347 4.2.4: for at least twice the default MSL, the node that
/// transmits the last flight must respond to a retransmit of the peer's
/// last flight with a retransmit of its own. [`finish`] hands this hook to
/// the record layer, which dispatches incoming handshake records to it for
/// that grace window and then drops it.
///
/// [`finish`]: crate::ReliableHandshake::finish
pub struct RetransmitHook {
    previous_inbound: InboundFlight,
    outbound: Vec<Message>,
    next_receive_seq: u16,
    buffers: BufferPool,
}

impl RetransmitHook {
    pub(crate) fn new(
        previous_inbound: InboundFlight,
        outbound: Vec<Message>,
        next_receive_seq: u16,
        buffers: BufferPool,
    ) -> Self {
        RetransmitHook {
            previous_inbound,
            outbound,
            next_receive_seq,
            buffers,
        }
    }

    /// Process one incoming handshake record.
    ///
    /// Malformed records and records for messages we never saw are dropped.
    /// Once the peer's whole previous flight has been re-received, our last
    /// flight is re-sent through `layer` and the flight is rearmed for the
    /// next re-reception.
    pub fn on_handshake_record(
        &mut self,
        epoch: u16,
        record: &[u8],
        layer: &mut dyn RecordLayer,
    ) -> Result<(), Error> {
        // A previous flight spanning two epochs is not handled; records are
        // treated uniformly whatever epoch they arrived under.
        trace!("Post-finish record, epoch {}: {} bytes", epoch, record.len());

        let Some((header, fragment)) = FragmentHeader::parse_record(record) else {
            return Ok(());
        };

        // Seqs we advanced past belong to the concluded handshake proper.
        if header.message_seq >= self.next_receive_seq {
            return Ok(());
        }

        let Some(reassembler) = self.previous_inbound.get_mut(header.message_seq) else {
            return Ok(());
        };

        reassembler.contribute(
            header.msg_type,
            header.length as usize,
            header.fragment_offset as usize,
            fragment,
        );

        if self.previous_inbound.all_complete() {
            debug!("Peer re-sent its last flight after finish, resending ours");
            outbound::resend_flight(layer, &self.outbound, &mut self.buffers)?;
            self.previous_inbound.reset_all();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::message::{MessageType, HEADER_LEN};

    struct MockLayer {
        sent: Vec<Vec<u8>>,
        epoch_resets: usize,
    }

    impl MockLayer {
        fn new() -> Self {
            MockLayer {
                sent: Vec::new(),
                epoch_resets: 0,
            }
        }
    }

    impl RecordLayer for MockLayer {
        fn send_limit(&self) -> usize {
            200
        }

        fn receive_limit(&self) -> usize {
            200
        }

        fn send(&mut self, record: &[u8]) -> Result<(), Error> {
            self.sent.push(record.to_vec());
            Ok(())
        }

        fn receive(&mut self, _buf: &mut [u8], _timeout: Duration) -> Result<Option<usize>, Error> {
            Ok(None)
        }

        fn reset_write_epoch(&mut self) {
            self.epoch_resets += 1;
        }

        fn handshake_successful(&mut self, _retransmit: Option<RetransmitHook>) {}
    }

    fn record_for(seq: u16, body: &[u8]) -> Vec<u8> {
        let header = FragmentHeader {
            msg_type: MessageType::Finished,
            length: body.len() as u32,
            message_seq: seq,
            fragment_offset: 0,
            fragment_length: body.len() as u32,
        };
        let mut record = header.to_bytes().to_vec();
        record.extend_from_slice(body);
        record
    }

    fn hook_with_previous_flight() -> RetransmitHook {
        // The peer's last flight was one Finished message, seq 2, already
        // delivered and then rearmed when the flight became "previous".
        let mut previous = InboundFlight::new();
        let reassembler = previous.get_or_insert(2, MessageType::Finished, 4);
        reassembler.contribute(MessageType::Finished, 4, 0, &[1, 2, 3, 4]);
        reassembler.reset();

        // Our last flight was one message, seq 3.
        let outbound = vec![Message::new(3, MessageType::Finished, &[9, 9])];

        RetransmitHook::new(previous, outbound, 3, BufferPool::default())
    }

    #[test]
    fn full_re_reception_triggers_resend_each_time() {
        let mut hook = hook_with_previous_flight();
        let mut layer = MockLayer::new();

        hook.on_handshake_record(1, &record_for(2, &[1, 2, 3, 4]), &mut layer)
            .unwrap();

        assert_eq!(layer.sent.len(), 1);
        assert_eq!(layer.epoch_resets, 1);
        // Our message seq 3 on the wire, as a single fragment.
        assert_eq!(layer.sent[0].len(), HEADER_LEN + 2);
        assert_eq!(layer.sent[0][4..6], [0, 3]);

        // The flight was rearmed: a second full re-send triggers again.
        hook.on_handshake_record(1, &record_for(2, &[1, 2, 3, 4]), &mut layer)
            .unwrap();
        assert_eq!(layer.sent.len(), 2);
        assert_eq!(layer.sent[0], layer.sent[1]);
    }

    #[test]
    fn partial_re_reception_does_not_trigger() {
        let mut hook = hook_with_previous_flight();
        let mut layer = MockLayer::new();

        let mut partial = FragmentHeader {
            msg_type: MessageType::Finished,
            length: 4,
            message_seq: 2,
            fragment_offset: 0,
            fragment_length: 2,
        }
        .to_bytes()
        .to_vec();
        partial.extend_from_slice(&[1, 2]);

        hook.on_handshake_record(1, &partial, &mut layer).unwrap();
        assert!(layer.sent.is_empty());
    }

    #[test]
    fn seqs_at_or_past_next_receive_are_ignored() {
        let mut hook = hook_with_previous_flight();
        let mut layer = MockLayer::new();

        hook.on_handshake_record(1, &record_for(3, &[0; 4]), &mut layer)
            .unwrap();
        hook.on_handshake_record(1, &record_for(7, &[0; 4]), &mut layer)
            .unwrap();

        assert!(layer.sent.is_empty());
    }

    #[test]
    fn malformed_records_are_dropped() {
        let mut hook = hook_with_previous_flight();
        let mut layer = MockLayer::new();

        // Too short.
        hook.on_handshake_record(1, &[0; 5], &mut layer).unwrap();

        // Record length disagreeing with fragment_length.
        let mut bad = record_for(2, &[1, 2, 3, 4]);
        bad.pop();
        hook.on_handshake_record(1, &bad, &mut layer).unwrap();

        assert!(layer.sent.is_empty());
    }
}
