use std::mem;
use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::message::{FragmentHeader, Message, MessageType};
use crate::outbound;
use crate::reassembly::InboundFlight;
use crate::record::RecordLayer;
use crate::retransmit::RetransmitHook;
use crate::timer::Backoff;
use crate::transcript::{HashAlgorithm, TranscriptHash};
use crate::{Config, Error};

/// How many message seqs past `next_receive_seq` we buffer reassemblers
/// for. Records further ahead are dropped.
const MAX_RECEIVE_AHEAD: u32 = 10;

/// Reliable, ordered delivery of handshake flights over one DTLS
/// association.
///
/// Owns the send/receive phase, both inbound flight tables, the outbound
/// flight kept for retransmission and the rolling transcript hash. The
/// record layer is a borrowed collaborator that outlives this object.
///
/// Single owner, single logical task; no operation may run concurrently
/// with another on the same instance. [`receive_message`] is the only
/// blocking entry point.
///
/// [`receive_message`]: ReliableHandshake::receive_message
pub struct ReliableHandshake<'a, R: RecordLayer + ?Sized> {
    config: Arc<Config>,

    /// The record layer beneath us.
    record: &'a mut R,

    /// Rolling transcript of every handshake message except HelloRequest,
    /// in seq order, as if each travelled unfragmented.
    hash: TranscriptHash,

    /// Pool of scratch buffers.
    buffers_free: BufferPool,

    /// Reassemblers for the flight currently being received.
    current_inbound: InboundFlight,

    /// The flight received before our last outbound flight. A full
    /// re-reception of it means the peer lost our response.
    previous_inbound: Option<InboundFlight>,

    /// Our most recent flight, verbatim, for retransmission.
    outbound: Vec<Message>,

    /// Whether we are emitting a flight (true) or consuming one (false).
    sending: bool,

    /// Seq for the next message we send.
    next_send_seq: u16,

    /// Seq of the next message to deliver to the caller.
    next_receive_seq: u16,

    /// Retransmit timeout. Doubled on every trigger, never reset.
    backoff: Backoff,
}

impl<'a, R: RecordLayer + ?Sized> ReliableHandshake<'a, R> {
    /// Create a handshake bound to `record`.
    pub fn new(record: &'a mut R, config: Arc<Config>) -> Self {
        let backoff = Backoff::new(config.retransmit_start_rto(), config.retransmit_max_rto());

        ReliableHandshake {
            config,
            record,
            hash: TranscriptHash::new(),
            buffers_free: BufferPool::default(),
            current_inbound: InboundFlight::new(),
            previous_inbound: None,
            outbound: Vec::new(),
            sending: true,
            next_send_seq: 0,
            next_receive_seq: 0,
            backoff,
        }
    }

    /// Send one handshake message as part of the current outbound flight.
    ///
    /// The first send after receiving starts a new flight. The message is
    /// fragmented to the record layer's send limit, retained for
    /// retransmission and fed to the transcript.
    pub fn send_message(&mut self, msg_type: MessageType, body: &[u8]) -> Result<(), Error> {
        if !self.sending {
            self.check_inbound_flight();
            self.sending = true;
            self.outbound.clear();
        }

        let message = Message::new(self.next_send_seq, msg_type, body);
        self.next_send_seq += 1;

        debug!("Sending {:?} seq {} ({} bytes)", msg_type, message.seq(), body.len());

        outbound::write_message(&mut *self.record, &message, &mut self.buffers_free)?;
        update_transcript(&mut self.hash, &message);
        self.outbound.push(message);

        Ok(())
    }

    /// Deliver the next handshake message, in strict seq order.
    ///
    /// The first receive after sending turns the current inbound flight
    /// into the *previous* one. Blocks on the record layer until the next
    /// message completes, retransmitting our flight on every timeout and
    /// on every full re-reception of the previous inbound flight.
    pub fn receive_message(&mut self) -> Result<Message, Error> {
        if self.sending {
            self.sending = false;
            self.prepare_inbound_flight();
        }

        // The next message may already be waiting.
        if let Some(message) = self.take_next_complete() {
            return Ok(self.deliver(message));
        }

        let mut buf = self.buffers_free.pop();

        loop {
            let receive_limit = self.record.receive_limit();
            buf.resize(receive_limit, 0);

            loop {
                let received = match self.record.receive(&mut buf, self.backoff.timeout()) {
                    Ok(Some(n)) => n,
                    // Nothing within the timeout.
                    Ok(None) => break,
                    // Transient and fatal I/O failures are indistinguishable
                    // here; assume a timeout and let the resend recover.
                    Err(e) => {
                        debug!("Receive failed, treating as timeout: {:?}", e);
                        break;
                    }
                };

                if let Some(message) = self.process_record(&buf[..received])? {
                    self.buffers_free.push(buf);
                    return Ok(self.deliver(message));
                }
            }

            outbound::resend_flight(&mut *self.record, &self.outbound, &mut self.buffers_free)?;
            self.backoff.bump();
        }
    }

    /// Commit the transcript hash to the algorithm settled by the hello
    /// exchange. Bytes logged so far are replayed into it.
    pub fn notify_hello_complete(&mut self, algorithm: HashAlgorithm) {
        self.hash.commit(algorithm);
    }

    /// Conclude the handshake.
    ///
    /// When we transmitted the final flight and still hold the peer's
    /// previous flight, the record layer is handed a [`RetransmitHook`] to
    /// answer peer re-sends during its grace window.
    pub fn finish(mut self) {
        let mut retransmit = None;

        if !self.sending {
            self.check_inbound_flight();
        } else if let Some(previous) = self.previous_inbound.take() {
            debug!("Installing post-finish retransmit hook");
            retransmit = Some(RetransmitHook::new(
                previous,
                self.outbound,
                self.next_receive_seq,
                self.buffers_free,
            ));
        }

        self.record.handshake_successful(retransmit);
    }

    /// Snapshot digest of the transcript so far. The live hash keeps going.
    pub fn current_hash(&self) -> Result<Vec<u8>, Error> {
        self.hash.clone_and_finalize()
    }

    /// Restart the transcript, as after a HelloRequest-style renegotiation.
    pub fn reset_transcript(&mut self) {
        self.hash.reset();
    }

    /// Process one incoming record. Returns a message when it completed
    /// `next_receive_seq`; anything unusable is dropped silently.
    fn process_record(&mut self, record: &[u8]) -> Result<Option<Message>, Error> {
        let Some((header, fragment)) = FragmentHeader::parse_record(record) else {
            trace!("Dropping malformed record of {} bytes", record.len());
            return Ok(None);
        };

        if u32::from(header.message_seq) > u32::from(self.next_receive_seq) + MAX_RECEIVE_AHEAD {
            trace!(
                "Dropping seq {} too far past {}",
                header.message_seq,
                self.next_receive_seq
            );
            return Ok(None);
        }

        if header.message_seq < self.next_receive_seq {
            // A seq we already delivered. If the peer re-sends its whole
            // previous flight, our response flight was lost: re-send it.
            if let Some(previous) = self.previous_inbound.as_mut() {
                let Some(reassembler) = previous.get_mut(header.message_seq) else {
                    return Ok(None);
                };

                reassembler.contribute(
                    header.msg_type,
                    header.length as usize,
                    header.fragment_offset as usize,
                    fragment,
                );

                if previous.all_complete() {
                    debug!("Peer re-sent its previous flight, resending ours");
                    outbound::resend_flight(
                        &mut *self.record,
                        &self.outbound,
                        &mut self.buffers_free,
                    )?;
                    self.backoff.bump();

                    // Rearm so the next full re-reception triggers again.
                    previous.reset_all();
                }
            }

            return Ok(None);
        }

        if !self.current_inbound.contains(header.message_seq)
            && header.length as usize > self.config.max_message_len()
        {
            trace!("Dropping fragment declaring {} byte message", header.length);
            return Ok(None);
        }

        let reassembler = self.current_inbound.get_or_insert(
            header.message_seq,
            header.msg_type,
            header.length as usize,
        );
        reassembler.contribute(
            header.msg_type,
            header.length as usize,
            header.fragment_offset as usize,
            fragment,
        );

        if header.message_seq == self.next_receive_seq {
            return Ok(self.take_next_complete());
        }

        Ok(None)
    }

    /// Copy out the message at `next_receive_seq` if it is complete. The
    /// reassembler stays in the table for later re-receive detection.
    fn take_next_complete(&self) -> Option<Message> {
        let reassembler = self.current_inbound.get(self.next_receive_seq)?;
        let body = reassembler.body_if_complete()?;

        Some(Message::new(
            self.next_receive_seq,
            reassembler.msg_type(),
            body,
        ))
    }

    /// Account for a completed delivery: the peer has moved on, so the
    /// previous flight is done for; advance and hash.
    fn deliver(&mut self, message: Message) -> Message {
        debug!(
            "Delivering {:?} seq {} ({} bytes)",
            message.msg_type(),
            message.seq(),
            message.body().len()
        );

        self.previous_inbound = None;
        self.next_receive_seq += 1;
        update_transcript(&mut self.hash, &message);

        message
    }

    /// Move the current inbound flight to *previous*, rearmed for
    /// re-receive detection, and start a fresh one.
    fn prepare_inbound_flight(&mut self) {
        let mut previous = mem::take(&mut self.current_inbound);
        previous.reset_all();
        self.previous_inbound = Some(previous);
    }

    /// Drain check on phase changes: messages buffered past the delivered
    /// range are tolerated, but worth noting.
    fn check_inbound_flight(&self) {
        for seq in self.current_inbound.seqs() {
            if seq >= self.next_receive_seq {
                warn!("Undelivered message seq {} left in inbound flight", seq);
            }
        }
    }
}

/// Feed one message to the transcript: the canonical unfragmented header,
/// then the body. HelloRequest never participates.
fn update_transcript(hash: &mut TranscriptHash, message: &Message) {
    if message.msg_type() == MessageType::HelloRequest {
        return;
    }

    let header = FragmentHeader::canonical(message);
    hash.update(&header.to_bytes());
    hash.update(message.body());
}
