use std::collections::BTreeMap;

use smallvec::{smallvec, SmallVec};

use crate::buffer::Buf;
use crate::message::MessageType;

/// Byte ranges of the message body not yet received, kept disjoint and in
/// ascending order. A handful is plenty for real fragment patterns.
type Missing = SmallVec<[(usize, usize); 4]>;

/// Accumulates the fragments of one handshake message.
///
/// The first contribution fixes the message type and body length; later
/// contributions disagreeing with either are dropped. Fragments may arrive
/// in any order, duplicated or overlapping.
#[derive(Debug)]
pub(crate) struct Reassembler {
    msg_type: MessageType,
    length: usize,
    body: Buf,
    missing: Missing,
}

impl Reassembler {
    pub fn new(msg_type: MessageType, length: usize) -> Self {
        let mut body = Buf::new();
        body.resize(length, 0);

        Reassembler {
            msg_type,
            length,
            body,
            // For an empty message this is a zero-width range, removed only
            // by an explicit empty fragment at offset 0.
            missing: smallvec![(0, length)],
        }
    }

    pub fn msg_type(&self) -> MessageType {
        self.msg_type
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Merge one fragment. Contributions that conflict with the seeded type
    /// or length, or that fall outside the declared body, are ignored.
    pub fn contribute(
        &mut self,
        msg_type: MessageType,
        length: usize,
        fragment_offset: usize,
        fragment: &[u8],
    ) {
        if msg_type != self.msg_type || length != self.length {
            trace!(
                "Dropping conflicting fragment: {:?}/{} vs {:?}/{}",
                msg_type,
                length,
                self.msg_type,
                self.length
            );
            return;
        }

        let fragment_end = fragment_offset + fragment.len();
        if fragment_end > self.length {
            return;
        }

        if fragment.is_empty() {
            // An empty message still needs its one empty fragment.
            if fragment_offset == 0 && self.missing.first() == Some(&(0, 0)) {
                self.missing.remove(0);
            }
            return;
        }

        self.body[fragment_offset..fragment_end].copy_from_slice(fragment);
        self.cover(fragment_offset, fragment_end);
    }

    /// Remove `[start, end)` from the missing ranges.
    fn cover(&mut self, start: usize, end: usize) {
        let mut next = Missing::new();

        for &(s, e) in &self.missing {
            if e <= start || s >= end {
                next.push((s, e));
                continue;
            }
            if s < start {
                next.push((s, start));
            }
            if e > end {
                next.push((end, e));
            }
        }

        self.missing = next;
    }

    /// The full body, once every byte of `[0, length)` has arrived.
    ///
    /// Pure; calling this never changes state.
    pub fn body_if_complete(&self) -> Option<&[u8]> {
        if self.missing.is_empty() {
            Some(&self.body)
        } else {
            None
        }
    }

    /// Forget all received data but keep the seeded type and length, so a
    /// re-received identical message re-completes exactly as before.
    pub fn reset(&mut self) {
        self.missing = smallvec![(0, self.length)];
    }
}

/// The reassemblers of one inbound flight, keyed by message seq.
///
/// Delivered messages stay in the table: when the flight later becomes the
/// *previous* flight, their reassemblers are what detects a full re-send by
/// the peer.
#[derive(Debug, Default)]
pub(crate) struct InboundFlight {
    messages: BTreeMap<u16, Reassembler>,
}

impl InboundFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, seq: u16) -> Option<&Reassembler> {
        self.messages.get(&seq)
    }

    pub fn get_mut(&mut self, seq: u16) -> Option<&mut Reassembler> {
        self.messages.get_mut(&seq)
    }

    pub fn contains(&self, seq: u16) -> bool {
        self.messages.contains_key(&seq)
    }

    pub fn get_or_insert(
        &mut self,
        seq: u16,
        msg_type: MessageType,
        length: usize,
    ) -> &mut Reassembler {
        self.messages
            .entry(seq)
            .or_insert_with(|| Reassembler::new(msg_type, length))
    }

    /// Seq numbers present in the flight, ascending.
    pub fn seqs(&self) -> impl Iterator<Item = u16> + '_ {
        self.messages.keys().copied()
    }

    /// True when every reassembler in the flight is complete.
    ///
    /// Callers check this only after an actual contribution; an empty
    /// flight is vacuously complete.
    pub fn all_complete(&self) -> bool {
        self.messages
            .values()
            .all(|r| r.body_if_complete().is_some())
    }

    pub fn reset_all(&mut self) {
        for reassembler in self.messages.values_mut() {
            reassembler.reset();
        }
    }
}
