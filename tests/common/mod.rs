#![allow(unused)]

use std::collections::VecDeque;
use std::time::Duration;

use reflight::{Error, FragmentHeader, MessageType, RecordLayer, RetransmitHook};

/// One scripted step of inbound traffic.
pub enum Step {
    /// A handshake record arrives.
    Record(Vec<u8>),
    /// Nothing arrives within the timeout.
    Silence,
}

/// In-memory record layer driven by a script of inbound steps.
///
/// Sends are captured verbatim. Receiving past the end of the script
/// panics, so a test that would loop retransmitting forever fails fast.
pub struct ScriptedLayer {
    pub incoming: VecDeque<Step>,
    pub sent: Vec<Vec<u8>>,
    pub send_limit: usize,
    pub receive_limit: usize,
    pub epoch_resets: usize,
    pub timeouts_seen: Vec<Duration>,
    pub finished: bool,
    pub hook: Option<RetransmitHook>,
}

impl ScriptedLayer {
    pub fn new(send_limit: usize, receive_limit: usize) -> Self {
        ScriptedLayer {
            incoming: VecDeque::new(),
            sent: Vec::new(),
            send_limit,
            receive_limit,
            epoch_resets: 0,
            timeouts_seen: Vec::new(),
            finished: false,
            hook: None,
        }
    }

    pub fn push_record(&mut self, record: Vec<u8>) {
        self.incoming.push_back(Step::Record(record));
    }

    pub fn push_silence(&mut self) {
        self.incoming.push_back(Step::Silence);
    }
}

impl RecordLayer for ScriptedLayer {
    fn send_limit(&self) -> usize {
        self.send_limit
    }

    fn receive_limit(&self) -> usize {
        self.receive_limit
    }

    fn send(&mut self, record: &[u8]) -> Result<(), Error> {
        self.sent.push(record.to_vec());
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<Option<usize>, Error> {
        self.timeouts_seen.push(timeout);

        match self.incoming.pop_front() {
            Some(Step::Record(record)) => {
                assert!(
                    record.len() <= buf.len(),
                    "scripted record exceeds receive limit"
                );
                buf[..record.len()].copy_from_slice(&record);
                Ok(Some(record.len()))
            }
            Some(Step::Silence) => Ok(None),
            None => panic!("scripted incoming traffic exhausted"),
        }
    }

    fn reset_write_epoch(&mut self) {
        self.epoch_resets += 1;
    }

    fn handshake_successful(&mut self, retransmit: Option<RetransmitHook>) {
        self.finished = true;
        self.hook = retransmit;
    }
}

/// Build one handshake record carrying a fragment of a message.
pub fn fragment(
    msg_type: MessageType,
    length: u32,
    seq: u16,
    fragment_offset: u32,
    data: &[u8],
) -> Vec<u8> {
    let header = FragmentHeader {
        msg_type,
        length,
        message_seq: seq,
        fragment_offset,
        fragment_length: data.len() as u32,
    };

    let mut record = header.to_bytes().to_vec();
    record.extend_from_slice(data);
    record
}

/// Build one handshake record carrying a whole message.
pub fn full_message(msg_type: MessageType, seq: u16, body: &[u8]) -> Vec<u8> {
    fragment(msg_type, body.len() as u32, seq, 0, body)
}

pub fn init_log() {
    let _ = env_logger::try_init();
}
