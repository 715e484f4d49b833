use nom::number::complete::{be_u16, be_u24, be_u8};
use nom::IResult;

use crate::buffer::{Buf, ToBuf};

/// Length of the handshake fragment header on the wire.
pub const HEADER_LEN: usize = 12;

/// DTLS handshake message type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// HelloRequest. Out-of-sequence signalling; never part of the transcript.
    HelloRequest,
    /// ClientHello.
    ClientHello,
    /// ServerHello.
    ServerHello,
    /// HelloVerifyRequest (DTLS cookie exchange).
    HelloVerifyRequest,
    /// NewSessionTicket.
    NewSessionTicket,
    /// Certificate.
    Certificate,
    /// ServerKeyExchange.
    ServerKeyExchange,
    /// CertificateRequest.
    CertificateRequest,
    /// ServerHelloDone.
    ServerHelloDone,
    /// CertificateVerify.
    CertificateVerify,
    /// ClientKeyExchange.
    ClientKeyExchange,
    /// Finished.
    Finished,
    /// Any other type code.
    Unknown(u8),
}

impl MessageType {
    /// Map a wire code to a message type.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x00 => MessageType::HelloRequest,
            0x01 => MessageType::ClientHello,
            0x02 => MessageType::ServerHello,
            0x03 => MessageType::HelloVerifyRequest,
            0x04 => MessageType::NewSessionTicket,
            0x0B => MessageType::Certificate,
            0x0C => MessageType::ServerKeyExchange,
            0x0D => MessageType::CertificateRequest,
            0x0E => MessageType::ServerHelloDone,
            0x0F => MessageType::CertificateVerify,
            0x10 => MessageType::ClientKeyExchange,
            0x14 => MessageType::Finished,
            _ => MessageType::Unknown(value),
        }
    }

    /// The wire code for this message type.
    pub fn to_u8(&self) -> u8 {
        match self {
            MessageType::HelloRequest => 0x00,
            MessageType::ClientHello => 0x01,
            MessageType::ServerHello => 0x02,
            MessageType::HelloVerifyRequest => 0x03,
            MessageType::NewSessionTicket => 0x04,
            MessageType::Certificate => 0x0B,
            MessageType::ServerKeyExchange => 0x0C,
            MessageType::CertificateRequest => 0x0D,
            MessageType::ServerHelloDone => 0x0E,
            MessageType::CertificateVerify => 0x0F,
            MessageType::ClientKeyExchange => 0x10,
            MessageType::Finished => 0x14,
            MessageType::Unknown(value) => *value,
        }
    }
}

/// One complete handshake message.
///
/// The body excludes the fragment header. Delivered by
/// [`receive_message`][crate::ReliableHandshake::receive_message] in strict
/// seq order, and retained in the outbound flight after sending.
#[derive(Debug)]
pub struct Message {
    seq: u16,
    msg_type: MessageType,
    body: Buf,
}

impl Message {
    pub(crate) fn new(seq: u16, msg_type: MessageType, body: &[u8]) -> Self {
        Message {
            seq,
            msg_type,
            body: body.to_buf(),
        }
    }

    /// The handshake message sequence number.
    pub fn seq(&self) -> u16 {
        self.seq
    }

    /// The handshake message type.
    pub fn msg_type(&self) -> MessageType {
        self.msg_type
    }

    /// The message body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// The 12-byte handshake fragment header (network byte order).
///
/// `length` is the size of the full message body; `fragment_offset` and
/// `fragment_length` locate this fragment within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentHeader {
    /// Handshake message type.
    pub msg_type: MessageType,
    /// Full message body length (u24 on the wire).
    pub length: u32,
    /// Handshake message sequence number.
    pub message_seq: u16,
    /// Offset of this fragment within the body (u24 on the wire).
    pub fragment_offset: u32,
    /// Number of fragment bytes following the header (u24 on the wire).
    pub fragment_length: u32,
}

impl FragmentHeader {
    /// The canonical unfragmented header for a message: offset 0 and
    /// fragment length equal to the body length, regardless of how the
    /// message travelled on the wire. This is the framing the transcript
    /// hash consumes.
    pub fn canonical(message: &Message) -> FragmentHeader {
        FragmentHeader {
            msg_type: message.msg_type(),
            length: message.body().len() as u32,
            message_seq: message.seq(),
            fragment_offset: 0,
            fragment_length: message.body().len() as u32,
        }
    }

    /// Parse a header from the front of `input`.
    pub fn parse(input: &[u8]) -> IResult<&[u8], FragmentHeader> {
        let (input, msg_type) = be_u8(input)?;
        let (input, length) = be_u24(input)?;
        let (input, message_seq) = be_u16(input)?;
        let (input, fragment_offset) = be_u24(input)?;
        let (input, fragment_length) = be_u24(input)?;

        Ok((
            input,
            FragmentHeader {
                msg_type: MessageType::from_u8(msg_type),
                length,
                message_seq,
                fragment_offset,
                fragment_length,
            },
        ))
    }

    /// Parse and validate a whole handshake record: a header followed by
    /// exactly `fragment_length` bytes of fragment data that stay within
    /// the declared body length. Returns `None` for anything malformed.
    pub fn parse_record(record: &[u8]) -> Option<(FragmentHeader, &[u8])> {
        if record.len() < HEADER_LEN {
            return None;
        }

        let (_, header) = FragmentHeader::parse(record).ok()?;

        if record.len() != HEADER_LEN + header.fragment_length as usize {
            return None;
        }
        if header.fragment_offset + header.fragment_length > header.length {
            return None;
        }

        Some((header, &record[HEADER_LEN..]))
    }

    /// The wire encoding of this header.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0; HEADER_LEN];
        out[0] = self.msg_type.to_u8();
        out[1..4].copy_from_slice(&self.length.to_be_bytes()[1..]);
        out[4..6].copy_from_slice(&self.message_seq.to_be_bytes());
        out[6..9].copy_from_slice(&self.fragment_offset.to_be_bytes()[1..]);
        out[9..12].copy_from_slice(&self.fragment_length.to_be_bytes()[1..]);
        out
    }
}
