#![no_main]

//! Fuzz target for handshake fragment record validation.
//!
//! Runs arbitrary bytes through record parsing, plus a variant with a
//! consistent synthesized header so the accepting paths are reached often
//! enough to be useful.
//!
//! Handshake fragment record format:
//! - msg_type: 1 byte
//! - length: 3 bytes (full message body)
//! - message_seq: 2 bytes
//! - fragment_offset: 3 bytes
//! - fragment_length: 3 bytes
//! - fragment data: fragment_length bytes

use libfuzzer_sys::fuzz_target;

use reflight::{FragmentHeader, HEADER_LEN};

fuzz_target!(|data: &[u8]| {
    // The input as-is.
    if let Some((header, fragment)) = FragmentHeader::parse_record(data) {
        assert_eq!(header.fragment_length as usize, fragment.len());
        assert!(header.fragment_offset + header.fragment_length <= header.length);
    }

    if data.is_empty() || data.len() > 0xFFFF {
        return;
    }

    // A record whose header agrees with the remaining input.
    let body = &data[1..];
    let mut record = Vec::with_capacity(HEADER_LEN + body.len());
    record.push(data[0]); // msg_type
    record.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
    record.extend_from_slice(&[0, 0]); // message_seq 0
    record.extend_from_slice(&[0, 0, 0]); // fragment_offset 0
    record.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
    record.extend_from_slice(body);

    let (header, fragment) = FragmentHeader::parse_record(&record).expect("well-formed record");
    assert_eq!(fragment, body);
    assert_eq!(header.to_bytes(), record[..HEADER_LEN]);
});
