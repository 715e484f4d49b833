mod common;

use std::sync::Arc;

use reflight::{
    Config, FragmentHeader, HashAlgorithm, MessageType, ReliableHandshake, TranscriptHash,
    HEADER_LEN,
};

use common::{fragment, full_message, init_log, ScriptedLayer};

#[test]
fn in_order_single_fragment_delivery() {
    init_log();

    let bodies = [vec![0xA1; 10], vec![0xB2; 20], vec![0xC3; 30]];
    let types = [
        MessageType::ServerHello,
        MessageType::Certificate,
        MessageType::ServerHelloDone,
    ];

    let mut layer = ScriptedLayer::new(200, 200);
    for (seq, (msg_type, body)) in types.iter().zip(&bodies).enumerate() {
        layer.push_record(full_message(*msg_type, seq as u16, body));
    }

    let mut handshake = ReliableHandshake::new(&mut layer, Arc::new(Config::default()));

    for (seq, (msg_type, body)) in types.iter().zip(&bodies).enumerate() {
        let message = handshake.receive_message().unwrap();
        assert_eq!(message.seq(), seq as u16);
        assert_eq!(message.msg_type(), *msg_type);
        assert_eq!(message.body(), &body[..]);
    }
}

#[test]
fn fragmented_out_of_order_reassembly() {
    init_log();

    // Receive limit 25 caps each fragment at 13 body bytes. The 30-byte
    // message arrives as 13@0, 10@20, 7@13.
    let body: Vec<u8> = (0..30).collect();

    let mut layer = ScriptedLayer::new(200, 25);
    layer.push_record(fragment(MessageType::Certificate, 30, 0, 0, &body[0..13]));
    layer.push_record(fragment(MessageType::Certificate, 30, 0, 20, &body[20..30]));
    layer.push_record(fragment(MessageType::Certificate, 30, 0, 13, &body[13..20]));

    let mut handshake = ReliableHandshake::new(&mut layer, Arc::new(Config::default()));

    let message = handshake.receive_message().unwrap();
    assert_eq!(message.seq(), 0);
    assert_eq!(message.body(), &body[..]);
}

#[test]
fn later_seq_buffers_until_earlier_completes() {
    init_log();

    let mut layer = ScriptedLayer::new(200, 200);
    // All of seq 1 arrives before any of seq 0.
    layer.push_record(full_message(MessageType::Certificate, 1, &[2; 8]));
    layer.push_record(full_message(MessageType::ServerHello, 0, &[1; 4]));

    let mut handshake = ReliableHandshake::new(&mut layer, Arc::new(Config::default()));

    let first = handshake.receive_message().unwrap();
    assert_eq!(first.seq(), 0);
    assert_eq!(first.body(), &[1; 4]);

    // Seq 1 was buffered while blocked on seq 0; the second call delivers
    // it without touching the (now exhausted) wire.
    let second = handshake.receive_message().unwrap();
    assert_eq!(second.seq(), 1);
    assert_eq!(second.body(), &[2; 8]);
}

#[test]
fn unusable_records_are_dropped_silently() {
    init_log();

    let good = full_message(MessageType::ServerHello, 0, &[7; 6]);

    let mut layer = ScriptedLayer::new(200, 200);
    // Shorter than a fragment header.
    layer.push_record(vec![0x01; 5]);
    // Record size disagreeing with fragment_length.
    let mut oversized = good.clone();
    oversized.push(0xFF);
    layer.push_record(oversized);
    // Further ahead than the receive window allows.
    layer.push_record(full_message(MessageType::Certificate, 11, &[0; 4]));
    // Fragment extending past the declared body length.
    layer.push_record(fragment(MessageType::ServerHello, 4, 0, 3, &[0; 3]));
    // Conflicting body length for an already seeded reassembler.
    layer.push_record(fragment(MessageType::ServerHello, 6, 0, 0, &[9; 3]));
    layer.push_record(fragment(MessageType::ServerHello, 9, 0, 3, &[9; 3]));
    // The real remainder of seq 0.
    layer.push_record(fragment(MessageType::ServerHello, 6, 0, 3, &[7; 3]));

    let mut handshake = ReliableHandshake::new(&mut layer, Arc::new(Config::default()));

    let message = handshake.receive_message().unwrap();
    assert_eq!(message.seq(), 0);
    assert_eq!(message.body(), &[9, 9, 9, 7, 7, 7]);

    // No resend was ever triggered by the garbage.
    drop(handshake);
    assert!(layer.sent.is_empty());
    assert_eq!(layer.epoch_resets, 0);
}

#[test]
fn empty_body_message_sends_one_fragment() {
    init_log();

    let mut layer = ScriptedLayer::new(200, 200);
    let mut handshake = ReliableHandshake::new(&mut layer, Arc::new(Config::default()));

    handshake.send_message(MessageType::Finished, &[]).unwrap();
    handshake.notify_hello_complete(HashAlgorithm::Sha256);

    // The transcript saw a canonical header with length 0 and no body.
    let mut expected = TranscriptHash::new();
    expected.update(
        &FragmentHeader {
            msg_type: MessageType::Finished,
            length: 0,
            message_seq: 0,
            fragment_offset: 0,
            fragment_length: 0,
        }
        .to_bytes(),
    );
    expected.commit(HashAlgorithm::Sha256);
    assert_eq!(
        handshake.current_hash().unwrap(),
        expected.clone_and_finalize().unwrap()
    );

    drop(handshake);

    assert_eq!(layer.sent.len(), 1);
    let record = &layer.sent[0];
    assert_eq!(record.len(), HEADER_LEN);

    let (header, fragment) = FragmentHeader::parse_record(record).unwrap();
    assert_eq!(header.msg_type, MessageType::Finished);
    assert_eq!(header.length, 0);
    assert_eq!(header.fragment_length, 0);
    assert_eq!(header.fragment_offset, 0);
    assert!(fragment.is_empty());
}

#[test]
fn hello_request_never_reaches_the_transcript() {
    init_log();

    let mut layer = ScriptedLayer::new(200, 200);
    let mut handshake = ReliableHandshake::new(&mut layer, Arc::new(Config::default()));

    handshake
        .send_message(MessageType::HelloRequest, &[])
        .unwrap();
    handshake
        .send_message(MessageType::ClientHello, b"hello body")
        .unwrap();
    handshake.notify_hello_complete(HashAlgorithm::Sha256);

    // Only the ClientHello participates; its seq is still 1 on the wire.
    let mut expected = TranscriptHash::new();
    expected.update(
        &FragmentHeader {
            msg_type: MessageType::ClientHello,
            length: 10,
            message_seq: 1,
            fragment_offset: 0,
            fragment_length: 10,
        }
        .to_bytes(),
    );
    expected.update(b"hello body");
    expected.commit(HashAlgorithm::Sha256);

    assert_eq!(
        handshake.current_hash().unwrap(),
        expected.clone_and_finalize().unwrap()
    );
}

#[test]
fn transcript_matches_across_fragmented_receive() {
    init_log();

    // However a message is fragmented on the wire, the transcript sees the
    // canonical unfragmented framing.
    let body: Vec<u8> = (100..130).collect();

    let mut layer = ScriptedLayer::new(200, 25);
    layer.push_record(fragment(MessageType::ClientHello, 30, 0, 13, &body[13..26]));
    layer.push_record(fragment(MessageType::ClientHello, 30, 0, 26, &body[26..30]));
    layer.push_record(fragment(MessageType::ClientHello, 30, 0, 0, &body[0..13]));

    let mut handshake = ReliableHandshake::new(&mut layer, Arc::new(Config::default()));
    let message = handshake.receive_message().unwrap();
    assert_eq!(message.body(), &body[..]);

    handshake.notify_hello_complete(HashAlgorithm::Sha384);

    let mut expected = TranscriptHash::new();
    expected.update(
        &FragmentHeader {
            msg_type: MessageType::ClientHello,
            length: 30,
            message_seq: 0,
            fragment_offset: 0,
            fragment_length: 30,
        }
        .to_bytes(),
    );
    expected.update(&body);
    expected.commit(HashAlgorithm::Sha384);

    assert_eq!(
        handshake.current_hash().unwrap(),
        expected.clone_and_finalize().unwrap()
    );
}

#[test]
fn current_hash_before_commit_is_an_error() {
    init_log();

    let mut layer = ScriptedLayer::new(200, 200);
    let mut handshake = ReliableHandshake::new(&mut layer, Arc::new(Config::default()));

    handshake
        .send_message(MessageType::ClientHello, &[1, 2, 3])
        .unwrap();

    assert!(matches!(
        handshake.current_hash(),
        Err(reflight::Error::UncommittedTranscript)
    ));
}
