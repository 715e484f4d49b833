//! reflight — reliable delivery of DTLS handshake flights
//!
//! DTLS runs the TLS handshake over an unreliable datagram transport, so
//! the handshake itself has to supply the reliability: messages are grouped
//! into *flights*, any loss is recovered by retransmitting whole flights
//! under exponential backoff, and each message may be fragmented across
//! records of varying size. reflight is that layer, and nothing else: it
//! turns a record-oriented datagram transport into an ordered, reliably
//! delivered, reassembled stream of handshake messages, while keeping the
//! rolling transcript hash the cryptographic handshake above it needs.
//!
//! # Goals
//! - **Correct flight bookkeeping**: retransmit on timeout and on peer
//!   re-sends, including the post-finish grace window of RFC 6347 4.2.4.
//! - **Transcript discipline**: every message hashed exactly once, in seq
//!   order, as if it travelled unfragmented, however it actually went on
//!   the wire.
//! - **Safety**: `forbid(unsafe_code)`; handshake bytes live in zeroizing
//!   buffers.
//!
//! ## Non-goals
//! - **The record layer**: epochs, encryption, MTU discovery and datagram
//!   I/O belong to the [`RecordLayer`] you provide.
//! - **The TLS state machine**: key exchange, certificates and Finished
//!   verification happen above; this crate moves their messages.
//! - **Congestion control** beyond the retransmit backoff.
//! - **Multiple handshake messages per record.**
//!
//! ## Integration model
//! The TLS state machine above drives four calls:
//! - [`ReliableHandshake::send_message`] — queue-and-send one message of
//!   the current outbound flight.
//! - [`ReliableHandshake::receive_message`] — block until the next message
//!   (in seq order) completes; retransmits happen inside.
//! - [`ReliableHandshake::notify_hello_complete`] — commit the transcript
//!   hash once the hello exchange settles the algorithm.
//! - [`ReliableHandshake::finish`] — conclude, possibly arming the
//!   post-finish [`RetransmitHook`] on the record layer.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::net::UdpSocket;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use reflight::{Config, Error, HashAlgorithm, MessageType};
//! use reflight::{RecordLayer, ReliableHandshake, RetransmitHook};
//!
//! /// Minimal plaintext record layer over a connected UDP socket.
//! struct UdpRecordLayer {
//!     socket: UdpSocket,
//! }
//!
//! impl RecordLayer for UdpRecordLayer {
//!     fn send_limit(&self) -> usize {
//!         1200
//!     }
//!
//!     fn receive_limit(&self) -> usize {
//!         1500
//!     }
//!
//!     fn send(&mut self, record: &[u8]) -> Result<(), Error> {
//!         self.socket
//!             .send(record)
//!             .map(|_| ())
//!             .map_err(|e| Error::Transport(e.to_string()))
//!     }
//!
//!     fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<Option<usize>, Error> {
//!         self.socket
//!             .set_read_timeout(Some(timeout))
//!             .map_err(|e| Error::Transport(e.to_string()))?;
//!         match self.socket.recv(buf) {
//!             Ok(n) => Ok(Some(n)),
//!             Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
//!             Err(e) => Err(Error::Transport(e.to_string())),
//!         }
//!     }
//!
//!     fn reset_write_epoch(&mut self) {
//!         // Plaintext example; a real record layer rewinds its write
//!         // epoch to the one the last flight was sent under.
//!     }
//!
//!     fn handshake_successful(&mut self, _retransmit: Option<RetransmitHook>) {}
//! }
//!
//! fn run_client(layer: &mut UdpRecordLayer) -> Result<(), Error> {
//!     let config = Arc::new(Config::default());
//!     let mut handshake = ReliableHandshake::new(layer, config);
//!
//!     handshake.send_message(MessageType::ClientHello, b"..client hello body..")?;
//!     let server_hello = handshake.receive_message()?;
//!     assert_eq!(server_hello.msg_type(), MessageType::ServerHello);
//!     handshake.notify_hello_complete(HashAlgorithm::Sha256);
//!
//!     // ... drive the remaining flights the same way, then:
//!     let _transcript = handshake.current_hash()?;
//!     handshake.finish();
//!     Ok(())
//! }
//!
//! let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
//! socket.connect("198.51.100.7:4433").unwrap();
//! let mut layer = UdpRecordLayer { socket };
//! run_client(&mut layer).unwrap();
//! ```
//!
//! ### MSRV
//! Rust 1.81.0
//!
#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![deny(missing_docs)]

// A full DTLS 1.2 handshake as flights
//
// Client                                               Server
//
// 1     ClientHello                  -------->
//
// 2                                  <--------   HelloVerifyRequest
//
// 3     ClientHello                  -------->
//       (with cookie)
// 4                                                     ServerHello
//                                                      Certificate*
//                                                ServerKeyExchange*
//                                               CertificateRequest*
//                                    <--------      ServerHelloDone
// 5     Certificate*
//       ClientKeyExchange
//       CertificateVerify*
//       Finished                     -------->
// 6                                  <--------             Finished
//
// Every arrow is one flight: the unit of retransmission. Losing any record
// of a flight, in either direction, is recovered by re-sending the whole
// flight.

#[macro_use]
extern crate log;

pub mod buffer;

mod config;
pub use config::{Config, ConfigBuilder};

mod error;
pub use error::{AlertDescription, Error};

mod handshake;
pub use handshake::ReliableHandshake;

mod message;
pub use message::{FragmentHeader, Message, MessageType, HEADER_LEN};

mod outbound;
mod reassembly;

mod record;
pub use record::RecordLayer;

mod retransmit;
pub use retransmit::RetransmitHook;

mod timer;

mod transcript;
pub use transcript::{HashAlgorithm, TranscriptHash};
