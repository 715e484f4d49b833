use std::time::Duration;

use crate::retransmit::RetransmitHook;
use crate::Error;

/// The record layer beneath the reliable handshake.
///
/// The record layer owns epochs, encryption, datagram I/O and path MTU; the
/// handshake core only consumes this surface. One record carries exactly one
/// handshake fragment.
pub trait RecordLayer {
    /// Current maximum payload size for a record we send.
    fn send_limit(&self) -> usize;

    /// Current maximum payload size for a received record.
    fn receive_limit(&self) -> usize;

    /// Send one record. Atomic; a failure is fatal for the association.
    fn send(&mut self, record: &[u8]) -> Result<(), Error>;

    /// Receive one record into `buf`.
    ///
    /// Returns `Ok(Some(n))` for a record of `n` bytes and `Ok(None)` when
    /// no datagram arrived within `timeout`. An `Err` is a transient or
    /// fatal I/O failure; the two are indistinguishable at this layer and
    /// the caller treats both like a timeout for retransmit purposes.
    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<Option<usize>, Error>;

    /// Make subsequent sends use the epoch of the last transmitted flight.
    ///
    /// Retransmissions of an old flight must travel under the epoch that
    /// flight was originally sent under; the epoch bookkeeping itself lives
    /// in the record layer.
    fn reset_write_epoch(&mut self);

    /// The handshake has concluded.
    ///
    /// When this side transmitted the final flight, `retransmit` carries the
    /// hook that answers peer re-sends of their last flight. The record
    /// layer dispatches incoming handshake records to it for a grace window
    /// of at least twice the maximum segment lifetime, then drops it.
    fn handshake_successful(&mut self, retransmit: Option<RetransmitHook>);
}
