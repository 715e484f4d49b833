//! Fragmenting writer for outbound handshake messages.

use crate::buffer::BufferPool;
use crate::error::AlertDescription;
use crate::message::{FragmentHeader, Message, HEADER_LEN};
use crate::record::RecordLayer;
use crate::Error;

/// Write one handshake message, fragmented to the record layer's current
/// send limit. An empty body still goes out as one zero-length fragment.
pub(crate) fn write_message<R: RecordLayer + ?Sized>(
    layer: &mut R,
    message: &Message,
    buffers: &mut BufferPool,
) -> Result<(), Error> {
    let send_limit = layer.send_limit();
    let fragment_limit = send_limit.saturating_sub(HEADER_LEN);

    if fragment_limit < 1 {
        return Err(Error::FatalAlert(AlertDescription::InternalError));
    }

    let body = message.body();
    let mut record = buffers.pop();
    let mut fragment_offset = 0;

    loop {
        let fragment_length = (body.len() - fragment_offset).min(fragment_limit);

        let header = FragmentHeader {
            msg_type: message.msg_type(),
            length: body.len() as u32,
            message_seq: message.seq(),
            fragment_offset: fragment_offset as u32,
            fragment_length: fragment_length as u32,
        };

        record.clear();
        record.extend_from_slice(&header.to_bytes());
        record.extend_from_slice(&body[fragment_offset..fragment_offset + fragment_length]);

        layer.send(&record)?;

        fragment_offset += fragment_length;
        if fragment_offset >= body.len() {
            break;
        }
    }

    buffers.push(record);

    Ok(())
}

/// Re-send a whole flight under its original write epoch.
///
/// Each message is re-fragmented at the *current* send limit; the handshake
/// seq and length fields are unchanged, so the peer's reassembly and
/// transcript are unaffected however often this runs.
pub(crate) fn resend_flight<R: RecordLayer + ?Sized>(
    layer: &mut R,
    flight: &[Message],
    buffers: &mut BufferPool,
) -> Result<(), Error> {
    debug!("Resending outbound flight of {} messages", flight.len());

    layer.reset_write_epoch();

    for message in flight {
        write_message(layer, message, buffers)?;
    }

    Ok(())
}
