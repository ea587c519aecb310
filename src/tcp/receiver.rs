use crate::stream::byte_stream::{ByteStream, Reader};
use crate::stream::reassembler::Reassembler;
use crate::tcp::config::MAX_WINDOW_SIZE;
use crate::tcp::message::{TcpReceiverMessage, TcpSenderMessage};
use crate::tcp::wrap32::Wrap32;

/// The receiving half of a TCP connection.
///
/// Translates wrapped sequence numbers on inbound segments into stream
/// indices, feeds the payloads to a `Reassembler`, and reports the ackno and
/// window to send back to the peer.
#[derive(Debug)]
pub struct TcpReceiver {
    reassembler: Reassembler,
    syn_seen: bool,
    isn: Wrap32, // Valid only once `syn_seen` is set
}

impl TcpReceiver {
    /// New `TcpReceiver` assembling into the given `Reassembler`.
    pub fn new(reassembler: Reassembler) -> Self {
        TcpReceiver {
            reassembler,
            syn_seen: false,
            isn: Wrap32::new(0),
        }
    }

    /// Process one inbound segment.
    pub fn receive(&mut self, msg: &TcpSenderMessage) {
        if msg.rst {
            self.reassembler.reader().set_error();
            return;
        }

        if msg.syn {
            self.syn_seen = true;
            self.isn = msg.seqno;
        } else if !self.syn_seen || msg.seqno == self.isn {
            // Nothing to anchor the segment to, or data squatting on the
            // sequence number the SYN consumed
            return;
        }

        // The number of stream bytes assembled so far, shifted by one for
        // the SYN, anchors unwrapping near the current position
        let checkpoint = self.reassembler.output().bytes_pushed() + 1;
        let abs_seqno = msg.seqno.unwrap(self.isn, checkpoint);
        let stream_index = abs_seqno.saturating_sub(1);
        self.reassembler.insert(stream_index, &msg.payload, msg.fin);
    }

    /// The acknowledgment message reflecting the current assembly state.
    pub fn send(&self) -> TcpReceiverMessage {
        let output = self.reassembler.output();
        let window_size = output.available_capacity().min(MAX_WINDOW_SIZE as usize) as u16;

        // Ack the next byte wanted, counting one seqno for the SYN and one
        // more for the FIN once the stream has closed
        let ackno = self.syn_seen.then(|| {
            Wrap32::wrap(
                output.bytes_pushed() + 1 + output.is_closed() as u64,
                self.isn,
            )
        });

        TcpReceiverMessage {
            ackno,
            window_size,
            rst: output.has_error(),
        }
    }

    /// Read-only view of the assembled output stream.
    pub fn output(&self) -> &ByteStream {
        self.reassembler.output()
    }

    /// The reader half of the assembled output stream.
    pub fn reader(&mut self) -> Reader<'_> {
        self.reassembler.reader()
    }

    /// The reassembler feeding the output stream.
    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }
}

// -- Unit tests --
