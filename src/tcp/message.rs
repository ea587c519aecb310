use crate::tcp::wrap32::Wrap32;

/// The segment-level message a `TcpSender` emits to the peer's receiver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TcpSenderMessage {
    pub seqno: Wrap32,
    pub syn: bool,
    pub payload: Vec<u8>,
    pub fin: bool,
    pub rst: bool,
}

impl TcpSenderMessage {
    /// How many sequence numbers this message occupies (SYN and FIN each
    /// count for one, plus the payload length).
    pub fn sequence_length(&self) -> u64 {
        self.syn as u64 + self.payload.len() as u64 + self.fin as u64
    }
}

/// The acknowledgment-level message a `TcpReceiver` sends back to the
/// peer's sender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TcpReceiverMessage {
    pub ackno: Option<Wrap32>,
    pub window_size: u16,
    pub rst: bool,
}

// -- Unit tests --
