use crate::stream::byte_stream::{ByteStream, Reader, Writer};
use crate::tcp::config::MAX_PAYLOAD_SIZE;
use crate::tcp::message::{TcpReceiverMessage, TcpSenderMessage};
use crate::tcp::wrap32::Wrap32;
use std::collections::VecDeque;

/// Retransmission timer: stopped, or running the elapsed time against the
/// current timeout.
#[derive(Debug)]
enum RetransmitTimer {
    Stopped,
    Running { elapsed: u64, rto: u64 },
}

impl RetransmitTimer {
    fn start_if_stopped(&mut self, rto: u64) {
        if let RetransmitTimer::Stopped = self {
            *self = RetransmitTimer::Running { elapsed: 0, rto };
        }
    }

    fn stop(&mut self) {
        *self = RetransmitTimer::Stopped;
    }

    fn restart(&mut self, rto: u64) {
        *self = RetransmitTimer::Running { elapsed: 0, rto };
    }

    /// Advance time; true when the timeout fires.
    fn tick(&mut self, ms: u64) -> bool {
        match self {
            RetransmitTimer::Stopped => false,
            RetransmitTimer::Running { elapsed, rto } => {
                *elapsed += ms;
                *elapsed >= *rto
            }
        }
    }

    /// Rearm after an expiry, doubling the timeout unless suppressed.
    fn backoff(&mut self, double: bool) {
        if let RetransmitTimer::Running { elapsed, rto } = self {
            if double {
                *rto *= 2;
            }
            *elapsed = 0;
        }
    }
}

/// The sending half of a TCP connection.
///
/// Reads from its input `ByteStream`, slices the bytes into segments that
/// respect the peer's advertised window, and retransmits the oldest
/// outstanding segment when the retransmission timer expires.
#[derive(Debug)]
pub struct TcpSender {
    input: ByteStream,
    isn: Wrap32,
    initial_rto_ms: u64,

    next_seqno: u64,  // Absolute seqno of the next byte to send
    acked_seqno: u64, // Absolute seqno of the first byte not yet acknowledged
    in_flight: u64,   // Sequence numbers sent but not yet acknowledged
    window_size: u16, // Peer-advertised receive window
    zero_window: bool, // True when the peer advertised zero; probes don't back off
    syn_sent: bool,
    fin_sent: bool,
    outstanding: VecDeque<TcpSenderMessage>,
    timer: RetransmitTimer,
    consecutive_retx: u64,
}

impl TcpSender {
    /// New `TcpSender` reading from `input`, numbering from `isn`.
    pub fn new(input: ByteStream, isn: Wrap32, initial_rto_ms: u64) -> Self {
        TcpSender {
            input,
            isn,
            initial_rto_ms,
            next_seqno: 0,
            acked_seqno: 0,
            in_flight: 0,
            window_size: 1,
            zero_window: false,
            syn_sent: false,
            fin_sent: false,
            outstanding: VecDeque::new(),
            timer: RetransmitTimer::Stopped,
            consecutive_retx: 0,
        }
    }

    /// Slice as much of the input stream as the window allows into segments,
    /// handing each to `transmit`.
    pub fn push(&mut self, mut transmit: impl FnMut(&TcpSenderMessage)) {
        loop {
            if self.fin_sent {
                break;
            }

            // A zero window is probed as if it were one sequence number wide
            let window = self.window_size.max(1) as u64;
            if self.in_flight >= window {
                break;
            }
            let room = window - self.in_flight;

            let syn = !self.syn_sent;
            let payload_budget = room - syn as u64;
            let take = (payload_budget as usize)
                .min(MAX_PAYLOAD_SIZE)
                .min(self.input.bytes_buffered());
            let payload = self.input.peek()[..take].to_vec();
            self.input.pop(take);

            // The FIN rides along only if the window has a seqno left for it
            let fin = self.input.is_finished() && syn as u64 + take as u64 + 1 <= room;

            let msg = TcpSenderMessage {
                seqno: Wrap32::wrap(self.next_seqno, self.isn),
                syn,
                payload,
                fin,
                rst: self.input.has_error(),
            };
            let len = msg.sequence_length();
            if len == 0 {
                break;
            }

            transmit(&msg);
            self.next_seqno += len;
            self.in_flight += len;
            self.syn_sent |= syn;
            self.fin_sent |= fin;
            self.outstanding.push_back(msg);
            self.timer.start_if_stopped(self.initial_rto_ms);
        }
    }

    /// Process an acknowledgment from the peer's receiver.
    pub fn receive(&mut self, msg: &TcpReceiverMessage) {
        self.window_size = msg.window_size;
        self.zero_window = msg.window_size == 0;
        if msg.rst {
            self.input.set_error();
        }

        let Some(ackno) = msg.ackno else { return };
        let abs_ack = ackno.unwrap(self.isn, self.next_seqno);
        if abs_ack > self.next_seqno || abs_ack < self.acked_seqno {
            // Acknowledges data never sent, or nothing new
            return;
        }

        // Retire outstanding segments that are now fully acknowledged
        let mut acked = false;
        while let Some(front) = self.outstanding.front() {
            let end = self.acked_seqno + front.sequence_length();
            if end > abs_ack {
                break;
            }
            self.in_flight -= front.sequence_length();
            self.acked_seqno = end;
            self.outstanding.pop_front();
            acked = true;
        }

        if acked {
            self.consecutive_retx = 0;
            if self.outstanding.is_empty() {
                self.timer.stop();
            } else {
                self.timer.restart(self.initial_rto_ms);
            }
        }
    }

    /// Account for `ms` of elapsed time, retransmitting the oldest
    /// outstanding segment if the timer expires.
    pub fn tick(&mut self, ms: u64, mut transmit: impl FnMut(&TcpSenderMessage)) {
        if !self.timer.tick(ms) {
            return;
        }
        let Some(front) = self.outstanding.front() else {
            return;
        };
        transmit(front);
        self.timer.backoff(!self.zero_window);
        self.consecutive_retx += 1;
    }

    /// A zero-length message at the current sequence number, for carrying a
    /// bare acknowledgment.
    pub fn make_empty_message(&self) -> TcpSenderMessage {
        TcpSenderMessage {
            seqno: Wrap32::wrap(self.next_seqno, self.isn),
            rst: self.input.has_error(),
            ..Default::default()
        }
    }

    /// How many sequence numbers are outstanding?
    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.in_flight
    }

    /// How many consecutive retransmissions have happened?
    pub fn consecutive_retransmissions(&self) -> u64 {
        self.consecutive_retx
    }

    /// Read-only view of the input stream.
    pub fn input(&self) -> &ByteStream {
        &self.input
    }

    /// The writer half of the input stream.
    pub fn writer(&mut self) -> Writer<'_> {
        self.input.writer()
    }

    /// The reader half of the input stream.
    pub fn reader(&mut self) -> Reader<'_> {
        self.input.reader()
    }
}

// -- Unit tests --
