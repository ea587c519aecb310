use crate::stream::byte_stream::{ByteStream, Reader};
use std::collections::BTreeMap;

/// Reassembles out-of-order, possibly overlapping substrings into an
/// in-order `ByteStream`.
///
/// Fragments that fit inside the acceptance window but cannot be written yet
/// are cached as disjoint intervals keyed by start index. Anything beyond the
/// window is discarded; the window never stores more than the output stream
/// could accept.
#[derive(Debug)]
pub struct Reassembler {
    output: ByteStream,
    pending: BTreeMap<u64, Vec<u8>>, // Disjoint cached intervals. key = start index
    bytes_pending: u64,
    next_index: u64, // The next stream index expected by the output
    last_seen: bool, // Has a fragment marked as the end of the stream been accepted?
}

impl Reassembler {
    /// New `Reassembler` writing into the provided `ByteStream`.
    pub fn new(output: ByteStream) -> Self {
        Reassembler {
            output,
            pending: BTreeMap::new(),
            bytes_pending: 0,
            next_index: 0,
            last_seen: false,
        }
    }

    /// Insert a fragment of the stream.
    ///
    /// `first_index` is the stream index of `data[0]`; `is_last` marks the
    /// fragment containing the final byte of the stream.
    pub fn insert(&mut self, first_index: u64, data: &[u8], is_last: bool) {
        let window = self.output.available_capacity() as u64;
        let unacceptable = self.next_index + window;
        if window == 0 || self.output.is_closed() || first_index >= unacceptable {
            return;
        }

        let mut data = data;
        let mut is_last = is_last;
        if first_index + data.len() as u64 > unacceptable {
            // The tail was dropped, so the end of the stream is still unknown
            data = &data[..(unacceptable - first_index) as usize];
            is_last = false;
        }
        self.last_seen |= is_last;

        if first_index > self.next_index {
            if !data.is_empty() {
                self.cache(first_index, data);
            } else if is_last {
                // Hold the end position open so the stream cannot close
                // before the bytes leading up to it arrive
                self.pending.entry(first_index).or_default();
            }
        } else {
            let skip = (self.next_index - first_index) as usize;
            if skip < data.len() {
                self.deliver(&data[skip..]);
            }
        }
        self.flush();

        if self.last_seen && self.pending.is_empty() {
            self.output.close();
        }
    }

    /// The total number of bytes cached, awaiting earlier gaps.
    pub fn count_bytes_pending(&self) -> u64 {
        self.bytes_pending
    }

    /// The next stream index the output expects.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Read-only view of the output stream.
    pub fn output(&self) -> &ByteStream {
        &self.output
    }

    /// The reader half of the output stream.
    pub fn reader(&mut self) -> Reader<'_> {
        self.output.reader()
    }

    /// Write `data` at `next_index` and advance.
    fn deliver(&mut self, data: &[u8]) {
        let pushed = self.output.push(data);
        self.next_index += pushed as u64;
    }

    /// Cache a fragment starting past `next_index`, coalescing overlaps.
    /// Bytes already cached win over the incoming copy where they collide.
    fn cache(&mut self, first_index: u64, data: &[u8]) {
        let mut start = first_index;
        let mut end = first_index + data.len() as u64;
        let mut merged = data.to_vec();

        let overlapping: Vec<u64> = self
            .pending
            .range(..end)
            .filter(|&(&idx, seg)| idx + seg.len() as u64 > start)
            .map(|(&idx, _)| idx)
            .collect();

        for idx in overlapping {
            let seg = self.pending.remove(&idx).unwrap();
            self.bytes_pending -= seg.len() as u64;
            let seg_end = idx + seg.len() as u64;
            let grown_start = start.min(idx);
            let grown_end = end.max(seg_end);

            let mut grown = vec![0u8; (grown_end - grown_start) as usize];
            let data_at = (start - grown_start) as usize;
            grown[data_at..data_at + merged.len()].copy_from_slice(&merged);
            let seg_at = (idx - grown_start) as usize;
            grown[seg_at..seg_at + seg.len()].copy_from_slice(&seg);

            merged = grown;
            start = grown_start;
            end = grown_end;
        }

        self.bytes_pending += merged.len() as u64;
        self.pending.insert(start, merged);
    }

    /// Drain every cached interval that has become contiguous with the output.
    fn flush(&mut self) {
        while let Some((&idx, _)) = self.pending.first_key_value() {
            if idx > self.next_index {
                break;
            }
            let seg = self.pending.remove(&idx).unwrap();
            self.bytes_pending -= seg.len() as u64;
            let skip = (self.next_index - idx) as usize;
            if skip < seg.len() {
                self.deliver(&seg[skip..]);
            }
        }
    }
}

// -- Unit tests --
