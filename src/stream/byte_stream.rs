use std::collections::VecDeque;

/// An in-order byte stream with a bounded buffer.
///
/// One logical writer pushes bytes in and eventually closes the stream; one
/// logical reader peeks and pops them back out. Both halves are views of the
/// same owner, obtained through `writer()` and `reader()`.
#[derive(Debug)]
pub struct ByteStream {
    buffer: VecDeque<u8>,
    capacity: usize,
    bytes_pushed: u64,
    bytes_popped: u64,
    closed: bool,
    error: bool,
}

impl ByteStream {
    /// New `ByteStream` with the given capacity.
    pub fn new(capacity: usize) -> Self {
        ByteStream {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            bytes_pushed: 0,
            bytes_popped: 0,
            closed: false, // It's always the writer's job to close the stream, never the reader
            error: false,
        }
    }

    /// The writer half of the stream.
    pub fn writer(&mut self) -> Writer<'_> {
        Writer(self)
    }

    /// The reader half of the stream.
    pub fn reader(&mut self) -> Reader<'_> {
        Reader(self)
    }

    /// Append as much of `data` as fits; excess is dropped from the tail.
    /// Returns the number of bytes actually accepted.
    pub fn push(&mut self, data: &[u8]) -> usize {
        if self.closed {
            return 0;
        }
        let to_push = data.len().min(self.available_capacity());
        self.buffer.extend(&data[..to_push]);
        self.bytes_pushed += to_push as u64;
        to_push
    }

    /// Close the stream. Idempotent; later pushes are no-ops.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Has the writer closed the stream?
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The remaining capacity in the stream.
    pub fn available_capacity(&self) -> usize {
        self.capacity - self.buffer.len()
    }

    /// The total number of bytes ever accepted by `push`.
    pub fn bytes_pushed(&self) -> u64 {
        self.bytes_pushed
    }

    /// Borrow the buffered bytes as one contiguous slice without consuming them.
    pub fn peek(&mut self) -> &[u8] {
        self.buffer.make_contiguous();
        self.buffer.as_slices().0
    }

    /// Remove exactly `len` bytes from the stream.
    ///
    /// Panics if `len` exceeds the number of buffered bytes; popping more than
    /// the stream holds is a caller bug, not a recoverable condition.
    pub fn pop(&mut self, len: usize) {
        assert!(
            len <= self.buffer.len(),
            "pop({len}) exceeds {} buffered bytes",
            self.buffer.len()
        );
        self.buffer.drain(..len);
        self.bytes_popped += len as u64;
    }

    /// The number of bytes currently buffered.
    pub fn bytes_buffered(&self) -> usize {
        self.buffer.len()
    }

    /// The total number of bytes ever popped.
    pub fn bytes_popped(&self) -> u64 {
        self.bytes_popped
    }

    /// Is the stream both closed and fully drained?
    pub fn is_finished(&self) -> bool {
        self.closed && self.buffer.is_empty()
    }

    /// Flag the stream as errored. Sticky; shared by both halves.
    pub fn set_error(&mut self) {
        self.error = true;
    }

    /// Has the stream suffered an error?
    pub fn has_error(&self) -> bool {
        self.error
    }
}

/// The writer half of a `ByteStream`.
#[derive(Debug)]
pub struct Writer<'a>(&'a mut ByteStream);

impl Writer<'_> {
    pub fn push(&mut self, data: &[u8]) -> usize {
        self.0.push(data)
    }

    pub fn close(&mut self) {
        self.0.close();
    }

    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }

    pub fn available_capacity(&self) -> usize {
        self.0.available_capacity()
    }

    pub fn bytes_pushed(&self) -> u64 {
        self.0.bytes_pushed()
    }

    pub fn set_error(&mut self) {
        self.0.set_error();
    }

    pub fn has_error(&self) -> bool {
        self.0.has_error()
    }
}

/// The reader half of a `ByteStream`.
#[derive(Debug)]
pub struct Reader<'a>(&'a mut ByteStream);

impl Reader<'_> {
    pub fn peek(&mut self) -> &[u8] {
        self.0.peek()
    }

    pub fn pop(&mut self, len: usize) {
        self.0.pop(len);
    }

    pub fn bytes_buffered(&self) -> usize {
        self.0.bytes_buffered()
    }

    pub fn bytes_popped(&self) -> u64 {
        self.0.bytes_popped()
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }

    pub fn set_error(&mut self) {
        self.0.set_error();
    }

    pub fn has_error(&self) -> bool {
        self.0.has_error()
    }
}

// -- Unit tests --
