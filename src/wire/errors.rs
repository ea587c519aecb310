use thiserror::Error;

#[derive(Debug, PartialEq, Error)]
pub enum WireError {
    #[error("Buffer too small: expected at least {expected} bytes, actual {found} bytes")]
    BufferTooSmall { expected: usize, found: usize },

    #[error("Bad checksum in {0} header")]
    BadChecksum(String),

    #[error("Unsupported field value: {0}")]
    Unsupported(String),
}
