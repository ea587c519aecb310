/// The most payload bytes a single TCP segment may carry.
pub const MAX_PAYLOAD_SIZE: usize = 1452;

/// The largest receive window advertisable in a 16-bit field.
pub const MAX_WINDOW_SIZE: u16 = u16::MAX;
