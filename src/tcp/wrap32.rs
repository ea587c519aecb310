use std::fmt;
use std::ops::Add;

/// A 32-bit sequence number, relative to an implicit zero point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Wrap32 {
    value: u32,
}

impl Wrap32 {
    pub fn new(value: u32) -> Self {
        Wrap32 { value }
    }

    /// The raw 32-bit value.
    pub fn raw(&self) -> u32 {
        self.value
    }

    /// Wrap an absolute sequence number `n` relative to `zero_point`.
    pub fn wrap(n: u64, zero_point: Wrap32) -> Self {
        Wrap32::new((n as u32).wrapping_add(zero_point.value))
    }

    /// Unwrap into the absolute sequence number closest to `checkpoint`.
    ///
    /// Ties between the two candidates around the checkpoint break toward
    /// the larger value; the result is never negative.
    pub fn unwrap(&self, zero_point: Wrap32, checkpoint: u64) -> u64 {
        const WRAP_SIZE: u64 = 1 << 32;

        // Where the checkpoint lands in the 32-bit space, then the forward
        // distance from there to this value
        let checkpoint_mod = Wrap32::wrap(checkpoint, zero_point).value;
        let distance = self.value.wrapping_sub(checkpoint_mod) as u64;

        if distance <= WRAP_SIZE / 2 || checkpoint + distance < WRAP_SIZE {
            checkpoint + distance
        } else {
            checkpoint + distance - WRAP_SIZE
        }
    }
}

impl Add<u64> for Wrap32 {
    type Output = Wrap32;

    fn add(self, rhs: u64) -> Wrap32 {
        Wrap32::new(self.value.wrapping_add(rhs as u32))
    }
}

impl fmt::Display for Wrap32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    // -- Test wrapping --

    #[test]
    fn test_wrap_zero_offset() {
        let wrapped = Wrap32::wrap(3 * (1u64 << 32), Wrap32::new(0));
        assert_eq!(wrapped, Wrap32::new(0));
    }

    #[test]
    fn test_wrap_positive_offset() {
        let wrapped = Wrap32::wrap(3 * (1u64 << 32) + 17, Wrap32::new(15));
        assert_eq!(wrapped, Wrap32::new(32));
    }

    #[test]
    fn test_wrap_negative_offset() {
        let wrapped = Wrap32::wrap(7 * (1u64 << 32) - 2, Wrap32::new(15));
        assert_eq!(wrapped, Wrap32::new(13));
    }

    // -- Test unwrapping --

    #[test]
    fn test_unwrap_first_sequence_after_isn_zero() {
        assert_eq!(Wrap32::new(1).unwrap(Wrap32::new(0), 0), 1);
    }

    #[test]
    fn test_unwrap_first_sequence_after_first_wraparound() {
        let unwrapped = Wrap32::new(1).unwrap(Wrap32::new(0), u32::MAX as u64);
        assert_eq!(unwrapped, (1u64 << 32) + 1);
    }

    #[test]
    fn test_unwrap_last_sequence_before_third_wraparound() {
        let unwrapped = Wrap32::new(u32::MAX - 1).unwrap(Wrap32::new(0), 3 * (1u64 << 32));
        assert_eq!(unwrapped, 3 * (1u64 << 32) - 2);
    }

    #[test]
    fn test_unwrap_with_nonzero_isn() {
        let unwrapped = Wrap32::new(32).unwrap(Wrap32::new(15), 3 * (1u64 << 32));
        assert_eq!(unwrapped, 3 * (1u64 << 32) + 17);
    }

    #[test]
    fn test_unwrap_value_equals_isn_returns_zero() {
        assert_eq!(Wrap32::new(16).unwrap(Wrap32::new(16), 0), 0);
    }

    #[test]
    fn test_unwrap_max_value_with_nonzero_isn() {
        assert_eq!(Wrap32::new(15).unwrap(Wrap32::new(16), 0), u32::MAX as u64);
    }

    #[test]
    fn test_unwrap_never_negative() {
        let unwrapped = Wrap32::new(0).unwrap(Wrap32::new(i32::MAX as u32), 0);
        assert_eq!(unwrapped, (i32::MAX as u64) + 2);
    }

    #[test]
    fn test_unwrap_tie_breaks_toward_larger() {
        // Both representatives are 2^31 away from the checkpoint; the larger
        // one wins
        let unwrapped = Wrap32::new(0).unwrap(Wrap32::new(0), 1u64 << 31);
        assert_eq!(unwrapped, 1u64 << 32);
    }

    // -- Test round trip --

    #[test]
    fn test_wrap_unwrap_round_trip() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let isn = Wrap32::new(rng.gen());
            let n: u64 = rng.gen::<u64>() >> 1;
            let wrapped = Wrap32::wrap(n, isn);
            assert_eq!(wrapped.unwrap(isn, n), n);
            assert_eq!(Wrap32::wrap(wrapped.unwrap(isn, n), isn), wrapped);
        }
    }

    #[test]
    fn test_unwrap_nearness() {
        // Checkpoints past the first wraparound always have a representative
        // on either side, so the winner sits within half the sequence space
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let isn = Wrap32::new(rng.gen());
            let checkpoint = rng.gen_range((1u64 << 32)..(1u64 << 62));
            let value = Wrap32::new(rng.gen());
            let unwrapped = value.unwrap(isn, checkpoint);
            assert_eq!(Wrap32::wrap(unwrapped, isn), value);
            assert!(unwrapped.abs_diff(checkpoint) <= 1 << 31);
        }
    }

    // -- Test `+` operator overload --

    #[test]
    fn test_add() {
        assert_eq!(Wrap32::new(1) + 2, Wrap32::new(3));
    }

    #[test]
    fn test_add_overflow() {
        assert_eq!(Wrap32::new(u32::MAX) + 1, Wrap32::new(0));
    }
}
