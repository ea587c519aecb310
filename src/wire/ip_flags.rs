use bitflags::bitflags;

/// Width of the fragment-offset field sharing the u16 with the flags.
const FRAGMENT_BITS: u16 = 13;
const FRAGMENT_MASK: u16 = (1 << FRAGMENT_BITS) - 1;

bitflags! {
    /// The three IPv4 control bits riding above the 13-bit fragment offset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IpFlags: u16 {
        const MF = 1 << FRAGMENT_BITS;       // More Fragments
        const DF = 1 << (FRAGMENT_BITS + 1); // Don't Fragment
        const RF = 1 << (FRAGMENT_BITS + 2); // Reserved
    }
}

impl IpFlags {
    /// Join the flags with a fragment offset into the wire word.
    pub fn pack(self, frag_offset: u16) -> u16 {
        self.bits() | (frag_offset & FRAGMENT_MASK)
    }

    /// Split the wire word into flags and fragment offset.
    pub fn unpack(word: u16) -> (Self, u16) {
        (Self::from_bits_truncate(word), word & FRAGMENT_MASK)
    }
}

// -- Unit tests --
