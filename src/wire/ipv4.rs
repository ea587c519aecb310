use crate::wire::errors::WireError;
use crate::wire::ip_flags::IpFlags;
use std::net::Ipv4Addr;

pub const IPV4_HEADER_LEN: usize = 20;

/// The 20-byte IPv4 header, options unsupported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    pub version: u8, // Always 4 for IPv4
    pub ihl: u8,     // Always 5 since we carry no options
    pub tos: u8,
    pub total_len: u16,
    pub id: u16,
    pub flags: IpFlags,   // 3 bits, part of u16
    pub frag_offset: u16, // 13 bits, part of u16
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
}

impl Ipv4Header {
    /// Serialize an `Ipv4Header` into a byte array of size 20.
    ///
    /// The header is laid out as ten big-endian 16-bit words; the checksum
    /// word is written last, once the other nine are in place.
    pub fn serialize(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        let buf_len = buf.len();
        let header = buf
            .get_mut(..IPV4_HEADER_LEN)
            .ok_or(WireError::BufferTooSmall {
                expected: IPV4_HEADER_LEN,
                found: buf_len,
            })?;

        let src = self.src_ip.octets();
        let dst = self.dst_ip.octets();
        let words: [u16; 10] = [
            u16::from_be_bytes([(self.version << 4) | (self.ihl & 0x0f), self.tos]),
            self.total_len,
            self.id,
            self.flags.pack(self.frag_offset),
            u16::from_be_bytes([self.ttl, self.protocol]),
            0, // Checksum slot, patched below
            u16::from_be_bytes([src[0], src[1]]),
            u16::from_be_bytes([src[2], src[3]]),
            u16::from_be_bytes([dst[0], dst[1]]),
            u16::from_be_bytes([dst[2], dst[3]]),
        ];
        for (chunk, word) in header.chunks_exact_mut(2).zip(words) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }

        let checksum = Self::checksum(header);
        header[10..12].copy_from_slice(&checksum.to_be_bytes());

        Ok(IPV4_HEADER_LEN)
    }

    /// Parse a byte array into an `Ipv4Header`.
    pub fn parse(buf: &[u8]) -> Result<Self, WireError> {
        let header = buf.get(..IPV4_HEADER_LEN).ok_or(WireError::BufferTooSmall {
            expected: IPV4_HEADER_LEN,
            found: buf.len(),
        })?;

        let version = header[0] >> 4;
        if version != 4 {
            return Err(WireError::Unsupported(format!("IP version {version}")));
        }
        // A header summing to anything but zero has been damaged in flight
        if Self::checksum(header) != 0 {
            return Err(WireError::BadChecksum("IP".to_string()));
        }

        let word = |i: usize| u16::from_be_bytes([header[2 * i], header[2 * i + 1]]);
        let addr = |at: usize| Ipv4Addr::new(header[at], header[at + 1], header[at + 2], header[at + 3]);
        let (flags, frag_offset) = IpFlags::unpack(word(3));

        Ok(Ipv4Header {
            version,
            ihl: header[0] & 0x0f,
            tos: header[1],
            total_len: word(1),
            id: word(2),
            flags,
            frag_offset,
            ttl: header[8],
            protocol: header[9],
            checksum: word(5),
            src_ip: addr(12),
            dst_ip: addr(16),
        })
    }

    /// Recompute the stored checksum from the other fields. Required after
    /// any in-place mutation such as a TTL decrement.
    pub fn fill_checksum(&mut self) {
        let mut buf = [0u8; IPV4_HEADER_LEN];
        self.serialize(&mut buf)
            .expect("header buffer sized for header");
        self.checksum = u16::from_be_bytes([buf[10], buf[11]]);
    }

    /// RFC 1071 Internet checksum: one's-complement sum of the 16-bit
    /// words, an odd trailing byte padded on the right.
    pub fn checksum(data: &[u8]) -> u16 {
        let mut words = data.chunks_exact(2);
        let mut sum: u32 = words
            .by_ref()
            .map(|pair| u32::from(u16::from_be_bytes([pair[0], pair[1]])))
            .sum();
        if let Some(&tail) = words.remainder().first() {
            sum += u32::from(tail) << 8;
        }
        while sum > 0xffff {
            sum = (sum & 0xffff) + (sum >> 16);
        }
        !(sum as u16)
    }
}

impl Default for Ipv4Header {
    fn default() -> Self {
        Ipv4Header {
            version: 4,
            ihl: 5,
            tos: 0,
            total_len: IPV4_HEADER_LEN as u16,
            id: 0,
            flags: IpFlags::DF,
            frag_offset: 0,
            ttl: 64,
            protocol: 0,
            checksum: 0,
            src_ip: Ipv4Addr::UNSPECIFIED,
            dst_ip: Ipv4Addr::UNSPECIFIED,
        }
    }
}

/// An IPv4 datagram: header plus opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternetDatagram {
    pub header: Ipv4Header,
    pub payload: Vec<u8>,
}

impl InternetDatagram {
    /// New datagram from `src` to `dst` carrying `payload`, with the
    /// header's length fields filled in.
    pub fn new(src_ip: Ipv4Addr, dst_ip: Ipv4Addr, ttl: u8, payload: Vec<u8>) -> Self {
        let mut header = Ipv4Header {
            src_ip,
            dst_ip,
            ttl,
            total_len: (IPV4_HEADER_LEN + payload.len()) as u16,
            ..Default::default()
        };
        header.fill_checksum();
        InternetDatagram { header, payload }
    }

    /// Serialize the datagram into a fresh byte vector.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; IPV4_HEADER_LEN + self.payload.len()];
        self.header
            .serialize(&mut buf)
            .expect("datagram buffer sized for header");
        buf[IPV4_HEADER_LEN..].copy_from_slice(&self.payload);
        buf
    }

    /// Parse a byte array into an `InternetDatagram`.
    pub fn parse(buf: &[u8]) -> Result<Self, WireError> {
        let header = Ipv4Header::parse(buf)?;

        let total_len = header.total_len as usize;
        if buf.len() < total_len || total_len < IPV4_HEADER_LEN {
            return Err(WireError::BufferTooSmall {
                expected: total_len,
                found: buf.len(),
            });
        }

        Ok(InternetDatagram {
            header,
            payload: buf[IPV4_HEADER_LEN..total_len].to_vec(),
        })
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_from_known_bytes() {
        // 20-byte IPv4 header captured off the wire
        let bytes = hex::decode("45000040000040004006d3760a6ed06acc2cc03c").unwrap();
        let header = Ipv4Header::parse(&bytes).unwrap();

        assert_eq!(header.version, 4);
        assert_eq!(header.ihl, 5);
        assert_eq!(header.total_len, 64);
        assert_eq!(header.flags, IpFlags::DF);
        assert_eq!(header.ttl, 64);
        assert_eq!(header.protocol, 6);
        assert_eq!(header.src_ip, Ipv4Addr::new(10, 110, 208, 106));
        assert_eq!(header.dst_ip, Ipv4Addr::new(204, 44, 192, 60));

        // Serializing reproduces the capture byte for byte
        let mut buf = [0u8; 20];
        header.serialize(&mut buf).unwrap();
        assert_eq!(buf.as_slice(), bytes.as_slice());
    }

    #[test]
    fn test_parse_rejects_corrupt_checksum() {
        let mut bytes = hex::decode("45000040000040004006d3760a6ed06acc2cc03c").unwrap();
        bytes[8] = 7; // Tamper with the TTL
        let err = Ipv4Header::parse(&bytes).unwrap_err();
        assert_eq!(err, WireError::BadChecksum("IP".to_string()));
    }

    #[test]
    fn test_checksum_pads_odd_tail() {
        // An odd-length span treats the final byte as the high half of a
        // padded word
        let odd = [0x12u8, 0x34, 0x56];
        let even = [0x12u8, 0x34, 0x56, 0x00];
        assert_eq!(Ipv4Header::checksum(&odd), Ipv4Header::checksum(&even));
    }

    #[test]
    fn test_fill_checksum_after_ttl_change() {
        let mut dgram = InternetDatagram::new(
            Ipv4Addr::new(192, 168, 0, 1),
            Ipv4Addr::new(10, 0, 0, 1),
            64,
            b"hi".to_vec(),
        );

        dgram.header.ttl -= 1;
        dgram.header.fill_checksum();

        // The reserialized datagram must still verify
        let parsed = InternetDatagram::parse(&dgram.serialize()).unwrap();
        assert_eq!(parsed.header.ttl, 63);
        assert_eq!(parsed, dgram);
    }

    #[test]
    fn test_datagram_payload_bounded_by_total_len() {
        let dgram = InternetDatagram::new(
            Ipv4Addr::new(1, 1, 1, 1),
            Ipv4Addr::new(2, 2, 2, 2),
            32,
            b"abcdef".to_vec(),
        );

        // Trailing link-layer padding is not part of the datagram
        let mut bytes = dgram.serialize();
        bytes.extend_from_slice(&[0u8; 12]);
        let parsed = InternetDatagram::parse(&bytes).unwrap();
        assert_eq!(parsed.payload, b"abcdef");
    }
}
