use crate::wire::errors::WireError;
use std::fmt;

/// Ethertype for IPv4 payloads.
pub const ETHERTYPE_IPV4: u16 = 0x0800;
/// Ethertype for ARP payloads.
pub const ETHERTYPE_ARP: u16 = 0x0806;

/// A 48-bit Ethernet (hardware) address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EthernetAddress(pub [u8; 6]);

/// The all-ones broadcast address.
pub const ETHERNET_BROADCAST: EthernetAddress = EthernetAddress([0xff; 6]);

impl EthernetAddress {
    pub const ZERO: EthernetAddress = EthernetAddress([0; 6]);

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for EthernetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// The 14-octet Ethernet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: EthernetAddress,
    pub src: EthernetAddress,
    pub ethertype: u16,
}

pub const ETHERNET_HEADER_LEN: usize = 14;

impl EthernetHeader {
    /// Serialize an `EthernetHeader` into a byte array of size 14.
    pub fn serialize(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        if buf.len() < ETHERNET_HEADER_LEN {
            return Err(WireError::BufferTooSmall {
                expected: ETHERNET_HEADER_LEN,
                found: buf.len(),
            });
        }

        buf[0..6].copy_from_slice(&self.dst.0);
        buf[6..12].copy_from_slice(&self.src.0);
        buf[12..14].copy_from_slice(&self.ethertype.to_be_bytes());

        Ok(ETHERNET_HEADER_LEN)
    }

    /// Parse a byte array into an `EthernetHeader`.
    pub fn parse(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < ETHERNET_HEADER_LEN {
            return Err(WireError::BufferTooSmall {
                expected: ETHERNET_HEADER_LEN,
                found: buf.len(),
            });
        }

        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        dst.copy_from_slice(&buf[0..6]);
        src.copy_from_slice(&buf[6..12]);
        let ethertype = u16::from_be_bytes([buf[12], buf[13]]);

        Ok(EthernetHeader {
            dst: EthernetAddress(dst),
            src: EthernetAddress(src),
            ethertype,
        })
    }
}

/// An Ethernet frame: header plus opaque payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    pub header: EthernetHeader,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    /// Serialize the frame into a fresh byte vector.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ETHERNET_HEADER_LEN + self.payload.len()];
        self.header
            .serialize(&mut buf)
            .expect("frame buffer sized for header");
        buf[ETHERNET_HEADER_LEN..].copy_from_slice(&self.payload);
        buf
    }

    /// Parse a byte array into an `EthernetFrame`.
    pub fn parse(buf: &[u8]) -> Result<Self, WireError> {
        let header = EthernetHeader::parse(buf)?;
        Ok(EthernetFrame {
            header,
            payload: buf[ETHERNET_HEADER_LEN..].to_vec(),
        })
    }
}

// -- Unit tests --
