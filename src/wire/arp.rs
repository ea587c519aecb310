use crate::wire::errors::WireError;
use crate::wire::ethernet::EthernetAddress;
use std::net::Ipv4Addr;

pub const OPCODE_REQUEST: u16 = 1;
pub const OPCODE_REPLY: u16 = 2;

const HW_TYPE_ETHERNET: u16 = 1;
const PROTO_TYPE_IPV4: u16 = 0x0800;
const HW_LEN: u8 = 6;
const PROTO_LEN: u8 = 4;

pub const ARP_MESSAGE_LEN: usize = 28;

/// An ARP message for IPv4 over Ethernet.
///
/// The hardware/protocol type and length fields are fixed; only the opcode
/// and the two (Ethernet, IPv4) address pairs vary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpMessage {
    pub opcode: u16,
    pub sender_eth: EthernetAddress,
    pub sender_ip: Ipv4Addr,
    pub target_eth: EthernetAddress,
    pub target_ip: Ipv4Addr,
}

impl ArpMessage {
    /// A broadcast request asking who holds `target_ip`.
    pub fn request(
        sender_eth: EthernetAddress,
        sender_ip: Ipv4Addr,
        target_ip: Ipv4Addr,
    ) -> Self {
        ArpMessage {
            opcode: OPCODE_REQUEST,
            sender_eth,
            sender_ip,
            target_eth: EthernetAddress::ZERO, // Unknown; that's the question
            target_ip,
        }
    }

    /// A reply telling `target` that `sender_ip` is at `sender_eth`.
    pub fn reply(
        sender_eth: EthernetAddress,
        sender_ip: Ipv4Addr,
        target_eth: EthernetAddress,
        target_ip: Ipv4Addr,
    ) -> Self {
        ArpMessage {
            opcode: OPCODE_REPLY,
            sender_eth,
            sender_ip,
            target_eth,
            target_ip,
        }
    }

    pub fn is_request(&self) -> bool {
        self.opcode == OPCODE_REQUEST
    }

    pub fn is_reply(&self) -> bool {
        self.opcode == OPCODE_REPLY
    }

    /// Serialize an `ArpMessage` into its fixed 28-byte body.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ARP_MESSAGE_LEN];
        buf[0..2].copy_from_slice(&HW_TYPE_ETHERNET.to_be_bytes());
        buf[2..4].copy_from_slice(&PROTO_TYPE_IPV4.to_be_bytes());
        buf[4] = HW_LEN;
        buf[5] = PROTO_LEN;
        buf[6..8].copy_from_slice(&self.opcode.to_be_bytes());
        buf[8..14].copy_from_slice(&self.sender_eth.0);
        buf[14..18].copy_from_slice(&self.sender_ip.octets());
        buf[18..24].copy_from_slice(&self.target_eth.0);
        buf[24..28].copy_from_slice(&self.target_ip.octets());
        buf
    }

    /// Parse a byte array into an `ArpMessage`.
    pub fn parse(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < ARP_MESSAGE_LEN {
            return Err(WireError::BufferTooSmall {
                expected: ARP_MESSAGE_LEN,
                found: buf.len(),
            });
        }

        let hw_type = u16::from_be_bytes([buf[0], buf[1]]);
        let proto_type = u16::from_be_bytes([buf[2], buf[3]]);
        if hw_type != HW_TYPE_ETHERNET || buf[4] != HW_LEN {
            return Err(WireError::Unsupported(format!("ARP hardware type {hw_type}")));
        }
        if proto_type != PROTO_TYPE_IPV4 || buf[5] != PROTO_LEN {
            return Err(WireError::Unsupported(format!(
                "ARP protocol type {proto_type:#06x}"
            )));
        }

        let opcode = u16::from_be_bytes([buf[6], buf[7]]);
        let mut sender_eth = [0u8; 6];
        let mut target_eth = [0u8; 6];
        sender_eth.copy_from_slice(&buf[8..14]);
        target_eth.copy_from_slice(&buf[18..24]);
        let sender_ip = Ipv4Addr::new(buf[14], buf[15], buf[16], buf[17]);
        let target_ip = Ipv4Addr::new(buf[24], buf[25], buf[26], buf[27]);

        Ok(ArpMessage {
            opcode,
            sender_eth: EthernetAddress(sender_eth),
            sender_ip,
            target_eth: EthernetAddress(target_eth),
            target_ip,
        })
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;

    const ETH_A: EthernetAddress = EthernetAddress([0x02, 0x00, 0x00, 0x00, 0x00, 0x0a]);
    const ETH_B: EthernetAddress = EthernetAddress([0x02, 0x00, 0x00, 0x00, 0x00, 0x0b]);

    #[test]
    fn test_request_round_trip() {
        let req = ArpMessage::request(
            ETH_A,
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
        );
        assert!(req.is_request());

        let bytes = req.serialize();
        assert_eq!(bytes.len(), ARP_MESSAGE_LEN);
        // Fixed preamble: ethernet/ipv4, 6-byte and 4-byte addresses, opcode 1
        assert_eq!(&bytes[..8], &[0, 1, 8, 0, 6, 4, 0, 1]);
        // Target hardware address is zeroed in a request
        assert_eq!(&bytes[18..24], &[0u8; 6]);

        assert_eq!(ArpMessage::parse(&bytes).unwrap(), req);
    }

    #[test]
    fn test_reply_round_trip() {
        let reply = ArpMessage::reply(
            ETH_B,
            Ipv4Addr::new(10, 0, 0, 2),
            ETH_A,
            Ipv4Addr::new(10, 0, 0, 1),
        );
        assert!(reply.is_reply());

        let parsed = ArpMessage::parse(&reply.serialize()).unwrap();
        assert_eq!(parsed, reply);
        assert_eq!(parsed.sender_eth, ETH_B);
        assert_eq!(parsed.target_eth, ETH_A);
    }

    #[test]
    fn test_parse_rejects_foreign_types() {
        let mut bytes = ArpMessage::request(
            ETH_A,
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
        )
        .serialize();

        bytes[1] = 6; // Some non-Ethernet hardware type
        assert!(matches!(
            ArpMessage::parse(&bytes),
            Err(WireError::Unsupported(_))
        ));
    }

    #[test]
    fn test_parse_short_buffer() {
        let err = ArpMessage::parse(&[0u8; 27]).unwrap_err();
        assert_eq!(
            err,
            WireError::BufferTooSmall {
                expected: 28,
                found: 27
            }
        );
    }
}
