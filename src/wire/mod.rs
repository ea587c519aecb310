pub mod arp;
pub mod errors;
pub mod ethernet;
pub mod ip_flags;
pub mod ipv4;

// -- Re-export structs for more concise usage

pub use arp::ArpMessage;
pub use errors::WireError;
pub use ethernet::{EthernetAddress, EthernetFrame, EthernetHeader, ETHERNET_BROADCAST};
pub use ip_flags::IpFlags;
pub use ipv4::{InternetDatagram, Ipv4Header};
