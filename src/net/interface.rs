use crate::wire::arp::ArpMessage;
use crate::wire::ethernet::{
    EthernetAddress, EthernetFrame, EthernetHeader, ETHERNET_BROADCAST, ETHERTYPE_ARP,
    ETHERTYPE_IPV4,
};
use crate::wire::ipv4::InternetDatagram;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::rc::Rc;
use tracing::debug;

/// ARP cache entries expire after this long.
const ARP_ENTRY_TTL_MS: u64 = 30_000;
/// An unanswered ARP request times out after this long, taking the
/// datagrams queued behind it down with it.
const ARP_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// The physical output port where an interface sends Ethernet frames.
///
/// Implementers decide what "physical" means: a tap device, a pcap writer,
/// a loopback queue in tests. The interface never looks past this call.
pub trait OutputPort {
    fn transmit(&mut self, frame: &EthernetFrame);
}

#[derive(Debug)]
struct ArpEntry {
    eth: EthernetAddress,
    age_ms: u64,
}

/// A network interface connecting IP to Ethernet.
///
/// Outbound datagrams are wrapped in Ethernet frames once the next hop's
/// hardware address is known, resolving it over ARP when it isn't; inbound
/// frames are filtered by destination, parsed, and either queued upward
/// (IPv4) or fed to the ARP state machine.
pub struct NetworkInterface {
    name: String,
    port: Rc<RefCell<dyn OutputPort>>,
    ethernet_address: EthernetAddress,
    ip_address: Ipv4Addr,
    datagrams_received: VecDeque<InternetDatagram>,
    arp_cache: HashMap<u32, ArpEntry>,
    pending: HashMap<u32, Vec<InternetDatagram>>, // Awaiting ARP, FIFO per next hop
    requests_in_flight: HashMap<u32, u64>,        // Outstanding ARP requests, by age
}

impl NetworkInterface {
    /// New interface with the given hardware and IP addresses, transmitting
    /// through `port`.
    pub fn new(
        name: impl Into<String>,
        port: Rc<RefCell<dyn OutputPort>>,
        ethernet_address: EthernetAddress,
        ip_address: Ipv4Addr,
    ) -> Self {
        let name = name.into();
        debug!(%name, eth = %ethernet_address, ip = %ip_address, "network interface up");
        NetworkInterface {
            name,
            port,
            ethernet_address,
            ip_address,
            datagrams_received: VecDeque::new(),
            arp_cache: HashMap::new(),
            pending: HashMap::new(),
            requests_in_flight: HashMap::new(),
        }
    }

    /// Send `dgram` toward `next_hop`, resolving its hardware address over
    /// ARP first if necessary.
    pub fn send_datagram(&mut self, dgram: &InternetDatagram, next_hop: Ipv4Addr) {
        let key = u32::from(next_hop);

        if let Some(entry) = self.arp_cache.get(&key) {
            let frame = self.make_frame(ETHERTYPE_IPV4, dgram.serialize(), entry.eth);
            self.transmit(&frame);
            return;
        }

        self.pending.entry(key).or_default().push(dgram.clone());
        if !self.requests_in_flight.contains_key(&key) {
            let request = ArpMessage::request(self.ethernet_address, self.ip_address, next_hop);
            let frame = self.make_frame(ETHERTYPE_ARP, request.serialize(), ETHERNET_BROADCAST);
            self.transmit(&frame);
            self.requests_in_flight.insert(key, 0);
        }
    }

    /// Process one inbound Ethernet frame.
    pub fn recv_frame(&mut self, frame: &EthernetFrame) {
        if frame.header.dst != ETHERNET_BROADCAST && frame.header.dst != self.ethernet_address {
            return;
        }

        match frame.header.ethertype {
            ETHERTYPE_IPV4 => {
                // Unparseable datagrams are dropped without comment
                if let Ok(dgram) = InternetDatagram::parse(&frame.payload) {
                    self.datagrams_received.push_back(dgram);
                }
            }
            ETHERTYPE_ARP => {
                let Ok(msg) = ArpMessage::parse(&frame.payload) else {
                    return;
                };
                let sender_key = u32::from(msg.sender_ip);

                // Learn from every ARP message, request or reply alike
                self.arp_cache.insert(
                    sender_key,
                    ArpEntry {
                        eth: msg.sender_eth,
                        age_ms: 0,
                    },
                );

                if msg.is_request() && msg.target_ip == self.ip_address {
                    let reply = ArpMessage::reply(
                        self.ethernet_address,
                        self.ip_address,
                        msg.sender_eth,
                        msg.sender_ip,
                    );
                    let frame = self.make_frame(ETHERTYPE_ARP, reply.serialize(), msg.sender_eth);
                    self.transmit(&frame);
                }

                // The sender is now resolvable; release anything queued on it
                if let Some(queued) = self.pending.remove(&sender_key) {
                    for dgram in &queued {
                        let frame =
                            self.make_frame(ETHERTYPE_IPV4, dgram.serialize(), msg.sender_eth);
                        self.transmit(&frame);
                    }
                }
            }
            _ => {}
        }
    }

    /// Account for `ms` of elapsed time: age out stale ARP cache entries and
    /// give up on unanswered ARP requests.
    pub fn tick(&mut self, ms: u64) {
        self.arp_cache.retain(|_, entry| {
            entry.age_ms += ms;
            entry.age_ms < ARP_ENTRY_TTL_MS
        });

        let pending = &mut self.pending;
        self.requests_in_flight.retain(|key, age_ms| {
            *age_ms += ms;
            if *age_ms >= ARP_REQUEST_TIMEOUT_MS {
                // Resolution failed; the datagrams waiting on it go too
                pending.remove(key);
                false
            } else {
                true
            }
        });
    }

    /// Datagrams parsed off the wire, awaiting the owner (host stack or
    /// router) to drain them.
    pub fn datagrams_received(&mut self) -> &mut VecDeque<InternetDatagram> {
        &mut self.datagrams_received
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ethernet_address(&self) -> EthernetAddress {
        self.ethernet_address
    }

    pub fn ip_address(&self) -> Ipv4Addr {
        self.ip_address
    }

    fn make_frame(&self, ethertype: u16, payload: Vec<u8>, dst: EthernetAddress) -> EthernetFrame {
        EthernetFrame {
            header: EthernetHeader {
                dst,
                src: self.ethernet_address,
                ethertype,
            },
            payload,
        }
    }

    fn transmit(&self, frame: &EthernetFrame) {
        self.port.borrow_mut().transmit(frame);
    }
}

// -- Unit tests --
