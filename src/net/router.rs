use crate::net::interface::NetworkInterface;
use std::cell::RefCell;
use std::net::Ipv4Addr;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Route {
    prefix: u32, // Canonicalized: prefix & mask
    prefix_len: u8,
    mask: u32,
    next_hop: Option<Ipv4Addr>, // None when the network is directly attached
    iface: usize,
}

/// A router forwarding IP datagrams between network interfaces by
/// longest-prefix match.
#[derive(Default)]
pub struct Router {
    interfaces: Vec<Rc<RefCell<NetworkInterface>>>,
    routes: Vec<Route>, // Most specific first; insertion order within a length
}

impl Router {
    pub fn new() -> Self {
        Router {
            interfaces: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Register an interface; returns its index for use in `add_route`.
    pub fn add_interface(&mut self, interface: Rc<RefCell<NetworkInterface>>) -> usize {
        self.interfaces.push(interface);
        self.interfaces.len() - 1
    }

    /// Access an interface by index.
    pub fn interface(&self, n: usize) -> Rc<RefCell<NetworkInterface>> {
        self.interfaces[n].clone()
    }

    /// Add a forwarding rule: datagrams whose destination matches the top
    /// `prefix_len` bits of `route_prefix` leave through interface
    /// `interface_num`, toward `next_hop` (or straight to the destination
    /// when the network is directly attached).
    pub fn add_route(
        &mut self,
        route_prefix: u32,
        prefix_len: u8,
        next_hop: Option<Ipv4Addr>,
        interface_num: usize,
    ) {
        assert!(prefix_len <= 32, "prefix length {prefix_len} out of range");
        let mask = if prefix_len == 0 {
            0
        } else {
            !0u32 << (32 - prefix_len)
        };
        let route = Route {
            prefix: route_prefix & mask,
            prefix_len,
            mask,
            next_hop,
            iface: interface_num,
        };
        debug!(
            prefix = %Ipv4Addr::from(route.prefix),
            prefix_len,
            next_hop = ?next_hop,
            interface = interface_num,
            "adding route"
        );

        // Keep the table sorted most-specific-first; appending after equal
        // lengths makes the tie-break deterministic
        let at = self.routes.partition_point(|r| r.prefix_len >= prefix_len);
        self.routes.insert(at, route);
    }

    /// Drain every interface's inbound queue, forwarding each datagram to
    /// its proper outgoing interface.
    pub fn route(&mut self) {
        for interface in &self.interfaces {
            let inbound = std::mem::take(interface.borrow_mut().datagrams_received());
            for mut dgram in inbound {
                let dst = dgram.header.dst_ip;
                let matched = self.routes.iter().find(|r| u32::from(dst) & r.mask == r.prefix);
                let Some(route) = matched else {
                    debug!(%dst, "no route; dropping datagram");
                    continue;
                };
                if dgram.header.ttl <= 1 {
                    debug!(%dst, "TTL expired; dropping datagram");
                    continue;
                }

                dgram.header.ttl -= 1;
                dgram.header.fill_checksum();
                let next_hop = route.next_hop.unwrap_or(dst);
                self.interfaces[route.iface]
                    .borrow_mut()
                    .send_datagram(&dgram, next_hop);
            }
        }
    }
}

// -- Unit tests --
