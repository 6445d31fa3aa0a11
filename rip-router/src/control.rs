//! The RIP control plane: the `Router` value that owns the routing table,
//! the output scratch buffer, and the identification counter, and drives
//! the three entry points the host calls into (`init`, `per_sec`,
//! `receive`).
//!
//! Global mutable state in the original firmware -- the table, the scratch
//! buffer, the identification counter, the interface list -- becomes one
//! explicit value here, threaded through every call instead of living as
//! file-scope statics.

use crate::addr::{Ipv4Addr, MacAddr};
use crate::codec;
use crate::external::LinkSend;
use crate::framer::{self, Identification};
use crate::rip::{self, RipCommand, RipEntry, RipPacket};
use crate::table::{RoutingTable, RoutingTableEntry};

/// Matches `PACKET_MAX_LENGTH` in the original firmware's scratch buffer.
pub const PACKET_MAX_LENGTH: usize = 2048;
/// Board-level bound on the number of interfaces this core can track.
pub const MAX_IFACES: usize = 4;
/// Prefix length installed for each interface's directly-connected route.
const CONNECTED_PREFIX_LEN: u8 = 24;
/// Minimum spacing between full-table broadcasts, in microseconds.
const BROADCAST_INTERVAL_USEC: u64 = 5_000_000;

const RIP_PORT: u16 = rip::RIP_PORT;

#[derive(Copy, Clone, Debug)]
pub struct InterfaceConfig {
    pub addr: Ipv4Addr,
    pub mac: MacAddr,
}

#[derive(Copy, Clone)]
struct Interface {
    addr: Ipv4Addr,
}

/// The RIP routing engine. Owns the routing table and everything an
/// outbound send needs (scratch buffer, identification counter); borrows
/// a [`LinkSend`] for the duration of each entry point rather than storing
/// it, since the link driver lives entirely on the host side.
pub struct Router {
    table: RoutingTable,
    ident: Identification,
    last_broadcast_usec: u64,
    interfaces: [Interface; MAX_IFACES],
    num_interfaces: usize,
    scratch: [u8; PACKET_MAX_LENGTH],
}

impl Router {
    pub fn new() -> Self {
        Self {
            table: RoutingTable::new(),
            ident: Identification::new(),
            last_broadcast_usec: 0,
            interfaces: [Interface { addr: Ipv4Addr::UNSPECIFIED }; MAX_IFACES],
            num_interfaces: 0,
            scratch: [0u8; PACKET_MAX_LENGTH],
        }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Apply or withdraw a route directly; exposed so a management plane
    /// can inject or withdraw static routes outside the RIP exchange.
    pub fn update(&mut self, insert: bool, entry: RoutingTableEntry) -> bool {
        self.table.update(insert, entry)
    }

    /// Bring up every configured interface: install its directly-connected
    /// route, then send one full-table Request out of it.
    pub fn init(&mut self, now_usec: u64, link: &mut dyn LinkSend, interfaces: &[InterfaceConfig]) {
        self.last_broadcast_usec = now_usec;
        self.num_interfaces = 0;
        for cfg in interfaces {
            self.bring_up_interface(link, *cfg);
        }
    }

    /// Bring up a single interface after `init`, for boards that discover
    /// interfaces one at a time rather than all at boot.
    pub fn add_interface(&mut self, link: &mut dyn LinkSend, cfg: InterfaceConfig) {
        self.bring_up_interface(link, cfg);
    }

    fn bring_up_interface(&mut self, link: &mut dyn LinkSend, cfg: InterfaceConfig) {
        if self.num_interfaces >= MAX_IFACES {
            log::warn!("dropping interface, board already has MAX_IFACES");
            return;
        }
        let if_index = self.num_interfaces as u8;
        self.interfaces[self.num_interfaces] = Interface { addr: cfg.addr };
        self.num_interfaces += 1;

        self.table.update(
            true,
            RoutingTableEntry {
                addr: cfg.addr,
                len: CONNECTED_PREFIX_LEN,
                if_index,
                nexthop: Ipv4Addr::UNSPECIFIED,
                metric: 0,
            },
        );

        self.send_request(link, if_index, cfg.addr, Ipv4Addr::RIP2_MULTICAST, MacAddr::RIP2_MULTICAST);
    }

    /// Called roughly once a second; broadcasts the full table on every
    /// interface if at least [`BROADCAST_INTERVAL_USEC`] have elapsed since
    /// the last broadcast.
    pub fn per_sec(&mut self, now_usec: u64, link: &mut dyn LinkSend) {
        if self.last_broadcast_usec + BROADCAST_INTERVAL_USEC > now_usec {
            return;
        }
        log::debug!("broadcast tick at {now_usec}");
        for i in 0..self.num_interfaces {
            let if_index = i as u8;
            let src = self.interfaces[i].addr;
            self.broadcast_table(link, if_index, src, Ipv4Addr::RIP2_MULTICAST, MacAddr::RIP2_MULTICAST);
        }
        self.last_broadcast_usec = now_usec;
    }

    /// Handle one inbound IPv4 datagram.
    pub fn receive(&mut self, datagram: &[u8], src_mac: MacAddr, if_index: u8, link: &mut dyn LinkSend) {
        let header = match framer::validate_ipv4_header(datagram) {
            Ok(h) => h,
            Err(e) => {
                log::debug!("dropping inbound frame, bad IPv4 header: {e:?}");
                return;
            }
        };
        let packet = match rip::disassemble(datagram) {
            Ok(p) => p,
            Err(e) => {
                log::debug!("dropping inbound frame, malformed RIP payload: {e:?}");
                return;
            }
        };

        match packet.command {
            RipCommand::Request => self.handle_request(link, if_index, header.src, src_mac),
            RipCommand::Response => self.handle_response(link, &packet, if_index, header.src, src_mac),
        }
    }

    fn handle_request(&mut self, link: &mut dyn LinkSend, if_index: u8, dst: Ipv4Addr, dst_mac: MacAddr) {
        let src = self.interfaces[if_index as usize].addr;
        self.broadcast_table(link, if_index, src, dst, dst_mac);
    }

    fn handle_response(
        &mut self,
        link: &mut dyn LinkSend,
        packet: &RipPacket,
        if_index: u8,
        dst: Ipv4Addr,
        dst_mac: MacAddr,
    ) {
        let mut poisoned = RipPacket::response();
        for entry in packet.entries() {
            if entry.metric >= 16 {
                continue;
            }
            let record = RoutingTableEntry {
                addr: entry.addr,
                len: codec::mask_to_prefix(entry.mask).unwrap_or(32),
                if_index,
                nexthop: entry.nexthop,
                metric: entry.metric,
            };
            if self.table.update(true, record) {
                poisoned.push(RipEntry {
                    addr: record.addr.masked(record.len),
                    mask: codec::prefix_to_mask(record.len),
                    nexthop: record.nexthop,
                    metric: 16,
                });
            }
        }
        if poisoned.num_entries() > 0 {
            let src = self.interfaces[if_index as usize].addr;
            self.send_response(link, if_index, src, dst, dst_mac, &poisoned);
        }
    }

    fn send_request(&mut self, link: &mut dyn LinkSend, if_index: u8, src: Ipv4Addr, dst: Ipv4Addr, dst_mac: MacAddr) {
        let packet = RipPacket::request();
        self.send_response(link, if_index, src, dst, dst_mac, &packet);
    }

    /// Export the full table on `if_index`, chunked into `RIP_MAX_ENTRY`-sized
    /// Response datagrams, addressed to `dst`/`dst_mac`.
    fn broadcast_table(&mut self, link: &mut dyn LinkSend, if_index: u8, src: Ipv4Addr, dst: Ipv4Addr, dst_mac: MacAddr) {
        let mut cursor = 0;
        while cursor < self.table.len() {
            let chunk = self.build_export_chunk(if_index, &mut cursor);
            self.send_response(link, if_index, src, dst, dst_mac, &chunk);
        }
    }

    fn build_export_chunk(&self, if_index: u8, cursor: &mut usize) -> RipPacket {
        let mut packet = RipPacket::response();
        while !packet.is_full() {
            let Some(&e) = self.table.get(*cursor) else { break };
            let metric = if e.if_index == if_index { 16 } else { (e.metric as u16 + 1).min(16) as u8 };
            packet.push(RipEntry {
                addr: e.addr,
                mask: codec::prefix_to_mask(e.len),
                nexthop: e.nexthop,
                metric,
            });
            *cursor += 1;
        }
        packet
    }

    fn send_response(
        &mut self,
        link: &mut dyn LinkSend,
        if_index: u8,
        src: Ipv4Addr,
        dst: Ipv4Addr,
        dst_mac: MacAddr,
        packet: &RipPacket,
    ) {
        let mut rip_payload = [0u8; 4 + 25 * 20];
        let rip_len = rip::assemble(packet, &mut rip_payload);
        let n = framer::assemble_udp_rip_datagram(
            &mut self.scratch,
            &mut self.ident,
            src,
            dst,
            RIP_PORT,
            RIP_PORT,
            &rip_payload[..rip_len],
        );
        if let Err(e) = link.send_ip_packet(&self.scratch[..n], if_index, dst_mac) {
            log::warn!("send failed on if{if_index}: {e:?}");
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
