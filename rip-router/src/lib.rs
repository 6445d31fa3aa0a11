//! Core routing engine of a small embedded IPv4 software router that
//! speaks RIPv2 (RFC 2453) on a handful of physical interfaces.
//!
//! This crate owns the longest-prefix-match routing table, the RIP wire
//! codec, IPv4/UDP framing (including the transit-forwarding TTL/checksum
//! fix-up), and the single-threaded control plane that ties them together.
//! It does not drive real hardware: the link-layer driver, ARP resolution,
//! boot-time interface discovery, and a debug log sink are all supplied by
//! the host through the [`external::LinkSend`] trait and the `log` facade.
#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

pub mod addr;
pub mod codec;
pub mod control;
pub mod external;
pub mod framer;
pub mod rip;
pub mod table;

pub use addr::{Ipv4Addr, MacAddr};
pub use control::{InterfaceConfig, Router};
pub use external::{LinkSend, SendError};
pub use table::{RoutingTable, RoutingTableEntry};
