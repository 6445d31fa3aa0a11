//! External collaborators the control plane depends on but does not
//! implement: the link-layer transmit path. ARP resolution, boot-time
//! interface discovery, and the debug log sink live entirely outside this
//! crate and are not modeled here at all.
//!
//! Mirrors the shape of the teacher firmware's FFI boundary
//! (`Meow_SendIPPacket`), expressed as a trait so the control plane can be
//! driven against a fake in tests instead of real hardware.

use crate::addr::MacAddr;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SendError(pub u8);

/// Transmits a fully-framed IPv4 datagram on a given interface.
pub trait LinkSend {
    /// Send `buf` as a raw IPv4 datagram out of `if_index` to link-layer
    /// destination `dst_mac`. Synchronous; the host does not retry on the
    /// core's behalf, and the core does not retry either -- a dropped send
    /// is recovered by the next periodic advertisement.
    fn send_ip_packet(&mut self, buf: &[u8], if_index: u8, dst_mac: MacAddr) -> Result<(), SendError>;
}
