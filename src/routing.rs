//! Pure routing decisions: classifying inbound frames and choosing the
//! next hop for outbound ones. Holds no state of its own; `Network` owns
//! the address tables and calls into these functions.

use crate::address;
use crate::frame::{Header, MULTICAST_ADDRESS, NETWORK_ACK};

/// Route a routed unicast payload toward its destination.
pub const DIRECT_TO_ROUTE: u8 = 0;
/// We are forwarding someone else's payload (candidate for end-to-end ack synthesis).
pub const DIRECT_TO_FORWARD: u8 = 1;
/// Send straight to an explicitly named node, bypassing tree routing.
pub const DIRECT_TO_NODE: u8 = 2;
/// Like `DIRECT_TO_NODE` but via a direct pipe-address override.
pub const DIRECT_TO_NODE_VIA_OVERRIDE: u8 = 3;
/// Multicast dispatch.
pub const DIRECT_TO_MULTICAST: u8 = 4;

/// Disposition of a frame the radio just delivered to us.
pub enum Inbound {
    /// An end-to-end ack addressed to us; do not enqueue.
    NetworkAck,
    /// Ordinary unicast payload addressed to us.
    ForMe,
    /// Multicast payload; `is_duplicate` is true if we've already seen this `(from, id)`.
    Multicast { is_duplicate: bool },
    /// Payload addressed elsewhere; we should forward it.
    Forward,
}

/// Classify an inbound frame given our own address and the last multicast id seen.
pub fn classify_inbound(self_address: u16, last_multicast_id: u16, header: &Header) -> Inbound {
    if header.to_node() == self_address {
        if header.frame_type() == NETWORK_ACK {
            Inbound::NetworkAck
        } else {
            Inbound::ForMe
        }
    } else if header.to_node() == MULTICAST_ADDRESS {
        Inbound::Multicast {
            is_duplicate: header.id() == last_multicast_id,
        }
    } else {
        Inbound::Forward
    }
}

/// Next-hop decision for an outbound (or forwarded) frame.
pub struct NextHop {
    pub node: u16,
    pub pipe: u8,
    pub no_ack: bool,
}

/// Choose the next hop for `to_node` given our own tree position and the
/// routing mode `direct_to`.
pub fn next_hop(mask: u16, self_address: u16, parent: u16, parent_pipe: u8, to_node: u16, direct_to: u8) -> NextHop {
    if direct_to > DIRECT_TO_FORWARD {
        let pipe = if direct_to == DIRECT_TO_MULTICAST { 0 } else { parent_pipe % 5 };
        return NextHop {
            node: to_node,
            pipe,
            no_ack: true,
        };
    }

    if address::is_direct_child(mask, self_address, to_node) {
        NextHop {
            node: to_node,
            pipe: 5,
            no_ack: false,
        }
    } else if address::is_descendant(mask, self_address, to_node) {
        NextHop {
            node: address::direct_child_route_to(mask, to_node),
            pipe: 5,
            no_ack: false,
        }
    } else {
        NextHop {
            node: parent,
            pipe: parent_pipe % 5,
            no_ack: false,
        }
    }
}

/// True if, having just forwarded a routed payload to `send_node`, this node
/// should synthesize an end-to-end `NETWORK_ACK` back to the original sender.
///
/// This fires only at the penultimate relay: the destination is a direct
/// neighbor of ours, the payload we forwarded wasn't itself an ack, and we
/// aren't the original source.
pub fn should_synthesize_ack(direct_to: u8, send_node: u16, header: &Header, self_address: u16) -> bool {
    direct_to == DIRECT_TO_FORWARD
        && send_node == header.to_node()
        && header.frame_type() != NETWORK_ACK
        && header.from_node() != self_address
}
