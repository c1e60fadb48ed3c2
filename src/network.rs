//! The public `Network` type: address bring-up, the receive-side loop
//! driver, and the send path (including fragmentation and end-to-end ack).

use crate::address;
use crate::diag::{net_trace, Logger, NoopLogger};
use crate::frame::{self, Frame, Header};
use crate::queue::ReceiveQueue;
use crate::radio::{self, Radio};
use crate::reassembly::ReassemblyCache;
use crate::routing;

/// Default number of concurrent in-flight fragmented messages tracked.
pub const DEFAULT_REASSEMBLY_SLOTS: usize = 4;
/// Default receive-queue depth.
pub const DEFAULT_QUEUE_DEPTH: usize = 3;

/// A mesh network endpoint bound to a logical address.
///
/// `REASSEMBLY_SLOTS` bounds the number of distinct sources with an
/// in-flight fragmented message; `QUEUE_DEPTH` bounds the receive queue.
/// Both default to values comfortably above what this tree topology needs.
pub struct Network<
    R,
    C,
    L = NoopLogger,
    const REASSEMBLY_SLOTS: usize = DEFAULT_REASSEMBLY_SLOTS,
    const QUEUE_DEPTH: usize = DEFAULT_QUEUE_DEPTH,
> {
    radio: R,
    clock: C,
    logger: L,
    address: u16,
    mask: u16,
    parent: u16,
    parent_pipe: u8,
    multicast_level: u8,
    multicast_relay: bool,
    last_multicast_id: u16,
    next_id: u16,
    n_ok: u32,
    n_fails: u32,
    reassembly: ReassemblyCache<REASSEMBLY_SLOTS>,
    queue: ReceiveQueue<QUEUE_DEPTH>,
}

impl<R, C, L, const REASSEMBLY_SLOTS: usize, const QUEUE_DEPTH: usize>
    Network<R, C, L, REASSEMBLY_SLOTS, QUEUE_DEPTH>
where
    R: Radio,
    C: crate::time::Clock,
    L: Logger,
{
    /// Build a `Network`. Call `begin` before sending or receiving anything.
    pub fn new(radio: R, clock: C, logger: L) -> Self {
        Network {
            radio,
            clock,
            logger,
            address: address::ROOT,
            mask: 0,
            parent: address::NO_PARENT,
            parent_pipe: 0,
            multicast_level: 0,
            multicast_relay: false,
            last_multicast_id: 0,
            next_id: 1,
            n_ok: 0,
            n_fails: 0,
            reassembly: ReassemblyCache::new(),
            queue: ReceiveQueue::new(),
        }
    }

    /// Configure the radio and address tables for `address` on `channel`.
    /// Returns `false` if `address` is not a well-formed tree address.
    pub fn begin(&mut self, channel: u8, address: u16) -> bool {
        if !address::is_valid_address(address) {
            return false;
        }
        self.address = address;
        self.mask = address::node_mask(address);
        self.parent = if address == address::ROOT {
            address::NO_PARENT
        } else {
            address::parent(address, self.mask)
        };
        self.parent_pipe = address::parent_pipe(address, self.mask);
        self.multicast_level = address::depth(address);

        self.radio.set_channel(channel);
        self.radio.set_data_rate_1mbps();
        self.radio.set_crc16();
        self.radio.enable_dynamic_payloads();
        self.radio.enable_dynamic_ack();
        self.radio
            .set_retries(radio::retry_delay_for(address), radio::RETRY_COUNT);

        for pipe in 0u8..6 {
            let pipe_addr = address::pipe_address(address, pipe);
            self.radio.open_reading_pipe(pipe, pipe_addr);
        }
        self.radio.start_listening();
        true
    }

    /// This node's parent address, or `address::NO_PARENT` at the root.
    pub fn parent(&self) -> u16 {
        self.parent
    }

    /// Enable or disable automatic multicast rebroadcast toward the next tree level.
    pub fn set_multicast_relay(&mut self, enabled: bool) {
        self.multicast_relay = enabled;
    }

    /// Re-open pipe 0 for multicast listening at the given tree level.
    pub fn set_multicast_level(&mut self, level: u8) {
        self.multicast_level = level;
        let pipe_addr = address::pipe_address(self.address, 0);
        self.radio.open_reading_pipe(0, pipe_addr);
    }

    /// `(failures, successes)` counters accumulated by `write`/`write_direct`/`multicast`.
    pub fn failures(&self) -> (u32, u32) {
        (self.n_fails, self.n_ok)
    }

    /// True if a fully assembled frame is waiting to be `read`.
    pub fn available(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Copy the header of the head-of-queue frame without dequeuing it.
    pub fn peek(&self, header: &mut Header) -> bool {
        match self.queue.front() {
            Some(frame) => {
                *header = frame.header;
                true
            }
            None => false,
        }
    }

    /// Dequeue the head-of-queue frame, copying its header and up to
    /// `buf.len()` payload bytes. Returns the number of payload bytes copied.
    pub fn read(&mut self, header: &mut Header, buf: &mut [u8]) -> usize {
        match self.queue.pop() {
            Some(frame) => {
                *header = frame.header;
                let n = core::cmp::min(buf.len(), frame.payload.len());
                buf[..n].copy_from_slice(&frame.payload[..n]);
                n
            }
            None => 0,
        }
    }

    /// Drain everything currently buffered by the radio, routing or
    /// delivering each frame. Returns `NETWORK_ACK` if an end-to-end ack for
    /// us was observed during the drain, else `0`. Never blocks.
    pub fn poll(&mut self) -> u8 {
        let mut observed_ack = 0u8;
        while self.radio.available().is_some() {
            let mut buf = [0u8; frame::MAX_FRAME_SIZE];
            let n = self.radio.read(&mut buf);
            if n < frame::HEADER_SIZE {
                continue;
            }
            let header = match frame::decode_header(&buf[..n]) {
                Ok(h) => h,
                Err(_) => {
                    net_trace!(self.logger, "dropping malformed frame");
                    continue;
                }
            };
            let payload = &buf[frame::HEADER_SIZE..n];
            if self.dispatch(&header, payload) {
                observed_ack = frame::NETWORK_ACK;
            }
        }
        observed_ack
    }

    fn dispatch(&mut self, header: &Header, payload: &[u8]) -> bool {
        match routing::classify_inbound(self.address, self.last_multicast_id, header) {
            routing::Inbound::NetworkAck => true,
            routing::Inbound::ForMe => {
                self.enqueue(header, payload);
                false
            }
            routing::Inbound::Multicast { is_duplicate } => {
                if !is_duplicate {
                    self.last_multicast_id = header.id();
                    self.enqueue(header, payload);
                    if self.multicast_relay {
                        let next_level = address::level_to_address(self.multicast_level + 1);
                        self.send_frame(header, payload, next_level, routing::DIRECT_TO_MULTICAST);
                    }
                }
                false
            }
            routing::Inbound::Forward => {
                let hop = routing::next_hop(
                    self.mask,
                    self.address,
                    self.parent,
                    self.parent_pipe,
                    header.to_node(),
                    routing::DIRECT_TO_FORWARD,
                );
                let forwarded = self.send_frame(header, payload, header.to_node(), routing::DIRECT_TO_FORWARD);
                if forwarded && routing::should_synthesize_ack(routing::DIRECT_TO_FORWARD, hop.node, header, self.address)
                {
                    let original_from = header.from_node();
                    let mut ack = *header;
                    ack.set_to_node(original_from);
                    ack.set_from_node(self.address);
                    ack.set_frame_type(frame::NETWORK_ACK);
                    self.send_frame(&ack, &[], original_from, routing::DIRECT_TO_FORWARD);
                }
                false
            }
        }
    }

    fn enqueue(&mut self, header: &Header, payload: &[u8]) {
        if header.is_fragment() {
            match self.reassembly.append(header, payload) {
                Ok(Some(frame)) => {
                    let _ = self.queue.push(frame);
                }
                Ok(None) => {}
                Err(_) => net_trace!(self.logger, "fragment reassembly overflow, dropping message"),
            }
        } else {
            let mut frame = Frame::new(*header);
            let _ = frame.payload.extend_from_slice(payload);
            let _ = self.queue.push(frame);
        }
    }

    /// Route `header`/`payload` toward `to_node` under routing mode `direct_to`,
    /// blocking for an end-to-end ack when the route calls for one.
    fn send_frame(&mut self, header: &Header, payload: &[u8], to_node: u16, direct_to: u8) -> bool {
        let hop = routing::next_hop(self.mask, self.address, self.parent, self.parent_pipe, to_node, direct_to);
        let sent = self.write_to_pipe(header, payload, hop.node, hop.pipe, hop.no_ack);
        if !sent {
            self.n_fails += 1;
            net_trace!(self.logger, "mac send failed");
            return false;
        }

        let needs_ack = matches!(direct_to, routing::DIRECT_TO_ROUTE | routing::DIRECT_TO_NODE_VIA_OVERRIDE)
            && hop.node != header.to_node();
        if !needs_ack {
            self.n_ok += 1;
            return true;
        }

        let deadline = self.clock.millis().wrapping_add(radio::ROUTE_TIMEOUT_MS);
        loop {
            if self.poll() == frame::NETWORK_ACK {
                self.n_ok += 1;
                return true;
            }
            if self.clock.millis().wrapping_sub(deadline) < (u32::MAX / 2) {
                self.n_fails += 1;
                net_trace!(self.logger, "route timeout waiting for network ack");
                return false;
            }
        }
    }

    /// Send one (already fragment-sized) frame, short-circuiting to local
    /// delivery when it's addressed to ourselves.
    fn send_one(&mut self, header: &Header, payload: &[u8], route_node: u16, direct_to: u8) -> bool {
        if header.to_node() == self.address {
            self.enqueue(header, payload);
            true
        } else {
            self.send_frame(header, payload, route_node, direct_to)
        }
    }

    fn write_to_pipe(&mut self, header: &Header, payload: &[u8], to_node: u16, pipe: u8, no_ack: bool) -> bool {
        let pipe_addr = address::pipe_address(to_node, pipe);
        self.radio.stop_listening();
        self.radio.open_writing_pipe(pipe_addr);
        let mut buf = [0u8; frame::MAX_FRAME_SIZE];
        let n = frame::encode(header, payload, &mut buf);
        let queued = self.radio.write_fast(&buf[..n], no_ack);
        let ok = queued && self.radio.tx_standby(radio::TX_TIMEOUT_MS);
        self.radio.start_listening();
        ok
    }

    /// Send `payload` to `header.to_node()` using normal tree routing.
    pub fn write(&mut self, header: &mut Header, payload: &[u8]) -> bool {
        self.write_direct(header, payload, frame::NO_DIRECT_OVERRIDE)
    }

    /// Send `payload` to `header.to_node()`, optionally overriding the next
    /// hop with an explicit node address (`frame::NO_DIRECT_OVERRIDE` for
    /// normal routing).
    pub fn write_direct(&mut self, header: &mut Header, payload: &[u8], write_direct: u16) -> bool {
        if payload.len() > frame::MAX_PAYLOAD_SIZE {
            net_trace!(self.logger, "payload exceeds MAX_PAYLOAD_SIZE, rejecting write");
            return false;
        }

        header.set_from_node(self.address);
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        header.set_id(id);

        let to_node = header.to_node();
        let (direct_to, route_node) = if write_direct == frame::NO_DIRECT_OVERRIDE {
            (routing::DIRECT_TO_ROUTE, to_node)
        } else if write_direct == to_node {
            (routing::DIRECT_TO_NODE, write_direct)
        } else {
            (routing::DIRECT_TO_NODE_VIA_OVERRIDE, write_direct)
        };

        if payload.len() <= frame::MAX_FRAME_PAYLOAD {
            return self.send_one(header, payload, route_node, direct_to);
        }

        let total = payload.len();
        let fragment_count = (total + frame::MAX_FRAME_PAYLOAD - 1) / frame::MAX_FRAME_PAYLOAD;
        let mut ordinal = fragment_count;
        let mut offset = 0usize;
        let mut all_ok = true;
        while ordinal >= 1 {
            let end = core::cmp::min(offset + frame::MAX_FRAME_PAYLOAD, total);
            let mut frag = *header;
            frag.set_fragment_id(ordinal as u8);
            frag.set_frame_type(if ordinal == 1 {
                frame::NETWORK_LAST_FRAGMENT
            } else {
                frame::NETWORK_MORE_FRAGMENTS
            });
            if !self.send_one(&frag, &payload[offset..end], route_node, direct_to) {
                all_ok = false;
                break;
            }
            offset = end;
            ordinal -= 1;
        }

        // Matches the original unconditionally, win or lose, to give
        // downstream relays time to drain before the next send.
        let delay = core::cmp::min((total / 16) as u32, 15);
        self.clock.delay_ms(delay);
        all_ok
    }

    /// Broadcast `payload` to every node at tree `level`.
    pub fn multicast(&mut self, header: &mut Header, payload: &[u8], level: u8) -> bool {
        if payload.len() > frame::MAX_FRAME_PAYLOAD {
            net_trace!(self.logger, "multicast payload too large for a single frame");
            return false;
        }
        header.set_from_node(self.address);
        header.set_to_node(frame::MULTICAST_ADDRESS);
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        header.set_id(id);
        let target = address::level_to_address(level);
        self.send_frame(header, payload, target, routing::DIRECT_TO_MULTICAST)
    }
}
