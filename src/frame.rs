//! Wire frame: an 8-byte header plus up to `MAX_FRAME_PAYLOAD` bytes of payload.

use zerocopy::byteorder::{LittleEndian, U16};
use zerocopy::{AsBytes, FromBytes, Unaligned};

/// Size of the on-air header, in bytes.
pub const HEADER_SIZE: usize = 8;
/// Hard radio payload ceiling (nRF24L01+ dynamic payload limit).
pub const MAX_FRAME_SIZE: usize = 32;
/// Bytes left for payload in a single frame.
pub const MAX_FRAME_PAYLOAD: usize = MAX_FRAME_SIZE - HEADER_SIZE;
/// Largest reassembled payload this crate will build: 255 fragments worth.
pub const MAX_PAYLOAD_SIZE: usize = 255 * MAX_FRAME_PAYLOAD;

/// Synthesized end-to-end acknowledgement.
pub const NETWORK_ACK: u8 = 193;
/// Non-final fragment of a larger message.
pub const NETWORK_MORE_FRAGMENTS: u8 = 148;
/// Final fragment of a larger message (ordinal 1).
pub const NETWORK_LAST_FRAGMENT: u8 = 149;

/// Reserved destination address denoting "every node at a multicast level".
pub const MULTICAST_ADDRESS: u16 = 0o100;

/// Sentinel for `write_direct`'s `write_direct` parameter meaning "no override,
/// route normally".
pub const NO_DIRECT_OVERRIDE: u16 = 0o70;

/// Fixed 8-byte frame header.
///
/// All multi-byte fields are explicit little-endian so the wire layout does
/// not depend on the host's native endianness, and the struct is `Unaligned`
/// so it can be read from/written to an arbitrary byte buffer without
/// padding or alignment concerns.
#[derive(FromBytes, AsBytes, Unaligned, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Header {
    from_node: U16<LittleEndian>,
    to_node: U16<LittleEndian>,
    id: U16<LittleEndian>,
    frame_type: u8,
    fragment_id: u8,
}

impl Header {
    /// Build a header addressed to `to_node`, with the given message `id` and
    /// application `frame_type`. `from_node` defaults to 0 and is filled in
    /// by the send path.
    pub fn new(to_node: u16, id: u16, frame_type: u8) -> Self {
        Header {
            from_node: U16::new(0),
            to_node: U16::new(to_node),
            id: U16::new(id),
            frame_type,
            fragment_id: 0,
        }
    }

    pub fn from_node(&self) -> u16 {
        self.from_node.get()
    }

    pub fn to_node(&self) -> u16 {
        self.to_node.get()
    }

    pub fn id(&self) -> u16 {
        self.id.get()
    }

    pub fn frame_type(&self) -> u8 {
        self.frame_type
    }

    pub fn fragment_id(&self) -> u8 {
        self.fragment_id
    }

    pub fn set_from_node(&mut self, from: u16) {
        self.from_node = U16::new(from);
    }

    pub fn set_to_node(&mut self, to: u16) {
        self.to_node = U16::new(to);
    }

    pub fn set_frame_type(&mut self, frame_type: u8) {
        self.frame_type = frame_type;
    }

    pub fn set_id(&mut self, id: u16) {
        self.id = U16::new(id);
    }

    pub fn set_fragment_id(&mut self, fragment_id: u8) {
        self.fragment_id = fragment_id;
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.frame_type, NETWORK_MORE_FRAGMENTS | NETWORK_LAST_FRAGMENT)
    }
}

impl core::fmt::Debug for Header {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Header")
            .field("from", &self.from_node())
            .field("to", &self.to_node())
            .field("id", &self.id())
            .field("type", &self.frame_type)
            .field("fragment_id", &self.fragment_id)
            .finish()
    }
}

/// A fully assembled frame: header plus owned payload bytes.
pub struct Frame {
    pub header: Header,
    pub payload: heapless::Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    pub fn new(header: Header) -> Self {
        Frame {
            header,
            payload: heapless::Vec::new(),
        }
    }
}

/// Encode `header` and `payload` into `buf`, returning the number of bytes written.
/// `payload` is truncated to `MAX_FRAME_PAYLOAD` if longer.
pub fn encode(header: &Header, payload: &[u8], buf: &mut [u8; MAX_FRAME_SIZE]) -> usize {
    buf[..HEADER_SIZE].copy_from_slice(header.as_bytes());
    let n = core::cmp::min(payload.len(), MAX_FRAME_PAYLOAD);
    buf[HEADER_SIZE..HEADER_SIZE + n].copy_from_slice(&payload[..n]);
    HEADER_SIZE + n
}

/// Decode a header from the front of `bytes`, validating that `to_node` is
/// a well-formed address. The payload is `&bytes[HEADER_SIZE..]`.
pub fn decode_header(bytes: &[u8]) -> Result<Header, crate::error::Error> {
    if bytes.len() < HEADER_SIZE {
        return Err(crate::error::Error::ShortFrame);
    }
    let header = Header::read_from(&bytes[..HEADER_SIZE]).ok_or(crate::error::Error::ShortFrame)?;
    if !crate::address::is_valid_address(header.to_node()) {
        return Err(crate::error::Error::BadAddress);
    }
    Ok(header)
}
