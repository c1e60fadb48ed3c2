//! Fragment reassembly cache.
//!
//! Keyed by `(from_node, id)`, with the invariant that at most one entry per
//! source address exists at a time: starting a new fragmented message from a
//! source evicts any other in-flight entry from that same source, regardless
//! of its `id`.

use crate::error::Error;
use crate::frame::{Frame, Header, MAX_PAYLOAD_SIZE};

struct Entry {
    header: Header,
    payload: heapless::Vec<u8, MAX_PAYLOAD_SIZE>,
}

/// Fixed-capacity cache of in-flight fragmented messages, one per source.
pub struct ReassemblyCache<const SLOTS: usize> {
    entries: heapless::Vec<Entry, SLOTS>,
}

impl<const SLOTS: usize> ReassemblyCache<SLOTS> {
    pub const fn new() -> Self {
        ReassemblyCache {
            entries: heapless::Vec::new(),
        }
    }

    fn index_of(&self, from: u16, id: u16) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.header.from_node() == from && e.header.id() == id)
    }

    fn index_of_source(&self, from: u16) -> Option<usize> {
        self.entries.iter().position(|e| e.header.from_node() == from)
    }

    /// Feed one fragment into the cache. Returns `Ok(Some(frame))` once the
    /// final fragment completes a message, `Ok(None)` if more fragments are
    /// still expected, or `Err` if this fragment caused the in-flight
    /// message to overflow (the partial entry is dropped in that case).
    pub fn append(&mut self, header: &Header, payload: &[u8]) -> Result<Option<Frame>, Error> {
        let from = header.from_node();
        let id = header.id();
        let is_last = header.frame_type() == crate::frame::NETWORK_LAST_FRAGMENT;

        let idx = match self.index_of(from, id) {
            Some(i) => i,
            None => {
                if let Some(stale) = self.index_of_source(from) {
                    self.entries.swap_remove(stale);
                }
                if self.entries.is_full() {
                    self.entries.swap_remove(0);
                }
                let entry = Entry {
                    header: *header,
                    payload: heapless::Vec::new(),
                };
                // `is_full` check above guarantees room.
                let _ = self.entries.push(entry);
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[idx];
        entry.header = *header;
        if entry.payload.extend_from_slice(payload).is_err() {
            self.entries.swap_remove(idx);
            return Err(Error::FragmentOverflow);
        }

        if is_last {
            let entry = self.entries.swap_remove(idx);
            let mut frame = Frame::new(entry.header);
            frame.payload = entry.payload;
            Ok(Some(frame))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use crate::frame::{NETWORK_LAST_FRAGMENT, NETWORK_MORE_FRAGMENTS};

    fn frag_header(from: u16, id: u16, fragment_id: u8, last: bool) -> Header {
        let mut h = Header::new(0o1, id, if last {
            NETWORK_LAST_FRAGMENT
        } else {
            NETWORK_MORE_FRAGMENTS
        });
        h.set_from_node(from);
        h.set_fragment_id(fragment_id);
        h
    }

    #[test]
    fn reassembles_in_order_fragments() {
        let mut cache: ReassemblyCache<4> = ReassemblyCache::new();
        assert!(cache.append(&frag_header(0o11, 1, 2, false), b"hel").unwrap().is_none());
        let frame = cache
            .append(&frag_header(0o11, 1, 1, true), b"lo")
            .unwrap()
            .unwrap();
        assert_eq!(&frame.payload[..], b"hello");
    }

    #[test]
    fn new_message_from_same_source_evicts_stale_entry() {
        let mut cache: ReassemblyCache<4> = ReassemblyCache::new();
        assert!(cache.append(&frag_header(0o11, 1, 2, false), b"ab").unwrap().is_none());
        // A fresh message (different id) from the same source preempts the old one.
        assert!(cache.append(&frag_header(0o11, 2, 2, false), b"cd").unwrap().is_none());
        let frame = cache
            .append(&frag_header(0o11, 2, 1, true), b"ef")
            .unwrap()
            .unwrap();
        assert_eq!(&frame.payload[..], b"cdef");
    }

    #[test]
    fn overflow_drops_entry() {
        let mut cache: ReassemblyCache<4> = ReassemblyCache::new();
        let big = [0u8; crate::frame::MAX_PAYLOAD_SIZE];
        assert!(cache.append(&frag_header(0o11, 1, 255, false), &big).unwrap().is_none());
        let err = cache.append(&frag_header(0o11, 1, 254, false), &big);
        assert_eq!(err, Err(Error::FragmentOverflow));
        assert!(cache.index_of(0o11, 1).is_none());
    }
}
