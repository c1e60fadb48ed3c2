//! Typed error kinds surfaced by this crate.
//!
//! Receive-side errors are swallowed (dropped frame plus a diagnostic);
//! send-side errors surface as a `bool` from the public API. Nothing in
//! this crate panics on the hot path.

/// Failure reasons produced while encoding, routing, or delivering a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A decoded or requested address has an octal digit outside `0..=5`.
    BadAddress,
    /// Fewer bytes were available than a header requires.
    ShortFrame,
    /// Payload exceeds `MAX_PAYLOAD_SIZE`.
    TooLarge,
    /// Reassembly would exceed `MAX_PAYLOAD_SIZE`; the partial message was dropped.
    FragmentOverflow,
    /// The radio reported a transmit failure after its own hardware retries.
    MacSendFail,
    /// No `NETWORK_ACK` arrived before the route timeout elapsed.
    RouteTimeout,
}
