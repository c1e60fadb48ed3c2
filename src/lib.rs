//! Octal-tree mesh networking core for 2.4 GHz packet radios (nRF24L01+ class).
//!
//! This crate implements addressed unicast, multicast, routed delivery with
//! end-to-end acknowledgement, and payload fragmentation above a fixed-size
//! radio frame. It owns no hardware: callers supply a [`radio::Radio`]
//! capability and a [`time::Clock`], and drive the receive side by calling
//! [`network::Network::poll`] whenever the radio has data pending.
//!
//! Scheduling is single-threaded and cooperative: every state transition
//! happens synchronously inside a call to `poll`, `read`, or `write`.

#![no_std]

#[cfg(test)]
extern crate std;

mod diag;

pub mod address;
pub mod error;
pub mod frame;
pub mod network;
pub mod queue;
pub mod radio;
pub mod reassembly;
pub mod routing;
pub mod time;

pub use diag::{Logger, NoopLogger};
pub use error::Error;
pub use frame::{Frame, Header};
pub use network::Network;
pub use radio::Radio;
pub use time::Clock;
