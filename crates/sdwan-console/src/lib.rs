//! SD-WAN demo console library.
//!
//! Re-exports the sequencer, session, controller client, and HTTP router so
//! they can be used by integration tests and the `sdwan-console` binary.

pub mod api;
pub mod client;
pub mod config;
pub mod display;
pub mod sequencer;
pub mod session;
pub mod telemetry;

pub mod test_util;
