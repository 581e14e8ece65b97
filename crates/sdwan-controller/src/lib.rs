//! SD-WAN traffic controller library.
//!
//! Receives impairment parameters from the demo console and applies them to
//! two network interfaces as a `tbf` rate limiter with a `netem` child
//! qdisc. Re-exports the router and receiver for integration tests and the
//! `sdwan-controller` binary.

pub mod api;
pub mod config;
pub mod receiver;
pub mod request;
pub mod runner;
pub mod tc;

pub mod test_util;
