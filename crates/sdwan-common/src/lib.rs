//! Shared types for the SD-WAN impairment demo.
//!
//! This crate contains:
//! - **Impairment parameters** — the five-tuple sent from the console to a controller
//! - **Profiles** — parameters bound to a controller endpoint, with validation
//! - **Logging** — the level-filtered [`logging::Logger`] injected into every component
//! - **Config helpers** — shared TOML loading and error type

pub mod config;
pub mod logging;
pub mod params;
pub mod profile;

pub use logging::{LogLevel, LogOutcome, Logger};
pub use params::{ImpairmentParams, LinkPair};
pub use profile::{ImpairmentProfile, Validation};
