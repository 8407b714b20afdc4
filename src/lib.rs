//! telequel - query a telemetry data API as tables
//!
//! Two halves:
//! - a qualifier compiler that turns host predicates into upstream request
//!   parameters (with a verifying post-filter, since push-down is
//!   best-effort), and
//! - a streaming decoder for the binary message container the export
//!   endpoint serves, with per-schema payload codecs.

pub mod cli;
pub mod codec;
pub mod compiler;
pub mod config;
pub mod container;
pub mod planner;
pub mod table;
pub mod timefmt;
pub mod transport;
pub mod verifier;
