//! Qualifier-to-range-query compilation
//!
//! The upstream API has a stricter contract than the host query runtime:
//! mandatory paired time bounds, a single sort key, and a limited filter
//! vocabulary. This module translates arbitrary conjunctive qualifiers into
//! a request the upstream will accept while never promising more than the
//! verifier will re-check.

mod compile;
mod fieldmap;
mod range;

pub use compile::{CompiledRequest, QualifierCompiler};
pub use fieldmap::{FieldMap, IntervalMap, MetadataMap, SelectorRule, WindowRule};
pub use range::{epoch, RangeState};
