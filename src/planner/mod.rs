//! Qualifier and sort-key model supplied by the host query runtime

mod ast;
mod errors;

pub use ast::{Operator, Qualifier, SortDirection, SortKey};
pub use errors::{PlanError, PlanResult};
