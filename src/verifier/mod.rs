//! Row verification and local sort fallback

mod filter;
mod sorter;

pub use filter::RowVerifier;
pub use sorter::RowSorter;
