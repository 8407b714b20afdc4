//! Per-table push-down capability tables
//!
//! Each table describes its upstream surface as immutable data: which
//! logical columns translate to which upstream parameters, which are
//! sortable, and how the time window is formed. The compiler is generic
//! over this table; resources never subclass anything.

/// How the paired time window is formed for a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRule {
    /// No time window parameters at all
    None,
    /// Pair the bounds when either side is present (missing side synthesized)
    PairIfPresent,
    /// At least one bound is mandatory; the missing side is synthesized
    Required,
    /// Window requirements depend on the selector rule
    Selector,
}

/// Mapping of the interval columns onto the upstream `start`/`end` pair
#[derive(Debug, Clone, Copy)]
pub struct IntervalMap {
    /// Start-like logical column
    pub start_column: &'static str,
    /// End-like logical column
    pub end_column: &'static str,
    /// Upstream parameter receiving the lower bound
    pub start_param: &'static str,
    /// Upstream parameter receiving the upper bound
    pub end_param: &'static str,
    /// Window formation policy
    pub rule: WindowRule,
}

/// Identifying-parameter requirement for tables the upstream refuses to
/// scan unscoped
#[derive(Debug, Clone, Copy)]
pub struct SelectorRule {
    /// Any one of these upstream parameters satisfies the rule by itself
    pub identifiers: &'static [&'static str],
    /// Fallback: one of these plus a time window
    pub scoped: &'static [&'static str],
    /// Whether a partial window may be completed by synthesis in the
    /// scoped branch (otherwise both bounds must be explicit)
    pub synthesize_window: bool,
    /// Guidance surfaced in the MissingRequiredSelector error
    pub message: &'static str,
}

/// Structured-containment mapping onto a token query parameter
#[derive(Debug, Clone, Copy)]
pub struct MetadataMap {
    /// Logical column carrying the structured value
    pub column: &'static str,
    /// Upstream parameter receiving the joined `key:value` tokens
    pub param: &'static str,
}

/// Push-down capability table for one resource
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    /// Table name, used in error context
    pub table: &'static str,
    /// Fixed parameters sent with every request
    pub base_params: &'static [(&'static str, &'static str)],
    /// Equality push-down: logical column -> upstream parameter (last wins)
    pub equality: &'static [(&'static str, &'static str)],
    /// Equality columns whose repeated values accumulate into an array
    pub multi_equality: &'static [(&'static str, &'static str)],
    /// Sort push-down: logical column -> upstream sort field
    pub sortable: &'static [(&'static str, &'static str)],
    /// Interval mapping, if the table is time-windowed
    pub interval: Option<IntervalMap>,
    /// Columns supporting only a pushed lower bound: column -> parameter
    pub lower_only: &'static [(&'static str, &'static str)],
    /// Structured containment mapping, if supported
    pub metadata: Option<MetadataMap>,
    /// Upstream limit parameter, when the endpoint accepts one
    pub limit_param: Option<&'static str>,
    /// Selector requirement, when the upstream refuses unscoped scans
    pub selector: Option<SelectorRule>,
}

impl FieldMap {
    /// Upstream parameter for an equality-pushable column
    pub fn equality_param(&self, column: &str) -> Option<&'static str> {
        lookup(self.equality, column)
    }

    /// Upstream parameter for an array-accumulating equality column
    pub fn multi_equality_param(&self, column: &str) -> Option<&'static str> {
        lookup(self.multi_equality, column)
    }

    /// Upstream sort field for a sortable column
    pub fn sort_param(&self, column: &str) -> Option<&'static str> {
        lookup(self.sortable, column)
    }

    /// Upstream parameter for a lower-bound-only column
    pub fn lower_only_param(&self, column: &str) -> Option<&'static str> {
        lookup(self.lower_only, column)
    }
}

fn lookup(pairs: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}
