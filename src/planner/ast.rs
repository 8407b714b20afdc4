//! Qualifier model shared by the compiler and the verifier
//!
//! A query is an unordered conjunction of qualifiers plus an optional list
//! of sort keys. Only the first sort key is ever honored (the upstream API
//! supports a single sort field).

use serde_json::Value;

/// Comparison operators supported by qualifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equality: field = value
    Eq,
    /// Greater than: field > value
    Gt,
    /// Greater than or equal: field >= value
    Gte,
    /// Less than: field < value
    Lt,
    /// Less than or equal: field <= value
    Lte,
    /// Structured containment (metadata @> '{"k":"v"}')
    Contains,
}

impl Operator {
    /// Returns true for the four range comparison operators
    pub fn is_range(self) -> bool {
        matches!(self, Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte)
    }

    /// Returns true for lower-bound-implying operators (>, >=)
    pub fn is_lower(self) -> bool {
        matches!(self, Operator::Gt | Operator::Gte)
    }

    /// Returns true for upper-bound-implying operators (<, <=)
    pub fn is_upper(self) -> bool {
        matches!(self, Operator::Lt | Operator::Lte)
    }

    /// Operator name for diagnostics
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Contains => "@>",
        }
    }
}

/// A single predicate from the host query
#[derive(Debug, Clone, PartialEq)]
pub struct Qualifier {
    /// Logical column name
    pub field: String,
    /// Comparison operator
    pub op: Operator,
    /// Comparison operand (scalar or structured)
    pub value: Value,
}

impl Qualifier {
    pub fn new(field: impl Into<String>, op: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// Create an equality qualifier
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    /// Create a greater-than qualifier
    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::Gt, value)
    }

    /// Create a greater-than-or-equal qualifier
    pub fn gte(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::Gte, value)
    }

    /// Create a less-than qualifier
    pub fn lt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::Lt, value)
    }

    /// Create a less-than-or-equal qualifier
    pub fn lte(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::Lte, value)
    }

    /// Create a containment qualifier
    pub fn contains(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::Contains, value)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn is_descending(self) -> bool {
        matches!(self, SortDirection::Desc)
    }
}

/// A requested sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Logical column to sort by
    pub field: String,
    /// Sort direction
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_classification() {
        assert!(Operator::Gt.is_range());
        assert!(Operator::Lte.is_range());
        assert!(!Operator::Eq.is_range());
        assert!(!Operator::Contains.is_range());

        assert!(Operator::Gte.is_lower());
        assert!(!Operator::Gte.is_upper());
        assert!(Operator::Lt.is_upper());
    }

    #[test]
    fn test_qualifier_builders() {
        let q = Qualifier::gte("start_time", json!("2025-01-01T00:00:00Z"));
        assert_eq!(q.field, "start_time");
        assert_eq!(q.op, Operator::Gte);

        let q = Qualifier::contains("metadata", json!({"robot": "r2"}));
        assert_eq!(q.op, Operator::Contains);
    }

    #[test]
    fn test_sort_key() {
        let sk = SortKey::desc("created_at");
        assert_eq!(sk.direction, SortDirection::Desc);
        assert!(sk.direction.is_descending());
        assert_eq!(sk.direction.as_str(), "desc");
    }
}
