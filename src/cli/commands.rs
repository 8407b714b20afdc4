//! CLI command implementations
//!
//! Thin shell over the query pipeline: parse filters into qualifiers, run
//! one scan, print rows as JSON lines on stdout.

use std::io::Write;
use std::path::Path;

use serde_json::Value;

use crate::config::ApiConfig;
use crate::planner::{Operator, Qualifier, SortKey};
use crate::table::{self, MessageScan, Row};
use crate::transport::HttpTransport;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};

/// Entry point called from main
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    match cli.command {
        Command::Tables => {
            let mut out = std::io::stdout().lock();
            for name in table::table_names() {
                writeln!(out, "{}", name)?;
            }
            Ok(())
        }
        Command::Query {
            config,
            table,
            filters,
            sort,
            limit,
        } => query(&config, &table, &filters, sort.as_deref(), limit),
    }
}

fn query(
    config_path: &Path,
    table: &str,
    filters: &[String],
    sort: Option<&str>,
    limit: Option<u64>,
) -> CliResult<()> {
    let config = ApiConfig::load(config_path)?;
    let transport = HttpTransport::new(&config)?;

    let mut quals: Vec<Qualifier> = filters
        .iter()
        .map(|f| parse_filter(f))
        .collect::<CliResult<_>>()?;
    if let Some(n) = limit {
        quals.push(Qualifier::eq("limit", Value::from(n)));
    }
    let sortkeys: Vec<SortKey> = sort.map(parse_sort).into_iter().collect();

    let mut out = std::io::stdout().lock();
    if table == "messages" {
        for row in MessageScan::scan(&transport, &quals)? {
            print_row(&mut out, &row)?;
        }
        return Ok(());
    }

    let def = table::lookup(table).ok_or_else(|| CliError::UnknownTable(table.to_string()))?;
    for row in def.scan(&transport, &quals, &sortkeys)? {
        print_row(&mut out, &row)?;
    }
    Ok(())
}

fn print_row(out: &mut impl Write, row: &Row) -> CliResult<()> {
    writeln!(out, "{}", Value::Object(row.clone()))?;
    Ok(())
}

/// Parses `column<op>value`. Values that parse as JSON are kept typed;
/// anything else is a plain string.
fn parse_filter(text: &str) -> CliResult<Qualifier> {
    // Two-character operators first so ">=" never parses as ">" + "=...".
    const TOKENS: &[(&str, Operator)] = &[
        ("@>", Operator::Contains),
        (">=", Operator::Gte),
        ("<=", Operator::Lte),
        (">", Operator::Gt),
        ("<", Operator::Lt),
        ("=", Operator::Eq),
    ];
    for (token, op) in TOKENS {
        if let Some(idx) = text.find(token) {
            let field = text[..idx].trim();
            let raw = text[idx + token.len()..].trim();
            if field.is_empty() || raw.is_empty() {
                break;
            }
            let value = serde_json::from_str::<Value>(raw)
                .unwrap_or_else(|_| Value::String(raw.to_string()));
            return Ok(Qualifier::new(field, *op, value));
        }
    }
    Err(CliError::BadFilter(text.to_string()))
}

fn parse_sort(text: &str) -> SortKey {
    match text.split_once(':') {
        Some((field, "desc")) => SortKey::desc(field.trim()),
        Some((field, _)) => SortKey::asc(field.trim()),
        None => SortKey::asc(text.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::Operator;
    use serde_json::json;

    #[test]
    fn test_parse_filter_operators() {
        let q = parse_filter("device_id=dev_1").unwrap();
        assert_eq!(q.op, Operator::Eq);
        assert_eq!(q.value, json!("dev_1"));

        let q = parse_filter("start_time>=2025-08-01T00:00:00Z").unwrap();
        assert_eq!(q.op, Operator::Gte);

        let q = parse_filter(r#"metadata@>{"robot": "r2"}"#).unwrap();
        assert_eq!(q.op, Operator::Contains);
        assert_eq!(q.value, json!({"robot": "r2"}));
    }

    #[test]
    fn test_parse_filter_keeps_json_types() {
        let q = parse_filter("limit=25").unwrap();
        assert_eq!(q.value, json!(25));
    }

    #[test]
    fn test_parse_filter_rejects_garbage() {
        assert!(parse_filter("no operator here").is_err());
        assert!(parse_filter("=value").is_err());
    }

    #[test]
    fn test_parse_sort() {
        let sk = parse_sort("created_at:desc");
        assert_eq!(sk.field, "created_at");
        assert!(sk.direction.is_descending());
        assert!(!parse_sort("created_at").direction.is_descending());
    }
}
