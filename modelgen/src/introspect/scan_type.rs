//! Database type names and the native Rust types drivers scan them into

use serde::{Deserialize, Serialize};

/// Rust type used for `timestamptz` columns
pub const TIMESTAMPTZ_TYPE: &str = "chrono::DateTime<chrono::Utc>";

/// Scan type used when a database type is not recognized
pub const FALLBACK_SCAN_TYPE: &str = "String";

/// SQL dialect used to parse DDL and canonicalize type names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    Postgres,
    Mysql,
    Generic,
}

/// Canonical lowercase type name for a declared SQL type.
///
/// Length/precision arguments and `UNSIGNED`/`ZEROFILL` are dropped. For
/// Postgres the aliases collapse to the names the server reports
/// (`BIGINT` -> `int8`, `TIMESTAMP WITH TIME ZONE` -> `timestamptz`).
pub fn canonical_type_name(declared: &str, dialect: SqlDialect) -> String {
    let mut base = String::with_capacity(declared.len());
    let mut depth = 0usize;
    for ch in declared.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => base.push(ch),
            _ => {}
        }
    }

    let words: Vec<String> = base
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .filter(|w| w != "unsigned" && w != "zerofill")
        .collect();
    let name = words.join(" ");

    if dialect != SqlDialect::Postgres {
        return name;
    }

    match name.as_str() {
        "integer" | "int" | "serial" | "serial4" => "int4".to_string(),
        "bigint" | "bigserial" | "serial8" => "int8".to_string(),
        "smallint" | "smallserial" | "serial2" => "int2".to_string(),
        "boolean" => "bool".to_string(),
        "double precision" | "double" | "float" => "float8".to_string(),
        "real" => "float4".to_string(),
        "character varying" => "varchar".to_string(),
        "character" | "char" => "bpchar".to_string(),
        "decimal" => "numeric".to_string(),
        "timestamp with time zone" => "timestamptz".to_string(),
        "timestamp without time zone" => "timestamp".to_string(),
        "time with time zone" => "timetz".to_string(),
        "time without time zone" => "time".to_string(),
        _ => name,
    }
}

/// Native scan type for a canonical type name.
///
/// `full_type` is the declared type, used to spot `TINYINT(1)` and `BIT(1)`
/// booleans. Unknown types scan into `String`.
pub fn native_scan_type(type_name: &str, full_type: &str, unsigned: bool) -> String {
    let full_lower = full_type.to_lowercase();
    let int = |signed: &str, unsigned_ty: &str| {
        if unsigned {
            unsigned_ty.to_string()
        } else {
            signed.to_string()
        }
    };

    match type_name {
        "bool" | "boolean" => "bool".to_string(),
        "tinyint" if full_lower.contains("(1)") => "bool".to_string(),
        "bit" if full_lower.contains("(1)") => "bool".to_string(),
        "tinyint" => int("i8", "u8"),
        "int2" | "smallint" => int("i16", "u16"),
        "int4" | "int" | "integer" | "mediumint" | "serial" => int("i32", "u32"),
        "int8" | "bigint" | "bigserial" => int("i64", "u64"),
        "float4" | "real" | "float" => "f32".to_string(),
        "float8" | "double" | "double precision" => "f64".to_string(),
        "numeric" | "decimal" | "money" => "rust_decimal::Decimal".to_string(),
        "varchar" | "char" | "bpchar" | "text" | "tinytext" | "mediumtext" | "longtext"
        | "citext" | "enum" | "set" | "name" | "character varying" => "String".to_string(),
        "bytea" | "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob"
        | "bit" => "Vec<u8>".to_string(),
        "date" => "chrono::NaiveDate".to_string(),
        "time" | "timetz" => "chrono::NaiveTime".to_string(),
        "timestamp" | "datetime" => "chrono::NaiveDateTime".to_string(),
        "timestamptz" => TIMESTAMPTZ_TYPE.to_string(),
        "json" | "jsonb" => "serde_json::Value".to_string(),
        "uuid" => "uuid::Uuid".to_string(),
        _ => FALLBACK_SCAN_TYPE.to_string(),
    }
}
