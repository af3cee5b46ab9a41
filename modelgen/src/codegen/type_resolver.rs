//! Database type to Rust type resolution

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::introspect::{ColumnType, TIMESTAMPTZ_TYPE};

/// Override hook for one database type name; sees the whole column
pub type TypeOverride = Arc<dyn Fn(&ColumnType) -> String + Send + Sync>;

/// Database type names covered by [`TypeResolver::with_nullable_wrappers`]
pub const NULLABLE_WRAPPER_TYPES: &[&str] = &[
    "varchar",
    "text",
    "bpchar",
    "int2",
    "int4",
    "int8",
    "bool",
    "float4",
    "float8",
    "numeric",
    "date",
    "timestamp",
    "timestamptz",
    "uuid",
    "json",
    "jsonb",
];

/// Resolves column metadata to the Rust type of the generated field.
///
/// Per database type name, an override function decides the type; without one
/// the introspector's native scan type is used unchanged.
#[derive(Clone, Default)]
pub struct TypeResolver {
    overrides: HashMap<String, TypeOverride>,
}

impl TypeResolver {
    /// Resolver without overrides: every column gets its scan type
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver with [`nullable_wrapper_resolver`] registered for the common
    /// Postgres types
    pub fn with_nullable_wrappers() -> Self {
        let mut resolver = Self::new();
        for name in NULLABLE_WRAPPER_TYPES {
            resolver.set_override(name, nullable_wrapper_resolver);
        }
        resolver
    }

    /// Register (or replace) the override for a database type name
    pub fn set_override<F>(&mut self, database_type_name: &str, f: F)
    where
        F: Fn(&ColumnType) -> String + Send + Sync + 'static,
    {
        self.overrides
            .insert(database_type_name.to_lowercase(), Arc::new(f));
    }

    /// Builder-style [`TypeResolver::set_override`]
    pub fn with_override<F>(mut self, database_type_name: &str, f: F) -> Self
    where
        F: Fn(&ColumnType) -> String + Send + Sync + 'static,
    {
        self.set_override(database_type_name, f);
        self
    }

    /// Merge a whole map of overrides
    pub fn with_overrides(mut self, overrides: HashMap<String, TypeOverride>) -> Self {
        for (name, f) in overrides {
            self.overrides.insert(name.to_lowercase(), f);
        }
        self
    }

    pub fn has_override(&self, database_type_name: &str) -> bool {
        self.overrides
            .contains_key(&database_type_name.to_lowercase())
    }

    /// Get the Rust type for a column
    pub fn resolve(&self, column: &ColumnType) -> String {
        match self
            .overrides
            .get(&column.database_type_name.to_lowercase())
        {
            Some(f) => f(column),
            None => column.scan_type.clone(),
        }
    }
}

impl fmt::Debug for TypeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.overrides.keys().collect();
        names.sort();
        f.debug_struct("TypeResolver")
            .field("overrides", &names)
            .finish()
    }
}

/// Stock nullability-aware override.
///
/// Confirmed-nullable columns become `Option<..>`; a non-nullable
/// `timestamptz` is always the plain time type; anything else keeps its scan
/// type.
pub fn nullable_wrapper_resolver(column: &ColumnType) -> String {
    if column.is_nullable() {
        let inner = match column.database_type_name.as_str() {
            "timestamptz" => TIMESTAMPTZ_TYPE,
            _ => column.scan_type.as_str(),
        };
        format!("Option<{}>", inner)
    } else if column.database_type_name == "timestamptz" {
        TIMESTAMPTZ_TYPE.to_string()
    } else {
        column.scan_type.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_column(name: &str, type_name: &str, nullable: Option<bool>, scan: &str) -> ColumnType {
        ColumnType::new(name, type_name, nullable, scan)
    }

    #[test]
    fn test_no_override_uses_scan_type() {
        let resolver = TypeResolver::new();
        let col = make_column("name", "varchar", Some(true), "String");
        assert_eq!(resolver.resolve(&col), "String");
    }

    #[test]
    fn test_nullable_override_branch() {
        let resolver = TypeResolver::with_nullable_wrappers();

        let col = make_column("budget", "int4", Some(true), "i32");
        assert_eq!(resolver.resolve(&col), "Option<i32>");

        let col = make_column("budget", "int4", Some(false), "i32");
        assert_eq!(resolver.resolve(&col), "i32");
    }

    #[test]
    fn test_unknown_nullability_is_not_nullable() {
        let resolver = TypeResolver::with_nullable_wrappers();
        let col = make_column("budget", "int8", None, "i64");
        assert_eq!(resolver.resolve(&col), "i64");
    }

    #[test]
    fn test_timestamptz_special_case() {
        let resolver = TypeResolver::with_nullable_wrappers();

        let col = make_column("created_dtm", "timestamptz", Some(false), "SomeDriverTime");
        assert_eq!(resolver.resolve(&col), TIMESTAMPTZ_TYPE);

        let col = make_column("deleted_dtm", "timestamptz", Some(true), TIMESTAMPTZ_TYPE);
        assert_eq!(
            resolver.resolve(&col),
            "Option<chrono::DateTime<chrono::Utc>>"
        );
    }

    #[test]
    fn test_timestamptz_without_override_is_plain_time() {
        let resolver = TypeResolver::new();
        let col = make_column("created_dtm", "timestamptz", Some(false), TIMESTAMPTZ_TYPE);
        assert_eq!(resolver.resolve(&col), TIMESTAMPTZ_TYPE);
    }

    #[test]
    fn test_custom_override_sees_column() {
        let resolver = TypeResolver::new().with_override("jsonb", |col: &ColumnType| {
            if col.name.ends_with("_settings") {
                "crate::Settings".to_string()
            } else {
                col.scan_type.clone()
            }
        });

        let col = make_column("campaign_settings", "jsonb", Some(false), "serde_json::Value");
        assert_eq!(resolver.resolve(&col), "crate::Settings");

        let col = make_column("payload", "JSONB", Some(false), "serde_json::Value");
        assert_eq!(resolver.resolve(&col), "serde_json::Value");
    }

    #[test]
    fn test_unknown_database_type_never_fails() {
        let resolver = TypeResolver::with_nullable_wrappers();
        let col = make_column("search", "tsvector", Some(true), "String");
        assert_eq!(resolver.resolve(&col), "String");
    }
}
