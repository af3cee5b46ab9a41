//! In-memory introspector for programmatic use and tests

use std::collections::HashMap;

use indexmap::IndexMap;

use super::metadata::{TableRef, TableSchema};
use super::SchemaIntrospector;
use crate::error::{CodegenError, Result};

/// Serves tables that were inserted up front
#[derive(Debug, Clone, Default)]
pub struct MemoryIntrospector {
    tables: IndexMap<String, TableSchema>,
    failures: HashMap<String, String>,
}

impl MemoryIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a table, keyed by its qualified name
    pub fn insert(&mut self, table: TableSchema) {
        self.tables.insert(table.table_ref().qualified(), table);
    }

    /// Builder-style insert
    pub fn with_table(mut self, table: TableSchema) -> Self {
        self.insert(table);
        self
    }

    /// Make every lookup of `table` fail with an introspection error
    pub fn fail_table(&mut self, table: &str, message: impl Into<String>) {
        self.failures
            .insert(TableRef::parse(table).qualified(), message.into());
    }
}

impl SchemaIntrospector for MemoryIntrospector {
    fn table(&self, table: &TableRef) -> Result<TableSchema> {
        let key = table.qualified();
        if let Some(message) = self.failures.get(&key) {
            return Err(CodegenError::Introspection {
                table: key,
                message: message.clone(),
            });
        }
        self.tables
            .get(&key)
            .cloned()
            .ok_or(CodegenError::TableNotFound(key))
    }

    fn tables(&self) -> Result<Vec<TableSchema>> {
        Ok(self.tables.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::ColumnType;

    #[test]
    fn test_lookup_by_qualified_name() {
        let table = TableSchema::new(&TableRef::parse("lookup.inventory_source"))
            .with_column(ColumnType::new("id", "int8", Some(false), "i64"));
        let introspector = MemoryIntrospector::new().with_table(table);

        let found = introspector
            .table(&TableRef::parse("lookup.inventory_source"))
            .unwrap();
        assert_eq!(found.columns.len(), 1);
        assert!(introspector
            .table(&TableRef::parse("inventory_source"))
            .is_err());
    }

    #[test]
    fn test_injected_failure() {
        let mut introspector = MemoryIntrospector::new();
        introspector.fail_table("campaign.targeting", "connection reset");
        let err = introspector
            .table(&TableRef::parse("campaign.targeting"))
            .unwrap_err();
        assert!(matches!(err, CodegenError::Introspection { .. }));
    }
}
