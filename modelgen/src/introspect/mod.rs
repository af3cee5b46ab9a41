//! Schema introspection: the table/column metadata the generator consumes

mod ddl;
mod memory;
mod metadata;
mod scan_type;

pub use ddl::*;
pub use memory::*;
pub use metadata::*;
pub use scan_type::*;

use crate::error::Result;

/// Source of table metadata.
///
/// Implementations may hit a database; any failure is reported for the one
/// table being looked up and must not affect other lookups.
pub trait SchemaIntrospector {
    /// Columns and comment of a single table
    fn table(&self, table: &TableRef) -> Result<TableSchema>;

    /// Every table this introspector knows about
    fn tables(&self) -> Result<Vec<TableSchema>>;
}

impl<T: SchemaIntrospector + ?Sized> SchemaIntrospector for Box<T> {
    fn table(&self, table: &TableRef) -> Result<TableSchema> {
        (**self).table(table)
    }

    fn tables(&self) -> Result<Vec<TableSchema>> {
        (**self).tables()
    }
}
