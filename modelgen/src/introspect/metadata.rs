//! Metadata structures produced by schema introspection

use serde::{Deserialize, Serialize};

/// A table identifier, optionally qualified by a schema (`campaign.line_item`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    /// Schema (namespace) the table lives in, if qualified
    pub schema: Option<String>,

    /// Bare table name
    pub name: String,
}

impl TableRef {
    /// Parse `schema.table` or `table`
    pub fn parse(identifier: &str) -> Self {
        match identifier.trim().rsplit_once('.') {
            Some((schema, name)) if !schema.is_empty() => Self {
                schema: Some(schema.to_string()),
                name: name.to_string(),
            },
            _ => Self {
                schema: None,
                name: identifier.trim().trim_start_matches('.').to_string(),
            },
        }
    }

    /// Schema-qualified name if a schema is set, otherwise the bare name
    pub fn qualified(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.qualified())
    }
}

impl From<&str> for TableRef {
    fn from(identifier: &str) -> Self {
        Self::parse(identifier)
    }
}

/// Metadata for a database table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Schema the table was found in
    pub schema: Option<String>,

    /// Table name
    pub name: String,

    /// Table comment (if any)
    pub comment: Option<String>,

    /// Columns in declaration order
    pub columns: Vec<ColumnType>,

    /// Foreign key constraints
    pub foreign_keys: Vec<ForeignKey>,
}

/// Metadata for a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnType {
    /// Column name
    pub name: String,

    /// Canonical lowercase type name (e.g., "int8", "varchar", "timestamptz")
    pub database_type_name: String,

    /// Data type as declared (e.g., "VARCHAR(255)")
    pub full_type: String,

    /// Nullability, or `None` when the introspector cannot tell
    pub nullable: Option<bool>,

    /// Native Rust type a driver would scan this column into
    pub scan_type: String,

    /// Column comment (if any)
    pub comment: Option<String>,

    /// Default value expression (if any)
    pub default_value: Option<String>,

    /// Whether the column is (part of) the primary key
    pub is_primary_key: bool,

    /// Whether this column is auto-increment
    pub is_auto_increment: bool,

    /// Indexes this column participates in
    pub indexes: Vec<ColumnIndex>,
}

/// An index a column belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnIndex {
    /// Index name
    pub name: String,

    /// Whether this is a unique index
    pub unique: bool,
}

/// Foreign key constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Column name in this table
    pub column_name: String,

    /// Referenced table name
    pub referenced_table: String,

    /// Referenced column name
    pub referenced_column: String,
}

impl TableSchema {
    /// Create an empty table
    pub fn new(table: &TableRef) -> Self {
        Self {
            schema: table.schema.clone(),
            name: table.name.clone(),
            comment: None,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Builder-style column append
    pub fn with_column(mut self, column: ColumnType) -> Self {
        self.columns.push(column);
        self
    }

    /// Table reference for this table
    pub fn table_ref(&self) -> TableRef {
        TableRef {
            schema: self.schema.clone(),
            name: self.name.clone(),
        }
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnType> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get a mutable column by name
    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut ColumnType> {
        self.columns.iter_mut().find(|c| c.name == name)
    }
}

impl ColumnType {
    /// Create a column with the minimum metadata; everything else is empty
    pub fn new(
        name: impl Into<String>,
        database_type_name: impl Into<String>,
        nullable: Option<bool>,
        scan_type: impl Into<String>,
    ) -> Self {
        let database_type_name = database_type_name.into();
        Self {
            name: name.into(),
            full_type: database_type_name.to_uppercase(),
            database_type_name,
            nullable,
            scan_type: scan_type.into(),
            comment: None,
            default_value: None,
            is_primary_key: false,
            is_auto_increment: false,
            indexes: Vec::new(),
        }
    }

    /// True only when the column is known to be nullable.
    ///
    /// Unknown nullability is treated the same as NOT NULL.
    pub fn is_nullable(&self) -> bool {
        self.nullable == Some(true)
    }
}
