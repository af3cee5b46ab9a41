//! Offline schema introspection from SQL DDL using sqlparser-rs

use std::path::Path;

use sqlparser::ast::{
    ColumnOption, CommentObject, Expr, ForeignKeyConstraint, Ident, IndexColumn,
    IndexConstraint, ObjectName, PrimaryKeyConstraint, Statement, TableConstraint,
    UniqueConstraint,
};
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;
use tracing::debug;

use super::metadata::*;
use super::scan_type::{canonical_type_name, native_scan_type, SqlDialect};
use super::SchemaIntrospector;
use crate::error::{CodegenError, Result};

/// Introspects tables declared in a DDL script (`CREATE TABLE`, `COMMENT ON`)
#[derive(Debug, Clone)]
pub struct DdlIntrospector {
    tables: Vec<TableSchema>,
}

impl DdlIntrospector {
    /// Parse a DDL string
    pub fn parse(sql: &str, dialect: SqlDialect) -> Result<Self> {
        let statements = match dialect {
            SqlDialect::Postgres => parse_with(&PostgreSqlDialect {}, sql)?,
            SqlDialect::Mysql => parse_with(&MySqlDialect {}, sql)?,
            SqlDialect::Generic => parse_with(&GenericDialect {}, sql)?,
        };

        let mut tables = Vec::new();
        let mut comments = Vec::new();

        for stmt in statements {
            match stmt {
                Statement::CreateTable(create_table) => {
                    tables.push(extract_table(&create_table, dialect)?);
                }
                Statement::Comment {
                    object_type,
                    object_name,
                    comment,
                    ..
                } => comments.push((object_type, object_name_parts(&object_name), comment)),
                _ => {}
            }
        }

        // COMMENT ON may precede or follow the CREATE TABLE it refers to
        for (object_type, parts, comment) in comments {
            apply_comment(&mut tables, object_type, &parts, comment);
        }

        debug!("Parsed {} tables from DDL", tables.len());
        Ok(Self { tables })
    }

    /// Read and parse a DDL file
    pub fn from_file(path: &Path, dialect: SqlDialect) -> Result<Self> {
        let sql = std::fs::read_to_string(path)?;
        Self::parse(&sql, dialect)
    }

    fn find(&self, table: &TableRef) -> Option<&TableSchema> {
        let exact = self
            .tables
            .iter()
            .find(|t| t.name == table.name && t.schema == table.schema);
        if exact.is_some() {
            return exact;
        }

        // Unqualified on either side: resolve by bare name when unambiguous
        let mut candidates = self.tables.iter().filter(|t| {
            t.name == table.name && (t.schema.is_none() || table.schema.is_none())
        });
        let first = candidates.next();
        match candidates.next() {
            Some(_) => None,
            None => first,
        }
    }
}

impl SchemaIntrospector for DdlIntrospector {
    fn table(&self, table: &TableRef) -> Result<TableSchema> {
        let found = self
            .find(table)
            .ok_or_else(|| CodegenError::TableNotFound(table.qualified()))?;

        let mut schema = found.clone();
        if schema.schema.is_none() {
            schema.schema = table.schema.clone();
        }
        Ok(schema)
    }

    fn tables(&self) -> Result<Vec<TableSchema>> {
        Ok(self.tables.clone())
    }
}

fn parse_with(dialect: &dyn Dialect, sql: &str) -> Result<Vec<Statement>> {
    Ok(Parser::parse_sql(dialect, sql)?)
}

/// Extract table metadata from a CREATE TABLE statement
fn extract_table(create: &sqlparser::ast::CreateTable, dialect: SqlDialect) -> Result<TableSchema> {
    let mut parts = object_name_parts(&create.name);
    let name = parts.pop().unwrap_or_default();
    let schema = parts.pop();

    let mut table = TableSchema {
        schema,
        name,
        comment: None,
        columns: Vec::new(),
        foreign_keys: Vec::new(),
    };

    for col_def in &create.columns {
        let (column, col_unique) = extract_column(col_def, dialect);

        if col_unique {
            let index_name = format!("{}_unique", column.name);
            table.columns.push(column);
            if let Some(col) = table.columns.last_mut() {
                col.indexes.push(ColumnIndex {
                    name: index_name,
                    unique: true,
                });
            }
        } else {
            table.columns.push(column);
        }
    }

    for constraint in &create.constraints {
        match constraint {
            TableConstraint::PrimaryKey(PrimaryKeyConstraint {
                columns: pk_cols, ..
            }) => {
                for pk_col in pk_cols {
                    let col_name = extract_ident_from_index_column(pk_col);
                    if let Some(col) = table.get_column_mut(&col_name) {
                        col.is_primary_key = true;
                        col.nullable = Some(false);
                    }
                }
            }
            TableConstraint::Unique(UniqueConstraint {
                columns: uniq_cols,
                name,
                ..
            }) => {
                let col_names: Vec<String> =
                    uniq_cols.iter().map(extract_ident_from_index_column).collect();
                let idx_name = name
                    .as_ref()
                    .map(extract_ident)
                    .unwrap_or_else(|| format!("{}_unique", col_names.join("_")));
                add_index(&mut table, &col_names, &idx_name, true);
            }
            TableConstraint::Index(IndexConstraint {
                columns: idx_cols,
                name,
                ..
            }) => {
                let col_names: Vec<String> =
                    idx_cols.iter().map(extract_ident_from_index_column).collect();
                let idx_name = name
                    .as_ref()
                    .map(extract_ident)
                    .unwrap_or_else(|| format!("idx_{}", col_names.join("_")));
                add_index(&mut table, &col_names, &idx_name, false);
            }
            TableConstraint::ForeignKey(ForeignKeyConstraint {
                columns,
                foreign_table,
                referred_columns,
                ..
            }) => {
                let referenced_table = object_name_parts(foreign_table).join(".");
                for (col, ref_col) in columns.iter().zip(referred_columns.iter()) {
                    table.foreign_keys.push(ForeignKey {
                        column_name: extract_ident(col),
                        referenced_table: referenced_table.clone(),
                        referenced_column: extract_ident(ref_col),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(table)
}

fn add_index(table: &mut TableSchema, columns: &[String], name: &str, unique: bool) {
    for col_name in columns {
        if let Some(col) = table.get_column_mut(col_name) {
            col.indexes.push(ColumnIndex {
                name: name.to_string(),
                unique,
            });
        }
    }
}

/// Extract column metadata from a column definition; also reports inline UNIQUE
fn extract_column(col_def: &sqlparser::ast::ColumnDef, dialect: SqlDialect) -> (ColumnType, bool) {
    let name = extract_ident(&col_def.name);
    let full_type = format!("{}", col_def.data_type);
    let database_type_name = canonical_type_name(&full_type, dialect);
    let is_unsigned = full_type.to_uppercase().contains("UNSIGNED");
    let scan_type = native_scan_type(&database_type_name, &full_type, is_unsigned);

    let mut nullable = true;
    let mut default_value = None;
    let mut is_primary_key = false;
    let mut is_auto_increment = full_type.to_lowercase().contains("serial");
    let mut is_unique = false;
    let mut comment = None;

    for option in &col_def.options {
        match &option.option {
            ColumnOption::NotNull => {
                nullable = false;
            }
            ColumnOption::Null => {
                nullable = true;
            }
            ColumnOption::Default(expr) => {
                default_value = Some(format!("{}", expr));
            }
            ColumnOption::PrimaryKey(_) => {
                is_primary_key = true;
                nullable = false;
            }
            ColumnOption::Unique(_) => {
                is_unique = true;
            }
            ColumnOption::Comment(c) => {
                comment = Some(c.clone());
            }
            ColumnOption::Generated { .. } => {
                is_auto_increment = true;
            }
            ColumnOption::DialectSpecific(tokens) => {
                let token_str = tokens
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_uppercase();
                if token_str.contains("AUTO_INCREMENT") {
                    is_auto_increment = true;
                }
            }
            _ => {}
        }
    }

    let column = ColumnType {
        name,
        database_type_name,
        full_type,
        nullable: Some(nullable),
        scan_type,
        comment,
        default_value,
        is_primary_key,
        is_auto_increment,
        indexes: Vec::new(),
    };

    (column, is_unique)
}

fn apply_comment(
    tables: &mut [TableSchema],
    object_type: CommentObject,
    parts: &[String],
    comment: Option<String>,
) {
    match object_type {
        CommentObject::Table => {
            let Some((name, schema)) = split_last(parts) else {
                return;
            };
            if let Some(table) = find_table_mut(tables, schema, name) {
                table.comment = comment;
            }
        }
        CommentObject::Column => {
            let Some((column, rest)) = split_last(parts) else {
                return;
            };
            let Some((name, schema)) = split_last(rest) else {
                return;
            };
            if let Some(col) =
                find_table_mut(tables, schema, name).and_then(|t| t.get_column_mut(column))
            {
                col.comment = comment;
            }
        }
        _ => {}
    }
}

fn split_last(parts: &[String]) -> Option<(&str, &[String])> {
    parts
        .split_last()
        .map(|(last, rest)| (last.as_str(), rest))
}

fn find_table_mut<'a>(
    tables: &'a mut [TableSchema],
    schema: &[String],
    name: &str,
) -> Option<&'a mut TableSchema> {
    let schema = schema.last();
    tables.iter_mut().find(|t| {
        t.name == name
            && match (schema, &t.schema) {
                (Some(wanted), Some(actual)) => wanted == actual,
                _ => true,
            }
    })
}

/// All identifier parts of an ObjectName (`schema.table` -> ["schema", "table"])
fn object_name_parts(name: &ObjectName) -> Vec<String> {
    name.0
        .iter()
        .filter_map(|part| part.as_ident())
        .map(|ident| ident.value.clone())
        .collect()
}

fn extract_ident(ident: &Ident) -> String {
    ident.value.clone()
}

/// Extract a column name string from an IndexColumn
fn extract_ident_from_index_column(ic: &IndexColumn) -> String {
    match &ic.column.expr {
        Expr::Identifier(ident) => ident.value.clone(),
        other => format!("{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAMPAIGN_DDL: &str = r#"
        CREATE TABLE campaign.campaign (
            id BIGINT PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            created_dtm TIMESTAMPTZ NOT NULL DEFAULT now(),
            deleted_dtm TIMESTAMPTZ
        );

        CREATE TABLE campaign.line_item (
            id BIGINT NOT NULL,
            campaign_id BIGINT NOT NULL,
            budget INTEGER,
            notes TEXT,
            PRIMARY KEY (id),
            FOREIGN KEY (campaign_id) REFERENCES campaign.campaign(id)
        );

        COMMENT ON TABLE campaign.line_item IS 'Line items of a campaign';
        COMMENT ON COLUMN campaign.line_item.notes IS 'Free-form notes';
    "#;

    #[test]
    fn test_parse_postgres_tables() {
        let ddl = DdlIntrospector::parse(CAMPAIGN_DDL, SqlDialect::Postgres).unwrap();
        let tables = ddl.tables().unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].schema.as_deref(), Some("campaign"));
        assert_eq!(tables[0].name, "campaign");
    }

    #[test]
    fn test_column_types_and_nullability() {
        let ddl = DdlIntrospector::parse(CAMPAIGN_DDL, SqlDialect::Postgres).unwrap();
        let table = ddl.table(&TableRef::parse("campaign.campaign")).unwrap();

        let id = table.get_column("id").unwrap();
        assert_eq!(id.database_type_name, "int8");
        assert_eq!(id.scan_type, "i64");
        assert_eq!(id.nullable, Some(false));
        assert!(id.is_primary_key);

        let created = table.get_column("created_dtm").unwrap();
        assert_eq!(created.database_type_name, "timestamptz");
        assert_eq!(created.nullable, Some(false));
        assert!(created.default_value.is_some());

        let deleted = table.get_column("deleted_dtm").unwrap();
        assert_eq!(deleted.nullable, Some(true));
    }

    #[test]
    fn test_table_level_constraints() {
        let ddl = DdlIntrospector::parse(CAMPAIGN_DDL, SqlDialect::Postgres).unwrap();
        let table = ddl.table(&TableRef::parse("campaign.line_item")).unwrap();

        assert!(table.get_column("id").unwrap().is_primary_key);
        assert_eq!(table.foreign_keys.len(), 1);
        assert_eq!(table.foreign_keys[0].column_name, "campaign_id");
        assert_eq!(table.foreign_keys[0].referenced_table, "campaign.campaign");
        assert_eq!(table.foreign_keys[0].referenced_column, "id");
    }

    #[test]
    fn test_comment_on_statements() {
        let ddl = DdlIntrospector::parse(CAMPAIGN_DDL, SqlDialect::Postgres).unwrap();
        let table = ddl.table(&TableRef::parse("campaign.line_item")).unwrap();
        assert_eq!(table.comment.as_deref(), Some("Line items of a campaign"));
        assert_eq!(
            table.get_column("notes").unwrap().comment.as_deref(),
            Some("Free-form notes")
        );
    }

    #[test]
    fn test_unqualified_lookup() {
        let ddl = DdlIntrospector::parse(CAMPAIGN_DDL, SqlDialect::Postgres).unwrap();
        let table = ddl.table(&TableRef::parse("line_item")).unwrap();
        assert_eq!(table.schema.as_deref(), Some("campaign"));
    }

    #[test]
    fn test_missing_table() {
        let ddl = DdlIntrospector::parse(CAMPAIGN_DDL, SqlDialect::Postgres).unwrap();
        let err = ddl.table(&TableRef::parse("campaign.targeting")).unwrap_err();
        assert!(matches!(err, CodegenError::TableNotFound(_)));
    }

    #[test]
    fn test_mysql_indexes_and_auto_increment() {
        let sql = r#"
            CREATE TABLE users (
                id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
                email VARCHAR(255) NOT NULL COMMENT 'login email',
                org_id INT NOT NULL,
                UNIQUE INDEX idx_email (email),
                INDEX idx_org (org_id),
                INDEX idx_org_email (org_id, email)
            );
        "#;
        let ddl = DdlIntrospector::parse(sql, SqlDialect::Mysql).unwrap();
        let table = ddl.table(&TableRef::parse("users")).unwrap();

        let id = table.get_column("id").unwrap();
        assert!(id.is_auto_increment);
        assert_eq!(id.scan_type, "u64");

        let email = table.get_column("email").unwrap();
        assert_eq!(email.comment.as_deref(), Some("login email"));
        assert!(email.indexes.iter().any(|i| i.unique));

        let org = table.get_column("org_id").unwrap();
        assert_eq!(org.indexes.len(), 2);
    }
}
