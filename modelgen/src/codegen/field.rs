//! Field model builder - turns introspected columns into record fields

use serde::Serialize;
use tracing::{debug, trace};

use super::naming::{escape_field_name, to_struct_name};
use super::registry::Record;
use super::relation::RelationKind;
use super::rule::Rule;
use super::tag::*;
use super::type_resolver::TypeResolver;
use crate::introspect::{ColumnType, TableSchema};

/// One attribute of a generated record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Rust field name
    pub name: String,

    /// Rust type
    pub ty: String,

    /// Source column; empty for injected relation fields
    pub column_name: String,

    pub column_comment: String,

    /// Render the comment as a block above the field instead of trailing it
    pub multiline_comment: bool,

    /// ORM mapping annotations
    pub orm_tag: TagSet,

    /// Serialization annotations
    pub serde_tag: TagSet,

    /// Import the field type needs, if any
    pub import_path: Option<String>,

    /// Set on fields injected by a relation rule
    pub relation: Option<RelationKind>,
}

impl Field {
    /// Bare field with empty tags and no comment
    pub fn new(name: &str, ty: &str, column_name: &str) -> Self {
        Self {
            name: name.to_string(),
            ty: ty.to_string(),
            column_name: column_name.to_string(),
            column_comment: String::new(),
            multiline_comment: false,
            orm_tag: TagSet::new(),
            serde_tag: TagSet::new(),
            import_path: None,
            relation: None,
        }
    }

    pub fn tags(&self, kind: TagKind) -> &TagSet {
        match kind {
            TagKind::Orm => &self.orm_tag,
            TagKind::Serde => &self.serde_tag,
        }
    }

    pub fn tags_mut(&mut self, kind: TagKind) -> &mut TagSet {
        match kind {
            TagKind::Orm => &mut self.orm_tag,
            TagKind::Serde => &mut self.serde_tag,
        }
    }

    /// Replace the comment and recompute the multiline flag
    pub fn set_comment(&mut self, comment: &str) {
        self.column_comment = comment.to_string();
        self.multiline_comment = comment.contains('\n');
    }

    pub fn is_relation(&self) -> bool {
        self.relation.is_some()
    }

    pub fn is_primary_key(&self) -> bool {
        self.orm_tag.contains(TAG_PRIMARY_KEY)
    }
}

/// Switches that change the default tags of a base field
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Emit `index` / `uniqueIndex` tags from the column's indexes
    pub field_with_index_tag: bool,
}

/// Default field for a column: convention name, resolved type, default tags
pub fn base_field(column: &ColumnType, resolver: &TypeResolver, options: &BuildOptions) -> Field {
    let mut field = Field::new(
        &escape_field_name(&column.name),
        &resolver.resolve(column),
        &column.name,
    );

    let tags = &mut field.orm_tag;
    tags.set_value(TAG_COLUMN, &column.name);
    tags.set_value(TAG_TYPE, column.full_type.to_lowercase());
    if column.is_primary_key {
        tags.set_flag(TAG_PRIMARY_KEY);
    }
    if column.is_auto_increment {
        tags.set_flag(TAG_AUTO_INCREMENT);
    }
    if column.nullable == Some(false) && !column.is_primary_key {
        tags.set_flag(TAG_NOT_NULL);
    }
    if let Some(default) = &column.default_value {
        tags.set_value(TAG_DEFAULT, default);
    }
    if let Some(comment) = column.comment.as_deref().filter(|c| !c.is_empty()) {
        tags.set_value(TAG_COMMENT, comment);
    }
    if options.field_with_index_tag {
        for index in &column.indexes {
            let key = if index.unique {
                TAG_UNIQUE_INDEX
            } else {
                TAG_INDEX
            };
            tags.append(key, &index.name);
        }
    }

    field.serde_tag.set_value(TAG_RENAME, &column.name);
    field.set_comment(column.comment.as_deref().unwrap_or_default());
    field
}

/// Build the record for a table: base fields in column order, then `rules`
/// in the order given.
pub fn build(
    table: &TableSchema,
    package: &str,
    resolver: &TypeResolver,
    options: &BuildOptions,
    rules: &[Rule],
) -> Record {
    let mut fields: Vec<Field> = table
        .columns
        .iter()
        .map(|column| base_field(column, resolver, options))
        .collect();

    for rule in rules {
        let touched = rule.apply(package, &mut fields);
        trace!("{}: rule {} touched {} field(s)", table.name, rule.describe(), touched);
    }

    debug!(
        "Built {} with {} fields ({} rules)",
        table.name,
        fields.len(),
        rules.len()
    );

    Record {
        package: package.to_string(),
        name: to_struct_name(&table.name),
        table_name: table.name.clone(),
        comment: table.comment.clone().unwrap_or_default(),
        fields,
        imports: Vec::new(),
        methods: Vec::new(),
    }
}
