//! Declarative rules, as written in the config file
//!
//! ```toml
//! [[rules]]
//! kind = "field_type"
//! column = "deleted_dtm"
//! ty = "DeletedAt"
//! import = "crate::types::DeletedAt"
//!
//! [[rules]]
//! kind = "orm_tag"
//! pattern = ".+"
//! remove = ["column", "comment", "not null"]
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::codegen::{ColumnMatcher, Rule, TagKind, TagOp};
use crate::error::{CodegenError, Result};

/// One rule from the `rules` list.
///
/// Each rule targets either one `column` or every column matching `pattern`;
/// with neither, it applies to every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleConfig {
    /// Override the field type
    FieldType {
        #[serde(default)]
        column: Option<String>,
        #[serde(default)]
        pattern: Option<String>,
        ty: String,
        #[serde(default)]
        import: Option<String>,
    },
    /// Edit ORM tags: `clear`, then `set`, then `flags`, then `remove`
    OrmTag {
        #[serde(default)]
        column: Option<String>,
        #[serde(default)]
        pattern: Option<String>,
        #[serde(default)]
        clear: bool,
        #[serde(default)]
        set: IndexMap<String, Vec<String>>,
        #[serde(default)]
        flags: Vec<String>,
        #[serde(default)]
        remove: Vec<String>,
    },
    /// Edit serde tags, same shape as `orm_tag`
    SerdeTag {
        #[serde(default)]
        column: Option<String>,
        #[serde(default)]
        pattern: Option<String>,
        #[serde(default)]
        clear: bool,
        #[serde(default)]
        set: IndexMap<String, Vec<String>>,
        #[serde(default)]
        flags: Vec<String>,
        #[serde(default)]
        remove: Vec<String>,
    },
    /// Drop every serde tag
    RemoveSerdeTag {
        #[serde(default)]
        column: Option<String>,
        #[serde(default)]
        pattern: Option<String>,
    },
    /// Replace the column comment
    Comment {
        #[serde(default)]
        column: Option<String>,
        #[serde(default)]
        pattern: Option<String>,
        comment: String,
    },
}

impl RuleConfig {
    /// Compile into a rule; patterns are compiled here, once
    pub fn compile(&self) -> Result<Rule> {
        let rule = match self {
            RuleConfig::FieldType {
                column,
                pattern,
                ty,
                import,
            } => Rule::TypeOverride {
                matcher: matcher(column, pattern)?,
                ty: ty.clone(),
                import: import.clone(),
            },
            RuleConfig::OrmTag {
                column,
                pattern,
                clear,
                set,
                flags,
                remove,
            } => Rule::TagEdit {
                matcher: matcher(column, pattern)?,
                kind: TagKind::Orm,
                ops: tag_ops(*clear, set, flags, remove),
            },
            RuleConfig::SerdeTag {
                column,
                pattern,
                clear,
                set,
                flags,
                remove,
            } => Rule::TagEdit {
                matcher: matcher(column, pattern)?,
                kind: TagKind::Serde,
                ops: tag_ops(*clear, set, flags, remove),
            },
            RuleConfig::RemoveSerdeTag { column, pattern } => Rule::TagEdit {
                matcher: matcher(column, pattern)?,
                kind: TagKind::Serde,
                ops: vec![TagOp::Clear],
            },
            RuleConfig::Comment {
                column,
                pattern,
                comment,
            } => Rule::CommentEdit {
                matcher: matcher(column, pattern)?,
                comment: comment.clone(),
            },
        };
        Ok(rule)
    }
}

/// Compile a whole rule list, stopping at the first bad pattern
pub fn compile_rules(rules: &[RuleConfig]) -> Result<Vec<Rule>> {
    rules.iter().map(RuleConfig::compile).collect()
}

fn matcher(column: &Option<String>, pattern: &Option<String>) -> Result<ColumnMatcher> {
    match (column, pattern) {
        (Some(_), Some(_)) => Err(CodegenError::ValidationError(
            "a rule takes either `column` or `pattern`, not both".into(),
        )),
        (Some(column), None) => Ok(ColumnMatcher::exact(column.as_str())),
        (None, Some(pattern)) => ColumnMatcher::pattern(pattern),
        (None, None) => Ok(ColumnMatcher::All),
    }
}

fn tag_ops(
    clear: bool,
    set: &IndexMap<String, Vec<String>>,
    flags: &[String],
    remove: &[String],
) -> Vec<TagOp> {
    clear
        .then_some(TagOp::Clear)
        .into_iter()
        .chain(set.iter().map(|(key, values)| TagOp::set(key, values.iter().cloned())))
        .chain(flags.iter().map(|key| TagOp::flag(key)))
        .chain(remove.iter().map(|key| TagOp::remove(key)))
        .collect()
}
