//! Field rules: the ordered edits applied while building a record

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::field::Field;
use super::relation::Relation;
use super::tag::{for_each_field_matching, TagKind, TagOp};
use crate::error::{CodegenError, Result};

/// Predicate over field metadata
pub type FieldPredicate = Arc<dyn Fn(&Field) -> bool + Send + Sync>;

/// Arbitrary in-place field edit
pub type FieldTransform = Arc<dyn Fn(&mut Field) + Send + Sync>;

/// Selects the fields a rule applies to.
///
/// `Exact` and `Pattern` look at the source column name, so fields without a
/// column (injected relations) are only reached through `All` or a predicate.
#[derive(Clone)]
pub enum ColumnMatcher {
    All,
    Exact(String),
    Pattern(Regex),
    Predicate(FieldPredicate),
}

impl ColumnMatcher {
    /// Match one column by name
    pub fn exact(column: impl Into<String>) -> Self {
        ColumnMatcher::Exact(column.into())
    }

    /// Compile a column-name regex (unanchored, like `Regex::is_match`)
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(ColumnMatcher::Pattern)
            .map_err(|source| CodegenError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Field) -> bool + Send + Sync + 'static,
    {
        ColumnMatcher::Predicate(Arc::new(f))
    }

    pub fn matches(&self, field: &Field) -> bool {
        match self {
            ColumnMatcher::All => true,
            ColumnMatcher::Exact(column) => {
                !field.column_name.is_empty() && field.column_name == *column
            }
            ColumnMatcher::Pattern(re) => {
                !field.column_name.is_empty() && re.is_match(&field.column_name)
            }
            ColumnMatcher::Predicate(f) => f(field),
        }
    }
}

impl fmt::Debug for ColumnMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnMatcher::All => f.write_str("all"),
            ColumnMatcher::Exact(column) => write!(f, "column({})", column),
            ColumnMatcher::Pattern(re) => write!(f, "pattern({})", re.as_str()),
            ColumnMatcher::Predicate(_) => f.write_str("predicate"),
        }
    }
}

/// One step of the field-model build, applied in the order given.
///
/// Later rules see the effect of earlier ones, so two rules writing the same
/// tag key resolve to the last one.
#[derive(Clone)]
pub enum Rule {
    /// Replace the field type, optionally adding an import the type needs
    TypeOverride {
        matcher: ColumnMatcher,
        ty: String,
        import: Option<String>,
    },
    /// Run tag operations on one of the field's tag sets
    TagEdit {
        matcher: ColumnMatcher,
        kind: TagKind,
        ops: Vec<TagOp>,
    },
    /// Replace the column comment
    CommentEdit {
        matcher: ColumnMatcher,
        comment: String,
    },
    /// Append a relation field
    RelationInject(Relation),
    /// Anything else, as a labelled closure
    Custom {
        label: String,
        matcher: ColumnMatcher,
        transform: FieldTransform,
    },
}

impl Rule {
    /// Set the type of one column's field
    pub fn field_type(column: &str, ty: &str) -> Self {
        Rule::TypeOverride {
            matcher: ColumnMatcher::exact(column),
            ty: ty.to_string(),
            import: None,
        }
    }

    /// Set the type of one column's field and import the path it needs
    pub fn field_type_with_import(column: &str, ty: &str, import: &str) -> Self {
        Rule::TypeOverride {
            matcher: ColumnMatcher::exact(column),
            ty: ty.to_string(),
            import: Some(import.to_string()),
        }
    }

    /// Set the type of every field whose column matches `pattern`
    pub fn field_type_matching(pattern: &str, ty: &str) -> Result<Self> {
        Ok(Rule::TypeOverride {
            matcher: ColumnMatcher::pattern(pattern)?,
            ty: ty.to_string(),
            import: None,
        })
    }

    /// Edit the ORM tags of one column's field
    pub fn orm_tag(column: &str, ops: impl IntoIterator<Item = TagOp>) -> Self {
        Rule::TagEdit {
            matcher: ColumnMatcher::exact(column),
            kind: TagKind::Orm,
            ops: ops.into_iter().collect(),
        }
    }

    /// Edit the ORM tags of every field whose column matches `pattern`
    pub fn orm_tag_matching(pattern: &str, ops: impl IntoIterator<Item = TagOp>) -> Result<Self> {
        Ok(Rule::TagEdit {
            matcher: ColumnMatcher::pattern(pattern)?,
            kind: TagKind::Orm,
            ops: ops.into_iter().collect(),
        })
    }

    /// Edit the serde tags of one column's field
    pub fn serde_tag(column: &str, ops: impl IntoIterator<Item = TagOp>) -> Self {
        Rule::TagEdit {
            matcher: ColumnMatcher::exact(column),
            kind: TagKind::Serde,
            ops: ops.into_iter().collect(),
        }
    }

    /// Drop all serde tags of every field whose column matches `pattern`
    pub fn remove_serde_tag_matching(pattern: &str) -> Result<Self> {
        Ok(Rule::TagEdit {
            matcher: ColumnMatcher::pattern(pattern)?,
            kind: TagKind::Serde,
            ops: vec![TagOp::Clear],
        })
    }

    /// Replace the comment of one column's field
    pub fn comment(column: &str, comment: &str) -> Self {
        Rule::CommentEdit {
            matcher: ColumnMatcher::exact(column),
            comment: comment.to_string(),
        }
    }

    /// Replace the comment of every field whose column matches `pattern`
    pub fn comment_matching(pattern: &str, comment: &str) -> Result<Self> {
        Ok(Rule::CommentEdit {
            matcher: ColumnMatcher::pattern(pattern)?,
            comment: comment.to_string(),
        })
    }

    /// Labelled closure over the matched fields
    pub fn custom<F>(label: &str, matcher: ColumnMatcher, transform: F) -> Self
    where
        F: Fn(&mut Field) + Send + Sync + 'static,
    {
        Rule::Custom {
            label: label.to_string(),
            matcher,
            transform: Arc::new(transform),
        }
    }

    /// Apply this rule to the fields of a record owned by `package`.
    ///
    /// Returns the number of fields touched (appended fields count as one).
    pub fn apply(&self, package: &str, fields: &mut Vec<Field>) -> usize {
        match self {
            Rule::TypeOverride {
                matcher,
                ty,
                import,
            } => for_each_field_matching(fields, matcher, |field| {
                field.ty = ty.clone();
                if import.is_some() {
                    field.import_path = import.clone();
                }
            }),
            Rule::TagEdit { matcher, kind, ops } => {
                for_each_field_matching(fields, matcher, |field| {
                    let tags = field.tags_mut(*kind);
                    for op in ops {
                        op.apply(tags);
                    }
                })
            }
            Rule::CommentEdit { matcher, comment } => {
                for_each_field_matching(fields, matcher, |field| field.set_comment(comment))
            }
            Rule::RelationInject(relation) => {
                fields.push(relation.to_field(package));
                1
            }
            Rule::Custom {
                matcher, transform, ..
            } => for_each_field_matching(fields, matcher, |field| transform(field)),
        }
    }

    /// Short description for logs
    pub fn describe(&self) -> String {
        match self {
            Rule::TypeOverride { matcher, ty, .. } => format!("type {:?} -> {}", matcher, ty),
            Rule::TagEdit { matcher, kind, ops } => {
                format!("{:?} tags {:?}: {} op(s)", kind, matcher, ops.len())
            }
            Rule::CommentEdit { matcher, .. } => format!("comment {:?}", matcher),
            Rule::RelationInject(relation) => relation.describe(),
            Rule::Custom { label, matcher, .. } => format!("custom `{}` {:?}", label, matcher),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
