//! Relation builder - wires a generated record to one it depends on

use serde::{Deserialize, Serialize};

use super::field::Field;
use super::naming::{escape_field_name, to_field_name, to_module_name};
use super::registry::RecordHandle;
use super::rule::Rule;
use super::tag::{TAG_FOREIGN_KEY, TAG_REFERENCES};

/// Kind of association a relation field represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// The owning record holds the foreign key of a single parent
    BelongsTo,
}

/// Foreign-key link from the owning record to `target`.
///
/// Only metadata: it becomes one extra field whose tags carry the
/// foreign-key/reference pair.
#[derive(Debug, Clone)]
pub struct Relation {
    pub kind: RelationKind,

    /// Name of the injected field
    pub field_name: String,

    /// Local field holding the foreign key
    pub foreign_key: String,

    /// Referenced column
    pub references: String,

    pub target: RecordHandle,
}

impl Relation {
    /// The field this relation injects into a record of `owner_package`
    pub fn to_field(&self, owner_package: &str) -> Field {
        let target = self.target.record();
        let mut field = Field::new(
            &self.field_name,
            &format!("Option<{}>", target.name),
            "",
        );
        field.relation = Some(self.kind);
        field
            .orm_tag
            .set_value(TAG_FOREIGN_KEY, &self.foreign_key)
            .set_value(TAG_REFERENCES, &self.references);

        // model units live in `<root>::<package>::<file>`
        field.import_path = Some(if target.package == owner_package {
            format!("super::{}", target.name)
        } else {
            format!(
                "super::super::{}::{}",
                to_module_name(&target.package),
                target.name
            )
        });
        field
    }

    pub fn describe(&self) -> String {
        format!(
            "{:?} {} -> {} ({} references {})",
            self.kind,
            self.field_name,
            self.target.record().name,
            self.foreign_key,
            self.references
        )
    }
}

/// Belongs-to rule for the table `local_table_name` refers to.
///
/// The foreign key column is `{local_table_name}_id`; the injected field is
/// named after the table and tagged `foreignKey = <fk field>`,
/// `references = <fk column>`. Nothing checks that `target` is the record of
/// that table.
pub fn belongs_to(local_table_name: &str, target: &RecordHandle) -> Rule {
    let fk_column = format!("{}_id", local_table_name);
    belongs_to_with(
        &escape_field_name(local_table_name),
        &to_field_name(&fk_column),
        &fk_column,
        target,
    )
}

/// Belongs-to rule with explicit names
pub fn belongs_to_with(
    field_name: &str,
    foreign_key: &str,
    references: &str,
    target: &RecordHandle,
) -> Rule {
    Rule::RelationInject(Relation {
        kind: RelationKind::BelongsTo,
        field_name: field_name.to_string(),
        foreign_key: foreign_key.to_string(),
        references: references.to_string(),
        target: target.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::registry::{ModelRegistry, Record};

    fn make_record(package: &str, name: &str, table: &str) -> Record {
        Record {
            package: package.to_string(),
            name: name.to_string(),
            table_name: table.to_string(),
            comment: String::new(),
            fields: vec![Field::new("id", "i64", "id")],
            imports: Vec::new(),
            methods: Vec::new(),
        }
    }

    #[test]
    fn test_belongs_to_appends_one_field() {
        let mut registry = ModelRegistry::new();
        let campaign = registry
            .register(make_record("campaign", "Campaign", "campaign"))
            .unwrap();

        let mut fields = vec![
            Field::new("id", "i64", "id"),
            Field::new("campaign_id", "i64", "campaign_id"),
        ];
        let touched = belongs_to("campaign", &campaign).apply("campaign", &mut fields);
        assert_eq!(touched, 1);
        assert_eq!(fields.len(), 3);

        let relation = &fields[2];
        assert_eq!(relation.name, "campaign");
        assert_eq!(relation.ty, "Option<Campaign>");
        assert_eq!(relation.orm_tag.first(TAG_FOREIGN_KEY), Some("campaign_id"));
        assert_eq!(relation.orm_tag.first(TAG_REFERENCES), Some("campaign_id"));
        assert!(relation.serde_tag.is_empty());
        assert!(relation.column_name.is_empty());
        assert_eq!(relation.relation, Some(RelationKind::BelongsTo));
        assert_eq!(relation.import_path.as_deref(), Some("super::Campaign"));
    }

    #[test]
    fn test_cross_package_relation_imports_target() {
        let mut registry = ModelRegistry::new();
        let source = registry
            .register(make_record("lookup", "InventorySource", "inventory_source"))
            .unwrap();

        let mut fields = Vec::new();
        belongs_to("inventory_source", &source).apply("campaign", &mut fields);
        assert_eq!(fields[0].name, "inventory_source");
        assert_eq!(
            fields[0].orm_tag.first(TAG_FOREIGN_KEY),
            Some("inventory_source_id")
        );
        assert_eq!(
            fields[0].import_path.as_deref(),
            Some("super::super::lookup::InventorySource")
        );
    }

    #[test]
    fn test_keyword_table_name_is_escaped() {
        let mut registry = ModelRegistry::new();
        let kind = registry
            .register(make_record("campaign", "Type", "type"))
            .unwrap();

        let mut fields = Vec::new();
        belongs_to("type", &kind).apply("campaign", &mut fields);
        assert_eq!(fields[0].name, "r#type");
        assert_eq!(fields[0].orm_tag.first(TAG_FOREIGN_KEY), Some("type_id"));
    }

    #[test]
    fn test_belongs_to_with_explicit_names() {
        let mut registry = ModelRegistry::new();
        let card = registry
            .register(make_record("billing", "CreditCard", "credit_card"))
            .unwrap();

        let mut fields = Vec::new();
        belongs_to_with("card", "credit_card_ref", "id", &card).apply("billing", &mut fields);
        assert_eq!(fields[0].name, "card");
        assert_eq!(fields[0].orm_tag.first(TAG_FOREIGN_KEY), Some("credit_card_ref"));
        assert_eq!(fields[0].orm_tag.first(TAG_REFERENCES), Some("id"));
    }
}
