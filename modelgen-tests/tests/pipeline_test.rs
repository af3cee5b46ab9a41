//! End-to-end tests: DDL fixture in, source files out

use std::fs;
use std::path::{Path, PathBuf};

use modelgen::codegen::{belongs_to, Generator, ModelMethod, ModelRegistry, Rule, TagOp};
use modelgen::config::{GeneratorConfig, RenderMode, RuleConfig, TableSpec};
use modelgen::introspect::{DdlIntrospector, SqlDialect};
use modelgen::CodegenError;

fn fixture_schema() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/schema.sql")
}

fn make_config(out: &Path) -> GeneratorConfig {
    GeneratorConfig {
        schema_file: fixture_schema(),
        output_dir: out.to_path_buf(),
        format_output: false,
        ..Default::default()
    }
}

fn make_generator(config: GeneratorConfig) -> Generator {
    let introspector = DdlIntrospector::from_file(&fixture_schema(), SqlDialect::Postgres).unwrap();
    Generator::new(config, introspector).unwrap()
}

fn read(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join(file)).unwrap()
}

#[test]
fn test_dependent_names_its_parent() {
    let dir = tempfile::tempdir().unwrap();
    let generator = make_generator(make_config(dir.path()));
    let mut registry = ModelRegistry::new();

    let campaign = generator
        .generate_model(&mut registry, "campaign.campaign", &[])
        .unwrap();
    generator
        .generate_model(
            &mut registry,
            "campaign.line_item",
            &[belongs_to("campaign", &campaign)],
        )
        .unwrap();
    generator.execute(&registry).unwrap();

    let campaign_src = read(dir.path(), "campaign/campaign.rs");
    let line_item_src = read(dir.path(), "campaign/line_item.rs");

    assert!(line_item_src.contains("use super::Campaign;"));
    assert!(line_item_src.contains("pub campaign: Option<Campaign>,"));
    assert!(line_item_src.contains(
        r#"#[cfg_attr(any(), orm(foreign_key = "campaign_id", references = "campaign_id"))]"#
    ));
    assert!(!campaign_src.contains("LineItem"));
    assert!(!campaign_src.contains("line_item"));
}

#[test]
fn test_default_tags_and_types() {
    let dir = tempfile::tempdir().unwrap();
    let generator = make_generator(make_config(dir.path()));
    let mut registry = ModelRegistry::new();
    generator
        .generate_model(&mut registry, "campaign.campaign", &[])
        .unwrap();
    generator
        .generate_model(&mut registry, "campaign.line_item", &[])
        .unwrap();
    generator.execute(&registry).unwrap();

    let campaign_src = read(dir.path(), "campaign/campaign.rs");
    assert!(campaign_src.contains("/// Advertising campaigns"));
    assert!(campaign_src.contains(r#"#[cfg_attr(any(), orm(column = "id", type = "bigint", primary_key))]"#));
    assert!(campaign_src.contains("pub created_dtm: chrono::DateTime<chrono::Utc>,"));
    assert!(campaign_src.contains("pub deleted_dtm: Option<chrono::DateTime<chrono::Utc>>,"));
    assert!(campaign_src.contains(r#"default = "now()""#));

    let line_item_src = read(dir.path(), "campaign/line_item.rs");
    assert!(line_item_src.contains("pub r#type: String,"));
    assert!(line_item_src.contains("pub priority: Option<i32>, // Lower runs first"));
    assert!(line_item_src.contains("    /*\nTrafficking notes.\nVisible to account managers only.\n    */"));
}

#[test]
fn test_pattern_scoped_tag_removal() {
    let dir = tempfile::tempdir().unwrap();
    let generator = make_generator(make_config(dir.path()));
    let mut registry = ModelRegistry::new();
    let handle = generator
        .generate_model(
            &mut registry,
            "campaign.campaign",
            &[
                Rule::orm_tag_matching(".+", [TagOp::remove("type")]).unwrap(),
                Rule::remove_serde_tag_matching(".+").unwrap(),
            ],
        )
        .unwrap();

    for field in &handle.fields {
        assert!(!field.orm_tag.contains("type"));
        assert!(field.orm_tag.contains("column"));
        assert!(field.serde_tag.is_empty());
    }

    generator.execute(&registry).unwrap();
    let src = read(dir.path(), "campaign/campaign.rs");
    assert!(!src.contains("#[serde("));
    assert!(!src.contains("type = "));
}

#[test]
fn test_cross_package_relation_and_query_units() {
    let dir = tempfile::tempdir().unwrap();
    let config = GeneratorConfig {
        with_query_interface: true,
        with_context: true,
        ..make_config(dir.path())
    };
    let generator = make_generator(config);
    let mut registry = ModelRegistry::new();

    let source = generator
        .generate_model(&mut registry, "lookup.inventory_source", &[])
        .unwrap();
    generator
        .generate_model(
            &mut registry,
            "campaign.line_item",
            &[belongs_to("inventory_source", &source)],
        )
        .unwrap();
    let report = generator.execute(&registry).unwrap();
    assert!(report.is_success());

    let line_item_src = read(dir.path(), "campaign/line_item.rs");
    assert!(line_item_src.contains("use super::super::lookup::InventorySource;"));
    assert!(line_item_src.contains(r#"foreign_key = "inventory_source_id""#));

    let query_src = read(dir.path(), "query/line_item.rs");
    assert!(query_src.contains("use super::super::campaign::LineItem;"));
    assert!(query_src.contains("type Context;"));
    assert!(query_src.contains("fn find_by_id(&self, ctx: &Self::Context, id: i64)"));

    let root = read(dir.path(), "mod.rs");
    assert!(root.contains("pub mod lookup;\npub mod campaign;\npub mod query;"));
    assert!(!read(dir.path(), "query/mod.rs").contains("pub trait Query"));
}

#[test]
fn test_best_effort_and_fail_fast_with_broken_template() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("model.rs.j2");
    fs::write(
        &template,
        "{% if struct_name == \"Campaign\" %}{{ no_such_value }}{% endif %}pub struct {{ struct_name }};\n",
    )
    .unwrap();

    let out = dir.path().join("out");
    let config = GeneratorConfig {
        model_template: Some(template.clone()),
        ..make_config(&out)
    };
    let generator = make_generator(config.clone());
    let mut registry = ModelRegistry::new();
    for table in ["campaign.campaign", "campaign.line_item"] {
        generator.generate_model(&mut registry, table, &[]).unwrap();
    }

    let report = generator.execute(&registry).unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].artifact, "campaign::Campaign");
    assert_eq!(read(&out, "campaign/line_item.rs"), "pub struct LineItem;\n");
    assert!(!out.join("campaign/campaign.rs").exists());

    let fail_fast = make_generator(GeneratorConfig {
        render_mode: RenderMode::FailFast,
        output_dir: dir.path().join("strict"),
        ..config
    });
    let err = fail_fast.execute(&registry).unwrap_err();
    assert!(matches!(err, CodegenError::Render { .. }));
    assert!(!dir.path().join("strict/campaign/line_item.rs").exists());
}

#[test]
fn test_apply_basic_precondition() {
    let dir = tempfile::tempdir().unwrap();
    let generator = make_generator(make_config(dir.path()));
    let mut registry = ModelRegistry::new();
    let mut scratch = ModelRegistry::new();

    let campaign = generator
        .generate_model(&mut registry, "campaign.campaign", &[])
        .unwrap();
    let stray = generator
        .generate_model(&mut scratch, "lookup.inventory_source", &[])
        .unwrap();

    let err = generator
        .apply_basic(&registry, &[&campaign, &stray])
        .unwrap_err();
    assert!(matches!(err, CodegenError::UnregisteredRecord(_)));
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());

    let report = generator.apply_basic(&registry, &[&campaign]).unwrap();
    assert_eq!(report.rendered, vec!["campaign::Campaign"]);
}

#[test]
fn test_model_methods_rendered() {
    let dir = tempfile::tempdir().unwrap();
    let generator = make_generator(make_config(dir.path()));
    let mut registry = ModelRegistry::new();
    generator
        .generate_model_with_methods(
            &mut registry,
            "campaign.campaign",
            &[],
            vec![ModelMethod {
                doc: "Whether the campaign was soft-deleted".to_string(),
                name: "is_deleted".to_string(),
                receiver: "&self".to_string(),
                params: String::new(),
                returns: "bool".to_string(),
                body: "{ self.deleted_dtm.is_some() }".to_string(),
            }],
        )
        .unwrap();
    generator.execute(&registry).unwrap();

    let src = read(dir.path(), "campaign/campaign.rs");
    assert!(src.contains("/// Whether the campaign was soft-deleted"));
    assert!(src.contains("pub fn is_deleted(&self) -> bool { self.deleted_dtm.is_some() }"));
}

#[test]
fn test_generate_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = GeneratorConfig {
        tables: vec![
            TableSpec::new("campaign.campaign"),
            TableSpec::new("campaign.line_item").belongs_to("campaign.campaign"),
            TableSpec::new("campaign.flight"),
        ],
        rules: vec![RuleConfig::FieldType {
            column: Some("deleted_dtm".to_string()),
            pattern: None,
            ty: "DeletedAt".to_string(),
            import: Some("crate::types::DeletedAt".to_string()),
        }],
        field_with_index_tag: true,
        ..make_config(dir.path())
    };

    let report = modelgen::generate(&config).unwrap();
    assert_eq!(report.generated, vec!["campaign::Campaign", "campaign::LineItem"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].table, "campaign.flight");

    let campaign_src = read(dir.path(), "campaign/campaign.rs");
    assert!(campaign_src.contains("use crate::types::DeletedAt;"));
    assert!(campaign_src.contains("pub deleted_dtm: DeletedAt,"));
    assert!(campaign_src.contains(r#"unique_index = "name_unique""#));
    assert!(read(dir.path(), "campaign/line_item.rs").contains("pub campaign: Option<Campaign>,"));
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let config = GeneratorConfig {
        dry_run: true,
        with_query_interface: true,
        with_default_query: true,
        ..make_config(&out)
    };

    let report = modelgen::generate(&config).unwrap();
    assert!(report.execute.dry_run);
    assert!(report.execute.files.contains(&out.join("lookup/inventory_source.rs")));
    assert!(report.execute.files.contains(&out.join("query/mod.rs")));
    assert!(!out.exists());
}

#[test]
fn test_invalid_config_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let config = GeneratorConfig {
        tables: vec![
            TableSpec::new("campaign.line_item").belongs_to("campaign.campaign"),
            TableSpec::new("campaign.campaign"),
        ],
        ..make_config(dir.path())
    };
    assert!(matches!(
        modelgen::generate(&config),
        Err(CodegenError::ValidationError(_))
    ));
}
