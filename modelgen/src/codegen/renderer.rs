//! Rendering of records into Rust source

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

use super::field::Field;
use super::naming::{to_attribute_key, to_table_const_name};
use super::registry::{ModelMethod, Record};
use super::tag::TagSet;
use super::template;
use crate::config::{RenderOptions, TableNameStrategy};
use crate::error::{CodegenError, Result};

/// Turns render contexts into source text
pub trait Renderer {
    fn render_model(&self, model: &ModelContext) -> Result<String>;

    fn render_query(&self, query: &QueryContext) -> Result<String>;

    fn render_query_index(&self, index: &QueryIndexContext) -> Result<String>;
}

/// Data handed to the model template
#[derive(Debug, Clone, Serialize)]
pub struct ModelContext {
    pub package: String,
    pub struct_name: String,
    pub imports: Vec<String>,
    pub table_const: Option<TableConst>,
    pub doc_lines: Vec<String>,
    pub derives: Vec<String>,
    pub fields: Vec<FieldContext>,
    pub methods: Vec<MethodContext>,
    pub with_tests: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableConst {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldContext {
    pub name: String,
    pub ty: String,
    /// Rendered attributes, e.g. `#[orm(column = "id")]`
    pub attributes: Vec<String>,
    pub comment: String,
    pub multiline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodContext {
    pub doc_lines: Vec<String>,
    pub name: String,
    pub params: String,
    pub returns: String,
    pub body: String,
}

/// Data handed to the query interface template
#[derive(Debug, Clone, Serialize)]
pub struct QueryContext {
    pub record_path: String,
    pub table: String,
    pub trait_name: String,
    pub with_context: bool,
    pub methods: Vec<QueryMethod>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryMethod {
    pub doc: String,
    pub name: String,
    pub params: Vec<String>,
    pub returns: String,
}

/// Data handed to the `query/mod.rs` template
#[derive(Debug, Clone, Serialize)]
pub struct QueryIndexContext {
    pub with_default_query: bool,
    pub units: Vec<QueryUnit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryUnit {
    pub module: String,
    pub trait_name: String,
    pub table: String,
}

impl ModelContext {
    /// Collect everything the model template needs from a record
    pub fn new(record: &Record, options: &RenderOptions) -> Self {
        Self {
            package: record.package.clone(),
            struct_name: record.name.clone(),
            imports: collect_imports(record, &options.import_paths),
            table_const: table_const(record, options.table_name_strategy),
            doc_lines: doc_lines(record),
            derives: derives(options),
            fields: record
                .fields
                .iter()
                .map(|f| FieldContext::new(f, options))
                .collect(),
            methods: record.methods.iter().map(MethodContext::new).collect(),
            with_tests: options.with_model_tests,
        }
    }
}

impl FieldContext {
    fn new(field: &Field, options: &RenderOptions) -> Self {
        let orm = if options.orm_derive.is_some() {
            format_attribute(&options.orm_attribute, &field.orm_tag)
        } else {
            format_inert_attribute(&options.orm_attribute, &field.orm_tag)
        };
        let attributes = [orm, format_attribute("serde", &field.serde_tag)]
        .into_iter()
        .flatten()
        .collect();

        let comment = if field.multiline_comment {
            field.column_comment.replace("/*", "/ *").replace("*/", "* /")
        } else {
            field.column_comment.replace(['\r', '\n'], " ")
        };

        Self {
            name: field.name.clone(),
            ty: field.ty.clone(),
            attributes,
            comment,
            multiline: field.multiline_comment,
        }
    }
}

impl MethodContext {
    fn new(method: &ModelMethod) -> Self {
        Self {
            doc_lines: method
                .doc
                .lines()
                .map(|line| doc_line(line))
                .collect(),
            name: method.name.clone(),
            params: method.signature_params(),
            returns: method.returns.clone(),
            body: method.body.clone(),
        }
    }
}

/// Global imports, record imports and field imports; sorted, no duplicates
pub fn collect_imports(record: &Record, global: &[String]) -> Vec<String> {
    let mut imports: Vec<String> = global
        .iter()
        .chain(record.imports.iter())
        .chain(record.fields.iter().filter_map(|f| f.import_path.as_ref()))
        .map(|path| path.trim().trim_start_matches("use ").trim_end_matches(';').to_string())
        .filter(|path| !path.is_empty())
        .collect();
    imports.sort();
    imports.dedup();
    imports
}

/// Configured derives, plus the ORM derive when one is set
fn derives(options: &RenderOptions) -> Vec<String> {
    let mut derives = options.derives.clone();
    if let Some(orm) = &options.orm_derive {
        if !derives.contains(orm) {
            derives.push(orm.clone());
        }
    }
    derives
}

fn table_const(record: &Record, strategy: TableNameStrategy) -> Option<TableConst> {
    let value = match strategy {
        TableNameStrategy::Qualified => record.qualified_table_name(),
        TableNameStrategy::Plain => record.table_name.clone(),
        TableNameStrategy::None => return None,
    };
    Some(TableConst {
        name: to_table_const_name(&record.name),
        value,
    })
}

fn doc_lines(record: &Record) -> Vec<String> {
    let mut lines = vec![doc_line(&format!(
        "{} maps table `{}`",
        record.name,
        record.qualified_table_name()
    ))];
    if !record.comment.trim().is_empty() {
        lines.push("///".to_string());
        lines.extend(record.comment.lines().map(doc_line));
    }
    lines
}

fn doc_line(text: &str) -> String {
    let text = text.trim_end();
    if text.is_empty() {
        "///".to_string()
    } else {
        format!("/// {}", text)
    }
}

/// Render a tag set as one attribute, e.g. `#[orm(column = "id", primary_key)]`.
///
/// Keys become snake_case; flag keys render bare; a key with several values
/// repeats. `None` for an empty tag set.
pub fn format_attribute(name: &str, tags: &TagSet) -> Option<String> {
    attribute_body(name, tags).map(|body| format!("#[{}]", body))
}

/// Like [`format_attribute`], wrapped in `cfg_attr(any(), ...)` so it compiles
/// without a derive that declares `name`.
pub fn format_inert_attribute(name: &str, tags: &TagSet) -> Option<String> {
    attribute_body(name, tags).map(|body| format!("#[cfg_attr(any(), {})]", body))
}

fn attribute_body(name: &str, tags: &TagSet) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    let parts: Vec<String> = tags
        .pairs()
        .into_iter()
        .map(|(key, value)| {
            let key = to_attribute_key(key);
            if value.is_empty() {
                key
            } else {
                format!("{} = {:?}", key, value)
            }
        })
        .collect();
    Some(format!("{}({})", name, parts.join(", ")))
}

/// Default renderer backed by minijinja
pub struct TemplateRenderer {
    env: Environment<'static>,
    validate_output: bool,
}

impl TemplateRenderer {
    /// Renderer with the built-in templates
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        // built-in templates are known to compile
        for (name, source) in [
            (template::MODEL_NAME, template::MODEL),
            (template::QUERY_NAME, template::QUERY),
            (template::QUERY_INDEX_NAME, template::QUERY_INDEX),
        ] {
            if let Err(err) = env.add_template(name, source) {
                tracing::error!("Built-in template {} failed to compile: {}", name, err);
            }
        }
        Self {
            env,
            validate_output: true,
        }
    }

    /// Replace the model template; syntax errors surface here, not at render time
    pub fn with_model_template(mut self, source: String) -> Result<Self> {
        self.env
            .add_template_owned(template::MODEL_NAME, source)
            .map_err(|e| {
                CodegenError::ConfigError(format!("Invalid model template: {}", e))
            })?;
        Ok(self)
    }

    /// Parse rendered model source with `syn` before accepting it
    pub fn validate_output(mut self, validate: bool) -> Self {
        self.validate_output = validate;
        self
    }

    fn render(&self, template_name: &str, artifact: &str, ctx: impl Serialize) -> Result<String> {
        let render_err = |message: String| CodegenError::Render {
            record: artifact.to_string(),
            message,
        };

        let tmpl = self
            .env
            .get_template(template_name)
            .map_err(|e| render_err(e.to_string()))?;
        let mut source = tmpl.render(ctx).map_err(|e| render_err(e.to_string()))?;
        if !source.ends_with('\n') {
            source.push('\n');
        }

        if self.validate_output {
            syn::parse_file(&source)
                .map_err(|e| render_err(format!("generated source does not parse: {}", e)))?;
        }
        Ok(source)
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TemplateRenderer {
    fn render_model(&self, model: &ModelContext) -> Result<String> {
        let artifact = format!("{}::{}", model.package, model.struct_name);
        self.render(template::MODEL_NAME, &artifact, model)
    }

    fn render_query(&self, query: &QueryContext) -> Result<String> {
        self.render(template::QUERY_NAME, &query.trait_name, query)
    }

    fn render_query_index(&self, index: &QueryIndexContext) -> Result<String> {
        self.render(template::QUERY_INDEX_NAME, "query/mod.rs", index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::naming::escape_field_name;
    use crate::codegen::tag::{TAG_COLUMN, TAG_INDEX, TAG_NOT_NULL, TAG_PRIMARY_KEY, TAG_RENAME};

    fn make_record() -> Record {
        let mut id = Field::new("id", "i64", "id");
        id.orm_tag.set_value(TAG_COLUMN, "id").set_flag(TAG_PRIMARY_KEY);
        id.serde_tag.set_value(TAG_RENAME, "id");

        let mut name = Field::new("name", "String", "name");
        name.orm_tag.set_value(TAG_COLUMN, "name").set_flag(TAG_NOT_NULL);
        name.set_comment("Display name");

        let mut notes = Field::new("notes", "Option<String>", "notes");
        notes.set_comment("First line\nSecond line");

        Record {
            package: "campaign".to_string(),
            name: "Campaign".to_string(),
            table_name: "campaign".to_string(),
            comment: "Advertising campaigns".to_string(),
            fields: vec![id, name, notes],
            imports: Vec::new(),
            methods: Vec::new(),
        }
    }

    #[test]
    fn test_format_attribute() {
        let mut tags = TagSet::new();
        tags.set_value(TAG_COLUMN, "id")
            .set_flag(TAG_NOT_NULL)
            .set(TAG_INDEX, ["idx_a", "idx_b"])
            .set_value("foreignKey", "campaign_id");
        assert_eq!(
            format_attribute("orm", &tags).unwrap(),
            r#"#[orm(column = "id", not_null, index = "idx_a", index = "idx_b", foreign_key = "campaign_id")]"#
        );
        assert!(format_attribute("serde", &TagSet::new()).is_none());
    }

    #[test]
    fn test_collect_imports_dedup() {
        let mut record = make_record();
        record.imports.push("crate::types::DeletedAt".to_string());
        record.fields[0].import_path = Some("crate::types::DeletedAt".to_string());
        let imports = collect_imports(
            &record,
            &["use std::collections::HashMap;".to_string(), "crate::types::DeletedAt".to_string()],
        );
        assert_eq!(
            imports,
            vec!["crate::types::DeletedAt".to_string(), "std::collections::HashMap".to_string()]
        );
    }

    #[test]
    fn test_render_model() {
        let renderer = TemplateRenderer::new();
        let ctx = ModelContext::new(&make_record(), &RenderOptions::default());
        let source = renderer.render_model(&ctx).unwrap();

        assert!(source.contains("pub struct Campaign {"));
        assert!(source.contains("pub const TABLE_NAME_CAMPAIGN: &str = \"campaign.campaign\";"));
        assert!(source.contains(r#"#[cfg_attr(any(), orm(column = "id", primary_key))]"#));
        assert!(source.contains(r#"#[serde(rename = "id")]"#));
        assert!(source.contains("pub name: String, // Display name"));
        assert!(source.contains("/*\nFirst line\nSecond line\n    */"));
        assert!(source.contains("pub notes: Option<String>,\n"));
        assert!(source.contains("/// Advertising campaigns"));
        assert!(source.contains("pub fn table_name() -> &'static str"));
    }

    #[test]
    fn test_orm_derive_enables_bare_attribute() {
        let options = RenderOptions {
            orm_derive: Some("my_orm::Model".to_string()),
            ..RenderOptions::default()
        };
        let source = TemplateRenderer::new()
            .render_model(&ModelContext::new(&make_record(), &options))
            .unwrap();
        assert!(source.contains(
            "#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, my_orm::Model)]"
        ));
        assert!(source.contains(r#"    #[orm(column = "id", primary_key)]"#));
        assert!(!source.contains("cfg_attr"));
    }

    #[test]
    fn test_block_comment_markers_are_neutralized() {
        let mut record = make_record();
        record.fields[2].set_comment("See /* legacy */ notes\nsecond line /* unbalanced");
        let source = TemplateRenderer::new()
            .render_model(&ModelContext::new(&record, &RenderOptions::default()))
            .unwrap();
        assert!(source.contains("See / * legacy * / notes\nsecond line / * unbalanced"));
    }

    #[test]
    fn test_keyword_field_names_render_valid_source() {
        let mut record = make_record();
        record.fields.push(Field::new(&escape_field_name("self"), "i64", "self"));
        record.fields.push(Field::new(&escape_field_name("type"), "Option<Type>", ""));
        let source = TemplateRenderer::new()
            .render_model(&ModelContext::new(&record, &RenderOptions::default()))
            .unwrap();
        assert!(source.contains("pub self_: i64,"));
        assert!(source.contains("pub r#type: Option<Type>,"));
    }

    #[test]
    fn test_render_without_table_const() {
        let renderer = TemplateRenderer::new();
        let options = RenderOptions {
            table_name_strategy: TableNameStrategy::None,
            ..RenderOptions::default()
        };
        let source = renderer
            .render_model(&ModelContext::new(&make_record(), &options))
            .unwrap();
        assert!(!source.contains("TABLE_NAME_"));
        assert!(!source.contains("impl Campaign"));
    }

    #[test]
    fn test_render_methods_and_tests() {
        let mut record = make_record();
        record.methods.push(ModelMethod {
            doc: "Whether the campaign has a name".to_string(),
            name: "has_name".to_string(),
            receiver: "&self".to_string(),
            params: String::new(),
            returns: "bool".to_string(),
            body: "{ !self.name.is_empty() }".to_string(),
        });
        let options = RenderOptions {
            with_model_tests: true,
            ..RenderOptions::default()
        };
        let source = TemplateRenderer::new()
            .render_model(&ModelContext::new(&record, &options))
            .unwrap();
        assert!(source.contains("/// Whether the campaign has a name"));
        assert!(source.contains("pub fn has_name(&self) -> bool { !self.name.is_empty() }"));
        assert!(source.contains("assert_eq!(Campaign::table_name(), \"campaign.campaign\");"));
    }

    #[test]
    fn test_template_data_mismatch_is_render_error() {
        let renderer = TemplateRenderer::new()
            .with_model_template("pub struct {{ no_such_field }};".to_string())
            .unwrap();
        let err = renderer
            .render_model(&ModelContext::new(&make_record(), &RenderOptions::default()))
            .unwrap_err();
        assert!(matches!(err, CodegenError::Render { .. }));
    }

    #[test]
    fn test_invalid_output_is_render_error() {
        let renderer = TemplateRenderer::new()
            .with_model_template("pub struct {{ struct_name }} {".to_string())
            .unwrap();
        let err = renderer
            .render_model(&ModelContext::new(&make_record(), &RenderOptions::default()))
            .unwrap_err();
        assert!(matches!(err, CodegenError::Render { .. }));

        let renderer = TemplateRenderer::new()
            .with_model_template("pub struct {{ struct_name }} {".to_string())
            .unwrap()
            .validate_output(false);
        assert!(renderer
            .render_model(&ModelContext::new(&make_record(), &RenderOptions::default()))
            .is_ok());
    }

    #[test]
    fn test_template_syntax_error_is_config_error() {
        let err = TemplateRenderer::new()
            .with_model_template("{% for x in %}".to_string())
            .err()
            .unwrap();
        assert!(matches!(err, CodegenError::ConfigError(_)));
    }
}
