//! Configuration settings for modelgen

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::defaults;
use super::rules::{compile_rules, RuleConfig};
use crate::codegen::{is_rust_keyword, BuildOptions, Rule, QUERY_MODULE};
use crate::error::{CodegenError, Result};
use crate::introspect::{SqlDialect, TableRef};

/// How model file names are derived from table names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileNameStrategy {
    /// `LineItems` -> `line_items.rs`
    #[default]
    Snake,
    /// File named exactly like the table
    Verbatim,
}

/// What the generated `TABLE_NAME_*` constant holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableNameStrategy {
    /// `package.table`
    #[default]
    Qualified,
    /// `table`
    Plain,
    /// No constant and no `table_name()`
    None,
}

/// What `execute` does when one artifact fails to render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Return the first render error
    FailFast,
    /// Record the failure and keep rendering the rest
    #[default]
    BestEffort,
}

/// One table to generate, with the tables it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// `schema.table` or `table`
    pub table: String,

    /// Tables this one holds a foreign key to; each must be listed earlier
    #[serde(default)]
    pub belongs_to: Vec<String>,
}

impl TableSpec {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            belongs_to: Vec::new(),
        }
    }

    pub fn belongs_to(mut self, table: &str) -> Self {
        self.belongs_to.push(table.to_string());
        self
    }
}

/// Everything the renderer needs from the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub import_paths: Vec<String>,
    pub derives: Vec<String>,
    pub orm_attribute: String,
    pub orm_derive: Option<String>,
    pub table_name_strategy: TableNameStrategy,
    pub with_model_tests: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            import_paths: Vec::new(),
            derives: default_derives(),
            orm_attribute: default_orm_attribute(),
            orm_derive: None,
            table_name_strategy: TableNameStrategy::default(),
            with_model_tests: defaults::WITH_MODEL_TESTS,
        }
    }
}

/// Main configuration struct for code generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Path to the SQL schema file
    #[serde(default)]
    pub schema_file: PathBuf,

    /// SQL dialect of the schema file
    #[serde(default)]
    pub dialect: SqlDialect,

    /// Root directory of the generated modules
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Package for tables without a schema qualifier
    #[serde(default = "default_model_package")]
    pub model_package: String,

    /// Tables to generate, in order; empty means every table in the schema
    #[serde(default)]
    pub tables: Vec<TableSpec>,

    /// Rules applied to every table, after its own rules
    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    /// Generate a query interface trait per record
    #[serde(default = "default_with_query_interface")]
    pub with_query_interface: bool,

    /// Query methods take a `ctx: &Self::Context` argument
    #[serde(default = "default_with_context")]
    pub with_context: bool,

    /// Generate the aggregate `Query` trait and `TABLES` list
    #[serde(default = "default_with_default_query")]
    pub with_default_query: bool,

    /// Emit `index` / `uniqueIndex` tags from column indexes
    #[serde(default = "default_field_with_index_tag")]
    pub field_with_index_tag: bool,

    /// Emit a unit test module in every model file
    #[serde(default = "default_with_model_tests")]
    pub with_model_tests: bool,

    /// Resolve nullable columns to `Option<T>`
    #[serde(default = "default_nullable_wrappers")]
    pub nullable_wrappers: bool,

    #[serde(default)]
    pub file_name_strategy: FileNameStrategy,

    #[serde(default)]
    pub table_name_strategy: TableNameStrategy,

    /// Imports added to every model file
    #[serde(default)]
    pub import_paths: Vec<String>,

    /// Derives on every struct
    #[serde(default = "default_derives")]
    pub derives: Vec<String>,

    /// Attribute name of the ORM tags
    #[serde(default = "default_orm_attribute")]
    pub orm_attribute: String,

    /// Derive that declares `orm_attribute` as a helper, e.g. `my_orm::Model`.
    /// Without one the ORM tags are emitted behind `cfg_attr(any(), ...)`,
    /// which keeps them in the source but out of the compiler's way.
    #[serde(default)]
    pub orm_derive: Option<String>,

    #[serde(default)]
    pub render_mode: RenderMode,

    /// Replacement for the built-in model template
    #[serde(default)]
    pub model_template: Option<PathBuf>,

    /// Parse rendered source with syn before writing it
    #[serde(default = "default_validate_output")]
    pub validate_output: bool,

    /// Run rustfmt on written files
    #[serde(default = "default_format_output")]
    pub format_output: bool,

    /// Dry run mode - render but write nothing
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    /// Can be overridden by RUST_LOG env var
    #[serde(default)]
    pub log_level: Option<String>,
}

// Default value functions for serde
fn default_output_dir() -> PathBuf {
    PathBuf::from(defaults::OUTPUT_DIR)
}
fn default_model_package() -> String {
    defaults::MODEL_PACKAGE.to_string()
}
fn default_with_query_interface() -> bool {
    defaults::WITH_QUERY_INTERFACE
}
fn default_with_context() -> bool {
    defaults::WITH_CONTEXT
}
fn default_with_default_query() -> bool {
    defaults::WITH_DEFAULT_QUERY
}
fn default_field_with_index_tag() -> bool {
    defaults::FIELD_WITH_INDEX_TAG
}
fn default_with_model_tests() -> bool {
    defaults::WITH_MODEL_TESTS
}
fn default_nullable_wrappers() -> bool {
    defaults::NULLABLE_WRAPPERS
}
fn default_derives() -> Vec<String> {
    defaults::DERIVES.iter().map(|d| d.to_string()).collect()
}
fn default_orm_attribute() -> String {
    defaults::ORM_ATTRIBUTE.to_string()
}
fn default_validate_output() -> bool {
    defaults::VALIDATE_OUTPUT
}
fn default_format_output() -> bool {
    defaults::FORMAT_OUTPUT
}
fn default_dry_run() -> bool {
    defaults::DRY_RUN
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            schema_file: PathBuf::new(),
            dialect: SqlDialect::default(),
            output_dir: default_output_dir(),
            model_package: default_model_package(),
            tables: Vec::new(),
            rules: Vec::new(),
            with_query_interface: default_with_query_interface(),
            with_context: default_with_context(),
            with_default_query: default_with_default_query(),
            field_with_index_tag: default_field_with_index_tag(),
            with_model_tests: default_with_model_tests(),
            nullable_wrappers: default_nullable_wrappers(),
            file_name_strategy: FileNameStrategy::default(),
            table_name_strategy: TableNameStrategy::default(),
            import_paths: Vec::new(),
            derives: default_derives(),
            orm_attribute: default_orm_attribute(),
            orm_derive: None,
            render_mode: RenderMode::default(),
            model_template: None,
            validate_output: default_validate_output(),
            format_output: default_format_output(),
            dry_run: default_dry_run(),
            log_level: None,
        }
    }
}

impl GeneratorConfig {
    /// Create a default config with the given schema file
    pub fn default_with_schema(schema_file: PathBuf) -> Self {
        Self {
            schema_file,
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GeneratorConfig = toml::from_str(&content).map_err(|e| {
            CodegenError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(config)
    }

    /// Load configuration using config-rs (file + environment variables)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        } else {
            builder = builder.add_source(File::with_name(defaults::CONFIG_FILE).required(false));
        }

        // MODELGEN_DRY_RUN=true, MODELGEN_OUTPUT_DIR=...
        builder = builder.add_source(
            Environment::with_prefix(defaults::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: GeneratorConfig = builder.build()?.try_deserialize()?;

        Ok(config)
    }

    /// Validate everything, including that the schema file exists
    pub fn validate(&self) -> Result<()> {
        if self.schema_file.as_os_str().is_empty() {
            return Err(CodegenError::ValidationError(
                "schema_file is required".into(),
            ));
        }

        if !self.schema_file.exists() {
            return Err(CodegenError::ValidationError(format!(
                "Schema file not found: {}",
                self.schema_file.display()
            )));
        }

        self.validate_options()
    }

    /// Validate the generation options; the schema source is not checked
    pub fn validate_options(&self) -> Result<()> {
        if self.with_default_query && !self.with_query_interface {
            return Err(CodegenError::ValidationError(
                "with_query_interface must be true when with_default_query is true".into(),
            ));
        }

        if self.model_package.is_empty() {
            return Err(CodegenError::ValidationError(
                "model_package must not be empty".into(),
            ));
        }

        if !is_identifier(&self.orm_attribute) {
            return Err(CodegenError::ValidationError(format!(
                "orm_attribute `{}` is not a valid attribute name",
                self.orm_attribute
            )));
        }

        if let Some(derive) = &self.orm_derive {
            if !derive.split("::").all(is_identifier) {
                return Err(CodegenError::ValidationError(format!(
                    "orm_derive `{}` is not a valid path",
                    derive
                )));
            }
        }

        for (i, spec) in self.tables.iter().enumerate() {
            let earlier: Vec<String> = self.tables[..i]
                .iter()
                .map(|t| TableRef::parse(&t.table).qualified())
                .collect();
            for target in &spec.belongs_to {
                if !earlier.contains(&TableRef::parse(target).qualified()) {
                    return Err(CodegenError::ValidationError(format!(
                        "{} belongs to {}, which must be listed before it in tables",
                        spec.table, target
                    )));
                }
            }
        }

        if self.with_query_interface {
            let clash = std::iter::once(self.model_package.clone())
                .chain(self.tables.iter().filter_map(|t| TableRef::parse(&t.table).schema))
                .any(|package| package == QUERY_MODULE);
            if clash {
                return Err(CodegenError::ValidationError(format!(
                    "package `{}` is reserved for the query interface",
                    QUERY_MODULE
                )));
            }
        }

        if let Some(template) = &self.model_template {
            if !template.exists() {
                return Err(CodegenError::ValidationError(format!(
                    "Model template not found: {}",
                    template.display()
                )));
            }
        }

        self.compile_rules().map(|_| ())
    }

    /// Rules from the config file, compiled
    pub fn compile_rules(&self) -> Result<Vec<Rule>> {
        compile_rules(&self.rules)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            import_paths: self.import_paths.clone(),
            derives: self.derives.clone(),
            orm_attribute: self.orm_attribute.clone(),
            orm_derive: self.orm_derive.clone(),
            table_name_strategy: self.table_name_strategy,
            with_model_tests: self.with_model_tests,
        }
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            field_with_index_tag: self.field_with_index_tag,
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name != "_"
        && !is_rust_keyword(name)
}
