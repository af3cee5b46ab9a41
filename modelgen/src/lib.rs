//! modelgen: Generate Rust model structs from relational schema metadata
//!
//! Table metadata comes from a [`introspect::SchemaIntrospector`] (the bundled
//! one reads SQL DDL with `sqlparser-rs`). Every table becomes a record whose
//! fields are shaped by an ordered list of rules (type overrides, tag edits,
//! comments and relations to records generated earlier), and every record is
//! rendered through `minijinja` into:
//!
//! - a model struct with `#[orm(...)]` and `#[serde(...)]` attributes per field
//! - optionally a query interface trait per record, plus an aggregate `Query`
//!
//! # Usage in build.rs (Recommended)
//!
//! Configure in your `Cargo.toml`:
//!
//! ```toml
//! [package.metadata.modelgen]
//! schema_file = "schema.sql"
//! output_dir = "src/generated"
//! tables = ["campaign.campaign", "campaign.line_item"]
//! ```
//!
//! Then use a minimal `build.rs`:
//!
//! ```rust,ignore
//! fn main() {
//!     modelgen::generate_from_cargo_metadata()
//!         .expect("Failed to generate models");
//! }
//! ```
//!
//! # Programmatic use
//!
//! ```rust,ignore
//! use modelgen::codegen::{belongs_to, Generator, ModelRegistry, Rule};
//! use modelgen::introspect::{DdlIntrospector, SqlDialect};
//!
//! let introspector = DdlIntrospector::from_file("schema.sql".as_ref(), SqlDialect::Postgres)?;
//! let generator = Generator::new(GeneratorConfig::default(), introspector)?;
//! let mut registry = ModelRegistry::new();
//!
//! let campaign = generator.generate_model(&mut registry, "campaign.campaign", &[])?;
//! generator.generate_model(
//!     &mut registry,
//!     "campaign.line_item",
//!     &[belongs_to("campaign", &campaign), Rule::field_type("deleted_dtm", "DeletedAt")],
//! )?;
//! generator.execute(&registry)?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! modelgen --schema schema.sql --output ./src/generated generate
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod introspect;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use codegen::{belongs_to, ExecuteReport, Generator, ModelRegistry, Rule};
pub use config::{GeneratorConfig, TableSpec};
pub use error::{CodegenError, Result};
use introspect::{DdlIntrospector, SchemaIntrospector, TableRef};

/// A table that could not be generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFailure {
    pub table: String,
    pub message: String,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Records registered, as `package::Name`, in order
    pub generated: Vec<String>,

    /// Tables skipped because introspection failed or a table they belong to
    /// failed
    pub failures: Vec<TableFailure>,

    pub execute: ExecuteReport,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.execute.is_success()
    }
}

/// Main entry point for code generation from a DDL schema file
pub fn generate(config: &GeneratorConfig) -> Result<RunReport> {
    config.validate()?;
    info!("Parsing schema: {:?}", config.schema_file);
    let introspector = DdlIntrospector::from_file(&config.schema_file, config.dialect)?;
    generate_with(config, introspector)
}

/// Generate the configured tables from any introspector.
///
/// A table whose introspection fails is skipped with a recorded failure, and
/// so is every table that belongs to it. Configuration errors abort the run.
pub fn generate_with(
    config: &GeneratorConfig,
    introspector: impl SchemaIntrospector + 'static,
) -> Result<RunReport> {
    let generator = Generator::new(config.clone(), introspector)?;

    let specs = if config.tables.is_empty() {
        let all: Vec<TableSpec> = generator
            .introspector()
            .tables()?
            .iter()
            .map(|t| TableSpec::new(&t.table_ref().qualified()))
            .collect();
        info!("No tables configured, generating all {}", all.len());
        all
    } else {
        config.tables.clone()
    };

    let mut report = RunReport::default();
    let mut registry = ModelRegistry::new();
    let mut failed: HashSet<String> = HashSet::new();

    for spec in &specs {
        let qualified = TableRef::parse(&spec.table).qualified();

        if let Some(target) = spec
            .belongs_to
            .iter()
            .find(|t| failed.contains(&TableRef::parse(t).qualified()))
        {
            warn!("Skipping {}: {} was not generated", spec.table, target);
            report.failures.push(TableFailure {
                table: spec.table.clone(),
                message: format!("depends on {}, which was not generated", target),
            });
            failed.insert(qualified);
            continue;
        }

        let result = relation_rules(&registry, spec)
            .and_then(|rules| generator.generate_model(&mut registry, &spec.table, &rules));
        match result {
            Ok(handle) => {
                debug!("Generated {} as {}::{}", spec.table, handle.package, handle.name);
                report
                    .generated
                    .push(format!("{}::{}", handle.package, handle.name));
            }
            Err(err) if err.is_isolated() => {
                warn!("Skipping {}: {}", spec.table, err);
                report.failures.push(TableFailure {
                    table: spec.table.clone(),
                    message: err.to_string(),
                });
                failed.insert(qualified);
            }
            Err(err) => return Err(err),
        }
    }

    report.execute = generator.execute(&registry)?;

    info!(
        "Code generation complete: {} record(s), {} failure(s)",
        report.generated.len(),
        report.failures.len() + report.execute.failures.len()
    );
    Ok(report)
}

/// Belongs-to rules for `spec`, against records already registered
fn relation_rules(registry: &ModelRegistry, spec: &TableSpec) -> Result<Vec<Rule>> {
    spec.belongs_to
        .iter()
        .map(|target| {
            let target_ref = TableRef::parse(target);
            let handle = registry
                .get_by_table(&target_ref.qualified())
                .ok_or_else(|| CodegenError::TableNotFound(target.clone()))?;
            Ok(belongs_to(&target_ref.name, handle))
        })
        .collect()
}

/// Builder pattern for easy configuration in build.rs
pub struct ModelgenBuilder {
    config: GeneratorConfig,
}

impl ModelgenBuilder {
    /// Create a new builder with the given schema file
    pub fn new(schema_file: impl AsRef<Path>) -> Self {
        Self {
            config: GeneratorConfig::default_with_schema(schema_file.as_ref().to_path_buf()),
        }
    }

    /// Set the output directory
    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Add a table to generate
    pub fn table(mut self, table: &str) -> Self {
        self.config.tables.push(TableSpec::new(table));
        self
    }

    /// Add a table that belongs to tables added before it
    pub fn table_belonging_to(mut self, table: &str, belongs_to: &[&str]) -> Self {
        let spec = belongs_to
            .iter()
            .fold(TableSpec::new(table), |spec, target| spec.belongs_to(target));
        self.config.tables.push(spec);
        self
    }

    /// Package for tables without a schema qualifier
    pub fn model_package(mut self, package: &str) -> Self {
        self.config.model_package = package.to_string();
        self
    }

    /// Generate query interface traits too
    pub fn with_query_interface(mut self) -> Self {
        self.config.with_query_interface = true;
        self
    }

    /// Generate query interface traits and the aggregate `Query` trait
    pub fn with_default_query(mut self) -> Self {
        self.config.with_query_interface = true;
        self.config.with_default_query = true;
        self
    }

    /// Add an import to every model file
    pub fn import(mut self, path: &str) -> Self {
        self.config.import_paths.push(path.to_string());
        self
    }

    /// Enable dry run mode (render without writing files)
    pub fn dry_run(mut self) -> Self {
        self.config.dry_run = true;
        self
    }

    /// Adjust anything the builder has no method for
    pub fn configure(mut self, f: impl FnOnce(&mut GeneratorConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate the code
    pub fn generate(self) -> Result<RunReport> {
        generate(&self.config)
    }
}

/// Configuration for `[package.metadata.modelgen]` in Cargo.toml
#[derive(Debug, Clone, Default, serde::Deserialize)]
struct CargoMetadataConfig {
    /// Path to the SQL schema file (required)
    schema_file: Option<String>,

    /// Output directory, relative to the manifest (defaults to OUT_DIR)
    output_dir: Option<String>,

    /// Tables to generate (optional, defaults to all)
    #[serde(default)]
    tables: Vec<String>,

    model_package: Option<String>,

    with_query_interface: Option<bool>,

    with_default_query: Option<bool>,

    /// Config file with the full settings, relative to the manifest
    config_file: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct CargoToml {
    package: Option<CargoPackage>,
}

#[derive(Debug, serde::Deserialize)]
struct CargoPackage {
    metadata: Option<CargoPackageMetadata>,
}

#[derive(Debug, serde::Deserialize)]
struct CargoPackageMetadata {
    modelgen: Option<CargoMetadataConfig>,
}

/// Generate code from `[package.metadata.modelgen]` in Cargo.toml
///
/// Keys given there override the ones from `config_file`.
pub fn generate_from_cargo_metadata() -> Result<RunReport> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").map_err(|_| {
        CodegenError::ConfigError(
            "CARGO_MANIFEST_DIR not set - are you running from build.rs?".into(),
        )
    })?;
    let manifest_dir = PathBuf::from(manifest_dir);

    let cargo_toml_path = manifest_dir.join("Cargo.toml");
    let cargo_toml_content = std::fs::read_to_string(&cargo_toml_path)?;

    let cargo_toml: CargoToml = toml::from_str(&cargo_toml_content).map_err(|e| {
        CodegenError::ConfigError(format!(
            "Failed to parse {}: {}",
            cargo_toml_path.display(),
            e
        ))
    })?;

    let metadata_config = cargo_toml
        .package
        .and_then(|p| p.metadata)
        .and_then(|m| m.modelgen)
        .ok_or_else(|| {
            CodegenError::ConfigError(
                "Missing [package.metadata.modelgen] section in Cargo.toml".into(),
            )
        })?;

    let mut config = match &metadata_config.config_file {
        Some(path) => {
            let path = manifest_dir.join(path);
            println!("cargo:rerun-if-changed={}", path.display());
            GeneratorConfig::from_file(&path)?
        }
        None => GeneratorConfig::default(),
    };

    if let Some(schema_file) = metadata_config.schema_file {
        config.schema_file = schema_file.into();
    }
    if config.schema_file.as_os_str().is_empty() {
        return Err(CodegenError::ConfigError(
            "schema_file is required in [package.metadata.modelgen]".into(),
        ));
    }
    // Resolve schema_file relative to manifest dir
    config.schema_file = manifest_dir.join(&config.schema_file);

    config.output_dir = match metadata_config.output_dir {
        Some(dir) => manifest_dir.join(dir),
        None => std::env::var("OUT_DIR").map(PathBuf::from).map_err(|_| {
            CodegenError::ConfigError("OUT_DIR not set - are you running from build.rs?".into())
        })?,
    };

    if !metadata_config.tables.is_empty() {
        config.tables = metadata_config
            .tables
            .iter()
            .map(|t| TableSpec::new(t))
            .collect();
    }
    if let Some(package) = metadata_config.model_package {
        config.model_package = package;
    }
    if let Some(enabled) = metadata_config.with_query_interface {
        config.with_query_interface = enabled;
    }
    if let Some(enabled) = metadata_config.with_default_query {
        config.with_default_query = enabled;
    }

    // Emit rerun-if-changed
    println!("cargo:rerun-if-changed={}", config.schema_file.display());
    println!("cargo:rerun-if-changed={}", cargo_toml_path.display());

    generate(&config)
}
