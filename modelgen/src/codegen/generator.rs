//! Generator - ties introspection, the field builder, the registry and the
//! renderer together

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use super::field;
use super::naming::{to_field_name, to_module_dir, to_module_name};
use super::query_generator::{
    build_query_context, build_query_index, query_module_names, query_trait_name, QUERY_MODULE,
};
use super::registry::{ModelMethod, ModelRegistry, Record, RecordHandle};
use super::renderer::{ModelContext, QueryUnit, Renderer, TemplateRenderer};
use super::rule::Rule;
use super::type_resolver::TypeResolver;
use crate::config::{FileNameStrategy, GeneratorConfig, RenderMode};
use crate::error::{CodegenError, Result};
use crate::introspect::{SchemaIntrospector, TableRef};

const GENERATED_HEADER: &str = "// Code generated by modelgen. DO NOT EDIT.\n";

/// An artifact that failed to render or write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFailure {
    /// Record (`package::Name`) or file the failure belongs to
    pub artifact: String,
    pub message: String,
}

/// Outcome of `execute` / `apply_basic`
#[derive(Debug, Clone, Default)]
pub struct ExecuteReport {
    /// Files written, or that would be written in dry-run mode
    pub files: Vec<PathBuf>,

    /// Records whose model unit rendered
    pub rendered: Vec<String>,

    /// Failures recorded in best-effort mode
    pub failures: Vec<RenderFailure>,

    pub dry_run: bool,
}

impl ExecuteReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A module declared in a generated `mod.rs`
struct ModuleEntry {
    module: String,
    file_stem: String,
    export: String,
}

/// Turns table metadata into registered records, and registered records into
/// source files.
pub struct Generator {
    config: GeneratorConfig,
    config_rules: Vec<Rule>,
    resolver: TypeResolver,
    introspector: Box<dyn SchemaIntrospector>,
    renderer: Box<dyn Renderer>,
}

impl Generator {
    /// Validate `config` and set up the default resolver and renderer
    pub fn new(
        config: GeneratorConfig,
        introspector: impl SchemaIntrospector + 'static,
    ) -> Result<Self> {
        config.validate_options()?;
        let config_rules = config.compile_rules()?;

        let resolver = if config.nullable_wrappers {
            TypeResolver::with_nullable_wrappers()
        } else {
            TypeResolver::new()
        };

        let mut renderer = TemplateRenderer::new().validate_output(config.validate_output);
        if let Some(path) = &config.model_template {
            let source = fs::read_to_string(path)?;
            renderer = renderer.with_model_template(source)?;
            debug!("Using model template {}", path.display());
        }

        Ok(Self {
            config,
            config_rules,
            resolver,
            introspector: Box::new(introspector),
            renderer: Box::new(renderer),
        })
    }

    /// Replace the type resolver
    pub fn with_resolver(mut self, resolver: TypeResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the renderer
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn introspector(&self) -> &dyn SchemaIntrospector {
        self.introspector.as_ref()
    }

    /// Introspect `table`, build its record with `rules` followed by the
    /// config rules, and register it.
    ///
    /// On failure nothing is registered.
    pub fn generate_model(
        &self,
        registry: &mut ModelRegistry,
        table: &str,
        rules: &[Rule],
    ) -> Result<RecordHandle> {
        self.generate_model_with_methods(registry, table, rules, Vec::new())
    }

    /// Like `generate_model`, attaching extra methods to the record
    pub fn generate_model_with_methods(
        &self,
        registry: &mut ModelRegistry,
        table: &str,
        rules: &[Rule],
        methods: Vec<ModelMethod>,
    ) -> Result<RecordHandle> {
        let mut record = self.build_record(table, rules)?;
        record.methods = methods;
        registry.register(record)
    }

    /// Introspect and build without registering
    pub fn build_record(&self, table: &str, rules: &[Rule]) -> Result<Record> {
        let table_ref = TableRef::parse(table);
        let schema = self
            .introspector
            .table(&table_ref)
            .map_err(|err| match err {
                CodegenError::Introspection { .. } | CodegenError::TableNotFound(_) => err,
                other => CodegenError::Introspection {
                    table: table_ref.qualified(),
                    message: other.to_string(),
                },
            })?;

        let package = schema
            .schema
            .clone()
            .unwrap_or_else(|| self.config.model_package.clone());

        // config rules run last so they also reach injected relation fields
        let all_rules: Vec<Rule> = rules
            .iter()
            .chain(self.config_rules.iter())
            .cloned()
            .collect();

        Ok(field::build(
            &schema,
            &package,
            &self.resolver,
            &self.config.build_options(),
            &all_rules,
        ))
    }

    /// Render every registered record, in registration order
    pub fn execute(&self, registry: &ModelRegistry) -> Result<ExecuteReport> {
        info!("Rendering {} record(s)", registry.len());
        self.render_records(registry.all().iter().collect())
    }

    /// Render only `handles`.
    ///
    /// Every handle must come from `registry`; otherwise nothing is rendered.
    /// A handle listed twice is rendered once.
    pub fn apply_basic(
        &self,
        registry: &ModelRegistry,
        handles: &[&RecordHandle],
    ) -> Result<ExecuteReport> {
        if let Some(foreign) = handles.iter().find(|h| !registry.contains(h)) {
            return Err(CodegenError::UnregisteredRecord(format!(
                "{}::{}",
                foreign.package, foreign.name
            )));
        }

        let mut seen = HashSet::new();
        let unique: Vec<&RecordHandle> = handles
            .iter()
            .copied()
            .filter(|h| seen.insert(h.id()))
            .collect();
        info!("Rendering {} of {} record(s)", unique.len(), registry.len());
        self.render_records(unique)
    }

    fn render_records(&self, handles: Vec<&RecordHandle>) -> Result<ExecuteReport> {
        let mut report = ExecuteReport {
            dry_run: self.config.dry_run,
            ..Default::default()
        };
        let options = self.config.render_options();
        let out = &self.config.output_dir;

        let stems: Vec<(&Record, String)> = handles
            .iter()
            .map(|h| (h.record(), self.file_stem(h.record())))
            .collect();
        let query_modules = query_module_names(&stems);

        let mut packages: IndexMap<String, Vec<ModuleEntry>> = IndexMap::new();
        let mut query_units: Vec<QueryUnit> = Vec::new();

        for ((record, stem), query_module) in stems.iter().zip(query_modules) {
            let artifact = format!("{}::{}", record.package, record.name);
            let package_dir = to_module_dir(&record.package);

            let ctx = ModelContext::new(record, &options);
            let source = match self.renderer.render_model(&ctx) {
                Ok(source) => source,
                Err(err) => {
                    self.record_failure(&mut report, &artifact, err)?;
                    continue;
                }
            };
            let path = out.join(&package_dir).join(format!("{}.rs", stem));
            self.emit(&path, &source, &mut report)?;
            report.rendered.push(artifact.clone());

            packages
                .entry(package_dir)
                .or_default()
                .push(ModuleEntry {
                    module: to_field_name(stem),
                    file_stem: stem.clone(),
                    export: record.name.clone(),
                });

            if self.config.with_query_interface {
                let query = build_query_context(record, self.config.with_context);
                match self.renderer.render_query(&query) {
                    Ok(source) => {
                        let path = out.join(QUERY_MODULE).join(format!("{}.rs", query_module));
                        self.emit(&path, &source, &mut report)?;
                        query_units.push(QueryUnit {
                            module: query_module,
                            trait_name: query_trait_name(record),
                            table: record.qualified_table_name(),
                        });
                    }
                    Err(err) => self.record_failure(&mut report, &query.trait_name, err)?,
                }
            }
        }

        for (package_dir, entries) in &packages {
            let path = out.join(package_dir).join("mod.rs");
            self.emit(&path, &package_mod(entries), &mut report)?;
        }

        let mut root_modules: Vec<String> = packages.keys().cloned().collect();
        if !query_units.is_empty() {
            let index = build_query_index(query_units, self.config.with_default_query);
            match self.renderer.render_query_index(&index) {
                Ok(source) => {
                    let path = out.join(QUERY_MODULE).join("mod.rs");
                    self.emit(&path, &source, &mut report)?;
                    root_modules.push(QUERY_MODULE.to_string());
                }
                Err(err) => self.record_failure(&mut report, "query/mod.rs", err)?,
            }
        }

        if !root_modules.is_empty() {
            self.emit(&out.join("mod.rs"), &root_mod(&root_modules), &mut report)?;
        }

        info!(
            "Rendered {} record(s), {} file(s), {} failure(s)",
            report.rendered.len(),
            report.files.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// File stem of a record's model unit
    fn file_stem(&self, record: &Record) -> String {
        match self.config.file_name_strategy {
            FileNameStrategy::Snake => to_field_name(&record.table_name),
            FileNameStrategy::Verbatim => record.table_name.clone(),
        }
    }

    fn record_failure(
        &self,
        report: &mut ExecuteReport,
        artifact: &str,
        err: CodegenError,
    ) -> Result<()> {
        match self.config.render_mode {
            RenderMode::FailFast => Err(err),
            RenderMode::BestEffort => {
                warn!("Skipping {}: {}", artifact, err);
                report.failures.push(RenderFailure {
                    artifact: artifact.to_string(),
                    message: err.to_string(),
                });
                Ok(())
            }
        }
    }

    fn emit(&self, path: &Path, content: &str, report: &mut ExecuteReport) -> Result<()> {
        if self.config.dry_run {
            debug!("Would write {}", path.display());
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
            if self.config.format_output {
                super::format_file(path);
            }
            debug!("Wrote {}", path.display());
        }
        report.files.push(path.to_path_buf());
        Ok(())
    }
}

/// `mod.rs` of one package: every unit, re-exported
fn package_mod(entries: &[ModuleEntry]) -> String {
    let mut content = String::from(GENERATED_HEADER);
    content.push('\n');
    for entry in entries {
        let module_ident = to_module_name(&entry.module);
        if entry.file_stem != to_module_dir(&entry.module) {
            content.push_str(&format!("#[path = \"{}.rs\"]\n", entry.file_stem));
        }
        content.push_str(&format!("mod {};\n", module_ident));
        content.push_str(&format!("pub use {}::{};\n", module_ident, entry.export));
    }
    content
}

fn root_mod(modules: &[String]) -> String {
    let mut content = String::from(GENERATED_HEADER);
    content.push('\n');
    for module in modules {
        content.push_str(&format!("pub mod {};\n", to_module_name(module)));
    }
    content
}
