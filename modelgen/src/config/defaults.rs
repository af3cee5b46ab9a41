//! Default configuration values - single source of truth

/// Default output directory for generated modules
pub const OUTPUT_DIR: &str = "./generated";

/// Package used for tables without a schema qualifier
pub const MODEL_PACKAGE: &str = "model";

/// Attribute the ORM tags are rendered into
pub const ORM_ATTRIBUTE: &str = "orm";

/// Derives on every generated struct
pub const DERIVES: &[&str] = &["Debug", "Clone", "PartialEq", "Serialize", "Deserialize"];

/// Whether to generate query interface traits by default
pub const WITH_QUERY_INTERFACE: bool = false;

/// Whether query methods take a context argument by default
pub const WITH_CONTEXT: bool = false;

/// Whether to generate the aggregate `Query` trait by default
pub const WITH_DEFAULT_QUERY: bool = false;

/// Whether index membership becomes `index` / `uniqueIndex` tags
pub const FIELD_WITH_INDEX_TAG: bool = false;

/// Whether generated models carry a unit test module
pub const WITH_MODEL_TESTS: bool = false;

/// Whether nullable columns resolve to `Option<T>`
pub const NULLABLE_WRAPPERS: bool = true;

/// Whether rendered source is parsed before it is written
pub const VALIDATE_OUTPUT: bool = true;

/// Whether written files are passed through rustfmt
pub const FORMAT_OUTPUT: bool = true;

/// Whether to run in dry-run mode by default
pub const DRY_RUN: bool = false;

/// Config file looked up when none is given
pub const CONFIG_FILE: &str = "modelgen";

/// Prefix of environment overrides, e.g. `MODELGEN_DRY_RUN`
pub const ENV_PREFIX: &str = "MODELGEN";
