//! Code generation module

mod field;
mod generator;
mod naming;
mod query_generator;
mod registry;
mod relation;
mod renderer;
mod rule;
mod tag;
pub mod template;
mod type_resolver;

pub use field::*;
pub use generator::*;
pub use naming::*;
pub use query_generator::*;
pub use registry::*;
pub use relation::*;
pub use renderer::*;
pub use rule::*;
pub use tag::*;
pub use type_resolver::*;

use std::path::Path;

/// Best-effort rustfmt on a generated file.
pub(crate) fn format_file(path: &Path) {
    let _ = std::process::Command::new("rustfmt").arg(path).status();
}
