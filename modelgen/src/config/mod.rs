//! Generator configuration: defaults, settings and declarative rules

pub mod defaults;
mod rules;
mod settings;

pub use rules::*;
pub use settings::*;
