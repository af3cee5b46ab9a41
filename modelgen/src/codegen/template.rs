//! Built-in templates. Rendered with `trim_blocks` and `lstrip_blocks`, so a
//! block tag on its own line leaves no trace in the output.

/// Template name of the model unit
pub const MODEL_NAME: &str = "model.rs";

/// Template name of a per-record query interface
pub const QUERY_NAME: &str = "query.rs";

/// Template name of the query module index
pub const QUERY_INDEX_NAME: &str = "query_mod.rs";

/// One model struct per unit
pub const MODEL: &str = r#"// Code generated by modelgen. DO NOT EDIT.

use serde::{Deserialize, Serialize};
{% for import in imports %}
use {{ import }};
{% endfor %}
{% if table_const %}

pub const {{ table_const.name }}: &str = "{{ table_const.value }}";
{% endif %}

{% for line in doc_lines %}
{{ line }}
{% endfor %}
#[derive({{ derives | join(", ") }})]
pub struct {{ struct_name }} {
{% for field in fields %}
{% if field.multiline %}
    /*
{{ field.comment }}
    */
{% endif %}
{% for attr in field.attributes %}
    {{ attr }}
{% endfor %}
    pub {{ field.name }}: {{ field.ty }},{{ " // " ~ field.comment if (not field.multiline and field.comment) else "" }}
{% endfor %}
}
{% if table_const or methods %}

impl {{ struct_name }} {
{% if table_const %}
    /// Table this struct maps to
    pub fn table_name() -> &'static str {
        {{ table_const.name }}
    }
{% endif %}
{% for method in methods %}

{% for line in method.doc_lines %}
    {{ line }}
{% endfor %}
    pub fn {{ method.name }}({{ method.params }}){{ " -> " ~ method.returns if method.returns else "" }} {{ method.body }}
{% endfor %}
}
{% endif %}
{% if with_tests and table_const %}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name() {
        assert_eq!({{ struct_name }}::table_name(), "{{ table_const.value }}");
    }
}
{% endif %}
"#;

/// Query interface trait for one record
pub const QUERY: &str = r#"// Code generated by modelgen. DO NOT EDIT.

use {{ record_path }};

/// Query interface for `{{ table }}`
pub trait {{ trait_name }} {
    type Error;
{% if with_context %}
    type Context;
{% endif %}
{% for method in methods %}

    /// {{ method.doc }}
    fn {{ method.name }}(&self{{ ", ctx: &Self::Context" if with_context else "" }}{% for param in method.params %}, {{ param }}{% endfor %}) -> Result<{{ method.returns }}, Self::Error>;
{% endfor %}
}
"#;

/// `query/mod.rs`, with the default query helpers when enabled
pub const QUERY_INDEX: &str = r#"// Code generated by modelgen. DO NOT EDIT.

{% for unit in units %}
mod {{ unit.module }};
pub use {{ unit.module }}::{{ unit.trait_name }};
{% endfor %}
{% if with_default_query and units %}

/// Every generated table, in generation order
pub const TABLES: &[&str] = &[
{% for unit in units %}
    "{{ unit.table }}",
{% endfor %}
];

/// All generated query interfaces behind a single bound
pub trait Query:
{% for unit in units %}
    {{ unit.trait_name }}{{ " +" if not loop.last else "" }}
{% endfor %}
{
}

impl<T> Query for T where
{% for unit in units %}
    T: {{ unit.trait_name }},
{% endfor %}
{
}
{% endif %}
"#;
