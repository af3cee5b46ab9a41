//! Naming conventions shared by the field builder, relations and renderers

use heck::{ToPascalCase, ToShoutySnakeCase, ToSnakeCase};

/// Convert a table name to a struct name (PascalCase)
pub fn to_struct_name(table_name: &str) -> String {
    table_name.to_pascal_case()
}

/// Convert a column name to a field name (snake_case)
pub fn to_field_name(column_name: &str) -> String {
    column_name.to_snake_case()
}

/// Query method keyed by columns
/// e.g., ("find", ["campaign_id", "line_item_id"]) -> "find_by_campaign_id_and_line_item_id"
pub fn by_columns_method_name(verb: &str, columns: &[String]) -> String {
    let parts: Vec<String> = columns.iter().map(|c| c.to_snake_case()).collect();
    format!("{}_by_{}", verb, parts.join("_and_"))
}

/// Name of the table-name constant for a struct, e.g. "LineItem" -> "TABLE_NAME_LINE_ITEM"
pub fn to_table_const_name(struct_name: &str) -> String {
    format!("TABLE_NAME_{}", struct_name.to_shouty_snake_case())
}

/// Module name for a package path segment ("campaign-v2" -> "campaign_v2")
pub fn to_module_name(package: &str) -> String {
    escape_field_name(package)
}

/// Convert a tag key to the form used inside a Rust attribute
/// e.g., "foreignKey" -> "foreign_key", "not null" -> "not_null"
pub fn to_attribute_key(key: &str) -> String {
    key.to_snake_case()
}

/// Check if a name is a Rust reserved keyword
pub fn is_rust_keyword(name: &str) -> bool {
    matches!(
        name,
        "as" | "async"
            | "await"
            | "break"
            | "const"
            | "continue"
            | "crate"
            | "dyn"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "self"
            | "Self"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "abstract"
            | "become"
            | "box"
            | "do"
            | "final"
            | "macro"
            | "override"
            | "priv"
            | "try"
            | "typeof"
            | "unsized"
            | "virtual"
            | "yield"
    )
}

/// Escape a field name if it's a Rust keyword.
///
/// Path keywords cannot be raw identifiers, so they get a trailing underscore.
pub fn escape_field_name(name: &str) -> String {
    let snake = name.to_snake_case();
    match snake.as_str() {
        "self" | "super" | "crate" | "Self" => format!("{}_", snake),
        s if is_rust_keyword(s) => format!("r#{}", snake),
        _ => snake,
    }
}

/// Directory of a module: its identifier without the raw prefix
pub fn to_module_dir(package: &str) -> String {
    let module = to_module_name(package);
    module.strip_prefix("r#").unwrap_or(&module).to_string()
}
