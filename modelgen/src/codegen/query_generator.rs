//! Query interface generator - one trait per record, plus the `query` module index

use std::collections::HashMap;

use super::naming::{by_columns_method_name, to_module_dir, to_module_name};
use super::registry::Record;
use super::renderer::{QueryContext, QueryIndexContext, QueryMethod, QueryUnit};

/// Module directory the query units are written to
pub const QUERY_MODULE: &str = "query";

/// Trait name for a record's query interface, e.g. "LineItem" -> "LineItemQuery"
pub fn query_trait_name(record: &Record) -> String {
    format!("{}Query", record.name)
}

/// Parameter type for a lookup argument of field type `ty`
pub fn to_param_type(ty: &str) -> String {
    match ty {
        "String" => "&str".to_string(),
        "Vec<u8>" => "&[u8]".to_string(),
        "Option<String>" => "Option<&str>".to_string(),
        "Option<Vec<u8>>" => "Option<&[u8]>".to_string(),
        other => other.to_string(),
    }
}

/// Build the query interface for one record.
///
/// Records without a primary key only get `find_all` and `create`.
pub fn build_query_context(record: &Record, with_context: bool) -> QueryContext {
    let struct_name = &record.name;
    let mut methods = Vec::new();

    let pk = record.primary_key_fields();
    let pk_columns: Vec<String> = pk.iter().map(|f| f.column_name.clone()).collect();
    let pk_params: Vec<String> = pk
        .iter()
        .map(|f| format!("{}: {}", f.name, to_param_type(&f.ty)))
        .collect();

    if !pk.is_empty() {
        methods.push(QueryMethod {
            doc: "Find by primary key".to_string(),
            name: by_columns_method_name("find", &pk_columns),
            params: pk_params.clone(),
            returns: format!("Option<{}>", struct_name),
        });
    }

    methods.push(QueryMethod {
        doc: format!("Find all rows of `{}`", record.table_name),
        name: "find_all".to_string(),
        params: Vec::new(),
        returns: format!("Vec<{}>", struct_name),
    });

    methods.push(QueryMethod {
        doc: "Insert a record, returning the number of affected rows".to_string(),
        name: "create".to_string(),
        params: vec![format!("record: &{}", struct_name)],
        returns: "u64".to_string(),
    });

    if !pk.is_empty() {
        methods.push(QueryMethod {
            doc: "Delete by primary key".to_string(),
            name: by_columns_method_name("delete", &pk_columns),
            params: pk_params,
            returns: "u64".to_string(),
        });
    }

    QueryContext {
        record_path: format!(
            "super::super::{}::{}",
            to_module_name(&record.package),
            struct_name
        ),
        table: record.qualified_table_name(),
        trait_name: query_trait_name(record),
        with_context,
        methods,
    }
}

/// Query module name for each record, given its model file stem.
///
/// Stems are unique within a package but not across packages; a stem used by
/// more than one package is prefixed with the package.
pub fn query_module_names(records: &[(&Record, String)]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (_, stem) in records {
        *counts.entry(stem.as_str()).or_default() += 1;
    }

    records
        .iter()
        .map(|(record, stem)| {
            if counts.get(stem.as_str()).copied().unwrap_or_default() > 1 {
                format!("{}_{}", to_module_dir(&record.package), stem)
            } else {
                stem.clone()
            }
        })
        .collect()
}

/// Index of every query unit, in registration order
pub fn build_query_index(units: Vec<QueryUnit>, with_default_query: bool) -> QueryIndexContext {
    QueryIndexContext {
        with_default_query,
        units,
    }
}
