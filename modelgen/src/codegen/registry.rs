//! Registry of generated records for one generation run

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::field::Field;
use crate::error::{CodegenError, Result};

/// One generated data-structure definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Package (module) the record is emitted into
    pub package: String,

    /// Struct name
    pub name: String,

    pub table_name: String,

    pub comment: String,

    /// Column fields in column order, then injected relation fields
    pub fields: Vec<Field>,

    /// Extra import paths for this record only
    pub imports: Vec<String>,

    /// Extra methods rendered in an `impl` block
    pub methods: Vec<ModelMethod>,
}

impl Record {
    /// `package.table`
    pub fn qualified_table_name(&self) -> String {
        format!("{}.{}", self.package, self.table_name)
    }

    /// Fields tagged as primary key, in order
    pub fn primary_key_fields(&self) -> Vec<&Field> {
        self.fields.iter().filter(|f| f.is_primary_key()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A hand-written method attached to a generated record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMethod {
    /// Doc comment, without the leading `///`
    #[serde(default)]
    pub doc: String,

    pub name: String,

    /// Receiver, e.g. `&self`; empty for associated functions
    #[serde(default)]
    pub receiver: String,

    /// Parameter list without the receiver, e.g. `limit: usize`
    #[serde(default)]
    pub params: String,

    /// Return type; empty for `()`
    #[serde(default)]
    pub returns: String,

    /// Body including the surrounding braces
    pub body: String,
}

impl ModelMethod {
    /// Full parameter list including the receiver
    pub fn signature_params(&self) -> String {
        match (self.receiver.is_empty(), self.params.is_empty()) {
            (true, _) => self.params.clone(),
            (false, true) => self.receiver.clone(),
            (false, false) => format!("{}, {}", self.receiver, self.params),
        }
    }
}

/// Position of a record in its registry
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub usize);

/// Shared, immutable reference to a registered record
#[derive(Debug, Clone)]
pub struct RecordHandle {
    id: RecordId,
    record: Arc<Record>,
}

impl RecordHandle {
    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }
}

impl std::ops::Deref for RecordHandle {
    type Target = Record;

    fn deref(&self) -> &Record {
        &self.record
    }
}

/// Append-only list of the records of one run, in registration order.
///
/// A record has to be registered before anything can point a relation at it,
/// so registration order is also dependency order.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    records: Vec<RecordHandle>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze `record` and append it
    pub fn register(&mut self, record: Record) -> Result<RecordHandle> {
        if self
            .records
            .iter()
            .any(|h| h.package == record.package && h.name == record.name)
        {
            return Err(CodegenError::DuplicateRecord(format!(
                "{}::{}",
                record.package, record.name
            )));
        }

        let handle = RecordHandle {
            id: RecordId(self.records.len()),
            record: Arc::new(record),
        };
        debug!(
            "Registered {}::{} as #{}",
            handle.package, handle.name, handle.id.0
        );
        self.records.push(handle.clone());
        Ok(handle)
    }

    /// All records in registration order
    pub fn all(&self) -> &[RecordHandle] {
        &self.records
    }

    /// Look up by struct name
    pub fn get(&self, name: &str) -> Option<&RecordHandle> {
        self.records.iter().find(|h| h.name == name)
    }

    /// Look up by table, qualified (`campaign.line_item`) or bare
    pub fn get_by_table(&self, table: &str) -> Option<&RecordHandle> {
        self.records
            .iter()
            .find(|h| h.qualified_table_name() == table)
            .or_else(|| self.records.iter().find(|h| h.table_name == table))
    }

    /// Whether `handle` was issued by this registry
    pub fn contains(&self, handle: &RecordHandle) -> bool {
        self.records
            .get(handle.id.0)
            .is_some_and(|own| Arc::ptr_eq(&own.record, &handle.record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
