// file: src/catalog/mod.rs
// version: 1.0.0
// guid: dffc5c7b-a3ba-4487-8115-90cedb52b347

//! Hardware telemetry catalog persistence

use crate::Result;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One record produced by a command parser
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedRecord {
    /// Whether the parser considers the record worth keeping
    #[serde(default)]
    pub store: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Present when the command or its parsing failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl ParsedRecord {
    fn is_storable(&self) -> bool {
        self.store && self.error.is_none()
    }
}

/// Persisted catalog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub node: String,
    pub source: Option<String>,
    pub data: Value,
}

/// Datastore collection holding catalog entries
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create(&self, entry: CatalogEntry) -> Result<()>;
}

/// Selects the parsed records worth retaining and persists them for a node
pub struct CatalogFilter<'a> {
    store: &'a dyn CatalogStore,
}

impl<'a> CatalogFilter<'a> {
    pub fn new(store: &'a dyn CatalogStore) -> Self {
        Self { store }
    }

    /// Persist every storable record, returning how many were written.
    ///
    /// Writes run concurrently; the first failure is returned as-is.
    pub async fn persist(&self, node_id: &str, records: Vec<ParsedRecord>) -> Result<usize> {
        let writes: Vec<_> = records
            .into_iter()
            .filter(ParsedRecord::is_storable)
            .map(|record| CatalogEntry {
                node: node_id.to_string(),
                source: record.source,
                data: record.data.unwrap_or(Value::Null),
            })
            .map(|entry| self.store.create(entry))
            .collect();

        Ok(try_join_all(writes).await?.len())
    }
}
