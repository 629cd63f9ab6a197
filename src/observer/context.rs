use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::auth::Actor;
use crate::database::{Record, Store};
use crate::observer::error::{ObserverError, ObserverWarning};
use crate::observer::traits::ObserverRing;
use crate::resources::{ResourceSchema, SYSTEM_COLUMNS};
use crate::types::{Operation, Row};

/// State of one write as it flows through the observer pipeline
pub struct ObserverContext {
    pub operation: Operation,
    pub schema: &'static ResourceSchema,
    pub actor: Actor,
    pub store: Arc<dyn Store>,

    pub record: Record,

    /// Keys the caller supplied, as opposed to values observers derived
    pub submitted: BTreeSet<String>,

    /// Where-clause the stored row must still match at write time
    pub guard: Option<Value>,

    /// Stored row after Ring 5
    pub result: Option<Row>,

    pub start_time: Instant,
    pub current_ring: Option<ObserverRing>,

    pub errors: Vec<ObserverError>,
    pub warnings: Vec<ObserverWarning>,
}

impl ObserverContext {
    pub fn new(schema: &'static ResourceSchema, actor: Actor, store: Arc<dyn Store>, record: Record) -> Self {
        let submitted = record
            .written_keys()
            .into_iter()
            .filter(|k| !SYSTEM_COLUMNS.contains(&k.as_str()))
            .collect();
        Self {
            operation: record.operation(),
            schema,
            actor,
            store,
            record,
            submitted,
            guard: None,
            result: None,
            start_time: Instant::now(),
            current_ring: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Require the stored row to match `guard` when Ring 5 writes
    pub fn with_guard(mut self, guard: Value) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Observer-derived write; not counted as caller input
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.record.set(key, value);
        self
    }

    /// Status after this operation, falling back to the stored one
    pub fn status(&self) -> Option<&str> {
        self.record.get_str("status")
    }

    /// Whether this write moves `status` to `target`, on create or update
    pub fn enters_status(&self, target: &str) -> bool {
        match self.operation {
            Operation::Create => self.status() == Some(target),
            Operation::Update => self.record.changed("status") && self.status() == Some(target),
            Operation::Delete => false,
        }
    }

    pub fn add_warning(&mut self, observer: &str, message: String) {
        let ring = self.current_ring.unwrap_or(ObserverRing::Business);
        self.warnings.push(ObserverWarning::new(observer, ring, message));
    }

    /// Stored row after the write, or the merged record before it
    pub fn row(&self) -> Row {
        self.result.clone().unwrap_or_else(|| self.record.to_map())
    }

    /// Get total execution time
    pub fn execution_time(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}
