use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::resources::SYSTEM_COLUMNS;
use crate::types::{row_id, Operation, Row};

/// Field change information for diff tracking
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Option<Value>,
    pub new_value: Value,
}

/// Errors that can occur while turning API input into a Record
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("System field '{0}' cannot be set via API input")]
    SystemFieldNotAllowed(String),
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
}

/// One row travelling through the observer pipeline.
///
/// On create `original` is empty and `fields` holds the whole row. On
/// update and delete `original` is the stored row and `fields` holds only
/// the values written by this operation; reads through `get` see the
/// merged view.
#[derive(Debug, Clone)]
pub struct Record {
    original: Option<Row>,
    fields: Row,
    operation: Operation,
}

impl Record {
    pub fn new(operation: Operation) -> Self {
        Self { original: None, fields: Map::new(), operation }
    }

    /// Create record from API input JSON, rejecting system fields
    pub fn from_json(json: Value, operation: Operation) -> Result<Self, RecordError> {
        match json {
            Value::Object(map) => {
                if let Some(field) = map.keys().find(|k| SYSTEM_COLUMNS.contains(&k.as_str())) {
                    return Err(RecordError::SystemFieldNotAllowed(field.clone()));
                }
                Ok(Self { original: None, fields: map, operation })
            }
            _ => Err(RecordError::InvalidJson("Expected JSON object".to_string())),
        }
    }

    /// Record for an existing row about to be updated or deleted
    pub fn for_existing(id: i64, operation: Operation) -> Self {
        let mut record = Self::new(operation);
        record.fields.insert("id".to_string(), Value::from(id));
        record
    }

    /// Target an existing row with input already parsed by `from_json`
    pub fn set_id(&mut self, id: i64) -> &mut Self {
        self.fields.insert("id".to_string(), Value::from(id));
        self
    }

    /// Inject the stored row loaded by the preparation ring
    pub fn inject(&mut self, original: Row) -> &mut Self {
        self.fields.remove("id");
        self.original = Some(original);
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn id(&self) -> Option<i64> {
        self.original.as_ref().and_then(row_id).or_else(|| row_id(&self.fields))
    }

    /// Current value: written value if any, else the stored one
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields
            .get(key)
            .or_else(|| self.original.as_ref().and_then(|o| o.get(key)))
            .filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Raw value written by this operation, nulls included
    pub fn written(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_original(&self, key: &str) -> Option<&Value> {
        self.original.as_ref()?.get(key).filter(|v| !v.is_null())
    }

    pub fn original(&self) -> Option<&Row> {
        self.original.as_ref()
    }

    /// Whether this operation writes `key` at all
    pub fn is_written(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        if SYSTEM_COLUMNS.contains(&key.as_str()) && key != "created_at" && key != "updated_at" {
            tracing::warn!("Attempted to set system field '{}' - ignoring", key);
            return self;
        }
        self.fields.insert(key, value.into());
        self
    }

    /// Set field only if it's currently empty/null
    pub fn set_if_empty(&mut self, key: &str, value: Value) -> &mut Self {
        if self.get(key).is_none() {
            self.set(key, value);
        }
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Keys written by this operation
    pub fn written_keys(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Check if a specific field changes value in this operation
    pub fn changed(&self, key: &str) -> bool {
        match (self.fields.get(key), &self.original) {
            (None, _) => false,
            (Some(new), Some(original)) => original.get(key).unwrap_or(&Value::Null) != new,
            (Some(new), None) => !new.is_null(),
        }
    }

    pub fn changes(&self) -> Vec<FieldChange> {
        self.fields
            .iter()
            .filter(|(key, _)| self.changed(key))
            .map(|(key, value)| FieldChange {
                field: key.clone(),
                old_value: self.get_original(key).cloned(),
                new_value: value.clone(),
            })
            .collect()
    }

    pub fn changed_fields(&self) -> BTreeSet<String> {
        self.changes().into_iter().map(|c| c.field).collect()
    }

    /// Values to hand to the store: the whole row on create, only the
    /// changed columns otherwise
    pub fn to_write(&self) -> Row {
        match self.original {
            None => self.fields.clone(),
            Some(_) => self
                .fields
                .iter()
                .filter(|(key, _)| self.changed(key))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Merged view of the row
    pub fn to_map(&self) -> Row {
        let mut merged = self.original.clone().unwrap_or_default();
        for (k, v) in &self.fields {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Record(id: {:?}, op: {:?}, changed: {})",
            self.id(),
            self.operation,
            self.changed_fields().len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored() -> Row {
        json!({"id": 3, "status": "pending", "subject": "Pothole", "response": null})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn system_fields_are_rejected() {
        let err = Record::from_json(json!({"id": 4, "subject": "x"}), Operation::Create).unwrap_err();
        assert!(matches!(err, RecordError::SystemFieldNotAllowed(f) if f == "id"));
        assert!(Record::from_json(json!([1]), Operation::Create).is_err());
    }

    #[test]
    fn tracks_changes_against_original() {
        let mut record = Record::from_json(json!({"status": "pending", "response": "On it"}), Operation::Update).unwrap();
        record.inject(stored());
        assert!(!record.changed("status"));
        assert!(record.changed("response"));
        assert_eq!(record.to_write().len(), 1);
        assert_eq!(record.get_str("subject"), Some("Pothole"));
        assert_eq!(record.id(), Some(3));
    }

    #[test]
    fn set_if_empty_respects_stored_values() {
        let mut record = Record::for_existing(3, Operation::Update);
        record.inject(stored());
        record.set_if_empty("subject", json!("other"));
        record.set_if_empty("response", json!("filled"));
        assert_eq!(record.get_str("subject"), Some("Pothole"));
        assert_eq!(record.get_str("response"), Some("filled"));
    }
}
