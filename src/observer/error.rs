use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use crate::database::{DatabaseError, RecordError};
use crate::observer::traits::ObserverRing;
use crate::types::Row;

/// Field name to message, as returned in the 422 `errors` map
pub type FieldErrors = BTreeMap<String, String>;

/// Observer system errors with structured error types
#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("{message}")]
    Validation { message: String, field_errors: FieldErrors },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// A guarded update found the row in a state the guard excludes
    #[error("{0}")]
    GuardRejected(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Database error: {0}")]
    Database(DatabaseError),
}

impl ObserverError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut field_errors = FieldErrors::new();
        field_errors.insert(field.to_string(), message.into());
        Self::invalid(field_errors)
    }

    pub fn invalid(field_errors: FieldErrors) -> Self {
        let message = match field_errors.values().next() {
            Some(first) if field_errors.len() == 1 => first.clone(),
            Some(first) => format!("{} (and {} more errors)", first, field_errors.len() - 1),
            None => "The given data was invalid.".to_string(),
        };
        ObserverError::Validation { message, field_errors }
    }

    /// Folds the errors of one ring into the error reported for it.
    /// Validation errors merge their field maps; otherwise the first wins.
    pub fn combine(errors: Vec<ObserverError>) -> Option<ObserverError> {
        let mut merged = FieldErrors::new();
        let mut other = None;
        for error in errors {
            match error {
                ObserverError::Validation { field_errors, .. } => {
                    for (field, message) in field_errors {
                        merged.entry(field).or_insert(message);
                    }
                }
                error if other.is_none() => other = Some(error),
                _ => {}
            }
        }
        match other {
            Some(error) => Some(error),
            None if !merged.is_empty() => Some(ObserverError::invalid(merged)),
            None => None,
        }
    }
}

impl From<DatabaseError> for ObserverError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound(msg) => ObserverError::NotFound(msg),
            other => ObserverError::Database(other),
        }
    }
}

impl From<RecordError> for ObserverError {
    fn from(error: RecordError) -> Self {
        ObserverError::BadRequest(error.to_string())
    }
}

/// Observer warnings (non-fatal issues)
#[derive(Debug, Clone)]
pub struct ObserverWarning {
    pub observer: String,
    pub ring: u8,
    pub message: String,
}

impl ObserverWarning {
    pub fn new(observer: &str, ring: ObserverRing, message: String) -> Self {
        Self {
            observer: observer.to_string(),
            ring: ring as u8,
            message,
        }
    }
}

/// Results from observer pipeline execution
#[derive(Debug, Clone)]
pub struct ObserverResult {
    /// Row as stored after the write; for deletes, the removed row
    pub record: Row,
    pub warnings: Vec<ObserverWarning>,
    pub execution_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_merge_across_observers() {
        let combined = ObserverError::combine(vec![
            ObserverError::field("subject", "The subject field is required."),
            ObserverError::field("type", "The type field is required."),
        ])
        .unwrap();
        match combined {
            ObserverError::Validation { field_errors, message } => {
                assert_eq!(field_errors.len(), 2);
                assert!(message.contains("and 1 more"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn non_validation_errors_take_precedence() {
        let combined = ObserverError::combine(vec![
            ObserverError::field("subject", "required"),
            ObserverError::Forbidden("nope".into()),
        ]);
        assert!(matches!(combined, Some(ObserverError::Forbidden(_))));
        assert!(ObserverError::combine(vec![]).is_none());
    }
}
