use serde::Serialize;

use crate::types::{row_id, value_as_i64, Row};

/// A resident's profile, bound to at most one authentication user
#[derive(Debug, Clone, Serialize)]
pub struct Citizen {
    pub id: i64,
    pub user_id: Option<i64>,
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    #[serde(skip)]
    pub row: Row,
}

impl Citizen {
    pub fn from_row(row: Row) -> Option<Self> {
        let text = |key: &str| row.get(key).and_then(|v| v.as_str()).map(str::to_string);
        Some(Self {
            id: row_id(&row)?,
            user_id: row.get("user_id").and_then(value_as_i64),
            national_id: text("national_id")?,
            first_name: text("first_name")?,
            last_name: text("last_name")?,
            email: text("email"),
            row,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The caller has an account but no citizen profile yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("User {user_id} has no citizen profile; complete onboarding first")]
pub struct NeedsOnboarding {
    pub user_id: i64,
}
