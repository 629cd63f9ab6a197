use rust_decimal::Decimal;
use serde_json::Value;

use crate::types::{
    date_value, datetime_value, decimal_value, now_value, parse_date, parse_datetime, parse_time,
    time_value, today_value, value_as_decimal, value_as_i64,
};

/// Storage type of a column; drives input coercion and SQL casts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Short string, at most 255 characters
    String,
    Text,
    Integer,
    Decimal,
    Boolean,
    Date,
    Time,
    DateTime,
    Json,
}

impl ColumnType {
    /// Postgres type used to cast bound text parameters
    pub fn pg_type(&self) -> &'static str {
        match self {
            ColumnType::String | ColumnType::Text => "text",
            ColumnType::Integer => "bigint",
            ColumnType::Decimal => "numeric",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::DateTime => "timestamptz",
            ColumnType::Json => "jsonb",
        }
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, ColumnType::String | ColumnType::Text)
    }

    /// Coerce an input value into the canonical stored representation
    pub fn normalize(&self, value: &Value) -> Result<Value, String> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self {
            ColumnType::String => match value {
                Value::String(s) if s.chars().count() > 255 => {
                    Err("must not be greater than 255 characters".to_string())
                }
                Value::String(s) => Ok(Value::String(s.trim().to_string())),
                _ => Err("must be a string".to_string()),
            },
            ColumnType::Text => match value {
                Value::String(s) => Ok(Value::String(s.trim().to_string())),
                _ => Err("must be a string".to_string()),
            },
            ColumnType::Integer => value_as_i64(value)
                .map(Value::from)
                .ok_or_else(|| "must be an integer".to_string()),
            ColumnType::Decimal => value_as_decimal(value)
                .map(decimal_value)
                .ok_or_else(|| "must be a number".to_string()),
            ColumnType::Boolean => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::Number(n) if n.as_i64() == Some(0) => Ok(Value::Bool(false)),
                Value::Number(n) if n.as_i64() == Some(1) => Ok(Value::Bool(true)),
                Value::String(s) => match s.trim() {
                    "true" | "1" => Ok(Value::Bool(true)),
                    "false" | "0" => Ok(Value::Bool(false)),
                    _ => Err("must be true or false".to_string()),
                },
                _ => Err("must be true or false".to_string()),
            },
            ColumnType::Date => parse_date(value)
                .map(date_value)
                .ok_or_else(|| "must be a valid date (YYYY-MM-DD)".to_string()),
            ColumnType::Time => parse_time(value)
                .map(time_value)
                .ok_or_else(|| "must be a valid time (HH:MM)".to_string()),
            ColumnType::DateTime => parse_datetime(value)
                .map(datetime_value)
                .ok_or_else(|| "must be a valid date and time".to_string()),
            ColumnType::Json => Ok(value.clone()),
        }
    }
}

/// Value a column takes on create when the input omits it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Str(&'static str),
    Bool(bool),
    Int(i64),
    Now,
    Today,
}

impl DefaultValue {
    pub fn to_value(&self) -> Value {
        match self {
            DefaultValue::Str(s) => Value::String((*s).to_string()),
            DefaultValue::Bool(b) => Value::Bool(*b),
            DefaultValue::Int(i) => Value::from(*i),
            DefaultValue::Now => now_value(),
            DefaultValue::Today => today_value(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnType,
    pub required: bool,
    pub unique: bool,
    /// Maintained by observers; ignored when present in input
    pub computed: bool,
    pub enum_values: &'static [&'static str],
    pub default: Option<DefaultValue>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
    /// Table this column references by id
    pub references: Option<&'static str>,
}

impl ColumnDef {
    pub const fn new(name: &'static str, kind: ColumnType) -> Self {
        Self {
            name,
            kind,
            required: false,
            unique: false,
            computed: false,
            enum_values: &[],
            default: None,
            minimum: None,
            maximum: None,
            references: None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub const fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.enum_values = values;
        self
    }

    pub const fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    pub const fn min(mut self, minimum: i64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub const fn max(mut self, maximum: i64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub const fn references(mut self, table: &'static str) -> Self {
        self.references = Some(table);
        self
    }

    /// Full check of one input value: type, enum and bounds
    pub fn validate(&self, value: &Value) -> Result<Value, String> {
        let normalized = self.kind.normalize(value)?;
        if normalized.is_null() {
            return Ok(normalized);
        }

        if !self.enum_values.is_empty() {
            let candidate = normalized.as_str().unwrap_or_default();
            if !self.enum_values.contains(&candidate) {
                return Err(format!("must be one of: {}", self.enum_values.join(", ")));
            }
        }

        if self.minimum.is_some() || self.maximum.is_some() {
            if let Some(number) = value_as_decimal(&normalized) {
                if let Some(min) = self.minimum {
                    if number < Decimal::from(min) {
                        return Err(format!("must be at least {}", min));
                    }
                }
                if let Some(max) = self.maximum {
                    if number > Decimal::from(max) {
                        return Err(format!("must not be greater than {}", max));
                    }
                }
            }
        }

        Ok(normalized)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// `column` lives on this table and points at `table.id`
    BelongsTo,
    /// `column` lives on `table` and points back at this table's id
    HasMany,
}

#[derive(Debug, Clone, Copy)]
pub struct Relation {
    pub name: &'static str,
    pub kind: RelationKind,
    pub table: &'static str,
    pub column: &'static str,
}

impl Relation {
    pub const fn belongs_to(name: &'static str, table: &'static str, column: &'static str) -> Self {
        Self { name, kind: RelationKind::BelongsTo, table, column }
    }

    pub const fn has_many(name: &'static str, table: &'static str, column: &'static str) -> Self {
        Self { name, kind: RelationKind::HasMany, table, column }
    }

    /// Whether the portal may load this relation. Only citizen-owned
    /// tables qualify; staff, department and account rows never do.
    pub fn citizen_visible(&self) -> bool {
        CITIZEN_TABLES.contains(&self.table)
    }
}

/// Tables whose rows belong to a single citizen
const CITIZEN_TABLES: &[&str] = &["citizens", "requests", "permits", "payments", "documents"];

/// Declarative description of one table and how the API exposes it
#[derive(Debug)]
pub struct ResourceSchema {
    /// Path segment under /api
    pub name: &'static str,
    pub table: &'static str,
    /// Singular label used in messages
    pub label: &'static str,
    pub columns: &'static [ColumnDef],
    pub relations: &'static [Relation],
    /// Text columns matched by `?search=`
    pub searchable: &'static [&'static str],
    /// Columns a citizen may write from the portal
    pub citizen_fields: &'static [&'static str],
    /// Routed under /api; internal tables are not
    pub exposed: bool,
}

/// Columns every table carries and only the system writes
pub const SYSTEM_COLUMNS: &[&str] = &["id", "created_at", "updated_at"];

impl ResourceSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Type of any queryable column, system columns included
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        match name {
            "id" => Some(ColumnType::Integer),
            "created_at" | "updated_at" => Some(ColumnType::DateTime),
            _ => self.column(name).map(|c| c.kind),
        }
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Relation the portal may eager-load
    pub fn portal_relation(&self, name: &str) -> Option<&Relation> {
        self.relation(name).filter(|r| r.citizen_visible())
    }

    pub fn unique_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.unique)
    }

    pub fn is_citizen_owned(&self) -> bool {
        self.column("citizen_id").is_some()
    }

    pub fn has_status(&self) -> bool {
        self.column("status").is_some()
    }
}
