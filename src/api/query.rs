use std::collections::HashMap;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::resources::{Relation, ResourceSchema};

/// Query parameters that are not column filters
const RESERVED: &[&str] = &["page", "per_page", "sort", "search", "with"];

/// Parsed `GET /<resource>` query string
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
    pub where_clause: Option<Value>,
    pub order: Value,
    pub with: Vec<&'static Relation>,
}

/// Pagination block returned next to a list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub last_page: u32,
}

impl PageMeta {
    pub fn new(page: u32, per_page: u32, total: i64) -> Self {
        let per_page = per_page.max(1);
        let last_page = ((total.max(0) as u64 + per_page as u64 - 1) / per_page as u64).max(1) as u32;
        Self { page, per_page, total, last_page }
    }
}

fn positive(params: &HashMap<String, String>, key: &str) -> Result<Option<u32>, ApiError> {
    match params.get(key).map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("{} must be a positive integer", key))),
    }
}

/// `with=citizen,documents` against the resource's declared relations
pub fn parse_with(schema: &'static ResourceSchema, raw: Option<&String>) -> Result<Vec<&'static Relation>, ApiError> {
    relations_named(schema, raw, ResourceSchema::relation)
}

/// Like [`parse_with`], limited to relations the portal may load
pub fn parse_portal_with(
    schema: &'static ResourceSchema,
    raw: Option<&String>,
) -> Result<Vec<&'static Relation>, ApiError> {
    relations_named(schema, raw, ResourceSchema::portal_relation)
}

fn relations_named(
    schema: &'static ResourceSchema,
    raw: Option<&String>,
    lookup: fn(&'static ResourceSchema, &str) -> Option<&'static Relation>,
) -> Result<Vec<&'static Relation>, ApiError> {
    let Some(raw) = raw else { return Ok(Vec::new()) };
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            lookup(schema, name)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown relation '{}' on {}", name, schema.name)))
        })
        .collect()
}

/// Case-insensitive match over the searchable columns
fn search_clause(schema: &ResourceSchema, term: &str) -> Option<Value> {
    let term = term.trim();
    if term.is_empty() || schema.searchable.is_empty() {
        return None;
    }
    let pattern = format!("%{}%", term);
    let alternatives: Vec<Value> = schema
        .searchable
        .iter()
        .map(|column| json!({ *column: { "$ilike": pattern } }))
        .collect();
    Some(json!({ "$or": alternatives }))
}

impl ListQuery {
    pub fn parse(
        schema: &'static ResourceSchema,
        params: &HashMap<String, String>,
        api: &ApiConfig,
    ) -> Result<Self, ApiError> {
        let page = positive(params, "page")?.unwrap_or(1);
        let per_page = positive(params, "per_page")?
            .unwrap_or(api.default_per_page)
            .min(api.max_per_page);

        let mut conditions = Vec::new();
        let mut equalities = Map::new();
        for (key, raw) in params.iter().filter(|(k, _)| !RESERVED.contains(&k.as_str())) {
            let Some(kind) = schema.column_type(key) else {
                tracing::debug!("Ignoring unknown filter '{}' on {}", key, schema.name);
                continue;
            };
            let value = if raw.eq_ignore_ascii_case("null") {
                Value::Null
            } else {
                kind.normalize(&Value::String(raw.clone()))
                    .map_err(|msg| ApiError::bad_request(format!("Filter '{}' {}", key, msg)))?
            };
            equalities.insert(key.clone(), value);
        }
        if !equalities.is_empty() {
            conditions.push(Value::Object(equalities));
        }
        if let Some(search) = params.get("search").and_then(|term| search_clause(schema, term)) {
            conditions.push(search);
        }

        let where_clause = match conditions.len() {
            0 => None,
            1 => conditions.pop(),
            _ => Some(json!({ "$and": conditions })),
        };

        let order = params
            .get("sort")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .unwrap_or_else(|| json!("-id"));

        Ok(Self { page, per_page, where_clause, order, with: parse_with(schema, params.get("with"))? })
    }

    /// Portal list: `with` is limited to citizen-owned relations
    pub fn parse_portal(
        schema: &'static ResourceSchema,
        params: &HashMap<String, String>,
        api: &ApiConfig,
    ) -> Result<Self, ApiError> {
        let with = parse_portal_with(schema, params.get("with"))?;
        Ok(Self { with, ..Self::parse(schema, params, api)? })
    }

    /// Adds a condition every returned row must satisfy
    pub fn scoped(mut self, condition: Value) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => json!({ "$and": [existing, condition] }),
            None => condition,
        });
        self
    }

    /// Filter for one page of rows
    pub fn page_filter(&self) -> FilterData {
        FilterData {
            where_clause: self.where_clause.clone(),
            order: Some(self.order.clone()),
            limit: Some(self.per_page as i64),
            offset: Some((self.page as i64 - 1) * self.per_page as i64),
        }
    }

    /// Filter for the total behind the page
    pub fn count_filter(&self) -> FilterData {
        FilterData { where_clause: self.where_clause.clone(), ..Default::default() }
    }

    pub fn meta(&self, total: i64) -> PageMeta {
        PageMeta::new(self.page, self.per_page, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::resources::registry::{PAYMENTS, REQUESTS};

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_come_from_config() {
        let api = AppConfig::development().api;
        let query = ListQuery::parse(&REQUESTS, &HashMap::new(), &api).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, api.default_per_page);
        assert_eq!(query.order, json!("-id"));
        assert!(query.where_clause.is_none());
    }

    #[test]
    fn per_page_is_capped() {
        let api = AppConfig::development().api;
        let query = ListQuery::parse(&REQUESTS, &params(&[("per_page", "100000")]), &api).unwrap();
        assert_eq!(query.per_page, api.max_per_page);
        assert!(ListQuery::parse(&REQUESTS, &params(&[("page", "0")]), &api).is_err());
    }

    #[test]
    fn column_filters_and_search_combine() {
        let api = AppConfig::development().api;
        let query = ListQuery::parse(
            &REQUESTS,
            &params(&[("status", "pending"), ("citizen_id", "4"), ("search", "road"), ("bogus", "x")]),
            &api,
        )
        .unwrap();
        let clause = query.where_clause.unwrap();
        let and = clause["$and"].as_array().unwrap();
        assert_eq!(and[0]["status"], json!("pending"));
        assert_eq!(and[0]["citizen_id"], json!(4));
        assert_eq!(and[1]["$or"][0]["type"]["$ilike"], json!("%road%"));
    }

    #[test]
    fn bad_filter_values_are_rejected() {
        let api = AppConfig::development().api;
        assert!(ListQuery::parse(&PAYMENTS, &params(&[("amount", "lots")]), &api).is_err());
        assert!(ListQuery::parse(&PAYMENTS, &params(&[("with", "nothing")]), &api).is_err());
    }

    #[test]
    fn last_page_rounds_up() {
        assert_eq!(PageMeta::new(1, 15, 31).last_page, 3);
        assert_eq!(PageMeta::new(1, 15, 0).last_page, 1);
        let page = ListQuery::parse(&REQUESTS, &params(&[("page", "3"), ("per_page", "10")]), &AppConfig::development().api)
            .unwrap()
            .page_filter();
        assert_eq!(page.offset, Some(20));
    }

    #[test]
    fn portal_with_excludes_staff_relations() {
        let api = AppConfig::development().api;
        let query = ListQuery::parse_portal(&REQUESTS, &params(&[("with", "citizen,documents")]), &api).unwrap();
        assert_eq!(query.with.len(), 2);

        for staff_only in ["assignee", "department"] {
            let err = ListQuery::parse_portal(&REQUESTS, &params(&[("with", staff_only)]), &api).unwrap_err();
            assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        }
        assert!(parse_with(&REQUESTS, Some(&"assignee".to_string())).is_ok());
    }
}
