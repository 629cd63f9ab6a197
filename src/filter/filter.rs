use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, SqlResult};
use crate::resources::ResourceSchema;

/// Alias every generated query uses for the resource table
pub const TABLE_ALIAS: &str = "t";

pub struct Filter {
    schema: &'static ResourceSchema,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new(schema: &'static ResourceSchema) -> Self {
        Self {
            schema,
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        if let Some(limit) = data.limit { self.limit(limit, data.offset)?; }
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec, self.schema)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if limit < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }
        if let Some(off) = offset { if off < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); } }
        self.limit = Some(limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn order_infos(&self) -> &[FilterOrderInfo] {
        &self.order_data
    }

    /// Rows come back as one JSON object per row in the `row` column
    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data, Some(TABLE_ALIAS));
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT row_to_json({}) AS row", TABLE_ALIAS),
            format!("FROM \"{}\" {}", self.schema.table, TABLE_ALIAS),
            format!("WHERE {}", where_result.query),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let (query, params) = match self.where_data {
            Some(ref where_data) => FilterWhere::generate(self.schema, where_data, 0, Some(TABLE_ALIAS))?,
            None => ("1=1".to_string(), vec![]),
        };
        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = format!(
            "SELECT COUNT(*) AS count FROM \"{}\" {} WHERE {}",
            self.schema.table, TABLE_ALIAS, where_result.query
        );
        Ok(SqlResult { query, params: where_result.params })
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::registry::PERMITS;
    use serde_json::json;

    #[test]
    fn select_sql_pages_and_orders() {
        let mut filter = Filter::new(&PERMITS);
        filter
            .assign(FilterData {
                where_clause: Some(json!({"status": "pending"})),
                order: Some(json!("-id")),
                limit: Some(15),
                offset: Some(30),
            })
            .unwrap();
        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT row_to_json(t) AS row FROM \"permits\" t WHERE t.\"status\" = $1::text ORDER BY t.\"id\" DESC LIMIT 15 OFFSET 30"
        );
        assert_eq!(sql.params, vec![json!("pending")]);
    }

    #[test]
    fn count_sql_ignores_paging() {
        let mut filter = Filter::new(&PERMITS);
        filter.limit(10, Some(5)).unwrap();
        assert_eq!(filter.to_count_sql().unwrap().query, "SELECT COUNT(*) AS count FROM \"permits\" t WHERE 1=1");
    }

    #[test]
    fn negative_limits_are_rejected() {
        assert!(Filter::new(&PERMITS).limit(-1, None).is_err());
    }
}
