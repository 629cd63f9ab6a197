use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

use crate::database::{DatabaseError, Store};
use crate::filter::FilterData;
use crate::resources::registry::{PAYMENTS, PERMITS, REQUESTS};
use crate::resources::{exposed, ResourceSchema};
use crate::types::{decimal_value, value_as_decimal};

#[derive(Debug, Clone, Serialize)]
pub struct ResourceSummary {
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_status: Option<BTreeMap<&'static str, i64>>,
}

async fn status_counts(
    store: &dyn Store,
    schema: &'static ResourceSchema,
    scope: Option<&FilterData>,
) -> Result<BTreeMap<&'static str, i64>, DatabaseError> {
    let mut counts = BTreeMap::new();
    let Some(column) = schema.column("status") else { return Ok(counts) };
    for status in column.enum_values {
        let status_filter = json!({ "status": status });
        let where_clause = match scope.and_then(|s| s.where_clause.clone()) {
            Some(scope) => json!({ "$and": [scope, status_filter] }),
            None => status_filter,
        };
        let filter = FilterData { where_clause: Some(where_clause), ..Default::default() };
        counts.insert(*status, store.count(schema, filter).await?);
    }
    Ok(counts)
}

/// Per-resource totals and status breakdowns for the admin console
pub async fn admin_summary(store: &dyn Store) -> Result<BTreeMap<&'static str, ResourceSummary>, DatabaseError> {
    let mut summary = BTreeMap::new();
    for schema in exposed() {
        let total = store.count(schema, FilterData::default()).await?;
        let by_status = if schema.has_status() { Some(status_counts(store, schema, None).await?) } else { None };
        summary.insert(schema.name, ResourceSummary { total, by_status });
    }
    Ok(summary)
}

#[derive(Debug, Clone, Serialize)]
pub struct PortalSummary {
    pub requests: BTreeMap<&'static str, i64>,
    pub permits: BTreeMap<&'static str, i64>,
    pub outstanding_payments: i64,
    pub outstanding_amount: serde_json::Value,
}

/// The citizen's own workload: requests and permits by status, unpaid bills
pub async fn portal_summary(store: &dyn Store, citizen_id: i64) -> Result<PortalSummary, DatabaseError> {
    let scope = FilterData::where_eq("citizen_id", citizen_id);
    let requests = status_counts(store, &REQUESTS, Some(&scope)).await?;
    let permits = status_counts(store, &PERMITS, Some(&scope)).await?;

    let unpaid = FilterData {
        where_clause: Some(json!({ "citizen_id": citizen_id, "status": { "$in": ["pending", "failed"] } })),
        ..Default::default()
    };
    let bills = store.select(&PAYMENTS, unpaid).await?;
    let outstanding: Decimal = bills.iter().filter_map(|row| row.get("amount").and_then(value_as_decimal)).sum();

    Ok(PortalSummary {
        requests,
        permits,
        outstanding_payments: bills.len() as i64,
        outstanding_amount: decimal_value(outstanding),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::resources::registry::CITIZENS;
    use crate::types::Row;

    fn object(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn portal_summary_counts_only_the_citizens_rows() {
        let store = MemoryStore::new();
        for n in 1..=2 {
            let citizen = json!({"national_id": format!("N{}", n), "first_name": "A", "last_name": "B"});
            store.insert(&CITIZENS, object(citizen)).await.unwrap();
        }
        for (citizen_id, status) in [(1, "pending"), (1, "completed"), (2, "pending")] {
            let request = json!({"citizen_id": citizen_id, "type": "t", "subject": "s", "description": "d", "status": status});
            store.insert(&REQUESTS, object(request)).await.unwrap();
        }
        for (amount, status) in [(10.25, "pending"), (5.0, "failed"), (99.0, "completed")] {
            let payment = json!({"citizen_id": 1, "type": "fee", "amount": amount, "status": status});
            store.insert(&PAYMENTS, object(payment)).await.unwrap();
        }

        let summary = portal_summary(&store, 1).await.unwrap();
        assert_eq!(summary.requests["pending"], 1);
        assert_eq!(summary.requests["completed"], 1);
        assert_eq!(summary.permits["pending"], 0);
        assert_eq!(summary.outstanding_payments, 2);
        assert_eq!(summary.outstanding_amount, json!(15.25));
    }

    #[tokio::test]
    async fn admin_summary_covers_every_resource() {
        let store = MemoryStore::new();
        let summary = admin_summary(&store).await.unwrap();
        assert_eq!(summary.len(), exposed().count());
        assert!(summary["departments"].by_status.is_none());
        assert_eq!(summary["payments"].by_status.as_ref().unwrap()["refunded"], 0);
    }
}
