use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::database::{DatabaseError, Store};
use crate::filter::FilterData;
use crate::resources::{by_table, Relation, RelationKind, ResourceSchema};
use crate::types::{row_id, value_as_i64, Row};

fn target(relation: &Relation) -> Result<&'static ResourceSchema, DatabaseError> {
    by_table(relation.table).ok_or_else(|| {
        DatabaseError::QueryError(format!("relation '{}' targets unknown table '{}'", relation.name, relation.table))
    })
}

fn in_filter(column: &str, ids: BTreeSet<i64>) -> FilterData {
    FilterData {
        where_clause: Some(json!({ column: { "$in": ids.into_iter().collect::<Vec<_>>() } })),
        order: Some(json!("id")),
        ..Default::default()
    }
}

/// Eager-loads `relations` onto `rows`, one query per relation.
/// A belongs-to lands as an object (or null), a has-many as an array.
pub async fn load_relations(
    store: &Arc<dyn Store>,
    relations: &[&'static Relation],
    rows: &mut [Row],
) -> Result<(), DatabaseError> {
    if rows.is_empty() {
        return Ok(());
    }

    for relation in relations {
        let schema = target(relation)?;
        match relation.kind {
            RelationKind::BelongsTo => {
                let ids: BTreeSet<i64> =
                    rows.iter().filter_map(|r| r.get(relation.column).and_then(value_as_i64)).collect();
                let related: BTreeMap<i64, Row> = if ids.is_empty() {
                    BTreeMap::new()
                } else {
                    store
                        .select(schema, in_filter("id", ids))
                        .await?
                        .into_iter()
                        .filter_map(|r| row_id(&r).map(|id| (id, r)))
                        .collect()
                };
                for row in rows.iter_mut() {
                    let value = row
                        .get(relation.column)
                        .and_then(value_as_i64)
                        .and_then(|id| related.get(&id).cloned())
                        .map(Value::Object)
                        .unwrap_or(Value::Null);
                    row.insert(relation.name.to_string(), value);
                }
            }
            RelationKind::HasMany => {
                let ids: BTreeSet<i64> = rows.iter().filter_map(row_id).collect();
                let mut grouped: BTreeMap<i64, Vec<Value>> = BTreeMap::new();
                for child in store.select(schema, in_filter(relation.column, ids)).await? {
                    if let Some(parent) = child.get(relation.column).and_then(value_as_i64) {
                        grouped.entry(parent).or_default().push(Value::Object(child));
                    }
                }
                for row in rows.iter_mut() {
                    let children = row_id(row).and_then(|id| grouped.remove(&id)).unwrap_or_default();
                    row.insert(relation.name.to_string(), Value::Array(children));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::resources::registry::{CITIZENS, REQUESTS};

    fn object(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn belongs_to_and_has_many_are_attached() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let citizen = store
            .insert(&CITIZENS, object(json!({"national_id": "N1", "first_name": "Ada", "last_name": "Lovelace"})))
            .await
            .unwrap();
        let citizen_id = row_id(&citizen).unwrap();
        for subject in ["Pothole", "Streetlight"] {
            store
                .insert(
                    &REQUESTS,
                    object(json!({"citizen_id": citizen_id, "type": "roads", "subject": subject, "description": "x"})),
                )
                .await
                .unwrap();
        }

        let mut requests = store.select(&REQUESTS, FilterData::default()).await.unwrap();
        let citizen_rel = REQUESTS.relation("citizen").unwrap();
        let department_rel = REQUESTS.relation("department").unwrap();
        load_relations(&store, &[citizen_rel, department_rel], &mut requests).await.unwrap();
        assert_eq!(requests[0]["citizen"]["first_name"], json!("Ada"));
        assert_eq!(requests[0]["department"], Value::Null);

        let mut citizens = vec![citizen];
        load_relations(&store, &[CITIZENS.relation("requests").unwrap()], &mut citizens).await.unwrap();
        assert_eq!(citizens[0]["requests"].as_array().unwrap().len(), 2);
    }
}
