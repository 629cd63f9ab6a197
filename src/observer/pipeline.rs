// Observer pipeline: every create, update and delete runs the same rings

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde_json::Value;
use tokio::time::timeout;

use crate::auth::Actor;
use crate::database::{Record, Store};
use crate::notify::NotificationDispatcher;
use crate::observer::context::ObserverContext;
use crate::observer::error::{ObserverError, ObserverResult};
use crate::observer::implementations;
use crate::observer::traits::{ObserverBox, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::Operation;

pub struct ObserverPipeline {
    store: Arc<dyn Store>,

    // Observer registry by ring, sorted by priority
    observers: HashMap<ObserverRing, Vec<ObserverBox>>,
}

impl ObserverPipeline {
    /// Pipeline with no observers; see `standard` for the full set
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store, observers: HashMap::new() }
    }

    /// Every observer the portal runs, wired to the given dispatcher
    pub fn standard(store: Arc<dyn Store>, dispatcher: Arc<NotificationDispatcher>, audit_enabled: bool) -> Self {
        let mut pipeline = Self::new(store);
        implementations::register_all(&mut pipeline, dispatcher, audit_enabled);
        pipeline
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Register an observer (type-safe registration)
    pub fn register_observer(&mut self, observer: ObserverBox) {
        let ring = observer.ring();
        let name = observer.name();
        let ring_observers = self.observers.entry(ring).or_default();
        ring_observers.push(observer);
        ring_observers.sort_by_key(|o| o.priority());

        tracing::debug!("Registered observer '{}' for ring {:?}", name, ring);
    }

    pub fn context(&self, schema: &'static ResourceSchema, actor: Actor, record: Record) -> ObserverContext {
        ObserverContext::new(schema, actor, self.store.clone(), record)
    }

    pub async fn create(
        &self,
        schema: &'static ResourceSchema,
        actor: Actor,
        input: Value,
    ) -> Result<ObserverResult, ObserverError> {
        let record = Record::from_json(input, Operation::Create)?;
        self.execute(self.context(schema, actor, record)).await
    }

    pub async fn update(
        &self,
        schema: &'static ResourceSchema,
        actor: Actor,
        id: i64,
        input: Value,
    ) -> Result<ObserverResult, ObserverError> {
        let mut record = Record::from_json(input, Operation::Update)?;
        record.set_id(id);
        self.execute(self.context(schema, actor, record)).await
    }

    pub async fn delete(
        &self,
        schema: &'static ResourceSchema,
        actor: Actor,
        id: i64,
    ) -> Result<ObserverResult, ObserverError> {
        let record = Record::for_existing(id, Operation::Delete);
        self.execute(self.context(schema, actor, record)).await
    }

    /// Run the synchronous rings in order, stopping at the first ring that
    /// reports errors, then the audit and notification rings concurrently
    pub async fn execute(&self, mut ctx: ObserverContext) -> Result<ObserverResult, ObserverError> {
        tracing::debug!(
            "Observer pipeline starting: operation={:?}, table={}, channel={:?}",
            ctx.operation,
            ctx.schema.table,
            ctx.actor.channel
        );

        for &ring in ObserverRing::SYNCHRONOUS {
            ctx.current_ring = Some(ring);
            self.execute_ring(ring, &mut ctx).await;

            if let Some(error) = ObserverError::combine(std::mem::take(&mut ctx.errors)) {
                tracing::debug!("Observer pipeline stopped at ring {:?}: {}", ring, error);
                return Err(error);
            }
        }

        let record = ctx.result.clone().ok_or_else(|| {
            ObserverError::Database(crate::database::DatabaseError::QueryError(format!(
                "no database observer handled {:?} on {}",
                ctx.operation, ctx.schema.table
            )))
        })?;

        self.execute_async_rings(&ctx).await;

        tracing::debug!("Observer pipeline finished in {:?}", ctx.execution_time());
        Ok(ObserverResult { record, warnings: ctx.warnings, execution_time: ctx.start_time.elapsed() })
    }

    /// Execute observers in a specific ring
    async fn execute_ring(&self, ring: ObserverRing, ctx: &mut ObserverContext) {
        let Some(observers) = self.observers.get(&ring) else {
            return;
        };

        let applicable: Vec<&ObserverBox> = observers.iter().filter(|o| o.applies(ctx)).collect();
        for observer in applicable {
            let observer_start = Instant::now();

            // Execute with timeout protection
            match timeout(observer.timeout(), observer.execute_sync(ctx)).await {
                Ok(Ok(())) => {
                    tracing::trace!("Observer: {} completed in {:?}", observer.name(), observer_start.elapsed());
                }
                Ok(Err(error)) => {
                    tracing::debug!("Observer: {} failed: {}", observer.name(), error);
                    ctx.errors.push(error);
                }
                Err(_) => {
                    tracing::error!("Observer: {} timed out after {:?}", observer.name(), observer.timeout());
                    ctx.errors.push(ObserverError::Timeout(format!(
                        "Observer {} timed out after {:?}",
                        observer.name(),
                        observer.timeout()
                    )));
                }
            }
        }
    }

    /// Audit and notification observers run concurrently; their failures are
    /// logged and never change the outcome of the write
    async fn execute_async_rings(&self, ctx: &ObserverContext) {
        let observers: Vec<&ObserverBox> = ObserverRing::ASYNCHRONOUS
            .iter()
            .filter_map(|ring| self.observers.get(ring))
            .flatten()
            .filter(|o| o.applies(ctx))
            .collect();

        let outcomes = join_all(observers.iter().map(|o| timeout(o.timeout(), o.execute_async(ctx)))).await;

        for (observer, outcome) in observers.iter().zip(outcomes) {
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(error)) => tracing::warn!("Async observer {} failed: {}", observer.name(), error),
                Err(_) => tracing::warn!("Async observer {} timed out", observer.name()),
            }
        }
    }
}
