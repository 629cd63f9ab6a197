use async_trait::async_trait;
use std::time::Duration;

use crate::auth::Actor;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::resources::ResourceSchema;
use crate::types::Operation;

/// Observer rings with semantic meaning - synchronous (0-5) and asynchronous (7-9)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ObserverRing {
    DataPreparation = 0, // Load stored row, apply defaults
    InputValidation = 1, // Column types, required fields, uniqueness
    Security = 2,        // Portal ownership and writable fields
    Business = 3,        // Status transitions, decision rules
    Enrichment = 4,      // Computed fields, generated numbers
    Database = 5,        // Store write
    Audit = 7,           // Change log (async)
    Notification = 9,    // User notifications (async)
}

impl ObserverRing {
    pub const SYNCHRONOUS: &'static [ObserverRing] = &[
        ObserverRing::DataPreparation,
        ObserverRing::InputValidation,
        ObserverRing::Security,
        ObserverRing::Business,
        ObserverRing::Enrichment,
        ObserverRing::Database,
    ];

    pub const ASYNCHRONOUS: &'static [ObserverRing] = &[ObserverRing::Audit, ObserverRing::Notification];
}

/// Base trait for all observers with metadata and applicability checks
pub trait Observer: Send + Sync {
    /// Observer name for logging and debugging
    fn name(&self) -> &'static str;

    /// Which ring this observer belongs to
    fn ring(&self) -> ObserverRing;

    fn applies_to_operation(&self, op: Operation) -> bool;

    fn applies_to_schema(&self, schema: &ResourceSchema) -> bool;

    fn applies_to_actor(&self, _actor: &Actor) -> bool {
        true
    }

    /// Execution timeout (default 5 seconds)
    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    /// Priority within ring (lower numbers execute first)
    fn priority(&self) -> u8 {
        50
    }
}

/// Ring 0: Data Preparation - load stored row, apply defaults
#[async_trait]
pub trait DataPreparationObserver: Observer {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError>;
}

/// Ring 1: Input Validation - column rules, required fields
#[async_trait]
pub trait InputValidationObserver: Observer {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError>;
}

/// Ring 2: Security - ownership and writable fields
#[async_trait]
pub trait SecurityObserver: Observer {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError>;
}

/// Ring 3: Business Logic - lifecycle rules
#[async_trait]
pub trait BusinessObserver: Observer {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError>;
}

/// Ring 4: Enrichment - computed fields
#[async_trait]
pub trait EnrichmentObserver: Observer {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError>;
}

/// Ring 5: Database - store write
#[async_trait]
pub trait DatabaseObserver: Observer {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError>;
}

/// Ring 7: Audit - change tracking (async)
#[async_trait]
pub trait AuditObserver: Observer {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError>;
}

/// Ring 9: Notification - user notifications (async)
#[async_trait]
pub trait NotificationObserver: Observer {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError>;
}

/// Concrete observer types for dynamic dispatch
pub enum ObserverBox {
    DataPreparation(Box<dyn DataPreparationObserver>),
    InputValidation(Box<dyn InputValidationObserver>),
    Security(Box<dyn SecurityObserver>),
    Business(Box<dyn BusinessObserver>),
    Enrichment(Box<dyn EnrichmentObserver>),
    Database(Box<dyn DatabaseObserver>),
    Audit(Box<dyn AuditObserver>),
    Notification(Box<dyn NotificationObserver>),
}

/// Calls a base `Observer` method on whichever ring trait object is boxed
macro_rules! dispatch {
    ($self:expr, $o:ident => $call:expr) => {
        match $self {
            ObserverBox::DataPreparation($o) => $call,
            ObserverBox::InputValidation($o) => $call,
            ObserverBox::Security($o) => $call,
            ObserverBox::Business($o) => $call,
            ObserverBox::Enrichment($o) => $call,
            ObserverBox::Database($o) => $call,
            ObserverBox::Audit($o) => $call,
            ObserverBox::Notification($o) => $call,
        }
    };
}

impl ObserverBox {
    pub fn name(&self) -> &'static str {
        dispatch!(self, o => o.name())
    }

    pub fn ring(&self) -> ObserverRing {
        dispatch!(self, o => o.ring())
    }

    pub fn priority(&self) -> u8 {
        dispatch!(self, o => o.priority())
    }

    pub fn timeout(&self) -> Duration {
        dispatch!(self, o => o.timeout())
    }

    /// Whether this observer runs for the context's operation, table and actor
    pub fn applies(&self, ctx: &ObserverContext) -> bool {
        dispatch!(self, o => {
            o.applies_to_operation(ctx.operation)
                && o.applies_to_schema(ctx.schema)
                && o.applies_to_actor(&ctx.actor)
        })
    }

    pub async fn execute_sync(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        match self {
            ObserverBox::DataPreparation(o) => o.execute(ctx).await,
            ObserverBox::InputValidation(o) => o.execute(ctx).await,
            ObserverBox::Security(o) => o.execute(ctx).await,
            ObserverBox::Business(o) => o.execute(ctx).await,
            ObserverBox::Enrichment(o) => o.execute(ctx).await,
            ObserverBox::Database(o) => o.execute(ctx).await,
            _ => Ok(()), // Async observers don't execute in sync phase
        }
    }

    pub async fn execute_async(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        match self {
            ObserverBox::Audit(o) => o.execute(ctx).await,
            ObserverBox::Notification(o) => o.execute(ctx).await,
            _ => Ok(()), // Sync observers don't execute in async phase
        }
    }
}
