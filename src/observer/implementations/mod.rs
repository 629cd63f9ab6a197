// Observer implementations organized by ring

use std::sync::Arc;

use crate::notify::NotificationDispatcher;
use crate::observer::pipeline::ObserverPipeline;
use crate::observer::traits::ObserverBox;

// Ring 0: Data Preparation
#[path = "0/default_values.rs"]
pub mod default_values;
#[path = "0/portal_ownership.rs"]
pub mod portal_ownership;
#[path = "0/record_loader.rs"]
pub mod record_loader;

// Ring 1: Input Validation
#[path = "1/input_validation.rs"]
pub mod input_validation;
#[path = "1/integrity_validation.rs"]
pub mod integrity_validation;

// Ring 2: Security
#[path = "2/citizen_scope.rs"]
pub mod citizen_scope;

// Ring 3: Business
#[path = "3/permit_decision.rs"]
pub mod permit_decision;
#[path = "3/range_rules.rs"]
pub mod range_rules;
#[path = "3/status_transition.rs"]
pub mod status_transition;

// Ring 4: Enrichment
#[path = "4/attendance_hours.rs"]
pub mod attendance_hours;
#[path = "4/lifecycle_stamps.rs"]
pub mod lifecycle_stamps;
#[path = "4/reference_numbers.rs"]
pub mod reference_numbers;
#[path = "4/timestamps.rs"]
pub mod timestamps;

// Ring 5: Database
#[path = "5/create_executor.rs"]
pub mod create_executor;
#[path = "5/delete_executor.rs"]
pub mod delete_executor;
#[path = "5/update_executor.rs"]
pub mod update_executor;

// Ring 7: Audit
#[path = "7/audit_log.rs"]
pub mod audit_log;

// Ring 9: Notification
#[path = "9/status_notifier.rs"]
pub mod status_notifier;
#[path = "9/submission_notifier.rs"]
pub mod submission_notifier;
#[path = "9/welcome_notifier.rs"]
pub mod welcome_notifier;

pub use attendance_hours::AttendanceHours;
pub use audit_log::AuditLog;
pub use citizen_scope::CitizenScope;
pub use create_executor::CreateExecutor;
pub use default_values::DefaultValues;
pub use delete_executor::DeleteExecutor;
pub use input_validation::InputValidation;
pub use integrity_validation::IntegrityValidation;
pub use lifecycle_stamps::LifecycleStamps;
pub use permit_decision::PermitDecision;
pub use portal_ownership::PortalOwnership;
pub use range_rules::RangeRules;
pub use record_loader::RecordLoader;
pub use reference_numbers::ReferenceNumbers;
pub use status_notifier::StatusNotifier;
pub use status_transition::StatusTransition;
pub use submission_notifier::SubmissionNotifier;
pub use timestamps::Timestamps;
pub use update_executor::UpdateExecutor;
pub use welcome_notifier::WelcomeNotifier;

/// Register every observer the portal runs on its writes
pub fn register_all(pipeline: &mut ObserverPipeline, dispatcher: Arc<NotificationDispatcher>, audit_enabled: bool) {
    pipeline.register_observer(ObserverBox::DataPreparation(Box::new(RecordLoader)));
    pipeline.register_observer(ObserverBox::DataPreparation(Box::new(DefaultValues)));
    pipeline.register_observer(ObserverBox::DataPreparation(Box::new(PortalOwnership)));

    pipeline.register_observer(ObserverBox::InputValidation(Box::new(InputValidation)));
    pipeline.register_observer(ObserverBox::InputValidation(Box::new(IntegrityValidation)));

    pipeline.register_observer(ObserverBox::Security(Box::new(CitizenScope)));

    pipeline.register_observer(ObserverBox::Business(Box::new(StatusTransition)));
    pipeline.register_observer(ObserverBox::Business(Box::new(PermitDecision)));
    pipeline.register_observer(ObserverBox::Business(Box::new(RangeRules)));

    pipeline.register_observer(ObserverBox::Enrichment(Box::new(ReferenceNumbers)));
    pipeline.register_observer(ObserverBox::Enrichment(Box::new(LifecycleStamps)));
    pipeline.register_observer(ObserverBox::Enrichment(Box::new(AttendanceHours)));
    pipeline.register_observer(ObserverBox::Enrichment(Box::new(Timestamps)));

    pipeline.register_observer(ObserverBox::Database(Box::new(CreateExecutor)));
    pipeline.register_observer(ObserverBox::Database(Box::new(UpdateExecutor)));
    pipeline.register_observer(ObserverBox::Database(Box::new(DeleteExecutor)));

    if audit_enabled {
        pipeline.register_observer(ObserverBox::Audit(Box::new(AuditLog)));
    }

    pipeline.register_observer(ObserverBox::Notification(Box::new(SubmissionNotifier::new(dispatcher.clone()))));
    pipeline.register_observer(ObserverBox::Notification(Box::new(StatusNotifier::new(dispatcher.clone()))));
    pipeline.register_observer(ObserverBox::Notification(Box::new(WelcomeNotifier::new(dispatcher))));
}
