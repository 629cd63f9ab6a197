pub mod billing_service;
pub mod dashboard_service;
pub mod notification_service;
pub mod portal_service;
pub mod record_service;
pub mod relation_service;

pub use record_service::RecordService;
