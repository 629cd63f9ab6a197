// Admin console API, mounted under /api behind the staff role check

pub mod dashboard;
pub mod notifications;
pub mod records;
pub mod uploads;
pub mod users;
