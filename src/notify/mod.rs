pub mod dispatcher;
pub mod mailer;
pub mod templates;

pub use dispatcher::{FanoutReport, NotificationDispatcher, Recipient};
pub use mailer::{LogMailer, MailError, MailMessage, Mailer, MemoryMailer};
pub use templates::{Rendered, Template};
