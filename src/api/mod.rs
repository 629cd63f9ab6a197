pub mod query;

pub use query::{ListQuery, PageMeta};
