pub mod types;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod matcher;
pub mod error;

pub use types::*;
pub use error::FilterError;
pub use filter::{Filter, TABLE_ALIAS};
