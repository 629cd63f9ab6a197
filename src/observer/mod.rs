// Observer system: every write runs through an ordered set of rings

pub mod context;
pub mod error;
pub mod implementations;
pub mod pipeline;
pub mod traits;

pub use context::ObserverContext;
pub use error::{FieldErrors, ObserverError, ObserverResult, ObserverWarning};
pub use pipeline::ObserverPipeline;
pub use traits::{Observer, ObserverBox, ObserverRing};
