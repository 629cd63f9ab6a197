// Workflow rules shared by the observers and the portal services

pub mod attendance;
pub mod citizen;
pub mod numbers;
pub mod status;

pub use attendance::{hours_worked, NegativeShift};
pub use citizen::{Citizen, NeedsOnboarding};
pub use numbers::NumberKind;
pub use status::{check_transition, PaymentStatus, PermitStatus, RequestStatus, StatusMachine, TransitionError};
