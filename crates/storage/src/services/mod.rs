mod capacity;
mod lifecycle;

pub use capacity::{CapacityGuard, Eligibility};
pub use lifecycle::{Inverse, LifecycleController, LifecycleState, Transition};
