//! Rate limiting logic and state management.

mod counter;
mod key;
mod limiter;
mod policy;

pub use counter::CounterStore;
pub use key::{ActionKind, ActorKey};
pub use limiter::{ActionGuard, GuardStatus};
pub use policy::{Decision, DenyReason, LockoutState};
