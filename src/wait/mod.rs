pub mod conditions;
pub mod waiter;

pub use conditions::Condition;
pub use waiter::{Waiter, DEFAULT_POLL_INTERVAL};
