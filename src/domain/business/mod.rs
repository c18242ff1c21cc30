//! Business domain: tenant account aggregate and subscription state.

mod account;
mod plan;

pub use account::BusinessAccount;
pub use plan::{Plan, SubscriptionStatus};

#[cfg(test)]
pub use account::test_support;
