//! Common domain types shared across Sentra crates.

pub mod id;


pub use id::{AccountId, AlertId, EventId, RequestId, RuleId, TransactionId, UserId, WorkflowId};
