//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `RequestId` where a
//! `WorkflowId` is expected. IDs are UUID v7, so they are collision-free
//! under concurrent generators and sort by creation time without coupling
//! identity to a wall-clock string.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(AccountId, "Unique identifier for an account (opaque; validated upstream).");
typed_id!(UserId, "Unique identifier for a user (approver, reviewer, requester).");
typed_id!(TransactionId, "Unique identifier for a transaction under evaluation.");
typed_id!(WorkflowId, "Unique identifier for an approval workflow.");
typed_id!(RequestId, "Unique identifier for an approval request.");
typed_id!(RuleId, "Unique identifier for a monitoring rule.");
typed_id!(AlertId, "Unique identifier for a transaction alert.");
typed_id!(EventId, "Unique identifier for an audit event.");
