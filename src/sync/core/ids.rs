//! Identifier types for the chat synchronization core.
//!
//! Server-assigned identifiers are numeric and wrapped in transparent
//! newtypes so a `ConversationId` can never be passed where a `MessageId`
//! is expected. The only client-generated identifier is [`CorrelationId`],
//! which ties a pushed message to its persisted copy.
//!
//! ## Cargo features used by this module
//! - `uuid_v7`: generates correlation ids with `Uuid::now_v7()`.

use core::fmt;
use core::num::ParseIntError;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declare a numeric server identifier newtype.
macro_rules! define_server_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(transparent)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap a raw server identifier.
            #[inline]
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Return the raw server identifier.
            #[inline]
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            #[inline]
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            #[inline]
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            #[inline]
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

define_server_id!(
    /// Conversation identifier assigned by the Persistence API.
    ConversationId
);

define_server_id!(
    /// Message identifier assigned by the Persistence API once a message is stored.
    MessageId
);

define_server_id!(
    /// User account identifier.
    UserId
);

/// Client-generated correlation identifier for an outgoing message.
///
/// The same value travels on the push transport and in the persistence call,
/// so an echoed push can be matched against the confirmed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct CorrelationId(pub Uuid);

impl Default for CorrelationId {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationId {
    /// Generate a fresh correlation identifier.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        #[cfg(feature = "uuid_v7")]
        {
            Self(Uuid::now_v7())
        }
        #[cfg(not(feature = "uuid_v7"))]
        {
            Self(Uuid::new_v4())
        }
    }

    /// Wrap an existing UUID.
    #[inline]
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Borrow the underlying UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CorrelationId {
    type Err = uuid::Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
