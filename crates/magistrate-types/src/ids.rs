//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the legal simulation has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. All IDs use UUID v7
//! (time-ordered) so that persisted records index efficiently.
//!
//! The `new()` constructors exist for app-side generation (jurisdiction
//! setup, crime creation, tests); loaders restore IDs through the `From`
//! conversions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an actor (character) in the wider simulation.
    ActorId
}

define_id! {
    /// Unique identifier for a location in the world graph.
    LocationId
}

define_id! {
    /// Unique identifier for a jurisdiction (a `LegalAuthority` aggregate).
    JurisdictionId
}

define_id! {
    /// Unique identifier for a law within a jurisdiction.
    LawId
}

define_id! {
    /// Unique identifier for a realized crime record.
    CrimeId
}

define_id! {
    /// Unique identifier for a legal class (predicate-based actor
    /// classification within a jurisdiction).
    LegalClassId
}

define_id! {
    /// Unique identifier for an enforcement authority (capability bundle
    /// held by enforcer roles).
    EnforcementAuthorityId
}

define_id! {
    /// Unique identifier for a patrol route template.
    PatrolRouteId
}

define_id! {
    /// Unique identifier for a live patrol instance.
    PatrolId
}

define_id! {
    /// Unique identifier for a witness profile.
    WitnessProfileId
}

define_id! {
    /// Unique identifier for a currency referenced by a jurisdiction.
    CurrencyId
}

define_id! {
    /// Unique identifier for an outstanding-fine ledger entry.
    FineId
}
