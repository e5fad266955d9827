//! Error types for the `magistrate-law` crate.
//!
//! All fallible rule operations return [`LawError`]. Configuration errors
//! (duplicate names, predicate kind mismatches, cycle-forming inclusion
//! edits) are caught at mutation time with state unchanged; lifecycle
//! errors guard the crime invariants (monotonic disclosure, immutable
//! finalized outcomes).

use magistrate_types::{CrimeId, DisclosureState, EnforcementAuthorityId};

use crate::predicate::PredicateKind;

/// Errors that can occur during rule-model operations.
#[derive(Debug, thiserror::Error)]
pub enum LawError {
    /// A predicate, class, or authority name is already taken.
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// A predicate was requested by a name the registry does not know.
    #[error("unknown predicate: {0}")]
    UnknownPredicate(String),

    /// A predicate exists under the requested name but with an
    /// incompatible signature.
    #[error("predicate {name} has kind {found:?}, expected {expected:?}")]
    PredicateKindMismatch {
        /// The requested predicate name.
        name: String,
        /// The kind the caller required.
        expected: PredicateKind,
        /// The kind actually registered.
        found: PredicateKind,
    },

    /// An enforcement authority referenced by ID does not exist.
    #[error("enforcement authority not found: {0}")]
    AuthorityNotFound(EnforcementAuthorityId),

    /// Adding the inclusion edge would make the authority graph cyclic.
    #[error("inclusion of {included} into {includer} would form a cycle")]
    InclusionCycle {
        /// The authority being edited.
        includer: EnforcementAuthorityId,
        /// The authority whose inclusion was rejected.
        included: EnforcementAuthorityId,
    },

    /// The crime has a finalized outcome; no further mutation is allowed.
    #[error("crime {0} is finalized; outcome fields are immutable")]
    CrimeFinalized(CrimeId),

    /// A disclosure transition that the lifecycle does not permit.
    #[error("crime {crime}: disclosure cannot move from {from} to {to}")]
    InvalidTransition {
        /// The crime whose transition was rejected.
        crime: CrimeId,
        /// Current disclosure state.
        from: DisclosureState,
        /// Requested disclosure state.
        to: DisclosureState,
    },

    /// Invalid rule configuration (bad rates, empty pools, bad windows).
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong.
        reason: String,
    },
}
