//! Named, typed, opaque callables used by the rule model.
//!
//! Laws, legal classes, witness profiles, and patrol routes are configured
//! with predicates supplied by an external scripting facility. This module
//! treats them as opaque callables with typed signatures, resolved by name
//! through a [`PredicateRegistry`]. A lookup that names a predicate of the
//! wrong kind fails at configuration time with a reasoned error -- never at
//! evaluation time.
//!
//! Three signatures exist:
//!
//! - **Actor predicate**: `fn(&ActorFacts) -> bool` -- class membership,
//!   identity disclosure, launch conditions.
//! - **Offense predicate**: `fn(&OffenseFacts) -> bool` -- per-law custom
//!   applicability tests.
//! - **Actor multiplier**: `fn(&ActorFacts) -> Decimal` -- witness
//!   reporting-rate scaling.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rust_decimal::Decimal;

use magistrate_types::{ActorId, LocationId, OffenseCategory};

use crate::error::LawError;

// ---------------------------------------------------------------------------
// Facts
// ---------------------------------------------------------------------------

/// The slice of an actor's state that predicates may observe.
///
/// Built on demand by the actor directory; the rule model never holds a
/// reference into the wider character simulation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActorFacts {
    /// The actor's identifier.
    pub id: ActorId,
    /// Where the actor currently is, if resolved.
    pub location: Option<LocationId>,
    /// Free-form classification tags ("citizen", "noble", "outlander").
    pub tags: BTreeSet<String>,
    /// The actor's perception/notice skill rating.
    pub notice_skill: u32,
    /// Whether the actor is currently unable to resist (bound, subdued,
    /// unconscious).
    pub helpless: bool,
}

impl ActorFacts {
    /// Facts for an actor with just an id (everything else defaulted).
    pub fn bare(id: ActorId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Whether the actor carries the given classification tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// The facts of a possible offense, as seen by a law's custom predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffenseFacts {
    /// The offense category being matched.
    pub category: OffenseCategory,
    /// The offender's observable facts.
    pub offender: ActorFacts,
    /// The victim's observable facts, when there is a victim.
    pub victim: Option<ActorFacts>,
    /// Where the offense occurred.
    pub location: LocationId,
    /// The world tick of the offense.
    pub tick: u64,
}

// ---------------------------------------------------------------------------
// Typed handles
// ---------------------------------------------------------------------------

/// Generates a named, cloneable handle around an opaque callable.
macro_rules! define_predicate_handle {
    (
        $(#[$meta:meta])*
        $name:ident, $input:ty, $output:ty
    ) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name {
            name: Arc<str>,
            func: Arc<dyn Fn($input) -> $output + Send + Sync>,
        }

        impl $name {
            /// Wrap a callable under a name.
            pub fn new(name: &str, func: impl Fn($input) -> $output + Send + Sync + 'static) -> Self {
                Self {
                    name: Arc::from(name),
                    func: Arc::new(func),
                }
            }

            /// The name this callable was registered under.
            pub fn name(&self) -> &str {
                &self.name
            }

            /// Evaluate the callable.
            pub fn eval(&self, input: $input) -> $output {
                (self.func)(input)
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.name)
            }
        }
    };
}

define_predicate_handle! {
    /// A boolean test over an actor's observable facts.
    ActorPredicate, &ActorFacts, bool
}

define_predicate_handle! {
    /// A boolean test over the facts of a possible offense.
    OffensePredicate, &OffenseFacts, bool
}

define_predicate_handle! {
    /// A scaling factor derived from an actor's observable facts.
    ActorMultiplier, &ActorFacts, Decimal
}

// ---------------------------------------------------------------------------
// PredicateRegistry
// ---------------------------------------------------------------------------

/// The signature kind of a registered predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateKind {
    /// `fn(&ActorFacts) -> bool`
    Actor,
    /// `fn(&OffenseFacts) -> bool`
    Offense,
    /// `fn(&ActorFacts) -> Decimal`
    Multiplier,
}

/// One registered callable, tagged with its kind.
#[derive(Debug, Clone)]
enum Entry {
    /// An actor predicate.
    Actor(ActorPredicate),
    /// An offense predicate.
    Offense(OffensePredicate),
    /// An actor multiplier.
    Multiplier(ActorMultiplier),
}

impl Entry {
    const fn kind(&self) -> PredicateKind {
        match self {
            Self::Actor(_) => PredicateKind::Actor,
            Self::Offense(_) => PredicateKind::Offense,
            Self::Multiplier(_) => PredicateKind::Multiplier,
        }
    }
}

/// Registry of named, typed callables.
///
/// Names are unique across all kinds so that a configuration typo cannot
/// silently bind a law to a multiplier. Resolution by the wrong kind
/// returns [`LawError::PredicateKindMismatch`].
#[derive(Debug, Clone, Default)]
pub struct PredicateRegistry {
    entries: BTreeMap<String, Entry>,
}

impl PredicateRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register an actor predicate under a unique name.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::DuplicateName`] if the name is taken by any kind.
    pub fn register_actor(
        &mut self,
        name: &str,
        func: impl Fn(&ActorFacts) -> bool + Send + Sync + 'static,
    ) -> Result<(), LawError> {
        self.insert(name, Entry::Actor(ActorPredicate::new(name, func)))
    }

    /// Register an offense predicate under a unique name.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::DuplicateName`] if the name is taken by any kind.
    pub fn register_offense(
        &mut self,
        name: &str,
        func: impl Fn(&OffenseFacts) -> bool + Send + Sync + 'static,
    ) -> Result<(), LawError> {
        self.insert(name, Entry::Offense(OffensePredicate::new(name, func)))
    }

    /// Register an actor multiplier under a unique name.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::DuplicateName`] if the name is taken by any kind.
    pub fn register_multiplier(
        &mut self,
        name: &str,
        func: impl Fn(&ActorFacts) -> Decimal + Send + Sync + 'static,
    ) -> Result<(), LawError> {
        self.insert(name, Entry::Multiplier(ActorMultiplier::new(name, func)))
    }

    /// Resolve an actor predicate by name.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::UnknownPredicate`] for unknown names and
    /// [`LawError::PredicateKindMismatch`] for wrong-kind names.
    pub fn actor(&self, name: &str) -> Result<ActorPredicate, LawError> {
        match self.lookup(name)? {
            Entry::Actor(p) => Ok(p.clone()),
            other => Err(kind_mismatch(name, PredicateKind::Actor, other.kind())),
        }
    }

    /// Resolve an offense predicate by name.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::UnknownPredicate`] for unknown names and
    /// [`LawError::PredicateKindMismatch`] for wrong-kind names.
    pub fn offense(&self, name: &str) -> Result<OffensePredicate, LawError> {
        match self.lookup(name)? {
            Entry::Offense(p) => Ok(p.clone()),
            other => Err(kind_mismatch(name, PredicateKind::Offense, other.kind())),
        }
    }

    /// Resolve an actor multiplier by name.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::UnknownPredicate`] for unknown names and
    /// [`LawError::PredicateKindMismatch`] for wrong-kind names.
    pub fn multiplier(&self, name: &str) -> Result<ActorMultiplier, LawError> {
        match self.lookup(name)? {
            Entry::Multiplier(p) => Ok(p.clone()),
            other => Err(kind_mismatch(name, PredicateKind::Multiplier, other.kind())),
        }
    }

    /// Names of all registered predicates with their kinds.
    pub fn list(&self) -> Vec<(String, PredicateKind)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.kind()))
            .collect()
    }

    fn insert(&mut self, name: &str, entry: Entry) -> Result<(), LawError> {
        if self.entries.contains_key(name) {
            return Err(LawError::DuplicateName(name.to_owned()));
        }
        self.entries.insert(name.to_owned(), entry);
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<&Entry, LawError> {
        self.entries
            .get(name)
            .ok_or_else(|| LawError::UnknownPredicate(name.to_owned()))
    }
}

fn kind_mismatch(name: &str, expected: PredicateKind, found: PredicateKind) -> LawError {
    LawError::PredicateKindMismatch {
        name: name.to_owned(),
        expected,
        found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_resolve_actor_predicate() {
        let mut registry = PredicateRegistry::new();
        let result = registry.register_actor("is-citizen", |facts| facts.has_tag("citizen"));
        assert!(result.is_ok());

        let predicate = registry.actor("is-citizen");
        assert!(predicate.is_ok());

        let mut facts = ActorFacts::bare(ActorId::new());
        facts.tags.insert(String::from("citizen"));
        assert!(predicate.is_ok_and(|p| p.eval(&facts)));
    }

    #[test]
    fn duplicate_name_rejected_across_kinds() {
        let mut registry = PredicateRegistry::new();
        let first = registry.register_actor("busy-name", |_| true);
        assert!(first.is_ok());

        let second = registry.register_multiplier("busy-name", |_| Decimal::ONE);
        assert!(matches!(second, Err(LawError::DuplicateName(_))));
    }

    #[test]
    fn wrong_kind_lookup_rejected_at_configuration() {
        let mut registry = PredicateRegistry::new();
        let _ = registry.register_multiplier("daylight-bonus", |_| Decimal::TWO);

        let as_actor = registry.actor("daylight-bonus");
        assert!(matches!(
            as_actor,
            Err(LawError::PredicateKindMismatch {
                expected: PredicateKind::Actor,
                found: PredicateKind::Multiplier,
                ..
            })
        ));
    }

    #[test]
    fn unknown_name_rejected() {
        let registry = PredicateRegistry::new();
        assert!(matches!(
            registry.offense("never-registered"),
            Err(LawError::UnknownPredicate(_))
        ));
    }

    #[test]
    fn handles_are_cloneable_and_named() {
        let predicate = ActorPredicate::new("always", |_| true);
        let cloned = predicate.clone();
        assert_eq!(cloned.name(), "always");
        assert!(cloned.eval(&ActorFacts::bare(ActorId::new())));
    }
}
