//! Predicate-based actor classification within a jurisdiction.
//!
//! A [`LegalClass`] pairs a membership predicate with a priority. An
//! actor's class under a jurisdiction is the single highest-priority class
//! whose predicate accepts them; if none accepts, the actor has no
//! standing there -- no law applies to them and no enforcement authority
//! may touch them.

use magistrate_types::LegalClassId;

use crate::predicate::{ActorFacts, ActorPredicate};

/// A predicate-based classification of actors within a jurisdiction.
#[derive(Debug, Clone)]
pub struct LegalClass {
    /// Unique identifier.
    pub id: LegalClassId,
    /// Display name, unique within the owning jurisdiction.
    pub name: String,
    /// The membership test.
    pub membership: ActorPredicate,
    /// Resolution priority; higher wins when several predicates accept.
    pub priority: i32,
    /// Whether members may be detained over unpaid, overdue fines.
    pub detainable_for_unpaid_fines: bool,
}

impl LegalClass {
    /// Whether this class accepts the actor.
    pub fn accepts(&self, facts: &ActorFacts) -> bool {
        self.membership.eval(facts)
    }
}

/// Resolve an actor's legal class from a set of candidate classes.
///
/// Returns the single highest-priority class whose predicate accepts the
/// actor. Ties are broken by name (ascending) so that resolution stays
/// deterministic regardless of iteration order. `None` means the actor
/// has no standing under the jurisdiction.
pub fn resolve_class<'a, I>(classes: I, facts: &ActorFacts) -> Option<&'a LegalClass>
where
    I: IntoIterator<Item = &'a LegalClass>,
{
    classes
        .into_iter()
        .filter(|class| class.accepts(facts))
        .min_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)))
}
