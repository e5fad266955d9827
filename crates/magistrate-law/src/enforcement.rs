//! Enforcer capability bundles and the authority inclusion graph.
//!
//! An [`EnforcementAuthority`] names what an enforcer role may do --
//! accuse, convict, forgive -- and which legal classes it may accuse or
//! arrest. Authorities include one another (a sheriff includes a
//! constable's powers); the inclusion relation must stay acyclic, and the
//! transitive closure is what enforcement checks actually consult.
//!
//! Graph operations take the owning jurisdiction's authority map so the
//! closure can be computed without back-references.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use magistrate_types::{EnforcementAuthorityId, LegalClassId};

use crate::error::LawError;

/// A named bundle of enforcement capabilities over legal classes.
#[derive(Debug, Clone)]
pub struct EnforcementAuthority {
    /// Unique identifier.
    pub id: EnforcementAuthorityId,
    /// Display name, unique within the owning jurisdiction.
    pub name: String,
    /// May formally accuse offenders.
    pub can_accuse: bool,
    /// May convict (sit in judgement).
    pub can_convict: bool,
    /// May forgive crimes outright.
    pub can_forgive: bool,
    /// Classes whose members this authority may accuse.
    pub accusable_classes: BTreeSet<LegalClassId>,
    /// Classes whose members this authority may arrest.
    pub arrestable_classes: BTreeSet<LegalClassId>,
    /// Other authorities whose capabilities this one includes.
    pub included: BTreeSet<EnforcementAuthorityId>,
}

impl EnforcementAuthority {
    /// Create an authority with no capabilities and no inclusions.
    pub fn new(id: EnforcementAuthorityId, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            can_accuse: false,
            can_convict: false,
            can_forgive: false,
            accusable_classes: BTreeSet::new(),
            arrestable_classes: BTreeSet::new(),
            included: BTreeSet::new(),
        }
    }
}

/// Compute the transitive closure of inclusion for an authority.
///
/// The returned set contains the root itself. Traversal tracks visited
/// nodes, so even a corrupted (cyclic) graph terminates; missing ids are
/// skipped rather than failing, since deletion of an included authority is
/// an ordinary event.
pub fn all_included(
    authorities: &BTreeMap<EnforcementAuthorityId, EnforcementAuthority>,
    root: EnforcementAuthorityId,
) -> BTreeSet<EnforcementAuthorityId> {
    let mut closure = BTreeSet::new();
    let mut queue = VecDeque::from([root]);

    while let Some(id) = queue.pop_front() {
        if !closure.insert(id) {
            continue;
        }
        if let Some(authority) = authorities.get(&id) {
            for &included in &authority.included {
                if !closure.contains(&included) {
                    queue.push_back(included);
                }
            }
        }
    }

    closure
}

/// Add an inclusion edge, rejecting edits that would form a cycle.
///
/// # Errors
///
/// Returns [`LawError::AuthorityNotFound`] if either endpoint is missing,
/// and [`LawError::InclusionCycle`] if `included`'s closure already
/// contains `includer` (including the self-edge case).
pub fn try_add_inclusion(
    authorities: &mut BTreeMap<EnforcementAuthorityId, EnforcementAuthority>,
    includer: EnforcementAuthorityId,
    included: EnforcementAuthorityId,
) -> Result<(), LawError> {
    if !authorities.contains_key(&includer) {
        return Err(LawError::AuthorityNotFound(includer));
    }
    if !authorities.contains_key(&included) {
        return Err(LawError::AuthorityNotFound(included));
    }
    if all_included(authorities, included).contains(&includer) {
        return Err(LawError::InclusionCycle { includer, included });
    }
    if let Some(authority) = authorities.get_mut(&includer) {
        authority.included.insert(included);
    }
    Ok(())
}

/// Whether an authority (directly or through inclusion) may arrest
/// members of the given class.
pub fn authority_can_arrest(
    authorities: &BTreeMap<EnforcementAuthorityId, EnforcementAuthority>,
    authority: EnforcementAuthorityId,
    class: LegalClassId,
) -> bool {
    all_included(authorities, authority)
        .iter()
        .filter_map(|id| authorities.get(id))
        .any(|a| a.arrestable_classes.contains(&class))
}

/// Whether an authority (directly or through inclusion) may accuse
/// members of the given class.
pub fn authority_can_accuse(
    authorities: &BTreeMap<EnforcementAuthorityId, EnforcementAuthority>,
    authority: EnforcementAuthorityId,
    class: LegalClassId,
) -> bool {
    all_included(authorities, authority)
        .iter()
        .filter_map(|id| authorities.get(id))
        .any(|a| a.can_accuse && a.accusable_classes.contains(&class))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(names: &[&str]) -> (BTreeMap<EnforcementAuthorityId, EnforcementAuthority>, Vec<EnforcementAuthorityId>) {
        let mut map = BTreeMap::new();
        let mut ids = Vec::new();
        for name in names {
            let id = EnforcementAuthorityId::new();
            map.insert(id, EnforcementAuthority::new(id, name));
            ids.push(id);
        }
        (map, ids)
    }

    #[test]
    fn closure_includes_root_and_transitives() {
        let (mut map, ids) = graph(&["sheriff", "constable", "watchman"]);
        let (sheriff, constable, watchman) = (
            ids.first().copied(),
            ids.get(1).copied(),
            ids.get(2).copied(),
        );
        let (Some(sheriff), Some(constable), Some(watchman)) = (sheriff, constable, watchman)
        else {
            return;
        };

        assert!(try_add_inclusion(&mut map, sheriff, constable).is_ok());
        assert!(try_add_inclusion(&mut map, constable, watchman).is_ok());

        let closure = all_included(&map, sheriff);
        assert_eq!(closure.len(), 3);
        assert!(closure.contains(&sheriff));
        assert!(closure.contains(&watchman));
    }

    #[test]
    fn cycle_forming_edit_rejected() {
        let (mut map, ids) = graph(&["a", "b", "c"]);
        let (Some(a), Some(b), Some(c)) = (
            ids.first().copied(),
            ids.get(1).copied(),
            ids.get(2).copied(),
        ) else {
            return;
        };

        assert!(try_add_inclusion(&mut map, a, b).is_ok());
        assert!(try_add_inclusion(&mut map, b, c).is_ok());

        // Closing the loop c -> a must be rejected, and state unchanged.
        let result = try_add_inclusion(&mut map, c, a);
        assert!(matches!(result, Err(LawError::InclusionCycle { .. })));
        assert!(map.get(&c).is_some_and(|auth| auth.included.is_empty()));
    }

    #[test]
    fn self_inclusion_rejected() {
        let (mut map, ids) = graph(&["solo"]);
        let Some(solo) = ids.first().copied() else {
            return;
        };
        let result = try_add_inclusion(&mut map, solo, solo);
        assert!(matches!(result, Err(LawError::InclusionCycle { .. })));
    }

    #[test]
    fn missing_endpoint_rejected() {
        let (mut map, ids) = graph(&["only"]);
        let Some(only) = ids.first().copied() else {
            return;
        };
        let ghost = EnforcementAuthorityId::new();
        assert!(matches!(
            try_add_inclusion(&mut map, only, ghost),
            Err(LawError::AuthorityNotFound(_))
        ));
    }

    #[test]
    fn arrest_capability_flows_through_inclusion() {
        let (mut map, ids) = graph(&["sheriff", "constable"]);
        let (Some(sheriff), Some(constable)) = (ids.first().copied(), ids.get(1).copied()) else {
            return;
        };

        let commoner = LegalClassId::new();
        if let Some(auth) = map.get_mut(&constable) {
            auth.arrestable_classes.insert(commoner);
        }
        assert!(try_add_inclusion(&mut map, sheriff, constable).is_ok());

        assert!(authority_can_arrest(&map, sheriff, commoner));
        assert!(!authority_can_arrest(&map, constable, LegalClassId::new()));
    }

    #[test]
    fn deleted_inclusion_target_is_skipped() {
        let (mut map, ids) = graph(&["sheriff", "constable"]);
        let (Some(sheriff), Some(constable)) = (ids.first().copied(), ids.get(1).copied()) else {
            return;
        };
        assert!(try_add_inclusion(&mut map, sheriff, constable).is_ok());
        map.remove(&constable);

        // The dangling id still appears in the closure but resolves to
        // nothing; capability checks simply see no granting authority.
        let closure = all_included(&map, sheriff);
        assert!(closure.contains(&constable));
        assert!(!authority_can_arrest(&map, sheriff, LegalClassId::new()));
    }
}
