//! Data-driven administration of legal entities.
//!
//! Builders and in-game staff manage laws, classes, authorities, and
//! witness profiles through an [`AdminRegistry`]: a map from an
//! entity-type tag to a capability object offering create, clone, list,
//! search, and describe. Validation lives inside each capability and
//! surfaces as renderable rejection strings, so a front end can relay
//! them verbatim without knowing the entity types.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use thiserror::Error;

use magistrate_law::{EnforcementAuthority, Law, LegalClass, WitnessProfile};
use magistrate_types::{
    EnforcementAuthorityId, LawId, LegalClassId, OffenseCategory, WitnessProfileId,
};

use crate::authority::LegalAuthority;

/// A rejection suitable for relaying to the administrator verbatim.
#[derive(Debug, Error)]
pub enum AdminRejection {
    /// No capability is registered for the entity-type tag.
    #[error("no such entity type: {0}")]
    UnknownEntityType(String),

    /// No entity of that name exists under the capability.
    #[error("no {kind} named {name:?}")]
    UnknownEntity {
        /// The entity-type tag.
        kind: &'static str,
        /// The name that failed to resolve.
        name: String,
    },

    /// The mutation was rejected by validation.
    #[error("{0}")]
    Rejected(String),
}

impl AdminRejection {
    fn rejected(error: impl std::fmt::Display) -> Self {
        Self::Rejected(error.to_string())
    }
}

/// One entity type's administrative surface.
///
/// `args` carries the type-specific creation detail (a predicate name
/// for classes, an offense category for laws); capabilities that need
/// nothing ignore it.
pub trait AdminCapability: Send + Sync {
    /// The entity-type tag this capability is registered under.
    fn kind(&self) -> &'static str;

    /// Create a new entity with conservative defaults.
    ///
    /// # Errors
    ///
    /// Returns a renderable rejection when validation fails.
    fn create(
        &self,
        authority: &mut LegalAuthority,
        name: &str,
        args: &str,
    ) -> Result<String, AdminRejection>;

    /// Duplicate an existing entity under a new name.
    ///
    /// # Errors
    ///
    /// Returns a renderable rejection when the source is missing or the
    /// new name collides.
    fn clone_entity(
        &self,
        authority: &mut LegalAuthority,
        source: &str,
        new_name: &str,
    ) -> Result<String, AdminRejection>;

    /// Names of all entities of this type, sorted.
    fn list(&self, authority: &LegalAuthority) -> Vec<String>;

    /// Names containing the needle, case-insensitively.
    fn search(&self, authority: &LegalAuthority, needle: &str) -> Vec<String> {
        let needle = needle.to_lowercase();
        self.list(authority)
            .into_iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .collect()
    }

    /// A multi-line description of one entity.
    ///
    /// # Errors
    ///
    /// Returns a renderable rejection when the entity is missing.
    fn describe(&self, authority: &LegalAuthority, name: &str) -> Result<String, AdminRejection>;
}

/// The capability map, populated at startup.
#[derive(Default)]
pub struct AdminRegistry {
    capabilities: BTreeMap<&'static str, Box<dyn AdminCapability>>,
}

impl std::fmt::Debug for AdminRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl AdminRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in capabilities: `law`, `class`,
    /// `authority`, and `witness-profile`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(LawAdmin));
        registry.register(Box::new(ClassAdmin));
        registry.register(Box::new(AuthorityAdmin));
        registry.register(Box::new(WitnessProfileAdmin));
        registry
    }

    /// Install a capability under its own tag, replacing any previous
    /// one.
    pub fn register(&mut self, capability: Box<dyn AdminCapability>) {
        self.capabilities.insert(capability.kind(), capability);
    }

    /// Registered entity-type tags, sorted.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.capabilities.keys().copied().collect()
    }

    /// Resolve a capability by tag.
    ///
    /// # Errors
    ///
    /// Returns [`AdminRejection::UnknownEntityType`] for an unknown tag.
    pub fn capability(&self, kind: &str) -> Result<&dyn AdminCapability, AdminRejection> {
        self.capabilities
            .get(kind)
            .map(Box::as_ref)
            .ok_or_else(|| AdminRejection::UnknownEntityType(kind.to_owned()))
    }

    /// Dispatch a create through the tagged capability.
    ///
    /// # Errors
    ///
    /// Returns the capability's rejection, or an unknown-type rejection.
    pub fn create(
        &self,
        authority: &mut LegalAuthority,
        kind: &str,
        name: &str,
        args: &str,
    ) -> Result<String, AdminRejection> {
        self.capability(kind)?.create(authority, name, args)
    }

    /// Dispatch a clone through the tagged capability.
    ///
    /// # Errors
    ///
    /// Returns the capability's rejection, or an unknown-type rejection.
    pub fn clone_entity(
        &self,
        authority: &mut LegalAuthority,
        kind: &str,
        source: &str,
        new_name: &str,
    ) -> Result<String, AdminRejection> {
        self.capability(kind)?
            .clone_entity(authority, source, new_name)
    }

    /// Dispatch a describe through the tagged capability.
    ///
    /// # Errors
    ///
    /// Returns the capability's rejection, or an unknown-type rejection.
    pub fn describe(
        &self,
        authority: &LegalAuthority,
        kind: &str,
        name: &str,
    ) -> Result<String, AdminRejection> {
        self.capability(kind)?.describe(authority, name)
    }
}

// ---------------------------------------------------------------------------
// Built-in capabilities
// ---------------------------------------------------------------------------

/// Administration of laws. `args` is the offense category name.
struct LawAdmin;

impl LawAdmin {
    fn find<'a>(authority: &'a LegalAuthority, name: &str) -> Option<&'a Law> {
        authority.laws().find(|law| law.name == name)
    }
}

impl AdminCapability for LawAdmin {
    fn kind(&self) -> &'static str {
        "law"
    }

    fn create(
        &self,
        authority: &mut LegalAuthority,
        name: &str,
        args: &str,
    ) -> Result<String, AdminRejection> {
        let category = parse_category(args)?;
        let law = Law::new(LawId::new(), name, category);
        authority.add_law(law).map_err(AdminRejection::rejected)?;
        Ok(format!("created law {name:?} ({category})"))
    }

    fn clone_entity(
        &self,
        authority: &mut LegalAuthority,
        source: &str,
        new_name: &str,
    ) -> Result<String, AdminRejection> {
        let mut law = Self::find(authority, source)
            .cloned()
            .ok_or_else(|| AdminRejection::UnknownEntity {
                kind: self.kind(),
                name: source.to_owned(),
            })?;
        law.id = LawId::new();
        law.name = new_name.to_owned();
        authority.add_law(law).map_err(AdminRejection::rejected)?;
        Ok(format!("cloned law {source:?} as {new_name:?}"))
    }

    fn list(&self, authority: &LegalAuthority) -> Vec<String> {
        let mut names: Vec<String> = authority.laws().map(|law| law.name.clone()).collect();
        names.sort();
        names
    }

    fn describe(&self, authority: &LegalAuthority, name: &str) -> Result<String, AdminRejection> {
        let law = Self::find(authority, name).ok_or_else(|| AdminRejection::UnknownEntity {
            kind: self.kind(),
            name: name.to_owned(),
        })?;
        let mut out = format!("law {:?} ({})\n", law.name, law.category);
        let _ = writeln!(out, "  priority: {}", law.priority);
        let _ = writeln!(out, "  auto-apply: {}", law.auto_apply);
        let _ = writeln!(out, "  response: {:?}", law.response);
        let _ = writeln!(out, "  punishment: {:?}", law.punishment);
        let _ = writeln!(out, "  arrestable: {}", law.arrestable);
        let _ = writeln!(out, "  bail-eligible: {}", law.bail_eligible);
        let _ = writeln!(
            out,
            "  investigation window: {} ticks",
            law.investigation_window_ticks
        );
        Ok(out)
    }
}

/// Administration of legal classes. `args` is the name of a registered
/// actor predicate used as the membership test.
struct ClassAdmin;

impl ClassAdmin {
    fn find<'a>(authority: &'a LegalAuthority, name: &str) -> Option<&'a LegalClass> {
        authority.classes().find(|class| class.name == name)
    }
}

impl AdminCapability for ClassAdmin {
    fn kind(&self) -> &'static str {
        "class"
    }

    fn create(
        &self,
        authority: &mut LegalAuthority,
        name: &str,
        args: &str,
    ) -> Result<String, AdminRejection> {
        // Wrong-kind and unknown predicate names are caught here, at
        // configuration time.
        let membership = authority
            .registry()
            .actor(args)
            .map_err(AdminRejection::rejected)?;
        let class = LegalClass {
            id: LegalClassId::new(),
            name: name.to_owned(),
            membership,
            priority: 0,
            detainable_for_unpaid_fines: true,
        };
        authority.add_class(class).map_err(AdminRejection::rejected)?;
        Ok(format!("created class {name:?} with membership {args:?}"))
    }

    fn clone_entity(
        &self,
        authority: &mut LegalAuthority,
        source: &str,
        new_name: &str,
    ) -> Result<String, AdminRejection> {
        let mut class = Self::find(authority, source)
            .cloned()
            .ok_or_else(|| AdminRejection::UnknownEntity {
                kind: self.kind(),
                name: source.to_owned(),
            })?;
        class.id = LegalClassId::new();
        class.name = new_name.to_owned();
        authority.add_class(class).map_err(AdminRejection::rejected)?;
        Ok(format!("cloned class {source:?} as {new_name:?}"))
    }

    fn list(&self, authority: &LegalAuthority) -> Vec<String> {
        let mut names: Vec<String> = authority.classes().map(|c| c.name.clone()).collect();
        names.sort();
        names
    }

    fn describe(&self, authority: &LegalAuthority, name: &str) -> Result<String, AdminRejection> {
        let class = Self::find(authority, name).ok_or_else(|| AdminRejection::UnknownEntity {
            kind: self.kind(),
            name: name.to_owned(),
        })?;
        let mut out = format!("class {:?}\n", class.name);
        let _ = writeln!(out, "  membership: {}", class.membership.name());
        let _ = writeln!(out, "  priority: {}", class.priority);
        let _ = writeln!(
            out,
            "  detainable for unpaid fines: {}",
            class.detainable_for_unpaid_fines
        );
        Ok(out)
    }
}

/// Administration of enforcement authorities. Inclusion edges go through
/// [`LegalAuthority::add_inclusion`], which rejects cycles; the
/// capability relays that rejection as a string.
struct AuthorityAdmin;

impl AuthorityAdmin {
    fn find<'a>(
        authority: &'a LegalAuthority,
        name: &str,
    ) -> Option<&'a EnforcementAuthority> {
        authority.authorities().find(|a| a.name == name)
    }
}

impl AdminCapability for AuthorityAdmin {
    fn kind(&self) -> &'static str {
        "authority"
    }

    fn create(
        &self,
        authority: &mut LegalAuthority,
        name: &str,
        _args: &str,
    ) -> Result<String, AdminRejection> {
        let entity = EnforcementAuthority::new(EnforcementAuthorityId::new(), name);
        authority
            .add_authority(entity)
            .map_err(AdminRejection::rejected)?;
        Ok(format!("created authority {name:?}"))
    }

    fn clone_entity(
        &self,
        authority: &mut LegalAuthority,
        source: &str,
        new_name: &str,
    ) -> Result<String, AdminRejection> {
        let mut entity = Self::find(authority, source)
            .cloned()
            .ok_or_else(|| AdminRejection::UnknownEntity {
                kind: self.kind(),
                name: source.to_owned(),
            })?;
        entity.id = EnforcementAuthorityId::new();
        entity.name = new_name.to_owned();
        // Inclusion edges are not carried over; a clone starts from the
        // same capabilities but its own place in the graph.
        entity.included.clear();
        authority
            .add_authority(entity)
            .map_err(AdminRejection::rejected)?;
        Ok(format!("cloned authority {source:?} as {new_name:?}"))
    }

    fn list(&self, authority: &LegalAuthority) -> Vec<String> {
        let mut names: Vec<String> = authority.authorities().map(|a| a.name.clone()).collect();
        names.sort();
        names
    }

    fn describe(&self, authority: &LegalAuthority, name: &str) -> Result<String, AdminRejection> {
        let entity = Self::find(authority, name).ok_or_else(|| AdminRejection::UnknownEntity {
            kind: self.kind(),
            name: name.to_owned(),
        })?;
        let mut out = format!("authority {:?}\n", entity.name);
        let _ = writeln!(out, "  can accuse: {}", entity.can_accuse);
        let _ = writeln!(out, "  can convict: {}", entity.can_convict);
        let _ = writeln!(out, "  can forgive: {}", entity.can_forgive);
        let _ = writeln!(out, "  accusable classes: {}", entity.accusable_classes.len());
        let _ = writeln!(
            out,
            "  arrestable classes: {}",
            entity.arrestable_classes.len()
        );
        let _ = writeln!(out, "  includes: {}", entity.included.len());
        Ok(out)
    }
}

/// Administration of witness profiles.
struct WitnessProfileAdmin;

impl WitnessProfileAdmin {
    fn find<'a>(authority: &'a LegalAuthority, name: &str) -> Option<&'a WitnessProfile> {
        authority.witness_profiles().find(|p| p.name == name)
    }
}

impl AdminCapability for WitnessProfileAdmin {
    fn kind(&self) -> &'static str {
        "witness-profile"
    }

    fn create(
        &self,
        authority: &mut LegalAuthority,
        name: &str,
        _args: &str,
    ) -> Result<String, AdminRejection> {
        let profile = WitnessProfile::new(WitnessProfileId::new(), name);
        authority
            .add_witness_profile(profile)
            .map_err(AdminRejection::rejected)?;
        Ok(format!("created witness profile {name:?}"))
    }

    fn clone_entity(
        &self,
        authority: &mut LegalAuthority,
        source: &str,
        new_name: &str,
    ) -> Result<String, AdminRejection> {
        let mut profile = Self::find(authority, source)
            .cloned()
            .ok_or_else(|| AdminRejection::UnknownEntity {
                kind: self.kind(),
                name: source.to_owned(),
            })?;
        profile.id = WitnessProfileId::new();
        profile.name = new_name.to_owned();
        authority
            .add_witness_profile(profile)
            .map_err(AdminRejection::rejected)?;
        Ok(format!("cloned witness profile {source:?} as {new_name:?}"))
    }

    fn list(&self, authority: &LegalAuthority) -> Vec<String> {
        let mut names: Vec<String> = authority
            .witness_profiles()
            .map(|p| p.name.clone())
            .collect();
        names.sort();
        names
    }

    fn describe(&self, authority: &LegalAuthority, name: &str) -> Result<String, AdminRejection> {
        let profile = Self::find(authority, name).ok_or_else(|| AdminRejection::UnknownEntity {
            kind: self.kind(),
            name: name.to_owned(),
        })?;
        let mut out = format!("witness profile {:?}\n", profile.name);
        let _ = writeln!(out, "  cooperating: {}", profile.cooperating.len());
        let _ = writeln!(out, "  reliability: {}", profile.reliability);
        let _ = writeln!(out, "  min notice skill: {}", profile.min_notice_skill);
        let _ = writeln!(
            out,
            "  identity disclosure: {}",
            profile
                .identity_disclosure
                .as_ref()
                .map_or("none", magistrate_law::ActorPredicate::name)
        );
        Ok(out)
    }
}

fn parse_category(args: &str) -> Result<OffenseCategory, AdminRejection> {
    OffenseCategory::ALL
        .iter()
        .copied()
        .find(|c| c.to_string() == args)
        .ok_or_else(|| AdminRejection::Rejected(format!("unknown offense category: {args:?}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use magistrate_types::JurisdictionId;

    use crate::config::JusticeConfig;

    use super::*;

    fn jurisdiction() -> LegalAuthority {
        LegalAuthority::new(JurisdictionId::new(), "rivertown", JusticeConfig::default())
    }

    #[test]
    fn create_list_describe_round_trip() {
        let registry = AdminRegistry::with_builtins();
        let mut authority = jurisdiction();

        registry
            .create(&mut authority, "law", "petty-theft", "theft")
            .unwrap();
        assert_eq!(
            registry.capability("law").unwrap().list(&authority),
            vec![String::from("petty-theft")]
        );
        let described = registry.describe(&authority, "law", "petty-theft").unwrap();
        assert!(described.contains("petty-theft"));
        assert!(described.contains("auto-apply: false"));
    }

    #[test]
    fn duplicate_name_is_a_renderable_rejection() {
        let registry = AdminRegistry::with_builtins();
        let mut authority = jurisdiction();

        registry
            .create(&mut authority, "authority", "town-watch", "")
            .unwrap();
        let rejection = registry
            .create(&mut authority, "authority", "town-watch", "")
            .unwrap_err();
        assert!(rejection.to_string().contains("town-watch"));
    }

    #[test]
    fn class_creation_validates_predicate_kind() {
        let registry = AdminRegistry::with_builtins();
        let mut authority = jurisdiction();
        authority
            .registry_mut()
            .register_multiplier("night-bonus", |_| rust_decimal::Decimal::TWO)
            .unwrap();

        // A multiplier cannot serve as a membership test.
        let rejection = registry
            .create(&mut authority, "class", "nobles", "night-bonus")
            .unwrap_err();
        assert!(matches!(rejection, AdminRejection::Rejected(_)));

        // An unregistered name is also caught at configuration time.
        assert!(
            registry
                .create(&mut authority, "class", "nobles", "no-such-predicate")
                .is_err()
        );
    }

    #[test]
    fn clone_copies_fields_under_a_new_identity() {
        let registry = AdminRegistry::with_builtins();
        let mut authority = jurisdiction();
        registry
            .create(&mut authority, "law", "petty-theft", "theft")
            .unwrap();

        registry
            .clone_entity(&mut authority, "law", "petty-theft", "grand-theft")
            .unwrap();
        let names = registry.capability("law").unwrap().list(&authority);
        assert_eq!(names, vec!["grand-theft".to_owned(), "petty-theft".to_owned()]);
        // Cloning to an existing name is rejected.
        assert!(
            registry
                .clone_entity(&mut authority, "law", "petty-theft", "grand-theft")
                .is_err()
        );
    }

    #[test]
    fn search_is_case_insensitive() {
        let registry = AdminRegistry::with_builtins();
        let mut authority = jurisdiction();
        registry
            .create(&mut authority, "authority", "Town-Watch", "")
            .unwrap();
        registry
            .create(&mut authority, "authority", "harbor-guard", "")
            .unwrap();

        let capability = registry.capability("authority").unwrap();
        assert_eq!(
            capability.search(&authority, "WATCH"),
            vec![String::from("Town-Watch")]
        );
    }

    #[test]
    fn unknown_entity_type_is_rejected() {
        let registry = AdminRegistry::with_builtins();
        let mut authority = jurisdiction();
        assert!(matches!(
            registry.create(&mut authority, "planet", "mars", ""),
            Err(AdminRejection::UnknownEntityType(_))
        ));
    }
}
