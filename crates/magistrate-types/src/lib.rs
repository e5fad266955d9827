//! Shared type definitions for the Magistrate legal simulation.
//!
//! This crate holds the vocabulary every other crate speaks: strongly-typed
//! identifiers, the enumerations that classify offenses and lifecycle
//! states, and the small value structs that cross crate boundaries
//! (punishment outcomes, appearance snapshots, outbound legal events).
//!
//! It deliberately contains no behavior beyond constructors and trivial
//! accessors -- the rule engine lives in `magistrate-law`, patrol logic in
//! `magistrate-patrol`, and the jurisdiction aggregate in `magistrate-core`.

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::{
    AdjudicationState, CharacteristicKind, DisclosureState, LegalEventKind, OffenseCategory,
    PatrolPhase, PatrolStrategyKind, TimeOfDay,
};
pub use ids::{
    ActorId, CrimeId, CurrencyId, EnforcementAuthorityId, FineId, JurisdictionId, LawId,
    LegalClassId, LocationId, PatrolId, PatrolRouteId, WitnessProfileId,
};
pub use structs::{AppearanceSnapshot, LegalEvent, PunishmentOutcome, StaffingRequirement};
