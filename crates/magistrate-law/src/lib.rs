//! Rule model and crime lifecycle for the Magistrate legal simulation.
//!
//! This crate contains the logic layer for the legal rule engine --
//! everything that classifies actors, matches offenses against laws, and
//! tracks a crime's life from commission to resolution, without touching
//! I/O. It sits between `magistrate-types` (data structures) and
//! `magistrate-core` (the jurisdiction aggregate and scheduling).
//!
//! # Modules
//!
//! - [`predicate`] -- Named, typed, opaque callables ([`PredicateRegistry`])
//! - [`legal_class`] -- Predicate-based actor classification ([`LegalClass`])
//! - [`enforcement`] -- Enforcer capability bundles and the acyclic
//!   inclusion graph ([`EnforcementAuthority`])
//! - [`law`] -- Offense rules, response and punishment strategies ([`Law`])
//! - [`crime`] -- Realized violations and their lifecycle ([`Crime`])
//! - [`witness`] -- Probabilistic disclosure model ([`WitnessProfile`])
//! - [`error`] -- Error types for all rule operations ([`LawError`])

pub mod crime;
pub mod enforcement;
pub mod error;
pub mod law;
pub mod legal_class;
pub mod predicate;
pub mod witness;

pub use crime::Crime;
pub use enforcement::{
    EnforcementAuthority, all_included, authority_can_accuse, authority_can_arrest,
    try_add_inclusion,
};
pub use error::LawError;
pub use law::{EnforcementResponse, Law, PunishmentStrategy};
pub use legal_class::{LegalClass, resolve_class};
pub use predicate::{
    ActorFacts, ActorMultiplier, ActorPredicate, OffenseFacts, OffensePredicate, PredicateKind,
    PredicateRegistry,
};
pub use witness::{WitnessOutcome, WitnessProfile, report_crime};
