//! Patrol routes, live-patrol state machines, and the launch controller.
//!
//! A [`PatrolRoute`] is an administrator-authored template: waypoints,
//! staffing, activation windows, and a behavioral strategy. The
//! [`PatrolController`] matches routes against the jurisdiction's idle
//! enforcer pool on the medium cadence and launches [`Patrol`] instances,
//! which then step through their phase machine on the fast cadence.
//!
//! All world interaction goes through the [`PatrolContext`] seam so the
//! state machines stay testable without a running world.
//!
//! # Modules
//!
//! - [`route`] -- Patrol route templates ([`PatrolRoute`])
//! - [`patrol`] -- Live patrol state machine ([`Patrol`], [`PatrolContext`])
//! - [`strategy`] -- Behavioral strategies ([`PatrolStrategy`])
//! - [`controller`] -- Staffing and launch ([`PatrolController`])
//! - [`error`] -- Error types ([`PatrolError`])

pub mod controller;
pub mod error;
pub mod patrol;
pub mod route;
pub mod strategy;

pub use controller::{IdlePool, PatrolController};
pub use error::PatrolError;
pub use patrol::{EngagementStep, Patrol, PatrolContext, SightedOffender};
pub use route::{LaunchFacts, LaunchPredicate, PatrolRoute};
pub use strategy::{PatrolStrategy, strategy_for};
