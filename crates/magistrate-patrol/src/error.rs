//! Error types for patrol configuration and execution.

use magistrate_types::{ActorId, EnforcementAuthorityId, PatrolId, PatrolRouteId};
use thiserror::Error;

/// Errors raised by patrol routes, live patrols, and the controller.
#[derive(Debug, Error)]
pub enum PatrolError {
    /// The referenced route does not exist in the controller.
    #[error("patrol route not found: {0}")]
    RouteNotFound(PatrolRouteId),

    /// The referenced live patrol does not exist in the controller.
    #[error("patrol not found: {0}")]
    PatrolNotFound(PatrolId),

    /// A route with no waypoints cannot launch.
    #[error("patrol route {0} has no waypoints")]
    NoWaypoints(PatrolRouteId),

    /// A patrol cannot enter the patrolling phase below required strength.
    #[error("route {route}: authority {authority} requires {required} members, {available} present")]
    Understaffed {
        /// The route being staffed.
        route: PatrolRouteId,
        /// The authority whose requirement is unmet.
        authority: EnforcementAuthorityId,
        /// Headcount the route requires.
        required: u32,
        /// Headcount actually present.
        available: u32,
    },

    /// The world could not resolve an actor the patrol depends on.
    #[error("actor could not be resolved: {0}")]
    ActorUnresolved(ActorId),

    /// A configuration-time validation failed.
    #[error("invalid patrol configuration: {reason}")]
    InvalidConfig {
        /// Human-readable rejection reason.
        reason: String,
    },
}
