//! Patrol route templates.
//!
//! A route is configuration, not behavior: it names where a patrol walks,
//! who must staff it, when it may run, and which strategy its live
//! patrols follow. The controller decides whether a route actually
//! launches on any given pass.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use magistrate_types::{
    LocationId, PatrolRouteId, PatrolStrategyKind, StaffingRequirement, TimeOfDay,
};

use crate::error::PatrolError;

// ---------------------------------------------------------------------------
// LaunchFacts / LaunchPredicate
// ---------------------------------------------------------------------------

/// The world facts a launch predicate may consult.
#[derive(Debug, Clone, Copy)]
pub struct LaunchFacts {
    /// Current world tick.
    pub tick: u64,
    /// Current phase of the simulated day.
    pub time_of_day: TimeOfDay,
    /// Total idle enforcers across all authorities.
    pub idle_enforcers: u32,
}

/// A named, opaque launch condition attached to a route.
///
/// Same shape as the actor/offense predicate handles in the law crate:
/// the name is the registry identity, the closure is the behavior.
#[derive(Clone)]
pub struct LaunchPredicate {
    name: Arc<str>,
    func: Arc<dyn Fn(&LaunchFacts) -> bool + Send + Sync>,
}

impl LaunchPredicate {
    /// Wrap a closure under a registry name.
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&LaunchFacts) -> bool + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            func: Arc::new(func),
        }
    }

    /// The registry name this handle was created under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the condition.
    pub fn eval(&self, facts: &LaunchFacts) -> bool {
        (self.func)(facts)
    }
}

impl fmt::Debug for LaunchPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchPredicate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// PatrolRoute
// ---------------------------------------------------------------------------

/// An administrator-authored patrol template.
#[derive(Debug, Clone)]
pub struct PatrolRoute {
    /// Unique identifier.
    pub id: PatrolRouteId,
    /// Display name, unique within the owning jurisdiction.
    pub name: String,
    /// Ordered waypoint locations. The first waypoint doubles as the
    /// marshalling point.
    pub waypoints: Vec<LocationId>,
    /// Per-authority headcounts required before launch.
    pub staffing: Vec<StaffingRequirement>,
    /// Phases of day during which the route may launch. Empty means never.
    pub active_phases: BTreeSet<TimeOfDay>,
    /// Ticks a patrol lingers at each waypoint before advancing.
    pub linger_ticks: u64,
    /// Launch priority; higher routes are staffed first.
    pub priority: i32,
    /// Optional extra launch condition.
    pub launch: Option<LaunchPredicate>,
    /// Whether administrators have marked the route fit to run.
    pub ready: bool,
    /// Behavioral strategy assigned to live patrols.
    pub strategy: PatrolStrategyKind,
}

impl PatrolRoute {
    /// Create a route with no waypoints or staffing, not yet ready.
    pub fn new(id: PatrolRouteId, name: &str, strategy: PatrolStrategyKind) -> Self {
        Self {
            id,
            name: name.to_owned(),
            waypoints: Vec::new(),
            staffing: Vec::new(),
            active_phases: BTreeSet::new(),
            linger_ticks: 0,
            priority: 0,
            launch: None,
            ready: false,
            strategy,
        }
    }

    /// Validate the route for launch eligibility.
    ///
    /// # Errors
    ///
    /// Returns [`PatrolError::NoWaypoints`] for an empty waypoint list and
    /// [`PatrolError::InvalidConfig`] for zero-count staffing entries or a
    /// route with no staffing at all.
    pub fn validate(&self) -> Result<(), PatrolError> {
        if self.waypoints.is_empty() {
            return Err(PatrolError::NoWaypoints(self.id));
        }
        if self.staffing.is_empty() {
            return Err(PatrolError::InvalidConfig {
                reason: format!("route {} has no staffing requirements", self.name),
            });
        }
        if self.staffing.iter().any(|req| req.count == 0) {
            return Err(PatrolError::InvalidConfig {
                reason: format!("route {} has a zero-count staffing requirement", self.name),
            });
        }
        Ok(())
    }

    /// The marshalling point: the first waypoint.
    pub fn marshalling_point(&self) -> Option<LocationId> {
        self.waypoints.first().copied()
    }

    /// Total headcount across all staffing requirements.
    pub fn total_staffing(&self) -> u32 {
        self.staffing
            .iter()
            .fold(0_u32, |sum, req| sum.saturating_add(req.count))
    }

    /// Whether the route may launch at the given phase of day, passing its
    /// readiness flag and launch predicate.
    pub fn may_launch(&self, facts: &LaunchFacts) -> bool {
        self.ready
            && self.active_phases.contains(&facts.time_of_day)
            && self.launch.as_ref().is_none_or(|p| p.eval(facts))
    }
}

#[cfg(test)]
mod tests {
    use magistrate_types::EnforcementAuthorityId;

    use super::*;

    fn facts(time_of_day: TimeOfDay) -> LaunchFacts {
        LaunchFacts {
            tick: 100,
            time_of_day,
            idle_enforcers: 5,
        }
    }

    fn staffed_route() -> PatrolRoute {
        let mut route = PatrolRoute::new(
            PatrolRouteId::new(),
            "market-round",
            PatrolStrategyKind::ArmedRoaming,
        );
        route.waypoints = vec![LocationId::new(), LocationId::new()];
        route.staffing = vec![StaffingRequirement {
            authority: EnforcementAuthorityId::new(),
            count: 2,
        }];
        route.active_phases.insert(TimeOfDay::Night);
        route.ready = true;
        route
    }

    #[test]
    fn empty_waypoints_rejected() {
        let mut route = staffed_route();
        route.waypoints.clear();
        assert!(matches!(
            route.validate(),
            Err(PatrolError::NoWaypoints(_))
        ));
    }

    #[test]
    fn zero_count_staffing_rejected() {
        let mut route = staffed_route();
        if let Some(req) = route.staffing.first_mut() {
            req.count = 0;
        }
        assert!(matches!(
            route.validate(),
            Err(PatrolError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn launch_gated_by_phase_and_readiness() {
        let mut route = staffed_route();
        assert!(route.may_launch(&facts(TimeOfDay::Night)));
        assert!(!route.may_launch(&facts(TimeOfDay::Morning)));

        route.ready = false;
        assert!(!route.may_launch(&facts(TimeOfDay::Night)));
    }

    #[test]
    fn launch_predicate_can_veto() {
        let mut route = staffed_route();
        route.launch = Some(LaunchPredicate::new("quiet-nights", |facts| {
            facts.idle_enforcers >= 10
        }));
        assert!(!route.may_launch(&facts(TimeOfDay::Night)));

        route.launch = Some(LaunchPredicate::new("always", |_| true));
        assert!(route.may_launch(&facts(TimeOfDay::Night)));
    }
}
