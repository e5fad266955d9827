//! Behavioral strategies for live patrols.
//!
//! A strategy drives the `Patrolling` phase: waypoint advancement,
//! lingering, target acquisition, and whether engagements begin with a
//! warning. Strategies are stateless units; all per-patrol state lives on
//! the [`Patrol`] itself, so one strategy instance serves every patrol of
//! its kind.

use magistrate_types::{LocationId, OffenseCategory, PatrolStrategyKind};

use crate::error::PatrolError;
use crate::patrol::{Patrol, PatrolContext, SightedOffender};
use crate::route::PatrolRoute;

/// The behavior a patrol follows while in its patrolling phase.
pub trait PatrolStrategy: Send + Sync {
    /// Which strategy kind this is.
    fn kind(&self) -> PatrolStrategyKind;

    /// Whether engagements under this strategy begin with a warning when
    /// the law's response calls for one.
    fn allows_warning(&self) -> bool {
        true
    }

    /// Drive one fast-cadence tick of the patrolling phase.
    ///
    /// # Errors
    ///
    /// Propagates world errors from the context.
    fn patrol_tick(
        &self,
        patrol: &mut Patrol,
        route: &PatrolRoute,
        ctx: &mut dyn PatrolContext,
    ) -> Result<(), PatrolError>;
}

/// Resolve a strategy kind to its (stateless) implementation.
pub fn strategy_for(kind: PatrolStrategyKind) -> &'static dyn PatrolStrategy {
    match kind {
        PatrolStrategyKind::ArmedRoaming => &ArmedRoaming,
        PatrolStrategyKind::Stationary => &Stationary,
        PatrolStrategyKind::Judge => &Judge,
        PatrolStrategyKind::Sheriff => &Sheriff,
    }
}

/// Pick the most urgent actionable sighting at a location.
fn best_sighting(ctx: &dyn PatrolContext, at: LocationId) -> Option<SightedOffender> {
    ctx.sighted_offenders(at)
        .into_iter()
        .filter(|s| ctx.crime_actionable(s.crime))
        .max_by_key(|s| s.response.severity())
}

// ---------------------------------------------------------------------------
// ArmedRoaming
// ---------------------------------------------------------------------------

/// Walks the route, lingers at each waypoint, warns before escalating.
struct ArmedRoaming;

impl PatrolStrategy for ArmedRoaming {
    fn kind(&self) -> PatrolStrategyKind {
        PatrolStrategyKind::ArmedRoaming
    }

    fn patrol_tick(
        &self,
        patrol: &mut Patrol,
        route: &PatrolRoute,
        ctx: &mut dyn PatrolContext,
    ) -> Result<(), PatrolError> {
        if patrol.target().is_some() {
            patrol.engage_target(ctx, self.allows_warning())?;
            return Ok(());
        }
        let Some(waypoint) = patrol.current_waypoint(route) else {
            patrol.begin_return();
            return Ok(());
        };
        if !patrol.move_roster(ctx, waypoint)? {
            return Ok(());
        }
        if let Some(sighting) = best_sighting(ctx, waypoint) {
            if patrol.acquire_target(sighting) {
                patrol.engage_target(ctx, self.allows_warning())?;
                return Ok(());
            }
        }
        if patrol.tick_linger() {
            patrol.advance_waypoint(route);
            if patrol.route_exhausted(route) {
                patrol.begin_return();
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stationary
// ---------------------------------------------------------------------------

/// Holds the first waypoint for the route's linger duration, enforcing
/// only what comes within sight of the post.
struct Stationary;

impl PatrolStrategy for Stationary {
    fn kind(&self) -> PatrolStrategyKind {
        PatrolStrategyKind::Stationary
    }

    fn patrol_tick(
        &self,
        patrol: &mut Patrol,
        route: &PatrolRoute,
        ctx: &mut dyn PatrolContext,
    ) -> Result<(), PatrolError> {
        if patrol.target().is_some() {
            patrol.engage_target(ctx, self.allows_warning())?;
            return Ok(());
        }
        let Some(post) = route.marshalling_point() else {
            patrol.begin_return();
            return Ok(());
        };
        if !patrol.move_roster(ctx, post)? {
            return Ok(());
        }
        if let Some(sighting) = best_sighting(ctx, post) {
            if patrol.acquire_target(sighting) {
                patrol.engage_target(ctx, self.allows_warning())?;
                return Ok(());
            }
        }
        // The linger counts the whole shift for a fixed post.
        if patrol.tick_linger() {
            patrol.begin_return();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Judge
// ---------------------------------------------------------------------------

/// Court presence. Holds the chamber, never warns, and engages only
/// contempt committed in front of the bench.
struct Judge;

impl PatrolStrategy for Judge {
    fn kind(&self) -> PatrolStrategyKind {
        PatrolStrategyKind::Judge
    }

    fn allows_warning(&self) -> bool {
        false
    }

    fn patrol_tick(
        &self,
        patrol: &mut Patrol,
        route: &PatrolRoute,
        ctx: &mut dyn PatrolContext,
    ) -> Result<(), PatrolError> {
        if patrol.target().is_some() {
            patrol.engage_target(ctx, self.allows_warning())?;
            return Ok(());
        }
        let Some(chamber) = route.marshalling_point() else {
            patrol.begin_return();
            return Ok(());
        };
        if !patrol.move_roster(ctx, chamber)? {
            return Ok(());
        }
        let contempt = ctx
            .sighted_offenders(chamber)
            .into_iter()
            .filter(|s| s.category == OffenseCategory::Contempt)
            .find(|s| ctx.crime_actionable(s.crime));
        if let Some(sighting) = contempt {
            if patrol.acquire_target(sighting) {
                patrol.engage_target(ctx, self.allows_warning())?;
                return Ok(());
            }
        }
        if patrol.tick_linger() {
            patrol.begin_return();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sheriff
// ---------------------------------------------------------------------------

/// Roams like an armed patrol, prioritizes the most severe known crime,
/// and sweeps each waypoint for debtors detainable over overdue fines.
struct Sheriff;

impl PatrolStrategy for Sheriff {
    fn kind(&self) -> PatrolStrategyKind {
        PatrolStrategyKind::Sheriff
    }

    fn patrol_tick(
        &self,
        patrol: &mut Patrol,
        route: &PatrolRoute,
        ctx: &mut dyn PatrolContext,
    ) -> Result<(), PatrolError> {
        if patrol.target().is_some() {
            patrol.engage_target(ctx, self.allows_warning())?;
            return Ok(());
        }
        let Some(waypoint) = patrol.current_waypoint(route) else {
            patrol.begin_return();
            return Ok(());
        };
        if !patrol.move_roster(ctx, waypoint)? {
            return Ok(());
        }
        if let Some(sighting) = best_sighting(ctx, waypoint) {
            if patrol.acquire_target(sighting) {
                patrol.engage_target(ctx, self.allows_warning())?;
                return Ok(());
            }
        }
        if let Some(debtor) = ctx.overdue_fine_debtors(waypoint).first().copied() {
            ctx.detain_for_fines(patrol.leader(), debtor)?;
            return Ok(());
        }
        if patrol.tick_linger() {
            patrol.advance_waypoint(route);
            if patrol.route_exhausted(route) {
                patrol.begin_return();
            }
        }
        Ok(())
    }
}
