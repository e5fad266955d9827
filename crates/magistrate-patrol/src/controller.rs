//! Staffing and launch of patrols from their routes.
//!
//! The controller runs on the medium cadence: it matches ready routes
//! against the jurisdiction's idle enforcer pool, launches patrols where
//! staffing is met, and drives live patrols on the fast cadence. One
//! controller serves one jurisdiction.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{info, warn};

use magistrate_types::{
    ActorId, EnforcementAuthorityId, PatrolId, PatrolPhase, PatrolRouteId, TimeOfDay,
};

use crate::error::PatrolError;
use crate::patrol::{Patrol, PatrolContext};
use crate::route::{LaunchFacts, PatrolRoute};
use crate::strategy::strategy_for;

/// Idle enforcers grouped by authority.
///
/// Callers expand authority inclusion before building the pool, so an
/// enforcer holding a sheriff's commission also appears under every
/// authority the sheriff's closure contains.
pub type IdlePool = BTreeMap<EnforcementAuthorityId, BTreeSet<ActorId>>;

/// Launches and drives patrols for one jurisdiction.
#[derive(Debug, Default)]
pub struct PatrolController {
    routes: BTreeMap<PatrolRouteId, PatrolRoute>,
    patrols: BTreeMap<PatrolId, Patrol>,
    running: BTreeMap<PatrolRouteId, PatrolId>,
}

impl PatrolController {
    /// Create an empty controller.
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Route administration ----

    /// Register a route.
    ///
    /// # Errors
    ///
    /// Returns [`PatrolError::InvalidConfig`] for a duplicate route name
    /// and propagates the route's own validation errors.
    pub fn add_route(&mut self, route: PatrolRoute) -> Result<(), PatrolError> {
        route.validate()?;
        if self.routes.values().any(|r| r.name == route.name) {
            return Err(PatrolError::InvalidConfig {
                reason: format!("duplicate route name: {}", route.name),
            });
        }
        self.routes.insert(route.id, route);
        Ok(())
    }

    /// Remove a route, aborting its live patrol if one is out.
    ///
    /// # Errors
    ///
    /// Returns [`PatrolError::RouteNotFound`] when the route is unknown.
    pub fn remove_route(
        &mut self,
        id: PatrolRouteId,
        ctx: &mut dyn PatrolContext,
    ) -> Result<(), PatrolError> {
        if self.routes.remove(&id).is_none() {
            return Err(PatrolError::RouteNotFound(id));
        }
        if let Some(patrol_id) = self.running.remove(&id) {
            if let Some(mut patrol) = self.patrols.remove(&patrol_id) {
                patrol.abort(ctx);
            }
        }
        Ok(())
    }

    /// Look up a route.
    pub fn route(&self, id: PatrolRouteId) -> Option<&PatrolRoute> {
        self.routes.get(&id)
    }

    /// Mutable route access for administrative edits.
    pub fn route_mut(&mut self, id: PatrolRouteId) -> Option<&mut PatrolRoute> {
        self.routes.get_mut(&id)
    }

    /// All registered routes.
    pub fn routes(&self) -> impl Iterator<Item = &PatrolRoute> {
        self.routes.values()
    }

    /// Look up a live patrol.
    pub fn patrol(&self, id: PatrolId) -> Option<&Patrol> {
        self.patrols.get(&id)
    }

    /// Whether a route currently has a patrol out.
    pub fn is_running(&self, route: PatrolRouteId) -> bool {
        self.running.contains_key(&route)
    }

    /// Number of live patrols.
    pub fn live_patrols(&self) -> usize {
        self.patrols.len()
    }

    // ---- Medium cadence: launch ----

    /// Match ready routes against the idle pool and launch what staffs.
    ///
    /// Routes are considered in priority order (ties by name). Selected
    /// enforcers are removed from every pool entry so no actor is
    /// assigned twice; a route whose staffing cannot be met is skipped
    /// whole. Returns the launched patrol ids.
    pub fn muster(
        &mut self,
        ctx: &dyn PatrolContext,
        time_of_day: TimeOfDay,
        idle: &mut IdlePool,
        rng: &mut impl Rng,
    ) -> Vec<PatrolId> {
        if !ctx.locations_configured() {
            return Vec::new();
        }

        let idle_enforcers = distinct_actors(idle);
        let facts = LaunchFacts {
            tick: ctx.current_tick(),
            time_of_day,
            idle_enforcers,
        };

        let mut candidates: Vec<PatrolRouteId> = self
            .routes
            .values()
            .filter(|route| !self.running.contains_key(&route.id))
            .filter(|route| route.validate().is_ok())
            .filter(|route| route.may_launch(&facts))
            .map(|route| route.id)
            .collect();
        candidates.sort_by(|a, b| {
            let pa = self.routes.get(a).map_or(0, |r| r.priority);
            let pb = self.routes.get(b).map_or(0, |r| r.priority);
            pb.cmp(&pa).then_with(|| {
                let na = self.routes.get(a).map(|r| r.name.as_str()).unwrap_or("");
                let nb = self.routes.get(b).map(|r| r.name.as_str()).unwrap_or("");
                na.cmp(nb)
            })
        });

        let mut launched = Vec::new();
        for route_id in candidates {
            let Some(route) = self.routes.get(&route_id) else {
                continue;
            };
            let Some(roster) = staff_route(route, idle) else {
                continue;
            };
            let Some(&leader) = roster.choose(rng) else {
                continue;
            };
            let patrol_id = PatrolId::new();
            match Patrol::new(patrol_id, route_id, leader, roster) {
                Ok(patrol) => {
                    info!(
                        patrol = %patrol_id,
                        route = %route.name,
                        members = patrol.members().len(),
                        "Patrol launched"
                    );
                    self.patrols.insert(patrol_id, patrol);
                    self.running.insert(route_id, patrol_id);
                    launched.push(patrol_id);
                }
                Err(error) => {
                    warn!(route = %route.name, %error, "Patrol launch failed");
                }
            }
        }
        launched
    }

    // ---- Fast cadence: drive ----

    /// Step every live patrol one fast-cadence tick.
    ///
    /// One patrol's failure is logged and aborts that patrol only; the
    /// rest keep stepping. Finished patrols are torn down and their
    /// routes freed for relaunch.
    pub fn step_patrols(&mut self, ctx: &mut dyn PatrolContext) {
        let routes = &self.routes;
        for patrol in self.patrols.values_mut() {
            let Some(route) = routes.get(&patrol.route) else {
                patrol.abort(ctx);
                continue;
            };
            let result = if patrol.phase() == PatrolPhase::Patrolling {
                strategy_for(route.strategy).patrol_tick(patrol, route, ctx)
            } else {
                patrol.step_phase(route, ctx)
            };
            if let Err(error) = result {
                warn!(patrol = %patrol.id, %error, "Patrol step failed, aborting");
                patrol.abort(ctx);
            }
        }

        let finished: Vec<PatrolId> = self
            .patrols
            .values()
            .filter(|p| p.is_finished())
            .map(|p| p.id)
            .collect();
        for id in finished {
            if let Some(patrol) = self.patrols.remove(&id) {
                self.running.remove(&patrol.route);
            }
        }
    }
}

/// Count distinct actors across all pool entries.
fn distinct_actors(idle: &IdlePool) -> u32 {
    let distinct: BTreeSet<ActorId> = idle.values().flatten().copied().collect();
    u32::try_from(distinct.len()).unwrap_or(u32::MAX)
}

/// Try to fill a route's staffing from the idle pool.
///
/// Returns the selected roster and removes it from every pool entry, or
/// `None` (pool untouched) when any requirement cannot be met.
fn staff_route(route: &PatrolRoute, idle: &mut IdlePool) -> Option<Vec<ActorId>> {
    let mut taken = BTreeSet::new();
    let mut roster = Vec::new();

    for req in &route.staffing {
        let needed = usize::try_from(req.count).unwrap_or(usize::MAX);
        let available = idle.get(&req.authority)?;
        let picks: Vec<ActorId> = available
            .iter()
            .filter(|actor| !taken.contains(*actor))
            .take(needed)
            .copied()
            .collect();
        if picks.len() < needed {
            return None;
        }
        for actor in picks {
            taken.insert(actor);
            roster.push(actor);
        }
    }

    for pool in idle.values_mut() {
        pool.retain(|actor| !taken.contains(actor));
    }
    Some(roster)
}
