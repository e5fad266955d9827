//! The slow-cadence justice heartbeat.
//!
//! Each beat runs four passes over a jurisdiction in a fixed order:
//! stale sweep, automatic conviction, bail-skip processing, and sentence
//! completion. A failure on one offender is logged and skipped so a bad
//! record never stalls the rest of the docket.

use rand::Rng;
use tracing::{debug, warn};

use magistrate_types::{ActorId, OffenseCategory, TimeOfDay};

use crate::authority::{LegalAuthority, OffenseReport};
use crate::services::{ActorDirectory, CurrencyAccounts};

/// What one heartbeat accomplished, for logging and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeartbeatReport {
    /// Crimes time-barred into the stale bucket.
    pub staled: usize,
    /// Offenders convicted and sentenced.
    pub convicted: usize,
    /// Offenders whose sentence resolved to execution. Carrying the
    /// execution out is the caller's responsibility.
    pub executions: Vec<ActorId>,
    /// Bail escrows forfeited after a missed return deadline.
    pub bail_forfeits: usize,
    /// Prisoners released after completing their sentence.
    pub released: usize,
}

/// Run one justice heartbeat over a jurisdiction.
pub fn run_heartbeat<D, A, R>(
    authority: &mut LegalAuthority,
    directory: &mut D,
    accounts: &mut A,
    rng: &mut R,
    now: u64,
    time_of_day: TimeOfDay,
) -> HeartbeatReport
where
    D: ActorDirectory + ?Sized,
    A: CurrencyAccounts + ?Sized,
    R: Rng,
{
    let mut report = HeartbeatReport::default();

    report.staled = authority.stale_sweep(now);

    for offender in authority.convictable_offenders(now) {
        match authority.convict_offender(directory, offender, now) {
            Ok(outcome) => {
                report.convicted = report.convicted.saturating_add(1);
                if outcome.execute {
                    report.executions.push(offender);
                } else if outcome.custodial_ticks > 0 {
                    move_to_jail(authority, directory, offender);
                }
            }
            Err(error) => {
                warn!(%offender, %error, "Conviction pass skipped offender");
            }
        }
    }

    for offender in authority.bail_skips(now) {
        // The skip itself is an offense; record it before the forfeit so
        // the violation is matched while the bail record still exists.
        let created = authority.evaluate_possible_offense(
            directory,
            &mut *rng,
            now,
            time_of_day,
            &OffenseReport {
                offender,
                category: OffenseCategory::BailViolation,
                victim: None,
                object: None,
                note: String::from("failed to return from bail"),
            },
        );
        debug!(%offender, crimes = created.len(), "Bail skip recorded");
        match authority.forfeit_bail(accounts, offender, now) {
            Ok(_) => {
                report.bail_forfeits = report.bail_forfeits.saturating_add(1);
            }
            Err(error) => {
                warn!(%offender, %error, "Bail forfeiture failed");
            }
        }
    }

    for offender in authority.completed_sentences(now) {
        match authority.release_offender(directory, offender, now) {
            Ok(()) => {
                report.released = report.released.saturating_add(1);
            }
            Err(error) => {
                warn!(%offender, %error, "Release pass skipped prisoner");
            }
        }
    }

    report
}

fn move_to_jail<D>(authority: &LegalAuthority, directory: &mut D, offender: ActorId)
where
    D: ActorDirectory + ?Sized,
{
    let Some(jail) = authority.locations().jail else {
        return;
    };
    if let Err(error) = directory.move_actor(offender, jail) {
        warn!(%offender, %error, "Could not move convict to jail");
    }
}
