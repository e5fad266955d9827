//! World-facing core of the Magistrate legal simulation.
//!
//! Where `magistrate-law` is pure rules and `magistrate-patrol` is pure
//! enforcement mechanics, this crate is the part that runs: the
//! jurisdiction aggregate, the world clock and cadence scheduler, the
//! service seams the simulation reaches the wider world through, and the
//! [`JusticeWorld`] that ties them together for the engine binary.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration loading ([`MagistrateConfig`])
//! - [`clock`] -- Tick clock and time-of-day phases ([`WorldClock`])
//! - [`scheduler`] -- Cadence-driven task scheduling ([`Scheduler`])
//! - [`services`] -- Actor directory and currency seams
//! - [`authority`] -- The jurisdiction aggregate ([`LegalAuthority`])
//! - [`heartbeat`] -- The slow-cadence justice passes
//! - [`admin`] -- Data-driven entity administration ([`AdminRegistry`])
//! - [`narration`] -- Offense narration templates ([`NarrationTable`])
//! - [`notify`] -- Optional milestone notification sink
//! - [`persist`] -- Write-behind persistence plumbing
//! - [`world`] -- The runnable world aggregate ([`JusticeWorld`])

pub mod admin;
pub mod authority;
pub mod clock;
pub mod config;
pub mod heartbeat;
pub mod narration;
pub mod notify;
pub mod persist;
pub mod scheduler;
pub mod services;
pub mod world;

pub use admin::{AdminCapability, AdminRegistry, AdminRejection};
pub use authority::{
    AuthorityError, BailRecord, CustodyRecord, Fine, JurisdictionLocations, LegalAuthority,
    OffenseReport,
};
pub use clock::{ClockError, WorldClock};
pub use config::{
    ConfigError, JusticeConfig, LoggingConfig, MagistrateConfig, TimeConfig, WorldConfig,
};
pub use heartbeat::{HeartbeatReport, run_heartbeat};
pub use narration::{NarrationError, NarrationFacts, NarrationTable};
pub use notify::{LogChannel, NotificationChannel, notify};
pub use persist::{DirtyTracker, EntityStore, MemoryStore, StoreError};
pub use scheduler::{Cadence, Scheduler, TaskId};
pub use services::{
    AccountOwner, ActorDirectory, ActorRecord, CurrencyAccounts, DirectoryError, LedgerError,
    MemoryAccounts, MemoryDirectory, Resolution,
};
pub use world::JusticeWorld;
