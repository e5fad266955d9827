//! Optional fire-and-forget notification sink for legal milestones.
//!
//! Arrests, convictions, releases, and bail events are offered to a
//! [`NotificationChannel`] when one is configured; delivery failures are
//! the channel's problem, never the aggregate's. An unconfigured channel
//! simply skips delivery.

use tracing::info;

use magistrate_types::LegalEvent;

/// Fire-and-forget sink for legal milestone events.
pub trait NotificationChannel: Send + Sync {
    /// Deliver one event. Must not block the caller on failure.
    fn deliver(&self, event: &LegalEvent);
}

/// A channel that logs each event through `tracing` and drops it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogChannel;

impl NotificationChannel for LogChannel {
    fn deliver(&self, event: &LegalEvent) {
        info!(
            kind = ?event.kind,
            jurisdiction = %event.jurisdiction,
            actor = %event.actor,
            tick = event.tick,
            detail = %event.detail,
            "Legal event"
        );
    }
}

/// Deliver an event through an optional channel.
pub fn notify(channel: Option<&dyn NotificationChannel>, event: &LegalEvent) {
    if let Some(channel) = channel {
        channel.deliver(event);
    }
}
