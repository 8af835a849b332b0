//! Observer port for engine events. Engines only return events; callers pick
//! which notifier hears them.

use crate::engine::models::Event;

pub trait Notifier {
    fn notify(&self, event: &Event);
}

/// Forwards every event to the tracing log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &Event) {
        tracing::info!(
            event = %event.event_type,
            player = event.player_id.as_deref().unwrap_or("-"),
            payload = %event.payload,
            "game event"
        );
    }
}

pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: &Event) {}
}

impl<F: Fn(&Event)> Notifier for F {
    fn notify(&self, event: &Event) {
        self(event)
    }
}

pub fn dispatch(events: &[Event], notifier: &dyn Notifier) {
    for event in events {
        notifier.notify(event);
    }
}
