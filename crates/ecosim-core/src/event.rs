//! Simulation event records and the sinks that receive them.

use crate::types::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Move,
    MoveFail,
    Eat,
    Attack,
    Death,
    Heal,
    Add,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Move => "MOVE",
            EventKind::MoveFail => "MOVE_FAIL",
            EventKind::Eat => "EAT",
            EventKind::Attack => "ATTACK",
            EventKind::Death => "DEATH",
            EventKind::Heal => "HEAL",
            EventKind::Add => "ADD",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Battle,
    Starvation,
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeathCause::Battle => f.write_str("battle"),
            DeathCause::Starvation => f.write_str("starvation"),
        }
    }
}

/// One thing that happened during a turn.
///
/// `subject` is the display symbol of the acting (or affected) entity and
/// `at` its coordinate. `target`/`object` describe the other cell and its
/// occupant for moves, meals and attacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub subject: String,
    pub at: Coordinate,
    pub target: Option<Coordinate>,
    pub object: Option<String>,
    pub amount: Option<i32>,
    pub cause: Option<DeathCause>,
}

impl Event {
    fn new(kind: EventKind, subject: &str, at: Coordinate) -> Self {
        Self {
            kind,
            subject: subject.to_string(),
            at,
            target: None,
            object: None,
            amount: None,
            cause: None,
        }
    }

    pub fn moved(subject: &str, from: Coordinate, to: Coordinate) -> Self {
        Self {
            target: Some(to),
            ..Self::new(EventKind::Move, subject, from)
        }
    }

    pub fn move_failed(subject: &str, from: Coordinate, to: Coordinate) -> Self {
        Self {
            target: Some(to),
            ..Self::new(EventKind::MoveFail, subject, from)
        }
    }

    pub fn ate(subject: &str, from: Coordinate, food: &str, to: Coordinate) -> Self {
        Self {
            target: Some(to),
            object: Some(food.to_string()),
            ..Self::new(EventKind::Eat, subject, from)
        }
    }

    pub fn attacked(
        subject: &str,
        from: Coordinate,
        victim: &str,
        to: Coordinate,
        damage: i32,
    ) -> Self {
        Self {
            target: Some(to),
            object: Some(victim.to_string()),
            amount: Some(damage),
            ..Self::new(EventKind::Attack, subject, from)
        }
    }

    pub fn died(subject: &str, at: Coordinate, cause: DeathCause) -> Self {
        Self {
            cause: Some(cause),
            ..Self::new(EventKind::Death, subject, at)
        }
    }

    pub fn healed(subject: &str, at: Coordinate, amount: i32) -> Self {
        Self {
            amount: Some(amount),
            ..Self::new(EventKind::Heal, subject, at)
        }
    }

    pub fn added(subject: &str, at: Coordinate) -> Self {
        Self::new(EventKind::Add, subject, at)
    }

    /// The event without its kind label, e.g. `🐰 (1, 2) -> (1, 3)`
    pub fn detail(&self) -> String {
        let target = self.target.map(|c| c.to_string()).unwrap_or_default();
        let object = self.object.as_deref().unwrap_or("?");
        let amount = self.amount.unwrap_or_default();

        match self.kind {
            EventKind::Move => format!("{} {} -> {}", self.subject, self.at, target),
            EventKind::MoveFail => {
                format!("{} {} -> {} occupied", self.subject, self.at, target)
            }
            EventKind::Eat => format!("{} {} ate {} {}", self.subject, self.at, object, target),
            EventKind::Attack => format!(
                "{} {} hit {} {} for {}",
                self.subject, self.at, object, target, amount
            ),
            EventKind::Death => match self.cause {
                Some(cause) => format!("{} {} ({})", self.subject, self.at, cause),
                None => format!("{} {}", self.subject, self.at),
            },
            EventKind::Heal => format!("{} {} +{}", self.subject, self.at, amount),
            EventKind::Add => format!("{} {}", self.subject, self.at),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail())
    }
}

/// Receiver for simulation events
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: Event) {
        (**self).emit(event);
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: Event) {}
}

/// Buffers events until the presentation layer drains them
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    /// Take all buffered events, leaving the log empty
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}

/// Forwards events to `tracing` at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: Event) {
        debug!(
            event = event.kind.label(),
            subject = %event.subject,
            x = event.at.x,
            y = event.at.y,
            target = ?event.target,
            amount = ?event.amount,
            "{}",
            event.detail()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        let event = Event::moved("🐰", Coordinate::new(1, 2), Coordinate::new(1, 3));
        assert_eq!(event.to_string(), "MOVE: 🐰 (1, 2) -> (1, 3)");

        let event = Event::attacked("🐺", Coordinate::new(0, 0), "🐰", Coordinate::new(1, 0), 50);
        assert_eq!(event.to_string(), "ATTACK: 🐺 (0, 0) hit 🐰 (1, 0) for 50");

        let event = Event::died("🐰", Coordinate::new(1, 0), DeathCause::Starvation);
        assert_eq!(event.to_string(), "DEATH: 🐰 (1, 0) (starvation)");
    }

    #[test]
    fn test_event_log_drain() {
        let mut log = EventLog::new();
        log.emit(Event::added("🌿", Coordinate::new(2, 2)));
        log.emit(Event::healed("🐰", Coordinate::new(0, 0), 25));
        log.emit(Event::added("🌿", Coordinate::new(3, 2)));

        assert_eq!(log.len(), 3);
        assert_eq!(log.count(EventKind::Add), 2);

        let drained = log.drain();
        assert_eq!(drained.len(), 3);
        assert!(log.is_empty());
        assert_eq!(drained[1].amount, Some(25));
    }

    #[test]
    fn test_sink_through_mutable_reference() {
        fn emit_one(sink: &mut dyn EventSink) {
            sink.emit(Event::added("🌿", Coordinate::new(0, 0)));
        }

        let mut events: Vec<Event> = Vec::new();
        emit_one(&mut events);
        let mut null = NullSink;
        emit_one(&mut null);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_event_kind_serialization() {
        let json = serde_json::to_string(&EventKind::MoveFail).unwrap();
        assert_eq!(json, "\"MOVE_FAIL\"");
    }
}
