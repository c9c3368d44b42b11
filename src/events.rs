//! # Map Events
//!
//! Notifications the generator publishes to gameplay, UI, and telemetry listeners.
//!
//! Listeners subscribe through [`EventHub::subscribe`] and receive events over a standard
//! channel. Receivers that have been dropped are pruned on the next publish.

use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};
use uuid::Uuid;

/// Channel name attached to the destroying-map notice.
pub const DESTROYING_MAP_CHANNEL: &str = "pvd.gameplay";
/// Topic attached to the destroying-map notice.
pub const DESTROYING_MAP_TOPIC: &str = "mapgenerator.destroyingmap";

/// Identifier of one generated map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapId(pub Uuid);

impl MapId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MapId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MapId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapEvent {
    /// A full layout has been generated
    GenerationCompleted,
    /// Teardown is about to start; entities are still alive
    DestroyingMap {
        map_id: MapId,
        channel: String,
        topic: String,
    },
}

impl MapEvent {
    pub fn destroying(map_id: MapId) -> Self {
        MapEvent::DestroyingMap {
            map_id,
            channel: DESTROYING_MAP_CHANNEL.to_string(),
            topic: DESTROYING_MAP_TOPIC.to_string(),
        }
    }
}

/// Fan-out of map events to subscribed receivers.
#[derive(Debug, Default)]
pub struct EventHub {
    subscribers: Vec<Sender<MapEvent>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<MapEvent> {
        let (sender, receiver) = channel();
        self.subscribers.push(sender);
        receiver
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn publish(&mut self, event: MapEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let mut hub = EventHub::new();
        let first = hub.subscribe();
        let second = hub.subscribe();
        hub.publish(MapEvent::GenerationCompleted);

        assert_eq!(first.try_iter().collect::<Vec<_>>(), vec![MapEvent::GenerationCompleted]);
        assert_eq!(second.try_iter().count(), 1);
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let mut hub = EventHub::new();
        let kept = hub.subscribe();
        drop(hub.subscribe());
        hub.publish(MapEvent::GenerationCompleted);
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(kept.try_iter().count(), 1);
    }

    #[test]
    fn test_destroying_event_carries_topic() {
        let id = MapId::new();
        match MapEvent::destroying(id) {
            MapEvent::DestroyingMap { map_id, channel, topic } => {
                assert_eq!(map_id, id);
                assert_eq!(channel, DESTROYING_MAP_CHANNEL);
                assert_eq!(topic, DESTROYING_MAP_TOPIC);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
