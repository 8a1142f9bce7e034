//! Core data types shared by the parser, the aggregation engine and sinks.

use serde::{Deserialize, Serialize};

/// Represents a 3D position in the game world.
///
/// Uses double-precision floating point, matching the precision the server
/// writes into its admin log.
///
/// # Examples
///
/// ```rust
/// use stash_monitor::Position;
///
/// let player = Position::new(4512.25, 339.5, 10023.0);
/// assert_eq!(player.y, 339.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate (east-west axis)
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Position {
    /// Creates a new position with the specified coordinates.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns the position with its Y and Z components exchanged.
    ///
    /// Storage coordinates are logged as `<x, z, y>` while player
    /// coordinates are logged as `<x, y, z>`.
    pub fn swap_yz(self) -> Self {
        Self {
            x: self.x,
            y: self.z,
            z: self.y,
        }
    }
}

/// One "item removed from storage" line, broken into its fields.
///
/// Positions are kept verbatim as text so alerts show exactly what the
/// server logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Player display name, the aggregation key
    pub actor: String,
    /// Player identifier as logged after `id=`
    pub actor_id: String,
    /// Raw text between the angle brackets after `pos=`
    pub actor_position: String,
    /// The removed item
    pub item: String,
    /// What the item was removed from
    pub source_label: String,
    /// Raw text between the trailing angle brackets
    pub storage_position: String,
}

/// A single removal performed further from the storage than allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceAlert {
    pub player: String,
    pub id: String,
    pub actor_position: String,
    pub item: String,
    pub source_label: String,
    pub storage_position: String,
    /// Distance rounded to centimetres
    pub distance_meters: f64,
}

impl DistanceAlert {
    pub fn new(event: &LogEvent, distance_meters: f64) -> Self {
        Self {
            player: event.actor.clone(),
            id: event.actor_id.clone(),
            actor_position: event.actor_position.clone(),
            item: event.item.clone(),
            source_label: event.source_label.clone(),
            storage_position: event.storage_position.clone(),
            distance_meters,
        }
    }
}

/// The closed aggregation window of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LootSummary {
    pub player: String,
    pub total_count: u32,
    pub storage_type: String,
    /// Items in the order they were removed
    pub items: Vec<String>,
}

/// Everything the monitor hands to an [`AlertSink`](crate::sink::AlertSink).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dispatch {
    DistanceAlert(DistanceAlert),
    LootSummary(LootSummary),
}

impl Dispatch {
    /// The player the dispatch is about.
    pub fn player(&self) -> &str {
        match self {
            Dispatch::DistanceAlert(alert) => &alert.player,
            Dispatch::LootSummary(summary) => &summary.player,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_yz() {
        let swapped = Position::new(4.0, 5.0, 6.0).swap_yz();
        assert_eq!(swapped, Position::new(4.0, 6.0, 5.0));
    }

    #[test]
    fn test_alert_serializes_camel_case() {
        let event = LogEvent {
            actor: "Survivor".to_string(),
            actor_id: "abc=".to_string(),
            actor_position: "1.0, 2.0, 3.0".to_string(),
            item: "Apple".to_string(),
            source_label: "Barrel (Blue)".to_string(),
            storage_position: "4.0, 6.0, 5.0".to_string(),
        };
        let dispatch = Dispatch::DistanceAlert(DistanceAlert::new(&event, 12.5));
        let json = serde_json::to_value(&dispatch).unwrap();

        assert_eq!(json["kind"], "distance_alert");
        assert_eq!(json["player"], "Survivor");
        assert_eq!(json["actorPosition"], "1.0, 2.0, 3.0");
        assert_eq!(json["storagePosition"], "4.0, 6.0, 5.0");
        assert_eq!(json["distanceMeters"], 12.5);
        assert_eq!(dispatch.player(), "Survivor");
    }

    #[test]
    fn test_summary_serializes_items_in_order() {
        let dispatch = Dispatch::LootSummary(LootSummary {
            player: "Survivor".to_string(),
            total_count: 2,
            storage_type: "(Blue)".to_string(),
            items: vec!["Apple".to_string(), "Rope".to_string()],
        });
        let json = serde_json::to_value(&dispatch).unwrap();

        assert_eq!(json["kind"], "loot_summary");
        assert_eq!(json["totalCount"], 2);
        assert_eq!(json["storageType"], "(Blue)");
        assert_eq!(json["items"], serde_json::json!(["Apple", "Rope"]));
    }
}
