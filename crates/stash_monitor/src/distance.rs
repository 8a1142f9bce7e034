//! Coordinate extraction and distance between player and storage.

use crate::types::Position;
use once_cell::sync::Lazy;
use regex::Regex;

static COORDINATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(\d+\.\d+),\s*(\d+\.\d+),\s*(\d+\.\d+)>").expect("coordinate pattern is valid")
});

/// Extracts the player position and the storage position from a line.
///
/// Takes the first two `<x, y, z>` triples in order of appearance. The
/// second triple is logged with its last two axes swapped, so it is
/// reordered before being returned. Returns `None` when fewer than two
/// triples are present.
pub fn extract_coordinate_pair(line: &str) -> Option<(Position, Position)> {
    let mut triples = COORDINATE_PATTERN.captures_iter(line).map(|caps| {
        let axis = |i: usize| caps[i].parse::<f64>().ok();
        Some(Position::new(axis(1)?, axis(2)?, axis(3)?))
    });

    let player = triples.next()??;
    let storage = triples.next()??.swap_yz();
    Some((player, storage))
}

/// Euclidean distance between two points.
pub fn distance(a: &Position, b: &Position) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let dz = b.z - a.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Rounds a distance to centimetres, the precision alerts report.
pub fn round_to_centimetres(meters: f64) -> f64 {
    (meters * 100.0).round() / 100.0
}
