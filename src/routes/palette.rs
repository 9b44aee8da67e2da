//! The one color table for route rendering.
//!
//! List badges, preview cards and map overlays all read from here so a route
//! renders in the same color everywhere.

use crate::models::route_data::SegmentType;
use crate::routes::classifier::RouteCategory;

/// Color used for the `Route` fallback and for unknown category keys.
pub const DEFAULT_ROUTE_COLOR: &str = "#6b7280";

const PALETTE: [(RouteCategory, &str); 8] = [
    (RouteCategory::Line, "#2563eb"),
    (RouteCategory::Polygon, "#7c3aed"),
    (RouteCategory::Waypoints, "#f59e0b"),
    (RouteCategory::Walk, "#16a34a"),
    (RouteCategory::Swim, "#0891b2"),
    (RouteCategory::Scuba, "#1e40af"),
    (RouteCategory::Mixed, "#db2777"),
    (RouteCategory::Route, DEFAULT_ROUTE_COLOR),
];

/// Display color for a category.
pub fn color_of(category: RouteCategory) -> &'static str {
    PALETTE
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_ROUTE_COLOR)
}

/// Display color for a category key such as `"mixed"`.
pub fn color_of_key(key: &str) -> &'static str {
    RouteCategory::from_key(key)
        .map(color_of)
        .unwrap_or(DEFAULT_ROUTE_COLOR)
}

/// Overlay color for a single segment of a multi-segment route.
pub fn segment_color(segment: SegmentType) -> &'static str {
    color_of(segment.into())
}
