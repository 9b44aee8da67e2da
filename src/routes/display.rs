use serde::Serialize;

use crate::models::route::DiveRoute;
use crate::models::route_data::{RouteData, SegmentType};
use crate::routes::classifier::{classify_parsed, RouteCategory};
use crate::routes::palette::{color_of, segment_color};

/// Classification and color of a route, ready for a list badge or card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteBadge {
    pub category: RouteCategory,
    pub label: &'static str,
    pub color: &'static str,
}

impl RouteBadge {
    pub fn for_route(route: &DiveRoute) -> Self {
        let parsed = route.parsed_route_data().ok();
        let classification = classify_parsed(&route.route_type, parsed.as_ref());
        Self {
            category: classification.category,
            label: classification.label,
            color: color_of(classification.category),
        }
    }
}

/// Map overlay entry for one tagged feature of a multi-segment route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentOverlay {
    /// Index of the feature within the collection.
    pub index: usize,
    pub segment_type: SegmentType,
    pub color: &'static str,
}

/// Overlay colors for every tagged feature, in feature order.
pub fn segment_overlays(route_data: &RouteData) -> Vec<SegmentOverlay> {
    route_data
        .segments()
        .iter()
        .enumerate()
        .filter_map(|(index, segment)| {
            segment.segment_type.map(|segment_type| SegmentOverlay {
                index,
                segment_type,
                color: segment_color(segment_type),
            })
        })
        .collect()
}
