use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::route_data::{RouteData, SegmentType};

/// Route types a route can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    Line,
    Polygon,
    Waypoints,
    Walk,
    Swim,
    Scuba,
    Mixed,
}

impl RouteType {
    /// Parse a declared route type (case-insensitive).
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "line" => Some(RouteType::Line),
            "polygon" => Some(RouteType::Polygon),
            "waypoints" => Some(RouteType::Waypoints),
            "walk" => Some(RouteType::Walk),
            "swim" => Some(RouteType::Swim),
            "scuba" => Some(RouteType::Scuba),
            "mixed" => Some(RouteType::Mixed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteType::Line => "line",
            RouteType::Polygon => "polygon",
            RouteType::Waypoints => "waypoints",
            RouteType::Walk => "walk",
            RouteType::Swim => "swim",
            RouteType::Scuba => "scuba",
            RouteType::Mixed => "mixed",
        }
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display category derived from a route. Every renderer keys its color on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteCategory {
    Line,
    Polygon,
    Waypoints,
    Walk,
    Swim,
    Scuba,
    Mixed,
    /// Fallback for unknown or malformed input.
    Route,
}

impl RouteCategory {
    /// Every category, fallback last.
    pub const ALL: [RouteCategory; 8] = [
        RouteCategory::Line,
        RouteCategory::Polygon,
        RouteCategory::Waypoints,
        RouteCategory::Walk,
        RouteCategory::Swim,
        RouteCategory::Scuba,
        RouteCategory::Mixed,
        RouteCategory::Route,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteCategory::Line => "line",
            RouteCategory::Polygon => "polygon",
            RouteCategory::Waypoints => "waypoints",
            RouteCategory::Walk => "walk",
            RouteCategory::Swim => "swim",
            RouteCategory::Scuba => "scuba",
            RouteCategory::Mixed => "mixed",
            RouteCategory::Route => "route",
        }
    }

    /// Parse a category key. Unknown keys yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == key)
    }

    /// Human-readable label shown on badges and cards.
    pub fn label(&self) -> &'static str {
        match self {
            RouteCategory::Line => "Line Route",
            RouteCategory::Polygon => "Area Route",
            RouteCategory::Waypoints => "Waypoints",
            RouteCategory::Walk => "Walk Route",
            RouteCategory::Swim => "Swim Route",
            RouteCategory::Scuba => "Scuba Route",
            RouteCategory::Mixed => "Multi-Segment Route",
            RouteCategory::Route => "Route",
        }
    }
}

impl fmt::Display for RouteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SegmentType> for RouteCategory {
    fn from(segment: SegmentType) -> Self {
        match segment {
            SegmentType::Walk => RouteCategory::Walk,
            SegmentType::Swim => RouteCategory::Swim,
            SegmentType::Scuba => RouteCategory::Scuba,
        }
    }
}

/// Result of classifying a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: RouteCategory,
    pub label: &'static str,
}

impl From<RouteCategory> for Classification {
    fn from(category: RouteCategory) -> Self {
        Self {
            category,
            label: category.label(),
        }
    }
}

/// Classify a route from its declared type and raw `route_data` payload.
///
/// Never fails: malformed payloads are treated as carrying no segment
/// annotations, and unknown declared types fall back to `Route`.
pub fn classify(route_type: &str, route_data: &serde_json::Value) -> Classification {
    let parsed = RouteData::parse(route_data).ok();
    classify_parsed(route_type, parsed.as_ref())
}

/// Classify from an already-parsed payload.
///
/// Segment annotations take priority over the declared type: one distinct
/// segment type gives that activity, more than one gives `Mixed`.
pub fn classify_parsed(route_type: &str, route_data: Option<&RouteData>) -> Classification {
    if let Some(data) = route_data {
        let segment_types = data.segment_types();
        let mut distinct = segment_types.iter();
        match (distinct.next(), distinct.next()) {
            (Some(only), None) => return RouteCategory::from(*only).into(),
            (Some(_), Some(_)) => return RouteCategory::Mixed.into(),
            _ => {}
        }
    }

    declared_category(route_type).into()
}

fn declared_category(route_type: &str) -> RouteCategory {
    match RouteType::from_str_ci(route_type) {
        Some(RouteType::Line) => RouteCategory::Line,
        Some(RouteType::Polygon) => RouteCategory::Polygon,
        Some(RouteType::Waypoints) => RouteCategory::Waypoints,
        Some(RouteType::Walk) => RouteCategory::Walk,
        Some(RouteType::Swim) => RouteCategory::Swim,
        Some(RouteType::Scuba) => RouteCategory::Scuba,
        // A declared "mixed" route without segment annotations has nothing to mix.
        Some(RouteType::Mixed) | None => RouteCategory::Route,
    }
}
