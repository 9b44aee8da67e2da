use std::collections::BTreeSet;
use std::fmt;

use geojson::GeoJson;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Feature property carrying the activity of a segment.
pub const SEGMENT_TYPE_PROPERTY: &str = "segmentType";

/// Alternate spelling accepted from older payloads.
const SEGMENT_TYPE_PROPERTY_SNAKE: &str = "segment_type";

/// Reasons a `route_data` payload cannot be read as route geometry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("route data is not valid GeoJSON: {0}")]
    NotGeoJson(String),

    #[error("feature collection has no features")]
    EmptyFeatureCollection,

    #[error("feature has no geometry")]
    MissingGeometry,
}

/// Activity a segment of a multi-segment route is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentType {
    Walk,
    Swim,
    Scuba,
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SegmentType {
    /// Parse a segment type from a string (case-insensitive).
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "walk" => Some(SegmentType::Walk),
            "swim" => Some(SegmentType::Swim),
            "scuba" => Some(SegmentType::Scuba),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentType::Walk => "walk",
            SegmentType::Swim => "swim",
            SegmentType::Scuba => "scuba",
        }
    }
}

/// One feature of a feature-collection route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSegment {
    pub geometry: Option<geojson::Geometry>,
    /// `None` when the feature carries no (or an unrecognised) segment tag.
    pub segment_type: Option<SegmentType>,
}

impl RouteSegment {
    /// Read a raw collection member without requiring it to be valid GeoJSON.
    ///
    /// A missing or malformed geometry leaves `geometry` empty; the tag is read
    /// from `properties`, or from the member itself when it has none there.
    fn from_raw(feature: &serde_json::Value) -> Self {
        let geometry = feature
            .get("geometry")
            .filter(|g| !g.is_null())
            .and_then(|g| geojson::Geometry::from_json_value(g.clone()).ok());

        let properties = feature.get("properties");
        let segment_type = [properties, Some(feature)]
            .into_iter()
            .flatten()
            .flat_map(|holder| {
                [SEGMENT_TYPE_PROPERTY, SEGMENT_TYPE_PROPERTY_SNAKE]
                    .into_iter()
                    .filter_map(move |key| holder.get(key))
            })
            .find_map(segment_type_of);

        Self {
            geometry,
            segment_type,
        }
    }
}

fn segment_type_of(value: &serde_json::Value) -> Option<SegmentType> {
    value.as_str().and_then(SegmentType::from_str_ci)
}

/// Parsed form of a route's `route_data` payload.
///
/// Segment annotations only exist on the `FeatureCollection` variant; a lone
/// geometry (or a single feature) never carries one.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteData {
    Geometry(geojson::Geometry),
    FeatureCollection(Vec<RouteSegment>),
}

impl RouteData {
    /// Read a raw `route_data` JSON payload.
    ///
    /// A bare `Feature` is accepted as a single geometry. Feature collections
    /// are read member by member: a member with a missing or malformed geometry
    /// keeps its segment tag. An empty feature collection is rejected.
    pub fn parse(value: &serde_json::Value) -> Result<Self, ShapeError> {
        if value.get("type").and_then(|t| t.as_str()) == Some("FeatureCollection") {
            return Self::parse_collection(value);
        }

        let geojson = GeoJson::from_json_value(value.clone())
            .map_err(|e| ShapeError::NotGeoJson(e.to_string()))?;

        match geojson {
            GeoJson::Geometry(geometry) => Ok(RouteData::Geometry(geometry)),
            GeoJson::Feature(feature) => feature
                .geometry
                .map(RouteData::Geometry)
                .ok_or(ShapeError::MissingGeometry),
            GeoJson::FeatureCollection(_) => Self::parse_collection(value),
        }
    }

    fn parse_collection(value: &serde_json::Value) -> Result<Self, ShapeError> {
        let features = value
            .get("features")
            .and_then(|f| f.as_array())
            .ok_or_else(|| ShapeError::NotGeoJson("feature collection has no features array".into()))?;

        if features.is_empty() {
            return Err(ShapeError::EmptyFeatureCollection);
        }
        Ok(RouteData::FeatureCollection(
            features.iter().map(RouteSegment::from_raw).collect(),
        ))
    }

    /// Features of a feature-collection route; empty for a single geometry.
    pub fn segments(&self) -> &[RouteSegment] {
        match self {
            RouteData::Geometry(_) => &[],
            RouteData::FeatureCollection(segments) => segments,
        }
    }

    /// Distinct segment types present, in a stable order.
    pub fn segment_types(&self) -> BTreeSet<SegmentType> {
        self.segments()
            .iter()
            .filter_map(|segment| segment.segment_type)
            .collect()
    }

    /// Returns `true` if at least one feature carries a segment tag.
    pub fn has_segment_annotations(&self) -> bool {
        self.segments()
            .iter()
            .any(|segment| segment.segment_type.is_some())
    }
}
