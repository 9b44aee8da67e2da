use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::route_data::RouteData;

/// Suffix appended to the name of a copied route.
pub const COPY_SUFFIX: &str = " (Copy)";

/// Public profile of the user who created a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub username: String,
}

/// A user-drawn path or area attached to a dive site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiveRoute {
    pub id: i64,
    /// The dive site this route belongs to.
    ///
    /// The API does not send it. Routes read through a site listing have it
    /// filled in from the queried site; a route fetched by id does not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dive_site_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Declared type (`line`, `polygon`, `waypoints`, `walk`, `swim`, `scuba`, `mixed`).
    ///
    /// Kept as the raw server string; it is not authoritative for display,
    /// see [`crate::routes::classifier::classify`].
    pub route_type: String,
    /// Raw GeoJSON as produced by the drawing tool.
    pub route_data: serde_json::Value,
    #[serde(default)]
    pub creator: Option<Creator>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub view_count: u64,
    /// Soft-delete flag. Hidden routes are excluded from site listings.
    #[serde(default)]
    pub hidden: bool,
}

impl DiveRoute {
    /// Parse `route_data` into its typed form.
    pub fn parsed_route_data(&self) -> Result<RouteData, AppError> {
        Ok(RouteData::parse(&self.route_data)?)
    }

    /// Username of the creator, if the server included it.
    pub fn creator_name(&self) -> Option<&str> {
        self.creator.as_ref().map(|c| c.username.as_str())
    }
}

/// Body of `POST /dive-routes/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRouteRequest {
    pub dive_site_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub route_data: serde_json::Value,
    pub route_type: String,
}

impl CreateRouteRequest {
    /// Build the creation payload for a copy of `source` on `dive_site_id`.
    ///
    /// Geometry, type and description are preserved; the name gets the copy suffix.
    pub fn copy_of(source: &DiveRoute, dive_site_id: i64) -> Self {
        Self {
            dive_site_id,
            name: format!("{}{}", source.name, COPY_SUFFIX),
            description: source.description.clone(),
            route_data: source.route_data.clone(),
            route_type: source.route_type.clone(),
        }
    }
}

/// Response of `GET /dive-routes/{id}/deletion-check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionCheck {
    pub can_delete: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Usage figures attached to a popular route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityStats {
    #[serde(default)]
    pub total_dives_using_route: u64,
    #[serde(default)]
    pub unique_users_used_route: u64,
}

/// A route ranked by the popular-routes query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularRoute {
    #[serde(flatten)]
    pub route: DiveRoute,
    #[serde(default)]
    pub community_stats: CommunityStats,
}

/// Response of `GET /dive-routes/popular`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularRoutesResponse {
    pub routes: Vec<PopularRoute>,
}
