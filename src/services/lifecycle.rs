use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::client::RouteApi;
use crate::auth::models::Caller;
use crate::cache::route_cache::RouteCache;
use crate::error::AppError;
use crate::models::route::{CreateRouteRequest, DiveRoute, PopularRoute};

/// Result of a hide request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HideOutcome {
    /// The route was soft-deleted.
    Hidden,
    /// The deletion check refused; nothing was mutated.
    Blocked { reason: String },
}

/// Shown when the server refuses a hide without saying why.
const DEFAULT_BLOCKED_REASON: &str = "This route cannot be deleted right now.";

/// Create, copy, hide and view-tracking for dive routes.
///
/// Every successful mutation invalidates the cache entries covering the
/// affected dive site and the popular rankings. Nothing is mutated locally:
/// the next read refetches from the server.
pub struct RouteLifecycleService {
    api: Arc<dyn RouteApi>,
    cache: Arc<RouteCache>,
}

impl RouteLifecycleService {
    pub fn new(api: Arc<dyn RouteApi>, cache: Arc<RouteCache>) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &Arc<RouteCache> {
        &self.cache
    }

    /// Routes of a dive site, in server order, served from the cache when fresh.
    pub async fn list(&self, dive_site_id: i64) -> Result<Vec<DiveRoute>, AppError> {
        if let Some(routes) = self.cache.site_routes(dive_site_id).await {
            return Ok(routes);
        }

        let generation = self.cache.site_generation(dive_site_id).await;
        let mut routes = self.api.list_site_routes(dive_site_id).await?;
        for route in routes.iter_mut() {
            route.dive_site_id.get_or_insert(dive_site_id);
        }
        routes.retain(|r| !r.hidden);

        debug!(dive_site_id, count = routes.len(), "fetched site routes");
        self.cache
            .store_site_routes(dive_site_id, routes.clone(), generation)
            .await;
        Ok(routes)
    }

    /// Popular routes ranked by community usage, served from the cache when fresh.
    pub async fn popular(&self, limit: u32) -> Result<Vec<PopularRoute>, AppError> {
        if let Some(routes) = self.cache.popular(limit).await {
            return Ok(routes);
        }

        let generation = self.cache.popular_generation(limit).await;
        let routes = self.api.popular_routes(limit).await?;
        debug!(limit, count = routes.len(), "fetched popular routes");
        self.cache
            .store_popular(limit, routes.clone(), generation)
            .await;
        Ok(routes)
    }

    /// A single route. Always fetched; single routes are not cached.
    ///
    /// The API does not report the dive site; it is filled in when a cached
    /// site list holds the route.
    pub async fn get(&self, route_id: i64) -> Result<DiveRoute, AppError> {
        let mut route = self.api.get_route(route_id).await?;
        if route.dive_site_id.is_none() {
            route.dive_site_id = self.cache.site_containing(route_id).await;
        }
        Ok(route)
    }

    /// Create a route on behalf of `caller`.
    pub async fn create(
        &self,
        caller: Option<&Caller>,
        request: CreateRouteRequest,
    ) -> Result<DiveRoute, AppError> {
        let caller = require_caller(caller, "create a route")?;

        if request.name.trim().is_empty() {
            return Err(AppError::BadRequest("Route name cannot be empty".into()));
        }

        let mut created = self.api.create_route(&request).await?;
        info!(
            route_id = created.id,
            dive_site_id = request.dive_site_id,
            user_id = caller.user_id,
            "route created"
        );

        let created_site = *created.dive_site_id.get_or_insert(request.dive_site_id);
        self.cache.invalidate_for_mutation(request.dive_site_id).await;
        if created_site != request.dive_site_id {
            self.cache.invalidate_for_mutation(created_site).await;
        }

        Ok(created)
    }

    /// Copy an existing route onto the dive site it belongs to.
    ///
    /// The site comes from a cached site list holding the route. When no
    /// listing has been seen this fails with `BadRequest`; use
    /// [`Self::copy_to`] to name the target site.
    pub async fn copy(&self, caller: Option<&Caller>, route_id: i64) -> Result<DiveRoute, AppError> {
        require_caller(caller, "copy a route")?;

        let source = self.get(route_id).await?;
        let dive_site_id = source.dive_site_id.ok_or_else(|| {
            AppError::BadRequest(format!(
                "Dive site of route {route_id} is unknown; name the target site"
            ))
        })?;
        self.copy_source(caller, &source, dive_site_id).await
    }

    /// Copy an existing route onto `dive_site_id`. Any authenticated caller may copy.
    ///
    /// The copy keeps geometry, type and description; its name gets `" (Copy)"`.
    pub async fn copy_to(
        &self,
        caller: Option<&Caller>,
        route_id: i64,
        dive_site_id: i64,
    ) -> Result<DiveRoute, AppError> {
        require_caller(caller, "copy a route")?;

        let source = self.api.get_route(route_id).await?;
        self.copy_source(caller, &source, dive_site_id).await
    }

    async fn copy_source(
        &self,
        caller: Option<&Caller>,
        source: &DiveRoute,
        dive_site_id: i64,
    ) -> Result<DiveRoute, AppError> {
        let request = CreateRouteRequest::copy_of(source, dive_site_id);
        let copy = self.create(caller, request).await?;

        info!(source_id = source.id, copy_id = copy.id, dive_site_id, "route copied");
        Ok(copy)
    }

    /// Soft-delete a route.
    ///
    /// Runs the server's deletion check first; an ineligible route comes back
    /// as [`HideOutcome::Blocked`] and the hide endpoint is never called.
    /// When the route's dive site is unknown the whole cache is dropped.
    pub async fn hide(&self, caller: Option<&Caller>, route: &DiveRoute) -> Result<HideOutcome, AppError> {
        let caller = require_caller(caller, "hide a route")?;

        if !caller.can_manage(route) {
            return Err(AppError::Forbidden(format!(
                "Only the creator, an admin or a moderator can hide route {}",
                route.id
            )));
        }

        let check = self.api.deletion_check(route.id).await?;
        if !check.can_delete {
            let reason = check
                .reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BLOCKED_REASON.to_string());
            warn!(route_id = route.id, %reason, "hide blocked by deletion check");
            return Ok(HideOutcome::Blocked { reason });
        }

        self.api.hide_route(route.id).await?;
        info!(route_id = route.id, user_id = caller.user_id, "route hidden");

        let dive_site_id = match route.dive_site_id {
            Some(id) => Some(id),
            None => self.cache.site_containing(route.id).await,
        };
        match dive_site_id {
            Some(id) => self.cache.invalidate_for_mutation(id).await,
            None => self.cache.invalidate_all().await,
        }
        Ok(HideOutcome::Hidden)
    }

    /// Count a view of the route. Failures are logged and dropped.
    pub async fn record_view(&self, route_id: i64) {
        record_view_quietly(self.api.as_ref(), route_id).await;
    }

    /// Like [`Self::record_view`], but spawned onto the runtime so the caller
    /// never waits.
    pub fn record_view_detached(&self, route_id: i64) {
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            record_view_quietly(api.as_ref(), route_id).await;
        });
    }

    /// Whether edit/hide controls should be shown to `caller` for `route`.
    pub fn can_manage(caller: Option<&Caller>, route: &DiveRoute) -> bool {
        caller.map(|c| c.can_manage(route)).unwrap_or(false)
    }
}

async fn record_view_quietly(api: &dyn RouteApi, route_id: i64) {
    if let Err(e) = api.record_view(route_id).await {
        warn!(route_id, error = %e, "failed to record route view");
    }
}

fn require_caller<'a>(caller: Option<&'a Caller>, action: &str) -> Result<&'a Caller, AppError> {
    caller.ok_or_else(|| AppError::Auth(format!("You must be signed in to {action}")))
}
