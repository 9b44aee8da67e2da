#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use divemap_routes::api::client::HttpRouteApi;
use divemap_routes::auth::models::{Caller, Role};
use divemap_routes::cache::route_cache::RouteCache;
use divemap_routes::config::ClientConfig;
use divemap_routes::models::route::{CreateRouteRequest, Creator, DiveRoute};
use divemap_routes::RouteLifecycleService;

pub const OWNER_TOKEN: &str = "owner-token";
pub const OTHER_TOKEN: &str = "other-token";
pub const ADMIN_TOKEN: &str = "admin-token";

pub const OWNER_ID: i64 = 1;
pub const OTHER_ID: i64 = 2;
pub const ADMIN_ID: i64 = 3;

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, detail: &str) -> ApiError {
    (status, Json(json!({ "detail": detail })))
}

/// Route objects as the API sends them: the dive site is not included.
fn on_wire(route: &DiveRoute) -> DiveRoute {
    DiveRoute {
        dive_site_id: None,
        ..route.clone()
    }
}

struct Account {
    user_id: i64,
    username: &'static str,
    is_admin: bool,
}

/// State of the fake Divemap backend.
#[derive(Default)]
pub struct BackendState {
    pub routes: Vec<DiveRoute>,
    next_id: i64,
    /// Routes the deletion check refuses, with the reason given.
    pub blocked: HashMap<i64, Option<String>>,
    pub fail_views: bool,
    /// Every request seen, as `METHOD path`.
    pub requests: Vec<String>,
    /// `Authorization` headers seen, in order.
    pub auth_headers: Vec<String>,
}

#[derive(Clone, Default)]
pub struct Backend {
    pub state: Arc<Mutex<BackendState>>,
}

impl Backend {
    fn record(&self, line: String, headers: &HeaderMap) {
        let mut state = self.state.lock().unwrap();
        state.requests.push(line);
        if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
            state.auth_headers.push(auth.to_string());
        }
    }

    fn account(headers: &HeaderMap) -> Option<Account> {
        let token = headers
            .get("authorization")?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        match token {
            OWNER_TOKEN => Some(Account { user_id: OWNER_ID, username: "owner", is_admin: false }),
            OTHER_TOKEN => Some(Account { user_id: OTHER_ID, username: "other", is_admin: false }),
            ADMIN_TOKEN => Some(Account { user_id: ADMIN_ID, username: "admin", is_admin: true }),
            _ => None,
        }
    }

    /// Insert a route directly, bypassing the API. Returns its id.
    ///
    /// The backend keeps the dive site internally; responses omit it.
    pub fn seed(&self, dive_site_id: i64, name: &str, created_by: i64, route_type: &str, route_data: Value) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.routes.push(DiveRoute {
            id,
            dive_site_id: Some(dive_site_id),
            name: name.to_string(),
            description: Some(format!("{name} description")),
            route_type: route_type.to_string(),
            route_data,
            creator: Some(Creator { username: format!("user{created_by}") }),
            created_by,
            created_at: Utc::now(),
            view_count: 0,
            hidden: false,
        });
        id
    }

    pub fn block(&self, route_id: i64, reason: Option<&str>) {
        self.state
            .lock()
            .unwrap()
            .blocked
            .insert(route_id, reason.map(str::to_string));
    }

    pub fn route(&self, route_id: i64) -> Option<DiveRoute> {
        self.state
            .lock()
            .unwrap()
            .routes
            .iter()
            .find(|r| r.id == route_id)
            .cloned()
    }

    pub fn count_requests(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.starts_with(prefix))
            .count()
    }
}

async fn list_site_routes(
    State(backend): State<Backend>,
    Path(site_id): Path<i64>,
    headers: HeaderMap,
) -> Json<Vec<DiveRoute>> {
    backend.record(format!("GET /dive-sites/{site_id}/routes"), &headers);
    let state = backend.state.lock().unwrap();
    Json(
        state
            .routes
            .iter()
            .filter(|r| r.dive_site_id == Some(site_id) && !r.hidden)
            .map(on_wire)
            .collect(),
    )
}

async fn get_route(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<DiveRoute>, ApiError> {
    backend.record(format!("GET /dive-routes/{id}"), &headers);
    backend
        .route(id)
        .filter(|r| !r.hidden)
        .map(|r| Json(on_wire(&r)))
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Route not found"))
}

async fn create_route(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(request): Json<CreateRouteRequest>,
) -> Result<Json<DiveRoute>, ApiError> {
    backend.record("POST /dive-routes/".to_string(), &headers);
    let account = Backend::account(&headers)
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "Not authenticated"))?;
    if request.route_data.is_null() {
        return Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, "route_data is required"));
    }

    let mut state = backend.state.lock().unwrap();
    state.next_id += 1;
    let route = DiveRoute {
        id: state.next_id,
        dive_site_id: Some(request.dive_site_id),
        name: request.name,
        description: request.description,
        route_type: request.route_type,
        route_data: request.route_data,
        creator: Some(Creator { username: account.username.to_string() }),
        created_by: account.user_id,
        created_at: Utc::now(),
        view_count: 0,
        hidden: false,
    };
    let body = on_wire(&route);
    state.routes.push(route);
    Ok(Json(body))
}

async fn deletion_check(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Json<Value> {
    backend.record(format!("GET /dive-routes/{id}/deletion-check"), &headers);
    let state = backend.state.lock().unwrap();
    match state.blocked.get(&id) {
        Some(reason) => Json(json!({ "can_delete": false, "reason": reason })),
        None => Json(json!({ "can_delete": true })),
    }
}

async fn hide_route(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    backend.record(format!("POST /dive-routes/{id}/hide"), &headers);
    let account = Backend::account(&headers)
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "Not authenticated"))?;

    let mut state = backend.state.lock().unwrap();
    let route = state
        .routes
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Route not found"))?;
    if route.created_by != account.user_id && !account.is_admin {
        return Err(api_error(StatusCode::FORBIDDEN, "Not enough permissions"));
    }
    route.hidden = true;
    Ok(Json(json!({ "message": "Route hidden" })))
}

async fn record_view(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    backend.record(format!("POST /dive-routes/{id}/view"), &headers);
    let mut state = backend.state.lock().unwrap();
    if state.fail_views {
        return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "view counter unavailable"));
    }
    let route = state
        .routes
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Route not found"))?;
    route.view_count += 1;
    Ok(Json(json!({ "view_count": route.view_count })))
}

#[derive(Deserialize)]
struct PopularQuery {
    limit: Option<usize>,
}

async fn popular_routes(
    State(backend): State<Backend>,
    Query(query): Query<PopularQuery>,
    headers: HeaderMap,
) -> Json<Value> {
    let limit = query.limit.unwrap_or(10);
    backend.record(format!("GET /dive-routes/popular?limit={limit}"), &headers);
    let state = backend.state.lock().unwrap();
    let mut ranked: Vec<&DiveRoute> = state.routes.iter().filter(|r| !r.hidden).collect();
    ranked.sort_by(|a, b| b.view_count.cmp(&a.view_count).then(a.id.cmp(&b.id)));

    let routes: Vec<Value> = ranked
        .into_iter()
        .take(limit)
        .map(|route| {
            let mut entry = serde_json::to_value(on_wire(route)).unwrap();
            entry["community_stats"] = json!({
                "total_dives_using_route": route.view_count * 2,
                "unique_users_used_route": route.view_count,
            });
            entry
        })
        .collect();
    Json(json!({ "routes": routes }))
}

/// A fake Divemap backend running on an ephemeral port.
///
/// The server task lives as long as the test runtime.
pub struct TestEnv {
    pub addr: SocketAddr,
    pub backend: Backend,
}

impl TestEnv {
    pub async fn start() -> Self {
        let backend = Backend::default();

        let api = Router::new()
            .route("/dive-sites/{site_id}/routes", get(list_site_routes))
            .route("/dive-routes/", post(create_route))
            .route("/dive-routes/popular", get(popular_routes))
            .route("/dive-routes/{id}", get(get_route))
            .route("/dive-routes/{id}/deletion-check", get(deletion_check))
            .route("/dive-routes/{id}/hide", post(hide_route))
            .route("/dive-routes/{id}/view", post(record_view))
            .with_state(backend.clone());
        let router = Router::new().nest("/api/v1", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Fake backend crashed");
        });

        Self { addr, backend }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    pub fn config(&self, token: Option<&str>) -> ClientConfig {
        let config = ClientConfig::new(self.base_url());
        match token {
            Some(token) => config.with_api_token(token),
            None => config,
        }
    }

    pub fn api(&self, token: Option<&str>) -> HttpRouteApi {
        HttpRouteApi::new(&self.config(token)).expect("Failed to build HttpRouteApi")
    }

    /// A lifecycle service with its own cache, acting with `token`.
    pub fn service(&self, token: Option<&str>) -> RouteLifecycleService {
        RouteLifecycleService::new(
            Arc::new(self.api(token)),
            Arc::new(RouteCache::default()),
        )
    }
}

pub fn owner() -> Caller {
    Caller::new(OWNER_ID, "owner", Role::User)
}

pub fn other() -> Caller {
    Caller::new(OTHER_ID, "other", Role::User)
}

pub fn admin() -> Caller {
    Caller::new(ADMIN_ID, "admin", Role::Admin)
}

pub fn line() -> Value {
    json!({ "type": "LineString", "coordinates": [[23.1, 37.9], [23.2, 37.95]] })
}

pub fn segmented(types: &[&str]) -> Value {
    let features: Vec<Value> = types
        .iter()
        .map(|t| json!({ "type": "Feature", "geometry": line(), "properties": { "segmentType": t } }))
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}
