use async_trait::async_trait;

use crate::error::AppError;
use crate::models::route::{CreateRouteRequest, DeletionCheck, DiveRoute, PopularRoute};

/// Trait for the dive route REST operations.
///
/// Abstracted as a trait so the lifecycle service can be tested without a
/// running Divemap backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteApi: Send + Sync {
    /// `GET /dive-sites/{site_id}/routes`, in server order.
    async fn list_site_routes(&self, dive_site_id: i64) -> Result<Vec<DiveRoute>, AppError>;

    /// `GET /dive-routes/{id}`
    async fn get_route(&self, route_id: i64) -> Result<DiveRoute, AppError>;

    /// `POST /dive-routes/`. The server assigns id, creator and timestamps.
    async fn create_route(&self, request: &CreateRouteRequest) -> Result<DiveRoute, AppError>;

    /// `GET /dive-routes/{id}/deletion-check`
    async fn deletion_check(&self, route_id: i64) -> Result<DeletionCheck, AppError>;

    /// `POST /dive-routes/{id}/hide`
    async fn hide_route(&self, route_id: i64) -> Result<(), AppError>;

    /// `POST /dive-routes/{id}/view`
    async fn record_view(&self, route_id: i64) -> Result<(), AppError>;

    /// `GET /dive-routes/popular?limit=N`, ranked by the server.
    async fn popular_routes(&self, limit: u32) -> Result<Vec<PopularRoute>, AppError>;
}

#[cfg(feature = "http")]
pub use http::HttpRouteApi;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;
    use reqwest::{Method, RequestBuilder};
    use serde::de::DeserializeOwned;
    use url::Url;

    use super::RouteApi;
    use crate::api::errors::error_from_status;
    use crate::config::ClientConfig;
    use crate::error::AppError;
    use crate::models::route::{
        CreateRouteRequest, DeletionCheck, DiveRoute, PopularRoute, PopularRoutesResponse,
    };

    /// reqwest implementation of [`RouteApi`].
    pub struct HttpRouteApi {
        client: reqwest::Client,
        root: Url,
        api_token: Option<String>,
    }

    impl HttpRouteApi {
        /// Create a client for the API described by `config`.
        pub fn new(config: &ClientConfig) -> Result<Self, AppError> {
            let client = reqwest::Client::builder()
                .timeout(config.timeout())
                .build()?;

            Ok(Self {
                client,
                root: config.api_root()?,
                api_token: config.api_token.clone(),
            })
        }

        fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, AppError> {
            let url = self
                .root
                .join(path)
                .map_err(|e| AppError::Internal(format!("Invalid API path '{path}': {e}")))?;

            tracing::debug!(%method, %url, "dive route API call");

            let builder = self.client.request(method, url);
            Ok(match &self.api_token {
                Some(token) => builder.bearer_auth(token),
                None => builder,
            })
        }

        async fn send(&self, builder: RequestBuilder, context: &str) -> Result<reqwest::Response, AppError> {
            let response = builder
                .send()
                .await
                .map_err(|e| AppError::Network(format!("{context}: {e}")))?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();
            Err(error_from_status(status.as_u16(), &body, context))
        }

        async fn send_json<T: DeserializeOwned>(
            &self,
            builder: RequestBuilder,
            context: &str,
        ) -> Result<T, AppError> {
            self.send(builder, context)
                .await?
                .json::<T>()
                .await
                .map_err(|e| AppError::Network(format!("{context}: invalid response body: {e}")))
        }
    }

    #[async_trait]
    impl RouteApi for HttpRouteApi {
        async fn list_site_routes(&self, dive_site_id: i64) -> Result<Vec<DiveRoute>, AppError> {
            let builder = self.request(Method::GET, &format!("dive-sites/{dive_site_id}/routes"))?;
            self.send_json(builder, &format!("list routes of dive site {dive_site_id}"))
                .await
        }

        async fn get_route(&self, route_id: i64) -> Result<DiveRoute, AppError> {
            let builder = self.request(Method::GET, &format!("dive-routes/{route_id}"))?;
            self.send_json(builder, &format!("get route {route_id}")).await
        }

        async fn create_route(&self, request: &CreateRouteRequest) -> Result<DiveRoute, AppError> {
            let builder = self.request(Method::POST, "dive-routes/")?.json(request);
            self.send_json(builder, "create route").await
        }

        async fn deletion_check(&self, route_id: i64) -> Result<DeletionCheck, AppError> {
            let builder =
                self.request(Method::GET, &format!("dive-routes/{route_id}/deletion-check"))?;
            self.send_json(builder, &format!("deletion check for route {route_id}"))
                .await
        }

        async fn hide_route(&self, route_id: i64) -> Result<(), AppError> {
            let builder = self.request(Method::POST, &format!("dive-routes/{route_id}/hide"))?;
            self.send(builder, &format!("hide route {route_id}")).await?;
            Ok(())
        }

        async fn record_view(&self, route_id: i64) -> Result<(), AppError> {
            let builder = self.request(Method::POST, &format!("dive-routes/{route_id}/view"))?;
            self.send(builder, &format!("record view of route {route_id}"))
                .await?;
            Ok(())
        }

        async fn popular_routes(&self, limit: u32) -> Result<Vec<PopularRoute>, AppError> {
            let builder = self
                .request(Method::GET, "dive-routes/popular")?
                .query(&[("limit", limit)]);
            let response: PopularRoutesResponse =
                self.send_json(builder, "list popular routes").await?;
            Ok(response.routes)
        }
    }
}
