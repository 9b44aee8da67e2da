pub mod error;
pub mod auth {
    pub mod models;
}
#[cfg(feature = "http")]
pub mod config;
pub mod models {
    pub mod route;
    pub mod route_data;
}
pub mod routes {
    pub mod classifier;
    pub mod display;
    pub mod palette;
}
pub mod api {
    pub mod client;
    pub mod errors;
}
pub mod cache {
    pub mod route_cache;
}
pub mod services {
    pub mod lifecycle;
}

pub use error::AppError;
pub use routes::classifier::{classify, Classification, RouteCategory};
pub use routes::palette::color_of;
pub use services::lifecycle::{HideOutcome, RouteLifecycleService};
