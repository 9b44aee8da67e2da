use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use divemap_routes::api::client::HttpRouteApi;
use divemap_routes::auth::models::{Caller, Role};
use divemap_routes::cache::route_cache::RouteCache;
use divemap_routes::config::ClientConfig;
use divemap_routes::models::route::{CreateRouteRequest, DiveRoute};
use divemap_routes::routes::display::RouteBadge;
use divemap_routes::{HideOutcome, RouteLifecycleService};

/// Browse and manage dive routes on a Divemap instance.
#[derive(Debug, Parser)]
#[command(name = "dive-routes", version, about)]
struct Cli {
    /// Optional TOML config file; `DIVEROUTES_*` environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    identity: Identity,

    #[command(subcommand)]
    command: Command,
}

/// Who the mutating commands act as. Must match the token's user.
#[derive(Debug, Args)]
struct Identity {
    #[arg(long, global = true, env = "DIVEROUTES_USER_ID")]
    user_id: Option<i64>,

    #[arg(long, global = true, env = "DIVEROUTES_USERNAME", default_value = "")]
    username: String,

    #[arg(long, global = true)]
    admin: bool,

    #[arg(long, global = true)]
    moderator: bool,
}

impl Identity {
    fn caller(&self) -> Option<Caller> {
        self.user_id.map(|id| {
            Caller::new(
                id,
                self.username.clone(),
                Role::from_flags(self.admin, self.moderator),
            )
        })
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the routes of a dive site
    List {
        #[arg(long)]
        site: i64,
    },
    /// Show a single route
    Show { id: i64 },
    /// List the most used routes
    Popular {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Create a route from a GeoJSON file
    Create {
        #[arg(long)]
        site: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "type")]
        route_type: String,
        /// GeoJSON file produced by the drawing tool
        #[arg(long)]
        data: PathBuf,
    },
    /// Copy a route under your account
    Copy {
        id: i64,
        /// Dive site to copy onto; required unless the route's site is known
        #[arg(long)]
        site: Option<i64>,
    },
    /// Hide (soft-delete) a route
    Hide { id: i64 },
    /// Record a view of a route
    View { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "divemap_routes=info,dive_routes=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    tracing::debug!(base_url = %config.base_url, "using Divemap API");
    let api = HttpRouteApi::new(&config).context("Failed to build API client")?;
    let cache = Arc::new(RouteCache::new(config.cache_ttl()));
    let service = RouteLifecycleService::new(Arc::new(api), cache);
    let caller = cli.identity.caller();

    match cli.command {
        Command::List { site } => {
            let routes = service.list(site).await?;
            if routes.is_empty() {
                println!("No routes for dive site {site}");
            }
            for route in &routes {
                print_route_line(route);
            }
        }
        Command::Show { id } => {
            let route = service.get(id).await?;
            print_route_detail(&route, caller.as_ref());
            service.record_view(id).await;
        }
        Command::Popular { limit } => {
            let limit = limit.unwrap_or(config.popular_limit);
            for (rank, entry) in service.popular(limit).await?.iter().enumerate() {
                print!("{:>3}. ", rank + 1);
                print_route_line(&entry.route);
                println!(
                    "      {} dives, {} divers",
                    entry.community_stats.total_dives_using_route,
                    entry.community_stats.unique_users_used_route
                );
            }
        }
        Command::Create {
            site,
            name,
            description,
            route_type,
            data,
        } => {
            let raw = std::fs::read_to_string(&data)
                .with_context(|| format!("Failed to read {}", data.display()))?;
            let route_data: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", data.display()))?;
            let request = CreateRouteRequest {
                dive_site_id: site,
                name,
                description,
                route_data,
                route_type,
            };
            let created = service.create(caller.as_ref(), request).await?;
            println!("Created route {}", created.id);
            print_route_line(&created);
        }
        Command::Copy { id, site } => {
            let copy = match site {
                Some(site) => service.copy_to(caller.as_ref(), id, site).await?,
                None => service.copy(caller.as_ref(), id).await?,
            };
            println!("Copied route {id} to {}", copy.id);
            print_route_line(&copy);
        }
        Command::Hide { id } => {
            let route = service.get(id).await?;
            match service.hide(caller.as_ref(), &route).await? {
                HideOutcome::Hidden => println!("Route {id} hidden"),
                HideOutcome::Blocked { reason } => bail!("Route {id} cannot be hidden: {reason}"),
            }
        }
        Command::View { id } => {
            service.record_view(id).await;
        }
    }

    Ok(())
}

fn print_route_line(route: &DiveRoute) {
    let badge = RouteBadge::for_route(route);
    println!(
        "#{:<6} {:<40} [{} {}] by {}",
        route.id,
        route.name,
        badge.label,
        badge.color,
        route.creator_name().unwrap_or("unknown")
    );
}

fn print_route_detail(route: &DiveRoute, caller: Option<&Caller>) {
    print_route_line(route);
    if let Some(description) = route.description.as_deref().filter(|d| !d.is_empty()) {
        println!("  {description}");
    }
    if let Some(site) = route.dive_site_id {
        println!("  dive site: {site}");
    }
    println!("  created:   {}", route.created_at.format("%Y-%m-%d %H:%M"));
    println!("  views:     {}", route.view_count);

    match route.parsed_route_data() {
        Ok(data) => {
            for overlay in divemap_routes::routes::display::segment_overlays(&data) {
                println!(
                    "  segment {}: {} {}",
                    overlay.index + 1,
                    overlay.segment_type,
                    overlay.color
                );
            }
        }
        Err(e) => println!("  {e}"),
    }

    if RouteLifecycleService::can_manage(caller, route) {
        println!("  you can edit or hide this route");
    }
}
