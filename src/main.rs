//! request-router demo server.
//!
//! Serves a small groups API on the external interface and route listings on
//! the admin interface, optionally mirroring external traffic to a dark
//! destination.
//!
//! ```text
//! external listener ─▶ request id ─▶ logging ─▶ stats ─▶ dark traffic ─▶ /groups/...
//! admin listener    ─▶ request id ─▶ logging ─▶ stats ─▶ /admin, /admin/routes
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use axum::http::StatusCode;
use clap::Parser;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use request_router::config::{load_config, RouterConfig};
use request_router::dark_traffic::{self, DarkTrafficStats};
use request_router::exception::{Failure, HttpException};
use request_router::filter::{LoggingFilter, RequestIdFilter, StatsFilter};
use request_router::http::{response, HttpRequest, HttpResponse, HttpServer, RequestExt, RouterService};
use request_router::lifecycle::{trigger_on_ctrl_c, Shutdown};
use request_router::observability::{logging, metrics};
use request_router::routing::{AdminIndexEntry, Controller, HttpRouter, Route, RouteInfo};
use request_router::RouterError;

#[derive(Parser, Debug)]
#[command(name = "request-router", version, about = "HTTP router with filter chains and dark traffic")]
struct Args {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    logging::init(&config.observability.log_level, config.observability.compact_logs)?;
    tracing::info!("request-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        admin_enabled = config.admin.enabled,
        admin_address = %config.admin.bind_address,
        dark_traffic = config.dark_traffic.destination.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let router = build_router(&config)?;

    let shutdown = Shutdown::new();
    tokio::spawn(trigger_on_ctrl_c(shutdown.clone()));

    let external_listener = TcpListener::bind(&config.server.bind_address).await?;
    let external = HttpServer::new(RouterService::new(router.clone()).body_limit(config.server.max_body_bytes));

    if config.admin.enabled {
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        let admin = HttpServer::new(admin_service(&config, router));
        tokio::try_join!(
            external.run(external_listener, shutdown.signalled()),
            admin.run(admin_listener, shutdown.signalled()),
        )?;
    } else {
        external.run(external_listener, shutdown.signalled()).await?;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Snapshot of the frozen router served by the admin routes.
#[derive(Default)]
struct AdminListing {
    routes: OnceLock<Vec<RouteInfo>>,
    index: OnceLock<Vec<AdminIndexEntry>>,
}

impl AdminListing {
    fn fill(&self, router: &HttpRouter) -> Result<(), Box<dyn std::error::Error>> {
        self.routes
            .set(router.routes())
            .map_err(|_| "admin route listing filled twice")?;
        self.index
            .set(router.admin_index())
            .map_err(|_| "admin index filled twice")?;
        Ok(())
    }
}

fn admin_service(config: &RouterConfig, router: HttpRouter) -> RouterService {
    RouterService::admin(router).body_limit(config.server.max_body_bytes)
}

fn build_router(config: &RouterConfig) -> Result<HttpRouter, Box<dyn std::error::Error>> {
    let listing = Arc::new(AdminListing::default());
    let dark = dark_traffic::from_config(&config.dark_traffic)?;
    let dark_stats = dark.as_ref().map(|filter| filter.stats());

    let mut builder = HttpRouter::builder();
    builder
        .filter(RequestIdFilter)?
        .filter(LoggingFilter)?
        .filter(StatsFilter)?;

    // admin routes are registered before the dark traffic filter so they are never mirrored
    add_admin_routes(&mut builder, listing.clone(), dark_stats)?;

    if let Some(dark) = dark {
        builder.filter(dark)?;
    }
    builder.add_controller(GroupsController::default())?;

    let router = builder.freeze()?;
    listing.fill(&router)?;
    Ok(router)
}

fn add_admin_routes(
    builder: &mut request_router::HttpRouterBuilder,
    listing: Arc<AdminListing>,
    dark_stats: Option<Arc<DarkTrafficStats>>,
) -> Result<(), RouterError> {
    let index = listing.clone();
    builder.add(
        Route::get("/admin", move |_req: HttpRequest| {
            let index = index.clone();
            async move { json(StatusCode::OK, index.index.get().map_or(&[][..], Vec::as_slice)) }
        })?
        .admin(),
    )?;

    builder.add(
        Route::get("/admin/routes", move |_req: HttpRequest| {
            let listing = listing.clone();
            async move { json(StatusCode::OK, listing.routes.get().map_or(&[][..], Vec::as_slice)) }
        })?
        .admin()
        .index("Routes"),
    )?;

    if let Some(stats) = dark_stats {
        builder.add(
            Route::get("/admin/dark_traffic", move |_req: HttpRequest| {
                let stats = stats.clone();
                async move { json(StatusCode::OK, &stats.snapshot()) }
            })?
            .admin()
            .index("Dark traffic"),
        )?;
    }
    Ok(())
}

fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<HttpResponse, Failure> {
    response::json(status, value).map_err(|e| Failure::from_boxed(Box::new(e)))
}

#[derive(Debug, Clone, Serialize)]
struct Group {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreateGroup {
    name: String,
}

/// In-memory groups API.
#[derive(Default)]
struct GroupsController {
    next_id: AtomicU64,
    groups: DashMap<u64, Group>,
}

impl GroupsController {
    fn create(&self, request: &HttpRequest) -> Result<HttpResponse, Failure> {
        let input: CreateGroup = serde_json::from_slice(request.body())
            .map_err(|e| HttpException::bad_request(format!("invalid group: {e}")))?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let group = Group { id, name: input.name };
        self.groups.insert(id, group.clone());
        json(StatusCode::CREATED, &group)
    }

    fn list(&self) -> Result<HttpResponse, Failure> {
        let mut groups: Vec<Group> = self.groups.iter().map(|g| g.value().clone()).collect();
        groups.sort_by_key(|g| g.id);
        json(StatusCode::OK, &groups)
    }

    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, Failure> {
        let id = group_id(request)?;
        let group = self
            .groups
            .get(&id)
            .map(|g| g.value().clone())
            .ok_or_else(|| HttpException::not_found(format!("group {id} not found")))?;
        json(StatusCode::OK, &group)
    }

    fn delete(&self, request: &HttpRequest) -> Result<HttpResponse, Failure> {
        let id = group_id(request)?;
        match self.groups.remove(&id) {
            Some(_) => Ok(response::empty(StatusCode::NO_CONTENT)),
            None => Err(HttpException::not_found(format!("group {id} not found")).into()),
        }
    }
}

fn group_id(request: &HttpRequest) -> Result<u64, HttpException> {
    let raw = request.param("id").unwrap_or_default();
    raw.parse()
        .map_err(|_| HttpException::bad_request(format!("invalid group id {raw:?}")))
}

impl Controller for GroupsController {
    fn name(&self) -> &str {
        "groups"
    }

    fn routes(self: Arc<Self>) -> Result<Vec<Route>, RouterError> {
        let create = self.clone();
        let list = self.clone();
        let get = self.clone();
        let delete = self;

        Ok(vec![
            Route::post("/groups/", move |req: HttpRequest| {
                let result = create.create(&req);
                async move { result }
            })?,
            Route::get("/groups/", move |_req: HttpRequest| {
                let result = list.list();
                async move { result }
            })?,
            Route::get("/groups/:id", move |req: HttpRequest| {
                let result = get.get(&req);
                async move { result }
            })?,
            Route::delete("/groups/:id", move |req: HttpRequest| {
                let result = delete.delete(&req);
                async move { result }
            })?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};

    #[tokio::test]
    async fn test_admin_listener_honours_body_limit() {
        let mut config = RouterConfig::default();
        config.server.max_body_bytes = 4;
        let router = build_router(&config).unwrap();

        let service = admin_service(&config, router.clone());
        let request = Request::builder()
            .method(Method::GET)
            .uri("/admin")
            .body(Body::from("well over four bytes"))
            .unwrap();
        assert_eq!(service.handle(request).await.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let request = Request::builder().method(Method::GET).uri("/admin").body(Body::empty()).unwrap();
        assert_eq!(service.handle(request).await.status(), StatusCode::OK);
    }

    #[test]
    fn test_admin_listing_fills_once() {
        let router = build_router(&RouterConfig::default()).unwrap();
        let listing = AdminListing::default();
        listing.fill(&router).unwrap();
        assert!(listing.routes.get().is_some_and(|routes| !routes.is_empty()));
        assert!(listing.fill(&router).is_err());
    }
}
