//! Serving routers over real sockets.

use std::net::SocketAddr;

use axum::http::StatusCode;
use request_router::exception::{Failure, HttpException};
use request_router::filter::RequestIdFilter;
use request_router::http::{response, HttpRequest, HttpServer, RequestExt, RouterService, X_REQUEST_ID};
use request_router::lifecycle::Shutdown;
use request_router::routing::{HttpRouter, Route};
use tokio::net::TcpListener;

fn router() -> HttpRouter {
    let mut builder = HttpRouter::builder();
    builder
        .filter(RequestIdFilter)
        .unwrap()
        .add(
            Route::post("/groups/", |req: HttpRequest| async move {
                Ok::<_, Failure>(response::response(StatusCode::CREATED, "application/json", req.into_body()))
            })
            .unwrap(),
        )
        .unwrap()
        .add(
            Route::get("/groups/:id", |req: HttpRequest| async move {
                match req.param("id") {
                    Some("42") => Ok(response::text(StatusCode::OK, "42")),
                    Some(id) => Err(HttpException::not_found(format!("group {id} not found")).into()),
                    None => Err(Failure::msg("route bound without id")),
                }
            })
            .unwrap(),
        )
        .unwrap()
        .add(
            Route::get("/admin/routes", |_req: HttpRequest| async move {
                Ok::<_, Failure>(response::text(StatusCode::OK, "admin"))
            })
            .unwrap()
            .admin(),
        )
        .unwrap();
    builder.freeze().unwrap()
}

async fn serve(service: RouterService, shutdown: &Shutdown) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(service);
    let signal = shutdown.signalled();
    let handle = tokio::spawn(async move {
        server.run(listener, signal).await.unwrap();
    });
    (addr, handle)
}

#[tokio::test]
async fn test_external_and_admin_interfaces() {
    let shutdown = Shutdown::new();
    let router = router();
    let (external, external_task) = serve(RouterService::new(router.clone()), &shutdown).await;
    let (admin, admin_task) = serve(RouterService::admin(router), &shutdown).await;
    let client = reqwest::Client::new();

    let created = client
        .post(format!("http://{external}/groups/"))
        .body(r#"{"name":"ops"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), reqwest::StatusCode::CREATED);
    assert!(created.headers().contains_key(X_REQUEST_ID));
    let body: serde_json::Value = created.json().await.unwrap();
    assert_eq!(body["name"], "ops");

    let found = client.get(format!("http://{external}/groups/42")).send().await.unwrap();
    assert_eq!(found.status(), reqwest::StatusCode::OK);
    assert_eq!(found.text().await.unwrap(), "42");

    let missing = client.get(format!("http://{external}/groups/7")).send().await.unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
    let body: serde_json::Value = missing.json().await.unwrap();
    assert_eq!(body["errors"][0], "group 7 not found");

    let unrouted = client.get(format!("http://{external}/widgets/")).send().await.unwrap();
    assert_eq!(unrouted.status(), reqwest::StatusCode::NOT_FOUND);

    // admin routes only answer on the admin listener
    let hidden = client.get(format!("http://{external}/admin/routes")).send().await.unwrap();
    assert_eq!(hidden.status(), reqwest::StatusCode::NOT_FOUND);
    let listed = client.get(format!("http://{admin}/admin/routes")).send().await.unwrap();
    assert_eq!(listed.status(), reqwest::StatusCode::OK);
    let public_on_admin = client.get(format!("http://{admin}/groups/42")).send().await.unwrap();
    assert_eq!(public_on_admin.status(), reqwest::StatusCode::NOT_FOUND);

    drop(client);
    shutdown.trigger();
    external_task.await.unwrap();
    admin_task.await.unwrap();
}

#[tokio::test]
async fn test_incoming_request_id_is_echoed() {
    let shutdown = Shutdown::new();
    let (addr, task) = serve(RouterService::new(router()), &shutdown).await;

    let response = reqwest::Client::new()
        .get(format!("http://{addr}/groups/42"))
        .header(X_REQUEST_ID, "req-123")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()[X_REQUEST_ID], "req-123");

    shutdown.trigger();
    task.await.unwrap();
}

#[test]
fn test_request_ext_on_unrouted_request() {
    let request = axum::http::Request::new(());
    assert!(request.path_params().is_none());
    assert!(request.matched_route().is_none());
}
