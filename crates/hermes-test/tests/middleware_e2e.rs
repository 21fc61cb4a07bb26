//! Bundled middleware running in front of real routes.

use std::sync::Arc;
use std::time::Duration;

use hermes_core::{handler_fn, BoxedHandler};
use hermes_middleware::{Cors, Helmet, Logger, RequestId, RequestIdMiddleware, REQUEST_ID_HEADER};
use hermes_server::{AppConfig, AppConfigBuilder, Controller, ControllerRoutes, Group};
use hermes_test::TestClient;
use http::Method;

struct Items;

impl Controller for Items {
    fn routes(&self) -> ControllerRoutes {
        ControllerRoutes::new("/items")
            .get("/", "list", handler_fn(|ctx| {
                Box::pin(async move {
                    let id = ctx
                        .local::<RequestId>()
                        .map(|id| id.as_str().to_string())
                        .unwrap_or_default();
                    ctx.string(id, None, None)?;
                    Ok(())
                })
            }))
            .post("/", "create", handler_fn(|ctx| {
                Box::pin(async move {
                    ctx.status(201)?;
                    Ok(())
                })
            }))
    }
}

fn client(builder: AppConfigBuilder) -> TestClient {
    TestClient::new(builder.mount(&Items).build()).unwrap()
}

fn cors() -> BoxedHandler {
    Arc::new(
        Cors::builder()
            .allow_origin("https://app.example.com")
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(["content-type"])
            .expose_headers([REQUEST_ID_HEADER])
            .max_age(Duration::from_secs(600))
            .build(),
    )
}

#[tokio::test]
async fn test_request_id_generated_and_visible_to_handler() {
    let client = client(AppConfig::builder().middleware(Arc::new(RequestIdMiddleware::new())));
    let response = client.get("/items").send().await;
    let header = response.header(REQUEST_ID_HEADER).unwrap();
    assert_eq!(header.len(), 36);
    response.assert_body_eq(&header);
}

#[tokio::test]
async fn test_request_id_reused_from_client() {
    let client = client(AppConfig::builder().middleware(Arc::new(RequestIdMiddleware::new())));
    client
        .get("/items")
        .header(REQUEST_ID_HEADER, "trace-123")
        .send()
        .await
        .assert_header(REQUEST_ID_HEADER, "trace-123")
        .assert_body_eq("trace-123");
}

#[tokio::test]
async fn test_request_id_on_not_found() {
    let client = client(AppConfig::builder().middleware(Arc::new(RequestIdMiddleware::new())));
    let response = client.get("/nothing").send().await;
    response.assert_status(404);
    assert!(response.header(REQUEST_ID_HEADER).is_some());
}

#[tokio::test]
async fn test_cors_preflight_answered_before_routing() {
    let client = client(AppConfig::builder().middleware(cors()));
    client
        .options("/items")
        .header("origin", "https://app.example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "Content-Type")
        .send()
        .await
        .assert_status(204)
        .assert_header("access-control-allow-origin", "https://app.example.com")
        .assert_header("access-control-allow-methods", "GET, POST")
        .assert_header("access-control-max-age", "600")
        .assert_no_header("allow")
        .assert_empty_body();
}

#[tokio::test]
async fn test_cors_preflight_rejects_unknown_origin() {
    let client = client(AppConfig::builder().middleware(cors()));
    client
        .options("/items")
        .header("origin", "https://evil.example.com")
        .header("access-control-request-method", "GET")
        .send()
        .await
        .assert_status(403)
        .assert_no_header("access-control-allow-origin");
}

#[tokio::test]
async fn test_cors_simple_request_gets_headers() {
    let client = client(AppConfig::builder().middleware(cors()));
    client
        .post("/items")
        .header("origin", "https://app.example.com")
        .send()
        .await
        .assert_status(201)
        .assert_header("access-control-allow-origin", "https://app.example.com")
        .assert_header("access-control-expose-headers", REQUEST_ID_HEADER)
        .assert_header("vary", "Origin");
}

#[tokio::test]
async fn test_plain_options_still_discovers_methods() {
    let client = client(AppConfig::builder().middleware(cors()));
    client
        .options("/items")
        .send()
        .await
        .assert_status(204)
        .assert_header("allow", "GET, POST");
}

#[tokio::test]
async fn test_helmet_headers_on_every_response() {
    let client = client(AppConfig::builder().middleware(Arc::new(Helmet::new())));
    for response in [
        client.get("/items").send().await,
        client.get("/missing").send().await,
    ] {
        response
            .assert_header("x-content-type-options", "nosniff")
            .assert_header("x-frame-options", "SAMEORIGIN")
            .assert_header("referrer-policy", "no-referrer");
    }
}

#[tokio::test]
async fn test_group_scoped_middleware() {
    let config = AppConfig::builder()
        .register(&Items)
        .group(
            Group::new()
                .prefix("/secure")
                .middleware(Arc::new(Helmet::new()))
                .controller::<Items>(),
        )
        .group(Group::new().prefix("/open").controller::<Items>())
        .build();
    let client = TestClient::new(config).unwrap();

    client
        .get("/secure/items")
        .send()
        .await
        .assert_status(200)
        .assert_header("x-content-type-options", "nosniff");
    client
        .get("/open/items")
        .send()
        .await
        .assert_status(200)
        .assert_no_header("x-content-type-options");
}

#[tokio::test]
async fn test_full_stack() {
    let client = client(
        AppConfig::builder()
            .middleware(Arc::new(RequestIdMiddleware::new()))
            .middleware(Arc::new(Logger::new()))
            .middleware(cors())
            .middleware(Arc::new(Helmet::new())),
    );
    let response = client
        .get("/items")
        .header("origin", "https://app.example.com")
        .send()
        .await;
    response
        .assert_status(200)
        .assert_header("access-control-allow-origin", "https://app.example.com")
        .assert_header("x-content-type-options", "nosniff");
    let id = response.header(REQUEST_ID_HEADER).unwrap();
    response.assert_body_eq(&id);
}
