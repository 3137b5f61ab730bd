//! Request decorators guarding the mounted routes.

mod common;

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::body::Body;
use axum::response::IntoResponse;
use common::graphql_json;
use common::send;
use common::ScriptedExecutor;
use graphql_mount::GraphQLMount;
use graphql_mount::RequestDecorator;
use http::request::Parts;
use http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

/// Rejects requests without an `authorization: secret` header.
struct RequireToken;

#[async_trait]
impl RequestDecorator for RequireToken {
    async fn decorate(&self, parts: &mut Parts) -> ControlFlow<axum::response::Response> {
        let authorized = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .is_some_and(|value| value == "secret");
        if authorized {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(StatusCode::UNAUTHORIZED.into_response())
        }
    }
}

/// Records its label on every pass-through.
struct Recorder {
    label: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl RequestDecorator for Recorder {
    async fn decorate(&self, _parts: &mut Parts) -> ControlFlow<axum::response::Response> {
        self.log.lock().unwrap().push(self.label);
        ControlFlow::Continue(())
    }
}

#[tokio::test]
async fn decorators_guard_every_route() {
    let router = GraphQLMount::new(ScriptedExecutor)
        .with_decorator(Arc::new(RequireToken))
        .into_router();

    for request in [
        graphql_json("/graphql", json!({"query": "{ greet }"})),
        http::Request::get("/graphiql").body(Body::empty()).unwrap(),
        http::Request::get("/schema.graphql")
            .body(Body::empty())
            .unwrap(),
    ] {
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn authorized_requests_pass_through() {
    let router = GraphQLMount::new(ScriptedExecutor)
        .with_decorator(Arc::new(RequireToken))
        .into_router();

    let request = http::Request::post("/graphql")
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::AUTHORIZATION, "secret")
        .body(Body::from(json!({"query": "{ greet }"}).to_string()))
        .unwrap();
    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": {"greet": "Hello, World!"}}));
}

#[tokio::test]
async fn the_first_registered_decorator_runs_last() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let router = GraphQLMount::new(ScriptedExecutor)
        .with_decorator(Arc::new(Recorder {
            label: "inner",
            log: log.clone(),
        }))
        .with_decorator(Arc::new(Recorder {
            label: "outer",
            log: log.clone(),
        }))
        .into_router();

    let (status, _) = send(router, graphql_json("/graphql", json!({"query": "{ greet }"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(*log.lock().unwrap(), ["outer", "inner"]);
}
