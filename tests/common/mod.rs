//! A scripted executor standing in for a real GraphQL engine, plus request
//! helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use graphql_mount::graphql::Error;
use graphql_mount::graphql::Path;
use graphql_mount::graphql::Request;
use graphql_mount::graphql::Response;
use graphql_mount::GraphQLExecutor;
use http::header::CONTENT_TYPE;
use http_body_util::BodyExt;
use serde_json_bytes::json;
use serde_json_bytes::Value;
use tower::ServiceExt;

pub const BOUNDARY: &str = "------------------------graphqlmount";

/// The fault raised by the scripted `{ error }` resolver.
#[derive(Debug, thiserror::Error)]
#[error("error requested")]
pub struct ResolverFault;

/// Executes a small scripted schema:
///
/// * `{ greet }` and `{ greet(name: "...") }` — greeting; lowercase names
///   fail argument validation (a GraphQL-level error).
/// * `{ greet() }` — a syntax error.
/// * `{ error }` — a resolver that raises an unexpected fault.
/// * `{ echo }` — echoes the execution context.
/// * `single(data:`/`multi(data:` — return uploaded file content.
pub struct ScriptedExecutor;

impl ScriptedExecutor {
    fn greet(query: &str) -> Response {
        let name = query
            .split_once("name: \"")
            .and_then(|(_, rest)| rest.split_once('"'))
            .map(|(name, _)| name)
            .unwrap_or("World");
        if name.starts_with(char::is_lowercase) {
            return Response::builder()
                .data(Value::Null)
                .error(Error::builder().message("argument validation").build())
                .build();
        }
        Response::builder()
            .data(json!({"greet": format!("Hello, {name}!")}))
            .build()
    }

    fn single_upload(request: &Request) -> Response {
        let value = request.variables.get("data").cloned().unwrap_or(Value::Null);
        match request.upload(&value) {
            Some(upload) => Response::builder()
                .data(json!({
                    "single": String::from_utf8_lossy(&upload.data).into_owned()
                }))
                .build(),
            None => Self::missing_upload(),
        }
    }

    fn multi_upload(request: &Request) -> Response {
        let values = request
            .variables
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let mut contents = Vec::new();
        for value in &values {
            match request.upload(value) {
                Some(upload) => {
                    contents.push(Value::String(
                        String::from_utf8_lossy(&upload.data).into_owned().into(),
                    ));
                }
                None => return Self::missing_upload(),
            }
        }
        Response::builder()
            .data(json!({"multi": contents}))
            .build()
    }

    fn missing_upload() -> Response {
        Response::builder()
            .data(Value::Null)
            .error(
                Error::builder()
                    .message("expected an Upload value")
                    .build(),
            )
            .build()
    }
}

#[async_trait]
impl GraphQLExecutor for ScriptedExecutor {
    type Context = String;

    async fn execute(&self, request: Request, context: Option<String>) -> Response {
        let query = request.query.as_str();
        if query.contains("greet()") {
            return Response::builder()
                .error(
                    Error::builder()
                        .message("Syntax Error: expected an argument name")
                        .build(),
                )
                .build();
        }
        if query.contains("error") {
            return Response::builder()
                .data(Value::Null)
                .error(
                    Error::builder()
                        .message("error requested")
                        .path(Path::from("error"))
                        .source(Arc::new(ResolverFault)
                            as Arc<dyn std::error::Error + Send + Sync>)
                        .build(),
                )
                .build();
        }
        if query.contains("echo") {
            let context = context.map(Value::from).unwrap_or(Value::Null);
            return Response::builder().data(json!({"echo": context})).build();
        }
        if query.contains("single(data:") {
            return Self::single_upload(&request);
        }
        if query.contains("multi(data:") {
            return Self::multi_upload(&request);
        }
        if query.contains("greet") {
            return Self::greet(query);
        }
        Response::builder()
            .error(
                Error::builder()
                    .message(format!("Cannot query field {query:?}"))
                    .build(),
            )
            .build()
    }

    fn schema_document(&self) -> String {
        "type Query {\n  greet(name: String! = \"World\"): String!\n}\n".to_owned()
    }
}

/// Sends one request through a fresh copy of the router and returns the
/// status and the JSON body.
pub async fn send(
    router: axum::Router,
    request: http::Request<Body>,
) -> (http::StatusCode, serde_json::Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// A `POST /graphql` request with a JSON payload.
pub fn graphql_json(path: &str, payload: serde_json::Value) -> http::Request<Body> {
    http::Request::post(path)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

/// A `POST /graphql` request with a `multipart/form-data` payload.
///
/// Each entry is `(field name, optional filename, content)`; fields are
/// emitted in order.
pub fn graphql_multipart(
    path: &str,
    fields: &[(&str, Option<&str>, &str)],
) -> http::Request<Body> {
    let mut body = String::new();
    for (name, filename, content) in fields {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        match filename {
            Some(filename) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: text/plain\r\n\r\n",
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n",
            )),
        }
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    http::Request::post(path)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
