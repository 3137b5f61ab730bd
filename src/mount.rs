//! Route registration and the request-to-execution pipeline.

use std::ops::ControlFlow;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::routing::post;
use axum::Json;
use axum::Router;
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::HeaderMap;
use http::StatusCode;
use http_body_util::BodyExt;
use mediatype::names::BOUNDARY;
use mediatype::names::FORM_DATA;
use mediatype::names::MULTIPART;
use mediatype::MediaType;
use mediatype::ReadParams;
use thiserror::Error;

use crate::executor::ContextPolicy;
use crate::executor::GraphQLExecutor;
use crate::files;
use crate::files::FileUploadError;
use crate::files::UploadLimits;
use crate::graphiql;
use crate::graphql;
use crate::graphql::RequestBatch;
use crate::graphql::Response;
use crate::graphql::ResponseBatch;
use crate::status;

/// A request check run before every mounted route, in the manner of an
/// authentication or CORS guard.
///
/// Decorators receive the request head (they may also mutate it, e.g. to
/// insert a context extension after authenticating) and either let the
/// request continue or short-circuit with a ready response.
#[async_trait]
pub trait RequestDecorator: Send + Sync {
    /// Inspects the request head. `Break` aborts the request with the given
    /// response; `Continue` passes it on.
    async fn decorate(&self, parts: &mut Parts) -> ControlFlow<axum::response::Response>;
}

/// Mounts a GraphQL executor onto an axum application.
///
/// Three routes are registered, relative to the configured prefix:
///
/// | Method | Path | Description |
/// |---|---|---|
/// | POST | `/graphql` | Executes single or batched operations, JSON or multipart |
/// | GET | `/schema.graphql` | The schema document as plain text |
/// | GET | `/graphiql` | The GraphiQL explorer page |
///
/// ```ignore
/// let app = axum::Router::new()
///     .merge(GraphQLMount::new(executor).with_prefix("/api").into_router());
/// ```
pub struct GraphQLMount<E: GraphQLExecutor> {
    executor: E,
    prefix: Option<String>,
    context: ContextPolicy<E::Context>,
    decorators: Vec<Arc<dyn RequestDecorator>>,
    include_traceback: bool,
    limits: UploadLimits,
}

impl<E: GraphQLExecutor> GraphQLMount<E> {
    /// Creates a mount for the given executor with the default
    /// configuration: no prefix, no context, no decorators, tracebacks off.
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            prefix: None,
            context: ContextPolicy::None,
            decorators: Vec::new(),
            include_traceback: false,
            limits: UploadLimits::default(),
        }
    }

    /// Mounts the routes under a URL prefix, e.g. `/api`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets the context policy. See [`ContextPolicy`].
    pub fn with_context(mut self, context: ContextPolicy<E::Context>) -> Self {
        self.context = context;
        self
    }

    /// Registers a context provider, invoked once per operation.
    ///
    /// Shorthand for [`ContextPolicy::Provider`].
    pub fn with_context_provider(
        self,
        provider: impl Fn() -> E::Context + Send + Sync + 'static,
    ) -> Self {
        self.with_context(ContextPolicy::Provider(Arc::new(provider)))
    }

    /// Appends a request decorator. Decorators apply to all three routes;
    /// the first registered wraps closest to the core, so they run in
    /// reverse registration order.
    pub fn with_decorator(mut self, decorator: Arc<dyn RequestDecorator>) -> Self {
        self.decorators.push(decorator);
        self
    }

    /// Exposes the fault trace of unexpected resolver errors to clients
    /// under `extensions.traceback`. Off by default; meant for development.
    pub fn with_traceback(mut self) -> Self {
        self.include_traceback = true;
        self
    }

    /// Overrides the multipart upload limits.
    pub fn with_upload_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Builds the axum router serving the three routes.
    pub fn into_router(self) -> Router {
        let prefix = self.prefix.clone();
        let mount = Arc::new(self);
        let routes = Router::new()
            .route("/graphql", post(graphql_handler::<E>))
            .route("/schema.graphql", get(schema_handler::<E>))
            .route("/graphiql", get(graphiql_handler::<E>))
            .with_state(mount);
        match prefix {
            Some(prefix) => Router::new().nest(&prefix, routes),
            None => routes,
        }
    }

    /// The URL the explorer page posts operations to.
    fn graphql_path(&self) -> String {
        format!("{}/graphql", self.prefix.as_deref().unwrap_or(""))
    }

    async fn run_decorators(&self, parts: &mut Parts) -> ControlFlow<axum::response::Response> {
        // First registered wraps closest to the core: outermost runs first.
        for decorator in self.decorators.iter().rev() {
            if let ControlFlow::Break(response) = decorator.decorate(parts).await {
                return ControlFlow::Break(response);
            }
        }
        ControlFlow::Continue(())
    }

    /// The request-to-execution pipeline behind `POST /graphql`: decode the
    /// operation batch, execute sequentially in request order, classify and
    /// fold statuses, and mirror the request shape in the envelope.
    async fn execute_http(
        &self,
        parts: Parts,
        body: Body,
    ) -> Result<axum::response::Response, RequestError> {
        let from_extension = match &self.context {
            ContextPolicy::RequestExtension => parts.extensions.get::<E::Context>().cloned(),
            _ => None,
        };

        let batch = if let Some(mime) = multipart_mime(&parts.headers) {
            let boundary = mime
                .get_param(BOUNDARY)
                .ok_or(FileUploadError::InvalidMultipartRequest(
                    multer::Error::NoBoundary,
                ))?
                .to_string();
            files::parse_multipart(body, boundary, &self.limits).await?
        } else {
            let bytes = body
                .collect()
                .await
                .map_err(RequestError::BodyRead)?
                .to_bytes();
            serde_json::from_slice::<RequestBatch>(&bytes).map_err(RequestError::InvalidBodyJson)?
        };

        let (requests, single) = match batch {
            RequestBatch::Single(request) => (vec![request], true),
            RequestBatch::Batch(requests) => (requests, false),
        };

        let mut overall = StatusCode::OK;
        let mut results = Vec::with_capacity(requests.len());
        // Sequential, in request order: batched operations may share a
        // context value, so there is no fan-out.
        for request in requests {
            let context = self.context.context_for_operation(&from_extension);
            let mut response = self.executor.execute(request, context).await;
            if !response.errors.is_empty() {
                let contribution =
                    status::classify(&mut response.errors, self.include_traceback);
                // A later, less severe operation never downgrades the status.
                overall = overall.max(contribution);
            }
            results.push(response);
        }

        let envelope = if single {
            ResponseBatch::Single(results.into_iter().next().unwrap_or_default())
        } else {
            ResponseBatch::Batch(results)
        };
        Ok((overall, Json(envelope)).into_response())
    }
}

/// Errors decoding the request payload, answered directly with 400 and a
/// GraphQL-shaped `errors` body.
#[derive(Debug, Error)]
enum RequestError {
    #[error("invalid JSON body: {0}")]
    InvalidBodyJson(serde_json::Error),

    #[error("failed to read the request body: {0}")]
    BodyRead(axum::Error),

    #[error(transparent)]
    Upload(#[from] FileUploadError),
}

impl IntoResponse for RequestError {
    fn into_response(self) -> axum::response::Response {
        let error = graphql::Error::builder().message(self.to_string()).build();
        let body = Response::builder().error(error).build();
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

fn multipart_mime(headers: &HeaderMap) -> Option<MediaType<'_>> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|header| header.to_str().ok())
        .and_then(|str| MediaType::parse(str).ok())
        .filter(|mime| mime.ty == MULTIPART && mime.subty == FORM_DATA)
}

async fn graphql_handler<E: GraphQLExecutor>(
    State(mount): State<Arc<GraphQLMount<E>>>,
    request: axum::extract::Request,
) -> axum::response::Response {
    let (mut parts, body) = request.into_parts();
    if let ControlFlow::Break(response) = mount.run_decorators(&mut parts).await {
        return response;
    }
    match mount.execute_http(parts, body).await {
        Ok(response) => response,
        Err(error) => error.into_response(),
    }
}

async fn schema_handler<E: GraphQLExecutor>(
    State(mount): State<Arc<GraphQLMount<E>>>,
    request: axum::extract::Request,
) -> axum::response::Response {
    let (mut parts, _body) = request.into_parts();
    if let ControlFlow::Break(response) = mount.run_decorators(&mut parts).await {
        return response;
    }
    (
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        mount.executor.schema_document(),
    )
        .into_response()
}

async fn graphiql_handler<E: GraphQLExecutor>(
    State(mount): State<Arc<GraphQLMount<E>>>,
    request: axum::extract::Request,
) -> axum::response::Response {
    let (mut parts, _body) = request.into_parts();
    if let ControlFlow::Break(response) = mount.run_decorators(&mut parts).await {
        return response;
    }
    graphiql::page(&mount.graphql_path()).into_response()
}
