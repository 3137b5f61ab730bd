//! Mount a pre-built GraphQL schema onto an [`axum`] application.
//!
//! The schema itself — type system, resolvers, execution — belongs to an
//! external GraphQL engine behind the [`GraphQLExecutor`] trait. This crate
//! supplies the HTTP surface around it:
//!
//! * `POST /graphql` — executes a single operation or an ordered batch,
//!   from a JSON body or a `multipart/form-data` body following the
//!   [GraphQL multipart request convention] (file payloads spliced into
//!   variables by dotted paths). The response mirrors the request shape,
//!   and the status code reflects error classification: 200 on success,
//!   400 for GraphQL-level errors, 500 for unexpected resolver faults
//!   (whose messages are redacted before reaching the client).
//! * `GET /schema.graphql` — the schema document as plain text.
//! * `GET /graphiql` — the GraphiQL explorer, pre-pointed at `/graphql`.
//!
//! Start from [`GraphQLMount`]:
//!
//! ```ignore
//! let mount = GraphQLMount::new(executor)
//!     .with_prefix("/api")
//!     .with_context_provider(|| AppContext::new());
//! let app = axum::Router::new().merge(mount.into_router());
//! ```
//!
//! [GraphQL multipart request convention]: https://github.com/jaydenseric/graphql-multipart-request-spec

#![warn(unreachable_pub)]

mod executor;
mod files;
mod graphiql;
pub mod graphql;
mod mount;
mod status;

pub use executor::ContextPolicy;
pub use executor::GraphQLExecutor;
pub use files::FilePayload;
pub use files::UploadLimits;
pub use mount::GraphQLMount;
pub use mount::RequestDecorator;
