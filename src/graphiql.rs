//! The GraphiQL explorer page.

use axum::response::Html;

/// Renders the explorer page, pre-configured to post operations to the
/// mounted graphql path.
pub(crate) fn page(graphql_path: &str) -> Html<String> {
    Html(include_str!("graphiql.html").replace("%%GRAPHQL_HTTP_PATH%%", graphql_path))
}
