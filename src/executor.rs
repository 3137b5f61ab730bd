//! The seam to the external GraphQL engine, and the policy for the context
//! value handed to it.

use std::sync::Arc;

use async_trait::async_trait;
use derivative::Derivative;

use crate::graphql::Request;
use crate::graphql::Response;

/// The external GraphQL engine behind the mounted routes.
///
/// Implementations wrap a pre-built schema from a GraphQL execution library.
/// `execute` is given one operation at a time and must not fail at the Rust
/// level: engine faults — syntax errors, validation errors, trapped resolver
/// faults — are encoded as [`Error`] entries of the returned [`Response`],
/// with [`Error::source`] set to the original fault when a resolver raised
/// one. Each operation is executed exactly once; there are no retries, and
/// no timeout beyond whatever the host applies to the whole request.
///
/// [`Error`]: crate::graphql::Error
/// [`Error::source`]: crate::graphql::Error::source
#[async_trait]
pub trait GraphQLExecutor: Send + Sync + 'static {
    /// The opaque context value passed through to resolvers. Not
    /// interpreted by this crate.
    type Context: Clone + Send + Sync + 'static;

    /// Executes one GraphQL operation against the schema.
    async fn execute(&self, request: Request, context: Option<Self::Context>) -> Response;

    /// The full schema document in GraphQL schema language, served at
    /// `/schema.graphql`.
    fn schema_document(&self) -> String;
}

/// How the execution context for each operation is obtained.
///
/// The policy is explicit configuration: there is no environment sniffing
/// fallback. A host that keeps a per-request resource (say, a database
/// session opened by its own middleware) opts into
/// [`ContextPolicy::RequestExtension`] and inserts the value into the
/// request's extensions.
#[derive(Derivative, Clone)]
#[derivative(Debug(bound = ""))]
pub enum ContextPolicy<C> {
    /// No context; the executor receives `None`.
    None,
    /// Invoke the provider for every operation. A batch of three operations
    /// gets three calls, so a provider that opens a resource per call opens
    /// one per operation.
    Provider(#[derivative(Debug = "ignore")] Arc<dyn Fn() -> C + Send + Sync>),
    /// Clone the context out of the incoming request's `http` extensions,
    /// where host middleware placed it. Absent extension means no context.
    RequestExtension,
}

impl<C> Default for ContextPolicy<C> {
    fn default() -> Self {
        Self::None
    }
}

impl<C: Clone> ContextPolicy<C> {
    /// Produces the context for one operation. `from_extension` is the value
    /// found in the request's extensions, if any.
    pub(crate) fn context_for_operation(&self, from_extension: &Option<C>) -> Option<C> {
        match self {
            Self::None => None,
            Self::Provider(provider) => Some(provider()),
            Self::RequestExtension => from_extension.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;

    #[test]
    fn provider_is_invoked_once_per_operation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = {
            let calls = calls.clone();
            ContextPolicy::Provider(Arc::new(move || calls.fetch_add(1, Ordering::SeqCst)))
        };

        assert_eq!(policy.context_for_operation(&None), Some(0));
        assert_eq!(policy.context_for_operation(&None), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn none_policy_ignores_request_extensions() {
        let policy: ContextPolicy<usize> = ContextPolicy::None;
        assert_eq!(policy.context_for_operation(&Some(7)), None);
    }

    #[test]
    fn extension_policy_clones_the_request_value() {
        let policy: ContextPolicy<usize> = ContextPolicy::RequestExtension;
        assert_eq!(policy.context_for_operation(&Some(7)), Some(7));
        assert_eq!(policy.context_for_operation(&None), None);
    }
}
