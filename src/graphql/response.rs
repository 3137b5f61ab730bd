use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map as JsonMap;
use serde_json_bytes::Value;

use crate::graphql::Error;
use crate::graphql::Object;

/// A GraphQL response, produced once per executed [`Request`].
///
/// [`Request`]: crate::graphql::Request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Response {
    /// The response data.
    ///
    /// `None` when the operation failed before execution (e.g. a syntax or
    /// validation error); `Some(Value::Null)` when execution started but the
    /// operation-level result was destroyed by a field error.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Value>,

    /// The GraphQL errors encountered, in the order the engine reported them.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<Error>,

    /// The optional GraphQL extensions.
    #[serde(skip_serializing_if = "Object::is_empty", default)]
    pub extensions: Object,
}

#[buildstructor::buildstructor]
impl Response {
    /// Returns a builder that builds a GraphQL [`Response`] from its components.
    ///
    /// Builder methods:
    ///
    /// * `.data(impl Into<`[`Value`]`>)` — optional.
    /// * `.errors(impl Into<`[`Vec`]`<`[`Error`]`>>)` or repeated
    ///   `.error(impl Into<`[`Error`]`>)` — optional.
    /// * `.extensions(...)` or repeated `.extension(key, value)` — optional.
    /// * `.build()` — returns the `Response`.
    #[builder(visibility = "pub")]
    fn new(
        data: Option<Value>,
        errors: Vec<Error>,
        // Skip the `Object` type alias in order to use buildstructor's map special-casing
        extensions: JsonMap<ByteString, Value>,
    ) -> Self {
        Self {
            data,
            errors,
            extensions,
        }
    }
}

/// The response envelope: mirrors the shape of the incoming
/// [`RequestBatch`], a bare response object for a single operation and an
/// ordered array for a batch.
///
/// [`RequestBatch`]: crate::graphql::RequestBatch
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBatch {
    /// The bare response of a single operation.
    Single(Response),
    /// The responses of a batch, in request order.
    Batch(Vec<Response>),
}
