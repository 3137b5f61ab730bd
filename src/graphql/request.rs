use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map as JsonMap;
use serde_json_bytes::Value;
use thiserror::Error;

use crate::files::FilePayload;
use crate::graphql::Object;

/// Prefix of the placeholder token written into `variables` where an
/// uploaded file was spliced in. [`Request::upload`] resolves the token
/// back to its payload.
const UPLOAD_TOKEN_PREFIX: &str = "#__upload__:";

/// A path from the `map` multipart field did not point at a value inside
/// `variables`.
#[derive(Debug, Error)]
#[error("path does not point at a value inside 'variables'")]
pub struct InvalidUploadPath;

/// A GraphQL `Request`: one operation of an incoming HTTP request.
///
/// For historical purposes, the term "query" is commonly used to refer to
/// *any* GraphQL operation which might be, e.g., a `mutation`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Request {
    /// The GraphQL operation (e.g., query, mutation) string.
    pub query: String,

    /// The (optional) GraphQL operation name.
    ///
    /// When specified, this name must match the name of an operation in the
    /// GraphQL document. When excluded, there must exist only a single
    /// operation in the GraphQL document.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub operation_name: Option<String>,

    /// The (optional) GraphQL variables in the form of a JSON object.
    ///
    /// A JSON `null` is accepted and treated the same as an absent map,
    /// since clients commonly send `"variables": null`.
    #[serde(
        skip_serializing_if = "Object::is_empty",
        default,
        deserialize_with = "deserialize_null_default"
    )]
    pub variables: Object,

    /// Files spliced into `variables` by the multipart file map, in splice
    /// order. Never serialized; scoped to the lifetime of the request.
    #[serde(skip)]
    pub uploads: Vec<FilePayload>,
}

// NOTE: this deserialize helper is used to transform `null` to Default::default()
fn deserialize_null_default<'de, D, T: Default + Deserialize<'de>>(
    deserializer: D,
) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
{
    <Option<T>>::deserialize(deserializer).map(|x| x.unwrap_or_default())
}

#[buildstructor::buildstructor]
impl Request {
    /// This is the constructor (or builder) to use when constructing a
    /// GraphQL `Request`.
    ///
    /// Builder methods:
    ///
    /// * `.query(impl Into<`[`String`]`>)` — required.
    /// * `.operation_name(impl Into<`[`String`]`>)` — optional.
    /// * `.variables(impl Into<`[`serde_json_bytes::Map`]`<`[`ByteString`]`, `[`Value`]`>>)`
    ///   or repeated `.variable(name, value)` — optional.
    /// * `.build()` — returns the `Request`.
    #[builder(visibility = "pub")]
    fn new(
        query: String,
        operation_name: Option<String>,
        // Skip the `Object` type alias in order to use buildstructor's map special-casing
        variables: JsonMap<ByteString, Value>,
    ) -> Self {
        Self {
            query,
            operation_name,
            variables,
            uploads: Vec::new(),
        }
    }

    /// Splices an uploaded file into `variables` at the given path.
    ///
    /// The path segments are interpreted by the shape of the value met at
    /// each step: JSON objects take the segment as a field name, JSON arrays
    /// as a non-negative index. The terminal position is overwritten with a
    /// placeholder token and the payload is appended to [`Request::uploads`];
    /// whatever value was there before is discarded without inspection. A
    /// terminal field of an object is inserted if absent, a terminal list
    /// index must be in range.
    pub fn set_upload(
        &mut self,
        path: &[&str],
        payload: FilePayload,
    ) -> Result<(), InvalidUploadPath> {
        let token = Value::String(
            format!("{UPLOAD_TOKEN_PREFIX}{}", self.uploads.len()).into(),
        );

        let (variable_name, rest) = path.split_first().ok_or(InvalidUploadPath)?;
        match rest.split_last() {
            None => {
                self.variables.insert(*variable_name, token);
            }
            Some((terminal, descent)) => {
                let root = self
                    .variables
                    .get_mut(*variable_name)
                    .ok_or(InvalidUploadPath)?;
                let cursor = descent.iter().try_fold(root, |parent, segment| {
                    match parent {
                        Value::Object(map) => map.get_mut(*segment),
                        Value::Array(list) => segment
                            .parse::<usize>()
                            .ok()
                            .and_then(move |index| list.get_mut(index)),
                        _ => None,
                    }
                    .ok_or(InvalidUploadPath)
                })?;
                match cursor {
                    Value::Object(map) => {
                        map.insert(*terminal, token);
                    }
                    Value::Array(list) => {
                        let index = terminal.parse::<usize>().map_err(|_| InvalidUploadPath)?;
                        let slot = list.get_mut(index).ok_or(InvalidUploadPath)?;
                        *slot = token;
                    }
                    _ => return Err(InvalidUploadPath),
                }
            }
        }

        self.uploads.push(payload);
        Ok(())
    }

    /// Resolves a variable value back to the uploaded file it stands for,
    /// if it is an upload placeholder token of this request.
    pub fn upload(&self, value: &Value) -> Option<&FilePayload> {
        let index = value
            .as_str()?
            .strip_prefix(UPLOAD_TOKEN_PREFIX)?
            .parse::<usize>()
            .ok()?;
        self.uploads.get(index)
    }
}

/// A single GraphQL request or an ordered batch of them.
///
/// The response envelope must mirror this shape exactly: a bare object for
/// [`RequestBatch::Single`], an array of the same length and order for
/// [`RequestBatch::Batch`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RequestBatch {
    /// A bare operation object.
    Single(Request),
    /// An ordered sequence of operations.
    Batch(Vec<Request>),
}
