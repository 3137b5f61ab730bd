//! Multipart file-upload request decoding.
//!
//! Implements the [GraphQL multipart request convention]: a
//! `multipart/form-data` body whose first field is `operations` (the JSON
//! operation payload with `null` placeholders for upload variables), second
//! field is `map` (JSON object of file key to dotted variable paths), and
//! remaining fields are the files themselves keyed by those map keys.
//!
//! [GraphQL multipart request convention]: https://github.com/jaydenseric/graphql-multipart-request-spec

mod error;
mod map_field;

use axum::body::Body;
use bytes::Bytes;
use indexmap::IndexMap;

pub(crate) use self::error::FileUploadError;
use self::map_field::MapFieldRaw;
use crate::graphql::RequestBatch;

/// An uploaded file, as received from the multipart form.
///
/// The payload is opaque to this crate: it is buffered, spliced into the
/// operation's variables and handed to the executor, never inspected.
/// Cloning is cheap; the content bytes are shared. Payloads are scoped to
/// the request that carried them and must not be retained past its
/// response.
#[derive(Clone, Debug, PartialEq)]
pub struct FilePayload {
    /// The filename sent in the form field, if any.
    pub filename: Option<String>,
    /// The content type sent in the form field, if any.
    pub content_type: Option<String>,
    /// The file content.
    pub data: Bytes,
}

/// Limits applied while reading a multipart upload request.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    /// Maximum number of uploaded files in a single request.
    pub max_files: usize,
    /// Maximum size of a single uploaded file, in bytes.
    pub max_file_size: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_files: 5,
            max_file_size: 5_242_880, // 5mb
        }
    }
}

/// Reads a multipart request body and produces the operation batch with all
/// mapped files already spliced into its variables.
///
/// Field order follows the multipart convention: `operations` first, `map`
/// second, files after.
pub(crate) async fn parse_multipart(
    body: Body,
    boundary: String,
    limits: &UploadLimits,
) -> Result<RequestBatch, FileUploadError> {
    let mut multipart = multer::Multipart::new(body.into_data_stream(), boundary);

    let operations = multipart
        .next_field()
        .await?
        .filter(|field| field.name() == Some("operations"))
        .ok_or(FileUploadError::MissingOperationsField)?;
    let mut batch: RequestBatch = serde_json::from_slice(&operations.bytes().await?)
        .map_err(FileUploadError::InvalidJsonInOperationsField)?;

    let map = multipart
        .next_field()
        .await?
        .filter(|field| field.name() == Some("map"))
        .ok_or(FileUploadError::MissingMapField)?;
    let map: MapFieldRaw = serde_json::from_slice(&map.bytes().await?)
        .map_err(FileUploadError::InvalidJsonInMapField)?;

    let mut files: IndexMap<String, FilePayload> = IndexMap::new();
    while let Some(field) = multipart.next_field().await? {
        if files.len() == limits.max_files {
            return Err(FileUploadError::MaxFilesLimitExceeded(limits.max_files));
        }
        let key = field.name().unwrap_or_default().to_owned();
        let filename = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(|mime| mime.to_string());
        let data = field.bytes().await?;
        if data.len() > limits.max_file_size {
            return Err(FileUploadError::MaxFileSizeLimitExceeded {
                limit: limits.max_file_size,
                filename: filename.unwrap_or(key),
            });
        }
        files.insert(
            key,
            FilePayload {
                filename,
                content_type,
                data,
            },
        );
    }

    map_field::map_to_requests(&mut batch, map, &files)?;
    Ok(batch)
}
