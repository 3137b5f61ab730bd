use thiserror::Error;

/// Errors raised while decoding a multipart upload request. All of them are
/// caller errors and answered with HTTP 400.
#[derive(Debug, Error)]
pub(crate) enum FileUploadError {
    #[error("invalid multipart request: {0}")]
    InvalidMultipartRequest(#[from] multer::Error),

    #[error("Missing multipart field 'operations', it should be the first field in the request body.")]
    MissingOperationsField,

    #[error("Missing multipart field 'map', it should be the second field in the request body.")]
    MissingMapField,

    #[error("Invalid JSON in the 'operations' multipart field: {0}")]
    InvalidJsonInOperationsField(serde_json::Error),

    #[error("Invalid JSON in the 'map' multipart field: {0}")]
    InvalidJsonInMapField(serde_json::Error),

    #[error("Invalid path '{0}' found inside the 'map' field, it does not address an operation in the batch.")]
    InvalidOperationIndex(String),

    #[error("Invalid path '{0}' found inside the 'map' field, it should continue with 'variables.'.")]
    InvalidPathInsideMapField(String),

    #[error("Invalid path '{0}' found inside the 'map' field, missing name of variable.")]
    MissingVariableNameInsideMapField(String),

    #[error("Invalid path '{0}' found inside the 'map' field, it does not point to a valid value inside the 'operations' field.")]
    InputValueNotFound(String),

    #[error("Missing file in the request: '{0}' is referenced by the 'map' field but was not uploaded.")]
    MissingFile(String),

    #[error("Exceeded the limit of {0} file uploads in a single request.")]
    MaxFilesLimitExceeded(usize),

    #[error("Exceeded the limit of {limit} bytes on the '{filename}' file.")]
    MaxFileSizeLimitExceeded { limit: usize, filename: String },
}
