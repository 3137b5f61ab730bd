use indexmap::IndexMap;

use super::error::FileUploadError;
use super::FilePayload;
use crate::graphql::RequestBatch;

/// The decoded `map` multipart field: multipart file key to the dotted
/// paths of the variable slots that file replaces, in field order.
pub(crate) type MapFieldRaw = IndexMap<String, Vec<String>>;

/// Applies the file map to the parsed operations, splicing each uploaded
/// file into the variable slot(s) its paths address. Mutates the batch in
/// place.
///
/// Target slots are disjoint in a well-formed map; overlapping paths are
/// not detected and the last write wins.
pub(crate) fn map_to_requests(
    batch: &mut RequestBatch,
    map: MapFieldRaw,
    files: &IndexMap<String, FilePayload>,
) -> Result<(), FileUploadError> {
    for (file_key, paths) in map {
        let payload = files
            .get(&file_key)
            .ok_or_else(|| FileUploadError::MissingFile(file_key.clone()))?;
        for path in paths {
            splice(batch, &path, payload.clone())?;
        }
    }
    Ok(())
}

/// Walks one dotted path down to its variable slot and writes the payload
/// there.
///
/// The cursor's shape at each step decides how a segment is read: when the
/// batch is a sequence the first segment is a non-negative operation index,
/// and inside an operation the next segment must be `variables`. Below
/// that, the walk is shape-directed again, through JSON objects by field
/// name and JSON arrays by index (see [`Request::set_upload`]).
///
/// [`Request::set_upload`]: crate::graphql::Request::set_upload
fn splice(
    batch: &mut RequestBatch,
    path: &str,
    payload: FilePayload,
) -> Result<(), FileUploadError> {
    let mut segments = path.split('.');

    let request = match batch {
        RequestBatch::Single(request) => request,
        RequestBatch::Batch(requests) => {
            let index = segments
                .next()
                .and_then(|segment| segment.parse::<usize>().ok())
                .ok_or_else(|| FileUploadError::InvalidOperationIndex(path.to_owned()))?;
            requests
                .get_mut(index)
                .ok_or_else(|| FileUploadError::InvalidOperationIndex(path.to_owned()))?
        }
    };

    if segments.next() != Some("variables") {
        return Err(FileUploadError::InvalidPathInsideMapField(path.to_owned()));
    }

    let variable_path: Vec<&str> = segments.collect();
    if variable_path.is_empty() {
        return Err(FileUploadError::MissingVariableNameInsideMapField(
            path.to_owned(),
        ));
    }

    request
        .set_upload(&variable_path, payload)
        .map_err(|_| FileUploadError::InputValueNotFound(path.to_owned()))
}
