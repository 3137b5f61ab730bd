//! HTTP status classification of execution errors.
//!
//! A non-empty error list means the operation failed in a way the client
//! can act on (syntax, validation, resolver-declared): 400. An error whose
//! original fault is not itself a GraphQL-level error is an internal fault
//! escaped from resolver code: 500, with the client-facing message redacted
//! and the full detail logged server-side.

use http::StatusCode;

use crate::graphql::Error;

/// The redacted client-facing message for unexpected resolver faults.
pub(crate) const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal Server Error";

/// The extensions key under which the fault trace is exposed when the mount
/// opts into `include_traceback`.
pub(crate) const TRACEBACK_EXTENSION_KEY: &str = "traceback";

/// Classifies the errors of one execution result into its HTTP status
/// contribution, redacting unexpected errors in place.
///
/// 500 dominates 400 across the errors of one operation.
pub(crate) fn classify(errors: &mut [Error], include_traceback: bool) -> StatusCode {
    let mut status = StatusCode::BAD_REQUEST;

    for error in errors.iter_mut() {
        let Some(fault) = error.source.clone() else {
            continue;
        };
        if fault.downcast_ref::<Error>().is_some() {
            // A resolver-declared GraphQL-level error passes through.
            continue;
        }

        status = StatusCode::INTERNAL_SERVER_ERROR;

        let trace = format_fault(&*fault);
        match &error.path {
            Some(path) => {
                tracing::error!(path = %path, fault = %trace, "exception on GraphQL field")
            }
            None => tracing::error!(fault = %trace, "exception on GraphQL operation"),
        }

        if include_traceback {
            error
                .extensions
                .insert(TRACEBACK_EXTENSION_KEY, trace.into());
        }
        error.message = INTERNAL_SERVER_ERROR_MESSAGE.to_owned();
    }

    status
}

/// Formats a fault and its chain of causes, one per line.
fn format_fault(fault: &(dyn std::error::Error + 'static)) -> String {
    let mut lines = vec![fault.to_string()];
    let mut source = fault.source();
    while let Some(cause) = source {
        lines.push(format!("caused by: {cause}"));
        source = cause.source();
    }
    lines.join("\n")
}
