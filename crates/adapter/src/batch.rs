use crate::error::Unprocessable;
use crate::transport::SaveResult;

/// Splits batch outcomes into the saved records, or the first failure when
/// no record was saved.
///
/// Only one error is reported for a failed batch; the others are logged.
pub(crate) fn settle(object: &str, results: Vec<SaveResult>) -> Result<Vec<SaveResult>, Unprocessable> {
    let total = results.len();
    let (saved, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(|result| result.success);

    for result in &failed {
        for error in &result.errors {
            tracing::warn!(
                object,
                status_code = error.status_code.as_deref(),
                error_code = error.error_code.as_deref(),
                message = %error.message,
                "record not saved"
            );
        }
    }

    if total > 0 && saved.is_empty() {
        let first = failed.first().and_then(|result| result.errors.first());
        return Err(first.map_or_else(
            || Unprocessable {
                title: "UNKNOWN_ERROR".to_string(),
                message: format!("no {object} record was saved"),
                status: http::StatusCode::UNPROCESSABLE_ENTITY.as_u16(),
                source: None,
            },
            Unprocessable::from,
        ));
    }

    tracing::debug!(object, saved = saved.len(), failed = failed.len(), "batch settled");
    Ok(saved)
}
