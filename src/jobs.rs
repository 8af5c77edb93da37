use tracing::info;
use viewer_wire::{FilterParameters, Identifier, StartRequest, StartResponse};

use crate::error::ViewerError;

pub fn start_request(
    raw_path: &str,
    default_raw_path: &str,
    preset_filters: Option<FilterParameters>,
) -> StartRequest {
    let raw_path = match raw_path.trim() {
        "" => default_raw_path,
        path => path,
    };
    StartRequest {
        raw_path: raw_path.to_string(),
        preset_filters,
    }
}

/// `Ok(None)` when the server accepted the job but named no preview yet.
pub fn started_preview(response: &StartResponse) -> Result<Option<Identifier>, ViewerError> {
    if let Some(message) = &response.error {
        return Err(ViewerError::JobRejected {
            message: message.clone(),
            path: response.path.clone(),
        });
    }
    if let Some(status) = &response.status {
        info!(status, "server accepted job");
    }
    Ok(response.preview().cloned())
}
