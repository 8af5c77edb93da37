use thiserror::Error;

/// Failures talking to the processing server.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, timeout, or body transfer failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status whose body was not the expected JSON.
    #[error("server returned {status}: {body}")]
    Http { status: u16, body: String },

    /// Success status but the JSON did not match the expected shape.
    #[error("malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures shown to the user as a notification.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Filter application requested before any image was loaded.
    #[error("No image loaded to apply filters to.")]
    NoImage,

    /// The server answered `/start` with an `error` field.
    #[error("{message}")]
    JobRejected {
        message: String,
        path: Option<String>,
    },

    /// The server answered `/apply_filter` without an edited image.
    #[error("Filter failed: {payload}")]
    FilterRejected { payload: String },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ViewerError {
    /// Text for the user-facing notification.
    pub fn notice(&self) -> String {
        match self {
            ViewerError::JobRejected {
                message,
                path: Some(path),
            } => format!("{message}: {path}"),
            other => other.to_string(),
        }
    }
}
