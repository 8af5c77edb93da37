use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use filter::FilterParameters;

/// Opaque server-assigned name of a cached image (raw, preview, full or edited).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// `None` for blank names; the server reports "no image" as null or "".
    pub fn non_empty(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

mod filter {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct FilterParameters {
        pub saturation: f32,
        pub warmth: f32,
        pub brightness: f32,
        pub contrast: f32,
        pub sharpen: f32,
    }

    impl Default for FilterParameters {
        fn default() -> Self {
            Self {
                saturation: 1.0,
                warmth: 1.0,
                brightness: 1.0,
                contrast: 1.0,
                sharpen: 0.0,
            }
        }
    }
}

/// `GET /status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobStatus {
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full: Option<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatus {
    pub fn preview(&self) -> Option<&Identifier> {
        self.preview.as_ref().filter(|id| !id.is_empty())
    }

    pub fn full(&self) -> Option<&Identifier> {
        self.full.as_ref().filter(|id| !id.is_empty())
    }
}

/// `POST /start`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRequest {
    pub raw_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_filters: Option<FilterParameters>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_fname: Option<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl StartResponse {
    pub fn preview(&self) -> Option<&Identifier> {
        self.preview_fname.as_ref().filter(|id| !id.is_empty())
    }
}

/// `POST /apply_filter`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyFilterRequest {
    pub filter: FilterParameters,
    pub image_fname: Identifier,
}

/// Anything besides `edited` is kept verbatim so failures can be shown as sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyFilterResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited: Option<Identifier>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ApplyFilterResponse {
    pub fn edited(&self) -> Option<&Identifier> {
        self.edited.as_ref().filter(|id| !id.is_empty())
    }

    /// The payload as JSON text, for surfacing a failed application.
    pub fn raw_payload(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self.other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_treats_blank_names_as_missing() {
        let status: JobStatus =
            serde_json::from_str(r#"{"done": false, "preview": "", "full": null}"#).unwrap();
        assert!(!status.done);
        assert!(status.preview().is_none());
        assert!(status.full().is_none());
    }

    #[test]
    fn status_tolerates_missing_fields() {
        let status: JobStatus = serde_json::from_str(r#"{"preview": "p1"}"#).unwrap();
        assert!(!status.done);
        assert_eq!(status.preview(), Some(&Identifier::from("p1")));
    }

    #[test]
    fn start_request_omits_absent_presets() {
        let body = serde_json::to_value(StartRequest {
            raw_path: "data/raw/a.ARW".into(),
            preset_filters: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"raw_path": "data/raw/a.ARW"}));
    }

    #[test]
    fn apply_request_shape_matches_server() {
        let body = serde_json::to_value(ApplyFilterRequest {
            filter: FilterParameters {
                saturation: 1.5,
                ..FilterParameters::default()
            },
            image_fname: Identifier::from("full_abc.jpg"),
        })
        .unwrap();
        assert_eq!(body["image_fname"], "full_abc.jpg");
        assert_eq!(body["filter"]["saturation"], 1.5);
        assert_eq!(body["filter"]["warmth"], 1.0);
        assert_eq!(body["filter"]["sharpen"], 0.0);
    }

    #[test]
    fn apply_response_keeps_failure_payload() {
        let resp: ApplyFilterResponse =
            serde_json::from_str(r#"{"error": "image not found"}"#).unwrap();
        assert!(resp.edited().is_none());
        assert_eq!(resp.raw_payload(), r#"{"error":"image not found"}"#);
    }

    #[test]
    fn missing_filter_fields_fall_back_to_identity() {
        let params: FilterParameters = serde_json::from_str(r#"{"contrast": 1.1}"#).unwrap();
        assert!((params.contrast - 1.1).abs() < f32::EPSILON);
        assert!((params.saturation - 1.0).abs() < f32::EPSILON);
        assert!((params.sharpen - 0.0).abs() < f32::EPSILON);
    }
}
