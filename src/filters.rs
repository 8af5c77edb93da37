use viewer_wire::{ApplyFilterRequest, ApplyFilterResponse, FilterParameters, Identifier};

use crate::error::ViewerError;
use crate::session::ImageReferencePair;

/// Filter expression for the instant, client-side approximation.
///
/// Warmth and sharpen have no counterpart here; only the server renders them.
pub fn preview_expression(params: &FilterParameters) -> String {
    format!(
        "brightness({}) contrast({}) saturate({})",
        params.brightness, params.contrast, params.saturation
    )
}

/// Which filter slider a control event adjusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Saturation,
    Warmth,
    Brightness,
    Contrast,
    Sharpen,
}

impl FilterField {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "saturation" | "sat" => Some(Self::Saturation),
            "warmth" => Some(Self::Warmth),
            "brightness" => Some(Self::Brightness),
            "contrast" => Some(Self::Contrast),
            "sharpen" => Some(Self::Sharpen),
            _ => None,
        }
    }

    pub fn set(self, params: &mut FilterParameters, value: f32) {
        match self {
            Self::Saturation => params.saturation = value,
            Self::Warmth => params.warmth = value,
            Self::Brightness => params.brightness = value,
            Self::Contrast => params.contrast = value,
            Self::Sharpen => params.sharpen = value,
        }
    }
}

/// Builds the `/apply_filter` body, targeting the full render when there is one.
pub fn apply_request(
    params: &FilterParameters,
    images: &ImageReferencePair,
) -> Result<ApplyFilterRequest, ViewerError> {
    let target = images.target().ok_or(ViewerError::NoImage)?;
    Ok(ApplyFilterRequest {
        filter: *params,
        image_fname: target.clone(),
    })
}

/// The edited identifier, or the payload verbatim when the server gave none.
pub fn applied_identifier(response: &ApplyFilterResponse) -> Result<Identifier, ViewerError> {
    response
        .edited()
        .cloned()
        .ok_or_else(|| ViewerError::FilterRejected {
            payload: response.raw_payload(),
        })
}
