use viewer_wire::{ApplyFilterResponse, Identifier, JobStatus, StartResponse};

use crate::error::ApiError;
use crate::filters::FilterField;
use crate::loader::ImageRequest;
use crate::viewport::Point;

/// User input, already mapped from whatever produced it (buttons, pointer, touch, stdin).
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    ZoomIn,
    ZoomOut,
    ResetZoom,
    Wheel { delta_y: f64 },
    PointerDown(Point),
    PointerMove(Point),
    PointerUp,
    /// One contact drags, two contacts pinch; other counts are ignored.
    TouchStart(Vec<Point>),
    TouchMove(Vec<Point>),
    TouchEnd,
    SetFilter { field: FilterField, value: f32 },
    ApplyFilter,
    StartJob { raw_path: String },
    Load(Option<Identifier>),
    Report,
}

/// Everything the session reacts to, in arrival order.
#[derive(Debug)]
pub enum ViewerEvent {
    Control(ControlEvent),
    Status(Result<JobStatus, ApiError>),
    ImageFetched {
        request: ImageRequest,
        result: Result<Vec<u8>, ApiError>,
    },
    JobStarted(Result<StartResponse, ApiError>),
    FilterApplied(Result<ApplyFilterResponse, ApiError>),
}

impl From<ControlEvent> for ViewerEvent {
    fn from(event: ControlEvent) -> Self {
        ViewerEvent::Control(event)
    }
}
