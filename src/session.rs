use std::fmt;

use tracing::{debug, info, warn};
use viewer_wire::{
    ApplyFilterRequest, ApplyFilterResponse, FilterParameters, Identifier, JobStatus,
    StartRequest, StartResponse,
};

use crate::config::Configuration;
use crate::error::{ApiError, ViewerError};
use crate::events::{ControlEvent, ViewerEvent};
use crate::filters;
use crate::jobs;
use crate::loader::{ImageLoader, ImageRequest, LoadPlan};
use crate::surface::Surface;
use crate::sync::{StatusSync, SyncAction, SyncPhase};
use crate::viewport::{Viewport, ViewportState};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageReferencePair {
    pub preview: Option<Identifier>,
    pub full: Option<Identifier>,
}

impl ImageReferencePair {
    /// The full render when there is one, else the preview.
    pub fn target(&self) -> Option<&Identifier> {
        self.full.as_ref().or(self.preview.as_ref())
    }
}

/// Network work the session wants done; results come back as [`ViewerEvent`]s.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    FetchImage(ImageRequest),
    Start(StartRequest),
    ApplyFilter(ApplyFilterRequest),
}

/// All viewer state for one session, mutated only through [`Session::handle`]
/// and the controller methods it dispatches to.
pub struct Session<S> {
    viewport: Viewport,
    images: ImageReferencePair,
    loader: ImageLoader,
    sync: StatusSync,
    filter: FilterParameters,
    default_raw_path: String,
    preset_filters: Option<FilterParameters>,
    surface: S,
}

impl<S: Surface> Session<S> {
    pub fn new(cfg: &Configuration, surface: S) -> Self {
        let images = ImageReferencePair {
            preview: cfg.initial.preview.clone().filter(|id| !id.is_empty()),
            full: cfg.initial.full.clone().filter(|id| !id.is_empty()),
        };
        Self {
            viewport: Viewport::new(cfg.viewport),
            sync: StatusSync::new(images.full.clone()),
            images,
            loader: ImageLoader::new(),
            filter: FilterParameters::default(),
            default_raw_path: cfg.default_raw_path.clone(),
            preset_filters: cfg.preset_filters,
            surface,
        }
    }

    /// Draws the initial transform and loads any seeded image.
    pub fn begin(&mut self) -> Option<Request> {
        self.render();
        let seeded = self.images.target().cloned();
        match seeded {
            Some(id) => self.load(Some(&id)),
            None => None,
        }
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport.state()
    }

    pub fn images(&self) -> &ImageReferencePair {
        &self.images
    }

    pub fn displayed(&self) -> Option<&Identifier> {
        self.loader.displayed()
    }

    pub fn sync_phase(&self) -> &SyncPhase {
        self.sync.phase()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn handle(&mut self, event: ViewerEvent) -> Option<Request> {
        match event {
            ViewerEvent::Control(control) => self.on_control(control),
            ViewerEvent::Status(result) => self.on_status(result),
            ViewerEvent::ImageFetched { request, result } => {
                self.on_image_fetched(request, result);
                None
            }
            ViewerEvent::JobStarted(result) => self.on_job_started(result),
            ViewerEvent::FilterApplied(result) => self.on_filter_applied(result),
        }
    }

    /// Points the surface at `identifier`; `None` or blank clears it.
    pub fn load(&mut self, identifier: Option<&Identifier>) -> Option<Request> {
        match self.loader.load(identifier) {
            LoadPlan::Fetch(request) => Some(Request::FetchImage(request)),
            LoadPlan::Clear => {
                self.surface.clear_image();
                None
            }
        }
    }

    pub fn preview_filter(&mut self, params: FilterParameters) {
        self.filter = params;
        self.surface
            .set_filter(&filters::preview_expression(&self.filter));
    }

    pub fn apply_filter(&mut self) -> Result<Request, ViewerError> {
        let request = filters::apply_request(&self.filter, &self.images)?;
        info!(target = %request.image_fname, "applying filter");
        Ok(Request::ApplyFilter(request))
    }

    /// The caller owns the busy indicator until the response arrives.
    pub fn start_job(&mut self, raw_path: &str) -> Request {
        let request = jobs::start_request(raw_path, &self.default_raw_path, self.preset_filters);
        info!(raw_path = %request.raw_path, "starting job");
        self.surface.set_busy(true);
        Request::Start(request)
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            viewport: self.viewport.state(),
            zoom_label: self.viewport.zoom_label(),
            dragging: self.viewport.is_dragging(),
            images: self.images.clone(),
            displayed: self.loader.displayed().cloned(),
            phase: self.sync.phase().clone(),
            filter: self.filter,
        }
    }

    fn on_control(&mut self, control: ControlEvent) -> Option<Request> {
        let changed = match control {
            ControlEvent::ZoomIn => {
                self.viewport.zoom_in();
                true
            }
            ControlEvent::ZoomOut => {
                self.viewport.zoom_out();
                true
            }
            ControlEvent::ResetZoom => {
                self.viewport.reset_zoom();
                true
            }
            ControlEvent::Wheel { delta_y } => {
                self.viewport.on_wheel(delta_y);
                true
            }
            ControlEvent::PointerDown(at) => {
                self.viewport.begin_drag(at);
                false
            }
            ControlEvent::PointerMove(at) => self.viewport.update_drag(at),
            ControlEvent::PointerUp => {
                self.viewport.end_drag();
                false
            }
            ControlEvent::TouchStart(points) => {
                match points.as_slice() {
                    [one] => self.viewport.begin_drag(*one),
                    [a, b] => self.viewport.begin_pinch(*a, *b),
                    _ => debug!(contacts = points.len(), "touch ignored"),
                }
                false
            }
            ControlEvent::TouchMove(points) => match points.as_slice() {
                [one] => self.viewport.update_drag(*one),
                [a, b] => self.viewport.update_pinch(*a, *b),
                _ => false,
            },
            ControlEvent::TouchEnd => {
                self.viewport.end_drag();
                self.viewport.end_pinch();
                false
            }
            ControlEvent::SetFilter { field, value } => {
                let mut params = self.filter;
                field.set(&mut params, value);
                self.preview_filter(params);
                return None;
            }
            ControlEvent::ApplyFilter => {
                return match self.apply_filter() {
                    Ok(request) => Some(request),
                    Err(err) => {
                        self.surface.notify(&err.notice());
                        None
                    }
                };
            }
            ControlEvent::StartJob { raw_path } => return Some(self.start_job(&raw_path)),
            ControlEvent::Load(identifier) => {
                if let Some(id) = identifier.as_ref().filter(|id| !id.is_empty()) {
                    self.images = ImageReferencePair {
                        preview: Some(id.clone()),
                        full: None,
                    };
                }
                return self.load(identifier.as_ref());
            }
            ControlEvent::Report => {
                info!("{}", self.report());
                return None;
            }
        };
        if changed {
            self.render();
        }
        None
    }

    fn on_status(&mut self, result: Result<JobStatus, ApiError>) -> Option<Request> {
        let action = match result {
            Ok(status) => {
                debug!(?status, "status polled");
                let displaying = self.loader.displayed().is_some();
                self.sync.reconcile(&status, &mut self.images, displaying)
            }
            Err(err) => self.sync.poll_failed(&err),
        };
        match action {
            SyncAction::Idle => None,
            SyncAction::ShowFull(id) | SyncAction::ShowPreview(id) => self.load(Some(&id)),
        }
    }

    fn on_image_fetched(&mut self, request: ImageRequest, result: Result<Vec<u8>, ApiError>) {
        if !self.loader.is_current(&request) {
            debug!(identifier = %request.identifier, token = request.token, "discarding superseded image");
            return;
        }
        match result {
            Ok(bytes) => {
                self.surface.show_image(&request.identifier, &bytes);
                self.viewport.reset_translation();
                self.render();
            }
            Err(err) => {
                warn!(identifier = %request.identifier, error = %err, "image failed to load");
            }
        }
    }

    fn on_job_started(&mut self, result: Result<StartResponse, ApiError>) -> Option<Request> {
        self.surface.set_busy(false);
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.report_api_failure("start", err);
                return None;
            }
        };
        match jobs::started_preview(&response) {
            Ok(Some(preview)) => {
                info!(%preview, "job started");
                // the server names renders by input, so a rerun may reuse the old full name
                self.sync.restart();
                self.images = ImageReferencePair {
                    preview: Some(preview.clone()),
                    full: None,
                };
                self.load(Some(&preview))
            }
            Ok(None) => {
                warn!("job started without a preview");
                None
            }
            Err(err) => {
                self.surface.notify(&err.notice());
                None
            }
        }
    }

    fn on_filter_applied(
        &mut self,
        result: Result<ApplyFilterResponse, ApiError>,
    ) -> Option<Request> {
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.report_api_failure("apply_filter", err);
                return None;
            }
        };
        match filters::applied_identifier(&response) {
            Ok(edited) => {
                info!(%edited, "filter applied");
                // later applications build on the edit, not the server full render
                self.images = ImageReferencePair {
                    preview: Some(edited.clone()),
                    full: None,
                };
                self.load(Some(&edited))
            }
            Err(err) => {
                self.surface.notify(&err.notice());
                None
            }
        }
    }

    /// Start and apply are user-triggered, so every failure reaches the user.
    fn report_api_failure(&mut self, endpoint: &'static str, err: ApiError) {
        warn!(endpoint, error = %err, "request failed");
        self.surface.notify(&ViewerError::from(err).notice());
    }

    fn render(&mut self) {
        let label = self.viewport.zoom_label();
        self.surface.set_transform(self.viewport.transform(), &label);
    }
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub viewport: ViewportState,
    pub zoom_label: String,
    pub dragging: bool,
    pub images: ImageReferencePair,
    pub displayed: Option<Identifier>,
    pub phase: SyncPhase,
    pub filter: FilterParameters,
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_dash(id: &Option<Identifier>) -> &str {
            id.as_ref().map_or("-", Identifier::as_str)
        }
        let phase = match &self.phase {
            SyncPhase::Pending => "pending",
            SyncPhase::Ready { .. } => "ready",
        };
        write!(
            f,
            "zoom {} (scale {:.4}) translate ({}, {}){} | preview {} full {} displayed {} | sync {} | {}",
            self.zoom_label,
            self.viewport.scale,
            self.viewport.translate_x,
            self.viewport.translate_y,
            if self.dragging { " dragging" } else { "" },
            or_dash(&self.images.preview),
            or_dash(&self.images.full),
            or_dash(&self.displayed),
            phase,
            filters::preview_expression(&self.filter),
        )
    }
}
