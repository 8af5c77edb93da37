//! The display side of the viewer.
//!
//! The session drives a [`Surface`] and never touches a UI toolkit directly.
//! [`ConsoleSurface`] is the headless rendition used by the binary and
//! [`Recorder`] captures calls for inspection.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};
use viewer_wire::Identifier;

use crate::viewport::Transform;

pub trait Surface: Send + 'static {
    fn set_transform(&mut self, transform: Transform, zoom_label: &str);
    fn show_image(&mut self, identifier: &Identifier, bytes: &[u8]);
    fn clear_image(&mut self);
    fn set_filter(&mut self, expression: &str);
    fn set_busy(&mut self, busy: bool);
    /// Blocking, user-facing message.
    fn notify(&mut self, message: &str);
}

/// Logs every change and writes the displayed image to `snapshot_path`.
pub struct ConsoleSurface {
    snapshot_path: Option<PathBuf>,
}

impl ConsoleSurface {
    pub fn new(snapshot_path: Option<PathBuf>) -> Self {
        Self { snapshot_path }
    }
}

impl Surface for ConsoleSurface {
    fn set_transform(&mut self, transform: Transform, zoom_label: &str) {
        debug!(%transform, zoom = zoom_label, "transform updated");
    }

    fn show_image(&mut self, identifier: &Identifier, bytes: &[u8]) {
        info!(%identifier, bytes = bytes.len(), "displaying image");
        if let Some(path) = &self.snapshot_path {
            if let Err(err) = std::fs::write(path, bytes) {
                warn!(path = %path.display(), error = %err, "failed to write snapshot");
            }
        }
    }

    fn clear_image(&mut self) {
        info!("display cleared");
    }

    fn set_filter(&mut self, expression: &str) {
        debug!(filter = expression, "filter preview updated");
    }

    fn set_busy(&mut self, busy: bool) {
        if busy {
            info!("working…");
        }
    }

    fn notify(&mut self, message: &str) {
        println!("! {message}");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Transform { transform: Transform, label: String },
    Image { identifier: Identifier, bytes: Vec<u8> },
    Clear,
    Filter(String),
    Busy(bool),
    Notice(String),
}

/// Shared log of surface calls; clones observe the same log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.lock().clone()
    }

    pub fn last_transform(&self) -> Option<Transform> {
        self.lock().iter().rev().find_map(|call| match call {
            SurfaceCall::Transform { transform, .. } => Some(*transform),
            _ => None,
        })
    }

    pub fn shown(&self) -> Vec<Identifier> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Image { identifier, .. } => Some(identifier.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Notice(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: SurfaceCall) {
        self.lock().push(call);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SurfaceCall>> {
        // a panic while holding the lock leaves the log usable
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Surface for Recorder {
    fn set_transform(&mut self, transform: Transform, zoom_label: &str) {
        self.push(SurfaceCall::Transform {
            transform,
            label: zoom_label.to_string(),
        });
    }

    fn show_image(&mut self, identifier: &Identifier, bytes: &[u8]) {
        self.push(SurfaceCall::Image {
            identifier: identifier.clone(),
            bytes: bytes.to_vec(),
        });
    }

    fn clear_image(&mut self) {
        self.push(SurfaceCall::Clear);
    }

    fn set_filter(&mut self, expression: &str) {
        self.push(SurfaceCall::Filter(expression.to_string()));
    }

    fn set_busy(&mut self, busy: bool) {
        self.push(SurfaceCall::Busy(busy));
    }

    fn notify(&mut self, message: &str) {
        self.push(SurfaceCall::Notice(message.to_string()));
    }
}
