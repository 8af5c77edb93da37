use chrono::Utc;
use tracing::debug;
use viewer_wire::Identifier;

/// One `/image` fetch: the identifier plus the cache-busting token sent as `t`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub identifier: Identifier,
    pub token: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPlan {
    Fetch(ImageRequest),
    Clear,
}

/// Tracks which image the surface is supposed to show.
///
/// The most recent `load` owns the surface: a fetch that completes after a
/// newer `load` was issued is dropped, like an image element whose source was
/// replaced mid-download.
#[derive(Debug, Default)]
pub struct ImageLoader {
    current: Option<ImageRequest>,
    last_token: u64,
}

impl ImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier most recently handed to [`ImageLoader::load`], loaded or not.
    pub fn displayed(&self) -> Option<&Identifier> {
        self.current.as_ref().map(|req| &req.identifier)
    }

    pub fn load(&mut self, identifier: Option<&Identifier>) -> LoadPlan {
        match identifier.filter(|id| !id.is_empty()) {
            None => {
                debug!("clearing displayed image");
                self.current = None;
                LoadPlan::Clear
            }
            Some(id) => {
                let request = ImageRequest {
                    identifier: id.clone(),
                    token: self.next_token(),
                };
                debug!(identifier = %request.identifier, token = request.token, "image load requested");
                self.current = Some(request.clone());
                LoadPlan::Fetch(request)
            }
        }
    }

    /// Whether a finished fetch is still the one the surface should show.
    pub fn is_current(&self, request: &ImageRequest) -> bool {
        self.current.as_ref() == Some(request)
    }

    fn next_token(&mut self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        self.last_token = now.max(self.last_token + 1);
        self.last_token
    }
}
