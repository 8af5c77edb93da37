use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use reqwest::Url;
use serde::Deserialize;
use viewer_wire::{FilterParameters, Identifier};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000/";
pub const DEFAULT_RAW_PATH: &str = "data/raw/RAW_SONY_ILCE-7RM2.ARW";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Base URL of the processing server.
    pub server: String,
    /// Delay between the end of one status poll and the start of the next.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Upper bound for any single request to the server.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Raw file submitted when a start request names no path.
    pub default_raw_path: String,
    /// Filters the server bakes into previews and full renders of a new job.
    pub preset_filters: Option<FilterParameters>,
    /// Where the headless surface writes the bytes of the displayed image.
    pub snapshot_path: Option<PathBuf>,
    /// Identifiers known before the first poll.
    pub initial: InitialImages,
    pub viewport: ViewportOptions,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_yaml::from_str(&s)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.poll_interval.is_zero(),
            "poll-interval must be greater than zero"
        );
        ensure!(
            !self.request_timeout.is_zero(),
            "request-timeout must be greater than zero"
        );
        self.server_url().context("invalid server")?;
        self.viewport
            .validate()
            .context("invalid viewport configuration")?;
        Ok(self)
    }

    /// The server base URL, always ending in `/` so endpoint joins stay under it.
    pub fn server_url(&self) -> Result<Url> {
        let mut raw = self.server.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw).with_context(|| format!("cannot parse {raw:?} as a URL"))?;
        ensure!(
            matches!(url.scheme(), "http" | "https"),
            "server must use http or https, got {}",
            url.scheme()
        );
        Ok(url)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            poll_interval: Duration::from_millis(2000),
            request_timeout: Duration::from_secs(30),
            default_raw_path: DEFAULT_RAW_PATH.to_string(),
            preset_filters: None,
            snapshot_path: None,
            initial: InitialImages::default(),
            viewport: ViewportOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct InitialImages {
    pub preview: Option<Identifier>,
    pub full: Option<Identifier>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ViewportOptions {
    /// Scale at startup and after a zoom reset.
    pub initial_scale: f64,
    /// Multiplier applied per zoom step (buttons and wheel notches).
    pub zoom_step: f64,
    /// Lower bound for wheel and pinch zoom.
    pub min_scale: f64,
    /// Upper bound for wheel and pinch zoom.
    pub max_scale: f64,
}

impl ViewportOptions {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.initial_scale.is_finite() && self.initial_scale > 0.0,
            "viewport.initial-scale must be positive"
        );
        ensure!(
            self.zoom_step.is_finite() && self.zoom_step > 1.0,
            "viewport.zoom-step must be greater than 1"
        );
        ensure!(
            self.min_scale.is_finite() && self.min_scale > 0.0,
            "viewport.min-scale must be positive"
        );
        ensure!(
            self.max_scale.is_finite() && self.max_scale >= self.min_scale,
            "viewport.max-scale must not be below viewport.min-scale"
        );
        Ok(())
    }
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            initial_scale: 0.08,
            zoom_step: 1.1,
            min_scale: 0.2,
            max_scale: 8.0,
        }
    }
}
