pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod filters;
pub mod jobs;
pub mod loader;
pub mod session;
pub mod surface;
pub mod sync;
pub mod viewport;
pub mod tasks {
    pub mod input;
    pub mod session;
    pub mod sync;
}
