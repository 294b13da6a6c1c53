//! Client library modules.

pub mod app;
pub mod config;
pub mod domain;
pub mod outbound;

/// Application context wiring identity resolution to the data layer.
pub use app::App;
/// Client configuration assembled at startup.
pub use config::Config;
