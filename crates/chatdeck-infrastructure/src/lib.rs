//! Infrastructure layer for chatdeck.
//!
//! Adapters that touch the outside world: the HTTP client for the session
//! store, the on-disk configuration, and platform paths.

pub mod config_service;
pub mod http_gateway;
pub mod paths;

pub use config_service::ConfigService;
pub use http_gateway::HttpSessionGateway;
pub use paths::{ChatdeckPaths, PathError};
