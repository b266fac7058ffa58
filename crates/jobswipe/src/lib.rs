//! Swipe-based job matching core: job feeds, swipe sessions, application recording,
//! match score refinement and the HTTP surface over them.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

pub use config::AppConfig;
pub use error::AppError;
