pub mod config;
pub mod relay;
pub mod service;

pub use config::{Config, FailureMode};
