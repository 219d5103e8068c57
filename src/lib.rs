#![forbid(unsafe_code)]

//! Scheduled alert generation and CEO inbox triage.
//!
//! Periodic jobs scan external alert sources and route each candidate
//! through a single dispatcher into a persistent, status-tracked inbox
//! that operators triage over HTTP.

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod http;
pub mod models;
pub mod notify;
pub mod persistence;
pub mod scheduler;
pub mod sources;
pub mod workflow;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
