// service/src/lib.rs

//! Print-order fulfillment for finalized storybooks.
//!
//! Orders move through a fixed lifecycle (see [`lifecycle`]). Admin actions
//! live in [`actions`]; submission and webhook ingestion run as storyflow
//! pipelines registered in [`pipelines`]. The HTTP surface in [`web`] is a
//! thin layer over both.

pub mod actions;
pub mod config;
pub mod errors;
pub mod lifecycle;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod validation;
pub mod vendor;
pub mod web;

pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use state::AppState;
