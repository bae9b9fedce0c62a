//! Library crate for the `codemetal-sensorlens` backend service.
//!
//! Uploaded sensor CSV files become an immutable [`SensorTable`] per
//! session; the `pipeline` modules compute statistics, profiles, anomalies,
//! comfort shares and filtered exports over it, and `routes` exposes those
//! results as JSON/CSV over HTTP for a browser front end.
//!
//! This crate follows the Explicit Module Boundary Pattern (EMBP): each
//! module is reached through its gateway and the shared types are
//! re-exported here, so siblings import from `crate::` rather than from
//! each other's internals.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod schema;
pub mod session;

pub use config::Config;
pub use error::PipelineError;
pub use models::{Reading, SensorTable, Variable};
pub use session::SessionStore;
