//! # FarmSight Common Library
//!
//! Shared code for the FarmSight services including:
//! - Common error types
//! - Timestamp and ISO-week helpers
//! - GeoJSON polygon geometry helpers
//! - Vegetation index (NDVI) computation and trend analysis

pub mod error;
pub mod geometry;
pub mod ndvi;
pub mod time;

pub use error::{Error, Result};
pub use ndvi::NdviProvider;
