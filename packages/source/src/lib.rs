#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Point-of-interest source backed by the `OpenStreetMap` Overpass API.
//!
//! [`overpass::OverpassClient`] fetches every shop and marketplace within a
//! radius of a center point and converts the response into
//! [`RawRecord`](retail_radar_store_models::RawRecord)s ready for the
//! classifier.

pub mod overpass;
pub mod retry;

pub use overpass::{DEFAULT_RADIUS_METERS, OverpassClient, build_query, parse_elements};

/// Errors that can occur while fetching points of interest.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected shape.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of what went wrong.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("Unexpected HTTP status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },
}
