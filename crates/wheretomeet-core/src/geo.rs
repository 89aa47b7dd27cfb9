//! Coordinates, locations, and midpoint calculation.
//!
//! This module provides the geographic value types shared across the
//! workspace:
//! - [`Coordinates`]: a validated latitude/longitude pair
//! - [`Location`]: a user-supplied location, raw text or a resolved point
//! - [`midpoint`]: the arithmetic midpoint of two coordinate pairs

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when validating a coordinate pair.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// Latitude or longitude is NaN or infinite.
    #[error("coordinate is not a finite number")]
    NotFinite,

    /// Latitude outside −90..=90.
    #[error("latitude out of range: {0}")]
    LatitudeOutOfRange(f64),

    /// Longitude outside −180..=180.
    #[error("longitude out of range: {0}")]
    LongitudeOutOfRange(f64),
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees, −90..=90.
    pub lat: f64,
    /// Longitude in degrees, −180..=180.
    pub lng: f64,
}

impl Coordinates {
    /// Creates a coordinate pair without validating it.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Creates a coordinate pair, rejecting non-finite or out-of-range values.
    pub fn validated(lat: f64, lng: f64) -> Result<Self, GeoError> {
        let coords = Self::new(lat, lng);
        coords.validate()?;
        Ok(coords)
    }

    /// Checks that both components are finite and within valid ranges.
    pub fn validate(&self) -> Result<(), GeoError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(GeoError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(GeoError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(GeoError::LongitudeOutOfRange(self.lng));
        }
        Ok(())
    }

    /// Returns true if the pair passes [`Coordinates::validate`].
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Returns the arithmetic midpoint of two coordinate pairs.
///
/// This is a plain component-wise average. It is inaccurate near the poles
/// and across the antimeridian; callers accept that as the search anchor
/// for venue queries.
pub fn midpoint(a: Coordinates, b: Coordinates) -> Coordinates {
    Coordinates::new((a.lat + b.lat) / 2.0, (a.lng + b.lng) / 2.0)
}

/// A user-supplied location.
///
/// Locations arrive in two shapes: raw text such as `"37.5,-122.3"`, or a
/// resolved point from a map widget carrying coordinates and an optional
/// display name. [`Location::resolve`] collapses both into a coordinate
/// pair, or `None` when the text does not parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    /// A resolved point with coordinates and an optional human-readable name.
    ResolvedPoint {
        /// Human-readable name, e.g. a street address.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
        /// The coordinate pair.
        coordinates: Coordinates,
    },
    /// Raw text in `"lat,lng"` form, parsed on resolution.
    RawText(String),
}

impl Location {
    /// Creates a raw text location.
    pub fn raw(text: impl Into<String>) -> Self {
        Self::RawText(text.into())
    }

    /// Creates a resolved point without a display name.
    pub fn point(coordinates: Coordinates) -> Self {
        Self::ResolvedPoint {
            display_name: None,
            coordinates,
        }
    }

    /// Creates a resolved point with a display name.
    pub fn named_point(display_name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self::ResolvedPoint {
            display_name: Some(display_name.into()),
            coordinates,
        }
    }

    /// Returns the coordinate pair, parsing raw text if necessary.
    ///
    /// Raw text resolves only when it splits on a comma into exactly two
    /// parseable floating-point halves. No range validation happens here;
    /// consumers call [`Coordinates::validate`] before using the result.
    pub fn resolve(&self) -> Option<Coordinates> {
        match self {
            Self::ResolvedPoint { coordinates, .. } => Some(*coordinates),
            Self::RawText(text) => {
                let (lat, lng) = text.split_once(',')?;
                let lat = lat.trim().parse::<f64>().ok()?;
                let lng = lng.trim().parse::<f64>().ok()?;
                Some(Coordinates::new(lat, lng))
            }
        }
    }

    /// Returns the display name, if this is a named resolved point.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::ResolvedPoint { display_name, .. } => display_name.as_deref(),
            Self::RawText(_) => None,
        }
    }
}
