//! Camera model primitives shared by the projector, the stitcher and the CLI.
//!
//! This module defines the [`Resolution`] and [`Aperture`] value types, the
//! crate-wide [`FisheyeError`] and the [`CameraModel`] trait. The only lens
//! model shipped is the equidistant fisheye in [`equidistant`].

use log::warn;
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::fmt;

pub mod equidistant;

pub use equidistant::EquidistantModel;

/// Image size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Resolution { width, height }
    }

    /// Resolution of an existing image buffer.
    pub fn of<I: image::GenericImageView>(image: &I) -> Self {
        let (width, height) = image.dimensions();
        Resolution { width, height }
    }

    /// Number of pixels covered by this resolution.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Total field of view of a fisheye lens, stored in radians.
///
/// A value is only ever constructed inside `(0, 2π]`. Exactly `2π` is accepted
/// but logged, since the equidistant radius mapping degenerates there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Aperture(f64);

impl Aperture {
    pub const DEFAULT_DEGREES: f64 = 210.0;

    pub fn from_radians(radians: f64) -> Result<Self, FisheyeError> {
        validation::validate_aperture(radians)?;
        if radians >= TAU {
            warn!(
                "Aperture of {:.1} degrees covers the full sphere, the radius mapping is degenerate",
                radians.to_degrees()
            );
        }
        Ok(Aperture(radians))
    }

    pub fn from_degrees(degrees: f64) -> Result<Self, FisheyeError> {
        Self::from_radians(degrees * PI / 180.0)
    }

    pub fn radians(&self) -> f64 {
        self.0
    }

    pub fn degrees(&self) -> f64 {
        self.0 * 180.0 / PI
    }
}

impl Default for Aperture {
    /// 210 degrees, a common dual-fisheye consumer lens.
    fn default() -> Self {
        Aperture(Self::DEFAULT_DEGREES * PI / 180.0)
    }
}

impl TryFrom<f64> for Aperture {
    type Error = FisheyeError;

    fn try_from(radians: f64) -> Result<Self, Self::Error> {
        Aperture::from_radians(radians)
    }
}

impl From<Aperture> for f64 {
    fn from(aperture: Aperture) -> Self {
        aperture.0
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FisheyeError {
    #[error("Aperture must lie in (0, 2π] radians, got {0}")]
    InvalidAperture(f64),
    #[error("Resolution must be positive, got {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },
    #[error("Source image is empty")]
    EmptyImage,
    #[error("Image dimensions do not match: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: Resolution,
        actual: Resolution,
    },
    #[error("Direction has zero length, point is at camera center")]
    PointAtCameraCenter,
    #[error("Input point is outside the lens coverage")]
    PointIsOutSideImage,
    #[error("Invalid camera parameters: {0}")]
    InvalidParams(String),
    #[error("Failed to load YAML: {0}")]
    YamlError(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for FisheyeError {
    fn from(err: std::io::Error) -> Self {
        FisheyeError::IOError(err.to_string())
    }
}

impl From<yaml_rust::ScanError> for FisheyeError {
    fn from(err: yaml_rust::ScanError) -> Self {
        FisheyeError::YamlError(err.to_string())
    }
}

/// Trait defining the core functionality for fisheye camera models
pub trait CameraModel {
    /// Project a 3D viewing direction to continuous source pixel coordinates.
    ///
    /// The result is not clamped: directions outside the lens coverage land
    /// outside `[0, width) x [0, height)`.
    fn project(&self, direction: &Vector3<f64>) -> Result<Vector2<f64>, FisheyeError>;

    /// Unproject source pixel coordinates to a unit viewing direction
    fn unproject(&self, point_2d: &Vector2<f64>) -> Result<Vector3<f64>, FisheyeError>;

    /// Load camera parameters from a YAML file
    fn load_from_yaml(path: &str) -> Result<Self, FisheyeError>
    where
        Self: Sized;

    /// Save camera parameters to a YAML file
    fn save_to_yaml(&self, path: &str) -> Result<(), FisheyeError>;

    /// Validate camera parameters
    fn validate_params(&self) -> Result<(), FisheyeError>;

    fn get_resolution(&self) -> Resolution;
}

/// Common validation functions for camera parameters
pub mod validation {
    use super::*;

    pub fn validate_resolution(resolution: &Resolution) -> Result<(), FisheyeError> {
        if resolution.width == 0 || resolution.height == 0 {
            return Err(FisheyeError::InvalidResolution {
                width: resolution.width,
                height: resolution.height,
            });
        }
        Ok(())
    }

    pub fn validate_aperture(radians: f64) -> Result<(), FisheyeError> {
        if !radians.is_finite() || radians <= 0.0 || radians > TAU {
            return Err(FisheyeError::InvalidAperture(radians));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_aperture_from_degrees() {
        let aperture = Aperture::from_degrees(210.0).unwrap();
        assert_relative_eq!(aperture.radians(), 210.0 * PI / 180.0, epsilon = 1e-12);
        assert_relative_eq!(aperture.degrees(), 210.0, epsilon = 1e-9);
    }

    #[test]
    fn test_aperture_rejects_out_of_range() {
        for radians in [0.0, -1.0, TAU + 1e-6, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(
                    Aperture::from_radians(radians),
                    Err(FisheyeError::InvalidAperture(_))
                ),
                "aperture {radians} should be rejected"
            );
        }
    }

    #[test]
    fn test_aperture_accepts_full_sphere() {
        let aperture = Aperture::from_radians(TAU).unwrap();
        assert_eq!(aperture.radians(), TAU);
    }

    #[test]
    fn test_aperture_deserialize_validates() {
        let aperture: Aperture = serde_yaml::from_str("3.14").unwrap();
        assert_relative_eq!(aperture.radians(), 3.14);
        assert!(serde_yaml::from_str::<Aperture>("-2.0").is_err());
    }

    #[test]
    fn test_validate_resolution() {
        assert!(validation::validate_resolution(&Resolution::new(2000, 1000)).is_ok());
        assert!(matches!(
            validation::validate_resolution(&Resolution::new(0, 1000)),
            Err(FisheyeError::InvalidResolution {
                width: 0,
                height: 1000
            })
        ));
        assert!(validation::validate_resolution(&Resolution::new(10, 0)).is_err());
    }

    #[test]
    fn test_resolution_of_image() {
        let image = image::RgbImage::new(7, 3);
        let resolution = Resolution::of(&image);
        assert_eq!(resolution, Resolution::new(7, 3));
        assert_eq!(resolution.area(), 21);
        assert_eq!(resolution.to_string(), "7x3");
    }
}
