//! Merging two equirectangular projections into one panorama.
//!
//! Both projections are cut at `half = width / 2` (rounded down). Output
//! columns `[0, half)` come from the right eye, output columns `[half, width)`
//! from the left eye. [`StitchMode`] decides which half of the right eye is
//! used.

use crate::camera::{validation, FisheyeError, Resolution};
use image::{imageops, RgbImage};
use std::fmt;
use std::str::FromStr;

/// Column layout used when merging the two projections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StitchMode {
    /// Both output halves come from the *second* half of their input: the
    /// left output half is `right[half, 2 * half)`, the right output half is
    /// `left[half, width)`.
    ///
    /// The asymmetric slicing looks like a copy-paste slip, but with the
    /// equidistant model the lens axis lands at column `3 * width / 4`, so
    /// the second half is where each eye's own view is centered. For odd
    /// widths the last column of the right eye is dropped.
    #[default]
    Legacy,
    /// Each output half comes from the same half of its input: the left
    /// output half is `right[0, half)`, the right output half is
    /// `left[half, width)`.
    Symmetric,
}

impl fmt::Display for StitchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StitchMode::Legacy => write!(f, "legacy"),
            StitchMode::Symmetric => write!(f, "symmetric"),
        }
    }
}

impl FromStr for StitchMode {
    type Err = FisheyeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legacy" => Ok(StitchMode::Legacy),
            "symmetric" => Ok(StitchMode::Symmetric),
            other => Err(FisheyeError::InvalidParams(format!(
                "Unsupported stitch mode: {other}. Supported modes: legacy, symmetric"
            ))),
        }
    }
}

fn check_size(image: &RgbImage, expected: Resolution) -> Result<(), FisheyeError> {
    let actual = Resolution::of(image);
    if actual != expected {
        return Err(FisheyeError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Merges two equirectangular images of size `size` into one panorama.
///
/// # Errors
///
/// * [`FisheyeError::InvalidResolution`] if `size` has a zero dimension.
/// * [`FisheyeError::DimensionMismatch`] if either input is not exactly `size`.
pub fn stitch(
    equi_left: &RgbImage,
    equi_right: &RgbImage,
    size: Resolution,
    mode: StitchMode,
) -> Result<RgbImage, FisheyeError> {
    validation::validate_resolution(&size)?;
    check_size(equi_left, size)?;
    check_size(equi_right, size)?;

    let Resolution { width, height } = size;
    let half = width / 2;

    let right_start = match mode {
        StitchMode::Legacy => half,
        StitchMode::Symmetric => 0,
    };

    let mut merged = RgbImage::new(width, height);
    let right_part = imageops::crop_imm(equi_right, right_start, 0, half, height).to_image();
    let left_part = imageops::crop_imm(equi_left, half, 0, width - half, height).to_image();
    imageops::replace(&mut merged, &right_part, 0, 0);
    imageops::replace(&mut merged, &left_part, i64::from(half), 0);

    Ok(merged)
}
