//! Fisheye to equirectangular remapping.
//!
//! Every destination pixel `(x, y)` is turned into a longitude/latitude pair,
//! then into a viewing direction, which the [`CameraModel`] projects onto the
//! fisheye image. The resulting source coordinates are floored and clamped into
//! the image, and the source pixel is copied verbatim (nearest-neighbor).
//!
//! The geometric part only depends on the source size, the destination size
//! and the lens, so it is computed once into a [`RemapTable`] and can be
//! applied to any number of images of the same size.

use crate::camera::{
    validation, Aperture, CameraModel, EquidistantModel, FisheyeError, Resolution,
};
use crate::geometry::{equirect_direction, normalize_pixel};
use image::RgbImage;
use log::debug;
use rayon::prelude::*;

const CHANNELS: usize = 3;

/// Floors a continuous coordinate and clamps it into `[0, extent - 1]`.
///
/// Many destination pixels may collapse onto the same border pixel; this is
/// the accepted sampling policy, not an error.
#[inline]
pub fn clamp_index(value: f64, extent: u32) -> u32 {
    let max = i64::from(extent.saturating_sub(1));
    // `as` saturates and maps NaN to 0.
    (value.floor() as i64).clamp(0, max) as u32
}

/// Precomputed source pixel for every destination pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct RemapTable {
    src: Resolution,
    dst: Resolution,
    /// Row-major over the destination, `y_src * src.width + x_src`.
    offsets: Vec<usize>,
}

impl RemapTable {
    pub fn source_resolution(&self) -> Resolution {
        self.src
    }

    pub fn destination_resolution(&self) -> Resolution {
        self.dst
    }

    /// Source pixel `(x, y)` sampled by destination pixel `(x, y)`.
    pub fn source_of(&self, x: u32, y: u32) -> Option<(u32, u32)> {
        if x >= self.dst.width || y >= self.dst.height {
            return None;
        }
        let offset = self.offsets[y as usize * self.dst.width as usize + x as usize];
        let width = self.src.width as usize;
        Some(((offset % width) as u32, (offset / width) as u32))
    }

    fn fill_row<M>(
        model: &M,
        src: Resolution,
        dst: Resolution,
        y: u32,
        row: &mut [usize],
    ) -> Result<(), FisheyeError>
    where
        M: CameraModel + ?Sized,
    {
        let y_norm = normalize_pixel(y as f64, dst.height);
        for (x, offset) in row.iter_mut().enumerate() {
            let x_norm = normalize_pixel(x as f64, dst.width);
            let point = model.project(&equirect_direction(x_norm, y_norm))?;
            let x_src = clamp_index(point.x, src.width) as usize;
            let y_src = clamp_index(point.y, src.height) as usize;
            *offset = y_src * src.width as usize + x_src;
        }
        Ok(())
    }
}

/// Projects fisheye images onto an equirectangular grid of a fixed size.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    dst: Resolution,
    parallel: bool,
}

impl Projector {
    /// Creates a projector for the given output size. Rows are processed in
    /// parallel unless disabled with [`Projector::parallel`].
    ///
    /// # Errors
    ///
    /// * [`FisheyeError::InvalidResolution`] if either dimension is zero.
    pub fn new(dst: Resolution) -> Result<Self, FisheyeError> {
        validation::validate_resolution(&dst)?;
        Ok(Projector {
            dst,
            parallel: true,
        })
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn destination_resolution(&self) -> Resolution {
        self.dst
    }

    /// Computes the source pixel of every destination pixel for `model`.
    pub fn remap_table<M>(&self, model: &M) -> Result<RemapTable, FisheyeError>
    where
        M: CameraModel + Sync + ?Sized,
    {
        let src = model.get_resolution();
        validation::validate_resolution(&src)?;
        let dst = self.dst;
        let row_len = dst.width as usize;
        let mut offsets = vec![0_usize; dst.area()];

        if self.parallel {
            offsets
                .par_chunks_mut(row_len)
                .enumerate()
                .try_for_each(|(y, row)| RemapTable::fill_row(model, src, dst, y as u32, row))?;
        } else {
            for y in (0..dst.height).rev() {
                let start = y as usize * row_len;
                RemapTable::fill_row(model, src, dst, y, &mut offsets[start..start + row_len])?;
            }
        }

        debug!("Built remap table {src} -> {dst} (parallel: {})", self.parallel);
        Ok(RemapTable { src, dst, offsets })
    }

    /// Copies source pixels into a new destination image through `table`.
    ///
    /// # Errors
    ///
    /// * [`FisheyeError::EmptyImage`] if `source` has no pixels.
    /// * [`FisheyeError::DimensionMismatch`] if `source` does not have the size
    ///   the table was built for.
    pub fn sample(&self, table: &RemapTable, source: &RgbImage) -> Result<RgbImage, FisheyeError> {
        let actual = Resolution::of(source);
        if actual.area() == 0 {
            return Err(FisheyeError::EmptyImage);
        }
        if actual != table.src {
            return Err(FisheyeError::DimensionMismatch {
                expected: table.src,
                actual,
            });
        }

        let raw = source.as_raw();
        let copy_row = |(row, offsets): (&mut [u8], &[usize])| {
            for (pixel, &offset) in row.chunks_exact_mut(CHANNELS).zip(offsets) {
                let start = offset * CHANNELS;
                pixel.copy_from_slice(&raw[start..start + CHANNELS]);
            }
        };

        let row_len = table.dst.width as usize;
        let mut buffer = vec![0_u8; table.dst.area() * CHANNELS];
        if self.parallel {
            buffer
                .par_chunks_mut(row_len * CHANNELS)
                .zip(table.offsets.par_chunks(row_len))
                .for_each(copy_row);
        } else {
            buffer
                .chunks_mut(row_len * CHANNELS)
                .zip(table.offsets.chunks(row_len))
                .for_each(copy_row);
        }

        RgbImage::from_raw(table.dst.width, table.dst.height, buffer).ok_or_else(|| {
            FisheyeError::InvalidParams(
                "Destination buffer does not match its resolution".to_string(),
            )
        })
    }

    /// Projects a single fisheye image seen through `model`.
    pub fn project<M>(&self, model: &M, source: &RgbImage) -> Result<RgbImage, FisheyeError>
    where
        M: CameraModel + Sync + ?Sized,
    {
        let table = self.remap_table(model)?;
        self.sample(&table, source)
    }
}

/// Projects an equidistant fisheye image onto an equirectangular image of
/// size `dst`.
///
/// # Errors
///
/// * [`FisheyeError::EmptyImage`] if `source` has no pixels.
/// * [`FisheyeError::InvalidResolution`] if `dst` has a zero dimension.
pub fn fisheye_to_equirect(
    source: &RgbImage,
    dst: Resolution,
    aperture: Aperture,
) -> Result<RgbImage, FisheyeError> {
    let src = Resolution::of(source);
    if src.area() == 0 {
        return Err(FisheyeError::EmptyImage);
    }
    let model = EquidistantModel::new(aperture, src)?;
    Projector::new(dst)?.project(&model, source)
}
