use crate::camera::FisheyeError;
use image::RgbImage;
use log::info;
use std::fs;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum UtilError {
    #[error("Image I/O failed: {0}")]
    ImageIo(String),
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
    #[error(transparent)]
    Fisheye(#[from] FisheyeError),
}

impl From<std::io::Error> for UtilError {
    fn from(err: std::io::Error) -> Self {
        UtilError::ImageIo(err.to_string())
    }
}

/// Ensure the output directory exists
pub fn ensure_output_dir(output_dir: &Path) -> Result<(), UtilError> {
    if !output_dir.exists() {
        fs::create_dir_all(output_dir).map_err(|e| {
            UtilError::InvalidParams(format!(
                "Failed to create output directory {}: {e}",
                output_dir.display()
            ))
        })?;
    }
    Ok(())
}

/// Load an image from file path
///
/// # Arguments
///
/// * `image_path` - Path to the image file
///
/// # Returns
///
/// * `Result<RgbImage, UtilError>` - Loaded RGB image, alpha is dropped
pub fn load_image(image_path: &Path) -> Result<RgbImage, UtilError> {
    let img = image::open(image_path).map_err(|e| {
        UtilError::ImageIo(format!(
            "Failed to load image {}: {e}",
            image_path.display()
        ))
    })?;

    let img = img.to_rgb8();
    if img.width() == 0 || img.height() == 0 {
        return Err(FisheyeError::EmptyImage.into());
    }
    Ok(img)
}

/// Save an image, the format is picked from the file extension
///
/// # Arguments
///
/// * `image` - Image to save
/// * `image_path` - Destination path
pub fn save_image(image: &RgbImage, image_path: &Path) -> Result<(), UtilError> {
    image.save(image_path).map_err(|e| {
        UtilError::ImageIo(format!(
            "Failed to save image {}: {e}",
            image_path.display()
        ))
    })?;

    info!("Saved image: {}", image_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_save_and_load_image() {
        let output_dir = Path::new("output/util_roundtrip");
        ensure_output_dir(output_dir).unwrap();
        assert!(output_dir.is_dir());

        let path = output_dir.join("checker.png");
        let image = RgbImage::from_fn(6, 4, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([10, 20, 30])
            } else {
                Rgb([200, 100, 0])
            }
        });
        save_image(&image, &path).unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded, image);

        fs::remove_dir_all(output_dir).unwrap();
    }

    #[test]
    fn test_load_missing_image() {
        let result = load_image(Path::new("output/does_not_exist.jpg"));
        assert!(matches!(result, Err(UtilError::ImageIo(_))));
    }

    #[test]
    fn test_fisheye_error_converts() {
        let err: UtilError = FisheyeError::EmptyImage.into();
        assert_eq!(err.to_string(), "Source image is empty");
    }
}
