//! Dual fisheye to equirectangular panorama tool.
//!
//! Usage:
//! ```bash
//! fisheye2equi --left left.jpg --right right.jpg --output-dir out \
//!   --dst-size 2000 1000 --aperture 210
//! ```

use clap::Parser;
use fisheye_equirect::camera::{Aperture, CameraModel, EquidistantModel, Resolution};
use fisheye_equirect::panorama::{PanoramaJob, PanoramaSettings};
use fisheye_equirect::stitch::StitchMode;
use log::info;
use std::path::PathBuf;

/// Convert a left/right fisheye pair into an equirectangular panorama
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Left fisheye image
    #[arg(short = 'l', long)]
    left: PathBuf,

    /// Right fisheye image
    #[arg(short = 'r', long)]
    right: PathBuf,

    /// Output directory
    #[arg(short = 'o', long, default_value = ".")]
    output_dir: PathBuf,

    /// Size of the output image [width, height]
    #[arg(short = 's', long, num_args = 2, value_names = ["WIDTH", "HEIGHT"], default_values_t = [2000, 1000])]
    dst_size: Vec<u32>,

    /// Aperture of the camera [degree]
    #[arg(short = 'a', long, default_value_t = Aperture::DEFAULT_DEGREES)]
    aperture: f64,

    /// Lens description YAML, overrides --aperture
    #[arg(long)]
    lens: Option<PathBuf>,

    /// Column layout of the merged image (legacy, symmetric)
    #[arg(long, default_value_t = StitchMode::Legacy)]
    stitch_mode: StitchMode,

    /// Process rows on a single thread
    #[arg(long)]
    sequential: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let size = match cli.dst_size.as_slice() {
        [width, height] => Resolution::new(*width, *height),
        _ => return Err("--dst-size expects exactly two values: WIDTH HEIGHT".into()),
    };

    let lens = match &cli.lens {
        Some(path) => {
            let path_str = path.to_str().ok_or("Invalid lens path string")?;
            info!("Loading equidistant lens from: {}", path_str);
            Some(EquidistantModel::load_from_yaml(path_str)?)
        }
        None => None,
    };

    let aperture = match &lens {
        Some(lens) => lens.aperture,
        None => Aperture::from_degrees(cli.aperture)?,
    };

    let job = PanoramaJob {
        left: cli.left,
        right: cli.right,
        output_dir: cli.output_dir,
        settings: PanoramaSettings {
            size,
            aperture,
            stitch_mode: cli.stitch_mode,
            parallel: !cli.sequential,
            lens,
        },
    };

    info!(
        "Converting {} + {} to {} panorama, aperture {:.1} degrees",
        job.left.display(),
        job.right.display(),
        size,
        aperture.degrees()
    );

    let outputs = job.run()?;
    info!("Panorama written to {}", outputs.merged.display());

    Ok(())
}
