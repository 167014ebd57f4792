use crate::{options::Render, progress};
use anyhow::{anyhow, Result};
use coverage::{CancelToken, Coverage, Outcome, Request};
use image::{ImageFormat, RgbaImage};
use log::info;
use rastergrid::{Dataset, GeoBounds, ProjectedBounds};
use serde::Serialize;
use std::{fs::File, io::BufWriter, path::Path};

/// Legend written next to a rendered PNG.
#[derive(Debug, Serialize)]
pub struct Legend {
    /// Margin (dB) at which colors saturate, before boost.
    pub max_a: f64,
    pub resolution: usize,
    pub bounds: ProjectedBounds,
    pub bounds_wgs84: GeoBounds,
    pub crs: String,
    pub request: Request,
}

impl Render {
    pub fn run(&self, dataset: &Dataset) -> Result<()> {
        let request = self.request();
        let coverage = Coverage::new(&dataset.grids, request)?;

        let pb = progress::bar(
            format!("Rendering {0}x{0} coverage", request.resolution),
            request.resolution as u64,
        )?;
        let outcome = coverage.render(&pb, &CancelToken::new())?;
        pb.finish();

        let Outcome::Complete(raster) = outcome else {
            return Err(anyhow!("render was cancelled"));
        };
        let legend = Legend {
            max_a: raster.max_a,
            resolution: raster.resolution,
            bounds: dataset.metadata.bounds,
            bounds_wgs84: dataset.metadata.bounds_wgs84,
            crs: dataset.metadata.crs.clone(),
            request,
        };
        write_png(&self.out, raster.resolution, raster.rgba)?;
        let legend_path = self.out.with_extension("json");
        serde_json::to_writer_pretty(BufWriter::new(File::create(&legend_path)?), &legend)?;
        info!("wrote {:?} and {:?}", self.out, legend_path);
        Ok(())
    }
}

/// Writes square, row-major `rgba` as a PNG.
pub fn write_png(path: &Path, resolution: usize, rgba: Vec<u8>) -> Result<()> {
    let side = u32::try_from(resolution)?;
    let img = RgbaImage::from_raw(side, side, rgba)
        .ok_or_else(|| anyhow!("raster buffer does not match its resolution"))?;
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
