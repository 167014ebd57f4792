//! Raster bundles written by the LiDAR preprocessing step.
//!
//! A bundle is a directory holding:
//!
//! - `metadata.json`: shape, projected (EPSG:3857) and WGS84 bounds,
//!   and the scale/offset of each quantized grid,
//! - `dtm_u16.bin`: terrain elevation codes,
//! - `chm_u16.bin`: canopy height codes,
//! - `valid_u8.bin` (optional): one byte per sample, non-zero where
//!   both terrain and canopy had LiDAR returns.
//!
//! Grids are little-endian `u16`, row-major, with row 0 at `maxy`
//! and column 0 at `minx`.

use crate::{GridError, Grids, RasterGrid, ValidityMask, C};
use byteorder::{LittleEndian as LE, WriteBytesExt};
use geo::geometry::{Coord, Rect};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

pub const METADATA_FILE: &str = "metadata.json";
pub const DTM_FILE: &str = "dtm_u16.bin";
pub const CHM_FILE: &str = "chm_u16.bin";
pub const MASK_FILE: &str = "valid_u8.bin";

/// Contents of `metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub width: usize,
    pub height: usize,
    pub bounds: ProjectedBounds,
    pub bounds_wgs84: GeoBounds,
    #[serde(default = "default_crs")]
    pub crs: String,
    pub chm_scale: C,
    #[serde(default)]
    pub chm_offset: C,
    #[serde(default)]
    pub chm_min_height: C,
    #[serde(default)]
    pub chm_max_height: C,
    pub dtm_scale: C,
    #[serde(default)]
    pub dtm_offset: C,
    #[serde(default)]
    pub dtm_min_height: C,
    #[serde(default)]
    pub dtm_max_height: C,
    #[serde(default)]
    pub dx: C,
    #[serde(default)]
    pub dy: C,
}

fn default_crs() -> String {
    "EPSG:3857".to_string()
}

/// Projected bounds, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedBounds {
    pub minx: C,
    pub miny: C,
    pub maxx: C,
    pub maxy: C,
}

impl ProjectedBounds {
    pub fn rect(&self) -> Rect<C> {
        Rect::new(
            Coord {
                x: self.minx,
                y: self.miny,
            },
            Coord {
                x: self.maxx,
                y: self.maxy,
            },
        )
    }
}

impl From<Rect<C>> for ProjectedBounds {
    fn from(rect: Rect<C>) -> Self {
        Self {
            minx: rect.min().x,
            miny: rect.min().y,
            maxx: rect.max().x,
            maxy: rect.max().y,
        }
    }
}

/// Geographic bounds, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub lat_min: C,
    pub lon_min: C,
    pub lat_max: C,
    pub lon_max: C,
}

/// How to load grid samples.
///
/// The trade off between loading grid data into memory versus memory
/// mapping is not obvious, and you should measure both before
/// deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Read samples into memory.
    InMem,

    /// Memory map file contents.
    MemMap,
}

/// A loaded raster bundle.
pub struct Dataset {
    pub metadata: Metadata,
    pub grids: Grids,
}

impl Dataset {
    /// Opens the bundle in directory `dir`.
    pub fn open<P: AsRef<Path>>(dir: P, mode: LoadMode) -> Result<Self, GridError> {
        let dir = dir.as_ref();
        let now = std::time::Instant::now();

        let metadata: Metadata = {
            let file = File::open(dir.join(METADATA_FILE))?;
            serde_json::from_reader(file)?
        };
        let Metadata {
            width,
            height,
            bounds,
            ..
        } = metadata;
        let bounds = bounds.rect();

        let open_grid = |name: &str, scale: C, offset: C| {
            let path = dir.join(name);
            debug!("loading {path:?}");
            match mode {
                LoadMode::InMem => RasterGrid::load(path, width, height, bounds, scale, offset),
                LoadMode::MemMap => RasterGrid::memmap(path, width, height, bounds, scale, offset),
            }
        };
        let terrain = open_grid(DTM_FILE, metadata.dtm_scale, metadata.dtm_offset)?;
        let canopy = open_grid(CHM_FILE, metadata.chm_scale, metadata.chm_offset)?;

        let mask = match fs::read(dir.join(MASK_FILE)) {
            Ok(bytes) => Some(ValidityMask::from_bytes(width, height, &bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no validity mask in {dir:?}, treating all samples as valid");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let grids = Grids::new(terrain, canopy, mask)?;
        debug!(
            "dataset; dir: {dir:?}, shape: {width}x{height}, load_exec: {:?}",
            now.elapsed()
        );
        Ok(Self { metadata, grids })
    }

    /// Writes a bundle to directory `dir`, creating it if needed.
    pub fn write<P: AsRef<Path>>(
        dir: P,
        metadata: &Metadata,
        dtm: &[u16],
        chm: &[u16],
        valid: Option<&[bool]>,
    ) -> Result<(), GridError> {
        let dir = dir.as_ref();
        let expected = metadata.width * metadata.height;
        for actual in [dtm.len(), chm.len(), valid.map_or(expected, <[bool]>::len)] {
            if actual != expected {
                return Err(GridError::Len { expected, actual });
            }
        }

        fs::create_dir_all(dir)?;
        serde_json::to_writer_pretty(File::create(dir.join(METADATA_FILE))?, metadata)?;
        write_codes(dir.join(DTM_FILE), dtm)?;
        write_codes(dir.join(CHM_FILE), chm)?;
        if let Some(valid) = valid {
            let bytes: Vec<u8> = valid.iter().map(|&v| u8::from(v)).collect();
            fs::write(dir.join(MASK_FILE), bytes)?;
        }
        Ok(())
    }
}

fn write_codes(path: PathBuf, codes: &[u16]) -> Result<(), GridError> {
    let mut wtr = BufWriter::new(File::create(path)?);
    for code in codes {
        wtr.write_u16::<LE>(*code)?;
    }
    wtr.flush()?;
    Ok(())
}
