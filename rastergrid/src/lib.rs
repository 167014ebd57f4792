//! Quantized raster grids in a projected coordinate system.
//!
//! A [`RasterGrid`] stores `width × height` 16-bit codes which decode
//! to real values through `real = raw * scale + offset`. Row 0 is the
//! northern edge of the grid and column 0 the western edge, so row
//! indices grow as `y` shrinks.
//!
//! Lookups at arbitrary projected coordinates go through a
//! [`Footprint`], the four samples surrounding a coordinate plus their
//! bilinear weights.

mod dataset;
mod error;
mod grids;
mod mask;
mod sampler;

pub use crate::{
    dataset::{Dataset, GeoBounds, LoadMode, Metadata, ProjectedBounds},
    error::GridError,
    grids::Grids,
    mask::ValidityMask,
    sampler::Footprint,
};
pub use geo;

use byteorder::{ByteOrder, LittleEndian as LE, ReadBytesExt};
use geo::geometry::{Coord, Rect};
use memmap2::Mmap;
use std::{fs::File, io::BufReader, mem::size_of, path::Path};

/// Base floating point type used for all coordinates and calculations.
pub type C = f64;

/// Largest raw code a sample can hold.
pub const MAX_CODE: u16 = u16::MAX;

pub struct RasterGrid {
    /// Planar extent of the grid.
    ///
    /// Specifically, the outer _edges_ of the outermost samples, not
    /// their centers.
    bounds: Rect<C>,

    /// Number of columns.
    width: usize,

    /// Number of rows.
    height: usize,

    /// Real units per raw code.
    scale: C,

    /// Real value of raw code 0.
    offset: C,

    /// Raw samples.
    samples: SampleStore,
}

enum SampleStore {
    InMem(Box<[u16]>),
    MemMap(Mmap),
}

impl SampleStore {
    fn get_unchecked(&self, index: usize) -> u16 {
        match self {
            Self::InMem(samples) => samples[index],
            Self::MemMap(raw) => {
                let start = index * size_of::<u16>();
                LE::read_u16(&raw[start..start + size_of::<u16>()])
            }
        }
    }
}

impl RasterGrid {
    /// Returns a grid backed by `samples`, stored row-major starting
    /// at the north-west corner.
    pub fn new(
        width: usize,
        height: usize,
        bounds: Rect<C>,
        scale: C,
        offset: C,
        samples: Vec<u16>,
    ) -> Result<Self, GridError> {
        validate(width, height, bounds, scale, offset)?;
        if samples.len() != width * height {
            return Err(GridError::Len {
                expected: width * height,
                actual: samples.len(),
            });
        }
        Ok(Self {
            bounds,
            width,
            height,
            scale,
            offset,
            samples: SampleStore::InMem(samples.into_boxed_slice()),
        })
    }

    /// Returns a grid read into memory from the little-endian `u16`
    /// file at `path`.
    pub fn load<P: AsRef<Path>>(
        path: P,
        width: usize,
        height: usize,
        bounds: Rect<C>,
        scale: C,
        offset: C,
    ) -> Result<Self, GridError> {
        validate(width, height, bounds, scale, offset)?;
        check_file_len(&path, width * height * size_of::<u16>())?;

        let mut file = BufReader::new(File::open(path)?);
        let mut samples = Vec::with_capacity(width * height);
        for _ in 0..(width * height) {
            samples.push(file.read_u16::<LE>()?);
        }

        Ok(Self {
            bounds,
            width,
            height,
            scale,
            offset,
            samples: SampleStore::InMem(samples.into_boxed_slice()),
        })
    }

    /// Returns a grid using the memory-mapped file at `path` as
    /// storage.
    pub fn memmap<P: AsRef<Path>>(
        path: P,
        width: usize,
        height: usize,
        bounds: Rect<C>,
        scale: C,
        offset: C,
    ) -> Result<Self, GridError> {
        validate(width, height, bounds, scale, offset)?;
        check_file_len(&path, width * height * size_of::<u16>())?;

        let samples = {
            let file = File::open(path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            SampleStore::MemMap(mmap)
        };

        Ok(Self {
            bounds,
            width,
            height,
            scale,
            offset,
            samples,
        })
    }

    /// Returns the number of samples in this grid.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> Rect<C> {
        self.bounds
    }

    pub fn scale(&self) -> C {
        self.scale
    }

    pub fn offset(&self) -> C {
        self.offset
    }

    /// Returns the planar (width, height) of a single cell.
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_size(&self) -> (C, C) {
        (
            self.bounds.width() / self.width as C,
            self.bounds.height() / self.height as C,
        )
    }

    /// Converts a raw code to its real value.
    #[inline]
    pub fn decode(&self, raw: u16) -> C {
        C::from(raw) * self.scale + self.offset
    }

    /// Converts a real value to the nearest raw code, saturating at
    /// the ends of the code range.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn encode(&self, real: C) -> u16 {
        let raw = ((real - self.offset) / self.scale).round();
        raw.clamp(0.0, C::from(MAX_CODE)) as u16
    }

    /// Returns the raw code at (`col`, `row`), if in bounds.
    pub fn get_raw(&self, col: usize, row: usize) -> Option<u16> {
        if col < self.width && row < self.height {
            Some(self.samples.get_unchecked(self.linear_index(col, row)))
        } else {
            None
        }
    }

    /// Returns the decoded value at (`col`, `row`), if in bounds.
    pub fn get(&self, col: usize, row: usize) -> Option<C> {
        self.get_raw(col, row).map(|raw| self.decode(raw))
    }

    /// Returns the projected coordinate of the center of (`col`, `row`).
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_center(&self, col: usize, row: usize) -> Coord<C> {
        let (dx, dy) = self.cell_size();
        Coord {
            x: self.bounds.min().x + (col as C + 0.5) * dx,
            y: self.bounds.max().y - (row as C + 0.5) * dy,
        }
    }

    /// Returns the bilinear footprint of `coord`.
    ///
    /// Returns `None` when any of the four enclosing samples falls
    /// outside the grid or is flagged invalid in `mask`.
    pub fn footprint(&self, coord: Coord<C>, mask: Option<&ValidityMask>) -> Option<Footprint> {
        let (dx, dy) = self.cell_size();
        let fc = (coord.x - self.bounds.min().x) / dx - 0.5;
        let fr = (self.bounds.max().y - coord.y) / dy - 0.5;
        let footprint = Footprint::locate(fc, fr, self.width, self.height)?;
        match mask {
            Some(mask) if !footprint.corners().iter().all(|&idx| mask.is_valid(idx)) => None,
            _ => Some(footprint),
        }
    }

    /// Returns the four raw corner codes of `footprint`.
    pub fn raw_corners(&self, footprint: &Footprint) -> [u16; 4] {
        footprint.corners().map(|idx| self.samples.get_unchecked(idx))
    }

    /// Returns the bilinear interpolation of the decoded values under
    /// `footprint`.
    pub fn interpolate(&self, footprint: &Footprint) -> C {
        footprint.blend(self.raw_corners(footprint).map(|raw| self.decode(raw)))
    }

    /// Returns the bilinearly interpolated value at `coord`, if all
    /// four enclosing samples exist and are valid.
    pub fn sample(&self, coord: Coord<C>, mask: Option<&ValidityMask>) -> Option<C> {
        self.footprint(coord, mask)
            .map(|footprint| self.interpolate(&footprint))
    }

    /// Returns `true` if `other` covers the same lattice as `self`.
    pub fn same_lattice(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.bounds == other.bounds
    }
}

/// Private API
impl RasterGrid {
    fn linear_index(&self, col: usize, row: usize) -> usize {
        row * self.width + col
    }
}

fn validate(
    width: usize,
    height: usize,
    bounds: Rect<C>,
    scale: C,
    offset: C,
) -> Result<(), GridError> {
    if width == 0 || height == 0 {
        return Err(GridError::Dimensions(width, height));
    }
    if !(scale.is_finite() && scale > 0.0) {
        return Err(GridError::Scale(scale));
    }
    if !offset.is_finite() {
        return Err(GridError::Offset(offset));
    }
    let (min, max) = (bounds.min(), bounds.max());
    if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite())
        || bounds.width() <= 0.0
        || bounds.height() <= 0.0
    {
        return Err(GridError::Bounds);
    }
    Ok(())
}

fn check_file_len<P: AsRef<Path>>(path: P, expected: usize) -> Result<(), GridError> {
    let len = path.as_ref().metadata()?.len();
    if len == expected as u64 {
        Ok(())
    } else {
        Err(GridError::FileLen(len, path.as_ref().to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::{GridError, RasterGrid, Rect, ValidityMask, C};
    use approx::assert_relative_eq;
    use geo::coord;

    /// A 4x3 grid over [0, 40] x [0, 30] with 10 m cells, where each
    /// code is `10 * row + col`.
    fn ramp() -> RasterGrid {
        let samples = (0..3)
            .flat_map(|row| (0..4).map(move |col| 10 * row + col))
            .collect();
        RasterGrid::new(
            4,
            3,
            Rect::new(coord!(x: 0.0, y: 0.0), coord!(x: 40.0, y: 30.0)),
            0.5,
            100.0,
            samples,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_construction() {
        let bounds = Rect::new(coord!(x: 0.0, y: 0.0), coord!(x: 1.0, y: 1.0));
        assert!(matches!(
            RasterGrid::new(2, 2, bounds, 0.0, 0.0, vec![0; 4]),
            Err(GridError::Scale(_))
        ));
        assert!(matches!(
            RasterGrid::new(2, 2, bounds, -1.0, 0.0, vec![0; 4]),
            Err(GridError::Scale(_))
        ));
        assert!(matches!(
            RasterGrid::new(2, 2, bounds, 1.0, 0.0, vec![0; 3]),
            Err(GridError::Len {
                expected: 4,
                actual: 3
            })
        ));
        assert!(matches!(
            RasterGrid::new(0, 2, bounds, 1.0, 0.0, vec![]),
            Err(GridError::Dimensions(0, 2))
        ));
        let flat = Rect::new(coord!(x: 0.0, y: 0.0), coord!(x: 1.0, y: 0.0));
        assert!(matches!(
            RasterGrid::new(2, 2, flat, 1.0, 0.0, vec![0; 4]),
            Err(GridError::Bounds)
        ));
    }

    #[test]
    fn test_row_zero_is_north() {
        let grid = ramp();
        assert_eq!(grid.get_raw(0, 0), Some(0));
        assert_eq!(grid.get_raw(3, 2), Some(23));
        assert_eq!(grid.get_raw(4, 0), None);
        assert_eq!(grid.cell_center(0, 0), coord!(x: 5.0, y: 25.0));
        assert_eq!(grid.cell_center(3, 2), coord!(x: 35.0, y: 5.0));
    }

    #[test]
    fn test_sample_at_cell_centers() {
        let grid = ramp();
        for row in 0..2 {
            for col in 0..3 {
                let expected = grid.get(col, row).unwrap();
                let actual = grid.sample(grid.cell_center(col, row), None).unwrap();
                assert_relative_eq!(expected, actual, epsilon = 1e-9);
            }
        }
        // The last center lines lack a south or east neighbour.
        assert_eq!(grid.sample(grid.cell_center(3, 0), None), None);
        assert_eq!(grid.sample(grid.cell_center(0, 2), None), None);
    }

    #[test]
    fn test_sample_interpolates() {
        let grid = ramp();
        // Halfway between the centers of (0,0), (1,0), (0,1), (1,1).
        let value = grid.sample(coord!(x: 10.0, y: 20.0), None).unwrap();
        let expected = (grid.decode(0) + grid.decode(1) + grid.decode(10) + grid.decode(11)) / 4.0;
        assert_relative_eq!(value, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_sample_none_at_and_beyond_edges() {
        let grid = ramp();
        for coord in [
            coord!(x: 0.0, y: 15.0),
            coord!(x: 40.0, y: 15.0),
            coord!(x: 20.0, y: 0.0),
            coord!(x: 20.0, y: 30.0),
            coord!(x: -5.0, y: 15.0),
            coord!(x: 45.0, y: 15.0),
            coord!(x: 20.0, y: -1.0),
            coord!(x: 20.0, y: 31.0),
            coord!(x: 2.0, y: 15.0),
            coord!(x: C::NAN, y: 15.0),
            coord!(x: 1e30, y: 15.0),
            coord!(x: 20.0, y: -1e30),
            coord!(x: C::MAX, y: C::MAX),
        ] {
            assert_eq!(grid.sample(coord, None), None, "{coord:?}");
        }
    }

    #[test]
    fn test_sample_is_continuous_across_cell_boundaries() {
        let grid = ramp();
        let eps = 1e-9;
        // Column boundary between centers at x = 15.
        let left = grid.sample(coord!(x: 15.0 - eps, y: 17.0), None).unwrap();
        let right = grid.sample(coord!(x: 15.0 + eps, y: 17.0), None).unwrap();
        assert_relative_eq!(left, right, epsilon = 1e-6);
        // Row boundary between centers at y = 15.
        let above = grid.sample(coord!(x: 22.0, y: 15.0 + eps), None).unwrap();
        let below = grid.sample(coord!(x: 22.0, y: 15.0 - eps), None).unwrap();
        assert_relative_eq!(above, below, epsilon = 1e-6);
    }

    #[test]
    fn test_sample_respects_mask() {
        let grid = ramp();
        let mut valid = vec![true; 12];
        // Invalidate (col 1, row 1).
        valid[5] = false;
        let mask = ValidityMask::new(4, 3, valid).unwrap();
        // Footprint touching (1, 1).
        assert_eq!(grid.sample(coord!(x: 12.0, y: 18.0), Some(&mask)), None);
        assert_eq!(grid.sample(coord!(x: 22.0, y: 8.0), Some(&mask)), None);
        // Footprint of columns 2..=3, rows 0..=1 does not.
        assert!(grid.sample(coord!(x: 30.0, y: 20.0), Some(&mask)).is_some());
    }

    #[test]
    fn test_quantization_round_trip() {
        let bounds = Rect::new(coord!(x: 0.0, y: 0.0), coord!(x: 1.0, y: 1.0));
        let (min, max) = (-12.5, 1_850.0);
        let scale = (max - min) / f64::from(u16::MAX);
        let grid = RasterGrid::new(1, 1, bounds, scale, min, vec![0]).unwrap();
        for height in [-12.5, 0.0, 3.14159, 427.3, 1_849.99, 1_850.0] {
            let decoded = grid.decode(grid.encode(height));
            assert!((decoded - height).abs() <= scale, "{height} -> {decoded}");
        }
        assert_eq!(grid.encode(-1_000.0), 0);
        assert_eq!(grid.encode(10_000.0), u16::MAX);
    }

    #[test]
    fn test_interpolate_matches_raw_corners() {
        let grid = ramp();
        let fp = grid.footprint(coord!(x: 27.5, y: 12.5), None).unwrap();
        let corners = grid.raw_corners(&fp);
        assert_eq!(corners, [12, 13, 22, 23]);
        assert_relative_eq!(
            grid.interpolate(&fp),
            grid.decode(12) + 0.25 * 0.5 + 0.25 * 5.0,
            epsilon = 1e-9
        );
    }
}
