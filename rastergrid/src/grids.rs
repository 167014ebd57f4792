use crate::{Footprint, GridError, RasterGrid, ValidityMask, C};
use geo::geometry::{Coord, Rect};

/// Terrain (DTM) and canopy (CHM) grids over one shared lattice, plus
/// an optional validity mask.
pub struct Grids {
    terrain: RasterGrid,
    canopy: RasterGrid,
    mask: Option<ValidityMask>,
}

impl Grids {
    pub fn new(
        terrain: RasterGrid,
        canopy: RasterGrid,
        mask: Option<ValidityMask>,
    ) -> Result<Self, GridError> {
        if !terrain.same_lattice(&canopy) {
            return Err(GridError::Mismatch);
        }
        if let Some(mask) = &mask {
            if mask.width() != terrain.width() || mask.height() != terrain.height() {
                return Err(GridError::Mismatch);
            }
        }
        Ok(Self {
            terrain,
            canopy,
            mask,
        })
    }

    pub fn terrain(&self) -> &RasterGrid {
        &self.terrain
    }

    pub fn canopy(&self) -> &RasterGrid {
        &self.canopy
    }

    pub fn mask(&self) -> Option<&ValidityMask> {
        self.mask.as_ref()
    }

    pub fn bounds(&self) -> Rect<C> {
        self.terrain.bounds()
    }

    /// Returns the masked footprint of `coord`, usable with both
    /// grids.
    #[inline]
    pub fn footprint(&self, coord: Coord<C>) -> Option<Footprint> {
        self.terrain.footprint(coord, self.mask.as_ref())
    }

    /// Returns interpolated terrain elevation at `coord`.
    pub fn terrain_at(&self, coord: Coord<C>) -> Option<C> {
        self.terrain.sample(coord, self.mask.as_ref())
    }

    /// Returns interpolated canopy height at `coord`.
    pub fn canopy_at(&self, coord: Coord<C>) -> Option<C> {
        self.canopy.sample(coord, self.mask.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::{GridError, Grids, RasterGrid, Rect, ValidityMask};
    use geo::coord;

    fn grid(width: usize, height: usize, max_x: f64) -> RasterGrid {
        RasterGrid::new(
            width,
            height,
            Rect::new(coord!(x: 0.0, y: 0.0), coord!(x: max_x, y: 10.0)),
            1.0,
            0.0,
            vec![0; width * height],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_mismatched_lattices() {
        assert!(matches!(
            Grids::new(grid(2, 2, 10.0), grid(3, 2, 10.0), None),
            Err(GridError::Mismatch)
        ));
        assert!(matches!(
            Grids::new(grid(2, 2, 10.0), grid(2, 2, 20.0), None),
            Err(GridError::Mismatch)
        ));
        let mask = ValidityMask::new(3, 1, vec![true; 3]).unwrap();
        assert!(matches!(
            Grids::new(grid(3, 2, 10.0), grid(3, 2, 10.0), Some(mask)),
            Err(GridError::Mismatch)
        ));
    }

    #[test]
    fn test_shared_footprint() {
        let grids = Grids::new(grid(2, 2, 10.0), grid(2, 2, 10.0), None).unwrap();
        assert!(grids.footprint(coord!(x: 5.0, y: 5.0)).is_some());
        assert_eq!(grids.terrain_at(coord!(x: 5.0, y: 5.0)), Some(0.0));
        assert_eq!(grids.canopy_at(coord!(x: 0.5, y: 5.0)), None);
    }
}
