//! Foliage attenuation through vegetation canopy.
//!
//! Specific attenuation follows the simple ITU-R P.833 style fit
//!
//! ```text
//! γ = 0.2 · f^0.3 · h^0.6    [dB/km]
//! ```
//!
//! where `f` is frequency in GHz and `h` canopy height in meters.

use crate::{TerrainError, C};
use rastergrid::{Footprint, RasterGrid, MAX_CODE};

/// Returns specific foliage attenuation (dB/km) for canopy of height
/// `canopy_height_m` at `freq_ghz`.
///
/// Non-positive canopy heights attenuate nothing.
#[inline]
pub fn specific_attenuation(freq_ghz: C, canopy_height_m: C) -> C {
    if canopy_height_m > 0.0 {
        0.2 * freq_ghz.powf(0.3) * canopy_height_m.powf(0.6)
    } else {
        0.0
    }
}

/// Specific attenuation for every raw code of one canopy grid.
///
/// Canopy height is quantized, so the attenuation of any sample lying
/// exactly on a code is a table lookup.
pub struct FoliageTable {
    freq_ghz: C,
    scale: C,
    offset: C,
    db_per_km: Box<[C]>,
}

impl FoliageTable {
    /// Builds the table for `canopy`'s scale and offset at
    /// `freq_ghz`.
    pub fn new(freq_ghz: C, canopy: &RasterGrid) -> Result<Self, TerrainError> {
        if !(freq_ghz.is_finite() && freq_ghz > 0.0) {
            return Err(TerrainError::Frequency(freq_ghz));
        }
        let db_per_km = (0..=MAX_CODE)
            .map(|raw| specific_attenuation(freq_ghz, canopy.decode(raw)))
            .collect();
        Ok(Self {
            freq_ghz,
            scale: canopy.scale(),
            offset: canopy.offset(),
            db_per_km,
        })
    }

    pub fn freq_ghz(&self) -> C {
        self.freq_ghz
    }

    /// Returns specific attenuation (dB/km) of raw code `raw`.
    #[inline]
    pub fn get(&self, raw: u16) -> C {
        self.db_per_km[usize::from(raw)]
    }

    /// Returns specific attenuation (dB/km) of the canopy under
    /// `footprint`.
    ///
    /// When all four corners share a code the interpolated height is
    /// that code's height and the table is used. Otherwise the formula
    /// is evaluated on the interpolated height.
    #[inline]
    pub fn at(&self, canopy: &RasterGrid, footprint: &Footprint) -> C {
        debug_assert!(self.scale == canopy.scale() && self.offset == canopy.offset());
        let [nw, ne, sw, se] = canopy.raw_corners(footprint);
        if nw == ne && nw == sw && nw == se {
            self.get(nw)
        } else {
            specific_attenuation(self.freq_ghz, canopy.interpolate(footprint))
        }
    }
}
