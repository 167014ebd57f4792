use crate::C;

/// The four samples enclosing a projected coordinate, and where the
/// coordinate sits between them.
///
/// Corners are ordered north-west, north-east, south-west,
/// south-east. Since terrain and canopy grids share one lattice, a
/// footprint located once can be used against both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    corners: [usize; 4],
    /// Fractional distance from the western to the eastern corners.
    fx: C,
    /// Fractional distance from the northern to the southern corners.
    fy: C,
}

impl Footprint {
    /// Locates the footprint of fractional sample position
    /// (`fc`, `fr`) in a `width × height` lattice.
    ///
    /// Returns `None` unless all four corners exist, so positions on or
    /// past the last column (or row) of sample centers have no
    /// footprint.
    pub(crate) fn locate(fc: C, fr: C, width: usize, height: usize) -> Option<Self> {
        let (c0, fx) = axis(fc, width)?;
        let (r0, fy) = axis(fr, height)?;
        let nw = r0 * width + c0;
        let sw = nw + width;
        Some(Self {
            corners: [nw, nw + 1, sw, sw + 1],
            fx,
            fy,
        })
    }

    /// Linear indices of the corner samples.
    pub fn corners(&self) -> [usize; 4] {
        self.corners
    }

    /// Blends per-corner values bilinearly.
    #[inline]
    pub fn blend(&self, values: [C; 4]) -> C {
        let [nw, ne, sw, se] = values;
        let north = nw + (ne - nw) * self.fx;
        let south = sw + (se - sw) * self.fx;
        north + (south - north) * self.fy
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn axis(f: C, len: usize) -> Option<(usize, C)> {
    // Checked before the cast, which saturates for far coordinates.
    if !(f >= 0.0 && f < len.saturating_sub(1) as C) {
        return None;
    }
    let lower = f.floor();
    Some((lower as usize, f - lower))
}

#[cfg(test)]
mod tests {
    use super::Footprint;
    use approx::assert_relative_eq;

    #[test]
    fn test_locate_interior() {
        let fp = Footprint::locate(1.25, 0.5, 4, 3).unwrap();
        assert_eq!(fp.corners(), [1, 2, 5, 6]);
        assert_relative_eq!(fp.blend([1.0, 1.0, 1.0, 1.0]), 1.0);
        assert_relative_eq!(fp.blend([1.0, 0.0, 0.0, 0.0]), 0.75 * 0.5);
        assert_relative_eq!(fp.blend([0.0, 0.0, 0.0, 1.0]), 0.25 * 0.5);
    }

    #[test]
    fn test_locate_last_center_line() {
        let fp = Footprint::locate(2.999, 1.999, 4, 3).unwrap();
        assert_eq!(fp.corners(), [6, 7, 10, 11]);
        assert_eq!(Footprint::locate(3.0, 1.0, 4, 3), None);
        assert_eq!(Footprint::locate(1.0, 2.0, 4, 3), None);
    }

    #[test]
    fn test_locate_far_away() {
        for f in [1e19, 1e30, f64::MAX] {
            assert_eq!(Footprint::locate(f, 1.0, 4, 3), None);
            assert_eq!(Footprint::locate(1.0, f, 4, 3), None);
        }
        assert_eq!(Footprint::locate(f64::NAN, 1.0, 4, 3), None);
    }

    #[test]
    fn test_locate_outside() {
        assert_eq!(Footprint::locate(-0.01, 1.0, 4, 3), None);
        assert_eq!(Footprint::locate(3.01, 1.0, 4, 3), None);
        assert_eq!(Footprint::locate(1.0, 2.5, 4, 3), None);
        assert_eq!(Footprint::locate(0.5, 0.5, 1, 3), None);
        assert_eq!(Footprint::locate(f64::INFINITY, 0.5, 4, 3), None);
    }

    #[test]
    fn test_blend_is_bilinear() {
        let fp = Footprint::locate(0.3, 0.8, 2, 2).unwrap();
        let values = [10.0, -4.0, 7.5, 100.0];
        let expected = 0.7 * 0.2 * 10.0 + 0.3 * 0.2 * -4.0 + 0.7 * 0.8 * 7.5 + 0.3 * 0.8 * 100.0;
        assert_relative_eq!(fp.blend(values), expected, epsilon = 1e-12);
    }
}
