//! Multiple knife-edge diffraction after Deygout.
//!
//! The dominant obstruction of a profile, the one with the largest
//! Fresnel-Kirchhoff parameter `v`, is scored as a single knife edge.
//! The sub-profiles on either side of it, each including the
//! obstruction itself, are then scored the same way.

use terrain::{ProfilePoint, C};

/// Below this `v` a knife edge contributes no loss.
pub const V_MIN: C = -0.78;

/// Returns the Fresnel-Kirchhoff diffraction parameter of an
/// obstruction `h_excess_m` above the line of sight, `d1_m` from one
/// end and `d2_m` from the other.
///
/// Returns `None` for degenerate geometry.
#[inline]
pub fn fresnel_parameter(h_excess_m: C, d1_m: C, d2_m: C, wavelength_m: C) -> Option<C> {
    let d_total = d1_m + d2_m;
    let d1d2 = d1_m * d2_m;
    if d_total <= 0.0 || d1d2 <= 0.0 || wavelength_m <= 0.0 {
        return None;
    }
    Some(h_excess_m * ((2.0 / wavelength_m) * d_total / d1d2).sqrt())
}

/// Returns single knife-edge loss (dB) for parameter `v`.
#[inline]
pub fn knife_edge_loss(v: C) -> C {
    if v <= V_MIN {
        0.0
    } else {
        let v = v - 0.1;
        6.9 + 20.0 * ((v * v + 1.0).sqrt() + v).log10()
    }
}

/// An obstruction found by [`dominant_edge`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Index into the scored profile.
    pub index: usize,
    pub v: C,
}

/// Returns the interior point of `points` with the largest `v` against
/// the line from the first to the last point.
pub fn dominant_edge(points: &[ProfilePoint], wavelength_m: C) -> Option<Edge> {
    let (first, last) = match points {
        [first, .., last] if points.len() >= 3 => (first, last),
        _ => return None,
    };
    let d_total = last.distance_m - first.distance_m;
    if d_total <= 0.0 {
        return None;
    }
    let rise = last.height_m - first.height_m;

    points[1..points.len() - 1]
        .iter()
        .enumerate()
        .filter_map(|(i, point)| {
            let d1 = point.distance_m - first.distance_m;
            let h_los = first.height_m + rise * d1 / d_total;
            let v = fresnel_parameter(point.height_m - h_los, d1, d_total - d1, wavelength_m)?;
            (!v.is_nan()).then_some(Edge { index: i + 1, v })
        })
        .fold(None, |best: Option<Edge>, edge| match best {
            Some(best) if best.v >= edge.v => Some(best),
            _ => Some(edge),
        })
}

/// Returns Deygout multiple knife-edge loss (dB) of `points`.
///
/// Profiles with fewer than three points, or no obstruction above the
/// line of sight, lose nothing.
pub fn deygout_loss(points: &[ProfilePoint], wavelength_m: C) -> C {
    match dominant_edge(points, wavelength_m) {
        Some(Edge { index, v }) if v > 0.0 => {
            knife_edge_loss(v)
                + deygout_loss(&points[..=index], wavelength_m)
                + deygout_loss(&points[index..], wavelength_m)
        }
        _ => 0.0,
    }
}
