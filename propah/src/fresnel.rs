use num_traits::{AsPrimitive, Float};

/// Speed of light in GHz·m, rounded.
const C_GHZ_M: f64 = 0.3;

/// Returns the wavelength (meters) of `freq_ghz`.
#[inline]
pub fn freq_to_wavelen<T>(freq_ghz: T) -> T
where
    T: Float + 'static,
    f64: AsPrimitive<T>,
{
    C_GHZ_M.as_() / freq_ghz
}

/// Returns the radius (meters) of the `zone`th fresnel zone at a point
/// `d1_m` from one end and `d2_m` from the other.
#[inline]
pub fn fresnel_radius<T>(zone: T, wavelength_m: T, d1_m: T, d2_m: T) -> T
where
    T: Float,
{
    let total = d1_m + d2_m;
    if total <= T::zero() {
        return T::zero();
    }
    (zone * wavelength_m * d1_m * d2_m / total).max(T::zero()).sqrt()
}
