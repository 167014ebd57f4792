//! Margin to RGBA mapping.
//!
//! Colors follow matplotlib's "hot" ramp: black through red and yellow
//! to white.

use propah::terrain::C;

/// Cells without enough terrain to score.
pub const NO_DATA: [u8; 4] = [0, 0, 0, 0];

/// The transmitter's own cell.
pub const SELF_CELL: [u8; 4] = [255, 255, 255, 255];

const RED_END: C = 0.365_079;
const GREEN_END: C = 0.746_032;

/// Returns the "hot" RGB color at `t` in `[0, 1]`.
pub fn hot(t: C) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let r = t / RED_END;
    let g = (t - RED_END) / (GREEN_END - RED_END);
    let b = (t - GREEN_END) / (1.0 - GREEN_END);
    [channel(r), channel(g), channel(b)]
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(value: C) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// Maps link margins to display colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shader {
    max_a: C,
    boost: C,
    gamma: C,
}

impl Shader {
    /// Returns a shader normalizing margins by `max_a`. Non-positive
    /// `max_a` is treated as 1.
    pub fn new(max_a: C, boost: C, gamma: C) -> Self {
        Self {
            max_a: if max_a > 0.0 { max_a } else { 1.0 },
            boost,
            gamma,
        }
    }

    /// Returns normalized, gamma compressed margin in `[0, 1]`.
    pub fn intensity(&self, margin_db: C) -> C {
        let t = (margin_db / self.max_a * self.boost).clamp(0.0, 1.0);
        t.powf(self.gamma)
    }

    /// Returns the RGBA color of `margin_db`.
    ///
    /// Negative margins are fully transparent. Covered cells range
    /// from dim (alpha 0.1) to 0.65 opacity.
    pub fn shade(&self, margin_db: C) -> [u8; 4] {
        let t = self.intensity(margin_db);
        let [r, g, b] = hot(t);
        let a = if margin_db < 0.0 {
            0
        } else {
            channel(0.1 + 0.55 * t)
        };
        [r, g, b, a]
    }
}
