use serde::{Deserialize, Serialize};
use terrain::C;

/// Returns free space path loss (dB) over `distance_m` at `freq_ghz`.
///
/// Both arguments must be positive.
#[inline]
pub fn fspl_db(freq_ghz: C, distance_m: C) -> C {
    32.44 + 20.0 * (freq_ghz * 1e3).log10() + 20.0 * (distance_m / 1e3).log10()
}

/// Radio parameters of a link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkBudget {
    pub freq_ghz: C,
    pub tx_power_dbm: C,
    /// Receiver sensitivity.
    pub rx_threshold_dbm: C,
    /// Extra loss budgeted for fading.
    pub reliability_db: C,
}

/// Loss and margin of a single link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkMargin {
    pub fspl_db: C,
    /// Free space, diffraction, foliage and reliability losses.
    pub total_loss_db: C,
    pub rx_dbm: C,
    /// Received power above the receiver threshold.
    pub margin_db: C,
}

impl LinkBudget {
    /// Returns the largest possible margin, `tx_power - rx_threshold`.
    pub fn max_allowed_loss_db(&self) -> C {
        self.tx_power_dbm - self.rx_threshold_dbm
    }

    /// Returns the margin over `distance_m` given the profile's
    /// diffraction and foliage losses.
    #[inline]
    pub fn evaluate(&self, distance_m: C, diffraction_db: C, foliage_db: C) -> LinkMargin {
        let fspl_db = fspl_db(self.freq_ghz, distance_m);
        let total_loss_db = fspl_db + diffraction_db + foliage_db + self.reliability_db;
        let rx_dbm = self.tx_power_dbm - total_loss_db;
        LinkMargin {
            fspl_db,
            total_loss_db,
            rx_dbm,
            margin_db: rx_dbm - self.rx_threshold_dbm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{fspl_db, LinkBudget};
    use approx::assert_relative_eq;

    const BUDGET: LinkBudget = LinkBudget {
        freq_ghz: 0.868,
        tx_power_dbm: 14.0,
        rx_threshold_dbm: -137.0,
        reliability_db: 0.0,
    };

    #[test]
    fn test_fspl() {
        assert_relative_eq!(fspl_db(1.0, 1_000.0), 32.44 + 60.0, epsilon = 1e-9);
        assert_relative_eq!(fspl_db(0.868, 5_000.0), 105.19, epsilon = 0.01);
        // Doubling distance costs 6 dB.
        assert_relative_eq!(
            fspl_db(2.4, 2_000.0) - fspl_db(2.4, 1_000.0),
            20.0 * 2.0_f64.log10(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_flat_5km_is_covered() {
        let margin = BUDGET.evaluate(5_000.0, 0.0, 0.0);
        assert_relative_eq!(margin.fspl_db, 105.19, epsilon = 0.01);
        assert_relative_eq!(margin.total_loss_db, margin.fspl_db, epsilon = 1e-9);
        assert_relative_eq!(margin.rx_dbm, 14.0 - margin.fspl_db, epsilon = 1e-9);
        assert_relative_eq!(margin.margin_db, 151.0 - margin.fspl_db, epsilon = 1e-9);
        assert!(margin.margin_db > 0.0);
    }

    #[test]
    fn test_losses_reduce_margin() {
        let clear = BUDGET.evaluate(2_000.0, 0.0, 0.0);
        let lossy = LinkBudget {
            reliability_db: 10.0,
            ..BUDGET
        }
        .evaluate(2_000.0, 27.4, 3.5);
        assert_relative_eq!(clear.margin_db - lossy.margin_db, 40.9, epsilon = 1e-9);
        assert_eq!(BUDGET.max_allowed_loss_db(), 151.0);
    }
}
