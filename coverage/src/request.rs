use crate::CoverageError;
use propah::{
    terrain::{geo::Coord, FoliageSpacing, C},
    LinkBudget,
};
use serde::{Deserialize, Serialize};

/// Largest supported output resolution, in cells per axis.
pub const MAX_RESOLUTION: usize = 8_192;

/// How output rows are distributed over threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Render every row on the calling thread.
    Sequential,

    /// Render rows on rayon's global pool.
    #[default]
    Parallel,

    /// Render rows on a dedicated pool of this many threads.
    Threads(usize),
}

/// Parameters of one coverage computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Request {
    /// Transmitter location, in the grids' projected coordinates.
    pub tx: Coord<C>,
    pub freq_ghz: C,
    /// Transmit antenna height above ground.
    pub tx_alt_m: C,
    /// Receive antenna height above ground.
    pub rx_alt_m: C,
    pub tx_power_dbm: C,
    /// Receiver sensitivity.
    pub rx_threshold_dbm: C,
    /// Fade margin added to every link.
    pub reliability_db: C,
    /// Ray-march step length.
    pub step_m: C,
    /// Output cells per axis.
    pub resolution: usize,
    /// Scales normalized margin before the colormap.
    pub boost: C,
    /// Exponent applied to normalized margin before the colormap.
    pub gamma: C,
    pub foliage_spacing: FoliageSpacing,
    pub execution: ExecutionMode,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            tx: Coord { x: 0.0, y: 0.0 },
            freq_ghz: 0.868,
            tx_alt_m: 2.0,
            rx_alt_m: 1.0,
            tx_power_dbm: 14.0,
            rx_threshold_dbm: -137.0,
            reliability_db: 0.0,
            step_m: 10.0,
            resolution: 256,
            boost: 1.0,
            gamma: 0.7,
            foliage_spacing: FoliageSpacing::Nominal,
            execution: ExecutionMode::Parallel,
        }
    }
}

impl Request {
    /// Checks every field, failing on the first malformed one.
    pub fn validate(&self) -> Result<(), CoverageError> {
        for (name, value) in [("freq_ghz", self.freq_ghz), ("step_m", self.step_m)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CoverageError::NotPositive(name, value));
            }
        }
        for (name, value) in [
            ("tx.x", self.tx.x),
            ("tx.y", self.tx.y),
            ("tx_alt_m", self.tx_alt_m),
            ("rx_alt_m", self.rx_alt_m),
            ("tx_power_dbm", self.tx_power_dbm),
            ("rx_threshold_dbm", self.rx_threshold_dbm),
            ("reliability_db", self.reliability_db),
            ("boost", self.boost),
            ("gamma", self.gamma),
        ] {
            if !value.is_finite() {
                return Err(CoverageError::NotFinite(name, value));
            }
        }
        if self.resolution == 0 || self.resolution > MAX_RESOLUTION {
            return Err(CoverageError::Resolution(self.resolution));
        }
        if self.execution == ExecutionMode::Threads(0) {
            return Err(CoverageError::Threads);
        }
        Ok(())
    }

    pub fn budget(&self) -> LinkBudget {
        LinkBudget {
            freq_ghz: self.freq_ghz,
            tx_power_dbm: self.tx_power_dbm,
            rx_threshold_dbm: self.rx_threshold_dbm,
            reliability_db: self.reliability_db,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExecutionMode, Request};
    use crate::CoverageError;

    #[test]
    fn test_defaults() {
        let request = Request::default();
        assert!(request.validate().is_ok());
        assert_eq!(request.budget().max_allowed_loss_db(), 151.0);
        assert_eq!(request.resolution, 256);
        assert_eq!(request.gamma, 0.7);
    }

    #[test]
    fn test_rejects_malformed() {
        let bad = [
            Request {
                freq_ghz: 0.0,
                ..Default::default()
            },
            Request {
                step_m: -10.0,
                ..Default::default()
            },
            Request {
                gamma: f64::NAN,
                ..Default::default()
            },
            Request {
                resolution: 0,
                ..Default::default()
            },
            Request {
                execution: ExecutionMode::Threads(0),
                ..Default::default()
            },
        ];
        for request in bad {
            assert!(request.validate().is_err(), "{request:?}");
        }
        assert!(matches!(
            Request {
                step_m: f64::INFINITY,
                ..Default::default()
            }
            .validate(),
            Err(CoverageError::NotPositive("step_m", _))
        ));
    }

    #[test]
    fn test_deserialize_partial() {
        let request: Request = serde_json::from_str(
            r#"{"tx": {"x": 100.0, "y": 200.0}, "freq_ghz": 2.4, "execution": {"threads": 4}}"#,
        )
        .unwrap();
        assert_eq!(request.tx.x, 100.0);
        assert_eq!(request.freq_ghz, 2.4);
        assert_eq!(request.execution, ExecutionMode::Threads(4));
        assert_eq!(request.step_m, 10.0);
    }
}
