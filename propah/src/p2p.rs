use crate::{
    budget::{LinkBudget, LinkMargin},
    diffraction::deygout_loss,
    error::PropahError,
    fresnel::{freq_to_wavelen, fresnel_radius},
};
use log::debug;
use terrain::{
    geo::Coord, FoliageSpacing, FoliageTable, Grids, Profile, ProfilePoint, Trace, C,
};

/// Point to point propagation estimate.
#[derive(Debug, Clone)]
pub struct Point2Point {
    /// Distance from `start` of every following sample.
    pub distances_m: Vec<C>,

    /// Terrain elevation at each sample, plus antenna heights at the
    /// ends.
    pub terrain_elev_m: Vec<C>,

    /// A straight line from the first to the last sample.
    pub los_elev_m: Vec<C>,

    /// First fresnel zone radius at each sample.
    pub fresnel_zone_m: Vec<C>,

    /// Planar distance from `start` to `end`.
    pub distance_m: C,

    pub diffraction_loss_db: C,

    pub foliage_loss_db: C,

    pub margin: LinkMargin,
}

impl Point2Point {
    pub fn builder() -> Point2PointBuilder {
        Point2PointBuilder {
            freq_ghz: None,
            start: None,
            step_size_m: None,
            end: None,
            start_alt_m: 0.0,
            end_alt_m: 0.0,
            tx_power_dbm: 14.0,
            rx_threshold_dbm: -137.0,
            reliability_db: 0.0,
            foliage_spacing: FoliageSpacing::Nominal,
        }
    }

    /// Returns the profile samples.
    pub fn points(&self) -> impl Iterator<Item = ProfilePoint> + '_ {
        self.distances_m
            .iter()
            .zip(self.terrain_elev_m.iter())
            .map(|(&distance_m, &height_m)| ProfilePoint {
                distance_m,
                height_m,
            })
    }
}

pub struct Point2PointBuilder {
    /// Transmitter frequency (required).
    freq_ghz: Option<C>,

    /// Start point of the path (required).
    start: Option<Coord<C>>,

    /// Distance between samples (required).
    step_size_m: Option<C>,

    /// End point of the path (required).
    end: Option<Coord<C>>,

    /// Starting altitude above ground (meters, defaults to 0).
    start_alt_m: C,

    /// Ending altitude above ground (meters, defaults to 0).
    end_alt_m: C,

    tx_power_dbm: C,

    rx_threshold_dbm: C,

    reliability_db: C,

    foliage_spacing: FoliageSpacing,
}

impl Point2PointBuilder {
    /// Frequency of signal (GHz, required).
    #[must_use]
    pub fn freq(mut self, freq_ghz: C) -> Self {
        self.freq_ghz = Some(freq_ghz);
        self
    }

    /// Start point of the path (required).
    #[must_use]
    pub fn start(mut self, coord: Coord<C>) -> Self {
        self.start = Some(coord);
        self
    }

    /// Starting altitude above ground (meters, defaults to 0).
    #[must_use]
    pub fn start_alt(mut self, meters: C) -> Self {
        self.start_alt_m = meters;
        self
    }

    /// Distance between samples (required).
    #[must_use]
    pub fn step_size(mut self, meters: C) -> Self {
        self.step_size_m = Some(meters);
        self
    }

    /// End point of the path (required).
    #[must_use]
    pub fn end(mut self, coord: Coord<C>) -> Self {
        self.end = Some(coord);
        self
    }

    /// Ending altitude above ground (meters, defaults to 0).
    #[must_use]
    pub fn end_alt(mut self, meters: C) -> Self {
        self.end_alt_m = meters;
        self
    }

    /// Transmit power (dBm, defaults to 14).
    #[must_use]
    pub fn tx_power(mut self, dbm: C) -> Self {
        self.tx_power_dbm = dbm;
        self
    }

    /// Receiver sensitivity (dBm, defaults to -137).
    #[must_use]
    pub fn rx_threshold(mut self, dbm: C) -> Self {
        self.rx_threshold_dbm = dbm;
        self
    }

    /// Fade margin added to the path loss (dB, defaults to 0).
    #[must_use]
    pub fn reliability(mut self, db: C) -> Self {
        self.reliability_db = db;
        self
    }

    /// How foliage loss is integrated (defaults to
    /// [`FoliageSpacing::Nominal`]).
    #[must_use]
    pub fn foliage_spacing(mut self, spacing: FoliageSpacing) -> Self {
        self.foliage_spacing = spacing;
        self
    }

    pub fn build(&self, grids: &Grids) -> Result<Point2Point, PropahError> {
        let freq_ghz = self.freq_ghz.ok_or(PropahError::Builder("freq"))?;
        let start = self.start.ok_or(PropahError::Builder("start"))?;
        let step_size_m = self.step_size_m.ok_or(PropahError::Builder("step_size"))?;
        let end = self.end.ok_or(PropahError::Builder("end"))?;

        let foliage = FoliageTable::new(freq_ghz, grids.canopy())?;
        let trace = Profile::builder()
            .start(start)
            .start_alt(self.start_alt_m)
            .step_size(step_size_m)
            .end(end)
            .end_alt(self.end_alt_m)
            .foliage(&foliage)
            .foliage_spacing(self.foliage_spacing)
            .build(grids)?;

        let Profile {
            distance_m,
            points,
            foliage_loss_db,
            ..
        } = match trace {
            Trace::Coincident => return Err(PropahError::Coincident),
            Trace::Path(profile) if !profile.is_scorable() => {
                return Err(PropahError::NoProfile(profile.points.len()))
            }
            Trace::Path(profile) => profile,
        };

        let wavelen = freq_to_wavelen(freq_ghz);
        let diffraction_loss_db = deygout_loss(&points, wavelen);
        let margin = LinkBudget {
            freq_ghz,
            tx_power_dbm: self.tx_power_dbm,
            rx_threshold_dbm: self.rx_threshold_dbm,
            reliability_db: self.reliability_db,
        }
        .evaluate(distance_m, diffraction_loss_db, foliage_loss_db);

        // Scorable profiles have at least two points.
        let (first, last) = (points[0], points[points.len() - 1]);
        let span_m = last.distance_m - first.distance_m;
        let rise_m = last.height_m - first.height_m;
        let los_elev_m = points
            .iter()
            .map(|p| first.height_m + rise_m * (p.distance_m - first.distance_m) / span_m)
            .collect();
        let fresnel_zone_m = points
            .iter()
            .map(|p| {
                let d1 = p.distance_m - first.distance_m;
                fresnel_radius(1.0, wavelen, d1, span_m - d1)
            })
            .collect();

        debug!(
            "p2p; distance: {distance_m}, diffraction_db: {diffraction_loss_db}, \
             foliage_db: {foliage_loss_db}, margin_db: {}",
            margin.margin_db
        );

        Ok(Point2Point {
            distances_m: points.iter().map(|p| p.distance_m).collect(),
            terrain_elev_m: points.iter().map(|p| p.height_m).collect(),
            los_elev_m,
            fresnel_zone_m,
            distance_m,
            diffraction_loss_db,
            foliage_loss_db,
            margin,
        })
    }
}
