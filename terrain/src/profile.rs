use crate::{math::linspace, FoliageTable, TerrainError, C};
use geo::{
    algorithm::EuclideanDistance,
    geometry::{Coord, Point},
};
use log::trace;
use rastergrid::Grids;
use serde::{Deserialize, Serialize};

/// Most steps a single profile may take.
pub const MAX_STEPS: usize = 1 << 20;

/// A single sample along a profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilePoint {
    /// Distance from the start of the profile (meters).
    pub distance_m: C,

    /// Terrain elevation, plus antenna height at either end (meters).
    pub height_m: C,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Total distance from `start` to `end` in meters.
    pub distance_m: C,

    /// Distance between consecutive steps in meters.
    pub step_m: C,

    /// Number of steps marched from `start` to `end`.
    pub steps: usize,

    /// Samples in increasing distance. Positions without terrain data
    /// are absent, so this may hold fewer than `steps + 1` points.
    pub points: Vec<ProfilePoint>,

    /// Foliage loss accumulated along the path (dB).
    pub foliage_loss_db: C,
}

/// The outcome of tracing from `start` to `end`.
#[derive(Debug, Clone, PartialEq)]
pub enum Trace {
    /// `start` and `end` are the same location.
    Coincident,

    /// A profile between two distinct locations.
    Path(Profile),
}

/// Path length credited to each canopy sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoliageSpacing {
    /// The requested step size, even when the marched steps are
    /// longer.
    #[default]
    Nominal,

    /// The marched step size, `distance / steps`.
    Actual,
}

impl Profile {
    pub fn builder<'a>() -> ProfileBuilder<'a> {
        ProfileBuilder {
            start: None,
            end: None,
            step_size_m: None,
            start_alt_m: 0.0,
            end_alt_m: 0.0,
            foliage: None,
            foliage_spacing: FoliageSpacing::Nominal,
        }
    }

    /// Returns `true` if there are enough points to score this
    /// profile.
    pub fn is_scorable(&self) -> bool {
        self.points.len() >= 2
    }
}

pub struct ProfileBuilder<'a> {
    start: Option<Coord<C>>,

    end: Option<Coord<C>>,

    /// Requested distance between samples.
    step_size_m: Option<C>,

    /// Starting altitude above ground (meters).
    start_alt_m: C,

    /// Ending altitude above ground (meters).
    end_alt_m: C,

    /// Canopy attenuation lookup. Foliage is ignored when absent.
    foliage: Option<&'a FoliageTable>,

    foliage_spacing: FoliageSpacing,
}

impl<'a> ProfileBuilder<'a> {
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

    /// Requested distance between samples (required).
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

    /// Accumulate foliage loss using `table`.
    #[must_use]
    pub fn foliage(mut self, table: &'a FoliageTable) -> Self {
        self.foliage = Some(table);
        self
    }

    /// Path length credited to each canopy sample (defaults to
    /// [`FoliageSpacing::Nominal`]).
    #[must_use]
    pub fn foliage_spacing(mut self, spacing: FoliageSpacing) -> Self {
        self.foliage_spacing = spacing;
        self
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn build(&self, grids: &Grids) -> Result<Trace, TerrainError> {
        let start = self.start.ok_or(TerrainError::Builder("start"))?;
        let end = self.end.ok_or(TerrainError::Builder("end"))?;
        let step_size_m = self.step_size_m.ok_or(TerrainError::Builder("step_size"))?;
        if !(step_size_m.is_finite() && step_size_m > 0.0) {
            return Err(TerrainError::StepSize(step_size_m));
        }

        let distance_m = Point::from(start).euclidean_distance(&Point::from(end));
        if distance_m == 0.0 {
            return Ok(Trace::Coincident);
        }

        let steps = (distance_m / step_size_m).floor();
        // Also rejects NaN and infinite distances before the cast.
        if !(steps <= MAX_STEPS as C) {
            return Err(TerrainError::Steps(distance_m, step_size_m));
        }
        let steps = (steps as usize).max(1);
        let step_m = distance_m / steps as C;
        let foliage_step_km = match self.foliage_spacing {
            FoliageSpacing::Nominal => step_size_m,
            FoliageSpacing::Actual => step_m,
        } / 1000.0;

        let mut points = Vec::with_capacity(steps + 1);
        let mut foliage_loss_db = 0.0;
        let xs = linspace(start.x, end.x, steps + 1);
        let ys = linspace(start.y, end.y, steps + 1);
        for (step, (x, y)) in xs.zip(ys).enumerate() {
            // Missing samples are skipped rather than failing the
            // whole profile, and contribute no foliage.
            let Some(footprint) = grids.footprint(Coord { x, y }) else {
                continue;
            };

            let antenna_m = if step == 0 {
                self.start_alt_m
            } else if step == steps {
                self.end_alt_m
            } else {
                0.0
            };
            points.push(ProfilePoint {
                distance_m: step as C * step_m,
                height_m: grids.terrain().interpolate(&footprint) + antenna_m,
            });

            if let Some(table) = self.foliage.filter(|_| step > 0) {
                foliage_loss_db += table.at(grids.canopy(), &footprint) * foliage_step_km;
            }
        }

        trace!(
            "profile; distance: {distance_m}, steps: {steps}, points: {}, foliage_db: {foliage_loss_db}",
            points.len()
        );

        Ok(Trace::Path(Profile {
            distance_m,
            step_m,
            steps,
            points,
            foliage_loss_db,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::{FoliageSpacing, Profile, ProfilePoint, Trace};
    use crate::{foliage::specific_attenuation, FoliageTable, TerrainError};
    use approx::assert_relative_eq;
    use rastergrid::{
        geo::{coord, Coord, Rect},
        Grids, RasterGrid, ValidityMask,
    };

    /// 100 x 100 cells of 10 m over [0, 1000] x [0, 1000], flat terrain
    /// at 25 m and uniform canopy of `canopy_m`.
    fn flat(canopy_m: f64, mask: Option<ValidityMask>) -> Grids {
        let bounds = Rect::new(coord!(x: 0.0, y: 0.0), coord!(x: 1_000.0, y: 1_000.0));
        let terrain = RasterGrid::new(100, 100, bounds, 0.5, 0.0, vec![50; 10_000]).unwrap();
        let code = (canopy_m / 0.25).round() as u16;
        let canopy = RasterGrid::new(100, 100, bounds, 0.25, 0.0, vec![code; 10_000]).unwrap();
        Grids::new(terrain, canopy, mask).unwrap()
    }

    fn path(trace: Trace) -> Profile {
        match trace {
            Trace::Path(profile) => profile,
            Trace::Coincident => panic!("expected a path"),
        }
    }

    const TX: Coord = Coord { x: 200.0, y: 500.0 };

    #[test]
    fn test_missing_params() {
        let grids = flat(0.0, None);
        assert!(matches!(
            Profile::builder().end(TX).step_size(10.0).build(&grids),
            Err(TerrainError::Builder("start"))
        ));
        assert!(matches!(
            Profile::builder().start(TX).end(TX).build(&grids),
            Err(TerrainError::Builder("step_size"))
        ));
        assert!(matches!(
            Profile::builder()
                .start(TX)
                .end(TX)
                .step_size(0.0)
                .build(&grids),
            Err(TerrainError::StepSize(_))
        ));
    }

    #[test]
    fn test_rejects_unbounded_step_count() {
        let grids = flat(0.0, None);
        // 1e30 m away.
        assert!(matches!(
            Profile::builder()
                .start(TX)
                .end(coord!(x: 1e30, y: 500.0))
                .step_size(10.0)
                .build(&grids),
            Err(TerrainError::Steps(_, _))
        ));
        // 300 m in micrometer steps.
        assert!(matches!(
            Profile::builder()
                .start(TX)
                .end(coord!(x: 500.0, y: 500.0))
                .step_size(1e-6)
                .build(&grids),
            Err(TerrainError::Steps(_, _))
        ));
        assert!(matches!(
            Profile::builder()
                .start(TX)
                .end(coord!(x: f64::MAX, y: f64::MAX))
                .step_size(10.0)
                .build(&grids),
            Err(TerrainError::Steps(_, _))
        ));
    }

    #[test]
    fn test_far_target_within_step_limit() {
        let grids = flat(0.0, None);
        // 100 km east; only the first 80 samples land on the grid.
        let profile = path(
            Profile::builder()
                .start(TX)
                .end(coord!(x: 100_200.0, y: 500.0))
                .step_size(10.0)
                .build(&grids)
                .unwrap(),
        );
        assert_eq!(profile.steps, 10_000);
        assert_eq!(profile.points.len(), 80);
    }

    #[test]
    fn test_coincident() {
        let grids = flat(0.0, None);
        let trace = Profile::builder()
            .start(TX)
            .end(TX)
            .step_size(10.0)
            .build(&grids)
            .unwrap();
        assert_eq!(trace, Trace::Coincident);
    }

    #[test]
    fn test_flat_profile() {
        let grids = flat(0.0, None);
        let profile = path(
            Profile::builder()
                .start(TX)
                .start_alt(12.0)
                .end(coord!(x: 500.0, y: 500.0))
                .end_alt(1.5)
                .step_size(10.0)
                .build(&grids)
                .unwrap(),
        );
        assert_eq!(profile.steps, 30);
        assert_eq!(profile.points.len(), 31);
        assert_relative_eq!(profile.distance_m, 300.0);
        assert_relative_eq!(profile.step_m, 10.0);
        assert_eq!(
            profile.points[0],
            ProfilePoint {
                distance_m: 0.0,
                height_m: 37.0
            }
        );
        assert_relative_eq!(profile.points[15].height_m, 25.0);
        assert_relative_eq!(profile.points[15].distance_m, 150.0);
        assert_relative_eq!(profile.points[30].height_m, 26.5);
        assert_relative_eq!(profile.points[30].distance_m, 300.0);
        assert_eq!(profile.foliage_loss_db, 0.0);
    }

    #[test]
    fn test_short_path_takes_one_step() {
        let grids = flat(0.0, None);
        let profile = path(
            Profile::builder()
                .start(TX)
                .end(coord!(x: 203.0, y: 504.0))
                .step_size(10.0)
                .build(&grids)
                .unwrap(),
        );
        assert_eq!(profile.steps, 1);
        assert_eq!(profile.points.len(), 2);
        assert_relative_eq!(profile.step_m, 5.0);
    }

    #[test]
    fn test_skips_samples_outside_grid() {
        let grids = flat(0.0, None);
        // 1000 m east of TX, running 200 m past the eastern edge plus
        // the half-cell band without a full footprint.
        let profile = path(
            Profile::builder()
                .start(TX)
                .end(coord!(x: 1_200.0, y: 500.0))
                .step_size(10.0)
                .build(&grids)
                .unwrap(),
        );
        assert_eq!(profile.steps, 100);
        // Samples at x = 200, 210, ..., 990 have data.
        assert_eq!(profile.points.len(), 80);
        assert!(profile.is_scorable());
        assert_relative_eq!(profile.points.last().unwrap().distance_m, 790.0);
    }

    #[test]
    fn test_skips_masked_samples() {
        let mut valid = vec![true; 10_000];
        // Column 35 (x in [350, 360]) on row 50 (y in [490, 500]).
        valid[50 * 100 + 35] = false;
        let grids = flat(0.0, Some(ValidityMask::new(100, 100, valid).unwrap()));
        let profile = path(
            Profile::builder()
                .start(coord!(x: 200.0, y: 497.0))
                .end(coord!(x: 500.0, y: 497.0))
                .step_size(10.0)
                .build(&grids)
                .unwrap(),
        );
        // x = 350 and x = 360 both have column 35 as a corner.
        assert_eq!(profile.points.len(), 29);
    }

    #[test]
    fn test_foliage_accumulates_per_step() {
        let grids = flat(20.0, None);
        let table = FoliageTable::new(0.868, grids.canopy()).unwrap();
        let per_km = specific_attenuation(0.868, 20.0);

        let build = |spacing| {
            path(
                Profile::builder()
                    .start(TX)
                    .end(coord!(x: 505.0, y: 500.0))
                    .step_size(10.0)
                    .foliage(&table)
                    .foliage_spacing(spacing)
                    .build(&grids)
                    .unwrap(),
            )
        };

        // 305 m in 30 steps of 10.1667 m.
        let nominal = build(FoliageSpacing::Nominal);
        assert_eq!(nominal.steps, 30);
        assert_relative_eq!(nominal.foliage_loss_db, 30.0 * per_km * 0.010, epsilon = 1e-9);

        let actual = build(FoliageSpacing::Actual);
        assert_relative_eq!(actual.foliage_loss_db, per_km * 0.305, epsilon = 1e-9);
        assert!(actual.foliage_loss_db > nominal.foliage_loss_db);
    }
}
