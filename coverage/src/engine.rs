use crate::{
    cancel::CancelToken,
    colormap::{Shader, NO_DATA, SELF_CELL},
    progress::{ProgressSink, RowProgress},
    request::{ExecutionMode, Request},
    CoverageError,
};
use log::{debug, info};
use propah::{
    deygout_loss,
    fresnel::freq_to_wavelen,
    terrain::{
        geo::{Coord, Rect},
        FoliageTable, Grids, Profile, TerrainError, Trace, C, MAX_STEPS,
    },
    LinkBudget, LinkMargin,
};
use rayon::prelude::*;
use std::time::Instant;

/// Bytes per output cell.
const RGBA: usize = 4;

/// The result of evaluating one output cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    /// The cell is the transmitter's location.
    Coincident,

    /// Fewer than two profile points had terrain data.
    NoData,

    Margin(LinkMargin),
}

/// A rendered coverage map.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageRaster {
    /// Cells per axis.
    pub resolution: usize,

    /// Row-major RGBA bytes, row 0 at the northern edge.
    pub rgba: Vec<u8>,

    /// `tx_power - rx_threshold`, for legend scaling.
    pub max_a: C,

    /// Projected extent covered by `rgba`.
    pub bounds: Rect<C>,
}

/// How a render ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Complete(CoverageRaster),

    /// The cancel token fired. Nothing partial is kept.
    Cancelled,
}

enum Halt {
    Cancelled,
    Failed(CoverageError),
}

impl From<CoverageError> for Halt {
    fn from(e: CoverageError) -> Self {
        Self::Failed(e)
    }
}

/// Coverage of one transmitter over shared terrain and canopy grids.
pub struct Coverage<'a> {
    grids: &'a Grids,
    request: Request,
    foliage: FoliageTable,
    budget: LinkBudget,
    shader: Shader,
    wavelength_m: C,
}

impl<'a> Coverage<'a> {
    /// Validates `request` and prepares per-request tables.
    ///
    /// Fails if tracing to the farthest corner of `grids` would exceed
    /// [`MAX_STEPS`].
    #[allow(clippy::cast_precision_loss)]
    pub fn new(grids: &'a Grids, request: Request) -> Result<Self, CoverageError> {
        request.validate()?;
        let reach_m = farthest_corner_m(request.tx, grids.bounds());
        if !((reach_m / request.step_m).floor() <= MAX_STEPS as C) {
            return Err(TerrainError::Steps(reach_m, request.step_m).into());
        }
        let now = Instant::now();
        let foliage = FoliageTable::new(request.freq_ghz, grids.canopy())?;
        debug!("foliage table; freq_ghz: {}, exec: {:?}", request.freq_ghz, now.elapsed());
        let budget = request.budget();
        Ok(Self {
            grids,
            request,
            foliage,
            budget,
            shader: Shader::new(budget.max_allowed_loss_db(), request.boost, request.gamma),
            wavelength_m: freq_to_wavelen(request.freq_ghz),
        })
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the projected center of output cell (`col`, `row`).
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_center(&self, col: usize, row: usize) -> Coord<C> {
        let bounds = self.grids.bounds();
        let res = self.request.resolution as C;
        Coord {
            x: bounds.min().x + (col as C + 0.5) * bounds.width() / res,
            y: bounds.max().y - (row as C + 0.5) * bounds.height() / res,
        }
    }

    /// Traces and scores the link from the transmitter to `target`.
    pub fn evaluate(&self, target: Coord<C>) -> Result<Cell, CoverageError> {
        let trace = Profile::builder()
            .start(self.request.tx)
            .start_alt(self.request.tx_alt_m)
            .end(target)
            .end_alt(self.request.rx_alt_m)
            .step_size(self.request.step_m)
            .foliage(&self.foliage)
            .foliage_spacing(self.request.foliage_spacing)
            .build(self.grids)?;
        Ok(match trace {
            Trace::Coincident => Cell::Coincident,
            Trace::Path(profile) if !profile.is_scorable() => Cell::NoData,
            Trace::Path(profile) => {
                let diffraction_db = deygout_loss(&profile.points, self.wavelength_m);
                Cell::Margin(self.budget.evaluate(
                    profile.distance_m,
                    diffraction_db,
                    profile.foliage_loss_db,
                ))
            }
        })
    }

    /// Returns the display color of `cell`.
    pub fn color(&self, cell: Cell) -> [u8; 4] {
        match cell {
            Cell::Coincident => SELF_CELL,
            Cell::NoData => NO_DATA,
            Cell::Margin(margin) => self.shader.shade(margin.margin_db),
        }
    }

    /// Renders every output cell.
    ///
    /// `cancel` is polled before each row. Progress is reported after
    /// each row, ending with 1.0 unless cancelled.
    pub fn render<P>(&self, progress: &P, cancel: &CancelToken) -> Result<Outcome, CoverageError>
    where
        P: ProgressSink + ?Sized,
    {
        let now = Instant::now();
        let res = self.request.resolution;
        let row_len = res * RGBA;
        let mut rgba = vec![0_u8; res * row_len];
        let rows = RowProgress::new(progress, res);
        let render_row = |(row, pixels): (usize, &mut [u8])| self.render_row(row, pixels, cancel, &rows);

        let result = match self.request.execution {
            ExecutionMode::Sequential => rgba.chunks_mut(row_len).enumerate().try_for_each(render_row),
            ExecutionMode::Parallel => rgba
                .par_chunks_mut(row_len)
                .enumerate()
                .try_for_each(render_row),
            ExecutionMode::Threads(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()?
                .install(|| {
                    rgba.par_chunks_mut(row_len)
                        .enumerate()
                        .try_for_each(render_row)
                }),
        };

        match result {
            Ok(()) if !cancel.is_cancelled() => {
                rows.finish();
                info!(
                    "render; tx: ({}, {}), resolution: {res}, mode: {:?}, exec: {:?}",
                    self.request.tx.x,
                    self.request.tx.y,
                    self.request.execution,
                    now.elapsed()
                );
                Ok(Outcome::Complete(CoverageRaster {
                    resolution: res,
                    rgba,
                    max_a: self.budget.max_allowed_loss_db(),
                    bounds: self.grids.bounds(),
                }))
            }
            Ok(()) | Err(Halt::Cancelled) => {
                info!("render cancelled after {:?}", now.elapsed());
                Ok(Outcome::Cancelled)
            }
            Err(Halt::Failed(e)) => Err(e),
        }
    }
}

/// Private API
impl<'a> Coverage<'a> {
    fn render_row<P>(
        &self,
        row: usize,
        pixels: &mut [u8],
        cancel: &CancelToken,
        progress: &RowProgress<'_, P>,
    ) -> Result<(), Halt>
    where
        P: ProgressSink + ?Sized,
    {
        if cancel.is_cancelled() {
            return Err(Halt::Cancelled);
        }
        for (col, pixel) in pixels.chunks_exact_mut(RGBA).enumerate() {
            let cell = self.evaluate(self.cell_center(col, row))?;
            pixel.copy_from_slice(&self.color(cell));
        }
        progress.row_done();
        Ok(())
    }
}

fn farthest_corner_m(from: Coord<C>, bounds: Rect<C>) -> C {
    let (min, max) = (bounds.min(), bounds.max());
    let dx = (from.x - min.x).abs().max((from.x - max.x).abs());
    let dy = (from.y - min.y).abs().max((from.y - max.y).abs());
    dx.hypot(dy)
}
