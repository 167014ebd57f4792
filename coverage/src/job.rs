use crate::{
    cancel::{Generations, Ticket},
    engine::{Coverage, CoverageRaster, Outcome},
    request::Request,
    CoverageError,
};
use crossbeam_channel::Receiver;
use log::debug;
use propah::terrain::Grids;
use std::{sync::Arc, thread::JoinHandle};

/// A render running on a background thread.
///
/// Each job belongs to one generation of a [`Generations`] tracker.
/// Spawning a newer job cancels this one, and [`CoverageJob::wait`]
/// only yields a raster while the job's generation is current.
pub struct CoverageJob {
    ticket: Ticket,
    generations: Arc<Generations>,
    progress: Receiver<f64>,
    handle: JoinHandle<Result<Outcome, CoverageError>>,
}

impl CoverageJob {
    /// Validates `request` and starts rendering it, superseding any
    /// earlier job of `generations`.
    pub fn spawn(
        grids: Arc<Grids>,
        request: Request,
        generations: Arc<Generations>,
    ) -> Result<Self, CoverageError> {
        request.validate()?;
        let ticket = generations.issue();
        let (tx, progress) = crossbeam_channel::unbounded();
        let token = ticket.token.clone();
        let generation = ticket.generation;
        let handle = std::thread::spawn(move || {
            debug!("job {generation} started");
            Coverage::new(&grids, request)?.render(&tx, &token)
        });
        Ok(Self {
            ticket,
            generations,
            progress,
            handle,
        })
    }

    pub fn generation(&self) -> u64 {
        self.ticket.generation
    }

    /// Progress fractions reported so far.
    pub fn progress(&self) -> &Receiver<f64> {
        &self.progress
    }

    pub fn cancel(&self) {
        self.ticket.token.cancel();
    }

    /// Waits for the render to end.
    ///
    /// Returns `None` when the job was cancelled or superseded.
    pub fn wait(self) -> Result<Option<CoverageRaster>, CoverageError> {
        let outcome = self
            .handle
            .join()
            .map_err(|_| CoverageError::JobPanicked)??;
        let current = !self.ticket.token.is_cancelled()
            && self.generations.is_current(self.ticket.generation);
        match outcome {
            Outcome::Complete(raster) if current => Ok(Some(raster)),
            _ => {
                debug!("job {} discarded", self.ticket.generation);
                Ok(None)
            }
        }
    }
}
