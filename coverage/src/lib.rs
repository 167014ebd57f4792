//! # Coverage
//!
//! Renders the link margin from one transmitter to every cell of a
//! square raster laid over terrain and canopy grids. Rows render in
//! parallel, report progress as they finish, and stop early when
//! cancelled.

pub mod cancel;
pub mod colormap;
mod engine;
mod error;
pub mod job;
pub mod progress;
mod request;

pub use {
    crate::{
        cancel::{CancelToken, Generations},
        engine::{Cell, Coverage, CoverageRaster, Outcome},
        error::CoverageError,
        job::CoverageJob,
        progress::ProgressSink,
        request::{ExecutionMode, Request, MAX_RESOLUTION},
    },
    propah,
};
