use propah::terrain::TerrainError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("invalid request: {0} must be positive and finite, got {1}")]
    NotPositive(&'static str, f64),

    #[error("invalid request: {0} must be finite, got {1}")]
    NotFinite(&'static str, f64),

    #[error("invalid request: resolution {0} is out of range")]
    Resolution(usize),

    #[error("invalid request: thread count must be at least 1")]
    Threads,

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("coverage job panicked")]
    JobPanicked,

    #[error("{0}")]
    Terrain(#[from] TerrainError),
}
