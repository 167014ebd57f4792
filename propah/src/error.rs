use terrain::TerrainError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PropahError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("start and end are the same location")]
    Coincident,

    #[error("fewer than two usable profile points, got {0}")]
    NoProfile(usize),

    #[error("{0}")]
    Terrain(#[from] TerrainError),
}
