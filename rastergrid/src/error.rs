use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("raster dimensions must be non-zero, got {0}x{1}")]
    Dimensions(usize, usize),

    #[error("expected {expected} samples, found {actual}")]
    Len { expected: usize, actual: usize },

    #[error("invalid raster file len {0} for {1}")]
    FileLen(u64, PathBuf),

    #[error("scale must be positive and finite, got {0}")]
    Scale(f64),

    #[error("offset must be finite, got {0}")]
    Offset(f64),

    #[error("degenerate raster bounds")]
    Bounds,

    #[error("grids differ in shape or bounds")]
    Mismatch,
}
