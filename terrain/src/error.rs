use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("step size must be positive and finite, got {0} m")]
    StepSize(f64),

    #[error("{0} m in steps of {1} m exceeds the step limit")]
    Steps(f64, f64),

    #[error("frequency must be positive and finite, got {0} GHz")]
    Frequency(f64),
}
