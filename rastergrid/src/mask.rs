use crate::GridError;

/// Per-sample usability flags for a raster lattice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityMask {
    width: usize,
    height: usize,
    cells: Box<[bool]>,
}

impl ValidityMask {
    /// Returns a mask over a `width × height` lattice, row-major from
    /// the north-west corner.
    pub fn new(width: usize, height: usize, cells: Vec<bool>) -> Result<Self, GridError> {
        if cells.len() == width * height {
            Ok(Self {
                width,
                height,
                cells: cells.into_boxed_slice(),
            })
        } else {
            Err(GridError::Len {
                expected: width * height,
                actual: cells.len(),
            })
        }
    }

    /// Returns a mask from one byte per sample, where any non-zero
    /// byte marks a valid sample.
    pub fn from_bytes(width: usize, height: usize, bytes: &[u8]) -> Result<Self, GridError> {
        Self::new(width, height, bytes.iter().map(|&b| b != 0).collect())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns whether the sample at linear index `idx` is usable.
    ///
    /// Indices outside the lattice are never valid.
    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        self.cells.get(idx).copied().unwrap_or(false)
    }
}
