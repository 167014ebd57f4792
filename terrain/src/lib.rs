mod error;
pub mod foliage;
mod math;
mod profile;

pub use crate::{
    error::TerrainError,
    foliage::FoliageTable,
    profile::{FoliageSpacing, Profile, ProfileBuilder, ProfilePoint, Trace, MAX_STEPS},
};
pub use rastergrid::{self, geo, Grids, C};
