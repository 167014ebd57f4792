//! # Radio Frequency Propagation
//!
//! `propah` scores terrain profiles: Deygout multiple knife-edge
//! diffraction, free space path loss, and the resulting link margin.

pub mod budget;
pub mod diffraction;
mod error;
pub mod fresnel;
pub mod p2p;

pub use {
    crate::{
        budget::{fspl_db, LinkBudget, LinkMargin},
        diffraction::{deygout_loss, knife_edge_loss},
        error::PropahError,
        p2p::Point2Point,
    },
    terrain,
};
