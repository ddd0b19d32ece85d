//! Reference engine implementing the [`crate::simulation::engine::Domain`] contract

pub mod domain;
pub mod forces;
pub mod integrator;
pub mod neighbors;
pub mod output;

pub use domain::DemDomain;
