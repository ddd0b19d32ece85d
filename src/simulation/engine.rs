//! Contract of the simulation engine driven by the column pipeline
//!
//! The pipeline never integrates anything itself. It builds and edits the
//! particle set and hands it to a [`Domain`] for packing primitives, critical
//! step estimation, solving and checkpointing.

use std::path::PathBuf;

use super::errors::EngineError;
use super::properties::PropertyTable;
use super::states::{NVec3, ParticleCollection, Tag};

/// Arrangement of a sphere-box packing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SphereArrangement {
    Uniform, // simple cubic lattice
    ClosePacked, // hexagonal close packing
}

/// Irregular-cell packing request.
///
/// `cohesion` and `periodic` describe how the cells were meant to be built.
/// The reference engine only logs them: it builds no bonds and no periodic
/// cell faces.
#[derive(Debug, Clone)]
pub struct IrregularPacking {
    pub tag: Tag,
    pub radius: f64, // spheroradius
    pub footprint: NVec3, // (Lx, Ly, Lz), centred on the origin
    pub divisions: (usize, usize, usize), // cells along x, y, z
    pub density: f64,
    pub cohesion: bool,
    pub periodic: bool,
    pub seed: u64,
    pub fraction: f64,
}

/// Sphere-box packing request
#[derive(Debug, Clone)]
pub struct SpherePacking {
    pub tag: Tag,
    pub min: NVec3,
    pub max: NVec3,
    pub radius: f64,
    pub density: f64,
    pub arrangement: SphereArrangement,
    pub seed: u64,
    pub fraction: f64,
    pub bond_threshold: f64,
}

/// Finite plate, built in the XY plane then rotated by `angle` around `axis`
#[derive(Debug, Clone)]
pub struct PlaneSpec {
    pub tag: Tag,
    pub position: NVec3,
    pub radius: f64, // spheroradius
    pub width: f64, // extent along the local x axis
    pub height: f64, // extent along the local y axis
    pub density: f64,
    pub angle: f64,
    pub axis: NVec3,
}

/// Parameters of one blocking solve call
#[derive(Debug, Clone)]
pub struct SolveRequest {
    pub duration: f64, // simulated time to advance
    pub dt: f64,
    pub dt_out: f64,
    pub prefix: String, // name prefix of the output artifacts
    pub verlet_skin: f64,
    pub threads: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveSummary {
    pub steps: usize,
    pub snapshots: usize,
    pub time: f64, // domain clock after the call
}

/// Simulation engine seen by the pipeline.
///
/// Implementations own the particle collection. All calls are synchronous;
/// [`Domain::solve`] returns only once the requested time was integrated.
pub trait Domain {
    fn particles(&self) -> &ParticleCollection;
    fn particles_mut(&mut self) -> &mut ParticleCollection;

    fn generate_irregular_packing(&mut self, req: &IrregularPacking) -> Result<(), EngineError>;
    fn generate_sphere_packing(&mut self, req: &SpherePacking) -> Result<(), EngineError>;
    fn add_cube(&mut self, tag: Tag, position: NVec3, radius: f64, edge: f64, density: f64) -> Result<(), EngineError>;
    fn add_plane(&mut self, plane: &PlaneSpec) -> Result<(), EngineError>;

    /// Largest stable explicit step for the current stiffness and masses
    fn critical_dt(&self) -> Result<f64, EngineError>;

    fn solve(&mut self, req: &SolveRequest) -> Result<SolveSummary, EngineError>;

    /// Persist the full state under `name`, returns where it went
    fn save_checkpoint(&self, name: &str) -> Result<PathBuf, EngineError>;

    /// Make every particle of `tag` immovable
    fn fix_motion(&mut self, tag: Tag) -> Result<(), EngineError> {
        let mut found = false;
        for p in self.particles_mut().iter_mut().filter(|p| p.tag == tag) {
            p.fixed = true;
            p.v = NVec3::zeros();
            found = true;
        }
        if found { Ok(()) } else { Err(EngineError::UnknownTag(tag)) }
    }

    fn delete_by_tags(&mut self, tags: &[Tag]) -> usize {
        self.particles_mut().delete_tags(tags)
    }

    fn bounding_box(&self) -> Option<(NVec3, NVec3)> {
        self.particles().bounding_box()
    }

    /// Copy the table's bundles into matching particles, returns how many were touched
    fn assign_properties(&mut self, table: &PropertyTable) -> usize {
        table.apply(self.particles_mut())
    }
}
