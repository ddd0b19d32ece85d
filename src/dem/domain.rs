//! Reference discrete-element domain
//!
//! `DemDomain` implements the [`Domain`] contract with a small
//! engine: spherical contact envelopes, translational velocity–Verlet, Verlet
//! lists and rayon-parallel pair forces. Output goes to `out_dir`.

use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use log::{debug, info};
use nalgebra::{Rotation3, Unit};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

use crate::simulation::engine::{
    Domain, IrregularPacking, PlaneSpec, SolveRequest, SolveSummary, SphereArrangement, SpherePacking,
};
use crate::simulation::errors::EngineError;
use crate::simulation::states::{NVec3, Particle, ParticleCollection, Shape, Tag};

use super::integrator::{accumulate_forces, verlet_step};
use super::neighbors::VerletList;
use super::output::{read_checkpoint, write_checkpoint, write_snapshot, Checkpoint};

/// Scale of the inscribed envelope of an irregular cell, relative to the smallest cell edge
pub const CELL_ENVELOPE: f64 = 0.3;
/// Maximum jitter of an irregular cell centre, relative to the smallest cell edge
pub const CELL_JITTER: f64 = 0.2;

pub struct DemDomain {
    particles: ParticleCollection,
    time: f64,
    out_dir: PathBuf,
    list: VerletList,
}

impl DemDomain {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            particles: ParticleCollection::new(),
            time: 0.0,
            out_dir: out_dir.into(),
            list: VerletList::new(),
        }
    }

    /// Restore a domain saved with [`Domain::save_checkpoint`]
    pub fn load_checkpoint(path: &Path, out_dir: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let checkpoint = read_checkpoint(path)?;
        let mut domain = Self::new(out_dir);
        domain.particles = checkpoint.particles;
        domain.time = checkpoint.time;
        info!("restored {} particles at t = {:.4}", domain.particles.len(), domain.time);
        Ok(domain)
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    fn push_grain(&mut self, tag: Tag, shape: Shape, x: NVec3, m: f64) {
        self.particles.push(Particle::new(tag, shape, x, m));
    }
}

/// Volume of a cube of edge `l` dilated by a sphere of radius `r`
fn sphero_cube_volume(l: f64, r: f64) -> f64 {
    l * l * l + 6.0 * l * l * r + 3.0 * PI * l * r * r + 4.0 / 3.0 * PI * r * r * r
}

fn sphere_volume(r: f64) -> f64 {
    4.0 / 3.0 * PI * r * r * r
}

/// Lattice sites of a sphere box, before the fill-fraction draw
fn sphere_sites(min: &NVec3, max: &NVec3, r: f64, arrangement: SphereArrangement) -> Vec<NVec3> {
    let lo = min + NVec3::repeat(r);
    let hi = max - NVec3::repeat(r);
    let inside = |x: &NVec3| (0..3).all(|k| x[k] <= hi[k] + 1e-12 * r);
    let mut sites = Vec::new();

    match arrangement {
        SphereArrangement::Uniform => {
            let span = |k: usize| ((hi[k] - lo[k]) / (2.0 * r)).floor().max(-1.0) as i64;
            for k in 0..=span(2) {
                for j in 0..=span(1) {
                    for i in 0..=span(0) {
                        let x = lo + 2.0 * r * NVec3::new(i as f64, j as f64, k as f64);
                        if inside(&x) {
                            sites.push(x);
                        }
                    }
                }
            }
        }
        SphereArrangement::ClosePacked => {
            let dy = 3.0_f64.sqrt() * r;
            let dz = 2.0 * (6.0_f64).sqrt() / 3.0 * r;
            let nx = ((hi.x - lo.x) / (2.0 * r)).floor() as i64 + 1;
            let ny = ((hi.y - lo.y) / dy).floor() as i64 + 1;
            let nz = ((hi.z - lo.z) / dz).floor() as i64 + 1;
            for k in 0..nz.max(0) {
                for j in 0..ny.max(0) {
                    for i in 0..nx.max(0) {
                        let shift = ((j + k) % 2) as f64;
                        let x = lo
                            + NVec3::new(
                                (2.0 * i as f64 + shift) * r,
                                dy * (j as f64 + (k % 2) as f64 / 3.0),
                                dz * k as f64,
                            );
                        if inside(&x) {
                            sites.push(x);
                        }
                    }
                }
            }
        }
    }
    sites
}

impl Domain for DemDomain {
    fn particles(&self) -> &ParticleCollection {
        &self.particles
    }

    fn particles_mut(&mut self) -> &mut ParticleCollection {
        &mut self.particles
    }

    fn generate_irregular_packing(&mut self, req: &IrregularPacking) -> Result<(), EngineError> {
        let (nx, ny, nz) = (req.divisions.0.max(1), req.divisions.1.max(1), req.divisions.2.max(1));
        let cell = NVec3::new(
            req.footprint.x / nx as f64,
            req.footprint.y / ny as f64,
            req.footprint.z / nz as f64,
        );
        let min_edge = cell.min();
        if min_edge <= 0.0 {
            return Err(EngineError::InvalidRequest(format!("degenerate cell {cell:?}")));
        }
        let origin = -0.5 * req.footprint;
        let radius = (CELL_ENVELOPE * min_edge).max(req.radius);
        let mass = req.density * cell.x * cell.y * cell.z;
        let jitter = CELL_JITTER * min_edge;
        let mut rng = ChaChaRng::seed_from_u64(req.seed);

        debug!(
            "irregular packing {nx}x{ny}x{nz}, cohesion {}, periodic {}",
            req.cohesion, req.periodic
        );
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let centre = origin + cell.component_mul(&NVec3::new(i as f64 + 0.5, j as f64 + 0.5, k as f64 + 0.5));
                    let offset = NVec3::new(
                        rng.random_range(-jitter..=jitter),
                        rng.random_range(-jitter..=jitter),
                        rng.random_range(-jitter..=jitter),
                    );
                    if rng.random::<f64>() >= req.fraction {
                        continue;
                    }
                    let shape = Shape::Cell { radius, spheroradius: req.radius };
                    self.push_grain(req.tag, shape, centre + offset, mass);
                }
            }
        }
        Ok(())
    }

    fn generate_sphere_packing(&mut self, req: &SpherePacking) -> Result<(), EngineError> {
        if req.radius <= 0.0 {
            return Err(EngineError::InvalidRequest("sphere radius must be positive".to_string()));
        }
        let mut rng = ChaChaRng::seed_from_u64(req.seed);
        let mass = req.density * sphere_volume(req.radius);
        let sites = sphere_sites(&req.min, &req.max, req.radius, req.arrangement);
        debug!(
            "{:?} sphere box: {} sites, bond threshold {}",
            req.arrangement,
            sites.len(),
            req.bond_threshold
        );
        for x in sites {
            if rng.random::<f64>() < req.fraction {
                let mut grain = Particle::new(req.tag, Shape::Sphere { radius: req.radius }, x, mass);
                grain.bond_threshold = req.bond_threshold;
                self.particles.push(grain);
            }
        }
        Ok(())
    }

    fn add_cube(&mut self, tag: Tag, position: NVec3, radius: f64, edge: f64, density: f64) -> Result<(), EngineError> {
        if edge <= 0.0 {
            return Err(EngineError::InvalidRequest(format!("cube edge must be positive, got {edge}")));
        }
        let mass = density * sphero_cube_volume(edge, radius);
        self.push_grain(tag, Shape::Cube { edge, spheroradius: radius }, position, mass);
        Ok(())
    }

    fn add_plane(&mut self, plane: &PlaneSpec) -> Result<(), EngineError> {
        let rot = if plane.axis.norm() > 0.0 && plane.angle != 0.0 {
            Rotation3::from_axis_angle(&Unit::new_normalize(plane.axis), plane.angle)
        } else {
            Rotation3::identity()
        };
        let shape = Shape::Plane {
            normal: rot * NVec3::z(),
            u_axis: rot * NVec3::x(),
            v_axis: rot * NVec3::y(),
            half_width: 0.5 * plane.width,
            half_height: 0.5 * plane.height,
            spheroradius: plane.radius,
        };
        let mass = plane.density * plane.width * plane.height * 2.0 * plane.radius;
        self.push_grain(plane.tag, shape, plane.position, mass);
        Ok(())
    }

    fn critical_dt(&self) -> Result<f64, EngineError> {
        let mut min_mass = f64::INFINITY;
        let mut max_kn: f64 = 0.0;
        let mut max_bn: f64 = 0.0;
        for p in self.particles.iter().filter(|p| !p.fixed) {
            min_mass = min_mass.min(p.m);
            max_kn = max_kn.max(p.props.kn);
            if let Some(bond) = p.props.bond {
                max_bn = max_bn.max(bond.bn);
            }
        }
        let stiffness = max_kn + max_bn;
        if !min_mass.is_finite() || stiffness <= 0.0 {
            return Err(EngineError::NoFreeParticles);
        }
        Ok(0.1 * (min_mass / stiffness).sqrt())
    }

    fn solve(&mut self, req: &SolveRequest) -> Result<SolveSummary, EngineError> {
        if !(req.dt > 0.0 && req.dt_out > 0.0 && req.duration >= 0.0) {
            return Err(EngineError::InvalidRequest(format!(
                "dt {}, dt_out {} and duration {} must be positive",
                req.dt, req.dt_out, req.duration
            )));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(req.threads.max(1))
            .build()
            .map_err(|e| EngineError::InvalidRequest(e.to_string()))?;

        let start = self.time;
        let n_steps = (req.duration / req.dt).ceil() as usize;
        let skin = req.verlet_skin;

        let Self { particles, time, out_dir, list } = self;

        pool.install(|| -> Result<SolveSummary, EngineError> {
            list.invalidate();
            list.rebuild(particles.as_slice(), particles.revision(), skin);
            let mut forces = Vec::with_capacity(particles.len());
            accumulate_forces(particles, list, req.dt, &mut forces);

            let mut frame = 0;
            write_snapshot(out_dir, &req.prefix, frame, *time, particles)?;
            frame += 1;
            let mut next_out = start + req.dt_out;

            for step in 1..=n_steps {
                verlet_step(particles, list, &mut forces, req.dt, skin);
                *time = start + step as f64 * req.dt;
                if *time >= next_out - 1e-9 * req.dt {
                    write_snapshot(out_dir, &req.prefix, frame, *time, particles)?;
                    frame += 1;
                    next_out += req.dt_out;
                }
            }

            debug!("`{}`: {} steps, {} frames, {} contacts in list", req.prefix, n_steps, frame, list.pairs.len());
            Ok(SolveSummary { steps: n_steps, snapshots: frame, time: *time })
        })
    }

    fn save_checkpoint(&self, name: &str) -> Result<PathBuf, EngineError> {
        let path = self.out_dir.join(format!("{name}.json"));
        let checkpoint = Checkpoint { time: self.time, particles: self.particles.clone() };
        write_checkpoint(&path, &checkpoint)?;
        info!("checkpoint written to {}", path.display());
        Ok(path)
    }
}
