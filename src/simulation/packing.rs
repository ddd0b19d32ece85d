//! Packing generation
//!
//! Fills the footprint `[-L/2, L/2]` (per axis) with bulk grains tagged
//! [`tags::BULK`]. Irregular cells and sphere boxes are engine primitives;
//! the lattice-marched cube packing is computed here.

use log::{debug, info};

use super::engine::{Domain, IrregularPacking, SphereArrangement, SpherePacking};
use super::errors::ColumnError;
use super::params::{PackingType, RunParameters};
use super::states::{tags, NVec3};

/// Edge length of one lattice cube, `1 / scalingx`
pub fn cube_size(params: &RunParameters) -> f64 {
    1.0 / params.scalingx as f64
}

/// March step between consecutive cube centres, the cube diagonal
pub fn march_step(params: &RunParameters) -> f64 {
    cube_size(params) * 3.0_f64.sqrt()
}

/// Number of cubes the march tries to place.
///
/// A continuous volume estimate truncated to an integer. It can exceed what
/// fits in the footprint; the surplus ends up stacked above `Lz/2`.
pub fn target_cube_count(params: &RunParameters) -> usize {
    let per_volume = (params.scalingx * params.scalingy * params.scalingz) as f64;
    (per_volume * params.lx * params.ly * params.lz) as usize
}

/// Centres of the lattice-marched cube packing, in placement order.
///
/// Snake scan: y advances first, then x (y reset), then z (x and y reset).
/// Every iteration places exactly one cube. Deterministic, no randomness.
pub fn lattice_march_positions(params: &RunParameters) -> Vec<NVec3> {
    let delta = march_step(params);
    let (hx, hy, hz) = (0.5 * params.lx, 0.5 * params.ly, 0.5 * params.lz);
    let target = target_cube_count(params);

    let start = NVec3::new(-hx + delta, -hy + delta, -hz + delta);
    let mut x = start;
    let mut positions = Vec::with_capacity(target.max(1));
    positions.push(x);

    for _ in 1..target {
        if x.y < hy - delta {
            x.y += delta;
        } else {
            x.x += delta;
            x.y = start.y;
            if x.x >= hx - delta {
                x.x = start.x;
                x.z += delta;
            }
        }
        positions.push(x);
    }

    positions
}

/// Fill the domain with bulk grains following the configured strategy.
/// Returns the number of grains added.
pub fn generate<D: Domain>(domain: &mut D, params: &RunParameters) -> Result<usize, ColumnError> {
    let before = domain.particles().len();
    let half = NVec3::new(0.5 * params.lx, 0.5 * params.ly, 0.5 * params.lz);

    match params.packing {
        PackingType::Voronoi => {
            domain.generate_irregular_packing(&IrregularPacking {
                tag: tags::BULK,
                radius: params.radius,
                footprint: 2.0 * half,
                divisions: params.divisions(),
                density: params.rho,
                cohesion: params.cohesion.is_some(),
                periodic: true,
                seed: params.seed,
                fraction: params.fraction,
            })?;
        }
        PackingType::SphereBoxNormal | PackingType::SphereBoxHcp => {
            let arrangement = if params.packing == PackingType::SphereBoxHcp {
                SphereArrangement::ClosePacked
            } else {
                SphereArrangement::Uniform
            };
            domain.generate_sphere_packing(&SpherePacking {
                tag: tags::BULK,
                min: -half,
                max: half,
                radius: params.radius,
                density: params.rho,
                arrangement,
                seed: params.seed,
                fraction: params.fraction,
                bond_threshold: params.bond_threshold,
            })?;
        }
        PackingType::Cube => {
            let edge = cube_size(params);
            let positions = lattice_march_positions(params);
            debug!(
                "cube march: edge {edge:.4}, step {:.4}, target {}",
                march_step(params),
                target_cube_count(params)
            );
            for x in positions {
                domain.add_cube(tags::BULK, x, params.radius, edge, params.rho)?;
            }
        }
    }

    let added = domain.particles().len() - before;
    info!("{} packing generated {added} grains", params.packing);
    Ok(added)
}
