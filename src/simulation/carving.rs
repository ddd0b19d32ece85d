//! Cross-section carving
//!
//! Two phases kept apart: [`classify`] is a pure pass returning the indices
//! of bulk grains outside the shape, [`compact`] marks exactly those with
//! the deletion sentinel and removes the sentinel tag in one bulk delete.

use log::info;

use super::engine::Domain;
use super::params::{CrossSection, RunParameters};
use super::states::{tags, NVec3, ParticleCollection};

/// True when a point at `x` lies outside `shape` for footprint `(lx, ly)`
pub fn is_outside(shape: CrossSection, lx: f64, ly: f64, x: &NVec3) -> bool {
    match shape {
        CrossSection::Circle => x.x * x.x + x.y * x.y >= 0.25 * lx * ly,
        CrossSection::RightTriangle => x.y > ly / lx * x.x,
        CrossSection::IsosceleTriangle => {
            let slope = 2.0 * ly / lx;
            x.y > slope * x.x + 0.5 * ly || x.y > -slope * x.x + 0.5 * ly
        }
        CrossSection::Square => false,
    }
}

/// Indices of bulk grains outside the cross-section, ascending
pub fn classify(particles: &ParticleCollection, shape: CrossSection, lx: f64, ly: f64) -> Vec<usize> {
    particles
        .iter()
        .enumerate()
        .filter(|(_, p)| p.tag == tags::BULK && is_outside(shape, lx, ly, &p.x))
        .map(|(i, _)| i)
        .collect()
}

/// Remove the listed particles, returns how many went
pub fn compact<D: Domain>(domain: &mut D, indices: &[usize]) -> usize {
    if indices.is_empty() {
        return 0;
    }
    domain.particles_mut().retag(indices, tags::MARKED);
    domain.delete_by_tags(&[tags::MARKED])
}

/// Carve the configured cross-section, returns the number of grains removed
pub fn carve<D: Domain>(domain: &mut D, params: &RunParameters) -> usize {
    let outside = classify(domain.particles(), params.cross_section, params.lx, params.ly);
    let removed = compact(domain, &outside);
    info!(
        "{} cross-section removed {removed} grains, {} remain",
        params.cross_section,
        domain.particles().count_tag(tags::BULK)
    );
    removed
}

/// Indices of bulk grains strictly outside the footprint box `[-L/2, L/2]`
pub fn outside_footprint(particles: &ParticleCollection, params: &RunParameters) -> Vec<usize> {
    let half = NVec3::new(0.5 * params.lx, 0.5 * params.ly, 0.5 * params.lz);
    particles
        .iter()
        .enumerate()
        .filter(|(_, p)| p.tag == tags::BULK && (0..3).any(|k| p.x[k] > half[k] || p.x[k] < -half[k]))
        .map(|(i, _)| i)
        .collect()
}
