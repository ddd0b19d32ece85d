//! Verlet neighbour list
//!
//! Pairs whose surface gap is below the skin distance are kept in a list that
//! is reused until some free particle has moved more than half the skin since
//! the last build, or the particle set changed structurally.

use std::collections::HashMap;

use crate::simulation::states::{NVec3, Particle};

use super::forces::{separation, ContactPair};

#[derive(Debug, Clone, Default)]
pub struct VerletList {
    pub pairs: Vec<ContactPair>,
    reference: Vec<NVec3>, // positions at the last build
    revision: Option<u64>, // collection revision at the last build
    skin: f64,
}

impl VerletList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the list has to be rebuilt before the next force evaluation
    pub fn is_stale(&self, particles: &[Particle], revision: u64, skin: f64) -> bool {
        if self.revision != Some(revision) || self.skin != skin || self.reference.len() != particles.len() {
            return true;
        }
        let max_disp = particles
            .iter()
            .zip(&self.reference)
            .filter(|(p, _)| !p.fixed)
            .map(|(p, x0)| (p.x - x0).norm())
            .fold(0.0, f64::max);
        2.0 * max_disp > skin
    }

    /// Rebuild the pair list, carrying tangential springs of surviving pairs over
    pub fn rebuild(&mut self, particles: &[Particle], revision: u64, skin: f64) {
        let history: HashMap<(u64, u64), NVec3> =
            self.pairs.drain(..).map(|pair| (pair.key, pair.spring)).collect();

        let mut candidates = grain_candidates(particles, skin);
        candidates.extend(plane_candidates(particles));

        for (i, j) in candidates {
            let (a, b) = (&particles[i], &particles[j]);
            if a.fixed && b.fixed {
                continue;
            }
            let within_skin = separation(a, b, skin).is_some_and(|s| s.gap < skin);
            if within_skin {
                let key = (a.uid, b.uid);
                let mut pair = ContactPair::new(i, j, key);
                if let Some(spring) = history.get(&key) {
                    pair.spring = *spring;
                }
                self.pairs.push(pair);
            }
        }

        self.reference = particles.iter().map(|p| p.x).collect();
        self.revision = Some(revision);
        self.skin = skin;
    }

    pub fn invalidate(&mut self) {
        self.revision = None;
    }
}

/// Grain pairs sharing or neighbouring a hash cell
fn grain_candidates(particles: &[Particle], skin: f64) -> Vec<(usize, usize)> {
    let grains: Vec<usize> = (0..particles.len()).filter(|&i| !particles[i].shape.is_plane()).collect();
    let r_max = grains
        .iter()
        .map(|&i| particles[i].shape.contact_radius())
        .fold(0.0, f64::max);
    let cell = (2.0 * r_max + skin).max(f64::EPSILON);

    let key = |x: &NVec3| -> (i64, i64, i64) {
        ((x.x / cell).floor() as i64, (x.y / cell).floor() as i64, (x.z / cell).floor() as i64)
    };

    let mut grid: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    for &i in &grains {
        grid.entry(key(&particles[i].x)).or_default().push(i);
    }

    let mut out = Vec::new();
    for &i in &grains {
        let (cx, cy, cz) = key(&particles[i].x);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = grid.get(&(cx + dx, cy + dy, cz + dz)) {
                        out.extend(bucket.iter().filter(|&&j| j > i).map(|&j| (i, j)));
                    }
                }
            }
        }
    }
    out
}

/// Every grain against every plane, planes are few
fn plane_candidates(particles: &[Particle]) -> Vec<(usize, usize)> {
    let planes: Vec<usize> = (0..particles.len()).filter(|&i| particles[i].shape.is_plane()).collect();
    let mut out = Vec::new();
    for (i, p) in particles.iter().enumerate() {
        if p.shape.is_plane() {
            continue;
        }
        out.extend(planes.iter().map(|&j| (i, j)));
    }
    out
}
