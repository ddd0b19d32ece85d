//! Fixed-step velocity–Verlet integration for the reference engine
//!
//! Translational only. Fixed particles are skipped entirely.

use rayon::prelude::*;

use crate::simulation::states::{NVec3, ParticleCollection};

use super::neighbors::VerletList;

/// Total force on every particle: body force plus contact forces.
/// Pair forces are evaluated in parallel, accumulation is sequential.
pub fn accumulate_forces(particles: &ParticleCollection, list: &mut VerletList, dt: f64, out: &mut Vec<NVec3>) {
    let slice = particles.as_slice();
    list.pairs.par_iter_mut().for_each(|pair| pair.evaluate(slice, dt));

    out.clear();
    out.extend(slice.iter().map(|p| p.ff));
    for pair in &list.pairs {
        out[pair.j] += pair.force;
        out[pair.i] -= pair.force;
    }
}

/// Advance the domain by one step using velocity–Verlet.
///
/// `forces` must hold the forces at the current positions on entry and holds
/// the forces at the new positions on exit.
pub fn verlet_step(particles: &mut ParticleCollection, list: &mut VerletList, forces: &mut Vec<NVec3>, dt: f64, skin: f64) {
    let half_dt = 0.5 * dt;

    // Kick: v_n+1/2 = v_n + (dt/2) * a_n
    // Drift: x_n+1 = x_n + dt * v_n+1/2
    for (p, f) in particles.iter_mut().zip(forces.iter()) {
        if p.fixed {
            continue;
        }
        p.v += half_dt * *f / p.m;
        p.x += dt * p.v;
    }

    let revision = particles.revision();
    if list.is_stale(particles.as_slice(), revision, skin) {
        list.rebuild(particles.as_slice(), revision, skin);
    }

    // a_n+1 from x_n+1
    accumulate_forces(particles, list, dt, forces);

    // Second kick: v_n+1 = v_n+1/2 + (dt/2) * a_n+1
    for (p, f) in particles.iter_mut().zip(forces.iter()) {
        if !p.fixed {
            p.v += half_dt * *f / p.m;
        }
    }
}
