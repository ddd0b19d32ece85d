//! Pair contact forces for the reference engine
//!
//! Every grain is seen through a spherical envelope; planes are finite,
//! two-sided plates. The force law is a linear spring-dashpot in the normal
//! direction and an incremental tangential spring capped by Coulomb friction.

use crate::simulation::states::{NVec3, Particle, PropertyBundle, Shape};

/// Geometric relation between two bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Separation {
    pub normal: NVec3, // unit vector pointing from the first body to the second
    pub gap: f64, // surface distance, negative when overlapping
}

/// Surface separation of `a` and `b`, `None` when they can never touch.
///
/// `margin` widens the in-plane extent test of plates, so neighbour lists can
/// use the same routine as the force evaluation.
pub fn separation(a: &Particle, b: &Particle, margin: f64) -> Option<Separation> {
    match (a.shape.is_plane(), b.shape.is_plane()) {
        (false, false) => {
            let d = b.x - a.x;
            let dist = d.norm();
            if dist == 0.0 {
                return None;
            }
            Some(Separation {
                normal: d / dist,
                gap: dist - a.shape.contact_radius() - b.shape.contact_radius(),
            })
        }
        (false, true) => grain_plane(a, b, margin),
        (true, false) => grain_plane(b, a, margin).map(|s| Separation { normal: -s.normal, gap: s.gap }),
        (true, true) => None,
    }
}

/// Grain `g` against plate `p`, normal from the grain towards the plate
fn grain_plane(g: &Particle, p: &Particle, margin: f64) -> Option<Separation> {
    let Shape::Plane { normal, u_axis, v_axis, half_width, half_height, spheroradius } = p.shape else {
        return None;
    };
    let r = g.shape.contact_radius();
    let rel = g.x - p.x;
    let reach = r + margin;
    if rel.dot(&u_axis).abs() > half_width + reach || rel.dot(&v_axis).abs() > half_height + reach {
        return None;
    }
    let s = rel.dot(&normal);
    let towards_plate = if s >= 0.0 { -normal } else { normal };
    Some(Separation { normal: towards_plate, gap: s.abs() - r - spheroradius })
}

/// Combine two coefficients as `2ab / (a + b)`
fn harmonic(a: f64, b: f64) -> f64 {
    if a + b == 0.0 {
        0.0
    } else {
        2.0 * a * b / (a + b)
    }
}

/// Effective coefficients of a contact.
///
/// Stiffness and dissipation are harmonic means. Friction of a contact
/// against a fixed body is the fixed body's own, so walls can carry their
/// own friction coefficient.
pub fn pair_bundle(a: &Particle, b: &Particle) -> PropertyBundle {
    let (pa, pb) = (&a.props, &b.props);
    let mu = match (a.fixed, b.fixed) {
        (true, false) => pa.mu,
        (false, true) => pb.mu,
        _ => harmonic(pa.mu, pb.mu),
    };
    PropertyBundle {
        kn: harmonic(pa.kn, pb.kn),
        kt: harmonic(pa.kt, pb.kt),
        gn: harmonic(pa.gn, pb.gn),
        gt: harmonic(pa.gt, pb.gt),
        mu,
        bond: None,
    }
}

/// Reduced mass, a fixed body counts as infinitely heavy
pub fn effective_mass(a: &Particle, b: &Particle) -> f64 {
    match (a.fixed, b.fixed) {
        (true, false) => b.m,
        (false, true) => a.m,
        _ => a.m * b.m / (a.m + b.m),
    }
}

/// One entry of the Verlet list, carrying its tangential spring history
#[derive(Debug, Clone)]
pub struct ContactPair {
    pub i: usize,
    pub j: usize,
    pub key: (u64, u64), // uids, stable across list rebuilds
    pub spring: NVec3, // accumulated tangential displacement
    pub force: NVec3, // force on `j`; `i` receives the opposite
}

impl ContactPair {
    pub fn new(i: usize, j: usize, key: (u64, u64)) -> Self {
        Self { i, j, key, spring: NVec3::zeros(), force: NVec3::zeros() }
    }

    /// Evaluate the contact force for the current positions and velocities
    pub fn evaluate(&mut self, particles: &[Particle], dt: f64) {
        let (a, b) = (&particles[self.i], &particles[self.j]);
        let sep = match separation(a, b, 0.0) {
            Some(s) if s.gap < 0.0 => s,
            _ => {
                self.spring = NVec3::zeros();
                self.force = NVec3::zeros();
                return;
            }
        };

        let n = sep.normal;
        let overlap = -sep.gap;
        let c = pair_bundle(a, b);
        let m_eff = effective_mass(a, b);

        let v_rel = b.v - a.v;
        let vn = v_rel.dot(&n);
        let vt = v_rel - vn * n;

        // normal: repulsive spring plus dashpot, no tension
        let fn_mag = (c.kn * overlap - c.gn * m_eff * vn).max(0.0);

        // tangential: keep the spring in the current tangent plane, then cap it
        self.spring -= self.spring.dot(&n) * n;
        self.spring += vt * dt;
        let mut ft = -c.kt * self.spring - c.gt * m_eff * vt;
        let max_ft = c.mu * fn_mag;
        let ft_mag = ft.norm();
        if ft_mag > max_ft {
            ft *= max_ft / ft_mag;
            if c.kt > 0.0 {
                self.spring = -(ft + c.gt * m_eff * vt) / c.kt;
            }
        }

        self.force = fn_mag * n + ft;
    }
}
