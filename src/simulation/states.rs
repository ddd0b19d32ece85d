//! Core state types for the column simulation.
//!
//! Defines the particle model shared by the pipeline and the engine:
//! - `Particle`  a single body (bulk grain or boundary plane) using `NVec3`
//! - `ParticleCollection`  the ordered, mutable set owned by a domain
//! - `PropertyBundle` / `BondParams`  contact coefficients copied into particles
//!
//! Tags are identity classes, not unique ids. The reserved values live in [`tags`].

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

pub type NVec3 = Vector3<f64>;
pub type Tag = i32;

/// Reserved tag values
pub mod tags {
    use super::Tag;

    pub const BULK: Tag = 1; // every generated grain
    pub const BASE_PLATE: Tag = -2; // permanent base of the main run
    pub const WALL_X_POS: Tag = -11;
    pub const WALL_X_NEG: Tag = -12;
    pub const WALL_Y_POS: Tag = -13;
    pub const WALL_Y_NEG: Tag = -14;
    pub const TRANSIENT_BASE: Tag = -15;
    pub const MARKED: Tag = Tag::MIN; // sentinel for "about to be deleted"

    /// Tags of the transient confinement used while cubes settle
    pub const TRANSIENT: [Tag; 5] = [WALL_X_POS, WALL_X_NEG, WALL_Y_POS, WALL_Y_NEG, TRANSIENT_BASE];

    /// Boundary bodies live in the negative range, the sentinel excluded
    pub fn is_boundary(tag: Tag) -> bool {
        tag < 0 && tag != MARKED
    }
}

/// Cohesive bond coefficients, carried but not integrated by the reference engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BondParams {
    pub bn: f64, // normal bond stiffness
    pub bt: f64, // tangential bond stiffness
    pub bm: f64, // torque bond stiffness
    pub eps: f64, // breakage threshold
}

/// Contact coefficients of one particle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertyBundle {
    pub kn: f64, // normal stiffness
    pub kt: f64, // tangential stiffness
    pub gn: f64, // normal dissipation
    pub gt: f64, // tangential dissipation
    pub mu: f64, // microscopic friction
    pub bond: Option<BondParams>,
}

/// Geometric description of a body.
///
/// Grains are treated by the engine through a spherical contact envelope
/// ([`Shape::contact_radius`]); planes are finite two-sided plates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Sphere {
        radius: f64,
    },
    /// Sphero-cube: a cube of edge `edge` dilated by `spheroradius`
    Cube {
        edge: f64,
        spheroradius: f64,
    },
    /// Irregular packing cell approximated by its inscribed envelope
    Cell {
        radius: f64,
        spheroradius: f64,
    },
    Plane {
        normal: NVec3,
        u_axis: NVec3, // in-plane axis spanning `half_width`
        v_axis: NVec3, // in-plane axis spanning `half_height`
        half_width: f64,
        half_height: f64,
        spheroradius: f64,
    },
}

impl Shape {
    /// Radius of the spherical contact envelope. Planes report their spheroradius.
    pub fn contact_radius(&self) -> f64 {
        match *self {
            Shape::Sphere { radius } => radius,
            Shape::Cube { edge, spheroradius } => 0.5 * edge + spheroradius,
            Shape::Cell { radius, .. } => radius,
            Shape::Plane { spheroradius, .. } => spheroradius,
        }
    }

    pub fn is_plane(&self) -> bool {
        matches!(self, Shape::Plane { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub uid: u64, // unique within a run, assigned by the collection
    pub tag: Tag,
    pub shape: Shape,
    pub x: NVec3, // position
    pub v: NVec3, // velocity
    pub m: f64, // mass
    pub fixed: bool, // velocity fixed, the body ignores forces
    pub ff: NVec3, // constant body force
    pub props: PropertyBundle,
    #[serde(default)]
    pub bond_threshold: f64, // bonding distance recorded by the sphere-box packing, 0 otherwise
}

impl Particle {
    pub fn new(tag: Tag, shape: Shape, x: NVec3, m: f64) -> Self {
        Self {
            uid: 0,
            tag,
            shape,
            x,
            v: NVec3::zeros(),
            m,
            fixed: false,
            ff: NVec3::zeros(),
            props: PropertyBundle::default(),
            bond_threshold: 0.0,
        }
    }
}

/// Ordered, mutable set of particles.
///
/// Every structural change (append or delete) bumps `revision` so an engine
/// can tell when cached neighbour data went stale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticleCollection {
    particles: Vec<Particle>,
    next_uid: u64,
    revision: u64,
}

impl ParticleCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a particle and return its index
    pub fn push(&mut self, mut p: Particle) -> usize {
        p.uid = self.next_uid;
        self.next_uid += 1;
        self.revision += 1;
        self.particles.push(p);
        self.particles.len() - 1
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Particle> {
        self.particles.iter_mut()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn contains_tag(&self, tag: Tag) -> bool {
        self.particles.iter().any(|p| p.tag == tag)
    }

    pub fn count_tag(&self, tag: Tag) -> usize {
        self.particles.iter().filter(|p| p.tag == tag).count()
    }

    pub fn with_tag(&self, tag: Tag) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(move |p| p.tag == tag)
    }

    /// Overwrite the tag of every listed index. Out-of-range indices are ignored.
    pub fn retag(&mut self, indices: &[usize], tag: Tag) {
        for &i in indices {
            if let Some(p) = self.particles.get_mut(i) {
                p.tag = tag;
            }
        }
    }

    /// Remove every particle whose tag is in `tags`, keeping the order of the rest.
    /// Returns how many were removed.
    pub fn delete_tags(&mut self, tags: &[Tag]) -> usize {
        let before = self.particles.len();
        self.particles.retain(|p| !tags.contains(&p.tag));
        let removed = before - self.particles.len();
        if removed > 0 {
            self.revision += 1;
        }
        removed
    }

    /// Axis-aligned box over all particles, each widened by its contact
    /// envelope. `None` when empty.
    pub fn bounding_box(&self) -> Option<(NVec3, NVec3)> {
        let extent = |p: &Particle| NVec3::repeat(p.shape.contact_radius());
        let first = self.particles.first()?;
        let mut min = first.x - extent(first);
        let mut max = first.x + extent(first);
        for p in &self.particles[1..] {
            min = min.inf(&(p.x - extent(p)));
            max = max.sup(&(p.x + extent(p)));
        }
        Some((min, max))
    }
}

impl<'a> IntoIterator for &'a ParticleCollection {
    type Item = &'a Particle;
    type IntoIter = std::slice::Iter<'a, Particle>;

    fn into_iter(self) -> Self::IntoIter {
        self.particles.iter()
    }
}
