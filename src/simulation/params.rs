//! Validated, immutable run parameters
//!
//! `RunParameters` is built once from a [`ScenarioConfig`] and passed by
//! reference to every stage. Strategy and cross-section names are resolved
//! here, so an unsupported name aborts the run before any particle exists.
//! Contact stiffness is scaled by the lattice resolution exactly once, in
//! [`RunParameters::from_config`].

use std::fmt;
use std::str::FromStr;

use crate::configuration::config::ScenarioConfig;
use crate::simulation::errors::ConfigError;
use crate::simulation::states::{BondParams, PropertyBundle};

/// Packing strategy used to fill the footprint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackingType {
    Voronoi, // irregular cells
    SphereBoxNormal, // spheres on a simple cubic lattice
    SphereBoxHcp, // spheres on a hexagonal close-packed lattice
    Cube, // lattice-marched sphero-cubes
}

impl FromStr for PackingType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "voronoi" | "Voronoi" => Ok(PackingType::Voronoi),
            "sphereboxnormal" => Ok(PackingType::SphereBoxNormal),
            "sphereboxhcp" => Ok(PackingType::SphereBoxHcp),
            "cube" | "Cube" => Ok(PackingType::Cube),
            other => Err(ConfigError::UnsupportedPackingType(other.to_string())),
        }
    }
}

impl fmt::Display for PackingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackingType::Voronoi => "voronoi",
            PackingType::SphereBoxNormal => "sphereboxnormal",
            PackingType::SphereBoxHcp => "sphereboxhcp",
            PackingType::Cube => "cube",
        };
        f.write_str(name)
    }
}

/// Cross-section carved out of the rectangular packing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossSection {
    Circle,
    RightTriangle,
    IsosceleTriangle,
    Square,
}

impl FromStr for CrossSection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "circle" | "Circle" => Ok(CrossSection::Circle),
            "right_triangle" => Ok(CrossSection::RightTriangle),
            "isoscele_triangle" => Ok(CrossSection::IsosceleTriangle),
            "square" | "Square" => Ok(CrossSection::Square),
            other => Err(ConfigError::UnsupportedCrossSection(other.to_string())),
        }
    }
}

impl fmt::Display for CrossSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrossSection::Circle => "circle",
            CrossSection::RightTriangle => "right_triangle",
            CrossSection::IsosceleTriangle => "isoscele_triangle",
            CrossSection::Square => "square",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct RunParameters {
    pub packing: PackingType,
    pub cross_section: CrossSection,
    pub test: Option<String>, // experiment label, informational
    pub cohesion: Option<BondParams>, // `Some` when cohesion is enabled
    pub bond_threshold: f64, // Eps, handed to the sphere-box packing even without cohesion
    pub fraction: f64, // fill fraction of the random packings
    pub kn: f64, // normal stiffness, already scaled
    pub kt: f64, // tangential stiffness, already scaled
    pub gn: f64,
    pub gt: f64,
    pub mu: f64, // bulk friction
    pub muw: f64, // base plate friction
    pub radius: f64, // spheroradius R, also the Verlet skin
    pub seed: u64,
    pub dt: f64, // requested step, reported next to the critical step actually used
    pub dt_out: f64,
    pub lx: f64,
    pub ly: f64,
    pub lz: f64,
    pub scalingx: usize,
    pub scalingy: usize,
    pub scalingz: usize,
    pub plane_x: usize,
    pub plane_y: usize,
    pub rho: f64,
    pub t_final: f64,
    pub lateral_gravity: f64,
    pub vertical_gravity: f64,
}

impl RunParameters {
    /// Validate a scenario and derive the runtime parameters.
    ///
    /// `kn` and `kt` come out divided by `scalingx * scalingy`.
    pub fn from_config(cfg: &ScenarioConfig) -> Result<Self, ConfigError> {
        let packing: PackingType = cfg.column.packing.parse()?;
        let cross_section: CrossSection = cfg.column.cross_section.parse()?;

        let [scalingx, scalingy, scalingz] = cfg.column.scaling;
        let [plane_x, plane_y] = cfg.column.plane;
        for (name, value) in [("scalingx", scalingx), ("scalingy", scalingy), ("scalingz", scalingz)] {
            if value == 0 {
                return Err(invalid(name, "must be at least 1"));
            }
        }

        let p = &cfg.parameters;
        for (name, value) in [
            ("lx", cfg.column.lx),
            ("ly", cfg.column.ly),
            ("lz", cfg.column.lz),
            ("radius", p.radius),
            ("dt", p.dt),
            ("dt_out", p.dt_out),
            ("rho", p.rho),
            ("t_final", p.t_final),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(name, &format!("must be positive, got {value}")));
            }
        }
        if !(p.fraction > 0.0 && p.fraction <= 1.0) {
            return Err(invalid("fraction", &format!("must lie in (0, 1], got {}", p.fraction)));
        }

        let c = &cfg.contact;
        if c.kn <= 0.0 || c.kt < 0.0 {
            return Err(invalid("kn", "normal stiffness must be positive and kt non-negative"));
        }

        let cohesion = cfg.cohesion.enabled.then(|| BondParams {
            bn: cfg.cohesion.bn,
            bt: cfg.cohesion.bt,
            bm: cfg.cohesion.bm,
            eps: cfg.cohesion.eps,
        });

        let area_scale = (scalingx * scalingy) as f64;

        Ok(Self {
            packing,
            cross_section,
            test: cfg.column.test.clone(),
            cohesion,
            bond_threshold: cfg.cohesion.eps,
            fraction: p.fraction,
            kn: c.kn / area_scale,
            kt: c.kt / area_scale,
            gn: c.gn,
            gt: c.gt,
            mu: c.mu,
            muw: c.muw,
            radius: p.radius,
            seed: p.seed,
            dt: p.dt,
            dt_out: p.dt_out,
            lx: cfg.column.lx,
            ly: cfg.column.ly,
            lz: cfg.column.lz,
            scalingx,
            scalingy,
            scalingz,
            plane_x,
            plane_y,
            rho: p.rho,
            t_final: p.t_final,
            lateral_gravity: p.lateral_gravity,
            vertical_gravity: p.vertical_gravity,
        })
    }

    /// Lattice divisions of the footprint, `(Nx, Ny, Nz)`
    pub fn divisions(&self) -> (usize, usize, usize) {
        (
            (self.lx * self.scalingx as f64) as usize,
            (self.ly * self.scalingy as f64) as usize,
            (self.lz * self.scalingz as f64) as usize,
        )
    }

    /// Bundle bound to bulk grains in the main stage
    pub fn bulk_bundle(&self) -> PropertyBundle {
        PropertyBundle {
            kn: self.kn,
            kt: self.kt,
            gn: self.gn,
            gt: self.gt,
            mu: self.mu,
            bond: self.cohesion,
        }
    }

    /// Bundle used while cubes settle, shared by grains and transient walls
    pub fn provisional_bundle(&self) -> PropertyBundle {
        PropertyBundle {
            kn: self.kn,
            kt: self.kt,
            gn: self.gn,
            gt: 0.0,
            mu: self.mu,
            bond: None,
        }
    }

    /// Bundle of the permanent base plate, the only place `muw` is used
    pub fn base_bundle(&self) -> PropertyBundle {
        PropertyBundle {
            kn: self.kn,
            kt: self.kt,
            gn: self.gn,
            gt: 0.0,
            mu: self.muw,
            bond: None,
        }
    }
}

fn invalid(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter { name, reason: reason.to_string() }
}
