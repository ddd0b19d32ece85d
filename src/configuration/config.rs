//! Configuration types for loading column scenarios.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! column run. A scenario consists of:
//!
//! - [`ColumnConfig`]   – footprint, lattice resolution, packing and cross-section names
//! - [`ContactConfig`]  – stiffness, dissipation and friction coefficients
//! - [`CohesionConfig`] – optional bond coefficients
//! - [`ParametersConfig`] – numerical parameters and physical constants
//! - [`ScenarioConfig`] – top-level wrapper
//!
//! # YAML format
//!
//! ```yaml
//! column:
//!   cross_section: "circle"   # circle, right_triangle, isoscele_triangle, square
//!   packing: "cube"           # voronoi, sphereboxnormal, sphereboxhcp, cube
//!   lx: 4.0
//!   ly: 4.0
//!   lz: 2.0
//!   scaling: [2, 2, 2]        # lattice cells per unit length in x, y, z
//!   plane: [5, 5]             # base plate extent per unit of lz in x, y
//!
//! contact:
//!   kn: 1.0e4
//!   kt: 5.0e3
//!   gn: 16.0
//!   gt: 8.0
//!   mu: 0.4                   # bulk friction
//!   muw: 0.8                  # base plate friction
//!
//! cohesion:
//!   enabled: false
//!   bn: 1.0e4
//!   bt: 5.0e3
//!   bm: 1.0e2
//!   eps: 0.01
//!
//! parameters:
//!   radius: 0.05              # spheroradius
//!   seed: 42
//!   dt: 1.0e-4
//!   dt_out: 0.05
//!   rho: 3.0
//!   t_final: 1.0
//!   fraction: 1.0
//!   lateral_gravity: 300.0    # optional
//!   vertical_gravity: -981.0  # optional
//! ```
//!
//! Runs described in the legacy line-per-value `.inp` layout are read by
//! [`ScenarioConfig::from_inp_str`]. The validated runtime form is
//! [`crate::simulation::params::RunParameters`].

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::simulation::errors::ConfigError;

fn default_lateral_gravity() -> f64 {
    300.0
}

fn default_vertical_gravity() -> f64 {
    -981.0
}

fn default_fraction() -> f64 {
    1.0
}

/// Geometry of the column and the packing used to fill it
#[derive(Deserialize, Debug, Clone)]
pub struct ColumnConfig {
    pub cross_section: String, // shape carved out of the rectangular packing
    pub packing: String, // packing strategy name
    #[serde(default)]
    pub test: Option<String>, // free-form label of the experiment
    pub lx: f64,
    pub ly: f64,
    pub lz: f64,
    pub scaling: [usize; 3], // lattice resolution per unit length
    pub plane: [usize; 2], // base plate size per unit of lz
}

/// Contact coefficients, stiffness given unscaled
#[derive(Deserialize, Debug, Clone)]
pub struct ContactConfig {
    pub kn: f64,
    pub kt: f64,
    pub gn: f64,
    #[serde(default)]
    pub gt: f64,
    pub mu: f64,
    pub muw: f64,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CohesionConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bn: f64,
    #[serde(default)]
    pub bt: f64,
    #[serde(default)]
    pub bm: f64,
    #[serde(default)]
    pub eps: f64,
}

/// Numerical and physical parameters
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub radius: f64, // spheroradius
    pub seed: u64,
    pub dt: f64, // nominal time step, the solve uses half the critical step
    pub dt_out: f64, // output interval of the main stage
    pub rho: f64, // density
    pub t_final: f64, // reference duration Tf
    #[serde(default = "default_fraction")]
    pub fraction: f64, // fill fraction of the random packings
    #[serde(default = "default_lateral_gravity")]
    pub lateral_gravity: f64,
    #[serde(default = "default_vertical_gravity")]
    pub vertical_gravity: f64,
}

/// Top-level scenario configuration
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub column: ColumnConfig,
    pub contact: ContactConfig,
    #[serde(default)]
    pub cohesion: CohesionConfig,
    pub parameters: ParametersConfig,
}

impl ScenarioConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Parse the legacy `.inp` layout: one value per line, the first token of
    /// each non-blank line, anything after it ignored as a comment.
    ///
    /// Field order: cross-section, packing, test, cohesion, fraction, Kn, Kt,
    /// Gn, Gt, Mu, Muw, Bn, Bt, Bm, Eps, R, seed, dt, dtOut, Lx, Ly, Lz,
    /// scalingx, scalingy, scalingz, plane_x, plane_y, rho, Tf.
    pub fn from_inp_str(text: &str) -> Result<Self, ConfigError> {
        let mut tokens = InpTokens::new(text);

        let cross_section = tokens.string()?;
        let packing = tokens.string()?;
        let test = tokens.string()?;
        let cohesion_enabled = tokens.flag()?;
        let fraction = tokens.number()?;
        let kn = tokens.number()?;
        let kt = tokens.number()?;
        let gn = tokens.number()?;
        let gt = tokens.number()?;
        let mu = tokens.number()?;
        let muw = tokens.number()?;
        let bn = tokens.number()?;
        let bt = tokens.number()?;
        let bm = tokens.number()?;
        let eps = tokens.number()?;
        let radius = tokens.number()?;
        let seed = tokens.count()? as u64;
        let dt = tokens.number()?;
        let dt_out = tokens.number()?;
        let lx = tokens.number()?;
        let ly = tokens.number()?;
        let lz = tokens.number()?;
        let scaling = [tokens.count()?, tokens.count()?, tokens.count()?];
        let plane = [tokens.count()?, tokens.count()?];
        let rho = tokens.number()?;
        let t_final = tokens.number()?;

        Ok(Self {
            column: ColumnConfig { cross_section, packing, test: Some(test), lx, ly, lz, scaling, plane },
            contact: ContactConfig { kn, kt, gn, gt, mu, muw },
            cohesion: CohesionConfig { enabled: cohesion_enabled, bn, bt, bm, eps },
            parameters: ParametersConfig {
                radius,
                seed,
                dt,
                dt_out,
                rho,
                t_final,
                fraction,
                lateral_gravity: default_lateral_gravity(),
                vertical_gravity: default_vertical_gravity(),
            },
        })
    }

    pub fn from_inp_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_inp_str(&text)
    }
}

/// Resolve a file key (path without extension) and load the scenario.
///
/// Tries `<key>.yaml`, `<key>.yml` and `<key>.inp` in that order.
pub fn load_scenario(filekey: &Path) -> Result<ScenarioConfig, ConfigError> {
    for ext in ["yaml", "yml"] {
        let candidate = with_extension(filekey, ext);
        if candidate.is_file() {
            debug!("loading scenario from {}", candidate.display());
            return ScenarioConfig::from_yaml_file(&candidate);
        }
    }

    let inp = with_extension(filekey, "inp");
    if inp.is_file() {
        debug!("loading legacy input from {}", inp.display());
        return ScenarioConfig::from_inp_file(&inp);
    }

    Err(ConfigError::MissingInput(inp))
}

// `Path::with_extension` would eat a dotted key such as `runs/col.v2`
fn with_extension(filekey: &Path, ext: &str) -> PathBuf {
    let mut s = filekey.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

struct InpTokens<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> InpTokens<'a> {
    fn new(text: &'a str) -> Self {
        Self { lines: text.lines().enumerate() }
    }

    fn next_token(&mut self) -> Result<(usize, &'a str), ConfigError> {
        for (i, line) in self.lines.by_ref() {
            if let Some(tok) = line.split_whitespace().next() {
                return Ok((i + 1, tok));
            }
        }
        Err(ConfigError::Parse { line: 0, reason: "unexpected end of input".to_string() })
    }

    fn string(&mut self) -> Result<String, ConfigError> {
        Ok(self.next_token()?.1.to_string())
    }

    fn number(&mut self) -> Result<f64, ConfigError> {
        let (line, tok) = self.next_token()?;
        tok.parse::<f64>()
            .map_err(|e| ConfigError::Parse { line, reason: format!("`{tok}` is not a number ({e})") })
    }

    fn count(&mut self) -> Result<usize, ConfigError> {
        let (line, tok) = self.next_token()?;
        tok.parse::<usize>()
            .map_err(|e| ConfigError::Parse { line, reason: format!("`{tok}` is not a count ({e})") })
    }

    fn flag(&mut self) -> Result<bool, ConfigError> {
        let (line, tok) = self.next_token()?;
        match tok {
            "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            other => Err(ConfigError::Parse { line, reason: format!("`{other}` is not a flag") }),
        }
    }
}
