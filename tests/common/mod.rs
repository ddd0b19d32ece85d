#![allow(dead_code)]

use std::path::PathBuf;

use colsim::configuration::config::{CohesionConfig, ColumnConfig, ContactConfig, ParametersConfig};
use colsim::{RunParameters, ScenarioConfig};

/// Scenario with the given strategy, cross-section, footprint and lattice resolution
pub fn scenario(packing: &str, cross_section: &str, l: [f64; 3], scaling: [usize; 3]) -> ScenarioConfig {
    ScenarioConfig {
        column: ColumnConfig {
            cross_section: cross_section.to_string(),
            packing: packing.to_string(),
            test: None,
            lx: l[0],
            ly: l[1],
            lz: l[2],
            scaling,
            plane: [5, 5],
        },
        contact: ContactConfig {
            kn: 1.0e4,
            kt: 5.0e3,
            gn: 16.0,
            gt: 8.0,
            mu: 0.4,
            muw: 0.8,
        },
        cohesion: CohesionConfig::default(),
        parameters: ParametersConfig {
            radius: 0.05,
            seed: 42,
            dt: 1.0e-4,
            dt_out: 0.005,
            rho: 1.0,
            t_final: 0.01,
            fraction: 1.0,
            lateral_gravity: 300.0,
            vertical_gravity: -981.0,
        },
    }
}

pub fn params(packing: &str, cross_section: &str, l: [f64; 3], scaling: [usize; 3]) -> RunParameters {
    RunParameters::from_config(&scenario(packing, cross_section, l, scaling)).expect("valid scenario")
}

/// Fresh, empty output directory unique to this test process
pub fn temp_out(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("colsim_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}
