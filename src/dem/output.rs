//! Snapshot and checkpoint files of the reference engine

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::simulation::errors::EngineError;
use crate::simulation::states::{NVec3, ParticleCollection, Tag};

#[derive(Serialize)]
struct SnapshotEntry {
    tag: Tag,
    x: [f64; 3],
    v: [f64; 3],
    r: f64,
}

#[derive(Serialize)]
struct Snapshot<'a> {
    prefix: &'a str,
    frame: usize,
    time: f64,
    particles: Vec<SnapshotEntry>,
}

fn triple(v: &NVec3) -> [f64; 3] {
    [v.x, v.y, v.z]
}

/// Path of frame `frame` of an output series
pub fn snapshot_path(dir: &Path, prefix: &str, frame: usize) -> PathBuf {
    dir.join(format!("{prefix}_{frame:04}.json"))
}

/// Write a visualization frame: tag, position, velocity and envelope radius per particle
pub fn write_snapshot(
    dir: &Path,
    prefix: &str,
    frame: usize,
    time: f64,
    particles: &ParticleCollection,
) -> Result<PathBuf, EngineError> {
    fs::create_dir_all(dir)?;
    let path = snapshot_path(dir, prefix, frame);
    let snapshot = Snapshot {
        prefix,
        frame,
        time,
        particles: particles
            .iter()
            .map(|p| SnapshotEntry { tag: p.tag, x: triple(&p.x), v: triple(&p.v), r: p.shape.contact_radius() })
            .collect(),
    };
    let writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer(writer, &snapshot)?;
    Ok(path)
}

/// Full restartable state
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Checkpoint {
    pub time: f64,
    pub particles: ParticleCollection,
}

pub fn write_checkpoint(path: &Path, checkpoint: &Checkpoint) -> Result<(), EngineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, checkpoint)?;
    Ok(())
}

pub fn read_checkpoint(path: &Path) -> Result<Checkpoint, EngineError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
