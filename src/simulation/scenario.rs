//! Stage orchestration of a column run
//!
//! A run is a single forward pass through a small state machine:
//!
//! ```text
//! Generate ─┬─ cube ──> PreSettle ─┐
//!           └─ other ──────────────┴─> Carve -> FinalizeBoundary -> AssignBulk -> MainSolve -> Done
//! ```
//!
//! [`ColumnRun::step`] performs exactly one transition, so every stage can be
//! exercised on its own. The orchestrator owns the domain between solves and
//! hands it to the engine for the duration of each solve call.

use std::path::PathBuf;

use log::info;

use crate::simulation::boundary::{add_boundary, base_plate, transient_walls};
use crate::simulation::carving::{carve, compact, outside_footprint};
use crate::simulation::engine::{Domain, SolveRequest, SolveSummary};
use crate::simulation::errors::{ColumnError, EngineError};
use crate::simulation::packing::generate;
use crate::simulation::params::{PackingType, RunParameters};
use crate::simulation::properties::PropertyTable;
use crate::simulation::states::{tags, NVec3};

/// Output prefix of the settling stage
pub const SETTLE_PREFIX: &str = "drop_cubes";
/// Checkpoint written after settling
pub const SETTLE_CHECKPOINT: &str = "stage_1";
/// Output prefix of the main stage
pub const MAIN_PREFIX: &str = "column";
/// Number of output frames of the settling stage
pub const SETTLE_FRAMES: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Generate,
    PreSettle,
    Carve,
    FinalizeBoundary,
    AssignBulk,
    MainSolve,
    Done,
}

/// What happened during a run, filled in stage by stage
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub generated: usize, // grains produced by the packing
    pub settle: Option<SolveSummary>,
    pub checkpoint: Option<PathBuf>,
    pub escaped: usize, // grains outside the footprint after settling
    pub carved: usize, // grains removed by the cross-section
    pub base_height: Option<f64>,
    pub main: Option<SolveSummary>,
    pub solves: Vec<SolveRequest>, // every solve issued, in order
}

/// A column run bound to one domain
pub struct ColumnRun<D: Domain> {
    params: RunParameters,
    domain: D,
    threads: usize,
    stage: Stage,
    report: RunReport,
}

impl<D: Domain> ColumnRun<D> {
    pub fn new(params: RunParameters, domain: D, threads: usize) -> Self {
        Self {
            params,
            domain,
            threads: threads.max(1),
            stage: Stage::Generate,
            report: RunReport::default(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn params(&self) -> &RunParameters {
        &self.params
    }

    pub fn domain(&self) -> &D {
        &self.domain
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn into_parts(self) -> (D, RunReport) {
        (self.domain, self.report)
    }

    /// Perform the current stage and move to the next one.
    /// Stepping a finished run is a no-op returning [`Stage::Done`].
    pub fn step(&mut self) -> Result<Stage, ColumnError> {
        self.stage = match self.stage {
            Stage::Generate => {
                self.generate()?;
                if self.params.packing == PackingType::Cube {
                    Stage::PreSettle
                } else {
                    Stage::Carve
                }
            }
            Stage::PreSettle => {
                self.pre_settle()?;
                Stage::Carve
            }
            Stage::Carve => {
                self.report.carved = carve(&mut self.domain, &self.params);
                Stage::FinalizeBoundary
            }
            Stage::FinalizeBoundary => {
                self.finalize_boundary()?;
                Stage::AssignBulk
            }
            Stage::AssignBulk => {
                self.assign_bulk();
                Stage::MainSolve
            }
            Stage::MainSolve => {
                self.main_solve()?;
                Stage::Done
            }
            Stage::Done => Stage::Done,
        };
        Ok(self.stage)
    }

    /// Step until [`Stage::Done`]
    pub fn run(&mut self) -> Result<&RunReport, ColumnError> {
        while self.step()? != Stage::Done {}
        Ok(&self.report)
    }

    fn generate(&mut self) -> Result<(), ColumnError> {
        self.report.generated = generate(&mut self.domain, &self.params)?;
        Ok(())
    }

    fn pre_settle(&mut self) -> Result<(), ColumnError> {
        let provisional = self.params.provisional_bundle();
        for wall in transient_walls(&self.params) {
            add_boundary(&mut self.domain, &wall, Some(provisional))?;
        }

        self.apply_body_force(NVec3::new(0.0, 0.0, self.params.vertical_gravity));
        self.domain.assign_properties(&PropertyTable::single(tags::BULK, provisional));

        let duration = 0.5 * self.params.t_final;
        let summary = self.solve(duration, duration / SETTLE_FRAMES, SETTLE_PREFIX)?;
        self.report.settle = Some(summary);
        self.report.checkpoint = Some(self.domain.save_checkpoint(SETTLE_CHECKPOINT)?);

        let escaped = outside_footprint(self.domain.particles(), &self.params);
        self.report.escaped = compact(&mut self.domain, &escaped);
        self.domain.delete_by_tags(&tags::TRANSIENT);

        info!(
            "settling finished at t = {:.4}, {} grains left the footprint",
            summary.time, self.report.escaped
        );
        Ok(())
    }

    fn finalize_boundary(&mut self) -> Result<(), ColumnError> {
        let (min, _max) = self.domain.bounding_box().ok_or(EngineError::EmptyDomain)?;
        let plate = base_plate(&self.params, min.z);
        self.report.base_height = Some(plate.position.z);
        add_boundary(&mut self.domain, &plate, Some(self.params.base_bundle()))?;
        info!("base plate placed at z = {:.4}", plate.position.z);
        Ok(())
    }

    fn assign_bulk(&mut self) {
        self.apply_body_force(NVec3::new(
            self.params.lateral_gravity,
            0.0,
            self.params.vertical_gravity,
        ));
        let n = self
            .domain
            .assign_properties(&PropertyTable::single(tags::BULK, self.params.bulk_bundle()));
        info!("bulk properties bound to {n} grains");
    }

    fn main_solve(&mut self) -> Result<(), ColumnError> {
        let summary = self.solve(1.5 * self.params.t_final, self.params.dt_out, MAIN_PREFIX)?;
        info!("main stage finished after {} steps, t = {:.4}", summary.steps, summary.time);
        self.report.main = Some(summary);
        Ok(())
    }

    // helpers ==============================================================================

    /// Constant body force `m * g` on every bulk grain
    fn apply_body_force(&mut self, g: NVec3) {
        for p in self.domain.particles_mut().iter_mut().filter(|p| p.tag == tags::BULK) {
            p.ff = p.m * g;
        }
    }

    /// Solve at half the critical step with a skin of one spheroradius
    fn solve(&mut self, duration: f64, dt_out: f64, prefix: &str) -> Result<SolveSummary, ColumnError> {
        let dt = 0.5 * self.domain.critical_dt()?;
        let req = SolveRequest {
            duration,
            dt,
            dt_out,
            prefix: prefix.to_string(),
            verlet_skin: self.params.radius,
            threads: self.threads,
        };
        info!(
            "solving `{prefix}` for {duration:.4} with dt = {dt:.3e} (configured {:.3e}) on {} threads",
            self.params.dt, self.threads
        );
        let summary = self.domain.solve(&req)?;
        self.report.solves.push(req);
        Ok(summary)
    }
}
