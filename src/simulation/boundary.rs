//! Boundary construction
//!
//! Boundaries are fixed planar bodies on reserved negative tags. The four
//! side walls and the capping base only exist while cubes settle; the base
//! plate stays for the main run.

use std::f64::consts::PI;

use log::debug;

use super::engine::{Domain, PlaneSpec};
use super::errors::ColumnError;
use super::params::RunParameters;
use super::properties::PropertyTable;
use super::states::{tags, NVec3, PropertyBundle};

/// Height of the transient walls in units of `lz`
pub const WALL_HEIGHT_FACTOR: f64 = 10.0;

/// Add a plane, fix it and optionally bind `props` to its tag.
///
/// Fails if any particle already carries the tag, so bulk grains and
/// boundaries never share one.
pub fn add_boundary<D: Domain>(
    domain: &mut D,
    plane: &PlaneSpec,
    props: Option<PropertyBundle>,
) -> Result<(), ColumnError> {
    if domain.particles().contains_tag(plane.tag) {
        return Err(ColumnError::BoundaryTagInUse(plane.tag));
    }
    domain.add_plane(plane)?;
    domain.fix_motion(plane.tag)?;
    if let Some(bundle) = props {
        domain.assign_properties(&PropertyTable::single(plane.tag, bundle));
    }
    debug!("boundary {} added at {:?}", plane.tag, plane.position.as_slice());
    Ok(())
}

/// Side walls and capping base confining the cube stack while it settles
pub fn transient_walls(params: &RunParameters) -> [PlaneSpec; 5] {
    let (lx, ly, lz) = (params.lx, params.ly, params.lz);
    let tall = WALL_HEIGHT_FACTOR * lz;
    let e0 = NVec3::x();
    let e1 = NVec3::y();
    let wall = |tag, position, width, height, angle, axis| PlaneSpec {
        tag,
        position,
        radius: params.radius,
        width,
        height,
        density: 1.0,
        angle,
        axis,
    };

    [
        wall(tags::WALL_X_POS, NVec3::new(0.5 * lx, 0.0, 0.0), tall, ly, 0.5 * PI, e1),
        wall(tags::WALL_X_NEG, NVec3::new(-0.5 * lx, 0.0, 0.0), tall, ly, 1.5 * PI, e1),
        wall(tags::WALL_Y_POS, NVec3::new(0.0, 0.5 * ly, 0.0), lx, tall, 1.5 * PI, e0),
        wall(tags::WALL_Y_NEG, NVec3::new(0.0, -0.5 * ly, 0.0), lx, tall, 0.5 * PI, e0),
        wall(tags::TRANSIENT_BASE, NVec3::new(0.0, 0.0, -0.5 * lz), lx, ly, PI, e0),
    ]
}

/// Permanent base plate one spheroradius below `zmin`
pub fn base_plate(params: &RunParameters, zmin: f64) -> PlaneSpec {
    PlaneSpec {
        tag: tags::BASE_PLATE,
        position: NVec3::new(0.0, 0.0, zmin - params.radius),
        radius: params.radius,
        width: params.plane_x as f64 * params.lz,
        height: params.plane_y as f64 * params.lz,
        density: params.rho,
        angle: 0.0,
        axis: NVec3::z(),
    }
}
