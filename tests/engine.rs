mod common;

use approx::{assert_abs_diff_eq, assert_relative_eq};

use colsim::dem::forces::{separation, ContactPair};
use colsim::dem::output::snapshot_path;
use colsim::simulation::engine::{PlaneSpec, SolveRequest};
use colsim::{tags, DemDomain, Domain, EngineError, NVec3, Particle, PropertyBundle, PropertyTable, Shape};

use common::temp_out;

fn bundle(kn: f64) -> PropertyBundle {
    PropertyBundle { kn, kt: 0.5 * kn, gn: 1000.0, gt: 0.0, mu: 0.4, bond: None }
}

fn sphere(domain: &mut DemDomain, x: NVec3, r: f64) {
    domain.particles_mut().push(Particle::new(
        tags::BULK,
        Shape::Sphere { radius: r },
        x,
        4.0 / 3.0 * std::f64::consts::PI * r * r * r,
    ));
}

fn floor(domain: &mut DemDomain) {
    domain
        .add_plane(&PlaneSpec {
            tag: tags::BASE_PLATE,
            position: NVec3::zeros(),
            radius: 0.01,
            width: 2.0,
            height: 2.0,
            density: 1.0,
            angle: 0.0,
            axis: NVec3::z(),
        })
        .unwrap();
    domain.fix_motion(tags::BASE_PLATE).unwrap();
}

fn request(duration: f64, dt: f64, dt_out: f64, prefix: &str) -> SolveRequest {
    SolveRequest {
        duration,
        dt,
        dt_out,
        prefix: prefix.to_string(),
        verlet_skin: 0.05,
        threads: 2,
    }
}

// ==================================================================================
// Critical step tests
// ==================================================================================

#[test]
fn critical_step_uses_lightest_free_body() {
    let mut d = DemDomain::new(temp_out("critical"));
    sphere(&mut d, NVec3::zeros(), 0.1);
    sphere(&mut d, NVec3::x(), 0.2);
    floor(&mut d);
    d.assign_properties(&PropertyTable::new().with(tags::BULK, bundle(1.0e4)).with(tags::BASE_PLATE, bundle(1.0e9)));

    let m_min = d.particles().iter().filter(|p| !p.fixed).map(|p| p.m).fold(f64::INFINITY, f64::min);
    assert_relative_eq!(d.critical_dt().unwrap(), 0.1 * (m_min / 1.0e4).sqrt());
}

#[test]
fn critical_step_needs_stiff_free_bodies() {
    let mut d = DemDomain::new(temp_out("critical_none"));
    sphere(&mut d, NVec3::zeros(), 0.1);
    assert!(matches!(d.critical_dt(), Err(EngineError::NoFreeParticles)));
}

// ==================================================================================
// Contact tests
// ==================================================================================

#[test]
fn overlapping_spheres_repel_along_the_line_of_centres() {
    let mut d = DemDomain::new(temp_out("repel"));
    sphere(&mut d, NVec3::zeros(), 0.1);
    sphere(&mut d, NVec3::new(0.15, 0.0, 0.0), 0.1);
    d.assign_properties(&PropertyTable::single(tags::BULK, bundle(1.0e4)));

    let mut pair = ContactPair::new(0, 1, (0, 1));
    pair.evaluate(d.particles().as_slice(), 1.0e-4);

    // force on the second sphere, the first receives the opposite
    assert_relative_eq!(pair.force.x, 1.0e4 * 0.05, max_relative = 1e-12);
    assert_abs_diff_eq!(pair.force.y, 0.0);
    assert_abs_diff_eq!(pair.force.z, 0.0);
}

#[test]
fn plates_have_a_finite_extent() {
    let mut d = DemDomain::new(temp_out("extent"));
    floor(&mut d);
    sphere(&mut d, NVec3::new(0.0, 0.0, 0.05), 0.1);
    sphere(&mut d, NVec3::new(3.0, 0.0, 0.05), 0.1);
    let ps = d.particles().as_slice();

    let near = separation(&ps[1], &ps[0], 0.0).unwrap();
    assert!(near.gap < 0.0);
    assert_abs_diff_eq!(near.normal.z, -1.0);
    assert!(separation(&ps[2], &ps[0], 0.0).is_none());
}

// ==================================================================================
// Solve tests
// ==================================================================================

#[test]
fn sphere_settles_on_a_fixed_plate() {
    let out = temp_out("settle");
    let mut d = DemDomain::new(&out);
    floor(&mut d);
    sphere(&mut d, NVec3::new(0.0, 0.0, 0.3), 0.1);
    d.assign_properties(&PropertyTable::new().with(tags::BULK, bundle(1.0e4)).with(tags::BASE_PLATE, bundle(1.0e4)));
    for p in d.particles_mut().iter_mut().filter(|p| p.tag == tags::BULK) {
        p.ff = p.m * NVec3::new(0.0, 0.0, -981.0);
    }

    let dt = 0.5 * d.critical_dt().unwrap();
    let summary = d.solve(&request(1.0, dt, 0.5, "settle")).unwrap();
    assert!(summary.steps > 0);

    let ps = d.particles().as_slice();
    let (plate, ball) = (&ps[0], &ps[1]);
    assert_eq!(plate.x, NVec3::zeros());
    assert_eq!(plate.v, NVec3::zeros());

    // resting height: radius plus plate spheroradius, minus a small static overlap
    assert_abs_diff_eq!(ball.x.z, 0.11, epsilon = 2e-3);
    assert!(ball.v.norm() < 1e-2, "still moving at {:?}", ball.v);
}

#[test]
fn snapshots_follow_the_output_cadence() {
    let out = temp_out("cadence");
    let mut d = DemDomain::new(&out);
    sphere(&mut d, NVec3::zeros(), 0.1);
    d.assign_properties(&PropertyTable::single(tags::BULK, bundle(1.0e4)));

    // binary-exact values so the step count is unambiguous
    let summary = d.solve(&request(0.5, 1.0 / 128.0, 0.125, "cadence")).unwrap();
    assert_eq!(summary.steps, 64);
    assert_eq!(summary.snapshots, 5);
    assert_eq!(summary.time, 0.5);
    for frame in 0..5 {
        assert!(snapshot_path(&out, "cadence", frame).is_file());
    }
    assert!(!snapshot_path(&out, "cadence", 5).exists());

    // the clock carries over to the next call
    let summary = d.solve(&request(0.25, 1.0 / 128.0, 0.125, "more")).unwrap();
    assert_eq!(summary.time, 0.75);
}

#[test]
fn invalid_requests_are_refused() {
    let mut d = DemDomain::new(temp_out("invalid"));
    sphere(&mut d, NVec3::zeros(), 0.1);
    assert!(matches!(d.solve(&request(1.0, 0.0, 0.1, "x")), Err(EngineError::InvalidRequest(_))));
    assert!(matches!(d.solve(&request(1.0, 0.1, -1.0, "x")), Err(EngineError::InvalidRequest(_))));
}

#[test]
fn checkpoint_restores_the_domain() {
    let out = temp_out("checkpoint");
    let mut d = DemDomain::new(&out);
    floor(&mut d);
    sphere(&mut d, NVec3::new(0.0, 0.0, 0.5), 0.1);
    d.assign_properties(&PropertyTable::single(tags::BULK, bundle(1.0e4)));
    d.solve(&request(0.25, 1.0 / 256.0, 0.25, "before")).unwrap();

    let path = d.save_checkpoint("state").unwrap();
    let restored = DemDomain::load_checkpoint(&path, &out).unwrap();

    assert_eq!(restored.time(), d.time());
    assert_eq!(restored.particles().len(), 2);
    let (a, b) = (&d.particles().as_slice()[1], &restored.particles().as_slice()[1]);
    assert_eq!(a.x, b.x);
    assert_eq!(a.props, b.props);
    assert!(restored.particles().as_slice()[0].fixed);
}

// ==================================================================================
// Collection tests
// ==================================================================================

#[test]
fn fixing_an_unknown_tag_fails() {
    let mut d = DemDomain::new(temp_out("unknown"));
    assert!(matches!(d.fix_motion(-99), Err(EngineError::UnknownTag(-99))));
}

#[test]
fn deletion_by_tag_bumps_the_revision() {
    let mut d = DemDomain::new(temp_out("revision"));
    sphere(&mut d, NVec3::zeros(), 0.1);
    floor(&mut d);
    let rev = d.particles().revision();

    assert_eq!(d.delete_by_tags(&[tags::BASE_PLATE]), 1);
    assert!(d.particles().revision() > rev);
    assert_eq!(d.delete_by_tags(&[tags::BASE_PLATE]), 0);
    assert_eq!(d.particles().len(), 1);
}

#[test]
fn uids_stay_unique_after_deletion() {
    let mut d = DemDomain::new(temp_out("uids"));
    sphere(&mut d, NVec3::zeros(), 0.1);
    sphere(&mut d, NVec3::x(), 0.1);
    d.particles_mut().retag(&[0], tags::MARKED);
    d.delete_by_tags(&[tags::MARKED]);
    sphere(&mut d, NVec3::y(), 0.1);

    let uids: Vec<u64> = d.particles().iter().map(|p| p.uid).collect();
    assert_eq!(uids, vec![1, 2]);
}
